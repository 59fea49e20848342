// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Options controlling one generation run.

use serde::{Deserialize, Serialize};

/// Settings supplied by the host for one `generate_code` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientCodeGenerationOptions {
    /// Target language (`C#`, `VB` or an alias).
    pub language: String,
    /// Root namespace of the client project. Visual Basic projects prefix
    /// every namespace with it implicitly, so generated VB namespaces drop it.
    pub client_root_namespace: Option<String>,
    /// Root namespace of the server project.
    pub server_root_namespace: Option<String>,
    /// Path of the client project file, used in diagnostics.
    pub client_project_path: Option<String>,
    /// Emit namespace-qualified type names instead of relying on imports.
    pub use_full_type_names: bool,
}

impl Default for ClientCodeGenerationOptions {
    fn default() -> Self {
        Self {
            language: "C#".to_string(),
            client_root_namespace: None,
            server_root_namespace: None,
            client_project_path: None,
            use_full_type_names: false,
        }
    }
}

impl ClientCodeGenerationOptions {
    /// Options for `language` with everything else defaulted.
    pub fn for_language(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }

    /// Namespace to declare for server namespace `namespace` in the given
    /// language. For Visual Basic the client root namespace prefix is removed.
    pub fn client_namespace(&self, namespace: &str, is_visual_basic: bool) -> String {
        if !is_visual_basic {
            return namespace.to_string();
        }
        let Some(root) = self.client_root_namespace.as_deref().filter(|r| !r.is_empty()) else {
            return namespace.to_string();
        };
        if namespace == root {
            return String::new();
        }
        namespace
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('.'))
            .map_or_else(|| namespace.to_string(), str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vb_root_namespace_is_stripped() {
        let opts = ClientCodeGenerationOptions {
            client_root_namespace: Some("Northwind".into()),
            ..ClientCodeGenerationOptions::for_language("VB")
        };
        assert_eq!(opts.client_namespace("Northwind.Models", true), "Models");
        assert_eq!(opts.client_namespace("Northwind", true), "");
        assert_eq!(opts.client_namespace("NorthwindExtra", true), "NorthwindExtra");
        assert_eq!(opts.client_namespace("Northwind.Models", false), "Northwind.Models");
    }
}
