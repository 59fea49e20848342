// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serializable inputs for constructing a shared-code service anywhere.

use serde::{Deserialize, Serialize};

/// Everything needed to build a [`SharedCodeService`](crate::SharedCodeService),
/// in a form that can cross a process boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedCodeServiceParameters {
    /// Source files compiled into both the server and the client project.
    pub shared_source_files: Vec<String>,
    /// Directories searched for `<assembly>.symbols.json` files.
    pub symbol_search_paths: Vec<String>,
    /// Catalog files describing the server assemblies.
    pub server_assembly_paths: Vec<String>,
    /// Assemblies referenced by the client project (paths or bare names).
    pub client_assembly_paths: Vec<String>,
}

impl SharedCodeServiceParameters {
    /// Assembly names the client references, derived from
    /// [`client_assembly_paths`](Self::client_assembly_paths).
    pub fn client_assembly_names(&self) -> Vec<String> {
        self.client_assembly_paths
            .iter()
            .map(|p| assembly_name_from_path(p))
            .filter(|n| !n.is_empty())
            .collect()
    }
}

/// `bin/Debug/Acme.Shared.dll` -> `Acme.Shared`; bare names pass through.
pub fn assembly_name_from_path(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path).trim();
    let lower = file.to_ascii_lowercase();
    if lower.ends_with(".dll") || lower.ends_with(".exe") {
        file[..file.len() - 4].to_owned()
    } else {
        file.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_names_strip_directories_and_extensions() {
        assert_eq!(assembly_name_from_path(r"C:\bin\Acme.Shared.DLL"), "Acme.Shared");
        assert_eq!(assembly_name_from_path("lib/Acme.Tools.exe"), "Acme.Tools");
        assert_eq!(assembly_name_from_path("Acme.Contracts"), "Acme.Contracts");
    }

    #[test]
    fn missing_fields_default_when_deserializing() {
        let params: SharedCodeServiceParameters =
            serde_json::from_str(r#"{ "shared_source_files": ["a.shared.cs"] }"#).unwrap();
        assert_eq!(params.shared_source_files, vec!["a.shared.cs"]);
        assert!(params.client_assembly_paths.is_empty());
    }
}
