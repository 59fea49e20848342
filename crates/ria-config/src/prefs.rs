// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted generator preferences.

use crate::config::{ConfigService, ConfigStore};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Config key under which [`GeneratorPrefs`] are stored.
pub const PREFS_KEY: &str = "generator";

/// Defaults applied to `riagen generate` when flags are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorPrefs {
    /// Target language ("C#" or "VB").
    pub language: String,
    /// Registered generator name; `None` picks by language alone.
    pub generator: Option<String>,
    /// Directories searched for `<assembly>.symbols.json` files.
    pub symbol_search_paths: Vec<String>,
    /// Run sharing analysis in a worker process.
    pub isolated: bool,
}

impl Default for GeneratorPrefs {
    fn default() -> Self {
        Self {
            language: "C#".into(),
            generator: None,
            symbol_search_paths: Vec::new(),
            isolated: false,
        }
    }
}

/// Best-effort load/save of generator preferences.
pub trait PrefsPort {
    /// Load preferences; `None` when missing or unreadable.
    fn load_prefs(&self) -> Option<GeneratorPrefs>;
    /// Persist preferences; failures are logged, not returned.
    fn save_prefs(&self, prefs: &GeneratorPrefs);
}

impl<S: ConfigStore> PrefsPort for ConfigService<S> {
    fn load_prefs(&self) -> Option<GeneratorPrefs> {
        match self.load(PREFS_KEY) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable generator preferences");
                None
            }
        }
    }

    fn save_prefs(&self, prefs: &GeneratorPrefs) {
        if let Err(err) = self.save(PREFS_KEY, prefs) {
            warn!(error = %err, "failed to save generator preferences");
        }
    }
}
