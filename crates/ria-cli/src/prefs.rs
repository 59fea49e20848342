// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted defaults merged with command-line flags.

use crate::GenerateArgs;
use ria_config::{ConfigService, FsConfigStore, GeneratorPrefs, PrefsPort};
use std::path::Path;
use tracing::{debug, warn};

/// Opens the preference store; `None` when no config directory is usable.
pub(crate) fn open(config_dir: Option<&Path>) -> Option<ConfigService<FsConfigStore>> {
    let store = match config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    };
    match store {
        Ok(store) => {
            debug!(dir = %store.base().display(), "preference store opened");
            Some(ConfigService::new(store))
        }
        Err(err) => {
            warn!(error = %err, "preferences unavailable; using defaults");
            None
        }
    }
}

/// Flags win over stored preferences; list flags extend stored lists.
pub(crate) fn effective(stored: GeneratorPrefs, args: &GenerateArgs) -> GeneratorPrefs {
    let mut symbol_search_paths = stored.symbol_search_paths;
    for path in &args.symbol_paths {
        if !symbol_search_paths.contains(path) {
            symbol_search_paths.push(path.clone());
        }
    }
    GeneratorPrefs {
        language: args.language.clone().unwrap_or(stored.language),
        generator: args.generator.clone().or(stored.generator),
        symbol_search_paths,
        isolated: args.isolated || stored.isolated,
    }
}

/// Stored preferences, or defaults when there are none.
pub(crate) fn load(service: Option<&ConfigService<FsConfigStore>>) -> GeneratorPrefs {
    service.and_then(PrefsPort::load_prefs).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> GenerateArgs {
        GenerateArgs {
            catalog: PathBuf::from("catalog.json"),
            ..GenerateArgs::default()
        }
    }

    #[test]
    fn stored_values_apply_without_flags() {
        let stored = GeneratorPrefs {
            language: "VB".into(),
            generator: Some("Custom".into()),
            symbol_search_paths: vec!["/sym".into()],
            isolated: true,
        };
        assert_eq!(effective(stored.clone(), &args()), stored);
    }

    #[test]
    fn flags_override_and_extend() {
        let stored = GeneratorPrefs {
            symbol_search_paths: vec!["/sym".into()],
            ..GeneratorPrefs::default()
        };
        let mut flags = args();
        flags.language = Some("vb".into());
        flags.symbol_paths = vec!["/sym".into(), "/more".into()];
        let prefs = effective(stored, &flags);
        assert_eq!(prefs.language, "vb");
        assert_eq!(prefs.symbol_search_paths, vec!["/sym", "/more"]);
        assert!(!prefs.isolated);
    }
}
