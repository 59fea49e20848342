// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A [`ConfigStore`] kept in memory, with switchable faults.

use parking_lot::Mutex;
use ria_config::{ConfigError, ConfigStore};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory document store for preference tests.
///
/// Clones observe the same documents and counters, so a test can hand one
/// clone to a [`ria_config::ConfigService`] and inspect the other.
///
/// ```
/// use ria_config::{ConfigService, GeneratorPrefs, PrefsPort, PREFS_KEY};
/// use ria_fixtures::InMemoryConfigStore;
///
/// let store = InMemoryConfigStore::new();
/// ConfigService::new(store.clone()).save_prefs(&GeneratorPrefs::default());
/// assert!(store.get(PREFS_KEY).is_some());
/// assert_eq!((store.load_count(), store.save_count()), (0, 1));
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryConfigStore {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    documents: HashMap<String, Vec<u8>>,
    loads: usize,
    saves: usize,
    broken_loads: bool,
    broken_saves: bool,
}

impl InMemoryConfigStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `documents`.
    pub fn with_data(documents: HashMap<String, Vec<u8>>) -> Self {
        let store = Self::new();
        store.state.lock().documents = documents;
        store
    }

    /// Makes every later `load_raw` fail while `fail` is set.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.state.lock().broken_loads = fail;
    }

    /// Makes every later `save_raw` fail while `fail` is set.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.state.lock().broken_saves = fail;
    }

    /// `load_raw` calls so far, failed ones included.
    pub fn load_count(&self) -> usize {
        self.state.lock().loads
    }

    /// `save_raw` calls so far, failed ones included.
    pub fn save_count(&self) -> usize {
        self.state.lock().saves
    }

    /// Peeks at a stored document without touching the counters.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().documents.get(key).cloned()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut state = self.state.lock();
        state.loads += 1;
        if state.broken_loads {
            return Err(ConfigError::Other(format!("injected load fault for '{key}'")));
        }
        state.documents.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut state = self.state.lock();
        state.saves += 1;
        if state.broken_saves {
            return Err(ConfigError::Other(format!("injected save fault for '{key}'")));
        }
        state.documents.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_are_counted_and_leave_documents_untouched() {
        let store = InMemoryConfigStore::new();
        store.save_raw("generator", b"{}").unwrap();

        store.set_fail_on_save(true);
        assert!(store.save_raw("generator", b"changed").is_err());
        assert_eq!(store.get("generator").as_deref(), Some(&b"{}"[..]));
        assert_eq!(store.save_count(), 2);

        store.set_fail_on_load(true);
        assert!(matches!(store.load_raw("generator"), Err(ConfigError::Other(_))));
        store.set_fail_on_load(false);
        assert_eq!(store.load_raw("generator").unwrap(), b"{}");
        assert_eq!(store.load_count(), 2);
    }

    #[test]
    fn seeded_documents_are_visible_to_clones() {
        let seeded = HashMap::from([("generator".to_owned(), b"{\"isolated\":true}".to_vec())]);
        let store = InMemoryConfigStore::with_data(seeded);
        let observer = store.clone();
        assert!(observer.load_raw("generator").is_ok());
        assert!(matches!(observer.load_raw("missing"), Err(ConfigError::NotFound)));
        assert_eq!(store.load_count(), 2);
    }
}
