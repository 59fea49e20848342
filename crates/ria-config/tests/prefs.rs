// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Preference persistence through the config port.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use ria_config::{ConfigService, ConfigStore, FsConfigStore, GeneratorPrefs, PrefsPort, PREFS_KEY};
use ria_fixtures::InMemoryConfigStore;

#[test]
fn prefs_round_trip_through_memory_store() {
    let store = InMemoryConfigStore::new();
    let service = ConfigService::new(store.clone());
    assert_eq!(service.load_prefs(), None);

    let prefs = GeneratorPrefs {
        language: "VB".into(),
        generator: Some("CodeDomClientCodeGenerator".into()),
        symbol_search_paths: vec!["/srv/bin".into()],
        isolated: true,
    };
    service.save_prefs(&prefs);
    assert_eq!(service.load_prefs(), Some(prefs));
    assert_eq!(store.save_count(), 1);
}

#[test]
fn partial_documents_fill_defaults() {
    let store = InMemoryConfigStore::new();
    store.save_raw(PREFS_KEY, br#"{ "isolated": true }"#).unwrap();
    let prefs = ConfigService::new(store).load_prefs().unwrap();
    assert_eq!(prefs.language, "C#");
    assert!(prefs.isolated);
    assert!(prefs.generator.is_none());
}

#[test]
fn unreadable_prefs_degrade_to_none() {
    let store = InMemoryConfigStore::new();
    store.save_raw(PREFS_KEY, b"not json").unwrap();
    let service = ConfigService::new(store.clone());
    assert_eq!(service.load_prefs(), None);

    store.set_fail_on_load(true);
    assert_eq!(service.load_prefs(), None);

    store.set_fail_on_save(true);
    service.save_prefs(&GeneratorPrefs::default());
    assert_eq!(store.save_count(), 2);
}

#[test]
fn empty_blobs_load_as_missing() {
    let store = InMemoryConfigStore::new();
    store.save_raw("blank", b"").unwrap();
    let value: Option<GeneratorPrefs> = ConfigService::new(store).load("blank").unwrap();
    assert!(value.is_none());
}

#[test]
fn filesystem_store_persists_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let service = ConfigService::new(FsConfigStore::at(dir.path()).unwrap());
    service.save_prefs(&GeneratorPrefs::default());
    assert!(dir.path().join("generator.json").is_file());
    assert_eq!(service.load_prefs(), Some(GeneratorPrefs::default()));
}
