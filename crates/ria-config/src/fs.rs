// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One `<key>.json` file per document under a directory.

use crate::config::{ConfigError, ConfigStore};
use directories::ProjectDirs;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory-backed [`ConfigStore`].
///
/// Writes go to a sibling `.tmp` file first and are renamed into place, so a
/// reader never observes a half-written document.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store under the per-user riagen config directory
    /// (`~/.config/riagen` on Linux).
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", "riagen")
            .ok_or_else(|| ConfigError::Other("no home directory to hold riagen preferences".into()))?;
        Self::at(dirs.config_dir())
    }

    /// Store under `base`; the directory is created when absent.
    pub fn at(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref();
        fs::create_dir_all(base)?;
        Ok(Self {
            base: base.to_owned(),
        })
    }

    /// Directory holding the documents.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn document_path(&self, key: &str) -> Result<PathBuf, ConfigError> {
        if is_plain_key(key) {
            Ok(self.base.join(format!("{key}.json")))
        } else {
            Err(ConfigError::InvalidKey(key.to_owned()))
        }
    }
}

/// Keys are bare file stems: no separators and no leading dot.
fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() || first == '_' || first == '-' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let path = self.document_path(key)?;
        fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::Io(err),
        })
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.document_path(key)?;
        let staged = path.with_extension("json.tmp");
        fs::write(&staged, data)?;
        if let Err(err) = fs::rename(&staged, &path) {
            let _ = fs::remove_file(&staged);
            return Err(err.into());
        }
        debug!(path = %path.display(), bytes = data.len(), "document saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_like_keys_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        for key in ["", "../generator", "nested/generator", ".generator", "c:generator"] {
            let refused = matches!(store.save_raw(key, b"{}"), Err(ConfigError::InvalidKey(_)));
            assert!(refused, "key {key:?} was accepted");
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn absent_documents_read_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path().join("riagen")).unwrap();
        assert!(store.base().is_dir());
        assert!(matches!(store.load_raw("generator"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn saves_replace_without_leaving_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        store.save_raw("generator", b"{\"language\":\"C#\"}").unwrap();
        store.save_raw("generator", b"{\"language\":\"VB\"}").unwrap();
        assert_eq!(store.load_raw("generator").unwrap(), b"{\"language\":\"VB\"}");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("generator.json")]);
    }
}
