// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dense integer ids for source file paths.

use std::collections::HashMap;

/// Append-only bidirectional map between file paths and dense ids.
///
/// Id [`FilenameMap::NOT_A_FILE`] is reserved for "no file" and maps to the
/// empty string. Paths compare case-insensitively; the first spelling seen is
/// the one returned by [`FilenameMap::name`].
#[derive(Debug, Clone)]
pub struct FilenameMap {
    ids: HashMap<String, usize>,
    names: Vec<String>,
}

impl Default for FilenameMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FilenameMap {
    /// Reserved id for a missing or empty path.
    pub const NOT_A_FILE: usize = 0;

    /// Creates a map holding only the reserved entry.
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            names: vec![String::new()],
        }
    }

    /// Returns the id for `path`, assigning the next id on first sight.
    pub fn add_or_get(&mut self, path: &str) -> usize {
        if path.is_empty() {
            return Self::NOT_A_FILE;
        }
        let key = path.to_lowercase();
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = self.names.len();
        self.names.push(path.to_string());
        self.ids.insert(key, id);
        id
    }

    /// Id for an optional path; `None` maps to [`FilenameMap::NOT_A_FILE`].
    pub fn add_or_get_opt(&mut self, path: Option<&str>) -> usize {
        path.map_or(Self::NOT_A_FILE, |p| self.add_or_get(p))
    }

    /// Id previously assigned to `path`, without inserting.
    pub fn get(&self, path: &str) -> Option<usize> {
        if path.is_empty() {
            return Some(Self::NOT_A_FILE);
        }
        self.ids.get(&path.to_lowercase()).copied()
    }

    /// Path for `id`; the reserved id yields the empty string.
    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Number of real files (excluding the reserved entry).
    pub fn len(&self) -> usize {
        self.names.len() - 1
    }

    /// Whether no real file has been added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_and_missing_paths_share_the_sentinel() {
        let mut map = FilenameMap::new();
        assert_eq!(map.add_or_get(""), FilenameMap::NOT_A_FILE);
        assert_eq!(map.add_or_get_opt(None), FilenameMap::NOT_A_FILE);
        assert_eq!(map.name(FilenameMap::NOT_A_FILE), Some(""));
        assert!(map.is_empty());
    }

    #[test]
    fn case_variants_resolve_to_one_id() {
        let mut map = FilenameMap::new();
        let a = map.add_or_get(r"C:\src\Shared\Order.shared.cs");
        let b = map.add_or_get(r"c:\SRC\shared\order.shared.cs");
        assert_eq!(a, b);
        assert_eq!(map.name(a), Some(r"C:\src\Shared\Order.shared.cs"));
    }

    proptest! {
        #[test]
        fn add_or_get_is_idempotent(paths in proptest::collection::vec("[a-z/]{0,12}", 0..24)) {
            let mut map = FilenameMap::new();
            let first: Vec<usize> = paths.iter().map(|p| map.add_or_get(p)).collect();
            let before = map.len();
            let second: Vec<usize> = paths.iter().map(|p| map.add_or_get(p)).collect();
            prop_assert_eq!(first.clone(), second);
            prop_assert_eq!(before, map.len());
            for (path, id) in paths.iter().zip(first) {
                prop_assert_eq!(id == FilenameMap::NOT_A_FILE, path.is_empty());
                prop_assert_eq!(map.get(path), Some(id));
            }
        }
    }
}
