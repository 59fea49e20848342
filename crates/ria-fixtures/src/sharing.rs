// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scripted share-kind answers.

use ria_sharing::{CodeMemberKey, CodeMemberShareKind, SharedCodeLookup};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`SharedCodeLookup`] answering from a fixed table; every other key is
/// `Unknown`. Counts queries so tests can check memoization upstream.
#[derive(Debug, Default)]
pub struct StaticSharedCode {
    answers: HashMap<CodeMemberKey, CodeMemberShareKind>,
    queries: AtomicUsize,
}

impl StaticSharedCode {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `kind` for the type `type_name`.
    pub fn with_type(mut self, type_name: &str, kind: CodeMemberShareKind) -> Self {
        self.answers.insert(CodeMemberKey::type_key(type_name), kind);
        self
    }

    /// Answers `kind` for property `type_name.property`.
    pub fn with_property(mut self, type_name: &str, property: &str, kind: CodeMemberShareKind) -> Self {
        self.answers
            .insert(CodeMemberKey::property_key(type_name, property), kind);
        self
    }

    /// Number of lookups served.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl SharedCodeLookup for StaticSharedCode {
    fn share_kind(&self, key: &CodeMemberKey) -> CodeMemberShareKind {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.answers
            .get(key)
            .copied()
            .unwrap_or(CodeMemberShareKind::UNKNOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscripted_keys_are_unknown() {
        let shared = StaticSharedCode::new()
            .with_type("Acme.Money", CodeMemberShareKind::SHARED_BY_REFERENCE)
            .with_property("Acme.Order", "Total", CodeMemberShareKind::SHARED_BY_SOURCE);
        assert!(shared.type_share_kind("Acme.Money").is_shared());
        assert!(shared.property_share_kind("Acme.Order", "Total").is_shared());
        assert!(shared.type_share_kind("Acme.Order").is_unknown());
        assert_eq!(shared.query_count(), 3);
    }
}
