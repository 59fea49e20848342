// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sources of "which file declares this member" answers.

use crate::key::member_signature;
use parking_lot::Mutex;
use ria_schema::{MemberRef, TypeDesc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Answers which source file declares a member.
///
/// Providers are consulted in priority order by
/// [`SourceFileLocationService`](crate::SourceFileLocationService); the first
/// `Some` wins.
pub trait SourceFileProvider: Send + Sync {
    /// Absolute path of the file declaring `member` of `ty`, if known.
    fn file_for_member(&self, ty: &TypeDesc, member: &MemberRef<'_>) -> Option<String>;

    /// Absolute path of a file declaring `ty` itself, if known independently
    /// of its members.
    fn file_for_type(&self, _ty: &TypeDesc) -> Option<String> {
        None
    }
}

/// Uses the `source_file` annotations carried by the metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredSourceProvider;

impl SourceFileProvider for DeclaredSourceProvider {
    fn file_for_member(&self, _ty: &TypeDesc, member: &MemberRef<'_>) -> Option<String> {
        member.declared_source_file().map(str::to_owned)
    }

    fn file_for_type(&self, ty: &TypeDesc) -> Option<String> {
        ty.source_file.clone()
    }
}

/// Contents of one `<assembly>.symbols.json` file.
#[derive(Debug, Default, Deserialize)]
struct SymbolDocument {
    #[serde(default)]
    types: BTreeMap<String, SymbolType>,
}

#[derive(Debug, Default, Deserialize)]
struct SymbolType {
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    members: BTreeMap<String, String>,
}

/// Reads member locations from symbol files found on a search path.
///
/// For an assembly `Acme.Web` the provider looks for `Acme.Web.symbols.json`
/// in each search directory in order. Member entries are keyed by
/// [`member_signature`]. Each assembly's file is read at most once; a missing
/// or unreadable file is remembered as absent.
#[derive(Debug)]
pub struct SymbolFileProvider {
    search_paths: Vec<PathBuf>,
    loaded: Mutex<HashMap<String, Option<Arc<SymbolDocument>>>>,
}

impl SymbolFileProvider {
    /// Creates a provider searching `search_paths` in order.
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Directories searched for symbol files.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn document(&self, assembly: &str) -> Option<Arc<SymbolDocument>> {
        let assembly = assembly.split(',').next().unwrap_or(assembly).trim();
        if assembly.is_empty() {
            return None;
        }
        let mut loaded = self.loaded.lock();
        if let Some(doc) = loaded.get(assembly) {
            return doc.clone();
        }
        let doc = self.load(assembly).map(Arc::new);
        loaded.insert(assembly.to_owned(), doc.clone());
        doc
    }

    fn load(&self, assembly: &str) -> Option<SymbolDocument> {
        let file_name = format!("{assembly}.symbols.json");
        let path = self
            .search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|p| p.is_file())?;
        match read_document(&path) {
            Ok(doc) => {
                debug!(path = %path.display(), types = doc.types.len(), "symbol file loaded");
                Some(doc)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable symbol file");
                None
            }
        }
    }
}

fn read_document(path: &Path) -> Result<SymbolDocument, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

impl SourceFileProvider for SymbolFileProvider {
    fn file_for_member(&self, ty: &TypeDesc, member: &MemberRef<'_>) -> Option<String> {
        let doc = self.document(&ty.assembly)?;
        let entry = doc.types.get(&ty.full_name())?;
        entry.members.get(&member_signature(member)).cloned()
    }

    fn file_for_type(&self, ty: &TypeDesc) -> Option<String> {
        let doc = self.document(&ty.assembly)?;
        doc.types.get(&ty.full_name())?.file.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ria_schema::{PropertyDesc, TypeKind, TypeRef};

    fn order() -> TypeDesc {
        let mut ty = TypeDesc::new("Acme", "Order", TypeKind::Entity)
            .with_property(PropertyDesc::new("Total", TypeRef::parse("decimal").unwrap()));
        ty.assembly = "Acme.Web, Version=1.0.0.0".into();
        ty
    }

    #[test]
    fn symbol_files_are_found_on_the_search_path() {
        let empty = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Acme.Web.symbols.json"),
            r#"{ "types": { "Acme.Order": { "file": "/src/Order.cs",
                 "members": { "Total": "/src/Order.Total.cs" } } } }"#,
        )
        .unwrap();
        let provider = SymbolFileProvider::new([empty.path(), dir.path()]);
        let ty = order();
        let total = MemberRef::Property(&ty.properties[0]);
        assert_eq!(
            provider.file_for_member(&ty, &total).as_deref(),
            Some("/src/Order.Total.cs")
        );
        assert_eq!(provider.file_for_type(&ty).as_deref(), Some("/src/Order.cs"));
    }

    #[test]
    fn corrupt_symbol_files_are_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Acme.Web.symbols.json"), "{ not json").unwrap();
        let provider = SymbolFileProvider::new([dir.path()]);
        let ty = order();
        assert!(provider.file_for_type(&ty).is_none());
    }

    #[test]
    fn declared_sources_come_from_metadata() {
        let mut ty = order();
        ty.properties[0].source_file = Some("/src/Order.shared.cs".into());
        let total = MemberRef::Property(&ty.properties[0]);
        assert_eq!(
            DeclaredSourceProvider.file_for_member(&ty, &total).as_deref(),
            Some("/src/Order.shared.cs")
        );
    }
}
