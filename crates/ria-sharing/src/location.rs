// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Member-to-source-file resolution with per-type caching.
//!
//! The first question about any member of a type scans every member of that
//! type (methods, constructors, properties; static and instance; all
//! accessibilities) through the provider chain and caches the results,
//! including explicit "no file" answers. A member's miss is only recorded
//! after every provider has been asked about it.

use crate::filename_map::FilenameMap;
use crate::key::member_signature;
use crate::provider::SourceFileProvider;
use parking_lot::Mutex;
use ria_schema::{MemberRef, TypeDesc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct TypeFiles {
    type_file: usize,
    members: HashMap<String, usize>,
}

impl TypeFiles {
    fn all_ids(&self) -> BTreeSet<usize> {
        std::iter::once(self.type_file)
            .chain(self.members.values().copied())
            .filter(|&id| id != FilenameMap::NOT_A_FILE)
            .collect()
    }
}

#[derive(Debug, Default)]
struct LocationState {
    filenames: FilenameMap,
    /// Keyed by declaring assembly and full name; catalogs may reuse names.
    types: HashMap<(String, String), Arc<TypeFiles>>,
}

/// Resolves the source files that declare types and members.
pub struct SourceFileLocationService {
    providers: Vec<Box<dyn SourceFileProvider>>,
    state: Mutex<LocationState>,
}

impl std::fmt::Debug for SourceFileLocationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFileLocationService")
            .field("providers", &self.providers.len())
            .finish_non_exhaustive()
    }
}

impl SourceFileLocationService {
    /// Creates a service consulting `providers` in priority order.
    pub fn new(providers: Vec<Box<dyn SourceFileProvider>>) -> Self {
        Self {
            providers,
            state: Mutex::new(LocationState::default()),
        }
    }

    /// Id for `path` in the session's filename map.
    pub fn file_id(&self, path: &str) -> usize {
        self.state.lock().filenames.add_or_get(path)
    }

    /// Path for a file id.
    pub fn file_name(&self, id: usize) -> Option<String> {
        self.state.lock().filenames.name(id).map(str::to_owned)
    }

    /// File declaring `member`, or `None` when no provider knows.
    pub fn file_for_member(&self, ty: &TypeDesc, member: &MemberRef<'_>) -> Option<String> {
        let id = self.file_id_for_member(ty, &member_signature(member));
        if id == FilenameMap::NOT_A_FILE {
            return None;
        }
        self.file_name(id)
    }

    /// Every file declaring part of `ty`, sorted.
    pub fn files_for_type(&self, ty: &TypeDesc) -> Vec<String> {
        let ids = self.file_ids_for_type(ty);
        let state = self.state.lock();
        let mut files: Vec<String> = ids
            .iter()
            .filter_map(|&id| state.filenames.name(id).map(str::to_owned))
            .collect();
        files.sort();
        files
    }

    /// File id of the member with the given [`member_signature`].
    pub(crate) fn file_id_for_member(&self, ty: &TypeDesc, signature: &str) -> usize {
        self.scan(ty)
            .members
            .get(signature)
            .copied()
            .unwrap_or(FilenameMap::NOT_A_FILE)
    }

    /// Ids of every file declaring part of `ty`.
    pub(crate) fn file_ids_for_type(&self, ty: &TypeDesc) -> BTreeSet<usize> {
        self.scan(ty).all_ids()
    }

    fn scan(&self, ty: &TypeDesc) -> Arc<TypeFiles> {
        let key = (ty.assembly.clone(), ty.full_name());
        if let Some(hit) = self.state.lock().types.get(&key) {
            return Arc::clone(hit);
        }

        let type_file = self.providers.iter().find_map(|p| p.file_for_type(ty));
        let members: Vec<(String, Option<String>)> = ty
            .members()
            .map(|member| {
                let file = self
                    .providers
                    .iter()
                    .find_map(|p| p.file_for_member(ty, &member));
                (member_signature(&member), file)
            })
            .collect();

        let mut state = self.state.lock();
        if let Some(hit) = state.types.get(&key) {
            return Arc::clone(hit);
        }
        let mut files = TypeFiles {
            type_file: state.filenames.add_or_get_opt(type_file.as_deref()),
            members: HashMap::with_capacity(members.len()),
        };
        for (signature, file) in members {
            let id = state.filenames.add_or_get_opt(file.as_deref());
            files.members.insert(signature, id);
        }
        debug!(
            assembly = %key.0,
            type_name = %key.1,
            members = files.members.len(),
            files = files.all_ids().len(),
            "type scanned for source files"
        );
        let files = Arc::new(files);
        state.types.insert(key, Arc::clone(&files));
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DeclaredSourceProvider;
    use ria_schema::{PropertyDesc, TypeKind, TypeRef};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: Arc<AtomicUsize>,
        answer: Option<&'static str>,
    }

    impl SourceFileProvider for Counting {
        fn file_for_member(&self, _ty: &TypeDesc, _member: &MemberRef<'_>) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.map(str::to_owned)
        }
    }

    fn order() -> TypeDesc {
        let mut ty = TypeDesc::new("Acme", "Order", TypeKind::Entity)
            .with_property(PropertyDesc::new("Id", TypeRef::parse("int").unwrap()))
            .with_property(PropertyDesc::new("Total", TypeRef::parse("decimal").unwrap()));
        ty.properties[1].source_file = Some("/src/Order.shared.cs".into());
        ty
    }

    #[test]
    fn later_providers_answer_earlier_misses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = SourceFileLocationService::new(vec![
            Box::new(Counting {
                calls: Arc::clone(&calls),
                answer: None,
            }),
            Box::new(DeclaredSourceProvider),
        ]);
        let ty = order();
        let total = MemberRef::Property(&ty.properties[1]);
        let id = MemberRef::Property(&ty.properties[0]);
        assert_eq!(
            service.file_for_member(&ty, &total).as_deref(),
            Some("/src/Order.shared.cs")
        );
        assert_eq!(service.file_for_member(&ty, &id), None);
        assert_eq!(service.files_for_type(&ty), vec!["/src/Order.shared.cs"]);
        // One scan of two members, then served from cache.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn first_answer_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = SourceFileLocationService::new(vec![
            Box::new(Counting {
                calls,
                answer: Some("/pdb/Order.cs"),
            }),
            Box::new(DeclaredSourceProvider),
        ]);
        let ty = order();
        let total = MemberRef::Property(&ty.properties[1]);
        assert_eq!(
            service.file_for_member(&ty, &total).as_deref(),
            Some("/pdb/Order.cs")
        );
    }

    #[test]
    fn same_name_in_two_assemblies_is_scanned_separately() {
        let service = SourceFileLocationService::new(vec![Box::new(DeclaredSourceProvider)]);
        let mut web = order();
        web.assembly = "Acme.Web".into();
        let mut admin = order();
        admin.assembly = "Acme.Admin".into();
        admin.properties[1].source_file = Some("/admin/Order.cs".into());

        assert_eq!(service.files_for_type(&web), vec!["/src/Order.shared.cs"]);
        assert_eq!(service.files_for_type(&admin), vec!["/admin/Order.cs"]);
        let total = MemberRef::Property(&web.properties[1]);
        assert_eq!(
            service.file_for_member(&web, &total).as_deref(),
            Some("/src/Order.shared.cs")
        );
    }
}
