// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Intersection of member source files with the set of shared files.

use crate::key::{method_signature, CodeMemberKey};
use crate::location::SourceFileLocationService;
use ria_schema::{is_system_assembly, TypeDesc};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Shared-file set plus the location service used to test members against it.
#[derive(Debug)]
pub struct SharedSourceFiles {
    location: Arc<SourceFileLocationService>,
    shared_ids: BTreeSet<usize>,
}

impl SharedSourceFiles {
    /// Registers `shared_files` with the location service's filename map.
    pub fn new<I, S>(location: Arc<SourceFileLocationService>, shared_files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let shared_ids = shared_files
            .into_iter()
            .map(|path| location.file_id(path.as_ref()))
            .filter(|&id| id != crate::FilenameMap::NOT_A_FILE)
            .collect();
        Self {
            location,
            shared_ids,
        }
    }

    /// The underlying location service.
    pub fn location(&self) -> &Arc<SourceFileLocationService> {
        &self.location
    }

    /// Number of distinct shared files.
    pub fn shared_file_count(&self) -> usize {
        self.shared_ids.len()
    }

    /// Ids of the files declaring the member `key` names within `ty`.
    ///
    /// Returns `None` when there is no file information, when the member does
    /// not exist, or when `ty` lives in a system assembly (never inspected).
    pub fn declaring_file_ids(&self, ty: &TypeDesc, key: &CodeMemberKey) -> Option<BTreeSet<usize>> {
        if is_system_assembly(&ty.assembly) {
            return None;
        }
        let ids: BTreeSet<usize> = match key {
            CodeMemberKey::Type { .. } => self.location.file_ids_for_type(ty),
            CodeMemberKey::Property { property, .. } => {
                ty.property(property)?;
                single(self.location.file_id_for_member(ty, property))
            }
            CodeMemberKey::Method {
                method,
                parameter_types,
                ..
            } => {
                ty.method(method, parameter_types)?;
                let signature = method_signature(method, parameter_types);
                single(self.location.file_id_for_member(ty, &signature))
            }
        };
        (!ids.is_empty()).then_some(ids)
    }

    /// Ids of the declaring files of `key` that are in the shared set, or
    /// `None` when there are none.
    pub fn get_shared_file_ids(&self, ty: &TypeDesc, key: &CodeMemberKey) -> Option<Vec<usize>> {
        let shared: Vec<usize> = self
            .declaring_file_ids(ty, key)?
            .intersection(&self.shared_ids)
            .copied()
            .collect();
        (!shared.is_empty()).then_some(shared)
    }
}

fn single(id: usize) -> BTreeSet<usize> {
    if id == crate::FilenameMap::NOT_A_FILE {
        BTreeSet::new()
    } else {
        BTreeSet::from([id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DeclaredSourceProvider;
    use ria_schema::{MethodDesc, PropertyDesc, TypeKind, TypeRef};

    fn order(assembly: &str) -> TypeDesc {
        let mut ty = TypeDesc::new("Acme", "Order", TypeKind::Entity)
            .with_property(PropertyDesc::new("Id", TypeRef::parse("int").unwrap()))
            .with_property(PropertyDesc::new("Total", TypeRef::parse("decimal").unwrap()));
        ty.assembly = assembly.into();
        ty.properties[0].source_file = Some("/src/Order.cs".into());
        ty.properties[1].source_file = Some("/src/Order.shared.cs".into());
        ty.methods.push(MethodDesc {
            name: "Recalculate".into(),
            parameters: Vec::new(),
            return_type: TypeRef::Void,
            is_static: false,
            visibility: ria_schema::Visibility::Public,
            attributes: Vec::new(),
            source_file: None,
        });
        ty
    }

    fn shared() -> SharedSourceFiles {
        let location = Arc::new(SourceFileLocationService::new(vec![Box::new(
            DeclaredSourceProvider,
        )]));
        SharedSourceFiles::new(location, ["/SRC/order.shared.cs", ""])
    }

    #[test]
    fn shared_ids_are_the_intersection_with_declaring_files() {
        let files = shared();
        let ty = order("Acme.Web");
        assert_eq!(files.shared_file_count(), 1);

        let total = CodeMemberKey::property_key("Acme.Order", "Total");
        let id = CodeMemberKey::property_key("Acme.Order", "Id");
        let whole = CodeMemberKey::type_key("Acme.Order");
        assert_eq!(files.get_shared_file_ids(&ty, &total).map(|v| v.len()), Some(1));
        assert_eq!(files.get_shared_file_ids(&ty, &id), None);
        assert!(files.declaring_file_ids(&ty, &id).is_some());
        assert_eq!(files.declaring_file_ids(&ty, &whole).map(|s| s.len()), Some(2));
        assert!(files.get_shared_file_ids(&ty, &whole).is_some());
    }

    #[test]
    fn members_without_file_information_yield_none() {
        let files = shared();
        let ty = order("Acme.Web");
        let method = CodeMemberKey::method_key("Acme.Order", "Recalculate", Vec::new());
        let missing = CodeMemberKey::property_key("Acme.Order", "Nope");
        assert_eq!(files.declaring_file_ids(&ty, &method), None);
        assert_eq!(files.declaring_file_ids(&ty, &missing), None);
    }

    #[test]
    fn system_types_are_never_inspected() {
        let files = shared();
        let ty = order("System.Runtime");
        let total = CodeMemberKey::property_key("Acme.Order", "Total");
        assert_eq!(files.declaring_file_ids(&ty, &total), None);
        assert_eq!(files.location().files_for_type(&ty).len(), 2);
    }
}
