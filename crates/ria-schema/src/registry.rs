// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable registry of the types declared by a server assembly.

use crate::error::SchemaError;
use crate::type_ref::TypeRef;
use crate::types::{TypeDesc, TypeKind};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`TypeRegistry`].
///
/// Caches keyed by type name also key by registry so two catalogs that happen
/// to declare the same type name never share entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryId(pub u64);

/// Type lookup table, frozen at construction.
#[derive(Debug)]
pub struct TypeRegistry {
    id: RegistryId,
    types: BTreeMap<String, Arc<TypeDesc>>,
    short_names: BTreeMap<String, Vec<String>>,
}

impl TypeRegistry {
    /// Builds a registry; fails on duplicate full names.
    pub fn new(types: impl IntoIterator<Item = TypeDesc>) -> Result<Self, SchemaError> {
        let mut map = BTreeMap::new();
        let mut short_names: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for ty in types {
            let full = ty.full_name();
            if map.contains_key(&full) {
                return Err(SchemaError::DuplicateType(full));
            }
            short_names
                .entry(ty.name.clone())
                .or_default()
                .push(full.clone());
            map.insert(full, Arc::new(ty));
        }
        Ok(Self {
            id: RegistryId(NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed)),
            types: map,
            short_names,
        })
    }

    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            id: RegistryId(NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed)),
            types: BTreeMap::new(),
            short_names: BTreeMap::new(),
        }
    }

    /// Identity of this registry.
    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry has no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Looks up a type by full name, or by short name when that is unambiguous.
    pub fn get(&self, name: &str) -> Option<&Arc<TypeDesc>> {
        if let Some(ty) = self.types.get(name) {
            return Some(ty);
        }
        match self.short_names.get(name).map(Vec::as_slice) {
            Some([only]) => self.types.get(only),
            _ => None,
        }
    }

    /// Resolves a [`TypeRef::Named`] reference. Other shapes resolve to `None`.
    pub fn resolve(&self, ty: &TypeRef) -> Option<&Arc<TypeDesc>> {
        ty.as_named().and_then(|name| self.get(name))
    }

    /// Kind of the type named by `ty` after unwrapping `Nullable<>`.
    pub fn kind_of(&self, ty: &TypeRef) -> Option<TypeKind> {
        self.resolve(ty.unwrap_nullable()).map(|t| t.kind)
    }

    /// Whether `ty` (after unwrapping `Nullable<>`) is an enum.
    pub fn is_enum(&self, ty: &TypeRef) -> bool {
        self.kind_of(ty) == Some(TypeKind::Enum)
    }

    /// Enum type wrapped by `ty`: the type itself, its `Nullable<>` payload, or a collection element.
    pub fn enum_within(&self, ty: &TypeRef) -> Option<&Arc<TypeDesc>> {
        let candidate = ty.element_type().unwrap_nullable();
        self.resolve(candidate).filter(|t| t.kind == TypeKind::Enum)
    }

    /// Whether `ty` names an entity type.
    pub fn is_entity(&self, ty: &TypeRef) -> bool {
        self.kind_of(ty) == Some(TypeKind::Entity)
    }

    /// Whether `ty` names a complex type.
    pub fn is_complex(&self, ty: &TypeRef) -> bool {
        self.kind_of(ty) == Some(TypeKind::Complex)
    }

    /// Whether `ty` is a predefined simple type: a primitive, an enum, or a
    /// nullable or collection wrapper of one.
    pub fn is_predefined(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Primitive(_) => true,
            TypeRef::Nullable(inner) => self.is_predefined(inner),
            TypeRef::Collection { element, .. } => self.is_predefined(element),
            TypeRef::Named(_) => self.is_enum(ty),
            TypeRef::Void => false,
        }
    }

    /// Canonical full name for `name`, resolving short names.
    pub fn full_name_of(&self, name: &str) -> Option<String> {
        self.get(name).map(|t| t.full_name())
    }

    /// All types ordered by full name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDesc>> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::new(vec![
            TypeDesc::new("Acme.Models", "Product", TypeKind::Entity),
            TypeDesc::new("Acme.Models", "Color", TypeKind::Enum),
            TypeDesc::new("Acme.Other", "Color", TypeKind::Enum),
            TypeDesc::new("Acme.Models", "Address", TypeKind::Complex),
        ])
        .unwrap()
    }

    #[test]
    fn ambiguous_short_names_do_not_resolve() {
        let reg = registry();
        assert!(reg.get("Product").is_some());
        assert!(reg.get("Color").is_none());
        assert!(reg.get("Acme.Other.Color").is_some());
    }

    #[test]
    fn predefined_covers_enums_and_wrappers() {
        let reg = registry();
        let t = |s: &str| TypeRef::parse(s).unwrap();
        assert!(reg.is_predefined(&t("int")));
        assert!(reg.is_predefined(&t("Nullable<Acme.Models.Color>")));
        assert!(reg.is_predefined(&t("IEnumerable<string>")));
        assert!(!reg.is_predefined(&t("Product")));
        assert!(!reg.is_predefined(&t("Address")));
        assert!(reg.enum_within(&t("Acme.Models.Color[]")).is_some());
    }

    #[test]
    fn duplicate_types_are_rejected() {
        let err = TypeRegistry::new(vec![
            TypeDesc::new("A", "B", TypeKind::Class),
            TypeDesc::new("A", "B", TypeKind::Entity),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateType(name) if name == "A.B"));
    }

    #[test]
    fn registry_ids_are_unique() {
        assert_ne!(TypeRegistry::empty().id(), TypeRegistry::empty().id());
    }
}
