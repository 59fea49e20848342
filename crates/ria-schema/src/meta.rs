// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-type member classification.
//!
//! A [`MetaType`] records which members of an entity or complex type are
//! keys, data members, associations and round-trip members, whether the
//! type needs its original values sent back on submit, and whether anything
//! in its composition graph carries validation attributes.
//!
//! # Caching
//!
//! Instances are cached per thread, keyed by `(RegistryId, full type name)`.
//! Two threads may each build their own instance for the same type; both are
//! complete and equal. A `MetaType` is fully built before it is inserted, so
//! no reader ever observes a partially populated instance.

use crate::registry::{RegistryId, TypeRegistry};
use crate::type_ref::TypeRef;
use crate::types::{PropertyDesc, TypeDesc, TypeKind};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

thread_local! {
    static META_TYPES: RefCell<HashMap<(RegistryId, String), Arc<MetaType>>> =
        RefCell::new(HashMap::new());
}

/// Classification of one property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaMember {
    /// Property name.
    pub name: String,
    /// Property type.
    pub ty: TypeRef,
    /// Part of the identity.
    pub is_key: bool,
    /// Serialized as a data member.
    pub is_data_member: bool,
    /// Navigation property to other entities.
    pub is_association: bool,
    /// Association whose targets are owned by this entity.
    pub is_composition: bool,
    /// Association into another DomainService's entities.
    pub is_external_reference: bool,
    /// Complex-typed (or a collection of complex values).
    pub is_complex: bool,
    /// Collection-typed.
    pub is_collection: bool,
    /// Original value is sent back on submit.
    pub is_roundtrip: bool,
    /// Refreshed by merge on reload.
    pub is_mergeable: bool,
    /// Carries validation attributes.
    pub requires_validation: bool,
    /// Has a public setter and is not marked `[Editable(false)]`.
    pub is_editable: bool,
}

/// Member classification of one entity or complex type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaType {
    type_name: String,
    kind: TypeKind,
    members: Vec<MetaMember>,
    version_member: Option<String>,
    should_roundtrip_original: bool,
    requires_validation: bool,
    has_composition: bool,
}

impl MetaType {
    /// Returns the cached classification for `type_name`, building it on first use.
    ///
    /// Returns `None` when the registry does not know the type. Must not be
    /// called for predefined types (primitives, enums).
    pub fn get(registry: &TypeRegistry, type_name: &str) -> Option<Arc<Self>> {
        let desc = registry.get(type_name)?;
        debug_assert!(
            desc.kind != TypeKind::Enum,
            "MetaType requested for predefined type {type_name}"
        );
        let key = (registry.id(), desc.full_name());

        if let Some(hit) = META_TYPES.with(|cache| cache.borrow().get(&key).cloned()) {
            return Some(hit);
        }

        let built = Arc::new(Self::build(registry, desc));
        debug!(type_name = %key.1, members = built.members.len(), "meta type built");
        META_TYPES.with(|cache| {
            cache.borrow_mut().insert(key, Arc::clone(&built));
        });
        Some(built)
    }

    fn build(registry: &TypeRegistry, desc: &TypeDesc) -> Self {
        let type_roundtrip = desc.has_attribute("RoundtripOriginal");
        let mut members = Vec::new();
        let mut version_member = None;

        for prop in desc.public_instance_properties() {
            if prop.has_attribute("Exclude") {
                continue;
            }
            let member = classify(registry, prop, type_roundtrip);
            if !member.is_data_member && !member.is_association {
                continue;
            }
            if version_member.is_none()
                && prop.has_attribute("Timestamp")
                && prop.has_attribute("ConcurrencyCheck")
            {
                version_member = Some(member.name.clone());
            }
            members.push(member);
        }

        let should_roundtrip_original = members.iter().any(|m| {
            m.is_data_member
                && m.is_roundtrip
                && !m.is_key
                && version_member.as_deref() != Some(m.name.as_str())
        });

        let mut visited = BTreeSet::new();
        let requires_validation = type_requires_validation(registry, desc, &mut visited);
        let has_composition = members.iter().any(|m| m.is_composition);

        Self {
            type_name: desc.full_name(),
            kind: desc.kind,
            members,
            version_member,
            should_roundtrip_original,
            requires_validation,
            has_composition,
        }
    }

    /// Full name of the described type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Kind of the described type.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// All classified members, ordered by name.
    pub fn members(&self) -> &[MetaMember] {
        &self.members
    }

    /// Looks up a member by name.
    pub fn member(&self, name: &str) -> Option<&MetaMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Key members, ordered by name.
    pub fn key_members(&self) -> impl Iterator<Item = &MetaMember> {
        self.members.iter().filter(|m| m.is_key)
    }

    /// Data members, ordered by name.
    pub fn data_members(&self) -> impl Iterator<Item = &MetaMember> {
        self.members.iter().filter(|m| m.is_data_member)
    }

    /// Association members, ordered by name.
    pub fn association_members(&self) -> impl Iterator<Item = &MetaMember> {
        self.members.iter().filter(|m| m.is_association)
    }

    /// The concurrency version member (`[Timestamp][ConcurrencyCheck]`), if any.
    pub fn version_member(&self) -> Option<&MetaMember> {
        self.version_member.as_deref().and_then(|n| self.member(n))
    }

    /// Whether original values must accompany updates.
    pub fn should_roundtrip_original(&self) -> bool {
        self.should_roundtrip_original
    }

    /// Whether the type or anything it is composed of carries validation attributes.
    pub fn requires_validation(&self) -> bool {
        self.requires_validation
    }

    /// Whether any association member is a composition.
    pub fn has_composition(&self) -> bool {
        self.has_composition
    }
}

fn classify(registry: &TypeRegistry, prop: &PropertyDesc, type_roundtrip: bool) -> MetaMember {
    let is_association = prop.has_attribute("Association");
    let element = prop.ty.element_type().unwrap_nullable();
    let target_kind = registry.kind_of(element);
    let is_complex = target_kind == Some(TypeKind::Complex);
    let is_entity_typed = target_kind == Some(TypeKind::Entity);
    let is_collection = prop.ty.is_collection();

    // Entity-typed members only surface as associations.
    let is_data_member = !is_association && !is_entity_typed;
    let is_key = is_data_member && prop.has_attribute("Key");
    let is_roundtrip = is_data_member
        && (type_roundtrip
            || prop.has_attribute("RoundtripOriginal")
            || prop.has_attribute("ConcurrencyCheck")
            || prop.has_attribute("Timestamp"));
    let editable_false = prop
        .attributes
        .iter()
        .find(|a| a.is("Editable"))
        .and_then(|a| a.bool_arg(0))
        == Some(false);

    MetaMember {
        name: prop.name.clone(),
        ty: prop.ty.clone(),
        is_key,
        is_data_member,
        is_association,
        is_composition: is_association && prop.has_attribute("Composition"),
        is_external_reference: is_association && prop.has_attribute("ExternalReference"),
        is_complex,
        is_collection,
        is_roundtrip,
        is_mergeable: is_data_member && prop.can_write,
        requires_validation: prop.attributes.iter().any(|a| a.is_validation()),
        is_editable: prop.can_write && !editable_false,
    }
}

fn type_requires_validation(
    registry: &TypeRegistry,
    desc: &TypeDesc,
    visited: &mut BTreeSet<String>,
) -> bool {
    if !visited.insert(desc.full_name()) {
        return false;
    }
    if desc.attributes.iter().any(|a| a.is_validation()) {
        return true;
    }
    for prop in desc.public_instance_properties() {
        if prop.has_attribute("Exclude") || prop.has_attribute("Association") {
            continue;
        }
        if prop.attributes.iter().any(|a| a.is_validation()) {
            return true;
        }
        if let Some(complex) = registry
            .resolve(prop.ty.element_type().unwrap_nullable())
            .filter(|t| t.kind == TypeKind::Complex)
        {
            if type_requires_validation(registry, complex, visited) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeDesc;

    fn t(s: &str) -> TypeRef {
        TypeRef::parse(s).unwrap()
    }

    fn versioned(extra: Option<PropertyDesc>) -> TypeRegistry {
        let mut product = TypeDesc::new("Acme", "Product", TypeKind::Entity)
            .with_property(
                PropertyDesc::new("Id", t("int")).with_attribute(AttributeDesc::new("Key")),
            )
            .with_property(
                PropertyDesc::new("RowVersion", t("byte[]"))
                    .with_attribute(AttributeDesc::new("Timestamp"))
                    .with_attribute(AttributeDesc::new("ConcurrencyCheck")),
            )
            .with_property(PropertyDesc::new("Name", t("string")));
        if let Some(extra) = extra {
            product.properties.push(extra);
        }
        TypeRegistry::new(vec![product]).unwrap()
    }

    #[test]
    fn version_member_alone_does_not_require_original() {
        let reg = versioned(None);
        let meta = MetaType::get(&reg, "Acme.Product").unwrap();
        assert_eq!(meta.version_member().map(|m| m.name.as_str()), Some("RowVersion"));
        assert!(!meta.should_roundtrip_original());
    }

    #[test]
    fn another_roundtrip_member_requires_original() {
        let reg = versioned(Some(
            PropertyDesc::new("Price", t("decimal"))
                .with_attribute(AttributeDesc::new("RoundtripOriginal")),
        ));
        let meta = MetaType::get(&reg, "Acme.Product").unwrap();
        assert!(meta.should_roundtrip_original());
    }

    #[test]
    fn members_are_name_ordered_and_keys_detected() {
        let reg = versioned(None);
        let meta = MetaType::get(&reg, "Product").unwrap();
        let names: Vec<_> = meta.members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Name", "RowVersion"]);
        let keys: Vec<_> = meta.key_members().map(|m| m.name.as_str()).collect();
        assert_eq!(keys, vec!["Id"]);
    }

    #[test]
    fn repeated_lookups_on_one_thread_share_an_instance() {
        let reg = versioned(None);
        let a = MetaType::get(&reg, "Acme.Product").unwrap();
        let b = MetaType::get(&reg, "Product").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn validation_is_found_through_cyclic_complex_types() {
        let node = TypeDesc::new("Acme", "Node", TypeKind::Complex)
            .with_property(PropertyDesc::new("Next", t("Acme.Node")))
            .with_property(PropertyDesc::new("Leaf", t("Acme.Leaf")));
        let leaf = TypeDesc::new("Acme", "Leaf", TypeKind::Complex).with_property(
            PropertyDesc::new("Label", t("string")).with_attribute(AttributeDesc::new("Required")),
        );
        let holder = TypeDesc::new("Acme", "Holder", TypeKind::Entity)
            .with_property(PropertyDesc::new("Root", t("Acme.Node")));
        let plain = TypeDesc::new("Acme", "Plain", TypeKind::Complex)
            .with_property(PropertyDesc::new("Self_", t("Acme.Plain")));
        let reg = TypeRegistry::new(vec![node, leaf, holder, plain]).unwrap();

        assert!(MetaType::get(&reg, "Acme.Holder").unwrap().requires_validation());
        assert!(!MetaType::get(&reg, "Acme.Plain").unwrap().requires_validation());
        let root = MetaType::get(&reg, "Acme.Holder").unwrap();
        assert!(root.member("Root").unwrap().is_complex);
    }
}
