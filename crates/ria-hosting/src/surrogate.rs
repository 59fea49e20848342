// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Data-contract surrogates.
//!
//! Entity and complex types can carry descriptor-only ("virtual")
//! properties that serializers do not see on the type itself. A
//! [`SurrogateType`] lists every serialized member of a type, virtual ones
//! included, under the original contract name.
//!
//! Surrogate types are cached process-wide. Lookups take an upgradable read
//! lock and upgrade only to define a missing type, so each source type gets
//! exactly one surrogate even under concurrent callers.

use crate::value::{EntityRef, Value};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use ria_schema::{DomainServiceDescription, MetaType, RegistryId, TypeKind, TypeRef, TypeRegistry};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// One serialized member of a surrogate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurrogateMember {
    /// Member name.
    pub name: String,
    /// Member type.
    pub ty: TypeRef,
    /// Only visible through the type descriptor.
    pub is_virtual: bool,
}

/// A serialization stand-in for an entity or complex type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurrogateType {
    name: String,
    source_type: String,
    contract_name: String,
    members: Vec<SurrogateMember>,
}

impl SurrogateType {
    /// Name of the surrogate type itself.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full name of the type it stands in for.
    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    /// Data contract name; identical to the source type's.
    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    /// Serialized members, ordered by name.
    pub fn members(&self) -> &[SurrogateMember] {
        &self.members
    }
}

type SurrogateCache = RwLock<HashMap<(RegistryId, String), Arc<SurrogateType>>>;

static SURROGATES: OnceLock<SurrogateCache> = OnceLock::new();

fn cache() -> &'static SurrogateCache {
    SURROGATES.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Defines and caches surrogate types.
#[derive(Clone, Copy, Debug, Default)]
pub struct DataContractSurrogateGenerator;

impl DataContractSurrogateGenerator {
    /// Surrogate for `type_name`, defining it on first request.
    ///
    /// Returns `None` for types that are neither entities nor complex types.
    pub fn get_surrogate_type(registry: &TypeRegistry, type_name: &str) -> Option<Arc<SurrogateType>> {
        let desc = registry
            .get(type_name)
            .filter(|d| matches!(d.kind, TypeKind::Entity | TypeKind::Complex))?;
        let key = (registry.id(), desc.full_name());

        let guard = cache().upgradable_read();
        if let Some(hit) = guard.get(&key) {
            return Some(Arc::clone(hit));
        }
        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        let meta = MetaType::get(registry, &key.1)?;
        let members = meta
            .data_members()
            .map(|m| SurrogateMember {
                name: m.name.clone(),
                ty: m.ty.clone(),
                is_virtual: desc.property(&m.name).is_some_and(|p| p.descriptor_only),
            })
            .collect::<Vec<_>>();
        let surrogate = Arc::new(SurrogateType {
            name: format!("{}Surrogate", key.1),
            source_type: key.1.clone(),
            contract_name: desc.name.clone(),
            members,
        });
        debug!(
            source_type = %surrogate.source_type,
            members = surrogate.members.len(),
            "surrogate type defined"
        );
        guard.insert(key, Arc::clone(&surrogate));
        Some(surrogate)
    }

    /// Number of surrogate types defined so far in this process.
    pub fn defined_count() -> usize {
        cache().read().len()
    }
}

/// Projects a DomainService's entity values to and from their surrogates.
#[derive(Debug)]
pub struct DomainServiceSerializationSurrogate {
    by_source: BTreeMap<String, Arc<SurrogateType>>,
    by_surrogate: BTreeMap<String, Arc<SurrogateType>>,
}

impl DomainServiceSerializationSurrogate {
    /// Surrogates for every entity and complex type `description` exposes.
    pub fn new(description: &DomainServiceDescription) -> Self {
        let registry = description.registry();
        let mut by_source = BTreeMap::new();
        let mut by_surrogate = BTreeMap::new();
        for desc in description.entity_types().iter().chain(description.complex_types()) {
            if let Some(surrogate) = DataContractSurrogateGenerator::get_surrogate_type(registry, &desc.full_name()) {
                by_surrogate.insert(surrogate.name.clone(), Arc::clone(&surrogate));
                by_source.insert(surrogate.source_type.clone(), surrogate);
            }
        }
        Self {
            by_source,
            by_surrogate,
        }
    }

    /// Surrogate standing in for `type_name`, if the service exposes it.
    pub fn get_data_contract_type(&self, type_name: &str) -> Option<&Arc<SurrogateType>> {
        self.by_source.get(type_name)
    }

    /// Replaces exposed entities in `value` by surrogate instances carrying
    /// every serialized member.
    pub fn get_object_to_serialize(&self, value: &Value) -> Value {
        self.project(value, |type_name| {
            self.by_source.get(type_name).map(|s| (s.name.as_str(), s.as_ref()))
        })
    }

    /// Turns surrogate instances in `value` back into source entities.
    pub fn get_deserialized_object(&self, value: &Value) -> Value {
        self.project(value, |type_name| {
            self.by_surrogate
                .get(type_name)
                .map(|s| (s.source_type.as_str(), s.as_ref()))
        })
    }

    fn project<'s>(
        &'s self,
        value: &Value,
        target: impl Fn(&str) -> Option<(&'s str, &'s SurrogateType)> + Copy,
    ) -> Value {
        match value {
            Value::List(items) => Value::List(items.iter().map(|v| self.project(v, target)).collect()),
            Value::Entity(entity) => target(entity.type_name()).map_or_else(
                || value.clone(),
                |(type_name, surrogate)| {
                    let projected = EntityRef::new(type_name);
                    for member in &surrogate.members {
                        projected.set(&member.name, self.project(&entity.get(&member.name), target));
                    }
                    Value::Entity(projected)
                },
            ),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ria_schema::{AttributeDesc, PropertyDesc, TypeDesc};

    fn registry() -> TypeRegistry {
        let mut computed = PropertyDesc::new("DisplayName", TypeRef::parse("string").unwrap());
        computed.descriptor_only = true;
        let product = TypeDesc::new("Acme", "Product", TypeKind::Entity)
            .with_property(
                PropertyDesc::new("Id", TypeRef::parse("int").unwrap())
                    .with_attribute(AttributeDesc::new("Key")),
            )
            .with_property(computed)
            .with_property(
                PropertyDesc::new("Secret", TypeRef::parse("string").unwrap())
                    .with_attribute(AttributeDesc::new("Exclude")),
            );
        let code = TypeDesc::new("Acme", "Code", TypeKind::Enum);
        TypeRegistry::new(vec![product, code]).unwrap()
    }

    #[test]
    fn surrogates_include_virtual_members_only_once() {
        let reg = registry();
        let a = DataContractSurrogateGenerator::get_surrogate_type(&reg, "Acme.Product").unwrap();
        let b = DataContractSurrogateGenerator::get_surrogate_type(&reg, "Product").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.contract_name(), "Product");
        let members: Vec<_> = a.members().iter().map(|m| (m.name.as_str(), m.is_virtual)).collect();
        assert_eq!(members, vec![("DisplayName", true), ("Id", false)]);
    }

    #[test]
    fn enums_have_no_surrogate() {
        let reg = registry();
        assert!(DataContractSurrogateGenerator::get_surrogate_type(&reg, "Acme.Code").is_none());
        assert!(DataContractSurrogateGenerator::get_surrogate_type(&reg, "Acme.Missing").is_none());
    }

    #[test]
    fn concurrent_lookups_define_one_surrogate() {
        let reg = Arc::new(registry());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    DataContractSurrogateGenerator::get_surrogate_type(&reg, "Acme.Product").unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
