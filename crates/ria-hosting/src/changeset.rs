// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Change-set reconciliation for submits.
//!
//! Entries arriving at a DomainService have lost object identity: every
//! entry carries its own copies of the entities it touches, and
//! associations between entries are expressed as lists of entry ids.
//! [`ChangeSetProcessor::create_change_set`] restores a single instance per
//! id and re-links association members from those id lists. Links do not
//! own their targets, so a graph is freed once its entries are dropped.

use crate::error::{ChangeSetError, ValidationResultInfo};
use crate::value::{EntityRef, Value};
use ria_schema::{MetaType, TypeRegistry};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// What a submit does with an entry's entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityOperationType {
    /// Unchanged; present only to carry associations or actions.
    #[default]
    None,
    /// New entity.
    Insert,
    /// Modified entity.
    Update,
    /// Removed entity.
    Delete,
}

/// A named entity action (custom operation) requested for an entry.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityAction {
    /// Custom operation name.
    pub name: String,
    /// Arguments after the entity.
    pub parameters: Vec<Value>,
}

/// One entity change within a submit.
#[derive(Clone, Debug)]
pub struct ChangeSetEntry {
    /// Client-assigned id, unique per entity within the change set.
    pub id: i32,
    /// Requested operation.
    pub operation: EntityOperationType,
    /// Current state.
    pub entity: EntityRef,
    /// Last-known server state, when tracked.
    pub original_entity: Option<EntityRef>,
    /// Association member name to the ids it points at.
    pub associations: BTreeMap<String, Vec<i32>>,
    /// Associations as they were on the original entity.
    pub original_associations: BTreeMap<String, Vec<i32>>,
    /// Custom operations to apply.
    pub entity_actions: Vec<EntityAction>,
    /// Validation errors reported by the service for this entry.
    pub validation_errors: Vec<ValidationResultInfo>,
}

impl ChangeSetEntry {
    /// An entry with no original and no associations.
    pub fn new(id: i32, operation: EntityOperationType, entity: EntityRef) -> Self {
        Self {
            id,
            operation,
            entity,
            original_entity: None,
            associations: BTreeMap::new(),
            original_associations: BTreeMap::new(),
            entity_actions: Vec::new(),
            validation_errors: Vec::new(),
        }
    }

    /// Attaches the original entity.
    pub fn with_original(mut self, original: EntityRef) -> Self {
        self.original_entity = Some(original);
        self
    }

    /// Links `member` to the entries with `ids`.
    pub fn with_association(mut self, member: &str, ids: impl IntoIterator<Item = i32>) -> Self {
        self.associations.insert(member.to_string(), ids.into_iter().collect());
        self
    }

    /// Links `member` of the original entity to the entries with `ids`.
    pub fn with_original_association(mut self, member: &str, ids: impl IntoIterator<Item = i32>) -> Self {
        self.original_associations
            .insert(member.to_string(), ids.into_iter().collect());
        self
    }

    /// Requests a custom operation.
    pub fn with_action(mut self, name: impl Into<String>, parameters: Vec<Value>) -> Self {
        self.entity_actions.push(EntityAction {
            name: name.into(),
            parameters,
        });
        self
    }

    /// Whether the service reported validation errors for this entry.
    pub fn has_error(&self) -> bool {
        !self.validation_errors.is_empty()
    }
}

/// Reconciled entries handed to a DomainService.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    entries: Vec<ChangeSetEntry>,
}

impl ChangeSet {
    /// Entries in submission order.
    pub fn entries(&self) -> &[ChangeSetEntry] {
        &self.entries
    }

    /// Mutable entries, for services recording validation errors.
    pub fn entries_mut(&mut self) -> &mut [ChangeSetEntry] {
        &mut self.entries
    }

    /// Consumes the change set.
    pub fn into_entries(self) -> Vec<ChangeSetEntry> {
        self.entries
    }

    /// Whether any entry carries validation errors.
    pub fn has_error(&self) -> bool {
        self.entries.iter().any(ChangeSetEntry::has_error)
    }

    /// Validation errors of every entry, in entry order.
    pub fn validation_errors(&self) -> Vec<ValidationResultInfo> {
        self.entries
            .iter()
            .flat_map(|e| e.validation_errors.iter().cloned())
            .collect()
    }
}

/// Builds [`ChangeSet`]s from detached entries.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChangeSetProcessor;

/// Canonical current and original instance of one id.
struct Canonical {
    entity: EntityRef,
    original: Option<EntityRef>,
}

impl ChangeSetProcessor {
    /// Unifies entity identity across `entries` and populates association
    /// members from the entries' id lists.
    ///
    /// Deletes that carry an original act on it: the entry's current entity
    /// and associations are replaced by the original ones first.
    pub fn create_change_set(
        registry: &TypeRegistry,
        mut entries: Vec<ChangeSetEntry>,
    ) -> Result<ChangeSet, ChangeSetError> {
        for entry in &mut entries {
            if entry.operation == EntityOperationType::Delete {
                if let Some(original) = entry.original_entity.clone() {
                    entry.entity = original;
                    entry.associations = entry.original_associations.clone();
                }
            }
        }

        let mut canonical: BTreeMap<i32, Canonical> = BTreeMap::new();
        for entry in &entries {
            let slot = canonical.entry(entry.id).or_insert_with(|| Canonical {
                entity: entry.entity.clone(),
                original: None,
            });
            if slot.original.is_none() {
                slot.original.clone_from(&entry.original_entity);
            }
        }
        for entry in &mut entries {
            if let Some(c) = canonical.get(&entry.id) {
                entry.entity = c.entity.clone();
                if entry.original_entity.is_some() {
                    entry.original_entity.clone_from(&c.original);
                }
            }
        }

        // Association members are resolved once per entity type.
        let mut lookups: HashMap<String, BTreeMap<String, bool>> = HashMap::new();
        for entry in &entries {
            let type_name = entry.entity.type_name();
            if let Entry::Vacant(slot) = lookups.entry(type_name.to_string()) {
                slot.insert(association_members(registry, type_name)?);
            }
        }
        debug!(
            entries = entries.len(),
            ids = canonical.len(),
            types = lookups.len(),
            "change set unified"
        );

        for entry in &entries {
            let members = lookups
                .get(entry.entity.type_name())
                .ok_or_else(|| ChangeSetError::UnknownEntityType(entry.entity.type_name().to_string()))?;
            link(entry.id, &entry.entity, &entry.associations, members, &canonical, |c| {
                Some(c.entity.clone())
            })?;
            if let Some(original) = &entry.original_entity {
                link(
                    entry.id,
                    original,
                    &entry.original_associations,
                    members,
                    &canonical,
                    |c| c.original.clone(),
                )?;
            }
        }

        Ok(ChangeSet { entries })
    }
}

/// Association member name to whether it is collection-valued.
fn association_members(
    registry: &TypeRegistry,
    type_name: &str,
) -> Result<BTreeMap<String, bool>, ChangeSetError> {
    let meta = MetaType::get(registry, type_name)
        .ok_or_else(|| ChangeSetError::UnknownEntityType(type_name.to_string()))?;
    Ok(meta
        .association_members()
        .map(|m| (m.name.clone(), m.is_collection))
        .collect())
}

fn link(
    entry_id: i32,
    entity: &EntityRef,
    associations: &BTreeMap<String, Vec<i32>>,
    members: &BTreeMap<String, bool>,
    canonical: &BTreeMap<i32, Canonical>,
    pick: impl Fn(&Canonical) -> Option<EntityRef>,
) -> Result<(), ChangeSetError> {
    for (member, ids) in associations {
        let is_collection = *members.get(member).ok_or_else(|| ChangeSetError::UnknownAssociation {
            type_name: entity.type_name().to_string(),
            association: member.clone(),
        })?;
        for id in ids {
            let target = canonical.get(id).ok_or_else(|| ChangeSetError::UnknownEntryId {
                entry: entry_id,
                association: member.clone(),
                id: *id,
            })?;
            let Some(target) = pick(target) else {
                continue;
            };
            if is_collection {
                entity.link_into_collection(member, &target);
            } else {
                entity.link(member, &target);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ria_schema::{AttributeDesc, PropertyDesc, TypeDesc, TypeKind, TypeRef};

    fn registry() -> TypeRegistry {
        let order = TypeDesc::new("Acme", "Order", TypeKind::Entity)
            .with_property(
                PropertyDesc::new("Id", TypeRef::parse("int").unwrap())
                    .with_attribute(AttributeDesc::new("Key")),
            )
            .with_property(
                PropertyDesc::new("Lines", TypeRef::parse("IEnumerable<Acme.Line>").unwrap())
                    .with_attribute(AttributeDesc::new("Association")),
            );
        let line = TypeDesc::new("Acme", "Line", TypeKind::Entity)
            .with_property(
                PropertyDesc::new("No", TypeRef::parse("int").unwrap())
                    .with_attribute(AttributeDesc::new("Key")),
            )
            .with_property(
                PropertyDesc::new("Order", TypeRef::named("Acme.Order"))
                    .with_attribute(AttributeDesc::new("Association")),
            );
        TypeRegistry::new(vec![order, line]).unwrap()
    }

    #[test]
    fn entries_sharing_an_id_share_an_instance() {
        let reg = registry();
        let a = EntityRef::new("Acme.Order").with("Id", 5);
        let b = EntityRef::new("Acme.Order").with("Id", 5);
        assert_eq!(a, b);
        let set = ChangeSetProcessor::create_change_set(
            &reg,
            vec![
                ChangeSetEntry::new(5, EntityOperationType::Update, a),
                ChangeSetEntry::new(5, EntityOperationType::None, b),
            ],
        )
        .unwrap();
        let [first, second] = set.entries() else {
            unreachable!("two entries in, two out");
        };
        assert!(first.entity.same_instance(&second.entity));
    }

    #[test]
    fn associations_are_linked_both_ways() {
        let reg = registry();
        let order = EntityRef::new("Acme.Order").with("Id", 1);
        let line = EntityRef::new("Acme.Line").with("No", 1);
        let set = ChangeSetProcessor::create_change_set(
            &reg,
            vec![
                ChangeSetEntry::new(1, EntityOperationType::Insert, order.clone())
                    .with_association("Lines", [2, 2]),
                ChangeSetEntry::new(2, EntityOperationType::Insert, line.clone())
                    .with_association("Order", [1]),
            ],
        )
        .unwrap();
        assert!(!set.has_error());
        assert_eq!(order.get("Lines"), Value::List(vec![Value::Entity(line.clone())]));
        assert!(line.get("Order").as_entity().unwrap().same_instance(&order));
    }

    #[test]
    fn linked_graphs_are_freed_with_the_change_set() {
        let reg = registry();
        let order = EntityRef::new("Acme.Order").with("Id", 1);
        let line = EntityRef::new("Acme.Line").with("No", 2);
        let (weak_order, weak_line) = (order.downgrade(), line.downgrade());
        let set = ChangeSetProcessor::create_change_set(
            &reg,
            vec![
                ChangeSetEntry::new(1, EntityOperationType::Update, order).with_association("Lines", [2]),
                ChangeSetEntry::new(2, EntityOperationType::Update, line).with_association("Order", [1]),
            ],
        )
        .unwrap();
        let linked = weak_line.upgrade().unwrap().get("Order");
        assert!(linked.as_entity().unwrap().same_instance(&weak_order.upgrade().unwrap()));
        drop(linked);

        drop(set);
        assert!(weak_order.upgrade().is_none());
        assert!(weak_line.upgrade().is_none());
    }

    #[test]
    fn deletes_act_on_the_original() {
        let reg = registry();
        let current = EntityRef::new("Acme.Line").with("No", 7);
        let original = EntityRef::new("Acme.Line").with("No", 3);
        let parent = EntityRef::new("Acme.Order").with("Id", 9);
        let set = ChangeSetProcessor::create_change_set(
            &reg,
            vec![
                ChangeSetEntry::new(1, EntityOperationType::Delete, current)
                    .with_original(original.clone())
                    .with_association("Order", [4])
                    .with_original_association("Order", [2]),
                ChangeSetEntry::new(2, EntityOperationType::None, parent.clone()),
            ],
        )
        .unwrap();
        let deleted = &set.entries()[0];
        assert!(deleted.entity.same_instance(&original));
        assert_eq!(deleted.associations.get("Order"), Some(&vec![2]));
        assert!(original.get("Order").as_entity().unwrap().same_instance(&parent));
    }

    #[test]
    fn dangling_ids_and_unknown_members_are_rejected() {
        let reg = registry();
        let order = EntityRef::new("Acme.Order");
        let err = ChangeSetProcessor::create_change_set(
            &reg,
            vec![ChangeSetEntry::new(1, EntityOperationType::Update, order.clone())
                .with_association("Lines", [8])],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ChangeSetError::UnknownEntryId {
                entry: 1,
                association: "Lines".into(),
                id: 8
            }
        );

        let err = ChangeSetProcessor::create_change_set(
            &reg,
            vec![ChangeSetEntry::new(1, EntityOperationType::Update, order).with_association("Id", [1])],
        )
        .unwrap_err();
        assert!(matches!(err, ChangeSetError::UnknownAssociation { .. }));
    }
}
