// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Runtime values passed through hosted proxies.
//!
//! Entities are shared, mutable objects: two [`EntityRef`]s may compare equal
//! by value while being different instances. Change-set reconciliation relies
//! on that distinction ([`EntityRef::same_instance`]).

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::ptr;
use std::sync::{Arc, Weak};

/// A parameter, result or property value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Any integral value.
    Int(i64),
    /// Any floating-point value.
    Float(f64),
    /// Text.
    Str(String),
    /// Sequence of values.
    List(Vec<Value>),
    /// Reference to an entity or complex object.
    Entity(EntityRef),
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The referenced entity, if any.
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// Integral payload.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Text payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON value. Objects become untyped entities.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => {
                let entity = EntityRef::new("");
                for (k, v) in map {
                    entity.set(k, Self::from_json(v));
                }
                Self::Entity(entity)
            }
        }
    }
}

impl PartialEq for Value {
    /// Entity references compare by identity here, so that comparing two
    /// entity graphs never recurses through back-references.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Entity(a), Self::Entity(b)) => a.same_instance(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<EntityRef> for Value {
    fn from(v: EntityRef) -> Self {
        Self::Entity(v)
    }
}

struct Entity {
    type_name: String,
    properties: RwLock<BTreeMap<String, Slot>>,
}

/// Stored form of a property.
///
/// Association links made by change-set reconciliation point both ways
/// (`Order.Lines` and `Line.Order`), so they are held as [`Weak`] handles.
/// Reads resolve them; a link whose target is gone reads as absent.
#[derive(Clone)]
enum Slot {
    Value(Value),
    Link(Weak<Entity>),
    Links(Vec<Member>),
}

#[derive(Clone)]
enum Member {
    Value(Value),
    Link(Weak<Entity>),
}

impl Slot {
    fn resolve(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Link(weak) => weak.upgrade().map_or(Value::Null, |e| Value::Entity(EntityRef(e))),
            Self::Links(members) => Value::List(
                members
                    .iter()
                    .filter_map(|m| match m {
                        Member::Value(v) => Some(v.clone()),
                        Member::Link(weak) => weak.upgrade().map(|e| Value::Entity(EntityRef(e))),
                    })
                    .collect(),
            ),
        }
    }
}

impl Member {
    fn is_instance(&self, target: &EntityRef) -> bool {
        match self {
            Self::Value(v) => v.as_entity().is_some_and(|e| e.same_instance(target)),
            Self::Link(weak) => ptr::eq(weak.as_ptr(), Arc::as_ptr(&target.0)),
        }
    }
}

/// Shared handle to a mutable entity instance.
#[derive(Clone)]
pub struct EntityRef(Arc<Entity>);

/// Non-owning handle to an entity instance.
#[derive(Clone)]
pub struct WeakEntityRef(Weak<Entity>);

impl WeakEntityRef {
    /// The entity, while some [`EntityRef`] still holds it.
    pub fn upgrade(&self) -> Option<EntityRef> {
        self.0.upgrade().map(EntityRef)
    }
}

impl fmt::Debug for WeakEntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakEntityRef")
            .field(&format_args!("{:#x}", self.0.as_ptr() as usize))
            .finish()
    }
}

impl EntityRef {
    /// A new instance of `type_name` with no properties set.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self(Arc::new(Entity {
            type_name: type_name.into(),
            properties: RwLock::new(BTreeMap::new()),
        }))
    }

    /// Sets a property and returns the handle.
    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }

    /// Full name of the entity's type.
    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    /// Current value of a property (`Null` when unset).
    pub fn get(&self, name: &str) -> Value {
        self.0
            .properties
            .read()
            .get(name)
            .map(Slot::resolve)
            .unwrap_or_default()
    }

    /// Assigns a property. The entity owns whatever `value` references.
    pub fn set(&self, name: &str, value: Value) {
        self.0.properties.write().insert(name.to_string(), Slot::Value(value));
    }

    /// Points the single-valued association `name` at `target` without
    /// keeping it alive.
    pub fn link(&self, name: &str, target: &Self) {
        let mut props = self.0.properties.write();
        if props
            .get(name)
            .is_some_and(|slot| matches!(slot, Slot::Link(w) if ptr::eq(w.as_ptr(), Arc::as_ptr(&target.0))))
        {
            return;
        }
        props.insert(name.to_string(), Slot::Link(Arc::downgrade(&target.0)));
    }

    /// Appends `item` to the collection association `name` without keeping
    /// it alive, unless that exact instance is already present. Items the
    /// collection already owned stay owned. Returns whether it was added.
    pub fn link_into_collection(&self, name: &str, item: &Self) -> bool {
        let mut props = self.0.properties.write();
        let slot = props
            .entry(name.to_string())
            .or_insert_with(|| Slot::Links(Vec::new()));
        if let Slot::Value(Value::List(items)) = slot {
            let owned = std::mem::take(items);
            *slot = Slot::Links(owned.into_iter().map(Member::Value).collect());
        } else if !matches!(slot, Slot::Links(_)) {
            *slot = Slot::Links(Vec::new());
        }
        let Slot::Links(members) = slot else {
            return false;
        };
        if members.iter().any(|m| m.is_instance(item)) {
            return false;
        }
        members.push(Member::Link(Arc::downgrade(&item.0)));
        true
    }

    /// Snapshot of all set properties, with links resolved.
    pub fn properties(&self) -> BTreeMap<String, Value> {
        self.0
            .properties
            .read()
            .iter()
            .map(|(name, slot)| (name.clone(), slot.resolve()))
            .collect()
    }

    /// Whether both handles point at the same instance.
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Non-owning handle to this instance.
    pub fn downgrade(&self) -> WeakEntityRef {
        WeakEntityRef(Arc::downgrade(&self.0))
    }

    /// A new instance with the same type and a shallow copy of the
    /// properties. Links stay links.
    pub fn shallow_clone(&self) -> Self {
        Self(Arc::new(Entity {
            type_name: self.0.type_name.clone(),
            properties: RwLock::new(self.0.properties.read().clone()),
        }))
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for EntityRef {
    /// Value equality: same type and equal properties. Nested entities are
    /// compared by identity.
    fn eq(&self, other: &Self) -> bool {
        if self.same_instance(other) {
            return true;
        }
        self.type_name() == other.type_name() && self.properties() == other.properties()
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("type_name", &self.0.type_name)
            .field("addr", &format_args!("{:#x}", self.addr()))
            .finish()
    }
}

/// Original values keyed by entity instance, as tracked by a proxy while
/// it forwards updates and deletes.
#[derive(Debug, Default)]
pub struct OriginalEntityMap {
    entries: BTreeMap<usize, (EntityRef, EntityRef)>,
}

impl OriginalEntityMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `original` as the last-known state of `current`.
    pub fn insert(&mut self, current: &EntityRef, original: EntityRef) {
        self.entries.insert(current.addr(), (current.clone(), original));
    }

    /// Original recorded for exactly this instance.
    pub fn get(&self, current: &EntityRef) -> Option<&EntityRef> {
        self.entries.get(&current.addr()).map(|(_, original)| original)
    }

    /// Forgets the entry for `current`.
    pub fn remove(&mut self, current: &EntityRef) -> Option<EntityRef> {
        self.entries.remove(&current.addr()).map(|(_, original)| original)
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_entities_are_not_the_same_instance() {
        let a = EntityRef::new("Acme.Order").with("Id", 5);
        let b = EntityRef::new("Acme.Order").with("Id", 5);
        assert_eq!(a, b);
        assert!(!a.same_instance(&b));
        assert_ne!(Value::Entity(a.clone()), Value::Entity(b));
        assert_eq!(Value::Entity(a.clone()), Value::Entity(a));
    }

    #[test]
    fn collection_links_are_deduplicated_by_instance() {
        let order = EntityRef::new("Acme.Order");
        let line = EntityRef::new("Acme.Line").with("No", 1);
        let twin = line.shallow_clone();
        assert!(order.link_into_collection("Lines", &line));
        assert!(!order.link_into_collection("Lines", &line));
        assert!(order.link_into_collection("Lines", &twin));
        assert!(matches!(order.get("Lines"), Value::List(items) if items.len() == 2));
    }

    #[test]
    fn links_do_not_keep_targets_alive() {
        let order = EntityRef::new("Acme.Order");
        let kept = EntityRef::new("Acme.Line").with("No", 1);
        order.set("Lines", Value::List(vec![Value::Entity(kept.clone())]));
        let linked = EntityRef::new("Acme.Line").with("No", 2);
        assert!(order.link_into_collection("Lines", &linked));
        assert!(!order.link_into_collection("Lines", &kept));
        linked.link("Order", &order);
        assert!(linked.get("Order").as_entity().unwrap().same_instance(&order));

        let weak = linked.downgrade();
        drop(linked);
        assert!(weak.upgrade().is_none());
        assert_eq!(order.get("Lines"), Value::List(vec![Value::Entity(kept.clone())]));

        let parent = EntityRef::new("Acme.Order");
        kept.link("Order", &parent);
        drop(parent);
        assert!(kept.get("Order").is_null());
    }

    #[test]
    fn original_map_is_keyed_by_instance() {
        let mut map = OriginalEntityMap::new();
        let current = EntityRef::new("Acme.Order").with("Id", 1);
        let twin = current.shallow_clone();
        map.insert(&current, current.shallow_clone());
        assert!(map.get(&current).is_some());
        assert!(map.get(&twin).is_none());
        assert!(map.remove(&current).is_some());
        assert!(map.is_empty());
    }

    #[test]
    fn json_objects_become_entities() {
        let json = serde_json::json!({ "Id": 3, "Tags": ["a", "b"], "Ratio": 0.5 });
        let value = Value::from_json(&json);
        let entity = value.as_entity().unwrap();
        assert_eq!(entity.get("Id"), Value::Int(3));
        assert_eq!(entity.get("Ratio"), Value::Float(0.5));
        assert_eq!(entity.get("Tags"), Value::List(vec!["a".into(), "b".into()]));
    }
}
