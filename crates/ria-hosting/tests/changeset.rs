// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Change-set identity reconciliation over arbitrary entry batches.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use ria_fixtures::northwind;
use ria_hosting::{ChangeSetEntry, ChangeSetProcessor, EntityOperationType, EntityRef};

proptest! {
    #[test]
    fn every_id_resolves_to_one_instance(ids in proptest::collection::vec(0i32..6, 1..24)) {
        let catalog = northwind();
        let entries: Vec<_> = ids
            .iter()
            .map(|&id| {
                let order = EntityRef::new("Northwind.Order").with("OrderId", id);
                ChangeSetEntry::new(id, EntityOperationType::Update, order)
            })
            .collect();
        let set = ChangeSetProcessor::create_change_set(catalog.registry(), entries).unwrap();
        prop_assert_eq!(set.entries().len(), ids.len());
        for a in set.entries() {
            for b in set.entries() {
                prop_assert_eq!(a.id == b.id, a.entity.same_instance(&b.entity));
            }
        }
    }
}

#[test]
fn composition_children_are_linked_to_their_order() {
    let catalog = northwind();
    let order = EntityRef::new("Northwind.Order").with("OrderId", 1);
    let line_a = EntityRef::new("Northwind.OrderLine").with("LineNo", 1);
    let line_b = EntityRef::new("Northwind.OrderLine").with("LineNo", 2);
    let set = ChangeSetProcessor::create_change_set(
        catalog.registry(),
        vec![
            ChangeSetEntry::new(1, EntityOperationType::Update, order.shallow_clone())
                .with_association("Lines", [2, 3]),
            ChangeSetEntry::new(2, EntityOperationType::Insert, line_a),
            ChangeSetEntry::new(3, EntityOperationType::Insert, line_b),
            ChangeSetEntry::new(1, EntityOperationType::None, order.clone()).with_association("Lines", [3]),
        ],
    )
    .unwrap();
    let canonical = &set.entries()[0].entity;
    assert!(set.entries()[3].entity.same_instance(canonical));
    assert!(!canonical.same_instance(&order));
    let lines = canonical.get("Lines");
    let ria_hosting::Value::List(items) = lines else {
        unreachable!("Lines is a collection");
    };
    assert_eq!(items.len(), 2);
}
