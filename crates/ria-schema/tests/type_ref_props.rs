// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical form of type references is a fixed point of parsing.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use ria_schema::TypeRef;

fn type_text() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("int".to_owned()),
        Just("string".to_owned()),
        Just("Guid".to_owned()),
        Just("System.DateTime".to_owned()),
        Just("Acme.Models.Product".to_owned()),
        Just("Customer".to_owned()),
    ];
    leaf.prop_recursive(3, 12, 1, |inner| {
        prop_oneof![
            inner.clone().prop_map(|t| format!("IEnumerable<{t}>")),
            inner.clone().prop_map(|t| format!("IQueryable<{t}>")),
            inner.clone().prop_map(|t| format!("List<{t}>")),
            inner.clone().prop_map(|t| format!("{t}[]")),
            inner.prop_map(|t| format!("Nullable<{t}>")),
        ]
    })
}

proptest! {
    #[test]
    fn canonical_text_reparses_to_the_same_reference(text in type_text()) {
        let parsed = TypeRef::parse(&text).unwrap();
        let canonical = parsed.to_string();
        let reparsed = TypeRef::parse(&canonical).unwrap();
        prop_assert_eq!(&parsed, &reparsed);
        prop_assert_eq!(canonical, reparsed.to_string());
    }
}
