// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end generation over the Northwind catalog.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use ria_codegen::{
    ClientCodeGenerationOptions, CodeDomClientCodeGenerator, CodeGenerationHost,
    DomainServiceClientCodeGenerator, RecordingLoggingService, Severity,
};
use ria_fixtures::{northwind, StaticSharedCode, NORTHWIND_JSON};
use ria_schema::Catalog;
use ria_sharing::CodeMemberShareKind;
use std::sync::Arc;

fn generate_with(
    catalog: &Catalog,
    shared: StaticSharedCode,
    options: &ClientCodeGenerationOptions,
) -> (String, Arc<RecordingLoggingService>) {
    let recorder = Arc::new(RecordingLoggingService::new());
    let host = CodeGenerationHost::new(recorder.clone(), Arc::new(shared));
    let text = CodeDomClientCodeGenerator::new()
        .generate_code(&host, &catalog.descriptions(), options)
        .expect("generation succeeds");
    (text, recorder)
}

fn generate(catalog: &Catalog) -> (String, Arc<RecordingLoggingService>) {
    generate_with(
        catalog,
        StaticSharedCode::new(),
        &ClientCodeGenerationOptions::default(),
    )
}

#[test]
fn northwind_generates_context_entities_and_enums() {
    let (text, recorder) = generate(&northwind());

    assert!(text.contains("namespace Northwind.Services"));
    assert!(text.contains("public sealed partial class OrderContext : DomainContext"));
    assert!(text.contains("public sealed partial class Order : Entity"));
    assert!(text.contains("public sealed partial class OrderLine : Entity"));
    assert!(text.contains("partial class Address : ComplexObject"));
    assert!(text.contains("public enum OrderStatus"));
    assert!(text.contains("public EntityQuery<Northwind.Order> GetOrdersQuery()"));
    assert!(text.contains("SubmitChanges"));
    assert!(text.contains("OrderContextEntityContainer"));
    assert!(recorder.warnings().is_empty(), "{:?}", recorder.warnings());
}

#[test]
fn invoke_operations_get_both_overloads() {
    let (text, _) = generate(&northwind());
    let with_callback = text
        .find(
            "public InvokeOperation<int> CountOrders(Northwind.OrderStatus status, Action<InvokeOperation<int>> callback, object userState)",
        )
        .expect("callback overload");
    let plain = text
        .find("public InvokeOperation<int> CountOrders(Northwind.OrderStatus status)\n")
        .expect("plain overload");
    assert!(with_callback < plain);

    assert!(text.contains("public InvokeOperation Ping(Action<InvokeOperation> callback, object userState)"));
    assert!(text.contains("public InvokeOperation Ping()\n"));
}

#[test]
fn operations_over_non_public_enums_are_skipped_with_one_error() {
    let (text, recorder) = generate(&northwind());
    let errors = recorder.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].severity, Severity::Error);
    assert!(errors[0].message.contains("GetAuditLevel"));

    assert!(!text.contains("GetAuditLevel("));
    assert!(!text.contains("enum AuditLevel"));
    assert!(text.contains("CountOrders("));
    assert!(text.contains("GetCustomerQuery(int id)"));
}

/// One entity, one query and the extra invoke operations in `invokes`.
fn acme_catalog(invokes: &str) -> Catalog {
    let json = format!(
        r#"{{
  "assembly": "Acme.Web",
  "types": [
    {{ "name": "Order", "namespace": "Acme", "kind": "entity",
       "properties": [ {{ "name": "Id", "type": "int", "attributes": [ {{ "type": "Key" }} ] }} ] }}
  ],
  "services": [
    {{ "name": "OrderService", "namespace": "Acme.Services",
       "attributes": [ {{ "type": "EnableClientAccess" }} ],
       "operations": [
         {{ "name": "GetOrders", "kind": "query", "return_type": "IQueryable<Acme.Order>" }},
         {invokes}
       ] }}
  ]
}}"#
    );
    Catalog::from_json(&json).unwrap()
}

#[test]
fn invoke_named_like_an_entity_set_is_skipped_with_one_error() {
    let (text, recorder) = generate(&acme_catalog(r#"{ "name": "Orders", "kind": "invoke", "return_type": "int" }"#));
    let errors = recorder.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].message.contains("'Orders'"));
    assert!(errors[0].message.contains("non-method member"));

    assert!(text.contains("EntitySet<Acme.Order> Orders"));
    assert!(text.contains("GetOrdersQuery("));
    assert!(!text.contains("Orders("));
    assert!(!text.contains("InvokeOperation"));
}

#[test]
fn unresolvable_attribute_is_dropped_and_both_overloads_remain() {
    let (text, recorder) = generate(&acme_catalog(
        r#"{ "name": "Bad", "kind": "invoke",
             "attributes": [ { "type": "CustomValidation", "args": [ { "typeof": "Acme.Missing" }, "Check" ] } ] }"#,
    ));
    let errors = recorder.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].message.contains("CustomValidation"));
    assert!(errors[0].message.contains("'Acme.Missing' could not be resolved"));

    assert!(text.contains("public InvokeOperation Bad(Action<InvokeOperation> callback, object userState)"));
    assert!(text.contains("public InvokeOperation Bad()\n"));
    assert!(!text.contains("Acme.Missing"));
    assert!(!text.contains("[CustomValidation"));
}

#[test]
fn shared_types_and_members_are_not_regenerated() {
    let shared = StaticSharedCode::new()
        .with_type("Northwind.Address", CodeMemberShareKind::SHARED_BY_SOURCE)
        .with_property("Northwind.Customer", "Region", CodeMemberShareKind::SHARED_BY_SOURCE);
    let (text, _) = generate_with(
        &northwind(),
        shared,
        &ClientCodeGenerationOptions::default(),
    );

    assert!(!text.contains("class Address"));
    assert!(!text.contains("public string Region"));
    assert!(!text.contains("OnRegionChanging"));
    assert!(text.contains("public string Name"));
    // The shared complex type is still referenced by the entity.
    assert!(text.contains("public Address ShipTo"));
}

#[test]
fn not_shared_members_are_still_generated() {
    let shared = StaticSharedCode::new()
        .with_type("Northwind.Address", CodeMemberShareKind::NOT_SHARED)
        .with_property("Northwind.Customer", "Region", CodeMemberShareKind::NOT_SHARED);
    let (text, _) = generate_with(
        &northwind(),
        shared,
        &ClientCodeGenerationOptions::default(),
    );
    assert!(text.contains("partial class Address : ComplexObject"));
    assert!(text.contains("public string Region"));
}

#[test]
fn visual_basic_output_uses_vb_syntax() {
    let (text, recorder) = generate_with(
        &northwind(),
        StaticSharedCode::new(),
        &ClientCodeGenerationOptions::for_language("VB"),
    );
    assert!(text.contains("Option Strict On"));
    assert!(text.contains("Imports System.ServiceModel"));
    assert!(text.contains("Partial Public NotInheritable Class OrderContext"));
    assert!(text.contains("Inherits DomainContext"));
    assert!(text.contains("Public Function CountOrders("));
    assert!(text.contains("End Namespace"));
    assert!(!text.contains("public sealed"));
    assert_eq!(recorder.errors().len(), 1);
}

#[test]
fn unsupported_languages_are_rejected() {
    let recorder = Arc::new(RecordingLoggingService::new());
    let host = CodeGenerationHost::new(recorder, Arc::new(StaticSharedCode::new()));
    let result = CodeDomClientCodeGenerator::new().generate_code(
        &host,
        &northwind().descriptions(),
        &ClientCodeGenerationOptions::for_language("F#"),
    );
    assert!(result.is_err());
}

#[test]
fn repeated_runs_are_byte_identical() {
    let catalog = northwind();
    let (first, _) = generate(&catalog);
    let (second, _) = generate(&catalog);
    assert_eq!(first, second);
}

fn shuffled_catalog(type_order: &[usize], op_order: &[usize]) -> Catalog {
    let mut doc: serde_json::Value = serde_json::from_str(NORTHWIND_JSON).unwrap();
    let types = doc["types"].as_array().unwrap().clone();
    doc["types"] = type_order.iter().map(|&i| types[i].clone()).collect();
    let ops = doc["services"][0]["operations"].as_array().unwrap().clone();
    doc["services"][0]["operations"] = op_order.iter().map(|&i| ops[i].clone()).collect();
    Catalog::from_json(&doc.to_string()).unwrap()
}

fn counts() -> (usize, usize) {
    let doc: serde_json::Value = serde_json::from_str(NORTHWIND_JSON).unwrap();
    (
        doc["types"].as_array().unwrap().len(),
        doc["services"][0]["operations"].as_array().unwrap().len(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn declaration_order_does_not_change_output(
        type_order in Just((0..counts().0).collect::<Vec<_>>()).prop_shuffle(),
        op_order in Just((0..counts().1).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let (baseline, _) = generate(&northwind());
        let (shuffled, _) = generate(&shuffled_catalog(&type_order, &op_order));
        prop_assert_eq!(baseline, shuffled);
    }
}
