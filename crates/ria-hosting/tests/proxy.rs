// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Hosted proxies over an in-memory Northwind order service.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use parking_lot::Mutex;
use ria_fixtures::northwind;
use ria_hosting::{
    ChangeSet, ContractMethod, ContractParameter, DomainOperationType, DomainService, DomainServiceContext,
    DomainServiceFactory, DomainServiceProxyGenerator, DomainServiceProxyHelper, EntityOperationType, EntityRef,
    InvokeResult, ProxyCallError, ProxyGenerationError, ProxyModule, QueryResult, ServiceContract,
    ValidationResultInfo, Value,
};
use ria_schema::{Catalog, DomainServiceDescription, TypeRef, Visibility};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Journal {
    created: Vec<DomainOperationType>,
    disposed: usize,
    submitted: Vec<(EntityOperationType, Vec<String>, bool)>,
}

struct FakeOrders {
    journal: Arc<Mutex<Journal>>,
}

impl DomainService for FakeOrders {
    fn initialize(&mut self, context: &DomainServiceContext) {
        self.journal.lock().created.push(context.operation_type);
    }

    fn query(&mut self, operation: &str, parameters: &[Value]) -> Result<QueryResult, ProxyCallError> {
        match operation {
            "GetOrders" => Ok(QueryResult::rows(vec![
                EntityRef::new("Northwind.Order").with("OrderId", 1).into(),
                EntityRef::new("Northwind.Order").with("OrderId", 2).into(),
            ])),
            "GetCustomer" => {
                let id = parameters[0].as_int().unwrap_or_default();
                Ok(QueryResult::rows(vec![EntityRef::new("Northwind.Customer")
                    .with("Id", id)
                    .into()]))
            }
            _ => Ok(QueryResult::default()),
        }
    }

    fn invoke(&mut self, operation: &str, _parameters: &mut [Value]) -> Result<InvokeResult, ProxyCallError> {
        match operation {
            "CountOrders" => Ok(InvokeResult::value(42)),
            "Ping" => Ok(InvokeResult::value("pong")),
            other => Err(ProxyCallError::Fault(format!("unexpected {other}"))),
        }
    }

    fn submit(&mut self, change_set: &mut ChangeSet) -> Result<(), ProxyCallError> {
        let mut journal = self.journal.lock();
        for entry in change_set.entries_mut() {
            let actions: Vec<String> = entry.entity_actions.iter().map(|a| a.name.clone()).collect();
            journal
                .submitted
                .push((entry.operation, actions, entry.original_entity.is_some()));
            let empty_carrier = entry
                .entity_actions
                .iter()
                .any(|a| a.name == "Ship" && a.parameters.first().and_then(Value::as_str) == Some(""));
            if empty_carrier {
                entry
                    .validation_errors
                    .push(ValidationResultInfo::new("A carrier is required").for_members(["carrier"]));
            }
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.journal.lock().disposed += 1;
    }
}

fn factory(journal: &Arc<Mutex<Journal>>) -> Arc<dyn DomainServiceFactory> {
    let journal = Arc::clone(journal);
    Arc::new(
        move |_: &Arc<DomainServiceDescription>, _: &DomainServiceContext| -> Box<dyn DomainService> {
            Box::new(FakeOrders {
                journal: Arc::clone(&journal),
            })
        },
    )
}

fn order_service() -> Arc<DomainServiceDescription> {
    northwind().description("OrderService").unwrap()
}

#[test]
fn contract_calls_reach_the_domain_service() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let service = order_service();
    let contract = ServiceContract::from_description(&service);
    let helper = DomainServiceProxyHelper::new(factory(&journal));
    let mut proxy = helper
        .create_proxy(&contract, &service, DomainServiceContext::for_user("ada"))
        .unwrap();

    let orders = proxy.call("GetOrders", &mut []).unwrap();
    assert!(matches!(orders, Value::List(ref rows) if rows.len() == 2));

    let customer = proxy.call("GetCustomer", &mut [Value::Int(7)]).unwrap();
    assert_eq!(customer.as_entity().unwrap().get("Id"), Value::Int(7));

    assert_eq!(proxy.call("CountOrders", &mut [Value::Int(1)]).unwrap(), Value::Int(42));
    assert_eq!(proxy.call("Ping", &mut []).unwrap(), Value::Null);

    let created = journal.lock().created.clone();
    assert_eq!(
        created,
        vec![
            DomainOperationType::Query,
            DomainOperationType::Query,
            DomainOperationType::Invoke,
            DomainOperationType::Invoke
        ]
    );
    assert_eq!(proxy.domain_service_instances().len(), 4);
    assert_eq!(proxy.context().and_then(|c| c.user.as_deref()), Some("ada"));
}

#[test]
fn submits_track_originals_and_custom_actions() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let service = order_service();
    let helper = DomainServiceProxyHelper::new(factory(&journal));
    let mut proxy = helper
        .create_proxy(
            &ServiceContract::from_description(&service),
            &service,
            DomainServiceContext::new(),
        )
        .unwrap();

    let order = EntityRef::new("Northwind.Order").with("OrderId", 10);
    proxy.call("InsertOrder", &mut [order.clone().into()]).unwrap();
    assert!(proxy.current_original_entity_map().get(&order).is_some());

    proxy.call("UpdateOrder", &mut [order.clone().into()]).unwrap();
    proxy
        .call("Ship", &mut [order.clone().into(), Value::from("UPS")])
        .unwrap();
    let err = proxy
        .call("Ship", &mut [order.clone().into(), Value::from("")])
        .unwrap_err();
    match err {
        ProxyCallError::Operation(op) => {
            assert_eq!(op.operation, "Ship");
            assert_eq!(op.validation_errors[0].source_member_names, vec!["carrier"]);
        }
        other => unreachable!("expected an operation error, got {other}"),
    }

    proxy.call("DeleteOrder", &mut [order.clone().into()]).unwrap();
    assert!(proxy.current_original_entity_map().get(&order).is_none());

    let submitted = journal.lock().submitted.clone();
    assert_eq!(
        submitted,
        vec![
            (EntityOperationType::Insert, vec![], false),
            (EntityOperationType::Update, vec![], true),
            (EntityOperationType::Update, vec!["Ship".to_string()], true),
            (EntityOperationType::Update, vec!["Ship".to_string()], true),
            (EntityOperationType::Delete, vec![], true),
        ]
    );
}

#[test]
fn dropping_a_proxy_disposes_every_instance() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let service = order_service();
    let helper = DomainServiceProxyHelper::new(factory(&journal));
    let mut proxy = helper
        .create_proxy(
            &ServiceContract::from_description(&service),
            &service,
            DomainServiceContext::new(),
        )
        .unwrap();
    proxy.call("GetOrders", &mut []).unwrap();
    proxy.call("Ping", &mut []).unwrap();
    proxy.dispose();
    assert_eq!(journal.lock().disposed, 2);
    assert!(proxy.domain_service_instances().is_empty());

    proxy.call("GetOrders", &mut []).unwrap();
    drop(proxy);
    assert_eq!(journal.lock().disposed, 3);
}

#[test]
fn parameter_name_mismatch_defines_no_type() {
    let service = order_service();
    let contract = ServiceContract::new("Northwind.Client", "IRenamedParameter").with_method(
        ContractMethod::new("CountOrders", TypeRef::parse("int").unwrap())
            .with_parameter(ContractParameter::new("state", TypeRef::named("Northwind.OrderStatus"))),
    );
    let err = DomainServiceProxyGenerator::generate(&contract, &service).unwrap_err();
    assert!(matches!(
        err,
        ProxyGenerationError::ParameterMismatch { ref method, index: 0, .. } if method == "CountOrders"
    ));
    assert!(ProxyModule::global()
        .get("OrderService_IRenamedParameter_Proxy")
        .is_none());
}

#[test]
fn return_and_count_mismatches_are_rejected() {
    let service = order_service();
    let wrong_return = ServiceContract::new("Northwind.Client", "IWrongReturn")
        .with_method(ContractMethod::new("Ping", TypeRef::parse("int").unwrap()));
    assert!(matches!(
        DomainServiceProxyGenerator::generate(&wrong_return, &service).unwrap_err(),
        ProxyGenerationError::ReturnTypeMismatch { .. }
    ));

    let extra_param = ServiceContract::new("Northwind.Client", "IExtraParam").with_method(
        ContractMethod::new("Ping", TypeRef::Void)
            .with_parameter(ContractParameter::new("loud", TypeRef::parse("bool").unwrap())),
    );
    assert!(matches!(
        DomainServiceProxyGenerator::generate(&extra_param, &service).unwrap_err(),
        ProxyGenerationError::ParameterCountMismatch { expected: 0, found: 1, .. }
    ));
}

#[test]
fn short_type_names_and_other_sequence_shapes_are_accepted() {
    let service = order_service();
    let contract = ServiceContract::new("Northwind.Client", "IShortNames")
        .with_method(ContractMethod::new(
            "GetOrders",
            TypeRef::parse("IEnumerable<Order>").unwrap(),
        ))
        .with_method(ContractMethod::new("Refresh", TypeRef::Void));
    let proxy_type = DomainServiceProxyGenerator::generate(&contract, &service).unwrap();
    assert!(proxy_type.is_operation("GetOrders"));
    assert!(!proxy_type.is_operation("Refresh"));

    let mut proxy = proxy_type.create_initialized(DomainServiceContext::new());
    assert!(matches!(
        proxy.call("Refresh", &mut []).unwrap_err(),
        ProxyCallError::NotAnOperation(_)
    ));
    assert!(matches!(
        proxy.call("Missing", &mut []).unwrap_err(),
        ProxyCallError::UnknownMethod(_)
    ));
    assert!(matches!(
        proxy.call("GetOrders", &mut []).unwrap_err(),
        ProxyCallError::DelegateNotSet("query")
    ));
}

#[test]
fn non_public_contracts_and_uninitialized_proxies_fail() {
    let service = order_service();
    let mut hidden = ServiceContract::new("Northwind.Client", "IHidden");
    hidden.visibility = Visibility::Internal;
    assert_eq!(
        DomainServiceProxyGenerator::generate(&hidden, &service).unwrap_err(),
        ProxyGenerationError::ContractNotPublic("Northwind.Client.IHidden".into())
    );

    let proxy_type =
        DomainServiceProxyGenerator::generate(&ServiceContract::from_description(&service), &service).unwrap();
    let mut proxy = proxy_type.create_instance();
    assert!(matches!(
        proxy.call("Ping", &mut []).unwrap_err(),
        ProxyCallError::NotInitialized("domain_service_type")
    ));
    proxy
        .initialize(Arc::clone(&service), DomainServiceContext::new())
        .unwrap();
    assert!(proxy.domain_service_type().is_some());
}

const CALC: &str = r#"{
  "assembly": "Calc.Web",
  "types": [],
  "services": [
    {
      "name": "CalcService", "namespace": "Calc",
      "operations": [
        { "name": "TryParse", "kind": "invoke", "return_type": "bool",
          "parameters": [ { "name": "text", "type": "string" },
                          { "name": "value", "type": "int", "mode": "out" } ] }
      ]
    }
  ]
}"#;

struct Parser;

impl DomainService for Parser {
    fn initialize(&mut self, _context: &DomainServiceContext) {}

    fn query(&mut self, _operation: &str, _parameters: &[Value]) -> Result<QueryResult, ProxyCallError> {
        Ok(QueryResult::default())
    }

    fn invoke(&mut self, _operation: &str, parameters: &mut [Value]) -> Result<InvokeResult, ProxyCallError> {
        assert!(parameters[1].is_null(), "out slot is reset before dispatch");
        let parsed = parameters[0].as_str().and_then(|s| s.parse::<i64>().ok());
        parameters[1] = Value::Int(parsed.unwrap_or_default());
        Ok(InvokeResult::value(parsed.is_some()))
    }

    fn submit(&mut self, _change_set: &mut ChangeSet) -> Result<(), ProxyCallError> {
        Ok(())
    }
}

#[test]
fn out_parameters_are_written_back() {
    let service = Catalog::from_json(CALC).unwrap().description("CalcService").unwrap();
    let factory: Arc<dyn DomainServiceFactory> = Arc::new(
        |_: &Arc<DomainServiceDescription>, _: &DomainServiceContext| -> Box<dyn DomainService> {
            Box::new(Parser)
        },
    );
    let helper = DomainServiceProxyHelper::new(factory);
    let contract = ServiceContract::from_description(&service);
    let mut proxy = helper
        .create_proxy(&contract, &service, DomainServiceContext::new())
        .unwrap();

    let mut args = [Value::from("123"), Value::Int(-1)];
    assert_eq!(proxy.call("TryParse", &mut args).unwrap(), Value::Bool(true));
    assert_eq!(args[1], Value::Int(123));
}

#[test]
fn overloaded_operations_are_ambiguous() {
    let text = CALC.replace(
        r#"{ "name": "TryParse", "kind": "invoke", "return_type": "bool","#,
        r#"{ "name": "TryParse", "kind": "invoke", "return_type": "bool" },
        { "name": "TryParse", "kind": "invoke", "return_type": "bool","#,
    );
    let service = Catalog::from_json(&text).unwrap().description("CalcService").unwrap();
    let contract = ServiceContract::new("Calc", "ICalc").with_method(ContractMethod::new(
        "TryParse",
        TypeRef::parse("bool").unwrap(),
    ));
    assert_eq!(
        DomainServiceProxyGenerator::generate(&contract, &service).unwrap_err(),
        ProxyGenerationError::AmbiguousOperation {
            method: "TryParse".into(),
            service: "CalcService".into(),
            count: 2,
        }
    );
}
