// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Contract proxies over local DomainServices.
//!
//! [`DomainServiceProxyGenerator::generate`] checks a [`ServiceContract`]
//! against a DomainService description and defines a [`ProxyType`] on the
//! process-wide [`ProxyModule`]. A proxy type is an interpreter: it keeps a
//! dispatch plan per contract method and forwards calls through three
//! delegates (query, invoke, submit) that the caller assigns after
//! generation. [`ProxyInstance`] carries the per-proxy state those delegates
//! work on.
//!
//! Generation either succeeds completely or defines nothing.

use crate::contract::{ContractMethod, ContractParameter, ServiceContract};
use crate::error::{ProxyCallError, ProxyGenerationError};
use crate::service::{DomainService, DomainServiceContext};
use crate::value::{EntityRef, OriginalEntityMap, Value};
use parking_lot::{Mutex, RwLock};
use ria_schema::{
    DomainOperation, DomainOperationEntry, DomainServiceDescription, ParameterMode, TypeRef,
    TypeRegistry,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Arguments handed to the query and invoke delegates.
pub struct DispatchRequest<'a> {
    /// DomainService the proxy forwards to.
    pub domain_service_type: &'a Arc<DomainServiceDescription>,
    /// Context supplied at initialization.
    pub context: &'a DomainServiceContext,
    /// Instances created so far; new instances must be added for disposal.
    pub domain_service_instances: &'a mut Vec<Box<dyn DomainService>>,
    /// Operation to run.
    pub operation_name: &'a str,
    /// Argument values in contract order. Out and ref slots are written back
    /// to the caller.
    pub parameters: &'a mut [Value],
}

/// Arguments handed to the submit delegate.
pub struct SubmitRequest<'a> {
    /// DomainService the proxy forwards to.
    pub domain_service_type: &'a Arc<DomainServiceDescription>,
    /// Context supplied at initialization.
    pub context: &'a DomainServiceContext,
    /// Instances created so far; new instances must be added for disposal.
    pub domain_service_instances: &'a mut Vec<Box<dyn DomainService>>,
    /// Originals tracked per entity instance.
    pub current_original_entity_map: &'a mut OriginalEntityMap,
    /// Called contract method.
    pub method_name: &'a str,
    /// Kind of submit operation.
    pub operation: DomainOperation,
    /// Entity action to attach; set for custom operations only.
    pub operation_name: Option<&'a str>,
    /// The entity (first contract argument).
    pub entity: EntityRef,
    /// Arguments after the entity.
    pub parameters: &'a mut [Value],
}

/// Runs a query and returns the resulting rows.
pub type QueryDelegate =
    Arc<dyn Fn(&mut DispatchRequest<'_>) -> Result<Vec<Value>, ProxyCallError> + Send + Sync>;
/// Runs an invoke operation and returns its value.
pub type InvokeDelegate =
    Arc<dyn Fn(&mut DispatchRequest<'_>) -> Result<Value, ProxyCallError> + Send + Sync>;
/// Submits one entity change.
pub type SubmitDelegate =
    Arc<dyn Fn(&mut SubmitRequest<'_>) -> Result<(), ProxyCallError> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DispatchKind {
    Query { singleton: bool },
    Invoke { returns_void: bool },
    Submit { operation: DomainOperation },
}

#[derive(Clone, Debug)]
struct MethodPlan {
    kind: DispatchKind,
    parameters: Vec<ContractParameter>,
}

/// A generated proxy type: contract, target service, dispatch plan and the
/// three dispatch delegates.
pub struct ProxyType {
    name: String,
    contract: ServiceContract,
    service: Arc<DomainServiceDescription>,
    plans: BTreeMap<String, MethodPlan>,
    query_delegate: RwLock<Option<QueryDelegate>>,
    invoke_delegate: RwLock<Option<InvokeDelegate>>,
    submit_delegate: RwLock<Option<SubmitDelegate>>,
}

impl fmt::Debug for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyType")
            .field("name", &self.name)
            .field("contract", &self.contract.full_name())
            .field("service", &self.service.service_type().full_name())
            .field("operations", &self.plans.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ProxyType {
    /// Unique name within the proxy module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The implemented contract.
    pub fn contract(&self) -> &ServiceContract {
        &self.contract
    }

    /// The DomainService calls are forwarded to.
    pub fn domain_service_type(&self) -> &Arc<DomainServiceDescription> {
        &self.service
    }

    /// Whether `method` is forwarded to a DomainService operation.
    pub fn is_operation(&self, method: &str) -> bool {
        self.plans.contains_key(method)
    }

    /// Assigns the query delegate.
    pub fn set_query_delegate(&self, delegate: QueryDelegate) {
        *self.query_delegate.write() = Some(delegate);
    }

    /// Assigns the invoke delegate.
    pub fn set_invoke_delegate(&self, delegate: InvokeDelegate) {
        *self.invoke_delegate.write() = Some(delegate);
    }

    /// Assigns the submit delegate.
    pub fn set_submit_delegate(&self, delegate: SubmitDelegate) {
        *self.submit_delegate.write() = Some(delegate);
    }

    /// A new, uninitialized instance.
    pub fn create_instance(self: &Arc<Self>) -> ProxyInstance {
        ProxyInstance {
            proxy_type: Arc::clone(self),
            domain_service_type: None,
            context: None,
            domain_service_instances: None,
            current_original_entity_map: None,
        }
    }

    /// A new instance already initialized with this type's DomainService.
    pub fn create_initialized(self: &Arc<Self>, context: DomainServiceContext) -> ProxyInstance {
        let mut instance = self.create_instance();
        instance.domain_service_type = Some(Arc::clone(&self.service));
        instance.context = Some(context);
        instance
    }
}

/// Process-wide, append-only registry of generated proxy types.
#[derive(Debug)]
pub struct ProxyModule {
    types: Mutex<BTreeMap<String, Arc<ProxyType>>>,
}

static MODULE: OnceLock<ProxyModule> = OnceLock::new();

impl ProxyModule {
    /// The module every generated proxy type is defined on.
    pub fn global() -> &'static Self {
        MODULE.get_or_init(|| Self {
            types: Mutex::new(BTreeMap::new()),
        })
    }

    /// Looks up a defined type by name.
    pub fn get(&self, name: &str) -> Option<Arc<ProxyType>> {
        self.types.lock().get(name).cloned()
    }

    /// Number of defined types.
    pub fn len(&self) -> usize {
        self.types.lock().len()
    }

    /// Whether no type has been defined yet.
    pub fn is_empty(&self) -> bool {
        self.types.lock().is_empty()
    }

    fn define(&self, base: &str, build: impl FnOnce(String) -> ProxyType) -> Arc<ProxyType> {
        let mut types = self.types.lock();
        let mut name = base.to_string();
        let mut n = 1usize;
        while types.contains_key(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        let ty = Arc::new(build(name.clone()));
        types.insert(name, Arc::clone(&ty));
        ty
    }
}

/// Defines proxy types implementing service contracts.
#[derive(Clone, Copy, Debug, Default)]
pub struct DomainServiceProxyGenerator;

impl DomainServiceProxyGenerator {
    /// Validates `contract` against `service` and defines a proxy type.
    ///
    /// Contract methods without a same-named operation are left undispatched.
    /// A method matching several operations, or disagreeing with its
    /// operation on return type or on any parameter's name, type or mode, is
    /// an error and nothing is defined.
    pub fn generate(
        contract: &ServiceContract,
        service: &Arc<DomainServiceDescription>,
    ) -> Result<Arc<ProxyType>, ProxyGenerationError> {
        if !contract.is_public() {
            return Err(ProxyGenerationError::ContractNotPublic(contract.full_name()));
        }
        let service_type = service.service_type();
        if !service_type.is_public() {
            return Err(ProxyGenerationError::ServiceNotPublic(service_type.full_name()));
        }

        let registry = service.registry();
        let mut plans = BTreeMap::new();
        for method in &contract.methods {
            let entries = service.entries_named(&method.name);
            let entry = match entries.as_slice() {
                [] => {
                    debug!(method = %method.name, "contract method has no operation");
                    continue;
                }
                [entry] => entry,
                many => {
                    return Err(ProxyGenerationError::AmbiguousOperation {
                        method: method.name.clone(),
                        service: service.name().to_string(),
                        count: many.len(),
                    })
                }
            };
            if plans.contains_key(&method.name) {
                return Err(ProxyGenerationError::DuplicateMethod(method.name.clone()));
            }
            let kind = check_signature(registry, method, entry)?;
            plans.insert(
                method.name.clone(),
                MethodPlan {
                    kind,
                    parameters: method.parameters.clone(),
                },
            );
        }

        let base = format!("{}_{}_Proxy", service_type.name, contract.name);
        let ty = ProxyModule::global().define(&base, |name| ProxyType {
            name,
            contract: contract.clone(),
            service: Arc::clone(service),
            plans,
            query_delegate: RwLock::new(None),
            invoke_delegate: RwLock::new(None),
            submit_delegate: RwLock::new(None),
        });
        info!(
            proxy = %ty.name,
            contract = %contract.full_name(),
            operations = ty.plans.len(),
            "proxy type defined"
        );
        Ok(ty)
    }
}

/// Type reference with every user type spelled by its full name.
fn canonical(registry: &TypeRegistry, ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Named(name) => TypeRef::Named(registry.full_name_of(name).unwrap_or_else(|| name.clone())),
        TypeRef::Nullable(inner) => TypeRef::Nullable(Box::new(canonical(registry, inner))),
        TypeRef::Collection { kind, element } => TypeRef::Collection {
            kind: *kind,
            element: Box::new(canonical(registry, element)),
        },
        other => other.clone(),
    }
}

fn same_type(registry: &TypeRegistry, a: &TypeRef, b: &TypeRef) -> bool {
    canonical(registry, a) == canonical(registry, b)
}

fn describe_parameter(mode: ParameterMode, ty: &TypeRef, name: &str) -> String {
    match mode {
        ParameterMode::In => format!("{ty} {name}"),
        ParameterMode::Out => format!("out {ty} {name}"),
        ParameterMode::Ref => format!("ref {ty} {name}"),
    }
}

fn check_signature(
    registry: &TypeRegistry,
    method: &ContractMethod,
    entry: &DomainOperationEntry,
) -> Result<DispatchKind, ProxyGenerationError> {
    let return_mismatch = || ProxyGenerationError::ReturnTypeMismatch {
        method: method.name.clone(),
        expected: entry.return_type.to_string(),
        found: method.return_type.to_string(),
    };
    let kind = match entry.operation {
        DomainOperation::Query => {
            // Any sequence shape is accepted as long as the element types agree.
            let shape_matches = entry.return_type.is_collection() == method.return_type.is_collection()
                && same_type(
                    registry,
                    entry.return_type.element_type(),
                    method.return_type.element_type(),
                );
            if !shape_matches {
                return Err(return_mismatch());
            }
            DispatchKind::Query {
                singleton: !method.return_type.is_collection(),
            }
        }
        DomainOperation::Invoke => {
            if !same_type(registry, &entry.return_type, &method.return_type) {
                return Err(return_mismatch());
            }
            DispatchKind::Invoke {
                returns_void: method.return_type.is_void(),
            }
        }
        operation => {
            if !method.return_type.is_void() {
                return Err(ProxyGenerationError::ReturnTypeMismatch {
                    method: method.name.clone(),
                    expected: TypeRef::Void.to_string(),
                    found: method.return_type.to_string(),
                });
            }
            if method.parameters.is_empty() {
                return Err(ProxyGenerationError::MissingEntityParameter(method.name.clone()));
            }
            DispatchKind::Submit { operation }
        }
    };

    if method.parameters.len() != entry.parameters.len() {
        return Err(ProxyGenerationError::ParameterCountMismatch {
            method: method.name.clone(),
            expected: entry.parameters.len(),
            found: method.parameters.len(),
        });
    }
    for (index, (declared, expected)) in method.parameters.iter().zip(&entry.parameters).enumerate() {
        if declared.name != expected.name
            || declared.mode != expected.mode
            || !same_type(registry, &declared.ty, &expected.ty)
        {
            return Err(ProxyGenerationError::ParameterMismatch {
                method: method.name.clone(),
                index,
                expected: describe_parameter(expected.mode, &expected.ty, &expected.name),
                found: describe_parameter(declared.mode, &declared.ty, &declared.name),
            });
        }
    }
    Ok(kind)
}

/// One proxy object: the state a generated proxy carries between calls.
pub struct ProxyInstance {
    proxy_type: Arc<ProxyType>,
    domain_service_type: Option<Arc<DomainServiceDescription>>,
    context: Option<DomainServiceContext>,
    domain_service_instances: Option<Vec<Box<dyn DomainService>>>,
    current_original_entity_map: Option<OriginalEntityMap>,
}

impl fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("proxy_type", &self.proxy_type.name)
            .field("initialized", &self.context.is_some())
            .field(
                "domain_service_instances",
                &self.domain_service_instances.as_ref().map_or(0, Vec::len),
            )
            .finish_non_exhaustive()
    }
}

impl ProxyInstance {
    /// The instance's proxy type.
    pub fn proxy_type(&self) -> &Arc<ProxyType> {
        &self.proxy_type
    }

    /// Binds the instance to its DomainService and request context.
    pub fn initialize(
        &mut self,
        domain_service_type: Arc<DomainServiceDescription>,
        context: DomainServiceContext,
    ) -> Result<(), ProxyCallError> {
        let expected = self.proxy_type.service.service_type().full_name();
        let found = domain_service_type.service_type().full_name();
        if expected != found {
            return Err(ProxyCallError::ServiceTypeMismatch { expected, found });
        }
        self.domain_service_type = Some(domain_service_type);
        self.context = Some(context);
        Ok(())
    }

    /// Context supplied at initialization.
    pub fn context(&self) -> Option<&DomainServiceContext> {
        self.context.as_ref()
    }

    /// DomainService supplied at initialization.
    pub fn domain_service_type(&self) -> Option<&Arc<DomainServiceDescription>> {
        self.domain_service_type.as_ref()
    }

    /// DomainService instances created by calls so far; created on first use.
    pub fn domain_service_instances(&mut self) -> &mut Vec<Box<dyn DomainService>> {
        self.domain_service_instances.get_or_insert_with(Vec::new)
    }

    /// Originals tracked per entity instance; created on first use.
    pub fn current_original_entity_map(&mut self) -> &mut OriginalEntityMap {
        self.current_original_entity_map
            .get_or_insert_with(OriginalEntityMap::new)
    }

    /// Calls contract method `method`. Out parameters are reset to `Null`
    /// before dispatch; out and ref slots in `args` hold the results after.
    pub fn call(&mut self, method: &str, args: &mut [Value]) -> Result<Value, ProxyCallError> {
        let proxy_type = Arc::clone(&self.proxy_type);
        let Some(plan) = proxy_type.plans.get(method) else {
            return Err(if proxy_type.contract.method(method).is_some() {
                ProxyCallError::NotAnOperation(method.to_string())
            } else {
                ProxyCallError::UnknownMethod(method.to_string())
            });
        };
        if args.len() != plan.parameters.len() {
            return Err(ProxyCallError::ArgumentCount {
                method: method.to_string(),
                expected: plan.parameters.len(),
                found: args.len(),
            });
        }
        let service = self
            .domain_service_type
            .clone()
            .ok_or(ProxyCallError::NotInitialized("domain_service_type"))?;
        let context = self
            .context
            .clone()
            .ok_or(ProxyCallError::NotInitialized("context"))?;
        for (arg, param) in args.iter_mut().zip(&plan.parameters) {
            if param.mode == ParameterMode::Out {
                *arg = Value::Null;
            }
        }

        let instances = self.domain_service_instances.get_or_insert_with(Vec::new);
        debug!(proxy = %proxy_type.name, method, "proxy call");
        match plan.kind {
            DispatchKind::Query { singleton } => {
                let delegate = proxy_type
                    .query_delegate
                    .read()
                    .clone()
                    .ok_or(ProxyCallError::DelegateNotSet("query"))?;
                let rows = delegate(&mut DispatchRequest {
                    domain_service_type: &service,
                    context: &context,
                    domain_service_instances: instances,
                    operation_name: method,
                    parameters: args,
                })?;
                Ok(if singleton {
                    rows.into_iter().next().unwrap_or_default()
                } else {
                    Value::List(rows)
                })
            }
            DispatchKind::Invoke { returns_void } => {
                let delegate = proxy_type
                    .invoke_delegate
                    .read()
                    .clone()
                    .ok_or(ProxyCallError::DelegateNotSet("invoke"))?;
                let value = delegate(&mut DispatchRequest {
                    domain_service_type: &service,
                    context: &context,
                    domain_service_instances: instances,
                    operation_name: method,
                    parameters: args,
                })?;
                Ok(if returns_void { Value::Null } else { value })
            }
            DispatchKind::Submit { operation } => {
                let delegate = proxy_type
                    .submit_delegate
                    .read()
                    .clone()
                    .ok_or(ProxyCallError::DelegateNotSet("submit"))?;
                let Some((first, rest)) = args.split_first_mut() else {
                    return Err(ProxyCallError::EntityExpected(method.to_string()));
                };
                let entity = first
                    .as_entity()
                    .cloned()
                    .ok_or_else(|| ProxyCallError::EntityExpected(method.to_string()))?;
                let originals = self
                    .current_original_entity_map
                    .get_or_insert_with(OriginalEntityMap::new);
                delegate(&mut SubmitRequest {
                    domain_service_type: &service,
                    context: &context,
                    domain_service_instances: instances,
                    current_original_entity_map: originals,
                    method_name: method,
                    operation,
                    operation_name: (operation == DomainOperation::Custom).then_some(method),
                    entity,
                    parameters: rest,
                })?;
                Ok(Value::Null)
            }
        }
    }

    /// Disposes every DomainService instance created so far and forgets them.
    pub fn dispose(&mut self) {
        if let Some(instances) = self.domain_service_instances.as_mut() {
            let count = instances.len();
            for mut instance in instances.drain(..) {
                instance.dispose();
            }
            if count > 0 {
                debug!(proxy = %self.proxy_type.name, count, "domain service instances disposed");
            }
        }
    }
}

impl Drop for ProxyInstance {
    fn drop(&mut self) {
        self.dispose();
    }
}
