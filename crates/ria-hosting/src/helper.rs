// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Default dispatch delegates for hosted proxies.
//!
//! Each call creates a fresh DomainService instance through the factory,
//! initializes it with the proxy's context and records it on the proxy for
//! disposal. Validation errors reported by the service surface as
//! [`OperationError`]s.

use crate::changeset::{ChangeSetEntry, ChangeSetProcessor, EntityOperationType};
use crate::contract::ServiceContract;
use crate::error::{OperationError, ProxyCallError, ProxyGenerationError};
use crate::proxy::{
    DispatchRequest, DomainServiceProxyGenerator, InvokeDelegate, ProxyInstance, ProxyType,
    QueryDelegate, SubmitDelegate, SubmitRequest,
};
use crate::service::{DomainOperationType, DomainService, DomainServiceContext, DomainServiceFactory};
use crate::value::Value;
use ria_schema::{DomainOperation, DomainServiceDescription};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Query, invoke and submit delegates backed by a [`DomainServiceFactory`].
#[derive(Clone)]
pub struct DomainServiceProxyHelper {
    factory: Arc<dyn DomainServiceFactory>,
}

impl fmt::Debug for DomainServiceProxyHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainServiceProxyHelper").finish_non_exhaustive()
    }
}

impl DomainServiceProxyHelper {
    /// Helper creating services through `factory`.
    pub fn new(factory: Arc<dyn DomainServiceFactory>) -> Self {
        Self { factory }
    }

    /// Delegate running queries.
    pub fn query_delegate(&self) -> QueryDelegate {
        let factory = Arc::clone(&self.factory);
        Arc::new(move |request: &mut DispatchRequest<'_>| query(factory.as_ref(), request))
    }

    /// Delegate running invoke operations.
    pub fn invoke_delegate(&self) -> InvokeDelegate {
        let factory = Arc::clone(&self.factory);
        Arc::new(move |request: &mut DispatchRequest<'_>| invoke(factory.as_ref(), request))
    }

    /// Delegate submitting entity changes.
    pub fn submit_delegate(&self) -> SubmitDelegate {
        let factory = Arc::clone(&self.factory);
        Arc::new(move |request: &mut SubmitRequest<'_>| submit(factory.as_ref(), request))
    }

    /// Assigns all three delegates on `proxy_type`.
    pub fn attach(&self, proxy_type: &ProxyType) {
        proxy_type.set_query_delegate(self.query_delegate());
        proxy_type.set_invoke_delegate(self.invoke_delegate());
        proxy_type.set_submit_delegate(self.submit_delegate());
    }

    /// Generates a proxy type for `contract` over `service`, wires this
    /// helper's delegates and returns an initialized instance.
    pub fn create_proxy(
        &self,
        contract: &ServiceContract,
        service: &Arc<DomainServiceDescription>,
        context: DomainServiceContext,
    ) -> Result<ProxyInstance, ProxyGenerationError> {
        let proxy_type = DomainServiceProxyGenerator::generate(contract, service)?;
        self.attach(&proxy_type);
        Ok(proxy_type.create_initialized(context))
    }
}

fn new_instance(
    factory: &dyn DomainServiceFactory,
    service: &Arc<DomainServiceDescription>,
    context: &DomainServiceContext,
    kind: DomainOperationType,
) -> Result<Box<dyn DomainService>, ProxyCallError> {
    let context = context.with_operation_type(kind);
    let mut instance = factory.create_domain_service(service, &context)?;
    instance.initialize(&context);
    debug!(service = %service.name(), ?kind, "domain service instance created");
    Ok(instance)
}

fn ensure_operation(service: &DomainServiceDescription, operation: &str) -> Result<(), ProxyCallError> {
    if service.entries_named(operation).is_empty() {
        return Err(ProxyCallError::UnknownOperation {
            service: service.name().to_string(),
            operation: operation.to_string(),
        });
    }
    Ok(())
}

/// Runs `request` as a query on a new DomainService instance.
fn query(
    factory: &dyn DomainServiceFactory,
    request: &mut DispatchRequest<'_>,
) -> Result<Vec<Value>, ProxyCallError> {
    ensure_operation(request.domain_service_type, request.operation_name)?;
    let mut instance = new_instance(
        factory,
        request.domain_service_type,
        request.context,
        DomainOperationType::Query,
    )?;
    let result = instance.query(request.operation_name, request.parameters);
    request.domain_service_instances.push(instance);
    let result = result?;
    if !result.validation_errors.is_empty() {
        return Err(OperationError::new(request.operation_name, result.validation_errors).into());
    }
    Ok(result.rows)
}

/// Runs `request` as an invoke operation on a new DomainService instance.
fn invoke(
    factory: &dyn DomainServiceFactory,
    request: &mut DispatchRequest<'_>,
) -> Result<Value, ProxyCallError> {
    ensure_operation(request.domain_service_type, request.operation_name)?;
    let mut instance = new_instance(
        factory,
        request.domain_service_type,
        request.context,
        DomainOperationType::Invoke,
    )?;
    let result = instance.invoke(request.operation_name, request.parameters);
    request.domain_service_instances.push(instance);
    let result = result?;
    if !result.validation_errors.is_empty() {
        return Err(OperationError::new(request.operation_name, result.validation_errors).into());
    }
    Ok(result.value)
}

/// Submits the single entity change described by `request`.
///
/// Updates and deletes carry the original tracked for the entity, if any.
/// Custom operations become an entity action on an update. After a
/// successful submit the tracked original follows the entity's new state.
fn submit(
    factory: &dyn DomainServiceFactory,
    request: &mut SubmitRequest<'_>,
) -> Result<(), ProxyCallError> {
    let service = request.domain_service_type;
    ensure_operation(service, request.method_name)?;
    let operation = match request.operation {
        DomainOperation::Insert => EntityOperationType::Insert,
        DomainOperation::Delete => EntityOperationType::Delete,
        _ => EntityOperationType::Update,
    };

    let mut entry = ChangeSetEntry::new(0, operation, request.entity.clone());
    if operation != EntityOperationType::Insert {
        if let Some(original) = request.current_original_entity_map.get(&request.entity) {
            entry = entry.with_original(original.clone());
        }
    }
    if let Some(action) = request.operation_name {
        entry = entry.with_action(action, request.parameters.to_vec());
    }
    let mut change_set = ChangeSetProcessor::create_change_set(service.registry(), vec![entry])?;

    let mut instance = new_instance(factory, service, request.context, DomainOperationType::Submit)?;
    let result = instance.submit(&mut change_set);
    request.domain_service_instances.push(instance);
    result?;

    if change_set.has_error() {
        let errors = change_set.validation_errors();
        warn!(operation = request.method_name, errors = errors.len(), "submit rejected");
        return Err(OperationError::new(request.method_name, errors).into());
    }

    match operation {
        EntityOperationType::Delete => {
            request.current_original_entity_map.remove(&request.entity);
        }
        _ => request
            .current_original_entity_map
            .insert(&request.entity, request.entity.shallow_clone()),
    }
    Ok(())
}
