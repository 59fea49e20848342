// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The server-side DomainService seam.

use crate::changeset::ChangeSet;
use crate::error::{ProxyCallError, ValidationResultInfo};
use crate::value::Value;
use ria_schema::DomainServiceDescription;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of request a DomainService instance is created for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainOperationType {
    /// Entity query.
    #[default]
    Query,
    /// Direct method invocation.
    Invoke,
    /// Change-set submission.
    Submit,
    /// Metadata inspection only.
    Metadata,
}

/// Ambient request information handed to each DomainService instance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainServiceContext {
    /// Authenticated user, if any.
    pub user: Option<String>,
    /// Request kind.
    pub operation_type: DomainOperationType,
}

impl DomainServiceContext {
    /// Context for an anonymous caller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for `user`.
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            operation_type: DomainOperationType::default(),
        }
    }

    /// Copy of this context for a different request kind.
    pub fn with_operation_type(&self, operation_type: DomainOperationType) -> Self {
        Self {
            user: self.user.clone(),
            operation_type,
        }
    }
}

/// Rows returned by a query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    /// Returned entities.
    pub rows: Vec<Value>,
    /// Total count before paging, when computed.
    pub total_count: Option<usize>,
    /// Validation errors; when present the rows are discarded.
    pub validation_errors: Vec<ValidationResultInfo>,
}

impl QueryResult {
    /// A successful result.
    pub fn rows(rows: Vec<Value>) -> Self {
        Self {
            rows,
            total_count: None,
            validation_errors: Vec::new(),
        }
    }
}

/// Value returned by an invoke operation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvokeResult {
    /// Return value (`Null` for void operations).
    pub value: Value,
    /// Validation errors; when present the value is discarded.
    pub validation_errors: Vec<ValidationResultInfo>,
}

impl InvokeResult {
    /// A successful result.
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            validation_errors: Vec::new(),
        }
    }
}

/// A server-side DomainService instance.
///
/// One instance serves one request. Implementations report recoverable
/// failures as validation errors and reserve `Err` for faults.
pub trait DomainService: Send {
    /// Called once before the first operation.
    fn initialize(&mut self, context: &DomainServiceContext);

    /// Runs a query operation.
    fn query(&mut self, operation: &str, parameters: &[Value]) -> Result<QueryResult, ProxyCallError>;

    /// Runs an invoke operation. Out and ref parameters may be written.
    fn invoke(&mut self, operation: &str, parameters: &mut [Value]) -> Result<InvokeResult, ProxyCallError>;

    /// Applies a change set, recording per-entry validation errors on it.
    fn submit(&mut self, change_set: &mut ChangeSet) -> Result<(), ProxyCallError>;

    /// Releases resources. Called at most once.
    fn dispose(&mut self) {}
}

/// Creates DomainService instances on demand.
pub trait DomainServiceFactory: Send + Sync {
    /// A new, uninitialized instance of the described service.
    fn create_domain_service(
        &self,
        service: &Arc<DomainServiceDescription>,
        context: &DomainServiceContext,
    ) -> Result<Box<dyn DomainService>, ProxyCallError>;
}

impl<F> DomainServiceFactory for F
where
    F: Fn(&Arc<DomainServiceDescription>, &DomainServiceContext) -> Box<dyn DomainService> + Send + Sync,
{
    fn create_domain_service(
        &self,
        service: &Arc<DomainServiceDescription>,
        context: &DomainServiceContext,
    ) -> Result<Box<dyn DomainService>, ProxyCallError> {
        Ok(self(service, context))
    }
}
