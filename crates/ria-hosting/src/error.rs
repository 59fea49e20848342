// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors raised by proxy generation, proxy calls and change-set processing.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Structurally invalid input to proxy generation. No proxy type is defined
/// when one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyGenerationError {
    /// The contract is not public.
    #[error("contract '{0}' must be a public interface")]
    ContractNotPublic(String),
    /// The DomainService type is not public.
    #[error("DomainService type '{0}' must be public")]
    ServiceNotPublic(String),
    /// A contract method matches more than one operation.
    #[error("method '{method}' matches {count} operations on '{service}'; operation overloading is not supported")]
    AmbiguousOperation {
        /// Contract method.
        method: String,
        /// DomainService name.
        service: String,
        /// Number of matching operations.
        count: usize,
    },
    /// Contract method and operation disagree on the return type.
    #[error("method '{method}' returns '{found}' but operation returns '{expected}'")]
    ReturnTypeMismatch {
        /// Contract method.
        method: String,
        /// Operation's return type.
        expected: String,
        /// Contract's return type.
        found: String,
    },
    /// Contract method and operation disagree on the parameter count.
    #[error("method '{method}' declares {found} parameters but operation declares {expected}")]
    ParameterCountMismatch {
        /// Contract method.
        method: String,
        /// Operation parameter count.
        expected: usize,
        /// Contract parameter count.
        found: usize,
    },
    /// Contract method and operation disagree on a parameter's name or type.
    #[error("parameter {index} of method '{method}' is '{found}' but operation declares '{expected}'")]
    ParameterMismatch {
        /// Contract method.
        method: String,
        /// Zero-based position.
        index: usize,
        /// Operation's `type name`.
        expected: String,
        /// Contract's `type name`.
        found: String,
    },
    /// The contract declares two methods with the same name.
    #[error("contract declares method '{0}' more than once")]
    DuplicateMethod(String),
    /// A submit method does not take the entity as its first parameter.
    #[error("submit method '{0}' must take the entity as its first parameter")]
    MissingEntityParameter(String),
}

/// One validation failure reported by a DomainService.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResultInfo {
    /// Human-readable message.
    pub message: String,
    /// Application-defined code.
    #[serde(default)]
    pub error_code: i32,
    /// Members the failure applies to.
    #[serde(default)]
    pub source_member_names: Vec<String>,
}

impl ValidationResultInfo {
    /// A failure with the given message and no members.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_code: 0,
            source_member_names: Vec::new(),
        }
    }

    /// Attaches the member names the failure applies to.
    pub fn for_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_member_names = members.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for ValidationResultInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source_member_names.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} ({})", self.message, self.source_member_names.join(", "))
        }
    }
}

/// A Query, Invoke or Submit call completed with validation errors.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("operation '{operation}' failed validation: {}", summary(.validation_errors))]
pub struct OperationError {
    /// Operation that reported the errors.
    pub operation: String,
    /// The reported errors, in service order.
    pub validation_errors: Vec<ValidationResultInfo>,
}

impl OperationError {
    /// Wraps the errors reported by `operation`.
    pub fn new(operation: impl Into<String>, validation_errors: Vec<ValidationResultInfo>) -> Self {
        Self {
            operation: operation.into(),
            validation_errors,
        }
    }
}

fn summary(errors: &[ValidationResultInfo]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Change-set reconciliation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChangeSetError {
    /// An association list refers to an id no entry carries.
    #[error("entry {entry} refers to unknown entry id {id} through '{association}'")]
    UnknownEntryId {
        /// Referring entry.
        entry: i32,
        /// Association member.
        association: String,
        /// Missing id.
        id: i32,
    },
    /// An association list names a member that is not an association.
    #[error("'{association}' is not an association member of '{type_name}'")]
    UnknownAssociation {
        /// Entity type.
        type_name: String,
        /// Named member.
        association: String,
    },
    /// The entity type is not described by the registry.
    #[error("unknown entity type '{0}'")]
    UnknownEntityType(String),
}

/// Failures raised while calling through a hosted proxy.
#[derive(Debug, Error)]
pub enum ProxyCallError {
    /// The proxy was used before `initialize`.
    #[error("proxy is not initialized: '{0}' is missing")]
    NotInitialized(&'static str),
    /// `initialize` was given a DomainService other than the proxy's.
    #[error("proxy for '{expected}' cannot be initialized with '{found}'")]
    ServiceTypeMismatch {
        /// Service the proxy type was generated for.
        expected: String,
        /// Service supplied to `initialize`.
        found: String,
    },
    /// The named method is not part of the contract.
    #[error("contract has no method '{0}'")]
    UnknownMethod(String),
    /// The method is on the contract but not backed by an operation.
    #[error("method '{0}' is not a DomainService operation")]
    NotAnOperation(String),
    /// Wrong number of arguments.
    #[error("method '{method}' takes {expected} arguments, got {found}")]
    ArgumentCount {
        /// Called method.
        method: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        found: usize,
    },
    /// The first argument of a submit method is not an entity.
    #[error("method '{0}' requires an entity as its first argument")]
    EntityExpected(String),
    /// The dispatch delegate for this kind of call was never assigned.
    #[error("the {0} delegate has not been assigned")]
    DelegateNotSet(&'static str),
    /// The DomainService has no operation with this name.
    #[error("DomainService '{service}' has no operation '{operation}'")]
    UnknownOperation {
        /// DomainService name.
        service: String,
        /// Requested operation.
        operation: String,
    },
    /// The DomainService failed outright.
    #[error("DomainService fault: {0}")]
    Fault(String),
    /// The operation completed with validation errors.
    #[error(transparent)]
    Operation(#[from] OperationError),
    /// The submitted change set could not be reconciled.
    #[error(transparent)]
    ChangeSet(#[from] ChangeSetError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_errors_list_every_failure() {
        let err = OperationError::new(
            "UpdateOrder",
            vec![
                ValidationResultInfo::new("Freight must be positive").for_members(["Freight"]),
                ValidationResultInfo::new("Order is closed"),
            ],
        );
        assert_eq!(
            err.to_string(),
            "operation 'UpdateOrder' failed validation: Freight must be positive (Freight); Order is closed"
        );
    }
}
