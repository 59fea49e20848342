// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors raised while loading or validating server metadata.

use thiserror::Error;

/// Errors emitted by catalog loading and description construction.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A type reference string could not be parsed.
    #[error("invalid type reference '{text}': {reason}")]
    InvalidTypeRef {
        /// The offending text.
        text: String,
        /// Why parsing failed.
        reason: &'static str,
    },
    /// Two types share the same fully qualified name.
    #[error("duplicate type definition: {0}")]
    DuplicateType(String),
    /// Two services share the same name within one catalog.
    #[error("duplicate domain service: {0}")]
    DuplicateService(String),
    /// A referenced type is not present in the registry.
    #[error("unknown type '{type_name}' referenced by {context}")]
    UnknownType {
        /// Unresolved type name.
        type_name: String,
        /// Where the reference appeared.
        context: String,
    },
    /// An operation violates the shape rules for its operation kind.
    #[error("invalid operation '{service}.{operation}': {reason}")]
    InvalidOperation {
        /// Declaring DomainService name.
        service: String,
        /// Operation name.
        operation: String,
        /// Human-readable reason.
        reason: String,
    },
    /// I/O error while reading a catalog.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
