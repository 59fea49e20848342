// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors raised while building or talking to a shared-code service.

use thiserror::Error;

/// Errors emitted by sharing analysis setup and the worker protocol.
#[derive(Debug, Error)]
pub enum SharingError {
    /// A server catalog could not be loaded.
    #[error("failed to load server metadata: {0}")]
    Schema(#[from] ria_schema::SchemaError),
    /// A symbol file exists but could not be read or parsed.
    #[error("invalid symbol file {path}: {reason}")]
    SymbolFile {
        /// Offending file.
        path: String,
        /// Underlying failure.
        reason: String,
    },
    /// The worker protocol was violated (unexpected or malformed message).
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The worker reported a failure.
    #[error("remote error: {0}")]
    Remote(String),
    /// I/O error on the worker transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
