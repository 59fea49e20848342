// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Keyed JSON documents over a pluggable byte store.
//!
//! riagen persists a handful of small documents (today only
//! [`GeneratorPrefs`](crate::GeneratorPrefs)). Each one lives under a short
//! logical key; stores decide where the bytes go.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::trace;

/// Where persisted documents are kept.
///
/// Implementations move opaque bytes only. Encoding belongs to
/// [`ConfigService`].
pub trait ConfigStore {
    /// Bytes stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces whatever is stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures reading or writing a persisted document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("no document stored under this key")]
    NotFound,
    /// The key would escape the store or is empty.
    #[error("'{0}' is not a usable document key")]
    InvalidKey(String),
    /// The backing medium failed.
    #[error("document store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// Stored bytes are not a valid document of the requested shape.
    #[error("document '{key}' is malformed: {source}")]
    Malformed {
        /// Key of the offending document.
        key: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The document could not be encoded.
    #[error("cannot encode document '{key}': {source}")]
    Encode {
        /// Key being written.
        key: String,
        /// Encoder error.
        #[source]
        source: serde_json::Error,
    },
    /// Store-specific failure with no better category.
    #[error("{0}")]
    Other(String),
}

/// Encodes documents as pretty JSON and hands the bytes to a [`ConfigStore`].
#[derive(Debug)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwraps the store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Decodes the document under `key`.
    ///
    /// A missing key and a zero-length blob both read as `Ok(None)`, so a
    /// truncated write never blocks startup.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Err(ConfigError::NotFound) => return Ok(None),
            other => other?,
        };
        if bytes.is_empty() {
            trace!(key, "empty document treated as absent");
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| ConfigError::Malformed {
                key: key.to_owned(),
                source,
            })
    }

    /// Encodes `value` and stores it under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| ConfigError::Encode {
            key: key.to_owned(),
            source,
        })?;
        bytes.push(b'\n');
        trace!(key, bytes = bytes.len(), "saving document");
        self.store.save_raw(key, &bytes)
    }
}
