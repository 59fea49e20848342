// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Configuration services for riagen.
//!
//! [`ConfigStore`] is the storage port for raw blobs keyed by logical name,
//! [`ConfigService`] layers JSON (de)serialization on top of any store, and
//! [`FsConfigStore`] keeps one JSON file per key under the platform config
//! directory. [`GeneratorPrefs`] is the one document riagen persists.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

pub mod config;
mod fs;
pub mod prefs;

/// Storage port, service and error type.
pub use config::{ConfigError, ConfigService, ConfigStore};
/// Filesystem-backed store.
pub use fs::FsConfigStore;
/// Persisted generator preferences and their port.
pub use prefs::{GeneratorPrefs, PrefsPort, PREFS_KEY};
