// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! ria-sharing: which server code elements the client project already has.
//!
//! Client proxy generation must not re-declare a type, property or method
//! the client already compiles, either because a source file is linked into
//! both projects or because the client references the declaring assembly.
//! This crate answers that question:
//!
//! - [`SourceFileLocationService`] maps members to their declaring files via
//!   pluggable [`SourceFileProvider`]s, caching per type;
//! - [`SharedSourceFiles`] intersects those files with the shared-file set,
//!   using dense ids from a [`FilenameMap`];
//! - [`SharedCodeService`] turns the evidence into a
//!   [`CodeMemberShareKind`] per [`CodeMemberKey`];
//! - [`remote`] runs the same service in a worker process behind a
//!   newline-delimited JSON protocol.
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

mod error;
mod filename_map;
mod key;
mod location;
mod params;
mod provider;
pub mod remote;
mod service;
mod share_kind;
mod shared_files;

/// Error type for sharing analysis and the worker protocol.
pub use error::SharingError;
/// File path <-> dense id map.
pub use filename_map::FilenameMap;
/// Code element identity.
pub use key::{member_signature, method_signature, CodeMemberKey};
/// Member-to-file resolution.
pub use location::SourceFileLocationService;
/// Serializable service inputs.
pub use params::{assembly_name_from_path, SharedCodeServiceParameters};
/// File location providers.
pub use provider::{DeclaredSourceProvider, SourceFileProvider, SymbolFileProvider};
/// Out-of-process client and server.
pub use remote::{serve, serve_worker, RemoteSharedCodeService, SharedCodeRequest, SharedCodeResponse};
/// Share-kind lookup and its in-process implementation.
pub use service::{NoSharedCode, SharedCodeLookup, SharedCodeService};
/// Share-kind flags.
pub use share_kind::CodeMemberShareKind;
/// Shared-file intersection.
pub use shared_files::SharedSourceFiles;
