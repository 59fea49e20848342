// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! ria-codegen: client proxy code generation for RIA DomainServices.
//!
//! Generation runs in three layers:
//!
//! * [`CodeGenerationHost`] gives generators diagnostics and shared-code
//!   answers without exposing how either is produced.
//! * [`CodeDomClientCodeGenerator`] turns [`DomainServiceDescription`]s into
//!   a language-neutral [`CompileUnit`]: a `DomainContext` per service, the
//!   entity and complex type proxies, and every enum those signatures need.
//! * A [`CodeDomProvider`] renders the unit as C# or Visual Basic source.
//!
//! Third-party generators plug in through [`GeneratorRegistry`]. Output is a
//! pure function of the descriptions, the options and the shared-code
//! answers: the compile unit is put in canonical order before rendering and
//! the banner carries no timestamp.
//!
//! [`DomainServiceDescription`]: ria_schema::DomainServiceDescription
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

pub mod code_model;
mod code_writer;
mod diagnostics;
mod error;
mod generator;
mod host;
mod options;
mod ordering;
mod provider;
mod registry;

/// Core code model types.
pub use code_model::{AttributeDecl, CodeNamespace, CodeTypeRef, CompileUnit, Member, TypeDecl};
/// Logging services for command-line and test hosts.
pub use diagnostics::{RecordingLoggingService, TracingLoggingService};
/// Fatal generation errors.
pub use error::GeneratorError;
/// The built-in proxy generator.
pub use generator::CodeDomClientCodeGenerator;
/// Host surface offered to generators.
pub use host::{
    CodeGenerationHost, Diagnostic, GenerationHost, LoggingService, Severity, SourceLocation,
};
/// Generation options.
pub use options::ClientCodeGenerationOptions;
/// Canonical ordering of a compile unit.
pub use ordering::order_compile_unit;
/// Language providers.
pub use provider::{
    canonical_language, provider_for_language, CSharpCodeProvider, CodeDomProvider,
    VisualBasicCodeProvider,
};
/// Generator plug-in registry.
pub use registry::{DomainServiceClientCodeGenerator, GeneratorMetadata, GeneratorRegistry};
