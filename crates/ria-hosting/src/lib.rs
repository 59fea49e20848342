// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! ria-hosting: calling DomainServices in-process through typed contracts.
//!
//! A [`ServiceContract`] is checked against a DomainService description by
//! [`DomainServiceProxyGenerator`], which defines a [`ProxyType`] that
//! forwards contract calls to query, invoke and submit delegates.
//! [`DomainServiceProxyHelper`] supplies delegates that create DomainService
//! instances through a [`DomainServiceFactory`], reconcile submitted
//! entities with [`ChangeSetProcessor`] and raise [`OperationError`] for
//! validation failures.
//!
//! [`DataContractSurrogateGenerator`] provides serialization surrogates that
//! expose descriptor-only members.
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

mod changeset;
mod contract;
mod error;
mod helper;
mod proxy;
mod service;
mod surrogate;
mod value;

/// Change-set entries and identity reconciliation.
pub use changeset::{ChangeSet, ChangeSetEntry, ChangeSetProcessor, EntityAction, EntityOperationType};
/// Contracts implemented by proxies.
pub use contract::{ContractMethod, ContractParameter, ServiceContract};
/// Error types.
pub use error::{ChangeSetError, OperationError, ProxyCallError, ProxyGenerationError, ValidationResultInfo};
/// Default dispatch delegates.
pub use helper::DomainServiceProxyHelper;
/// Proxy generation and proxy instances.
pub use proxy::{
    DispatchRequest, DomainServiceProxyGenerator, InvokeDelegate, ProxyInstance, ProxyModule, ProxyType,
    QueryDelegate, SubmitDelegate, SubmitRequest,
};
/// The DomainService seam.
pub use service::{
    DomainOperationType, DomainService, DomainServiceContext, DomainServiceFactory, InvokeResult, QueryResult,
};
/// Serialization surrogates.
pub use surrogate::{
    DataContractSurrogateGenerator, DomainServiceSerializationSurrogate, SurrogateMember, SurrogateType,
};
/// Runtime values.
pub use value::{EntityRef, OriginalEntityMap, Value, WeakEntityRef};
