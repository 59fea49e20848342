// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! ria-schema: the server-side metadata model consumed by client proxy generation.
//!
//! A server assembly is described as data (a [`Catalog`]) rather than
//! discovered through runtime reflection: types with their properties,
//! methods and attributes live in an immutable [`TypeRegistry`], and each
//! DomainService becomes a [`DomainServiceDescription`] listing its
//! operations in name order.
//!
//! The [`MetaType`] cache classifies the members of entity and complex types
//! (keys, associations, round-trip members, validation) and is shared by the
//! code generator and the hosting runtime.
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

mod attribute;
mod catalog;
mod description;
mod error;
mod meta;
mod operation;
mod registry;
mod type_ref;
mod types;

/// Attribute metadata and well-known attribute names.
pub use attribute::{find_attribute, AttrValue, AttributeDesc, SYSTEM_ANNOTATIONS_NAMESPACE};
/// Catalog loading (JSON description of a server assembly).
pub use catalog::Catalog;
/// DomainService descriptions built from a catalog.
pub use description::{DomainServiceDescription, ServiceDefinition, ServiceTypeInfo};
/// Error type for metadata loading and validation.
pub use error::SchemaError;
/// Per-type member classification cache.
pub use meta::{MetaMember, MetaType};
/// DomainService operations and their parameters.
pub use operation::{DomainOperation, DomainOperationEntry, DomainOperationParameter};
/// Immutable type registry.
pub use registry::{RegistryId, TypeRegistry};
/// Textual type references.
pub use type_ref::{CollectionKind, PrimitiveType, TypeRef};
/// Type and member descriptors.
pub use types::{
    is_system_assembly, EnumMemberDesc, MemberRef, MethodDesc, ParameterDesc, ParameterMode,
    PropertyDesc, TypeDesc, TypeKind, Visibility,
};
