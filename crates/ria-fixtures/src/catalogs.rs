// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixture catalogs.
//!
//! `NORTHWIND_JSON` describes one `OrderService` with three entities
//! (`Order`, `OrderLine`, `Customer`), a complex type, a public enum and an
//! internal enum, and every operation kind. `GetAuditLevel` returns the
//! internal enum and therefore cannot be exposed to a client.

use ria_schema::{Catalog, TypeRef};

/// The Northwind fixture catalog as JSON text.
pub const NORTHWIND_JSON: &str = include_str!("../data/northwind.json");

/// Parses [`NORTHWIND_JSON`].
///
/// # Panics
/// Panics if the fixture no longer parses.
#[allow(clippy::expect_used)]
pub fn northwind() -> Catalog {
    Catalog::from_json(NORTHWIND_JSON).expect("northwind fixture parses")
}

/// Parses a type reference.
///
/// # Panics
/// Panics on invalid type text.
#[allow(clippy::expect_used)]
pub fn ty(text: &str) -> TypeRef {
    TypeRef::parse(text).expect("valid type reference")
}
