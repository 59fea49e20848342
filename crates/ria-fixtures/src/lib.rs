// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Test support shared by the ria crates.
//!
//! [`catalogs`] holds the Northwind sample assembly used across the
//! generator and hosting suites. [`config`] provides an in-memory preference
//! store with injectable faults. [`sharing`] answers share-kind queries from
//! a fixed table instead of inspecting real files.
#![forbid(unsafe_code)]

pub mod catalogs;
pub mod config;
pub mod sharing;

pub use catalogs::{northwind, ty, NORTHWIND_JSON};
pub use config::InMemoryConfigStore;
pub use sharing::StaticSharedCode;
