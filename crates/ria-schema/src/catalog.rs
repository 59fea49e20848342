// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON catalogs describing a server assembly.
//!
//! A catalog is the build-time stand-in for loading a server assembly: it
//! lists the assembly's types and DomainServices. Descriptions are built once
//! at load and cached by service name.

use crate::description::{DomainServiceDescription, ServiceDefinition};
use crate::error::SchemaError;
use crate::registry::TypeRegistry;
use crate::types::TypeDesc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize, Serialize)]
struct CatalogDocument {
    assembly: String,
    #[serde(default)]
    types: Vec<TypeDesc>,
    #[serde(default)]
    services: Vec<ServiceDefinition>,
}

/// A loaded server assembly: type registry plus DomainService descriptions.
#[derive(Debug)]
pub struct Catalog {
    assembly: String,
    registry: Arc<TypeRegistry>,
    descriptions: BTreeMap<String, Arc<DomainServiceDescription>>,
}

impl Catalog {
    /// Parses a catalog from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let doc: CatalogDocument = serde_json::from_str(text)?;
        Self::from_parts(doc.assembly, doc.types, doc.services)
    }

    /// Reads and parses a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loading catalog");
        Self::from_json(&text)
    }

    /// Builds a catalog from in-memory parts. Types and services without an
    /// explicit assembly inherit `assembly`.
    pub fn from_parts(
        assembly: impl Into<String>,
        types: Vec<TypeDesc>,
        services: Vec<ServiceDefinition>,
    ) -> Result<Self, SchemaError> {
        let assembly = assembly.into();
        let types = types.into_iter().map(|mut t| {
            if t.assembly.is_empty() {
                t.assembly.clone_from(&assembly);
            }
            t
        });
        let registry = Arc::new(TypeRegistry::new(types)?);

        let mut descriptions = BTreeMap::new();
        for mut def in services {
            if def.service.assembly.is_empty() {
                def.service.assembly.clone_from(&assembly);
            }
            let name = def.service.name.clone();
            if descriptions.contains_key(&name) {
                return Err(SchemaError::DuplicateService(name));
            }
            let desc = DomainServiceDescription::new(def, Arc::clone(&registry))?;
            descriptions.insert(name, Arc::new(desc));
        }

        debug!(
            assembly = %assembly,
            types = registry.len(),
            services = descriptions.len(),
            "catalog loaded"
        );
        Ok(Self {
            assembly,
            registry,
            descriptions,
        })
    }

    /// Name of the described assembly.
    pub fn assembly(&self) -> &str {
        &self.assembly
    }

    /// The type registry.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Cached description for the named service.
    pub fn description(&self, service_name: &str) -> Option<Arc<DomainServiceDescription>> {
        self.descriptions.get(service_name).cloned()
    }

    /// All descriptions ordered by service name.
    pub fn descriptions(&self) -> Vec<Arc<DomainServiceDescription>> {
        self.descriptions.values().cloned().collect()
    }
}
