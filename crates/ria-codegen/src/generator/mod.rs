// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The built-in client proxy generator.
//!
//! One [`ClientProxySession`] lives for a single `generate_code` call. It
//! walks the descriptions in service-name order, generates the entity and
//! complex types each service exposes, then the `DomainContext` with its
//! query, invoke and submit members, and finally every enum that was queued
//! while deciding whether enums could be exposed.
//!
//! Failures confined to one operation, member or attribute are logged
//! through the host and only that unit is skipped.

mod attributes;
mod context;
mod entity;
mod enums;
mod invoke;
mod names;
mod query;
mod submit;

use crate::code_model::{CodeTypeRef, CompileUnit, TypeDecl};
use crate::error::GeneratorError;
use crate::host::{GenerationHost, SourceLocation};
use crate::options::ClientCodeGenerationOptions;
use crate::ordering::order_compile_unit;
use crate::provider::provider_for_language;
use crate::registry::DomainServiceClientCodeGenerator;
use ria_schema::{CollectionKind, DomainServiceDescription, TypeDesc, TypeRef, TypeRegistry};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info_span};

/// Namespaces imported by every generated namespace.
const CLIENT_IMPORTS: &[&str] = &[
    "OpenRiaServices",
    "OpenRiaServices.Client",
    "System",
    "System.Collections.Generic",
    "System.ComponentModel",
    "System.ComponentModel.DataAnnotations",
    "System.Linq",
    "System.Runtime.Serialization",
    "System.ServiceModel",
];

/// Generates `DomainContext`, entity, complex type and enum proxies through
/// the language-neutral code model.
#[derive(Clone, Copy, Debug, Default)]
pub struct CodeDomClientCodeGenerator;

impl CodeDomClientCodeGenerator {
    /// Registration name of the built-in generator.
    pub const GENERATOR_NAME: &'static str = "CodeDomClientCodeGenerator";

    /// Creates the generator.
    pub fn new() -> Self {
        Self
    }

    /// Builds the ordered code model without rendering it.
    pub fn generate_compile_unit(
        &self,
        host: &dyn GenerationHost,
        descriptions: &[Arc<DomainServiceDescription>],
        options: &ClientCodeGenerationOptions,
        is_visual_basic: bool,
    ) -> CompileUnit {
        let mut session = ClientProxySession::new(host, options, is_visual_basic);
        let mut ordered: Vec<&Arc<DomainServiceDescription>> = descriptions.iter().collect();
        ordered.sort_by_key(|d| d.service_type().full_name());
        for description in ordered {
            let _span = info_span!("domain_service", service = %description.name()).entered();
            session.generate_service(description);
        }
        session.generate_pending_enums();
        let mut unit = session.unit;
        order_compile_unit(&mut unit);
        unit
    }
}

impl DomainServiceClientCodeGenerator for CodeDomClientCodeGenerator {
    fn generate_code(
        &self,
        host: &dyn GenerationHost,
        descriptions: &[Arc<DomainServiceDescription>],
        options: &ClientCodeGenerationOptions,
    ) -> Result<String, GeneratorError> {
        let provider = provider_for_language(&options.language)
            .ok_or_else(|| GeneratorError::UnsupportedLanguage(options.language.clone()))?;
        let is_vb = provider.language() == "VB";
        let unit = self.generate_compile_unit(host, descriptions, options, is_vb);
        let text = provider.generate_code_from_compile_unit(&unit)?;
        debug!(
            language = provider.language(),
            services = descriptions.len(),
            bytes = text.len(),
            "client code generated"
        );
        Ok(text)
    }
}

/// Mutable state of one generation run.
pub(crate) struct ClientProxySession<'a> {
    host: &'a dyn GenerationHost,
    options: &'a ClientCodeGenerationOptions,
    is_vb: bool,
    unit: CompileUnit,
    /// Server full names of types already generated or known to be shared.
    handled_types: BTreeSet<String>,
    pending_enums: BTreeMap<String, Arc<TypeDesc>>,
}

impl<'a> ClientProxySession<'a> {
    fn new(host: &'a dyn GenerationHost, options: &'a ClientCodeGenerationOptions, is_vb: bool) -> Self {
        Self {
            host,
            options,
            is_vb,
            unit: CompileUnit::default(),
            handled_types: BTreeSet::new(),
            pending_enums: BTreeMap::new(),
        }
    }

    fn generate_service(&mut self, description: &DomainServiceDescription) {
        if !description.service_type().is_public() {
            self.error(
                &format!(
                    "The DomainService '{}' is not public and no client code will be generated for it.",
                    description.service_type().full_name()
                ),
                description.service_type().source_file.as_deref(),
            );
            return;
        }
        for entity in description.entity_types() {
            entity::generate_entity(self, description, entity);
        }
        for complex in description.complex_types() {
            entity::generate_complex_type(self, description, complex);
        }
        context::generate_domain_context(self, description);
    }

    fn generate_pending_enums(&mut self) {
        while let Some((_, desc)) = self.pending_enums.pop_first() {
            enums::generate_enum(self, &desc);
        }
    }

    /// Client namespace for a server namespace.
    pub(crate) fn client_namespace(&self, server_namespace: &str) -> String {
        self.options.client_namespace(server_namespace, self.is_vb)
    }

    /// Adds a top-level type to the namespace matching `server_namespace`.
    pub(crate) fn add_type(&mut self, server_namespace: &str, decl: TypeDecl) {
        let ns_name = self.client_namespace(server_namespace);
        let ns = self.unit.namespace_mut(&ns_name);
        if ns.imports.is_empty() {
            ns.imports = CLIENT_IMPORTS.iter().map(|s| (*s).to_string()).collect();
        }
        ns.types.push(decl);
    }

    /// Whether `name` is already declared in the client namespace of `server_namespace`.
    pub(crate) fn is_declared(&self, server_namespace: &str, name: &str) -> bool {
        self.unit
            .find_type(&self.client_namespace(server_namespace), name)
            .is_some()
    }

    /// Marks a server type as handled; returns `false` when it already was.
    pub(crate) fn claim_type(&mut self, full_name: &str) -> bool {
        self.handled_types.insert(full_name.to_string())
    }

    /// Reference to a generated (or shared) user type as seen from `from_namespace`.
    pub(crate) fn named_type(&self, desc: &TypeDesc, from_namespace: &str) -> CodeTypeRef {
        let ns = self.client_namespace(&desc.namespace);
        if !ns.is_empty() && (self.options.use_full_type_names || ns != from_namespace) {
            CodeTypeRef::named(format!("{ns}.{}", desc.name))
        } else {
            CodeTypeRef::named(desc.name.clone())
        }
    }

    /// Converts a server type reference to its client spelling.
    pub(crate) fn code_type(&self, ty: &TypeRef, registry: &TypeRegistry, from_namespace: &str) -> CodeTypeRef {
        match ty {
            TypeRef::Void => CodeTypeRef::Void,
            TypeRef::Primitive(p) => CodeTypeRef::Primitive(*p),
            TypeRef::Named(name) => registry.get(name).map_or_else(
                || CodeTypeRef::named(name.clone()),
                |desc| self.named_type(desc, from_namespace),
            ),
            TypeRef::Nullable(inner) => {
                CodeTypeRef::Nullable(Box::new(self.code_type(inner, registry, from_namespace)))
            }
            TypeRef::Collection { kind, element } => {
                let element = self.code_type(element, registry, from_namespace);
                match kind {
                    CollectionKind::Array => CodeTypeRef::Array(Box::new(element)),
                    CollectionKind::List => CodeTypeRef::generic("List", vec![element]),
                    CollectionKind::Enumerable | CollectionKind::Queryable => {
                        CodeTypeRef::generic("IEnumerable", vec![element])
                    }
                }
            }
        }
    }

    /// Attribute type name as it should be written: short when its
    /// namespace is imported, otherwise qualified.
    pub(crate) fn attribute_name(&self, namespace: &str, short_name: &str) -> String {
        if namespace.is_empty() || (!self.options.use_full_type_names && CLIENT_IMPORTS.contains(&namespace)) {
            short_name.to_string()
        } else {
            format!("{namespace}.{short_name}")
        }
    }

    pub(crate) fn error(&self, message: &str, file: Option<&str>) {
        match file {
            Some(file) => self.host.log_error_at(message, SourceLocation::file(file)),
            None => self.host.log_error(message),
        }
    }

    pub(crate) fn warning(&self, message: &str, file: Option<&str>) {
        match file {
            Some(file) => self.host.log_warning_at(message, SourceLocation::file(file)),
            None => self.host.log_warning(message),
        }
    }

    pub(crate) fn host(&self) -> &dyn GenerationHost {
        self.host
    }
}
