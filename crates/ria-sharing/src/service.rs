// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Share-kind decisions for types, properties and methods.

use crate::error::SharingError;
use crate::key::CodeMemberKey;
use crate::location::SourceFileLocationService;
use crate::params::SharedCodeServiceParameters;
use crate::provider::{DeclaredSourceProvider, SourceFileProvider, SymbolFileProvider};
use crate::share_kind::CodeMemberShareKind;
use crate::shared_files::SharedSourceFiles;
use parking_lot::Mutex;
use ria_schema::{is_system_assembly, Catalog, TypeDesc, TypeRegistry};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Answers whether the client project already has a code element.
///
/// Implementors only provide [`share_kind`](Self::share_kind); the typed
/// helpers build the key.
pub trait SharedCodeLookup: Send + Sync {
    /// Share kind of the element named by `key`.
    fn share_kind(&self, key: &CodeMemberKey) -> CodeMemberShareKind;

    /// Share kind of a type.
    fn type_share_kind(&self, type_name: &str) -> CodeMemberShareKind {
        self.share_kind(&CodeMemberKey::type_key(type_name))
    }

    /// Share kind of a property.
    fn property_share_kind(&self, type_name: &str, property: &str) -> CodeMemberShareKind {
        self.share_kind(&CodeMemberKey::property_key(type_name, property))
    }

    /// Share kind of a method with the given canonical parameter types.
    fn method_share_kind(
        &self,
        type_name: &str,
        method: &str,
        parameter_types: &[String],
    ) -> CodeMemberShareKind {
        self.share_kind(&CodeMemberKey::method_key(
            type_name,
            method,
            parameter_types.to_vec(),
        ))
    }
}

/// Lookup that knows nothing; every answer is `Unknown`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSharedCode;

impl SharedCodeLookup for NoSharedCode {
    fn share_kind(&self, _key: &CodeMemberKey) -> CodeMemberShareKind {
        CodeMemberShareKind::UNKNOWN
    }
}

/// Memoizing share-kind analysis over server metadata and source locations.
///
/// Decision order for a key:
/// 1. the declaring type is not described: framework-namespaced names are
///    `SharedByReference`, anything else `NotShared`;
/// 2. the member does not exist on the type: `NotShared`;
/// 3. the type lives in a system assembly or one the client references:
///    `SharedByReference`;
/// 4. a declaring file is in the shared set: `SharedBySource`;
/// 5. declaring files are known but none is shared: `NotShared`;
/// 6. otherwise `Unknown`.
#[derive(Debug)]
pub struct SharedCodeService {
    registries: Vec<Arc<TypeRegistry>>,
    shared_files: SharedSourceFiles,
    client_assemblies: BTreeSet<String>,
    cache: Mutex<HashMap<CodeMemberKey, CodeMemberShareKind>>,
}

impl SharedCodeService {
    /// Creates a service over already-loaded registries.
    pub fn new<I, S>(
        registries: Vec<Arc<TypeRegistry>>,
        shared_files: SharedSourceFiles,
        client_assemblies: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            registries,
            shared_files,
            client_assemblies: client_assemblies
                .into_iter()
                .map(|a| a.as_ref().to_ascii_lowercase())
                .collect(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a service from a parameter bag, loading every server catalog.
    pub fn from_parameters(params: &SharedCodeServiceParameters) -> Result<Self, SharingError> {
        let registries = params
            .server_assembly_paths
            .iter()
            .map(|path| Catalog::load(path).map(|c| Arc::clone(c.registry())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_registries(registries, params))
    }

    /// Builds a service from a parameter bag over registries the caller has
    /// already loaded; `server_assembly_paths` is ignored.
    pub fn from_registries(
        registries: Vec<Arc<TypeRegistry>>,
        params: &SharedCodeServiceParameters,
    ) -> Self {
        let providers: Vec<Box<dyn SourceFileProvider>> = vec![
            Box::new(SymbolFileProvider::new(params.symbol_search_paths.iter())),
            Box::new(DeclaredSourceProvider),
        ];
        let location = Arc::new(SourceFileLocationService::new(providers));
        let shared_files = SharedSourceFiles::new(location, &params.shared_source_files);
        debug!(
            registries = registries.len(),
            shared_files = shared_files.shared_file_count(),
            client_assemblies = params.client_assembly_paths.len(),
            "shared code service ready"
        );
        Self::new(registries, shared_files, params.client_assembly_names())
    }

    /// The shared-file analysis this service consults.
    pub fn shared_files(&self) -> &SharedSourceFiles {
        &self.shared_files
    }

    fn resolve(&self, type_name: &str) -> Option<&Arc<TypeDesc>> {
        self.registries.iter().find_map(|r| r.get(type_name))
    }

    fn compute(&self, key: &CodeMemberKey) -> CodeMemberShareKind {
        let Some(ty) = self.resolve(key.type_name()) else {
            return if is_framework_name(key.type_name()) {
                CodeMemberShareKind::SHARED_BY_REFERENCE
            } else {
                CodeMemberShareKind::NOT_SHARED
            };
        };
        let member_exists = match key {
            CodeMemberKey::Type { .. } => true,
            CodeMemberKey::Property { property, .. } => ty.property(property).is_some(),
            CodeMemberKey::Method {
                method,
                parameter_types,
                ..
            } => ty.method(method, parameter_types).is_some(),
        };
        if !member_exists {
            return CodeMemberShareKind::NOT_SHARED;
        }
        if is_system_assembly(&ty.assembly) || self.is_client_assembly(&ty.assembly) {
            return CodeMemberShareKind::SHARED_BY_REFERENCE;
        }
        if self.shared_files.get_shared_file_ids(ty, key).is_some() {
            return CodeMemberShareKind::SHARED_BY_SOURCE;
        }
        if self.shared_files.declaring_file_ids(ty, key).is_some() {
            CodeMemberShareKind::NOT_SHARED
        } else {
            CodeMemberShareKind::UNKNOWN
        }
    }

    fn is_client_assembly(&self, assembly: &str) -> bool {
        let name = assembly.split(',').next().unwrap_or(assembly).trim();
        self.client_assemblies.contains(&name.to_ascii_lowercase())
    }
}

impl SharedCodeLookup for SharedCodeService {
    fn share_kind(&self, key: &CodeMemberKey) -> CodeMemberShareKind {
        if let Some(&kind) = self.cache.lock().get(key) {
            return kind;
        }
        let kind = self.compute(key);
        debug!(member = %key, %kind, "share kind computed");
        self.cache.lock().insert(key.clone(), kind);
        kind
    }
}

fn is_framework_name(type_name: &str) -> bool {
    type_name.starts_with("System.") || type_name.starts_with("Microsoft.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ria_schema::{PropertyDesc, TypeKind, TypeRef};

    fn registry() -> Arc<TypeRegistry> {
        let mut order = TypeDesc::new("Acme", "Order", TypeKind::Entity)
            .with_property(PropertyDesc::new("Id", TypeRef::parse("int").unwrap()))
            .with_property(PropertyDesc::new("Note", TypeRef::parse("string").unwrap()));
        order.assembly = "Acme.Web".into();
        order.properties[0].source_file = Some("/src/Order.cs".into());
        order.properties[1].source_file = Some("/src/Order.shared.cs".into());

        let mut server_only = TypeDesc::new("Acme", "Audit", TypeKind::Class);
        server_only.assembly = "Acme.Web".into();
        server_only.source_file = Some("/src/Audit.cs".into());

        let mut unknown = TypeDesc::new("Acme", "Generated", TypeKind::Class);
        unknown.assembly = "Acme.Web".into();

        let mut contract = TypeDesc::new("Acme.Contracts", "Money", TypeKind::Complex);
        contract.assembly = "Acme.Contracts".into();

        Arc::new(TypeRegistry::new(vec![order, server_only, unknown, contract]).unwrap())
    }

    fn service() -> SharedCodeService {
        let params = SharedCodeServiceParameters {
            shared_source_files: vec!["/src/Order.shared.cs".into()],
            client_assembly_paths: vec!["bin/Acme.Contracts.dll".into()],
            ..SharedCodeServiceParameters::default()
        };
        SharedCodeService::from_registries(vec![registry()], &params)
    }

    #[test]
    fn share_kinds_follow_the_evidence() {
        let svc = service();
        assert!(svc
            .type_share_kind("Acme.Order")
            .contains(CodeMemberShareKind::SHARED_BY_SOURCE));
        assert_eq!(
            svc.property_share_kind("Acme.Order", "Note"),
            CodeMemberShareKind::SHARED_BY_SOURCE
        );
        assert_eq!(
            svc.property_share_kind("Acme.Order", "Id"),
            CodeMemberShareKind::NOT_SHARED
        );
        assert_eq!(svc.type_share_kind("Acme.Audit"), CodeMemberShareKind::NOT_SHARED);
        assert_eq!(svc.type_share_kind("Acme.Generated"), CodeMemberShareKind::UNKNOWN);
        assert_eq!(
            svc.type_share_kind("Acme.Contracts.Money"),
            CodeMemberShareKind::SHARED_BY_REFERENCE
        );
    }

    #[test]
    fn unresolvable_members_are_not_shared() {
        let svc = service();
        assert_eq!(svc.type_share_kind("Nowhere.Thing"), CodeMemberShareKind::NOT_SHARED);
        assert_eq!(
            svc.property_share_kind("Acme.Order", "Missing"),
            CodeMemberShareKind::NOT_SHARED
        );
        assert_eq!(
            svc.method_share_kind("Acme.Order", "Ship", &[]),
            CodeMemberShareKind::NOT_SHARED
        );
        assert_eq!(
            svc.type_share_kind("System.ComponentModel.DataAnnotations.RequiredAttribute"),
            CodeMemberShareKind::SHARED_BY_REFERENCE
        );
    }

    #[test]
    fn no_shared_code_knows_nothing() {
        assert!(NoSharedCode.type_share_kind("Acme.Order").is_unknown());
    }
}
