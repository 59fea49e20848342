// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! DomainService descriptions.
//!
//! A description is built once per service from its definition, validated,
//! and then shared immutably. Operations are kept in name order so every
//! consumer iterates them deterministically.

use crate::attribute::AttributeDesc;
use crate::error::SchemaError;
use crate::operation::{DomainOperation, DomainOperationEntry};
use crate::registry::TypeRegistry;
use crate::type_ref::TypeRef;
use crate::types::{TypeDesc, TypeKind, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// Identity of a DomainService type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceTypeInfo {
    /// Service class name.
    pub name: String,
    /// Declaring namespace.
    #[serde(default)]
    pub namespace: String,
    /// Declaring assembly; defaults to the catalog's assembly.
    #[serde(default)]
    pub assembly: String,
    /// Accessibility of the service class.
    #[serde(default)]
    pub visibility: Visibility,
    /// Service-level attributes.
    #[serde(default)]
    pub attributes: Vec<AttributeDesc>,
    /// Declaring source file, when known.
    #[serde(default)]
    pub source_file: Option<String>,
}

impl ServiceTypeInfo {
    /// Creates a public service type.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            assembly: String::new(),
            visibility: Visibility::Public,
            attributes: Vec::new(),
            source_file: None,
        }
    }

    /// Namespace-qualified name.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Whether the service class is public.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Serialized form of a DomainService: its identity plus operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Service identity.
    #[serde(flatten)]
    pub service: ServiceTypeInfo,
    /// Operations in any order.
    #[serde(default)]
    pub operations: Vec<DomainOperationEntry>,
}

/// Validated, immutable description of one DomainService.
#[derive(Debug)]
pub struct DomainServiceDescription {
    service: ServiceTypeInfo,
    registry: Arc<TypeRegistry>,
    operations: Vec<Arc<DomainOperationEntry>>,
    entity_types: Vec<Arc<TypeDesc>>,
    complex_types: Vec<Arc<TypeDesc>>,
}

impl DomainServiceDescription {
    /// Validates `definition` against `registry` and builds the description.
    pub fn new(definition: ServiceDefinition, registry: Arc<TypeRegistry>) -> Result<Self, SchemaError> {
        let ServiceDefinition {
            service,
            mut operations,
        } = definition;

        for op in &operations {
            validate_operation(&service, op, &registry)?;
        }
        operations.sort_by(|a, b| a.name.cmp(&b.name));

        let entity_types = entity_closure(&operations, &registry);
        let complex_types = complex_closure(&operations, &entity_types, &registry);

        Ok(Self {
            service,
            registry,
            operations: operations.into_iter().map(Arc::new).collect(),
            entity_types,
            complex_types,
        })
    }

    /// The service type.
    pub fn service_type(&self) -> &ServiceTypeInfo {
        &self.service
    }

    /// Service class name.
    pub fn name(&self) -> &str {
        &self.service.name
    }

    /// Registry the description was validated against.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// All operations, ordered by name.
    pub fn domain_operation_entries(&self) -> &[Arc<DomainOperationEntry>] {
        &self.operations
    }

    /// Operations with the given name (more than one only for overloads).
    pub fn entries_named(&self, name: &str) -> Vec<&Arc<DomainOperationEntry>> {
        self.operations.iter().filter(|op| op.name == name).collect()
    }

    /// Entity types exposed by the service, ordered by full name.
    pub fn entity_types(&self) -> &[Arc<TypeDesc>] {
        &self.entity_types
    }

    /// Complex types exposed by the service, ordered by full name.
    pub fn complex_types(&self) -> &[Arc<TypeDesc>] {
        &self.complex_types
    }

    /// Whether `full_name` is one of this service's entity types.
    pub fn is_entity_type(&self, full_name: &str) -> bool {
        self.entity_types.iter().any(|t| t.full_name() == full_name)
    }

    /// Submit operations of `kind` whose entity is `entity_full_name`.
    pub fn operations_for_entity(
        &self,
        entity_full_name: &str,
        kind: DomainOperation,
    ) -> Vec<&Arc<DomainOperationEntry>> {
        self.operations
            .iter()
            .filter(|op| op.operation == kind)
            .filter(|op| {
                op.entity_type()
                    .and_then(|t| self.registry.full_name_of(&t.to_string()))
                    .is_some_and(|name| name == entity_full_name)
            })
            .collect()
    }

    /// Whether an operation of `kind` exists for the entity.
    pub fn supports(&self, entity_full_name: &str, kind: DomainOperation) -> bool {
        !self.operations_for_entity(entity_full_name, kind).is_empty()
    }
}

fn invalid(service: &ServiceTypeInfo, op: &DomainOperationEntry, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidOperation {
        service: service.name.clone(),
        operation: op.name.clone(),
        reason: reason.into(),
    }
}

fn check_resolvable(
    service: &ServiceTypeInfo,
    op: &DomainOperationEntry,
    ty: &TypeRef,
    registry: &TypeRegistry,
) -> Result<(), SchemaError> {
    if let TypeRef::Named(name) = ty.innermost() {
        if registry.get(name).is_none() {
            return Err(SchemaError::UnknownType {
                type_name: name.clone(),
                context: format!("{}.{}", service.name, op.name),
            });
        }
    }
    Ok(())
}

fn validate_operation(
    service: &ServiceTypeInfo,
    op: &DomainOperationEntry,
    registry: &TypeRegistry,
) -> Result<(), SchemaError> {
    if op.name.trim().is_empty() {
        return Err(invalid(service, op, "operation name is empty"));
    }
    check_resolvable(service, op, &op.return_type, registry)?;
    for p in &op.parameters {
        check_resolvable(service, op, &p.ty, registry)?;
    }

    match op.operation {
        DomainOperation::Query => {
            if !registry.is_entity(op.return_type.element_type()) {
                return Err(invalid(
                    service,
                    op,
                    "a query must return an entity type or a collection of entities",
                ));
            }
        }
        DomainOperation::Insert | DomainOperation::Update | DomainOperation::Delete => {
            if op.parameters.len() != 1 {
                return Err(invalid(service, op, "expected exactly one entity parameter"));
            }
            if !registry.is_entity(&op.parameters[0].ty) {
                return Err(invalid(service, op, "the parameter must be an entity type"));
            }
            if !op.return_type.is_void() {
                return Err(invalid(service, op, "submit operations must return void"));
            }
        }
        DomainOperation::Custom => {
            let first_is_entity = op
                .parameters
                .first()
                .is_some_and(|p| registry.is_entity(&p.ty));
            if !first_is_entity {
                return Err(invalid(
                    service,
                    op,
                    "the first parameter of a custom method must be an entity type",
                ));
            }
            if !op.return_type.is_void() {
                return Err(invalid(service, op, "custom methods must return void"));
            }
        }
        DomainOperation::Invoke => {}
    }
    Ok(())
}

fn entity_closure(operations: &[DomainOperationEntry], registry: &TypeRegistry) -> Vec<Arc<TypeDesc>> {
    let mut found: BTreeMap<String, Arc<TypeDesc>> = BTreeMap::new();
    let mut queue: VecDeque<Arc<TypeDesc>> = VecDeque::new();

    for op in operations {
        if let Some(ty) = op.entity_type().and_then(|t| registry.resolve(t)) {
            if ty.kind == TypeKind::Entity {
                queue.push_back(Arc::clone(ty));
            }
        }
    }

    while let Some(ty) = queue.pop_front() {
        let full = ty.full_name();
        if found.contains_key(&full) {
            continue;
        }
        for prop in ty.public_instance_properties() {
            if !prop.has_attribute("Association") || prop.has_attribute("Exclude") {
                continue;
            }
            if let Some(target) = registry.resolve(prop.ty.element_type()) {
                if target.kind == TypeKind::Entity && !found.contains_key(&target.full_name()) {
                    queue.push_back(Arc::clone(target));
                }
            }
        }
        found.insert(full, ty);
    }
    found.into_values().collect()
}

fn complex_closure(
    operations: &[DomainOperationEntry],
    entities: &[Arc<TypeDesc>],
    registry: &TypeRegistry,
) -> Vec<Arc<TypeDesc>> {
    let mut found: BTreeMap<String, Arc<TypeDesc>> = BTreeMap::new();
    let mut queue: VecDeque<Arc<TypeDesc>> = VecDeque::new();

    let push = |ty: &TypeRef, queue: &mut VecDeque<Arc<TypeDesc>>| {
        if let Some(desc) = registry.resolve(ty.innermost()) {
            if desc.kind == TypeKind::Complex {
                queue.push_back(Arc::clone(desc));
            }
        }
    };

    for entity in entities {
        for prop in entity.public_instance_properties() {
            if !prop.has_attribute("Exclude") {
                push(&prop.ty, &mut queue);
            }
        }
    }
    for op in operations {
        push(&op.return_type, &mut queue);
        for p in &op.parameters {
            push(&p.ty, &mut queue);
        }
    }

    while let Some(ty) = queue.pop_front() {
        let full = ty.full_name();
        if found.contains_key(&full) {
            continue;
        }
        for prop in ty.public_instance_properties() {
            if !prop.has_attribute("Exclude") {
                push(&prop.ty, &mut queue);
            }
        }
        found.insert(full, ty);
    }
    found.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::DomainOperationParameter;
    use crate::types::PropertyDesc;

    fn t(s: &str) -> TypeRef {
        TypeRef::parse(s).unwrap()
    }

    fn registry() -> Arc<TypeRegistry> {
        let order = TypeDesc::new("Acme", "Order", TypeKind::Entity)
            .with_property(PropertyDesc::new("Id", t("int")))
            .with_property(
                PropertyDesc::new("Lines", t("IEnumerable<Acme.OrderLine>"))
                    .with_attribute(AttributeDesc::new("Association")),
            )
            .with_property(PropertyDesc::new("ShipTo", t("Acme.Address")));
        let line = TypeDesc::new("Acme", "OrderLine", TypeKind::Entity)
            .with_property(PropertyDesc::new("Id", t("int")));
        let address = TypeDesc::new("Acme", "Address", TypeKind::Complex)
            .with_property(PropertyDesc::new("Geo", t("Acme.Geo")));
        let geo = TypeDesc::new("Acme", "Geo", TypeKind::Complex);
        Arc::new(TypeRegistry::new(vec![order, line, address, geo]).unwrap())
    }

    #[test]
    fn operations_are_name_sorted_and_types_closed_over() {
        let def = ServiceDefinition {
            service: ServiceTypeInfo::new("Acme", "OrderService"),
            operations: vec![
                DomainOperationEntry::new("Zap", DomainOperation::Invoke, TypeRef::Void),
                DomainOperationEntry::new("GetOrders", DomainOperation::Query, t("IQueryable<Order>")),
                DomainOperationEntry::new("InsertOrder", DomainOperation::Insert, TypeRef::Void)
                    .with_parameter(DomainOperationParameter::new("order", t("Order"))),
            ],
        };
        let desc = DomainServiceDescription::new(def, registry()).unwrap();
        let names: Vec<_> = desc
            .domain_operation_entries()
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["GetOrders", "InsertOrder", "Zap"]);

        let entities: Vec<_> = desc.entity_types().iter().map(|t| t.full_name()).collect();
        assert_eq!(entities, vec!["Acme.Order", "Acme.OrderLine"]);
        let complex: Vec<_> = desc.complex_types().iter().map(|t| t.full_name()).collect();
        assert_eq!(complex, vec!["Acme.Address", "Acme.Geo"]);
        assert!(desc.supports("Acme.Order", DomainOperation::Insert));
        assert!(!desc.supports("Acme.Order", DomainOperation::Delete));
    }

    #[test]
    fn query_must_return_entities() {
        let def = ServiceDefinition {
            service: ServiceTypeInfo::new("Acme", "OrderService"),
            operations: vec![DomainOperationEntry::new(
                "GetCount",
                DomainOperation::Query,
                t("int"),
            )],
        };
        let err = DomainServiceDescription::new(def, registry()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidOperation { .. }));
    }

    #[test]
    fn unknown_parameter_types_are_reported() {
        let def = ServiceDefinition {
            service: ServiceTypeInfo::new("Acme", "OrderService"),
            operations: vec![DomainOperationEntry::new("Ping", DomainOperation::Invoke, TypeRef::Void)
                .with_parameter(DomainOperationParameter::new("x", t("Acme.Missing")))],
        };
        let err = DomainServiceDescription::new(def, registry()).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { type_name, .. } if type_name == "Acme.Missing"));
    }
}
