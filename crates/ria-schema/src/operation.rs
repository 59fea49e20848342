// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! DomainService operations.

use crate::attribute::{find_attribute, AttributeDesc};
use crate::type_ref::TypeRef;
use crate::types::ParameterMode;
use serde::{Deserialize, Serialize};

/// Kind of a DomainService operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainOperation {
    /// Returns entities.
    Query,
    /// Inserts an entity during submit.
    Insert,
    /// Updates an entity during submit.
    Update,
    /// Deletes an entity during submit.
    Delete,
    /// Named entity action applied during submit.
    Custom,
    /// Arbitrary service method invoked directly.
    Invoke,
}

impl DomainOperation {
    /// Whether the operation runs as part of change-set submission.
    pub fn is_submit(self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete | Self::Custom)
    }
}

/// One parameter of an operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainOperationParameter {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Applied attributes (validation and others).
    #[serde(default)]
    pub attributes: Vec<AttributeDesc>,
    /// Passing convention.
    #[serde(default)]
    pub mode: ParameterMode,
}

impl DomainOperationParameter {
    /// Creates a by-value parameter.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            attributes: Vec::new(),
            mode: ParameterMode::In,
        }
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, attribute: AttributeDesc) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// One operation exposed by a DomainService. Read-only once described.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainOperationEntry {
    /// Operation (method) name.
    pub name: String,
    /// Operation kind.
    #[serde(rename = "kind")]
    pub operation: DomainOperation,
    /// Return type.
    #[serde(default = "void_type")]
    pub return_type: TypeRef,
    /// Ordered parameters.
    #[serde(default)]
    pub parameters: Vec<DomainOperationParameter>,
    /// Custom attributes on the operation.
    #[serde(default)]
    pub attributes: Vec<AttributeDesc>,
    /// Explicit side-effect flag; otherwise read from the `Query`/`Invoke` attribute.
    #[serde(default)]
    pub has_side_effects: Option<bool>,
}

fn void_type() -> TypeRef {
    TypeRef::Void
}

impl DomainOperationEntry {
    /// Creates an operation with no parameters.
    pub fn new(name: impl Into<String>, operation: DomainOperation, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            operation,
            return_type,
            parameters: Vec::new(),
            attributes: Vec::new(),
            has_side_effects: None,
        }
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, parameter: DomainOperationParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Adds an operation attribute.
    pub fn with_attribute(mut self, attribute: AttributeDesc) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Whether invoking the operation may change server state.
    ///
    /// Invoke operations default to `true`, queries to `false`.
    pub fn has_side_effects(&self) -> bool {
        if let Some(explicit) = self.has_side_effects {
            return explicit;
        }
        let marker = match self.operation {
            DomainOperation::Query => "Query",
            DomainOperation::Invoke => "Invoke",
            _ => return false,
        };
        find_attribute(&self.attributes, marker)
            .and_then(|a| a.named_bool("HasSideEffects"))
            .unwrap_or(self.operation == DomainOperation::Invoke)
    }

    /// Whether a query returns a single entity rather than a sequence.
    pub fn is_singleton_query(&self) -> bool {
        self.operation == DomainOperation::Query && !self.return_type.is_collection()
    }

    /// Whether further query operators may be composed onto the query.
    pub fn is_composable(&self) -> bool {
        if self.is_singleton_query() {
            return false;
        }
        find_attribute(&self.attributes, "Query")
            .and_then(|a| a.named_bool("IsComposable"))
            .unwrap_or(true)
    }

    /// Entity type the operation is associated with: the query element type or
    /// the first parameter of a submit operation.
    pub fn entity_type(&self) -> Option<&TypeRef> {
        match self.operation {
            DomainOperation::Query => Some(self.return_type.element_type()),
            op if op.is_submit() => self.parameters.first().map(|p| &p.ty),
            _ => None,
        }
    }

    /// Validation attributes declared on the operation.
    pub fn validation_attributes(&self) -> impl Iterator<Item = &AttributeDesc> {
        self.attributes.iter().filter(|a| a.is_validation())
    }
}
