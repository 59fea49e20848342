// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type and member descriptors of a server assembly.

use crate::attribute::{find_attribute, AttributeDesc};
use crate::type_ref::TypeRef;
use serde::{Deserialize, Serialize};

/// Role of a type in the DomainService model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Identity-bearing, change-tracked type.
    Entity,
    /// Structured value without identity.
    Complex,
    /// Enumeration.
    Enum,
    /// Any other class (services, helpers, attributes).
    #[default]
    Class,
    /// Interface.
    Interface,
}

/// Accessibility of a type or member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible everywhere.
    #[default]
    Public,
    /// Visible inside the declaring assembly.
    Internal,
    /// Visible inside the declaring type.
    Private,
}

/// Passing convention of a parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterMode {
    /// By value.
    #[default]
    In,
    /// `out` parameter.
    Out,
    /// `ref` parameter.
    Ref,
}

fn default_true() -> bool {
    true
}

/// A property of a type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyDesc {
    /// Property name.
    pub name: String,
    /// Property type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Applied attributes.
    #[serde(default)]
    pub attributes: Vec<AttributeDesc>,
    /// Static property.
    #[serde(default)]
    pub is_static: bool,
    /// Accessibility.
    #[serde(default)]
    pub visibility: Visibility,
    /// Has a public setter.
    #[serde(default = "default_true")]
    pub can_write: bool,
    /// Only visible through the type descriptor (no CLR property backs it).
    #[serde(default)]
    pub descriptor_only: bool,
    /// Declaring source file, when the metadata carries it.
    #[serde(default)]
    pub source_file: Option<String>,
}

impl PropertyDesc {
    /// Creates a public, writable instance property.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            attributes: Vec::new(),
            is_static: false,
            visibility: Visibility::Public,
            can_write: true,
            descriptor_only: false,
            source_file: None,
        }
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, attribute: AttributeDesc) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Whether an attribute with `short_name` is applied.
    pub fn has_attribute(&self, short_name: &str) -> bool {
        find_attribute(&self.attributes, short_name).is_some()
    }
}

/// A method parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDesc {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Applied attributes.
    #[serde(default)]
    pub attributes: Vec<AttributeDesc>,
    /// Passing convention.
    #[serde(default)]
    pub mode: ParameterMode,
}

/// A method or constructor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodDesc {
    /// Method name (`.ctor` for constructors).
    pub name: String,
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterDesc>,
    /// Return type.
    #[serde(default = "void_type")]
    pub return_type: TypeRef,
    /// Static method.
    #[serde(default)]
    pub is_static: bool,
    /// Accessibility.
    #[serde(default)]
    pub visibility: Visibility,
    /// Applied attributes.
    #[serde(default)]
    pub attributes: Vec<AttributeDesc>,
    /// Declaring source file, when the metadata carries it.
    #[serde(default)]
    pub source_file: Option<String>,
}

fn void_type() -> TypeRef {
    TypeRef::Void
}

impl MethodDesc {
    /// Parameter types rendered canonically, used as the signature component of member keys.
    pub fn parameter_types(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.ty.to_string()).collect()
    }
}

/// A named value of an enum type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnumMemberDesc {
    /// Member name.
    pub name: String,
    /// Numeric value.
    pub value: i64,
    /// Applied attributes.
    #[serde(default)]
    pub attributes: Vec<AttributeDesc>,
}

/// Borrowed view over any member kind of a type.
#[derive(Clone, Copy, Debug)]
pub enum MemberRef<'a> {
    /// A property.
    Property(&'a PropertyDesc),
    /// A method.
    Method(&'a MethodDesc),
    /// A constructor.
    Constructor(&'a MethodDesc),
}

impl MemberRef<'_> {
    /// Member name.
    pub fn name(&self) -> &str {
        match self {
            Self::Property(p) => &p.name,
            Self::Method(m) | Self::Constructor(m) => &m.name,
        }
    }

    /// Source file recorded in the metadata itself.
    pub fn declared_source_file(&self) -> Option<&str> {
        match self {
            Self::Property(p) => p.source_file.as_deref(),
            Self::Method(m) | Self::Constructor(m) => m.source_file.as_deref(),
        }
    }
}

/// Description of one type of the server assembly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeDesc {
    /// Simple type name.
    pub name: String,
    /// Declaring namespace.
    #[serde(default)]
    pub namespace: String,
    /// Declaring assembly; defaults to the catalog's assembly.
    #[serde(default)]
    pub assembly: String,
    /// Role of the type.
    #[serde(default)]
    pub kind: TypeKind,
    /// Accessibility.
    #[serde(default)]
    pub visibility: Visibility,
    /// Full name of the enclosing type for nested types.
    #[serde(default)]
    pub declaring_type: Option<String>,
    /// Base type full name.
    #[serde(default)]
    pub base_type: Option<String>,
    /// Applied attributes.
    #[serde(default)]
    pub attributes: Vec<AttributeDesc>,
    /// Properties (instance and static, all accessibilities).
    #[serde(default)]
    pub properties: Vec<PropertyDesc>,
    /// Methods.
    #[serde(default)]
    pub methods: Vec<MethodDesc>,
    /// Constructors.
    #[serde(default)]
    pub constructors: Vec<MethodDesc>,
    /// Enum members, for [`TypeKind::Enum`].
    #[serde(default)]
    pub enum_members: Vec<EnumMemberDesc>,
    /// Underlying integral type of an enum.
    #[serde(default)]
    pub underlying_type: Option<TypeRef>,
    /// Declaring source file, when the metadata carries it.
    #[serde(default)]
    pub source_file: Option<String>,
}

impl TypeDesc {
    /// Creates an empty public type.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            assembly: String::new(),
            kind,
            visibility: Visibility::Public,
            declaring_type: None,
            base_type: None,
            attributes: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            enum_members: Vec::new(),
            underlying_type: None,
            source_file: None,
        }
    }

    /// Adds a property.
    pub fn with_property(mut self, property: PropertyDesc) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a type-level attribute.
    pub fn with_attribute(mut self, attribute: AttributeDesc) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Namespace-qualified name.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Public and not nested inside a non-public type.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Whether the type is declared inside another type.
    pub fn is_nested(&self) -> bool {
        self.declaring_type.is_some()
    }

    /// Whether an attribute with `short_name` is applied to the type.
    pub fn has_attribute(&self, short_name: &str) -> bool {
        find_attribute(&self.attributes, short_name).is_some()
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDesc> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Looks up a method by name and canonical parameter type list.
    pub fn method(&self, name: &str, parameter_types: &[String]) -> Option<&MethodDesc> {
        self.methods
            .iter()
            .chain(self.constructors.iter())
            .find(|m| m.name == name && m.parameter_types() == parameter_types)
    }

    /// Public instance properties ordered by name.
    pub fn public_instance_properties(&self) -> Vec<&PropertyDesc> {
        let mut props: Vec<&PropertyDesc> = self
            .properties
            .iter()
            .filter(|p| !p.is_static && p.visibility == Visibility::Public)
            .collect();
        props.sort_by(|a, b| a.name.cmp(&b.name));
        props
    }

    /// Every method, constructor and property, instance and static, of any accessibility.
    pub fn members(&self) -> impl Iterator<Item = MemberRef<'_>> {
        self.methods
            .iter()
            .map(MemberRef::Method)
            .chain(self.constructors.iter().map(MemberRef::Constructor))
            .chain(self.properties.iter().map(MemberRef::Property))
    }
}

/// Whether `assembly` is part of the framework and therefore present on every client.
pub fn is_system_assembly(assembly: &str) -> bool {
    let name = assembly.split(',').next().unwrap_or(assembly).trim();
    name == "mscorlib"
        || name == "netstandard"
        || name == "System"
        || name.starts_with("System.")
        || name.starts_with("Microsoft.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_assembly_detection_ignores_version_suffix() {
        assert!(is_system_assembly("mscorlib"));
        assert!(is_system_assembly("System.Runtime, Version=4.0.0.0"));
        assert!(!is_system_assembly("Acme.Web"));
        assert!(!is_system_assembly("Systematic.Tools"));
    }

    #[test]
    fn public_instance_properties_are_name_ordered() {
        let mut ty = TypeDesc::new("Acme", "Order", TypeKind::Entity)
            .with_property(PropertyDesc::new("Zeta", TypeRef::parse("int").unwrap()))
            .with_property(PropertyDesc::new("Alpha", TypeRef::parse("int").unwrap()));
        let mut hidden = PropertyDesc::new("Beta", TypeRef::parse("int").unwrap());
        hidden.visibility = Visibility::Internal;
        ty.properties.push(hidden);
        let names: Vec<_> = ty
            .public_instance_properties()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }
}
