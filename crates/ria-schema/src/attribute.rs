// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Custom attribute metadata attached to types, members, operations and parameters.

use crate::type_ref::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespace of the DataAnnotations attribute family.
pub const SYSTEM_ANNOTATIONS_NAMESPACE: &str = "System.ComponentModel.DataAnnotations";

const SERVER_NAMESPACE: &str = "OpenRiaServices.Server";

/// Short names that resolve to a well-known namespace when a catalog spells
/// them unqualified.
const WELL_KNOWN: &[(&str, &str)] = &[
    ("Association", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("Compare", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("ConcurrencyCheck", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("CreditCard", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("CustomValidation", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("DataType", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("Display", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("Editable", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("EmailAddress", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("Key", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("MaxLength", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("MinLength", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("Phone", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("Range", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("RegularExpression", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("Required", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("StringLength", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("Timestamp", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("Url", SYSTEM_ANNOTATIONS_NAMESPACE),
    ("Composition", SERVER_NAMESPACE),
    ("Delete", SERVER_NAMESPACE),
    ("EntityAction", SERVER_NAMESPACE),
    ("Exclude", SERVER_NAMESPACE),
    ("ExternalReference", SERVER_NAMESPACE),
    ("Ignore", SERVER_NAMESPACE),
    ("Include", SERVER_NAMESPACE),
    ("Insert", SERVER_NAMESPACE),
    ("Invoke", SERVER_NAMESPACE),
    ("Query", SERVER_NAMESPACE),
    ("RoundtripOriginal", SERVER_NAMESPACE),
    ("Update", SERVER_NAMESPACE),
    ("Flags", "System"),
];

/// DataAnnotations attributes that derive from `ValidationAttribute`.
const VALIDATION: &[&str] = &[
    "Compare",
    "CreditCard",
    "CustomValidation",
    "DataType",
    "EmailAddress",
    "MaxLength",
    "MinLength",
    "Phone",
    "Range",
    "RegularExpression",
    "Required",
    "StringLength",
    "Url",
];

/// A constructor or named argument value of an attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// `null`.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Integral literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// String literal.
    String(String),
    /// `typeof(T)` argument.
    Type {
        /// Referenced type.
        #[serde(rename = "typeof")]
        type_of: TypeRef,
    },
    /// Enum member argument (`Color.Red`).
    Enum {
        /// Enum type name.
        #[serde(rename = "enum")]
        enum_type: String,
        /// Member name.
        member: String,
    },
    /// Array argument.
    Array(Vec<AttrValue>),
}

/// One attribute application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeDesc {
    /// Attribute type name, qualified or short (`Range`, `RangeAttribute`,
    /// `System.ComponentModel.DataAnnotations.RangeAttribute`).
    #[serde(rename = "type")]
    pub type_name: String,
    /// Positional constructor arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<AttrValue>,
    /// Named property arguments, ordered by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named: BTreeMap<String, AttrValue>,
    /// Marks a custom attribute as a validation attribute.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub validation: bool,
}

impl AttributeDesc {
    /// Creates an attribute with no arguments.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            args: Vec::new(),
            named: BTreeMap::new(),
            validation: false,
        }
    }

    /// Appends a positional argument.
    pub fn with_arg(mut self, value: AttrValue) -> Self {
        self.args.push(value);
        self
    }

    /// Sets a named argument.
    pub fn with_named(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.named.insert(name.into(), value);
        self
    }

    /// Name without namespace and without the `Attribute` suffix.
    pub fn short_name(&self) -> &str {
        let last = self.type_name.rsplit('.').next().unwrap_or(&self.type_name);
        last.strip_suffix("Attribute")
            .filter(|s| !s.is_empty())
            .unwrap_or(last)
    }

    /// Namespace of the attribute type, inferring well-known namespaces for
    /// unqualified names. Empty when unknown.
    pub fn namespace(&self) -> &str {
        match self.type_name.rfind('.') {
            Some(idx) => &self.type_name[..idx],
            None => WELL_KNOWN
                .iter()
                .find(|(short, _)| *short == self.short_name())
                .map_or("", |(_, ns)| ns),
        }
    }

    /// Fully qualified attribute type name including the `Attribute` suffix.
    pub fn full_type_name(&self) -> String {
        let ns = self.namespace();
        let class = format!("{}Attribute", self.short_name());
        if ns.is_empty() {
            class
        } else {
            format!("{ns}.{class}")
        }
    }

    /// Whether this is the attribute with the given short name.
    pub fn is(&self, short_name: &str) -> bool {
        self.short_name() == short_name
    }

    /// Whether the attribute participates in validation.
    pub fn is_validation(&self) -> bool {
        self.validation || VALIDATION.contains(&self.short_name())
    }

    /// Whether the attribute only has meaning on the server and is never
    /// propagated into client code.
    pub fn is_server_only(&self) -> bool {
        self.namespace() == SERVER_NAMESPACE
    }

    /// Named boolean argument, if present.
    pub fn named_bool(&self, name: &str) -> Option<bool> {
        match self.named.get(name) {
            Some(AttrValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Positional string argument at `index`, if present.
    pub fn string_arg(&self, index: usize) -> Option<&str> {
        match self.args.get(index) {
            Some(AttrValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Positional boolean argument at `index`, if present.
    pub fn bool_arg(&self, index: usize) -> Option<bool> {
        match self.args.get(index) {
            Some(AttrValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

/// Finds the first attribute with `short_name` in `attributes`.
pub fn find_attribute<'a>(attributes: &'a [AttributeDesc], short_name: &str) -> Option<&'a AttributeDesc> {
    attributes.iter().find(|a| a.is(short_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_full_names_normalize() {
        let a = AttributeDesc::new("RangeAttribute");
        let b = AttributeDesc::new("System.ComponentModel.DataAnnotations.RangeAttribute");
        let c = AttributeDesc::new("Range");
        assert_eq!(a.short_name(), "Range");
        assert_eq!(b.short_name(), "Range");
        assert_eq!(a.full_type_name(), b.full_type_name());
        assert_eq!(c.full_type_name(), b.full_type_name());
        assert!(c.is_validation());
    }

    #[test]
    fn server_only_attributes_are_recognised() {
        assert!(AttributeDesc::new("Include").is_server_only());
        assert!(AttributeDesc::new("RoundtripOriginal").is_server_only());
        assert!(!AttributeDesc::new("Key").is_server_only());
    }

    #[test]
    fn attribute_values_deserialize_from_plain_json() {
        let json = r#"{"type":"Range","args":[1,100.5,"x",null,{"typeof":"Int32"},{"enum":"Acme.Color","member":"Red"}],"named":{"ErrorMessage":"bad"}}"#;
        let attr: AttributeDesc = serde_json::from_str(json).unwrap();
        assert_eq!(attr.args[0], AttrValue::Int(1));
        assert_eq!(attr.args[1], AttrValue::Float(100.5));
        assert_eq!(attr.args[3], AttrValue::Null);
        assert!(matches!(attr.args[4], AttrValue::Type { .. }));
        assert!(matches!(attr.args[5], AttrValue::Enum { .. }));
        assert_eq!(
            attr.named.get("ErrorMessage"),
            Some(&AttrValue::String("bad".into()))
        );
    }
}
