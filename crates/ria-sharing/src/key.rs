// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity of the code element a sharing question is about.

use ria_schema::{MemberRef, MethodDesc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A type, property or method of the server assembly.
///
/// Keys compare by declaring type, member name and, for methods, the
/// canonical parameter type list, so two keys built from separate lookups of
/// the same member are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum CodeMemberKey {
    /// A whole type.
    Type {
        /// Full type name.
        type_name: String,
    },
    /// A property of a type.
    Property {
        /// Declaring type full name.
        type_name: String,
        /// Property name.
        property: String,
    },
    /// A method or constructor (`.ctor`) of a type.
    Method {
        /// Declaring type full name.
        type_name: String,
        /// Method name.
        method: String,
        /// Canonical parameter type names, in order.
        parameter_types: Vec<String>,
    },
}

impl CodeMemberKey {
    /// Key for a type.
    pub fn type_key(type_name: impl Into<String>) -> Self {
        Self::Type {
            type_name: type_name.into(),
        }
    }

    /// Key for a property.
    pub fn property_key(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::Property {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Key for a method.
    pub fn method_key(
        type_name: impl Into<String>,
        method: impl Into<String>,
        parameter_types: Vec<String>,
    ) -> Self {
        Self::Method {
            type_name: type_name.into(),
            method: method.into(),
            parameter_types,
        }
    }

    /// The type the key refers to or is declared in.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Type { type_name }
            | Self::Property { type_name, .. }
            | Self::Method { type_name, .. } => type_name,
        }
    }
}

impl fmt::Display for CodeMemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { type_name } => f.write_str(type_name),
            Self::Property {
                type_name,
                property,
            } => write!(f, "{type_name}.{property}"),
            Self::Method {
                type_name,
                method,
                parameter_types,
            } => write!(f, "{type_name}.{method}({})", parameter_types.join(", ")),
        }
    }
}

/// Signature string identifying a member within its declaring type.
///
/// Properties are keyed by name; methods and constructors by name plus
/// canonical parameter types (`Ship(String)`, `.ctor()`). Symbol files use
/// the same strings.
pub fn member_signature(member: &MemberRef<'_>) -> String {
    match member {
        MemberRef::Property(p) => p.name.clone(),
        MemberRef::Method(m) => method_signature(&m.name, &m.parameter_types()),
        MemberRef::Constructor(c) => constructor_signature(c),
    }
}

/// Signature string for a method name and parameter list.
pub fn method_signature(name: &str, parameter_types: &[String]) -> String {
    format!("{name}({})", parameter_types.join(","))
}

fn constructor_signature(ctor: &MethodDesc) -> String {
    method_signature(".ctor", &ctor.parameter_types())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_for_the_same_member_are_equal() {
        let a = CodeMemberKey::method_key("Acme.Order", "Ship", vec!["String".into()]);
        let b = CodeMemberKey::method_key(
            String::from("Acme.Order"),
            String::from("Ship"),
            vec![String::from("String")],
        );
        assert_eq!(a, b);
        assert_ne!(a, CodeMemberKey::method_key("Acme.Order", "Ship", Vec::new()));
        assert_eq!(a.to_string(), "Acme.Order.Ship(String)");
        assert_eq!(a.type_name(), "Acme.Order");
    }

    #[test]
    fn keys_serialize_with_a_member_tag() {
        let key = CodeMemberKey::property_key("Acme.Order", "Total");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(
            json,
            r#"{"member":"property","type_name":"Acme.Order","property":"Total"}"#
        );
    }
}
