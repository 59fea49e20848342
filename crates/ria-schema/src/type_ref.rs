// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type references in their canonical textual form.
//!
//! Catalogs spell types the way server code does (`Int32`, `int`,
//! `Nullable<Color>`, `Color?`, `IEnumerable<Product>`, `Product[]`).
//! [`TypeRef`] parses that text once and renders a single canonical form, so
//! two spellings of the same type compare equal.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simple types every client understands without generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    /// `System.Boolean`.
    Boolean,
    /// `System.Byte`.
    Byte,
    /// `System.SByte`.
    SByte,
    /// `System.Char`.
    Char,
    /// `System.Int16`.
    Int16,
    /// `System.UInt16`.
    UInt16,
    /// `System.Int32`.
    Int32,
    /// `System.UInt32`.
    UInt32,
    /// `System.Int64`.
    Int64,
    /// `System.UInt64`.
    UInt64,
    /// `System.Single`.
    Single,
    /// `System.Double`.
    Double,
    /// `System.Decimal`.
    Decimal,
    /// `System.String`.
    String,
    /// `System.DateTime`.
    DateTime,
    /// `System.DateTimeOffset`.
    DateTimeOffset,
    /// `System.TimeSpan`.
    TimeSpan,
    /// `System.Guid`.
    Guid,
    /// `System.Uri`.
    Uri,
    /// `System.Byte[]`, treated as a scalar.
    Binary,
}

const PRIMITIVES: &[(PrimitiveType, &str, &[&str])] = &[
    (PrimitiveType::Boolean, "Boolean", &["bool"]),
    (PrimitiveType::Byte, "Byte", &["byte"]),
    (PrimitiveType::SByte, "SByte", &["sbyte"]),
    (PrimitiveType::Char, "Char", &["char"]),
    (PrimitiveType::Int16, "Int16", &["short"]),
    (PrimitiveType::UInt16, "UInt16", &["ushort"]),
    (PrimitiveType::Int32, "Int32", &["int"]),
    (PrimitiveType::UInt32, "UInt32", &["uint"]),
    (PrimitiveType::Int64, "Int64", &["long"]),
    (PrimitiveType::UInt64, "UInt64", &["ulong"]),
    (PrimitiveType::Single, "Single", &["float"]),
    (PrimitiveType::Double, "Double", &["double"]),
    (PrimitiveType::Decimal, "Decimal", &["decimal"]),
    (PrimitiveType::String, "String", &["string"]),
    (PrimitiveType::DateTime, "DateTime", &[]),
    (PrimitiveType::DateTimeOffset, "DateTimeOffset", &[]),
    (PrimitiveType::TimeSpan, "TimeSpan", &[]),
    (PrimitiveType::Guid, "Guid", &[]),
    (PrimitiveType::Uri, "Uri", &[]),
    (PrimitiveType::Binary, "Binary", &[]),
];

impl PrimitiveType {
    /// CLR short name (without the `System.` namespace).
    pub fn name(self) -> &'static str {
        PRIMITIVES
            .iter()
            .find(|(p, _, _)| *p == self)
            .map_or("Object", |(_, name, _)| name)
    }

    /// Looks up a primitive by CLR name (`Int32`, `System.Int32`) or C# alias (`int`).
    pub fn from_name(name: &str) -> Option<Self> {
        let short = name.strip_prefix("System.").unwrap_or(name);
        PRIMITIVES
            .iter()
            .find(|(_, clr, aliases)| *clr == short || aliases.contains(&name))
            .map(|(p, _, _)| *p)
    }

    /// Whether values of this type are CLR value types (and so can be wrapped in `Nullable<T>`).
    pub fn is_value_type(self) -> bool {
        !matches!(self, Self::String | Self::Uri | Self::Binary)
    }
}

/// Collection shape used in a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKind {
    /// `IEnumerable<T>`.
    Enumerable,
    /// `IQueryable<T>`.
    Queryable,
    /// `List<T>` / `IList<T>`.
    List,
    /// `T[]`.
    Array,
}

/// A parsed type reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// No value (`void`).
    Void,
    /// A predefined simple type.
    Primitive(PrimitiveType),
    /// A user type, by full or short name; resolved against a registry.
    Named(String),
    /// `Nullable<T>`.
    Nullable(Box<TypeRef>),
    /// A sequence of `element`.
    Collection {
        /// Collection flavour.
        kind: CollectionKind,
        /// Element type.
        element: Box<TypeRef>,
    },
}

impl TypeRef {
    /// Parses a textual type reference.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let trimmed = text.trim();
        parse_inner(trimmed).map_err(|reason| SchemaError::InvalidTypeRef {
            text: text.to_string(),
            reason,
        })
    }

    /// Shorthand for [`TypeRef::Named`].
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps `inner` in `IEnumerable<T>`.
    pub fn enumerable(inner: Self) -> Self {
        Self::Collection {
            kind: CollectionKind::Enumerable,
            element: Box::new(inner),
        }
    }

    /// Wraps `inner` in `Nullable<T>`.
    pub fn nullable(inner: Self) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Returns `true` for `void`.
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Returns `true` for any collection shape.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection { .. })
    }

    /// Strips one `Nullable<>` layer, if present.
    pub fn unwrap_nullable(&self) -> &Self {
        match self {
            Self::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Element type of a collection, or `self` for non-collections.
    pub fn element_type(&self) -> &Self {
        match self {
            Self::Collection { element, .. } => element,
            other => other,
        }
    }

    /// The innermost type after removing collection and nullable wrappers.
    pub fn innermost(&self) -> &Self {
        match self {
            Self::Collection { element, .. } => element.innermost(),
            Self::Nullable(inner) => inner.innermost(),
            other => other,
        }
    }

    /// The user type name if this reference is [`TypeRef::Named`].
    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }
}

fn parse_inner(text: &str) -> Result<TypeRef, &'static str> {
    if text.is_empty() {
        return Err("empty type name");
    }
    if matches!(text, "void" | "Void" | "System.Void") {
        return Ok(TypeRef::Void);
    }
    if let Some(inner) = text.strip_suffix('?') {
        return Ok(TypeRef::Nullable(Box::new(parse_inner(inner.trim())?)));
    }
    if let Some(inner) = text.strip_suffix("[]") {
        let element = parse_inner(inner.trim())?;
        if element == TypeRef::Primitive(PrimitiveType::Byte) {
            return Ok(TypeRef::Primitive(PrimitiveType::Binary));
        }
        return Ok(TypeRef::Collection {
            kind: CollectionKind::Array,
            element: Box::new(element),
        });
    }
    if let Some(open) = text.find('<') {
        let Some(args) = text[open + 1..].strip_suffix('>') else {
            return Err("unbalanced generic brackets");
        };
        let generic = text[..open].trim();
        let generic = generic.rsplit('.').next().unwrap_or(generic);
        let arg = parse_inner(args.trim())?;
        return match generic {
            "Nullable" => Ok(TypeRef::Nullable(Box::new(arg))),
            "IEnumerable" | "ICollection" | "IReadOnlyCollection" => Ok(TypeRef::Collection {
                kind: CollectionKind::Enumerable,
                element: Box::new(arg),
            }),
            "IQueryable" => Ok(TypeRef::Collection {
                kind: CollectionKind::Queryable,
                element: Box::new(arg),
            }),
            "List" | "IList" => Ok(TypeRef::Collection {
                kind: CollectionKind::List,
                element: Box::new(arg),
            }),
            _ => Err("unsupported generic type"),
        };
    }
    if let Some(primitive) = PrimitiveType::from_name(text) {
        return Ok(TypeRef::Primitive(primitive));
    }
    let valid = text
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '+'));
    if !valid || text.starts_with('.') || text.ends_with('.') {
        return Err("invalid identifier");
    }
    Ok(TypeRef::Named(text.to_string()))
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Primitive(PrimitiveType::Binary) => f.write_str("Byte[]"),
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Named(name) => f.write_str(name),
            Self::Nullable(inner) => write!(f, "Nullable<{inner}>"),
            Self::Collection { kind, element } => match kind {
                CollectionKind::Enumerable => write!(f, "IEnumerable<{element}>"),
                CollectionKind::Queryable => write!(f, "IQueryable<{element}>"),
                CollectionKind::List => write!(f, "List<{element}>"),
                CollectionKind::Array => write!(f, "{element}[]"),
            },
        }
    }
}

impl TryFrom<String> for TypeRef {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

impl std::str::FromStr for TypeRef {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spellings_of_the_same_type_normalize() {
        let a = TypeRef::parse("int?").unwrap();
        let b = TypeRef::parse("Nullable<System.Int32>").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Nullable<Int32>");
    }

    #[test]
    fn byte_array_is_binary_scalar() {
        assert_eq!(
            TypeRef::parse("byte[]").unwrap(),
            TypeRef::Primitive(PrimitiveType::Binary)
        );
        assert_eq!(TypeRef::parse("Byte[]").unwrap().to_string(), "Byte[]");
    }

    #[test]
    fn nested_generics_parse() {
        let t = TypeRef::parse("IEnumerable<Nullable<Acme.Color>>").unwrap();
        assert!(t.is_collection());
        assert_eq!(t.innermost(), &TypeRef::named("Acme.Color"));
        assert_eq!(t.element_type().unwrap_nullable(), &TypeRef::named("Acme.Color"));
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(TypeRef::parse("").is_err());
        assert!(TypeRef::parse("List<int").is_err());
        assert!(TypeRef::parse("Dictionary<int>").is_err());
        assert!(TypeRef::parse("Foo Bar").is_err());
    }

    #[test]
    fn serde_uses_canonical_text() {
        let t: TypeRef = serde_json::from_str("\"string[]\"").unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"String[]\"");
    }
}
