// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Propagation of server attributes onto generated members.

use super::{enums, ClientProxySession};
use crate::code_model::{AttributeDecl, CodeTypeRef, Expr};
use ria_schema::{AttrValue, AttributeDesc, PrimitiveType, TypeKind, TypeRef, TypeRegistry};

/// Attributes the generator emits itself, or that have no client meaning.
const HANDLED: &[&str] = &[
    "DataContract",
    "DataMember",
    "EnableClientAccess",
    "EnumMember",
    "Flags",
    "KnownType",
    "OperationContract",
    "RequiresAuthentication",
    "RequiresRole",
    "Serializable",
    "ServiceContract",
];

/// Where propagated attributes land; used in diagnostics.
#[derive(Clone, Copy, Debug)]
pub(super) struct AttributeTarget<'t> {
    pub(super) registry: &'t TypeRegistry,
    /// Client namespace of the declaring generated type.
    pub(super) namespace: &'t str,
    /// Human readable member description, e.g. `method 'CountOrders'`.
    pub(super) member: &'t str,
    /// Source file for diagnostics.
    pub(super) file: Option<&'t str>,
}

/// Converts the propagatable subset of `attributes`. Attributes whose type is
/// not visible to the client are skipped with a warning; attributes whose
/// arguments cannot be expressed are skipped with an error.
pub(super) fn propagate(
    session: &mut ClientProxySession<'_>,
    attributes: &[AttributeDesc],
    target: AttributeTarget<'_>,
) -> Vec<AttributeDecl> {
    let mut out = Vec::new();
    for attr in attributes {
        if attr.is_server_only() || HANDLED.contains(&attr.short_name()) {
            continue;
        }
        if !is_visible_to_client(session, attr) {
            session.warning(
                &format!(
                    "The attribute '{}' on {} is not visible in the client project and will not be generated.",
                    attr.full_type_name(),
                    target.member
                ),
                target.file,
            );
            continue;
        }
        match convert(session, attr, target) {
            Ok(decl) => out.push(decl),
            Err(reason) => session.error(
                &format!(
                    "The attribute '{}' on {} could not be generated: {reason}.",
                    attr.full_type_name(),
                    target.member
                ),
                target.file,
            ),
        }
    }
    out
}

fn is_visible_to_client(session: &ClientProxySession<'_>, attr: &AttributeDesc) -> bool {
    let ns = attr.namespace();
    let framework = ns == "System"
        || ns.starts_with("System.")
        || ns.starts_with("Microsoft.")
        || ns == "OpenRiaServices"
        || ns == "OpenRiaServices.Client";
    framework || session.host().type_share_kind(&attr.full_type_name()).is_shared()
}

fn convert(
    session: &mut ClientProxySession<'_>,
    attr: &AttributeDesc,
    target: AttributeTarget<'_>,
) -> Result<AttributeDecl, String> {
    let mut decl = AttributeDecl::new(session.attribute_name(attr.namespace(), attr.short_name()));
    for value in &attr.args {
        decl = decl.arg(value_expr(session, value, target)?);
    }
    for (name, value) in &attr.named {
        decl = decl.named(name.clone(), value_expr(session, value, target)?);
    }
    Ok(decl)
}

/// Converts one attribute argument.
fn value_expr(
    session: &mut ClientProxySession<'_>,
    value: &AttrValue,
    target: AttributeTarget<'_>,
) -> Result<Expr, String> {
    Ok(match value {
        AttrValue::Null => Expr::Null,
        AttrValue::Bool(b) => Expr::Bool(*b),
        AttrValue::Int(i) => Expr::Int(*i),
        AttrValue::Float(f) if f.is_finite() => Expr::Float(*f),
        AttrValue::Float(f) => return Err(format!("the value {f} has no source representation")),
        AttrValue::String(s) => Expr::Str(s.clone()),
        AttrValue::Type { type_of } => Expr::TypeOf(visible_type(session, type_of, target)?),
        AttrValue::Enum { enum_type, member } => {
            let ty = visible_type(session, &TypeRef::named(enum_type.clone()), target)?;
            Expr::TypeMember(ty, member.clone())
        }
        AttrValue::Array(items) => {
            let element = array_element_type(items);
            let items = items
                .iter()
                .map(|item| value_expr(session, item, target))
                .collect::<Result<Vec<_>, _>>()?;
            Expr::NewArray { element, items }
        }
    })
}

fn visible_type(
    session: &mut ClientProxySession<'_>,
    ty: &TypeRef,
    target: AttributeTarget<'_>,
) -> Result<CodeTypeRef, String> {
    if let TypeRef::Named(name) = ty.innermost() {
        match target.registry.get(name) {
            Some(desc) if desc.kind == TypeKind::Enum => {
                if !enums::can_expose_enum_type(session, desc) {
                    return Err(format!("the enum type '{}' cannot be exposed to the client", desc.full_name()));
                }
            }
            Some(desc) => {
                let generated = matches!(desc.kind, TypeKind::Entity | TypeKind::Complex);
                if !generated && !session.host().type_share_kind(&desc.full_name()).is_shared() {
                    return Err(format!("the type '{}' is not visible in the client project", desc.full_name()));
                }
            }
            None if name.starts_with("System.") || name.starts_with("Microsoft.") => {}
            None => return Err(format!("the type '{name}' could not be resolved")),
        }
    }
    Ok(session.code_type(ty, target.registry, target.namespace))
}

fn array_element_type(items: &[AttrValue]) -> CodeTypeRef {
    match items.first() {
        Some(AttrValue::String(_)) => CodeTypeRef::string(),
        Some(AttrValue::Int(_)) => CodeTypeRef::Primitive(PrimitiveType::Int32),
        Some(AttrValue::Bool(_)) => CodeTypeRef::bool(),
        Some(AttrValue::Float(_)) => CodeTypeRef::Primitive(PrimitiveType::Double),
        Some(AttrValue::Type { .. }) => CodeTypeRef::named("Type"),
        _ => CodeTypeRef::Object,
    }
}
