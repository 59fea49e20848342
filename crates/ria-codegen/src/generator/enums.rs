// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Enum exposure decisions and enum generation.

use super::{names, ClientProxySession};
use crate::code_model::{AttributeDecl, CodeTypeRef, EnumMemberDecl, Expr, Member, TypeDecl};
use ria_schema::{find_attribute, AttrValue, PrimitiveType, TypeDesc, TypeRef, TypeRegistry};
use std::sync::Arc;
use tracing::debug;

/// Whether values of enum `desc` may appear in client code.
///
/// Non-public and nested enums cannot. A shared enum can and needs no
/// generation. Any other enum can and is queued for generation at the end of
/// the run.
pub(super) fn can_expose_enum_type(session: &mut ClientProxySession<'_>, desc: &Arc<TypeDesc>) -> bool {
    if !desc.is_public() || desc.is_nested() {
        return false;
    }
    let full_name = desc.full_name();
    if session.handled_types.contains(&full_name) || session.pending_enums.contains_key(&full_name) {
        return true;
    }
    if session.host().type_share_kind(&full_name).is_shared() {
        debug!(enum_type = %full_name, "enum is shared, not generated");
        session.handled_types.insert(full_name);
        return true;
    }
    session.pending_enums.insert(full_name, Arc::clone(desc));
    true
}

/// Gate for a signature type: when `ty` wraps an enum, that enum must be
/// exposable. Types without an enum pass.
pub(super) fn check_enum_in(
    session: &mut ClientProxySession<'_>,
    registry: &TypeRegistry,
    ty: &TypeRef,
) -> Result<(), String> {
    match registry.enum_within(ty) {
        Some(e) if !can_expose_enum_type(session, e) => Err(e.full_name()),
        _ => Ok(()),
    }
}

pub(super) fn generate_enum(session: &mut ClientProxySession<'_>, desc: &TypeDesc) {
    if !session.claim_type(&desc.full_name()) {
        return;
    }
    if session.is_declared(&desc.namespace, &desc.name) {
        session.error(
            &format!(
                "The enum '{}' cannot be generated because a type with the same name already exists in the client namespace.",
                desc.full_name()
            ),
            desc.source_file.as_deref(),
        );
        return;
    }
    let mut decl = TypeDecl::enumeration(desc.name.clone());
    decl.doc = vec![format!("The '{}' enum.", desc.name)];
    let contract_ns = find_attribute(&desc.attributes, "DataContract")
        .and_then(|a| match a.named.get("Namespace") {
            Some(AttrValue::String(ns)) => Some(ns.clone()),
            _ => None,
        })
        .unwrap_or_else(|| names::data_contract_namespace(&desc.namespace));
    decl.attributes.push(
        AttributeDecl::new(session.attribute_name("System.Runtime.Serialization", "DataContract"))
            .named("Namespace", Expr::Str(contract_ns)),
    );
    if desc.has_attribute("Flags") {
        decl.attributes.push(AttributeDecl::new(session.attribute_name("System", "Flags")));
    }
    if let Some(TypeRef::Primitive(p)) = &desc.underlying_type {
        if *p != PrimitiveType::Int32 {
            decl.base_types.push(CodeTypeRef::Primitive(*p));
        }
    }

    let enum_member = session.attribute_name("System.Runtime.Serialization", "EnumMember");
    for member in &desc.enum_members {
        decl.members.push(Member::EnumMember(EnumMemberDecl {
            name: member.name.clone(),
            value: Some(member.value),
            attributes: vec![AttributeDecl::new(enum_member.clone())],
        }));
    }
    debug!(enum_type = %desc.full_name(), members = desc.enum_members.len(), "enum generated");
    session.add_type(&desc.namespace, decl);
}
