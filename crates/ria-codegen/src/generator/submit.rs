// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Submit-side members: custom method forwarders, the submit contract
//! operation and the nested entity container.

use super::context::ContextBuilder;
use super::ClientProxySession;
use crate::code_model::{
    Access, BinaryOp, CodeTypeRef, ConstructorDecl, Expr, Member, MethodDecl, ParamDecl, Stmt, TypeDecl,
};
use ria_schema::{DomainOperation, DomainOperationEntry, DomainServiceDescription, TypeKind};

/// `public void Ship(Order order, string carrier) { order.Ship(carrier); }`
pub(super) fn generate_custom_method(
    session: &mut ClientProxySession<'_>,
    builder: &mut ContextBuilder<'_>,
    op: &DomainOperationEntry,
) {
    let name = op.name.as_str();
    let entity = op
        .parameters
        .first()
        .and_then(|p| builder.registry.resolve(&p.ty).map(|t| (p, t)))
        .filter(|(_, t)| t.kind == TypeKind::Entity);
    let Some((entity_param, entity_desc)) = entity else {
        session.error(
            &format!("The custom method '{name}' must take an entity as its first parameter."),
            builder.file,
        );
        return;
    };
    if builder.is_taken(name) {
        session.error(
            &format!(
                "The custom method '{name}' cannot be generated because the DomainContext already has a member with the same name."
            ),
            builder.file,
        );
        return;
    }
    let Some(rest) = builder.signature_params(session, op, 1) else {
        return;
    };

    let entity_var = Expr::Var(entity_param.name.clone());
    let args = rest.iter().map(|p| Expr::Var(p.name.clone())).collect();
    let mut params = vec![ParamDecl::new(
        entity_param.name.clone(),
        session.named_type(entity_desc, &builder.namespace),
    )];
    params.extend(rest);

    let mut method = MethodDecl::new(name, CodeTypeRef::Void, params, vec![Stmt::Expr(entity_var.call(name, args))]);
    method.doc = vec![format!(
        "Invokes the '{name}' method of the specified '{}' entity.",
        entity_desc.name
    )];
    builder.class.members.push(Member::Method(method));
}

/// `BeginSubmitChanges`/`EndSubmitChanges`, present when any submit operation exists.
pub(super) fn add_submit_contract(
    session: &ClientProxySession<'_>,
    builder: &mut ContextBuilder<'_>,
    description: &DomainServiceDescription,
) {
    let submits = description
        .domain_operation_entries()
        .iter()
        .any(|op| op.operation.is_submit());
    if !submits {
        return;
    }
    let entries = CodeTypeRef::generic("IEnumerable", vec![CodeTypeRef::named("ChangeSetEntry")]);
    let params = [ParamDecl::new("changeSet", entries.clone())];
    builder.add_contract_operation(session, "SubmitChanges", &params, entries, true);
}

fn set_operations(description: &DomainServiceDescription, entity: &str) -> Expr {
    let supports = |kind| description.supports(entity, kind);
    let add = supports(DomainOperation::Insert);
    let edit = supports(DomainOperation::Update) || supports(DomainOperation::Custom);
    let remove = supports(DomainOperation::Delete);
    let flag = |name: &str| Expr::TypeMember(CodeTypeRef::named("EntitySetOperations"), name.to_string());
    match (add, edit, remove) {
        (false, false, false) => flag("None"),
        (true, true, true) => flag("All"),
        _ => [(add, "Add"), (edit, "Edit"), (remove, "Remove")]
            .into_iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| flag(name))
            .reduce(|acc, next| Expr::binary(acc, BinaryOp::BitwiseOr, next))
            .unwrap_or_else(|| flag("None")),
    }
}

/// `internal sealed class <Context>EntityContainer : EntityContainer`.
pub(super) fn entity_container(
    session: &ClientProxySession<'_>,
    builder: &ContextBuilder<'_>,
    description: &DomainServiceDescription,
    name: String,
) -> TypeDecl {
    let body = description
        .entity_types()
        .iter()
        .map(|entity| {
            Stmt::Expr(Expr::This.call_generic(
                "CreateEntitySet",
                vec![session.named_type(entity, &builder.namespace)],
                vec![set_operations(description, &entity.full_name())],
            ))
        })
        .collect();

    let mut container = TypeDecl::class(name);
    container.access = Access::Internal;
    container.is_sealed = true;
    container.base_types.push(CodeTypeRef::named("EntityContainer"));
    container.members.push(Member::Constructor(ConstructorDecl {
        access: Access::Public,
        params: Vec::new(),
        chain: None,
        body,
        doc: Vec::new(),
    }));
    container
}

