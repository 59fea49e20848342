// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `<Name>Query` factory methods.

use super::attributes::propagate;
use super::context::{parameter_dictionary, validate_method, ContextBuilder};
use super::ClientProxySession;
use crate::code_model::{CodeTypeRef, Expr, Member, MethodDecl, Stmt};
use ria_schema::DomainOperationEntry;

pub(super) fn generate_query_method(
    session: &mut ClientProxySession<'_>,
    builder: &mut ContextBuilder<'_>,
    op: &DomainOperationEntry,
) {
    let method_name = format!("{}Query", op.name);
    if builder.is_taken(&method_name) {
        session.error(
            &format!(
                "The query '{}' cannot be generated because the DomainContext already has a member named '{method_name}'.",
                op.name
            ),
            builder.file,
        );
        return;
    }
    let Some(entity) = builder.registry.resolve(op.return_type.element_type()) else {
        session.error(
            &format!("The query '{}' does not return a known entity type.", op.name),
            builder.file,
        );
        return;
    };
    let Some(params) = builder.signature_params(session, op, 0) else {
        return;
    };
    let entity_ty = session.named_type(entity, &builder.namespace);

    let (mut body, parameters) = parameter_dictionary(&params);
    body.push(validate_method(&method_name, parameters.clone()));
    body.push(Stmt::Return(Some(Expr::Base.call_generic(
        "CreateQuery",
        vec![entity_ty.clone()],
        vec![
            Expr::str(op.name.clone()),
            parameters,
            Expr::Bool(op.has_side_effects()),
            Expr::Bool(op.is_composable()),
        ],
    ))));

    let mut method = MethodDecl::new(
        method_name.clone(),
        CodeTypeRef::generic("EntityQuery", vec![entity_ty.clone()]),
        params.clone(),
        body,
    );
    method.doc = vec![format!(
        "Gets an EntityQuery instance that can be used to load '{}' entity instances using the '{}' query.",
        entity.name, op.name
    )];
    let label = format!("query '{}'", op.name);
    method.attributes = propagate(session, &op.attributes, builder.target(&label));
    builder.class.members.push(Member::Method(method));

    builder.add_contract_operation(
        session,
        &op.name,
        &params,
        CodeTypeRef::generic("QueryResult", vec![entity_ty]),
        op.has_side_effects(),
    );
}
