// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Invoke operation methods.
//!
//! Every invoke operation yields two overloads on the context, the first
//! taking a completion callback and user state, the second only the
//! operation parameters. Both are generated or neither is.

use super::attributes::propagate;
use super::context::{parameter_dictionary, validate_method, ContextBuilder};
use super::{enums, ClientProxySession};
use crate::code_model::{CodeTypeRef, Expr, Member, MethodDecl, ParamDecl, Stmt};
use ria_schema::DomainOperationEntry;
use tracing::debug;

pub(super) fn generate_invoke_operation(
    session: &mut ClientProxySession<'_>,
    builder: &mut ContextBuilder<'_>,
    op: &DomainOperationEntry,
) {
    let name = op.name.as_str();
    if builder.class.has_non_method_member(name) {
        session.error(
            &format!(
                "The invoke operation '{name}' cannot be generated because the DomainContext already has a non-method member with the same name."
            ),
            builder.file,
        );
        return;
    }
    if let Err(enum_name) = enums::check_enum_in(session, builder.registry, &op.return_type) {
        session.error(
            &format!(
                "The invoke operation '{name}' returns the enum type '{enum_name}' which cannot be exposed to the client; the operation will not be generated."
            ),
            builder.file,
        );
        return;
    }
    let Some(params) = builder.signature_params(session, op, 0) else {
        return;
    };

    let returns = session.code_type(&op.return_type, builder.registry, &builder.namespace);
    let operation_ty = if returns.is_void() {
        CodeTypeRef::named("InvokeOperation")
    } else {
        CodeTypeRef::generic("InvokeOperation", vec![returns.clone()])
    };
    let label = format!("invoke operation '{name}'");
    let attributes = propagate(session, &op.attributes, builder.target(&label));

    for with_callback in [true, false] {
        let mut overload_params = params.clone();
        let (callback, user_state) = if with_callback {
            overload_params.push(ParamDecl::new(
                "callback",
                CodeTypeRef::generic("Action", vec![operation_ty.clone()]),
            ));
            overload_params.push(ParamDecl::new("userState", CodeTypeRef::Object));
            (Expr::Var("callback".into()), Expr::Var("userState".into()))
        } else {
            (Expr::Null, Expr::Null)
        };

        let (mut body, parameters) = parameter_dictionary(&params);
        body.push(validate_method(name, parameters.clone()));
        let call = Expr::This.call(
            "InvokeOperation",
            vec![
                Expr::str(name),
                Expr::TypeOf(returns.clone()),
                parameters,
                Expr::Bool(op.has_side_effects()),
                callback,
                user_state,
            ],
        );
        let result = if returns.is_void() {
            call
        } else {
            Expr::Cast {
                ty: operation_ty.clone(),
                expr: Box::new(call),
            }
        };
        body.push(Stmt::Return(Some(result)));

        let mut method = MethodDecl::new(name, operation_ty.clone(), overload_params, body);
        method.attributes = attributes.clone();
        method.doc = if with_callback {
            vec![
                format!("Asynchronously invokes the '{name}' method of the DomainService."),
                "The callback runs when the operation completes.".into(),
            ]
        } else {
            vec![format!("Asynchronously invokes the '{name}' method of the DomainService.")]
        };
        builder.class.members.push(Member::Method(method));
    }
    debug!(operation = name, "invoke overloads generated");

    builder.add_contract_operation(session, name, &params, returns, op.has_side_effects());
}
