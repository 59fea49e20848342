// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The `DomainContext` proxy of one DomainService.
//!
//! The context class carries three constructors, one `EntitySet<T>` property
//! per entity type, one member (or overload pair) per query, invoke and
//! custom operation in operation-name order, and two nested types: the
//! service contract interface and the entity container.

use super::attributes::{propagate, AttributeTarget};
use super::{enums, invoke, names, query, submit, ClientProxySession};
use crate::code_model::{
    Access, AttributeDecl, CodeTypeRef, ConstructorDecl, CtorChain, Expr, Member, MethodDecl,
    ParamDecl, PropertyDecl, Stmt, TypeDecl, TypeDeclKind,
};
use ria_schema::{
    find_attribute, DomainOperation, DomainOperationEntry, DomainServiceDescription, TypeRegistry,
};
use tracing::debug;

/// The context under construction plus what operation generators need.
pub(super) struct ContextBuilder<'s> {
    pub(super) registry: &'s TypeRegistry,
    /// Client namespace of the context.
    pub(super) namespace: String,
    /// Short name of the DomainService.
    pub(super) service_name: String,
    pub(super) file: Option<&'s str>,
    pub(super) class: TypeDecl,
    pub(super) contract: TypeDecl,
}

impl ContextBuilder<'_> {
    pub(super) fn target<'t>(&'t self, member: &'t str) -> AttributeTarget<'t> {
        AttributeTarget {
            registry: self.registry,
            namespace: &self.namespace,
            member,
            file: self.file,
        }
    }

    /// Client parameters for `op`, skipping the first `skip` server
    /// parameters. Logs an error and returns `None` when a parameter type
    /// wraps an enum that cannot be exposed.
    pub(super) fn signature_params(
        &self,
        session: &mut ClientProxySession<'_>,
        op: &DomainOperationEntry,
        skip: usize,
    ) -> Option<Vec<ParamDecl>> {
        let mut params = Vec::new();
        for p in op.parameters.iter().skip(skip) {
            if let Err(enum_name) = enums::check_enum_in(session, self.registry, &p.ty) {
                session.error(
                    &format!(
                        "The operation '{}' has a parameter '{}' of enum type '{enum_name}' which cannot be exposed to the client; the operation will not be generated.",
                        op.name, p.name
                    ),
                    self.file,
                );
                return None;
            }
            let mut decl = ParamDecl::new(p.name.clone(), session.code_type(&p.ty, self.registry, &self.namespace));
            let label = format!("parameter '{}' of operation '{}'", p.name, op.name);
            decl.attributes = propagate(session, &p.attributes, self.target(&label));
            params.push(decl);
        }
        Some(params)
    }

    /// Whether the context already has a member that a new `name` member would clash with.
    pub(super) fn is_taken(&self, name: &str) -> bool {
        self.class.has_non_method_member(name) || self.class.methods_named(name).next().is_some()
    }

    /// Adds the `Begin<name>`/`End<name>` pair to the contract interface.
    pub(super) fn add_contract_operation(
        &mut self,
        session: &ClientProxySession<'_>,
        name: &str,
        params: &[ParamDecl],
        result: CodeTypeRef,
        has_side_effects: bool,
    ) {
        let action = names::operation_action(&self.service_name, name);
        let mut begin_params: Vec<ParamDecl> = params
            .iter()
            .map(|p| ParamDecl::new(p.name.clone(), p.ty.clone()))
            .collect();
        begin_params.push(ParamDecl::new("callback", CodeTypeRef::named("AsyncCallback")));
        begin_params.push(ParamDecl::new("asyncState", CodeTypeRef::Object));

        let mut begin = MethodDecl::new(format!("Begin{name}"), CodeTypeRef::named("IAsyncResult"), begin_params, Vec::new());
        begin.body = None;
        begin.doc = vec![format!("Asynchronously invokes the '{name}' operation.")];
        begin.attributes = vec![
            AttributeDecl::new(session.attribute_name("System.ServiceModel", "FaultContract"))
                .arg(Expr::TypeOf(CodeTypeRef::named("DomainServiceFault")))
                .named("Action", Expr::str(format!("{action}DomainServiceFault")))
                .named("Name", Expr::str("DomainServiceFault"))
                .named("Namespace", Expr::str("DomainServices")),
            AttributeDecl::new(session.attribute_name("OpenRiaServices.Client", "HasSideEffects"))
                .arg(Expr::Bool(has_side_effects)),
            AttributeDecl::new(session.attribute_name("System.ServiceModel", "OperationContract"))
                .named("AsyncPattern", Expr::Bool(true))
                .named("Action", Expr::str(action.clone()))
                .named("ReplyAction", Expr::str(format!("{action}Response"))),
        ];

        let mut end = MethodDecl::new(
            format!("End{name}"),
            result,
            vec![ParamDecl::new("result", CodeTypeRef::named("IAsyncResult"))],
            Vec::new(),
        );
        end.body = None;
        end.doc = vec![format!("Completes the asynchronous operation begun by 'Begin{name}'.")];

        self.contract.members.push(Member::Method(begin));
        self.contract.members.push(Member::Method(end));
    }
}

/// Statements building the `parameters` dictionary passed to the runtime,
/// and the expression to pass (`null` when there are no parameters).
pub(super) fn parameter_dictionary(params: &[ParamDecl]) -> (Vec<Stmt>, Expr) {
    if params.is_empty() {
        return (Vec::new(), Expr::Null);
    }
    let dictionary = CodeTypeRef::generic("Dictionary", vec![CodeTypeRef::string(), CodeTypeRef::Object]);
    let mut stmts = vec![Stmt::VarDecl {
        ty: dictionary.clone(),
        name: "parameters".into(),
        init: Some(Expr::New {
            ty: dictionary,
            args: Vec::new(),
        }),
    }];
    stmts.extend(params.iter().map(|p| {
        Stmt::Expr(Expr::Var("parameters".into()).call(
            "Add",
            vec![Expr::str(p.name.clone()), Expr::Var(p.name.clone())],
        ))
    }));
    (stmts, Expr::Var("parameters".into()))
}

/// `this.ValidateMethod("<method>", parameters);`
pub(super) fn validate_method(method: &str, parameters: Expr) -> Stmt {
    Stmt::Expr(Expr::This.call("ValidateMethod", vec![Expr::str(method), parameters]))
}

pub(super) fn generate_domain_context(session: &mut ClientProxySession<'_>, description: &DomainServiceDescription) {
    let service = description.service_type();
    let context_name = names::context_name(&service.name);
    let file = service.source_file.as_deref();
    if session.is_declared(&service.namespace, &context_name) {
        session.error(
            &format!(
                "The DomainContext '{context_name}' for '{}' cannot be generated because a type with the same name already exists in the client namespace.",
                service.full_name()
            ),
            file,
        );
        return;
    }

    let contract_name = names::contract_name(&service.name);
    let mut class = TypeDecl::class(context_name.clone());
    class.is_sealed = true;
    class.is_partial = true;
    class.base_types.push(CodeTypeRef::named("DomainContext"));
    class.doc = vec![format!("The DomainContext corresponding to the '{}' DomainService.", service.name)];

    let mut contract = TypeDecl::class(contract_name.clone());
    contract.kind = TypeDeclKind::Interface;
    contract.doc = vec![format!("Service contract for the '{}' DomainService.", service.name)];

    let mut builder = ContextBuilder {
        registry: description.registry(),
        namespace: session.client_namespace(&service.namespace),
        service_name: service.name.clone(),
        file,
        class,
        contract,
    };
    contract_attribute(session, &mut builder);
    let label = format!("DomainService '{}'", service.full_name());
    builder.class.attributes = propagate(session, &service.attributes, builder.target(&label));

    let secure = find_attribute(&service.attributes, "RequiresSecureEndpoint").is_some();
    let contract_ref = CodeTypeRef::named(format!("{context_name}.{contract_name}"));
    builder.class.members.push(Member::Method(MethodDecl::partial("OnCreated", Vec::new())));
    builder.class.members.extend(constructors(&context_name, &service.full_name(), contract_ref, secure));

    for entity in description.entity_types() {
        let ty = session.named_type(entity, &builder.namespace);
        builder.class.members.push(Member::Property(PropertyDecl {
            name: names::pluralize(&entity.name),
            ty: CodeTypeRef::generic("EntitySet", vec![ty.clone()]),
            access: Access::Public,
            attributes: Vec::new(),
            getter: Some(vec![Stmt::Return(Some(
                Expr::Base.member("EntityContainer").call_generic("GetEntitySet", vec![ty], Vec::new()),
            ))]),
            setter: None,
            doc: vec![format!(
                "Gets the set of '{}' entity instances that have been loaded into this DomainContext instance.",
                entity.name
            )],
        }));
    }

    for op in description.domain_operation_entries() {
        match op.operation {
            DomainOperation::Query => query::generate_query_method(session, &mut builder, op),
            DomainOperation::Invoke => invoke::generate_invoke_operation(session, &mut builder, op),
            DomainOperation::Custom => submit::generate_custom_method(session, &mut builder, op),
            DomainOperation::Insert | DomainOperation::Update | DomainOperation::Delete => {}
        }
    }
    submit::add_submit_contract(session, &mut builder, description);

    let container_name = format!("{context_name}EntityContainer");
    let mut create_container = MethodDecl::new(
        "CreateEntityContainer",
        CodeTypeRef::named("EntityContainer"),
        Vec::new(),
        vec![Stmt::Return(Some(Expr::New {
            ty: CodeTypeRef::named(container_name.clone()),
            args: Vec::new(),
        }))],
    );
    create_container.access = Access::Protected;
    create_container.is_override = true;
    create_container.doc = vec!["Creates a new EntityContainer for this DomainContext's EntitySets.".into()];
    builder.class.members.push(Member::Method(create_container));

    let container = submit::entity_container(session, &builder, description, container_name);
    let ContextBuilder { mut class, contract, .. } = builder;
    class.nested_types.push(contract);
    class.nested_types.push(container);

    debug!(context = %context_name, members = class.members.len(), "domain context generated");
    session.add_type(&service.namespace, class);
}

fn contract_attribute(session: &ClientProxySession<'_>, builder: &mut ContextBuilder<'_>) {
    builder.contract.attributes.push(
        AttributeDecl::new(session.attribute_name("System.ServiceModel", "ServiceContract"))
            .named("Name", Expr::str(builder.service_name.clone())),
    );
}

fn constructors(context_name: &str, service_full_name: &str, contract: CodeTypeRef, secure: bool) -> Vec<Member> {
    let uri = CodeTypeRef::named("Uri");
    let relative = Expr::New {
        ty: uri.clone(),
        args: vec![
            Expr::str(names::service_uri(service_full_name)),
            Expr::TypeMember(CodeTypeRef::named("UriKind"), "Relative".into()),
        ],
    };
    let create_client = Expr::Var("DomainContext".into()).call(
        "CreateDomainClient",
        vec![Expr::TypeOf(contract), Expr::Var("serviceUri".into()), Expr::Bool(secure)],
    );
    vec![
        Member::Constructor(ConstructorDecl {
            access: Access::Public,
            params: Vec::new(),
            chain: Some(CtorChain::This(vec![relative])),
            body: Vec::new(),
            doc: vec![format!("Initializes a new instance of the {context_name} class.")],
        }),
        Member::Constructor(ConstructorDecl {
            access: Access::Public,
            params: vec![ParamDecl::new("serviceUri", uri)],
            chain: Some(CtorChain::This(vec![create_client])),
            body: Vec::new(),
            doc: vec![format!(
                "Initializes a new instance of the {context_name} class with the specified service URI."
            )],
        }),
        Member::Constructor(ConstructorDecl {
            access: Access::Public,
            params: vec![ParamDecl::new("domainClient", CodeTypeRef::named("DomainClient"))],
            chain: Some(CtorChain::Base(vec![Expr::Var("domainClient".into())])),
            body: vec![Stmt::Expr(Expr::This.call("OnCreated", Vec::new()))],
            doc: vec![format!(
                "Initializes a new instance of the {context_name} class with the specified DomainClient."
            )],
        }),
    ]
}

