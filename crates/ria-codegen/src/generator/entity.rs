// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entity and complex type proxies.

use super::attributes::{propagate, AttributeTarget};
use super::{enums, names, ClientProxySession};
use crate::code_model::{
    Access, AttributeDecl, BinaryOp, CodeTypeRef, ConstructorDecl, Expr, FieldDecl, Member,
    MethodDecl, ParamDecl, PropertyDecl, Stmt, TypeDecl,
};
use ria_schema::{
    find_attribute, AttrValue, DomainOperation, DomainOperationEntry, DomainServiceDescription,
    MetaMember, MetaType, PropertyDesc, TypeDesc, TypeKind, TypeRef, TypeRegistry,
};
use std::sync::Arc;
use tracing::debug;

/// Members of a proxy class collected per section, emitted in section order.
#[derive(Default)]
struct ProxyMembers {
    fields: Vec<Member>,
    partials: Vec<Member>,
    properties: Vec<Member>,
    methods: Vec<Member>,
}

impl ProxyMembers {
    fn uses_name(&self, name: &str) -> bool {
        self.properties
            .iter()
            .chain(self.methods.iter())
            .any(|m| m.name() == name)
    }

    fn into_members(self, constructor: ConstructorDecl) -> Vec<Member> {
        let mut members = self.fields;
        members.push(Member::Method(MethodDecl::partial("OnCreated", Vec::new())));
        members.extend(self.partials);
        members.push(Member::Constructor(constructor));
        members.extend(self.properties);
        members.extend(self.methods);
        members
    }
}

/// Per-type generation inputs.
struct ProxyScope<'s> {
    desc: &'s TypeDesc,
    full_name: String,
    registry: &'s TypeRegistry,
    namespace: String,
}

impl ProxyScope<'_> {
    fn target<'t>(&'t self, member: &'t str) -> AttributeTarget<'t> {
        AttributeTarget {
            registry: self.registry,
            namespace: &self.namespace,
            member,
            file: self.desc.source_file.as_deref(),
        }
    }
}

/// Generates the proxy for entity `desc` unless it is shared or already generated.
pub(super) fn generate_entity(
    session: &mut ClientProxySession<'_>,
    description: &DomainServiceDescription,
    desc: &Arc<TypeDesc>,
) {
    if !should_generate(session, desc, "entity") {
        return;
    }
    let registry = description.registry();
    let Some(meta) = MetaType::get(registry, &desc.full_name()) else {
        return;
    };
    let scope = ProxyScope {
        desc,
        full_name: desc.full_name(),
        registry,
        namespace: session.client_namespace(&desc.namespace),
    };

    let mut decl = TypeDecl::class(desc.name.clone());
    decl.is_sealed = true;
    decl.is_partial = true;
    decl.base_types.push(CodeTypeRef::named("Entity"));
    decl.doc = vec![format!("The '{}' entity class.", desc.name)];
    decl.attributes = type_attributes(session, &scope);

    let mut members = ProxyMembers::default();
    for member in meta.members() {
        let Some(prop) = desc.property(&member.name) else {
            continue;
        };
        if session
            .host()
            .property_share_kind(&scope.full_name, &member.name)
            .is_shared()
        {
            debug!(property = %member.name, entity = %scope.full_name, "shared property not generated");
            continue;
        }
        if member.is_association {
            association_member(session, &scope, member, prop, &mut members);
        } else {
            data_member(session, &scope, member, prop, &mut members);
        }
    }

    for op in description.operations_for_entity(&scope.full_name, DomainOperation::Custom) {
        entity_action(session, &scope, op, &mut members);
    }
    if let Some(identity) = identity_method(session, &scope, &meta) {
        members.methods.push(Member::Method(identity));
    }

    decl.members = members.into_members(default_constructor(&desc.name));
    session.add_type(&desc.namespace, decl);
}

/// Generates the proxy for complex type `desc` unless it is shared or already generated.
pub(super) fn generate_complex_type(
    session: &mut ClientProxySession<'_>,
    description: &DomainServiceDescription,
    desc: &Arc<TypeDesc>,
) {
    if !should_generate(session, desc, "complex") {
        return;
    }
    let registry = description.registry();
    let Some(meta) = MetaType::get(registry, &desc.full_name()) else {
        return;
    };
    let scope = ProxyScope {
        desc,
        full_name: desc.full_name(),
        registry,
        namespace: session.client_namespace(&desc.namespace),
    };

    let mut decl = TypeDecl::class(desc.name.clone());
    decl.is_partial = true;
    decl.base_types.push(CodeTypeRef::named("ComplexObject"));
    decl.doc = vec![format!("The '{}' class.", desc.name)];
    decl.attributes = type_attributes(session, &scope);

    let mut members = ProxyMembers::default();
    for member in meta.data_members() {
        let Some(prop) = desc.property(&member.name) else {
            continue;
        };
        if !session
            .host()
            .property_share_kind(&scope.full_name, &member.name)
            .is_shared()
        {
            data_member(session, &scope, member, prop, &mut members);
        }
    }
    decl.members = members.into_members(default_constructor(&desc.name));
    session.add_type(&desc.namespace, decl);
}

fn should_generate(session: &mut ClientProxySession<'_>, desc: &TypeDesc, label: &str) -> bool {
    let full_name = desc.full_name();
    if !session.claim_type(&full_name) {
        return false;
    }
    if session.host().type_share_kind(&full_name).is_shared() {
        debug!(type_name = %full_name, "shared type not generated");
        return false;
    }
    if !desc.is_public() {
        session.error(
            &format!("The {label} type '{full_name}' is not public and cannot be generated."),
            desc.source_file.as_deref(),
        );
        return false;
    }
    if session.is_declared(&desc.namespace, &desc.name) {
        session.error(
            &format!(
                "The {label} type '{full_name}' cannot be generated because a type with the same name already exists in the client namespace."
            ),
            desc.source_file.as_deref(),
        );
        return false;
    }
    true
}

fn type_attributes(session: &mut ClientProxySession<'_>, scope: &ProxyScope<'_>) -> Vec<AttributeDecl> {
    let contract_ns = find_attribute(&scope.desc.attributes, "DataContract")
        .and_then(|a| match a.named.get("Namespace") {
            Some(AttrValue::String(ns)) => Some(ns.clone()),
            _ => None,
        })
        .unwrap_or_else(|| names::data_contract_namespace(&scope.desc.namespace));
    let mut attrs = vec![AttributeDecl::new(
        session.attribute_name("System.Runtime.Serialization", "DataContract"),
    )
    .named("Namespace", Expr::Str(contract_ns))];
    let label = format!("type '{}'", scope.full_name);
    attrs.extend(propagate(session, &scope.desc.attributes, scope.target(&label)));
    attrs
}

fn default_constructor(type_name: &str) -> ConstructorDecl {
    ConstructorDecl {
        access: Access::Public,
        params: Vec::new(),
        chain: None,
        body: vec![Stmt::Expr(Expr::This.call("OnCreated", Vec::new()))],
        doc: vec![format!("Initializes a new instance of the {type_name} class.")],
    }
}

fn this_call(method: impl Into<String>, args: Vec<Expr>) -> Stmt {
    Stmt::Expr(Expr::This.call(method, args))
}

fn value() -> Expr {
    Expr::Var("value".into())
}

/// Whether a property of type `ty` can be expressed on the client. Logs and
/// returns `false` when it cannot.
fn check_property_type(
    session: &mut ClientProxySession<'_>,
    scope: &ProxyScope<'_>,
    prop: &PropertyDesc,
) -> bool {
    if let Err(enum_name) = enums::check_enum_in(session, scope.registry, &prop.ty) {
        session.error(
            &format!(
                "The property '{}.{}' uses the enum type '{enum_name}' which cannot be exposed to the client; the property will not be generated.",
                scope.full_name, prop.name
            ),
            prop.source_file.as_deref().or(scope.desc.source_file.as_deref()),
        );
        return false;
    }
    let supported = match prop.ty.innermost() {
        TypeRef::Named(name) => match scope.registry.get(name) {
            Some(t) => {
                matches!(t.kind, TypeKind::Enum | TypeKind::Complex)
                    || session.host().type_share_kind(&t.full_name()).is_shared()
            }
            None => name.starts_with("System.") || name.starts_with("Microsoft."),
        },
        _ => true,
    };
    if !supported {
        session.warning(
            &format!(
                "The property '{}.{}' has a type that is not supported on the client and will not be generated.",
                scope.full_name, prop.name
            ),
            prop.source_file.as_deref().or(scope.desc.source_file.as_deref()),
        );
    }
    supported
}

fn data_member(
    session: &mut ClientProxySession<'_>,
    scope: &ProxyScope<'_>,
    member: &MetaMember,
    prop: &PropertyDesc,
    out: &mut ProxyMembers,
) {
    if !check_property_type(session, scope, prop) {
        return;
    }
    let ty = session.code_type(&prop.ty, scope.registry, &scope.namespace);
    let field = names::field_name(&prop.name);
    let changing = format!("On{}Changing", prop.name);
    let changed = format!("On{}Changed", prop.name);

    out.fields.push(Member::Field(FieldDecl {
        name: field.clone(),
        ty: ty.clone(),
        access: Access::Private,
        is_static: false,
    }));
    out.partials.push(Member::Method(MethodDecl::partial(
        changing.clone(),
        vec![ParamDecl::new("value", ty.clone())],
    )));
    out.partials.push(Member::Method(MethodDecl::partial(changed.clone(), Vec::new())));

    let mut attributes = vec![AttributeDecl::new(
        session.attribute_name("System.Runtime.Serialization", "DataMember"),
    )];
    if !prop.has_attribute("Editable") && (member.is_key || !prop.can_write) {
        let mut editable = AttributeDecl::new(
            session.attribute_name(ria_schema::SYSTEM_ANNOTATIONS_NAMESPACE, "Editable"),
        )
        .arg(Expr::Bool(false));
        if member.is_key {
            editable = editable.named("AllowInitialValue", Expr::Bool(true));
        }
        attributes.push(editable);
    }
    if member.is_roundtrip {
        attributes.push(AttributeDecl::new(session.attribute_name("OpenRiaServices", "RoundtripOriginal")));
    }
    let label = format!("property '{}.{}'", scope.full_name, prop.name);
    attributes.extend(propagate(session, &prop.attributes, scope.target(&label)));

    let name_lit = Expr::str(prop.name.clone());
    let setter = vec![Stmt::If {
        cond: Expr::binary(Expr::this_member(field.clone()), BinaryOp::NotEqual, value()),
        then: vec![
            this_call(changing, vec![value()]),
            this_call("RaiseDataMemberChanging", vec![name_lit.clone()]),
            this_call("ValidateProperty", vec![name_lit.clone(), value()]),
            Stmt::Assign {
                target: Expr::this_member(field.clone()),
                value: value(),
            },
            this_call("RaiseDataMemberChanged", vec![name_lit]),
            this_call(changed, Vec::new()),
        ],
        otherwise: Vec::new(),
    }];

    out.properties.push(Member::Property(PropertyDecl {
        name: prop.name.clone(),
        ty,
        access: Access::Public,
        attributes,
        getter: Some(vec![Stmt::Return(Some(Expr::this_member(field)))]),
        setter: Some(setter),
        doc: vec![format!("Gets or sets the '{}' value.", prop.name)],
    }));
}

fn split_keys(attr: &ria_schema::AttributeDesc, index: usize, named: &str) -> Vec<String> {
    let text = attr.string_arg(index).or_else(|| match attr.named.get(named) {
        Some(AttrValue::String(s)) => Some(s.as_str()),
        _ => None,
    });
    text.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn association_member(
    session: &mut ClientProxySession<'_>,
    scope: &ProxyScope<'_>,
    member: &MetaMember,
    prop: &PropertyDesc,
    out: &mut ProxyMembers,
) {
    let file = prop.source_file.as_deref().or(scope.desc.source_file.as_deref());
    let target = scope
        .registry
        .resolve(prop.ty.element_type())
        .filter(|t| t.kind == TypeKind::Entity)
        .cloned();
    let Some(target) = target else {
        session.warning(
            &format!(
                "The association '{}.{}' does not refer to an entity type and will not be generated.",
                scope.full_name, prop.name
            ),
            file,
        );
        return;
    };
    let Some(assoc) = find_attribute(&prop.attributes, "Association") else {
        return;
    };
    let this_keys = split_keys(assoc, 1, "ThisKey");
    let other_keys = split_keys(assoc, 2, "OtherKey");
    if this_keys.is_empty() || this_keys.len() != other_keys.len() {
        session.error(
            &format!(
                "The association '{}.{}' must declare matching ThisKey and OtherKey members.",
                scope.full_name, prop.name
            ),
            file,
        );
        return;
    }

    let target_ty = session.named_type(&target, &scope.namespace);
    let field = names::field_name(&prop.name);
    let filter = format!("Filter{}", prop.name);
    let wrapper = if member.is_collection { "EntityCollection" } else { "EntityRef" };
    let field_ty = CodeTypeRef::generic(wrapper, vec![target_ty.clone()]);

    out.fields.push(Member::Field(FieldDecl {
        name: field.clone(),
        ty: field_ty.clone(),
        access: Access::Private,
        is_static: false,
    }));

    let mut attributes = Vec::new();
    if member.is_composition {
        attributes.push(AttributeDecl::new(session.attribute_name("OpenRiaServices", "Composition")));
    }
    if member.is_external_reference {
        attributes.push(AttributeDecl::new(session.attribute_name("OpenRiaServices", "ExternalReference")));
    }
    let label = format!("property '{}.{}'", scope.full_name, prop.name);
    attributes.extend(propagate(session, &prop.attributes, scope.target(&label)));

    let lazy_init = Stmt::If {
        cond: Expr::binary(Expr::this_member(field.clone()), BinaryOp::IdentityEqual, Expr::Null),
        then: vec![Stmt::Assign {
            target: Expr::this_member(field.clone()),
            value: Expr::New {
                ty: field_ty.clone(),
                args: vec![
                    Expr::This,
                    Expr::str(prop.name.clone()),
                    Expr::MethodRef(Box::new(Expr::This), filter.clone()),
                ],
            },
        }],
        otherwise: Vec::new(),
    };

    let (getter, setter, ty) = if member.is_collection {
        (
            vec![lazy_init, Stmt::Return(Some(Expr::this_member(field)))],
            None,
            field_ty,
        )
    } else {
        let mut on_change = vec![this_call(
            "ValidateProperty",
            vec![Expr::str(prop.name.clone()), value()],
        )];
        if assoc.named_bool("IsForeignKey") == Some(true) {
            let assignments = this_keys
                .iter()
                .zip(&other_keys)
                .map(|(this_key, other_key)| Stmt::Assign {
                    target: Expr::this_member(this_key.clone()),
                    value: value().member(other_key.clone()),
                })
                .collect();
            on_change.push(Stmt::If {
                cond: Expr::binary(value(), BinaryOp::IdentityNotEqual, Expr::Null),
                then: assignments,
                otherwise: Vec::new(),
            });
        }
        on_change.push(Stmt::Assign {
            target: Expr::this_member(field.clone()).member("Entity"),
            value: value(),
        });
        on_change.push(this_call("RaisePropertyChanged", vec![Expr::str(prop.name.clone())]));
        let setter = vec![
            Stmt::VarDecl {
                ty: target_ty.clone(),
                name: "previous".into(),
                init: Some(Expr::this_member(prop.name.clone())),
            },
            Stmt::If {
                cond: Expr::binary(Expr::Var("previous".into()), BinaryOp::IdentityNotEqual, value()),
                then: on_change,
                otherwise: Vec::new(),
            },
        ];
        (
            vec![lazy_init, Stmt::Return(Some(Expr::this_member(field).member("Entity")))],
            Some(setter),
            target_ty.clone(),
        )
    };

    out.properties.push(Member::Property(PropertyDecl {
        name: prop.name.clone(),
        ty,
        access: Access::Public,
        attributes,
        getter: Some(getter),
        setter,
        doc: vec![format!(
            "Gets or sets the associated '{}' {}.",
            target.name,
            if member.is_collection { "entities" } else { "entity" }
        )],
    }));

    let condition = this_keys
        .iter()
        .zip(&other_keys)
        .map(|(this_key, other_key)| {
            Expr::binary(
                Expr::Var("entity".into()).member(other_key.clone()),
                BinaryOp::Equal,
                Expr::this_member(this_key.clone()),
            )
        })
        .reduce(|acc, next| Expr::binary(acc, BinaryOp::And, next))
        .unwrap_or(Expr::Bool(true));
    let mut filter_method = MethodDecl::new(
        filter,
        CodeTypeRef::bool(),
        vec![ParamDecl::new("entity", target_ty)],
        vec![Stmt::Return(Some(condition))],
    );
    filter_method.access = Access::Private;
    out.methods.push(Member::Method(filter_method));
}

fn entity_action(
    session: &mut ClientProxySession<'_>,
    scope: &ProxyScope<'_>,
    op: &DomainOperationEntry,
    out: &mut ProxyMembers,
) {
    let name = &op.name;
    let can_name = format!("Can{name}");
    let invoked_name = format!("Is{name}Invoked");
    let file = scope.desc.source_file.as_deref();
    if [name.as_str(), can_name.as_str(), invoked_name.as_str()]
        .iter()
        .any(|n| out.uses_name(n) || scope.desc.property(n).is_some())
    {
        session.error(
            &format!(
                "The custom method '{name}' conflicts with an existing member of entity '{}' and will not be generated.",
                scope.full_name
            ),
            file,
        );
        return;
    }

    let mut params = Vec::new();
    for p in op.parameters.iter().skip(1) {
        if let Err(enum_name) = enums::check_enum_in(session, scope.registry, &p.ty) {
            session.error(
                &format!(
                    "The custom method '{name}' has a parameter '{}' of enum type '{enum_name}' which cannot be exposed to the client; the method will not be generated.",
                    p.name
                ),
                file,
            );
            return;
        }
        params.push(ParamDecl::new(p.name.clone(), session.code_type(&p.ty, scope.registry, &scope.namespace)));
    }
    let args: Vec<Expr> = params.iter().map(|p| Expr::Var(p.name.clone())).collect();
    let invoking = format!("On{name}Invoking");
    let invoked = format!("On{name}Invoked");

    let mut invoke_args = vec![Expr::str(name.clone())];
    invoke_args.extend(args.iter().cloned());
    let mut method = MethodDecl::new(
        name.clone(),
        CodeTypeRef::Void,
        params.clone(),
        vec![
            this_call(invoking.clone(), args),
            Stmt::Expr(Expr::Base.call("InvokeAction", invoke_args)),
            this_call(invoked.clone(), Vec::new()),
        ],
    );
    method.doc = vec![format!("Invokes the '{name}' action on this entity.")];
    method.attributes.push(
        AttributeDecl::new(session.attribute_name("OpenRiaServices.Client", "EntityAction"))
            .arg(Expr::str(name.clone()))
            .named("CanInvokePropertyName", Expr::str(can_name.clone()))
            .named("IsInvokedPropertyName", Expr::str(invoked_name.clone())),
    );
    out.methods.push(Member::Method(method));

    out.partials.push(Member::Method(MethodDecl::partial(invoking, params)));
    out.partials.push(Member::Method(MethodDecl::partial(invoked, Vec::new())));

    let hidden = AttributeDecl::new(session.attribute_name(ria_schema::SYSTEM_ANNOTATIONS_NAMESPACE, "Display"))
        .named("AutoGenerateField", Expr::Bool(false));
    for (prop_name, base_method, doc) in [
        (invoked_name, "IsActionInvoked", format!("Gets a value indicating whether the '{name}' action has been invoked.")),
        (can_name, "CanInvokeAction", format!("Gets a value indicating whether the '{name}' action can be invoked.")),
    ] {
        out.properties.push(Member::Property(PropertyDecl {
            name: prop_name,
            ty: CodeTypeRef::bool(),
            access: Access::Public,
            attributes: vec![hidden.clone()],
            getter: Some(vec![Stmt::Return(Some(
                Expr::Base.call(base_method, vec![Expr::str(name.clone())]),
            ))]),
            setter: None,
            doc: vec![doc],
        }));
    }
}

fn may_be_null(registry: &TypeRegistry, ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Nullable(_) | TypeRef::Collection { .. } => true,
        TypeRef::Primitive(p) => !p.is_value_type(),
        TypeRef::Named(_) => !registry.is_enum(ty),
        TypeRef::Void => false,
    }
}

fn identity_method(
    session: &ClientProxySession<'_>,
    scope: &ProxyScope<'_>,
    meta: &MetaType,
) -> Option<MethodDecl> {
    let keys: Vec<&MetaMember> = meta.key_members().collect();
    let body = match keys.as_slice() {
        [] => {
            session.warning(
                &format!("The entity '{}' has no key members; GetIdentity will not be generated.", scope.full_name),
                scope.desc.source_file.as_deref(),
            );
            return None;
        }
        [only] => vec![Stmt::Return(Some(Expr::this_member(only.name.clone())))],
        many => {
            let mut body: Vec<Stmt> = many
                .iter()
                .filter(|k| may_be_null(scope.registry, &k.ty))
                .map(|k| Stmt::If {
                    cond: Expr::binary(Expr::this_member(k.name.clone()), BinaryOp::IdentityEqual, Expr::Null),
                    then: vec![Stmt::Return(Some(Expr::Null))],
                    otherwise: Vec::new(),
                })
                .collect();
            let args = many.iter().map(|k| Expr::this_member(k.name.clone())).collect();
            body.push(Stmt::Return(Some(Expr::Var("EntityKey".into()).call("Create", args))));
            body
        }
    };
    let mut method = MethodDecl::new("GetIdentity", CodeTypeRef::Object, Vec::new(), body);
    method.is_override = true;
    method.doc = vec!["Computes a value from the key fields that uniquely identifies this entity instance.".into()];
    Some(method)
}
