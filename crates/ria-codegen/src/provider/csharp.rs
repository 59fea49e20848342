// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! C# rendering.

use super::{xml_escape, CodeDomProvider, GENERATED_BANNER};
use crate::code_model::{
    Access, AttributeDecl, BinaryOp, CodeNamespace, CodeTypeRef, CompileUnit, ConstructorDecl,
    CtorChain, EnumMemberDecl, Expr, FieldDecl, Member, MethodDecl, ParamDecl, ParamDirection,
    PropertyDecl, Stmt, TypeDecl, TypeDeclKind,
};
use crate::code_writer::{src_writeln, SourceWriter};
use ria_schema::PrimitiveType;
use std::fmt;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// C# provider (`C#`, aliases `cs`, `csharp`).
#[derive(Clone, Copy, Debug, Default)]
pub struct CSharpCodeProvider;

impl CodeDomProvider for CSharpCodeProvider {
    fn language(&self) -> &'static str {
        "C#"
    }

    fn file_extension(&self) -> &'static str {
        "cs"
    }

    fn is_case_sensitive(&self) -> bool {
        true
    }

    fn generate_code_from_compile_unit(&self, unit: &CompileUnit) -> Result<String, fmt::Error> {
        let mut w = SourceWriter::new(String::new(), "    ");
        for line in GENERATED_BANNER {
            src_writeln!(w, "//{line}")?;
        }
        for ns in &unit.namespaces {
            w.newline()?;
            namespace(&mut w, ns)?;
        }
        Ok(w.into_inner())
    }
}

type Out = SourceWriter<String>;

fn ident(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("@{name}")
    } else {
        name.to_string()
    }
}

fn namespace(w: &mut Out, ns: &CodeNamespace) -> fmt::Result {
    if ns.name.is_empty() {
        return namespace_body(w, ns);
    }
    src_writeln!(w, "namespace {}", ns.name)?;
    w.writeln("{")?;
    w.indented(|w| namespace_body(w, ns))?;
    w.writeln("}")
}

fn namespace_body(w: &mut Out, ns: &CodeNamespace) -> fmt::Result {
    for import in &ns.imports {
        src_writeln!(w, "using {import};")?;
    }
    for (idx, ty) in ns.types.iter().enumerate() {
        if idx > 0 || !ns.imports.is_empty() {
            w.newline()?;
        }
        type_decl(w, ty)?;
    }
    Ok(())
}

fn access(a: Access) -> &'static str {
    match a {
        Access::Public => "public",
        Access::Internal => "internal",
        Access::Protected => "protected",
        Access::Private => "private",
    }
}

fn doc(w: &mut Out, lines: &[String]) -> fmt::Result {
    if lines.is_empty() {
        return Ok(());
    }
    w.writeln("/// <summary>")?;
    for line in lines {
        src_writeln!(w, "/// {}", xml_escape(line))?;
    }
    w.writeln("/// </summary>")
}

fn attributes(w: &mut Out, attrs: &[AttributeDecl]) -> fmt::Result {
    for attr in attrs {
        src_writeln!(w, "[{}]", attribute(attr))?;
    }
    Ok(())
}

fn attribute(attr: &AttributeDecl) -> String {
    if attr.args.is_empty() {
        return attr.name.clone();
    }
    let args: Vec<String> = attr
        .args
        .iter()
        .map(|a| match &a.name {
            Some(name) => format!("{name}={}", expr(&a.value)),
            None => expr(&a.value),
        })
        .collect();
    format!("{}({})", attr.name, args.join(", "))
}

fn type_decl(w: &mut Out, ty: &TypeDecl) -> fmt::Result {
    doc(w, &ty.doc)?;
    attributes(w, &ty.attributes)?;
    let mut header = String::from(access(ty.access));
    match ty.kind {
        TypeDeclKind::Class => {
            if ty.is_sealed {
                header.push_str(" sealed");
            }
            if ty.is_partial {
                header.push_str(" partial");
            }
            header.push_str(" class ");
        }
        TypeDeclKind::Interface => {
            if ty.is_partial {
                header.push_str(" partial");
            }
            header.push_str(" interface ");
        }
        TypeDeclKind::Enum => header.push_str(" enum "),
    }
    header.push_str(&ident(&ty.name));
    let bases: Vec<String> = ty
        .base_types
        .iter()
        .filter(|b| !(ty.kind == TypeDeclKind::Enum && **b == CodeTypeRef::Primitive(PrimitiveType::Int32)))
        .map(type_ref)
        .collect();
    if !bases.is_empty() {
        header.push_str(" : ");
        header.push_str(&bases.join(", "));
    }
    w.writeln(&header)?;
    w.writeln("{")?;
    w.indented(|w| {
        let mut first = true;
        for member in &ty.members {
            if !first && !matches!(member, Member::EnumMember(_)) {
                w.newline()?;
            }
            first = false;
            match member {
                Member::Field(f) => field(w, f)?,
                Member::Property(p) => property(w, p)?,
                Member::Method(m) => method(w, m, ty.kind == TypeDeclKind::Interface)?,
                Member::Constructor(c) => constructor(w, &ty.name, c)?,
                Member::EnumMember(e) => enum_member(w, e)?,
            }
        }
        for nested in &ty.nested_types {
            if !first {
                w.newline()?;
            }
            first = false;
            type_decl(w, nested)?;
        }
        Ok(())
    })?;
    w.writeln("}")
}

fn field(w: &mut Out, f: &FieldDecl) -> fmt::Result {
    let stat = if f.is_static { " static" } else { "" };
    src_writeln!(w, "{}{stat} {} {};", access(f.access), type_ref(&f.ty), ident(&f.name))
}

fn property(w: &mut Out, p: &PropertyDecl) -> fmt::Result {
    doc(w, &p.doc)?;
    attributes(w, &p.attributes)?;
    src_writeln!(w, "{} {} {}", access(p.access), type_ref(&p.ty), ident(&p.name))?;
    w.writeln("{")?;
    w.indented(|w| {
        if let Some(getter) = &p.getter {
            w.writeln("get")?;
            block(w, getter)?;
        }
        if let Some(setter) = &p.setter {
            w.writeln("set")?;
            block(w, setter)?;
        }
        Ok(())
    })?;
    w.writeln("}")
}

fn params(list: &[ParamDecl]) -> String {
    list.iter()
        .map(|p| {
            let mut out = String::new();
            for attr in &p.attributes {
                out.push('[');
                out.push_str(&attribute(attr));
                out.push_str("] ");
            }
            match p.direction {
                ParamDirection::In => {}
                ParamDirection::Out => out.push_str("out "),
                ParamDirection::Ref => out.push_str("ref "),
            }
            out.push_str(&type_ref(&p.ty));
            out.push(' ');
            out.push_str(&ident(&p.name));
            out
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn method(w: &mut Out, m: &MethodDecl, in_interface: bool) -> fmt::Result {
    doc(w, &m.doc)?;
    attributes(w, &m.attributes)?;
    let signature = format!("{} {}({})", type_ref(&m.return_type), ident(&m.name), params(&m.params));
    match &m.body {
        None if in_interface => src_writeln!(w, "{signature};"),
        None => src_writeln!(w, "partial {signature};"),
        Some(body) => {
            let modifier = if m.is_override { " override" } else { "" };
            src_writeln!(w, "{}{modifier} {signature}", access(m.access))?;
            block(w, body)
        }
    }
}

fn constructor(w: &mut Out, type_name: &str, c: &ConstructorDecl) -> fmt::Result {
    doc(w, &c.doc)?;
    w.write(&format!("{} {}({})", access(c.access), ident(type_name), params(&c.params)))?;
    match &c.chain {
        Some(CtorChain::This(args)) => w.write(&format!(" : this({})", args_list(args)))?,
        Some(CtorChain::Base(args)) => w.write(&format!(" : base({})", args_list(args)))?,
        None => {}
    }
    w.newline()?;
    block(w, &c.body)
}

fn enum_member(w: &mut Out, e: &EnumMemberDecl) -> fmt::Result {
    attributes(w, &e.attributes)?;
    match e.value {
        Some(v) => src_writeln!(w, "{} = {v},", ident(&e.name)),
        None => src_writeln!(w, "{},", ident(&e.name)),
    }
}

fn block(w: &mut Out, stmts: &[Stmt]) -> fmt::Result {
    w.writeln("{")?;
    w.indented(|w| stmts.iter().try_for_each(|s| stmt(w, s)))?;
    w.writeln("}")
}

fn stmt(w: &mut Out, s: &Stmt) -> fmt::Result {
    match s {
        Stmt::Expr(e) => src_writeln!(w, "{};", expr(e)),
        Stmt::Assign { target, value } => src_writeln!(w, "{} = {};", expr(target), expr(value)),
        Stmt::VarDecl { ty, name, init } => match init {
            Some(init) => src_writeln!(w, "{} {} = {};", type_ref(ty), ident(name), expr(init)),
            None => src_writeln!(w, "{} {};", type_ref(ty), ident(name)),
        },
        Stmt::Return(None) => w.writeln("return;"),
        Stmt::Return(Some(e)) => src_writeln!(w, "return {};", expr(e)),
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            src_writeln!(w, "if ({})", expr(cond))?;
            block(w, then)?;
            if !otherwise.is_empty() {
                w.writeln("else")?;
                block(w, otherwise)?;
            }
            Ok(())
        }
    }
}

fn primitive(p: PrimitiveType) -> &'static str {
    match p {
        PrimitiveType::Boolean => "bool",
        PrimitiveType::Byte => "byte",
        PrimitiveType::SByte => "sbyte",
        PrimitiveType::Char => "char",
        PrimitiveType::Int16 => "short",
        PrimitiveType::UInt16 => "ushort",
        PrimitiveType::Int32 => "int",
        PrimitiveType::UInt32 => "uint",
        PrimitiveType::Int64 => "long",
        PrimitiveType::UInt64 => "ulong",
        PrimitiveType::Single => "float",
        PrimitiveType::Double => "double",
        PrimitiveType::Decimal => "decimal",
        PrimitiveType::String => "string",
        PrimitiveType::Binary => "byte[]",
        other => other.name(),
    }
}

pub(super) fn type_ref(ty: &CodeTypeRef) -> String {
    match ty {
        CodeTypeRef::Void => "void".to_string(),
        CodeTypeRef::Object => "object".to_string(),
        CodeTypeRef::Primitive(p) => primitive(*p).to_string(),
        CodeTypeRef::Named { name, args } if args.is_empty() => name.clone(),
        CodeTypeRef::Named { name, args } => {
            let args: Vec<String> = args.iter().map(type_ref).collect();
            format!("{name}<{}>", args.join(", "))
        }
        CodeTypeRef::Array(element) => format!("{}[]", type_ref(element)),
        CodeTypeRef::Nullable(inner) => format!("Nullable<{}>", type_ref(inner)),
    }
}

fn args_list(args: &[Expr]) -> String {
    args.iter().map(expr).collect::<Vec<_>>().join(", ")
}

fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn float_literal(v: f64) -> String {
    if v.is_nan() {
        "double.NaN".to_string()
    } else if v.is_infinite() {
        let name = if v > 0.0 { "PositiveInfinity" } else { "NegativeInfinity" };
        format!("double.{name}")
    } else {
        format!("{v:?}D")
    }
}

fn operator(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Equal | BinaryOp::IdentityEqual => "==",
        BinaryOp::NotEqual | BinaryOp::IdentityNotEqual => "!=",
        BinaryOp::BitwiseOr => "|",
        BinaryOp::And => "&&",
    }
}

pub(super) fn expr(e: &Expr) -> String {
    match e {
        Expr::Null => "null".to_string(),
        Expr::This => "this".to_string(),
        Expr::Base => "base".to_string(),
        Expr::Bool(b) => b.to_string(),
        Expr::Int(i) => i.to_string(),
        Expr::Float(f) => float_literal(*f),
        Expr::Str(s) => string_literal(s),
        Expr::TypeOf(ty) => format!("typeof({})", type_ref(ty)),
        Expr::Var(name) => ident(name),
        Expr::Member(target, name) => format!("{}.{}", expr(target), ident(name)),
        Expr::Call {
            target,
            method,
            type_args,
            args,
        } => {
            let generic = if type_args.is_empty() {
                String::new()
            } else {
                format!("<{}>", type_args.iter().map(type_ref).collect::<Vec<_>>().join(", "))
            };
            format!("{}.{}{generic}({})", expr(target), ident(method), args_list(args))
        }
        Expr::TypeMember(ty, name) => format!("{}.{name}", type_ref(ty)),
        Expr::New { ty, args } => format!("new {}({})", type_ref(ty), args_list(args)),
        Expr::NewArray { element, items } if items.is_empty() => {
            format!("new {}[0]", type_ref(element))
        }
        Expr::NewArray { element, items } => {
            format!("new {}[] {{ {} }}", type_ref(element), args_list(items))
        }
        Expr::Cast { ty, expr: inner } => format!("(({})({}))", type_ref(ty), expr(inner)),
        Expr::Binary { left, op, right } => {
            format!("({} {} {})", expr(left), operator(*op), expr(right))
        }
        Expr::MethodRef(target, name) => format!("{}.{}", expr(target), ident(name)),
    }
}
