// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Visual Basic rendering.
//!
//! Imports from every namespace are hoisted to the top of the file, since
//! Visual Basic only allows `Imports` before the first declaration. Value
//! comparisons go through `Object.Equals` so they are valid for reference
//! and value types alike.

use super::{xml_escape, CodeDomProvider, GENERATED_BANNER};
use crate::code_model::{
    Access, AttributeDecl, BinaryOp, CodeTypeRef, CompileUnit, ConstructorDecl, CtorChain,
    EnumMemberDecl, Expr, FieldDecl, Member, MethodDecl, ParamDecl, ParamDirection, PropertyDecl,
    Stmt, TypeDecl, TypeDeclKind,
};
use crate::code_writer::{src_writeln, SourceWriter};
use ria_schema::PrimitiveType;
use std::collections::BTreeSet;
use std::fmt;

const KEYWORDS: &[&str] = &[
    "AddHandler", "AddressOf", "Alias", "And", "AndAlso", "As", "Boolean", "ByRef", "Byte",
    "ByVal", "Call", "Case", "Catch", "CBool", "CByte", "CChar", "CDate", "CDbl", "CDec", "Char",
    "CInt", "Class", "CLng", "CObj", "Const", "Continue", "CSByte", "CShort", "CSng", "CStr",
    "CType", "CUInt", "CULng", "CUShort", "Date", "Decimal", "Declare", "Default", "Delegate",
    "Dim", "DirectCast", "Do", "Double", "Each", "Else", "ElseIf", "End", "Enum", "Erase",
    "Error", "Event", "Exit", "False", "Finally", "For", "Friend", "Function", "Get", "GetType",
    "Global", "GoTo", "Handles", "If", "Implements", "Imports", "In", "Inherits", "Integer",
    "Interface", "Is", "IsNot", "Let", "Lib", "Like", "Long", "Loop", "Me", "Mod", "Module",
    "MustInherit", "MustOverride", "MyBase", "MyClass", "Namespace", "Narrowing", "New", "Next",
    "Not", "Nothing", "NotInheritable", "NotOverridable", "Object", "Of", "On", "Operator",
    "Option", "Optional", "Or", "OrElse", "Overloads", "Overridable", "Overrides", "ParamArray",
    "Partial", "Private", "Property", "Protected", "Public", "RaiseEvent", "ReadOnly", "ReDim",
    "REM", "RemoveHandler", "Resume", "Return", "SByte", "Select", "Set", "Shadows", "Shared",
    "Short", "Single", "Static", "Step", "Stop", "String", "Structure", "Sub", "SyncLock", "Then",
    "Throw", "To", "True", "Try", "TryCast", "TypeOf", "UInteger", "ULong", "UShort", "Using",
    "When", "While", "Widening", "With", "WithEvents", "WriteOnly", "Xor",
];

/// Visual Basic provider (`VB`, aliases `vb`, `visualbasic`).
#[derive(Clone, Copy, Debug, Default)]
pub struct VisualBasicCodeProvider;

impl CodeDomProvider for VisualBasicCodeProvider {
    fn language(&self) -> &'static str {
        "VB"
    }

    fn file_extension(&self) -> &'static str {
        "vb"
    }

    fn is_case_sensitive(&self) -> bool {
        false
    }

    fn generate_code_from_compile_unit(&self, unit: &CompileUnit) -> Result<String, fmt::Error> {
        let mut w = SourceWriter::new(String::new(), "    ");
        for line in GENERATED_BANNER {
            src_writeln!(w, "'{line}")?;
        }
        w.newline()?;
        for option in ["Option Compare Binary", "Option Infer On", "Option Strict On", "Option Explicit On"] {
            w.writeln(option)?;
        }
        let imports: BTreeSet<&str> = unit
            .namespaces
            .iter()
            .flat_map(|ns| ns.imports.iter().map(String::as_str))
            .collect();
        if !imports.is_empty() {
            w.newline()?;
            for import in imports {
                src_writeln!(w, "Imports {import}")?;
            }
        }
        for ns in &unit.namespaces {
            w.newline()?;
            if ns.name.is_empty() {
                types(&mut w, &ns.types)?;
                continue;
            }
            src_writeln!(w, "Namespace {}", ns.name)?;
            w.indented(|w| types(w, &ns.types))?;
            w.writeln("End Namespace")?;
        }
        Ok(w.into_inner())
    }
}

type Out = SourceWriter<String>;

fn ident(name: &str) -> String {
    if KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(name)) {
        format!("[{name}]")
    } else {
        name.to_string()
    }
}

fn types(w: &mut Out, list: &[TypeDecl]) -> fmt::Result {
    for (idx, ty) in list.iter().enumerate() {
        if idx > 0 {
            w.newline()?;
        }
        type_decl(w, ty)?;
    }
    Ok(())
}

fn access(a: Access) -> &'static str {
    match a {
        Access::Public => "Public",
        Access::Internal => "Friend",
        Access::Protected => "Protected",
        Access::Private => "Private",
    }
}

fn doc(w: &mut Out, lines: &[String]) -> fmt::Result {
    if lines.is_empty() {
        return Ok(());
    }
    w.writeln("'''<summary>")?;
    for line in lines {
        src_writeln!(w, "'''{}", xml_escape(line))?;
    }
    w.writeln("'''</summary>")
}

fn attribute(attr: &AttributeDecl) -> String {
    let args: Vec<String> = attr
        .args
        .iter()
        .map(|a| match &a.name {
            Some(name) => format!("{name}:={}", expr(&a.value)),
            None => expr(&a.value),
        })
        .collect();
    format!("{}({})", attr.name, args.join(", "))
}

fn attributes(w: &mut Out, attrs: &[AttributeDecl]) -> fmt::Result {
    for attr in attrs {
        src_writeln!(w, "<{}>  _", attribute(attr))?;
    }
    Ok(())
}

fn type_decl(w: &mut Out, ty: &TypeDecl) -> fmt::Result {
    doc(w, &ty.doc)?;
    attributes(w, &ty.attributes)?;
    let name = ident(&ty.name);
    let end = match ty.kind {
        TypeDeclKind::Class => {
            let partial = if ty.is_partial { "Partial " } else { "" };
            let sealed = if ty.is_sealed { " NotInheritable" } else { "" };
            src_writeln!(w, "{partial}{}{sealed} Class {name}", access(ty.access))?;
            "End Class"
        }
        TypeDeclKind::Interface => {
            src_writeln!(w, "{} Interface {name}", access(ty.access))?;
            "End Interface"
        }
        TypeDeclKind::Enum => {
            match ty.base_types.first() {
                Some(base) if *base != CodeTypeRef::Primitive(PrimitiveType::Int32) => {
                    src_writeln!(w, "{} Enum {name} As {}", access(ty.access), type_ref(base))?;
                }
                _ => src_writeln!(w, "{} Enum {name}", access(ty.access))?,
            }
            "End Enum"
        }
    };
    w.indented(|w| {
        if ty.kind == TypeDeclKind::Class {
            let mut bases = ty.base_types.iter();
            if let Some(base) = bases.next() {
                src_writeln!(w, "Inherits {}", type_ref(base))?;
            }
            for iface in bases {
                src_writeln!(w, "Implements {}", type_ref(iface))?;
            }
        }
        for member in &ty.members {
            if !matches!(member, Member::EnumMember(_)) {
                w.newline()?;
            }
            match member {
                Member::Field(f) => field(w, f)?,
                Member::Property(p) => property(w, p)?,
                Member::Method(m) => method(w, m, ty.kind == TypeDeclKind::Interface)?,
                Member::Constructor(c) => constructor(w, c)?,
                Member::EnumMember(e) => enum_member(w, e)?,
            }
        }
        for nested in &ty.nested_types {
            w.newline()?;
            type_decl(w, nested)?;
        }
        Ok(())
    })?;
    w.writeln(end)
}

fn field(w: &mut Out, f: &FieldDecl) -> fmt::Result {
    let shared = if f.is_static { " Shared" } else { "" };
    src_writeln!(w, "{}{shared} {} As {}", access(f.access), ident(&f.name), type_ref(&f.ty))
}

fn property(w: &mut Out, p: &PropertyDecl) -> fmt::Result {
    doc(w, &p.doc)?;
    attributes(w, &p.attributes)?;
    let modifier = match (&p.getter, &p.setter) {
        (Some(_), None) => " ReadOnly",
        (None, Some(_)) => " WriteOnly",
        _ => "",
    };
    let ty = type_ref(&p.ty);
    src_writeln!(w, "{}{modifier} Property {}() As {ty}", access(p.access), ident(&p.name))?;
    w.indented(|w| {
        if let Some(getter) = &p.getter {
            w.writeln("Get")?;
            body(w, getter)?;
            w.writeln("End Get")?;
        }
        if let Some(setter) = &p.setter {
            src_writeln!(w, "Set(ByVal value As {ty})")?;
            body(w, setter)?;
            w.writeln("End Set")?;
        }
        Ok(())
    })?;
    w.writeln("End Property")
}

fn params(list: &[ParamDecl]) -> String {
    list.iter()
        .map(|p| {
            let mut out = String::new();
            if !p.attributes.is_empty() {
                let attrs: Vec<String> = p.attributes.iter().map(attribute).collect();
                out.push('<');
                out.push_str(&attrs.join(", "));
                out.push_str("> ");
            }
            out.push_str(match p.direction {
                ParamDirection::In => "ByVal ",
                ParamDirection::Out | ParamDirection::Ref => "ByRef ",
            });
            out.push_str(&ident(&p.name));
            out.push_str(" As ");
            out.push_str(&type_ref(&p.ty));
            out
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn method(w: &mut Out, m: &MethodDecl, in_interface: bool) -> fmt::Result {
    doc(w, &m.doc)?;
    attributes(w, &m.attributes)?;
    let (keyword, end) = if m.return_type.is_void() {
        ("Sub", "End Sub")
    } else {
        ("Function", "End Function")
    };
    let mut signature = format!("{keyword} {}({})", ident(&m.name), params(&m.params));
    if !m.return_type.is_void() {
        signature.push_str(" As ");
        signature.push_str(&type_ref(&m.return_type));
    }
    match &m.body {
        None if in_interface => src_writeln!(w, "{signature}"),
        None => {
            src_writeln!(w, "Partial Private {signature}")?;
            w.writeln(end)
        }
        Some(stmts) => {
            let modifier = if m.is_override { " Overrides" } else { "" };
            src_writeln!(w, "{}{modifier} {signature}", access(m.access))?;
            body(w, stmts)?;
            w.writeln(end)
        }
    }
}

fn constructor(w: &mut Out, c: &ConstructorDecl) -> fmt::Result {
    doc(w, &c.doc)?;
    src_writeln!(w, "{} Sub New({})", access(c.access), params(&c.params))?;
    w.indented(|w| {
        match &c.chain {
            Some(CtorChain::This(args)) => src_writeln!(w, "Me.New({})", args_list(args))?,
            Some(CtorChain::Base(args)) => src_writeln!(w, "MyBase.New({})", args_list(args))?,
            None => {}
        }
        c.body.iter().try_for_each(|s| stmt(w, s))
    })?;
    w.writeln("End Sub")
}

fn enum_member(w: &mut Out, e: &EnumMemberDecl) -> fmt::Result {
    if !e.attributes.is_empty() {
        w.newline()?;
        attributes(w, &e.attributes)?;
    }
    match e.value {
        Some(v) => src_writeln!(w, "{} = {v}", ident(&e.name)),
        None => src_writeln!(w, "{}", ident(&e.name)),
    }
}

fn body(w: &mut Out, stmts: &[Stmt]) -> fmt::Result {
    w.indented(|w| stmts.iter().try_for_each(|s| stmt(w, s)))
}

fn stmt(w: &mut Out, s: &Stmt) -> fmt::Result {
    match s {
        Stmt::Expr(e) => src_writeln!(w, "{}", expr(e)),
        Stmt::Assign { target, value } => src_writeln!(w, "{} = {}", expr(target), expr(value)),
        Stmt::VarDecl { ty, name, init } => match init {
            Some(init) => src_writeln!(w, "Dim {} As {} = {}", ident(name), type_ref(ty), expr(init)),
            None => src_writeln!(w, "Dim {} As {}", ident(name), type_ref(ty)),
        },
        Stmt::Return(None) => w.writeln("Return"),
        Stmt::Return(Some(e)) => src_writeln!(w, "Return {}", expr(e)),
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            src_writeln!(w, "If {} Then", expr(cond))?;
            body(w, then)?;
            if !otherwise.is_empty() {
                w.writeln("Else")?;
                body(w, otherwise)?;
            }
            w.writeln("End If")
        }
    }
}

fn primitive(p: PrimitiveType) -> &'static str {
    match p {
        PrimitiveType::Int16 => "Short",
        PrimitiveType::UInt16 => "UShort",
        PrimitiveType::Int32 => "Integer",
        PrimitiveType::UInt32 => "UInteger",
        PrimitiveType::Int64 => "Long",
        PrimitiveType::UInt64 => "ULong",
        PrimitiveType::DateTime => "Date",
        PrimitiveType::Binary => "Byte()",
        other => other.name(),
    }
}

pub(super) fn type_ref(ty: &CodeTypeRef) -> String {
    match ty {
        CodeTypeRef::Void => "Void".to_string(),
        CodeTypeRef::Object => "Object".to_string(),
        CodeTypeRef::Primitive(p) => primitive(*p).to_string(),
        CodeTypeRef::Named { name, args } if args.is_empty() => name.clone(),
        CodeTypeRef::Named { name, args } => {
            let args: Vec<String> = args.iter().map(type_ref).collect();
            format!("{name}(Of {})", args.join(", "))
        }
        CodeTypeRef::Array(element) => format!("{}()", type_ref(element)),
        CodeTypeRef::Nullable(inner) => format!("Nullable(Of {})", type_ref(inner)),
    }
}

fn args_list(args: &[Expr]) -> String {
    args.iter().map(expr).collect::<Vec<_>>().join(", ")
}

fn string_literal(text: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '"' => current.push_str("\"\""),
            c if c.is_control() => {
                if !current.is_empty() {
                    parts.push(format!("\"{current}\""));
                    current.clear();
                }
                parts.push(format!("Global.Microsoft.VisualBasic.ChrW({})", u32::from(c)));
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || parts.is_empty() {
        parts.push(format!("\"{current}\""));
    }
    parts.join(" & ")
}

fn float_literal(v: f64) -> String {
    if v.is_nan() {
        "Double.NaN".to_string()
    } else if v.is_infinite() {
        let name = if v > 0.0 { "PositiveInfinity" } else { "NegativeInfinity" };
        format!("Double.{name}")
    } else {
        format!("{v:?}R")
    }
}

pub(super) fn expr(e: &Expr) -> String {
    match e {
        Expr::Null => "Nothing".to_string(),
        Expr::This => "Me".to_string(),
        Expr::Base => "MyBase".to_string(),
        Expr::Bool(true) => "True".to_string(),
        Expr::Bool(false) => "False".to_string(),
        Expr::Int(i) => i.to_string(),
        Expr::Float(f) => float_literal(*f),
        Expr::Str(s) => string_literal(s),
        Expr::TypeOf(CodeTypeRef::Void) => "GetType(System.Void)".to_string(),
        Expr::TypeOf(ty) => format!("GetType({})", type_ref(ty)),
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
                format!("(Of {})", type_args.iter().map(type_ref).collect::<Vec<_>>().join(", "))
            };
            format!("{}.{}{generic}({})", expr(target), ident(method), args_list(args))
        }
        Expr::TypeMember(ty, name) => format!("{}.{name}", type_ref(ty)),
        Expr::New { ty, args } => format!("New {}({})", type_ref(ty), args_list(args)),
        Expr::NewArray { element, items } => {
            format!("New {}() {{{}}}", type_ref(element), args_list(items))
        }
        Expr::Cast { ty, expr: inner } => format!("CType({}, {})", expr(inner), type_ref(ty)),
        Expr::Binary { left, op, right } => {
            let (l, r) = (expr(left), expr(right));
            match op {
                BinaryOp::Equal => format!("Object.Equals({l}, {r})"),
                BinaryOp::NotEqual => format!("(Object.Equals({l}, {r}) = False)"),
                BinaryOp::IdentityEqual => format!("({l} Is {r})"),
                BinaryOp::IdentityNotEqual => format!("({l} IsNot {r})"),
                BinaryOp::BitwiseOr => format!("({l} Or {r})"),
                BinaryOp::And => format!("({l} AndAlso {r})"),
            }
        }
        Expr::MethodRef(target, name) => format!("AddressOf {}.{}", expr(target), ident(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_model::CodeNamespace;

    #[test]
    fn renders_vb_type_names() {
        let ty = CodeTypeRef::generic(
            "EntityQuery",
            vec![CodeTypeRef::Array(Box::new(CodeTypeRef::Primitive(PrimitiveType::Int32)))],
        );
        assert_eq!(type_ref(&ty), "EntityQuery(Of Integer())");
        assert_eq!(type_ref(&CodeTypeRef::Primitive(PrimitiveType::DateTime)), "Date");
    }

    #[test]
    fn strings_double_quotes_and_split_control_characters() {
        assert_eq!(string_literal("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(
            string_literal("a\nb"),
            "\"a\" & Global.Microsoft.VisualBasic.ChrW(10) & \"b\""
        );
        assert_eq!(string_literal(""), "\"\"");
    }

    #[test]
    fn comparisons_use_object_equals() {
        let cmp = Expr::binary(Expr::this_member("_name"), BinaryOp::NotEqual, Expr::Var("value".into()));
        assert_eq!(expr(&cmp), "(Object.Equals(Me._name, value) = False)");
        assert_eq!(expr(&Expr::MethodRef(Box::new(Expr::This), "OnLoaded".into())), "AddressOf Me.OnLoaded");
    }

    #[test]
    fn hoists_imports_and_renders_inherits() {
        let mut ty = TypeDecl::class("OrderContext");
        ty.is_sealed = true;
        ty.is_partial = true;
        ty.base_types.push(CodeTypeRef::named("DomainContext"));
        ty.members.push(Member::Method(MethodDecl::partial("OnCreated", Vec::new())));
        let mut ns = CodeNamespace::new("Northwind");
        ns.imports.push("System".into());
        ns.types.push(ty);
        let text = VisualBasicCodeProvider
            .generate_code_from_compile_unit(&CompileUnit {
                namespaces: vec![ns],
            })
            .unwrap();
        assert!(text.contains("Option Explicit On\n\nImports System\n\nNamespace Northwind\n"));
        assert!(text.contains(
            "    Partial Public NotInheritable Class OrderContext\n        Inherits DomainContext\n\n        Partial Private Sub OnCreated()\n        End Sub\n    End Class\nEnd Namespace\n"
        ));
    }
}
