// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Language-neutral model of generated client code.
//!
//! Generators build a [`CompileUnit`]; a
//! [`CodeDomProvider`](crate::CodeDomProvider) renders it as C# or Visual
//! Basic text. The model covers exactly the constructs the client proxy
//! surface needs.

use ria_schema::PrimitiveType;

/// Reference to a type in generated code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CodeTypeRef {
    /// No value.
    Void,
    /// The root object type.
    Object,
    /// A predefined simple type.
    Primitive(PrimitiveType),
    /// A named, possibly generic, type.
    Named {
        /// Name as it should appear (short or qualified).
        name: String,
        /// Generic arguments.
        args: Vec<CodeTypeRef>,
    },
    /// Single-dimensional array.
    Array(Box<CodeTypeRef>),
    /// Nullable value type.
    Nullable(Box<CodeTypeRef>),
}

impl CodeTypeRef {
    /// A non-generic named type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A generic named type.
    pub fn generic(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    /// `Boolean`.
    pub fn bool() -> Self {
        Self::Primitive(PrimitiveType::Boolean)
    }

    /// `String`.
    pub fn string() -> Self {
        Self::Primitive(PrimitiveType::String)
    }

    /// Whether this is [`CodeTypeRef::Void`].
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }
}

/// Accessibility of a generated type or member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Access {
    /// Visible everywhere.
    #[default]
    Public,
    /// Visible within the client assembly.
    Internal,
    /// Visible to derived types.
    Protected,
    /// Visible within the declaring type.
    Private,
}

/// One attribute application in generated code.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDecl {
    /// Attribute type name without the `Attribute` suffix; short when the
    /// namespace is imported, otherwise qualified.
    pub name: String,
    /// Positional and named arguments.
    pub args: Vec<AttributeArg>,
}

impl AttributeDecl {
    /// Attribute with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: Expr) -> Self {
        self.args.push(AttributeArg { name: None, value });
        self
    }

    /// Appends a named argument.
    pub fn named(mut self, name: impl Into<String>, value: Expr) -> Self {
        self.args.push(AttributeArg {
            name: Some(name.into()),
            value,
        });
        self
    }
}

/// An attribute argument.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeArg {
    /// Property name for named arguments.
    pub name: Option<String>,
    /// Argument value.
    pub value: Expr,
}

/// Binary operators used by generated code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// Value equality.
    Equal,
    /// Value inequality.
    NotEqual,
    /// Reference equality (null checks).
    IdentityEqual,
    /// Reference inequality.
    IdentityNotEqual,
    /// Bitwise or of flags.
    BitwiseOr,
    /// Short-circuit and.
    And,
}

/// Expressions.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `null` / `Nothing`.
    Null,
    /// `this` / `Me`.
    This,
    /// `base` / `MyBase`.
    Base,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// String literal.
    Str(String),
    /// `typeof(T)` / `GetType(T)`.
    TypeOf(CodeTypeRef),
    /// Local variable or parameter.
    Var(String),
    /// Field or property access.
    Member(Box<Expr>, String),
    /// Method invocation.
    Call {
        /// Receiver; static calls use [`Expr::Var`] holding the type name.
        target: Box<Expr>,
        /// Method name.
        method: String,
        /// Generic arguments.
        type_args: Vec<CodeTypeRef>,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// Static member of a type (`EntitySetOperations.Add`, `UriKind.Relative`).
    TypeMember(CodeTypeRef, String),
    /// Object creation.
    New {
        /// Created type.
        ty: CodeTypeRef,
        /// Constructor arguments.
        args: Vec<Expr>,
    },
    /// Array creation with initializers.
    NewArray {
        /// Element type.
        element: CodeTypeRef,
        /// Items.
        items: Vec<Expr>,
    },
    /// Type conversion.
    Cast {
        /// Target type.
        ty: CodeTypeRef,
        /// Converted value.
        expr: Box<Expr>,
    },
    /// Binary operation.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Reference to a method used as a delegate.
    MethodRef(Box<Expr>, String),
}

impl Expr {
    /// `this.<name>`.
    pub fn this_member(name: impl Into<String>) -> Self {
        Self::Member(Box::new(Self::This), name.into())
    }

    /// `<self>.<name>`.
    pub fn member(self, name: impl Into<String>) -> Self {
        Self::Member(Box::new(self), name.into())
    }

    /// `<self>.<method>(<args>)`.
    pub fn call(self, method: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Call {
            target: Box::new(self),
            method: method.into(),
            type_args: Vec::new(),
            args,
        }
    }

    /// `<self>.<method><<type_args>>(<args>)`.
    pub fn call_generic(self, method: impl Into<String>, type_args: Vec<CodeTypeRef>, args: Vec<Self>) -> Self {
        Self::Call {
            target: Box::new(self),
            method: method.into(),
            type_args,
            args,
        }
    }

    /// String literal.
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Binary operation.
    pub fn binary(left: Self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }
}

/// Statements.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// Expression statement.
    Expr(Expr),
    /// Assignment.
    Assign {
        /// Assigned location.
        target: Expr,
        /// Assigned value.
        value: Expr,
    },
    /// Local variable declaration.
    VarDecl {
        /// Declared type.
        ty: CodeTypeRef,
        /// Variable name.
        name: String,
        /// Initializer.
        init: Option<Expr>,
    },
    /// Return.
    Return(Option<Expr>),
    /// Conditional.
    If {
        /// Condition.
        cond: Expr,
        /// Statements when true.
        then: Vec<Stmt>,
        /// Statements when false.
        otherwise: Vec<Stmt>,
    },
}

/// Parameter passing direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParamDirection {
    /// By value.
    #[default]
    In,
    /// Output.
    Out,
    /// By reference.
    Ref,
}

/// A method or constructor parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamDecl {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: CodeTypeRef,
    /// Passing direction.
    pub direction: ParamDirection,
    /// Attributes.
    pub attributes: Vec<AttributeDecl>,
}

impl ParamDecl {
    /// By-value parameter without attributes.
    pub fn new(name: impl Into<String>, ty: CodeTypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            direction: ParamDirection::In,
            attributes: Vec::new(),
        }
    }
}

/// A field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: CodeTypeRef,
    /// Accessibility.
    pub access: Access,
    /// Static field.
    pub is_static: bool,
}

/// A property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    /// Property name.
    pub name: String,
    /// Property type.
    pub ty: CodeTypeRef,
    /// Accessibility.
    pub access: Access,
    /// Attributes.
    pub attributes: Vec<AttributeDecl>,
    /// Getter body; `None` for write-only.
    pub getter: Option<Vec<Stmt>>,
    /// Setter body; `None` for read-only.
    pub setter: Option<Vec<Stmt>>,
    /// Documentation lines.
    pub doc: Vec<String>,
}

/// A method. A partial method declaration has no body.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDecl {
    /// Method name.
    pub name: String,
    /// Accessibility (ignored for partial declarations).
    pub access: Access,
    /// Overrides a base member.
    pub is_override: bool,
    /// Return type.
    pub return_type: CodeTypeRef,
    /// Parameters.
    pub params: Vec<ParamDecl>,
    /// Body; `None` for a partial method declaration.
    pub body: Option<Vec<Stmt>>,
    /// Attributes.
    pub attributes: Vec<AttributeDecl>,
    /// Documentation lines.
    pub doc: Vec<String>,
}

impl MethodDecl {
    /// Public method with a body.
    pub fn new(name: impl Into<String>, return_type: CodeTypeRef, params: Vec<ParamDecl>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            access: Access::Public,
            is_override: false,
            return_type,
            params,
            body: Some(body),
            attributes: Vec::new(),
            doc: Vec::new(),
        }
    }

    /// Partial method declaration (`partial void OnCreated();`).
    pub fn partial(name: impl Into<String>, params: Vec<ParamDecl>) -> Self {
        Self {
            name: name.into(),
            access: Access::Private,
            is_override: false,
            return_type: CodeTypeRef::Void,
            params,
            body: None,
            attributes: Vec::new(),
            doc: Vec::new(),
        }
    }

    /// Whether this is a partial declaration.
    pub fn is_partial(&self) -> bool {
        self.body.is_none()
    }
}

/// Constructor chaining target.
#[derive(Clone, Debug, PartialEq)]
pub enum CtorChain {
    /// `: this(...)`.
    This(Vec<Expr>),
    /// `: base(...)`.
    Base(Vec<Expr>),
}

/// A constructor.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructorDecl {
    /// Accessibility.
    pub access: Access,
    /// Parameters.
    pub params: Vec<ParamDecl>,
    /// Chained constructor call.
    pub chain: Option<CtorChain>,
    /// Body.
    pub body: Vec<Stmt>,
    /// Documentation lines.
    pub doc: Vec<String>,
}

/// An enum member.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumMemberDecl {
    /// Member name.
    pub name: String,
    /// Explicit value.
    pub value: Option<i64>,
    /// Attributes.
    pub attributes: Vec<AttributeDecl>,
}

/// A member of a type declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum Member {
    /// Field.
    Field(FieldDecl),
    /// Property.
    Property(PropertyDecl),
    /// Method or partial method declaration.
    Method(MethodDecl),
    /// Constructor.
    Constructor(ConstructorDecl),
    /// Enum member.
    EnumMember(EnumMemberDecl),
}

impl Member {
    /// Member name; constructors report `.ctor`.
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => &f.name,
            Self::Property(p) => &p.name,
            Self::Method(m) => &m.name,
            Self::Constructor(_) => ".ctor",
            Self::EnumMember(e) => &e.name,
        }
    }

    /// Whether the member is a method (including partial declarations).
    pub fn is_method(&self) -> bool {
        matches!(self, Self::Method(_))
    }
}

/// Kind of a type declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeDeclKind {
    /// Class.
    Class,
    /// Interface.
    Interface,
    /// Enum.
    Enum,
}

/// A type declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    /// Type name.
    pub name: String,
    /// Kind.
    pub kind: TypeDeclKind,
    /// Accessibility.
    pub access: Access,
    /// Sealed class.
    pub is_sealed: bool,
    /// Partial class.
    pub is_partial: bool,
    /// For classes, the base class followed by implemented interfaces; for
    /// enums, the underlying type.
    pub base_types: Vec<CodeTypeRef>,
    /// Attributes.
    pub attributes: Vec<AttributeDecl>,
    /// Members in declaration order.
    pub members: Vec<Member>,
    /// Nested types.
    pub nested_types: Vec<TypeDecl>,
    /// Documentation lines.
    pub doc: Vec<String>,
}

impl TypeDecl {
    /// Public class with no members.
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeDeclKind::Class,
            access: Access::Public,
            is_sealed: false,
            is_partial: false,
            base_types: Vec::new(),
            attributes: Vec::new(),
            members: Vec::new(),
            nested_types: Vec::new(),
            doc: Vec::new(),
        }
    }

    /// Public enum with no members.
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self {
            kind: TypeDeclKind::Enum,
            ..Self::class(name)
        }
    }

    /// Members with the given name.
    pub fn members_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Member> + 'a {
        self.members.iter().filter(move |m| m.name() == name)
    }

    /// Whether a member that is not a method already uses `name`.
    pub fn has_non_method_member(&self, name: &str) -> bool {
        self.members_named(name).any(|m| !m.is_method())
            || self.nested_types.iter().any(|t| t.name == name)
    }

    /// Methods with the given name.
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDecl> + 'a {
        self.members_named(name).filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }
}

/// A namespace block.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeNamespace {
    /// Namespace name; empty for the global namespace.
    pub name: String,
    /// Imported namespaces.
    pub imports: Vec<String>,
    /// Top-level types.
    pub types: Vec<TypeDecl>,
}

impl CodeNamespace {
    /// Empty namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Vec::new(),
            types: Vec::new(),
        }
    }
}

/// Root of generated code.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompileUnit {
    /// Namespaces.
    pub namespaces: Vec<CodeNamespace>,
}

impl CompileUnit {
    /// The namespace named `name`, created on first use.
    pub fn namespace_mut(&mut self, name: &str) -> &mut CodeNamespace {
        if let Some(idx) = self.namespaces.iter().position(|n| n.name == name) {
            return &mut self.namespaces[idx];
        }
        self.namespaces.push(CodeNamespace::new(name));
        let last = self.namespaces.len() - 1;
        &mut self.namespaces[last]
    }

    /// Finds a top-level type by namespace and name.
    pub fn find_type(&self, namespace: &str, name: &str) -> Option<&TypeDecl> {
        self.namespaces
            .iter()
            .filter(|n| n.name == namespace)
            .flat_map(|n| n.types.iter())
            .find(|t| t.name == name)
    }
}
