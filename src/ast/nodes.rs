use std::fmt;

use super::ConstraintSet;

// Type usages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    /// JVM field descriptor of this primitive
    pub fn descriptor(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "Z",
            PrimitiveType::Byte => "B",
            PrimitiveType::Short => "S",
            PrimitiveType::Char => "C",
            PrimitiveType::Int => "I",
            PrimitiveType::Long => "J",
            PrimitiveType::Float => "F",
            PrimitiveType::Double => "D",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Usage of a named type; the name is resolved by the resolver, which may map
/// it to a JVM class or to a primitive (e.g. `UInt`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceTypeUsage {
    pub name: String,
    pub type_arguments: Vec<TypeUsage>,
}

impl ReferenceTypeUsage {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), type_arguments: Vec::new() }
    }

    pub fn with_type_argument(mut self, argument: TypeUsage) -> Self {
        self.type_arguments.push(argument);
        self
    }
}

impl fmt::Display for ReferenceTypeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.type_arguments.is_empty() {
            let args: Vec<String> = self.type_arguments.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeUsage {
    Primitive(PrimitiveType),
    Reference(ReferenceTypeUsage),
    Array(Box<TypeUsage>),
}

impl TypeUsage {
    pub fn reference(name: impl Into<String>) -> Self {
        TypeUsage::Reference(ReferenceTypeUsage::new(name))
    }

    pub fn array_of(element: TypeUsage) -> Self {
        TypeUsage::Array(Box::new(element))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeUsage::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, TypeUsage::Reference(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeUsage::Array(_))
    }
}

impl fmt::Display for TypeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeUsage::Primitive(p) => write!(f, "{}", p),
            TypeUsage::Reference(r) => write!(f, "{}", r),
            TypeUsage::Array(element) => write!(f, "{}[]", element),
        }
    }
}

// Properties
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    pub name: String,
    pub type_usage: TypeUsage,
    /// Constraints declared on the property itself, on top of those its type carries
    pub constraints: ConstraintSet,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, type_usage: TypeUsage) -> Self {
        Self { name: name.into(), type_usage, constraints: ConstraintSet::empty() }
    }

    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = self.constraints.union(constraints);
        self
    }
}

impl fmt::Display for PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "property {} {}", self.type_usage, self.name)
    }
}

/// Reference to a property declared at file level
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyReference {
    pub name: String,
}

impl PropertyReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeMember {
    Property(PropertyDefinition),
    Reference(PropertyReference),
}

// Type definitions
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub members: Vec<TypeMember>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), members: Vec::new() }
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.members.push(TypeMember::Property(property));
        self
    }

    pub fn with_property_reference(mut self, name: impl Into<String>) -> Self {
        self.members.push(TypeMember::Reference(PropertyReference::new(name)));
        self
    }
}

impl fmt::Display for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.name)
    }
}

// Expressions
#[derive(Debug, Clone, PartialEq)]
pub struct StaticFieldAccess {
    /// Qualified name of the owning type
    pub type_name: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccess {
    pub subject: Box<Expression>,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// The callee: a `FieldAccess` for instance calls, a `StaticFieldAccess` for static ones
    pub function: Box<Expression>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Creation {
    pub type_name: String,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    IntLiteral(i32),
    StringLiteral(String),
    StaticFieldAccess(StaticFieldAccess),
    FunctionCall(FunctionCall),
    Creation(Creation),
    FieldAccess(FieldAccess),
}

impl Expression {
    pub fn int(value: i32) -> Self {
        Expression::IntLiteral(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::StringLiteral(value.into())
    }

    pub fn static_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Expression::StaticFieldAccess(StaticFieldAccess { type_name: type_name.into(), field: field.into() })
    }

    pub fn field(subject: Expression, field: impl Into<String>) -> Self {
        Expression::FieldAccess(FieldAccess { subject: Box::new(subject), field: field.into() })
    }

    pub fn call(function: Expression, arguments: Vec<Expression>) -> Self {
        Expression::FunctionCall(FunctionCall { function: Box::new(function), arguments })
    }

    /// `subject.method(arguments)`
    pub fn method_call(subject: Expression, method: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self::call(Self::field(subject, method), arguments)
    }

    pub fn creation(type_name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::Creation(Creation { type_name: type_name.into(), arguments })
    }

    /// Node kind name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::IntLiteral(_) => "IntLiteral",
            Expression::StringLiteral(_) => "StringLiteral",
            Expression::StaticFieldAccess(_) => "StaticFieldAccess",
            Expression::FunctionCall(_) => "FunctionCall",
            Expression::Creation(_) => "Creation",
            Expression::FieldAccess(_) => "FieldAccess",
        }
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[Expression]) -> fmt::Result {
    write!(f, "(")?;
    for (i, arg) in arguments.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    write!(f, ")")
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::IntLiteral(value) => write!(f, "{}", value),
            Expression::StringLiteral(value) => write!(f, "{:?}", value),
            Expression::StaticFieldAccess(access) => write!(f, "{}.{}", access.type_name, access.field),
            Expression::FieldAccess(access) => write!(f, "{}.{}", access.subject, access.field),
            Expression::FunctionCall(call) => {
                write!(f, "{}", call.function)?;
                write_arguments(f, &call.arguments)
            }
            Expression::Creation(creation) => {
                write!(f, "{}", creation.type_name)?;
                write_arguments(f, &creation.arguments)
            }
        }
    }
}

// Statements
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    /// Declared type; inferred from the initializer when absent
    pub type_usage: Option<TypeUsage>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    VariableDeclaration(VariableDeclaration),
    ExpressionStatement(Expression),
    /// Explicit terminator of a program body
    Return,
}

impl Statement {
    pub fn var(name: impl Into<String>, value: Expression) -> Self {
        Statement::VariableDeclaration(VariableDeclaration { name: name.into(), type_usage: None, value })
    }

    pub fn typed_var(name: impl Into<String>, type_usage: TypeUsage, value: Expression) -> Self {
        Statement::VariableDeclaration(VariableDeclaration { name: name.into(), type_usage: Some(type_usage), value })
    }

    pub fn expression(expression: Expression) -> Self {
        Statement::ExpressionStatement(expression)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Statement::VariableDeclaration(_) => "VariableDeclaration",
            Statement::ExpressionStatement(_) => "ExpressionStatement",
            Statement::Return => "Return",
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::VariableDeclaration(decl) => match &decl.type_usage {
                Some(ty) => write!(f, "val {} {} = {}", ty, decl.name, decl.value),
                None => write!(f, "val {} = {}", decl.name, decl.value),
            },
            Statement::ExpressionStatement(expr) => write!(f, "{}", expr),
            Statement::Return => write!(f, "return"),
        }
    }
}

// Programs
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), statements: Vec::new() }
    }

    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program {}", self.name)
    }
}

// Files
#[derive(Debug, Clone, PartialEq)]
pub enum FileMember {
    Property(PropertyDefinition),
    Type(TypeDefinition),
    Program(Program),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurinFile {
    /// Dot-separated namespace; empty for the default namespace
    pub namespace: String,
    pub members: Vec<FileMember>,
}

impl TurinFile {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), members: Vec::new() }
    }

    pub fn add(&mut self, member: FileMember) {
        self.members.push(member);
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.add(FileMember::Property(property));
        self
    }

    pub fn with_type(mut self, definition: TypeDefinition) -> Self {
        self.add(FileMember::Type(definition));
        self
    }

    pub fn with_program(mut self, program: Program) -> Self {
        self.add(FileMember::Program(program));
        self
    }

    /// Qualified name of a unit declared in this file
    pub fn qualified_name(&self, simple_name: &str) -> String {
        if self.namespace.is_empty() {
            simple_name.to_string()
        } else {
            format!("{}.{}", self.namespace, simple_name)
        }
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.members.iter().filter_map(|m| match m {
            FileMember::Type(t) => Some(t),
            _ => None,
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.members.iter().filter_map(|m| match m {
            FileMember::Property(p) => Some(p),
            _ => None,
        })
    }
}
