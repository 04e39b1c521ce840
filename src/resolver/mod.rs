//! Symbol resolution consumed by code generation
//!
//! The emitter never looks names up itself. Everything it needs to know about
//! types, properties and call targets comes through the [`Resolver`] trait,
//! which is read-only for the duration of a compilation and shared between
//! worker threads.

mod builtins;
mod in_file;

use std::collections::HashSet;

pub use in_file::InFileResolver;

use crate::ast::{
    ConstraintSet, Creation, Expression, FunctionCall, PrimitiveType, PropertyDefinition, ReferenceTypeUsage,
    StaticFieldAccess, TypeDefinition, TypeMember, TypeUsage,
};
use crate::codegen::descriptor::descriptor_of;
use crate::codegen::jvm::{JvmConstructorDefinition, JvmFieldDefinition, JvmMethodDefinition, JvmType};
use crate::common::error::{Error, Result};

/// What a named type usage stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedReference {
    /// An alias of a JVM primitive (`UInt` -> `int`)
    Primitive(PrimitiveType),
    Class { qualified_name: String },
}

pub trait Resolver: Sync {
    fn resolve_reference(&self, usage: &ReferenceTypeUsage) -> Result<ResolvedReference>;

    /// Constraints implied by a type (`String` values are never null)
    fn type_constraints(&self, type_usage: &TypeUsage) -> ConstraintSet;

    /// File-level property definition named `name`
    fn find_property(&self, name: &str) -> Option<&PropertyDefinition>;

    fn call_target(&self, call: &FunctionCall) -> Result<JvmMethodDefinition>;

    fn constructor_target(&self, creation: &Creation) -> Result<JvmConstructorDefinition>;

    fn static_field(&self, access: &StaticFieldAccess) -> Result<JvmFieldDefinition>;

    fn qualified_name(&self, usage: &ReferenceTypeUsage) -> Result<String> {
        match self.resolve_reference(usage)? {
            ResolvedReference::Class { qualified_name } => Ok(qualified_name),
            ResolvedReference::Primitive(p) => {
                Err(Error::resolution(format!("{} is the primitive type {}, not a class", usage, p)))
            }
        }
    }

    fn jvm_type(&self, type_usage: &TypeUsage) -> Result<JvmType> {
        descriptor_of(type_usage, self)
    }

    /// Static type of an expression as the JVM sees it
    fn expression_type(&self, expression: &Expression) -> Result<JvmType> {
        match expression {
            Expression::IntLiteral(_) => Ok(JvmType::new("I")),
            Expression::StringLiteral(_) => Ok(JvmType::object("java.lang.String")),
            Expression::StaticFieldAccess(access) => Ok(self.static_field(access)?.jvm_type),
            Expression::Creation(creation) => Ok(self.constructor_target(creation)?.instance_type()),
            Expression::FunctionCall(call) => self.call_target(call)?.return_type(),
            Expression::FieldAccess(_) => Err(Error::unsupported(format!(
                "{} ({}) as a value",
                expression.kind(),
                expression
            ))),
        }
    }
}

/// A property as seen by code generation: its declaration plus the JVM type
/// and the full constraint set (declared and implied by the type)
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub type_usage: TypeUsage,
    pub jvm_type: JvmType,
    pub constraints: ConstraintSet,
}

impl Property {
    pub fn resolve<R: Resolver + ?Sized>(definition: &PropertyDefinition, resolver: &R) -> Result<Self> {
        let jvm_type = resolver.jvm_type(&definition.type_usage)?;
        if jvm_type.is_void() {
            return Err(Error::unsupported(format!("void property {}", definition.name)));
        }
        Ok(Self {
            name: definition.name.clone(),
            type_usage: definition.type_usage.clone(),
            jvm_type,
            constraints: definition.constraints.union(resolver.type_constraints(&definition.type_usage)),
        })
    }

    pub fn field_name(&self) -> &str {
        &self.name
    }

    pub fn getter_name(&self) -> String {
        format!("get{}", capitalize(&self.name))
    }

    pub fn setter_name(&self) -> String {
        format!("set{}", capitalize(&self.name))
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl TypeDefinition {
    /// Properties declared directly on this type, in declaration order.
    /// Property references are looked up among file-level definitions.
    pub fn direct_properties<R: Resolver + ?Sized>(&self, resolver: &R) -> Result<Vec<Property>> {
        let mut seen = HashSet::new();
        let mut properties = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let property = match member {
                TypeMember::Property(definition) => Property::resolve(definition, resolver)?,
                TypeMember::Reference(reference) => {
                    let definition = resolver.find_property(&reference.name).ok_or_else(|| {
                        Error::resolution(format!("unknown property {} referenced by type {}", reference.name, self.name))
                    })?;
                    Property::resolve(definition, resolver)?
                }
            };
            if !seen.insert(property.name.clone()) {
                return Err(Error::codegen_error(format!(
                    "property {} declared twice in type {}",
                    property.name, self.name
                )));
            }
            properties.push(property);
        }
        Ok(properties)
    }
}
