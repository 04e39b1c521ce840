//! Built-in type aliases and the library members programs may use

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::ResolvedReference;
use crate::ast::{Constraint, ConstraintSet, PrimitiveType};
use crate::codegen::jvm::{InvokeKind, JvmConstructorDefinition, JvmFieldDefinition, JvmMethodDefinition, JvmType};

#[derive(Debug, Clone)]
pub(crate) struct TypeAlias {
    pub resolved: ResolvedReference,
    pub constraints: ConstraintSet,
}

fn primitive(p: PrimitiveType) -> TypeAlias {
    TypeAlias { resolved: ResolvedReference::Primitive(p), constraints: ConstraintSet::empty() }
}

fn class(qualified_name: &str, constraints: ConstraintSet) -> TypeAlias {
    TypeAlias { resolved: ResolvedReference::Class { qualified_name: qualified_name.to_string() }, constraints }
}

/// Names usable without qualification
pub(crate) static TYPE_ALIASES: Lazy<HashMap<&'static str, TypeAlias>> = Lazy::new(|| {
    let mut aliases = HashMap::new();
    aliases.insert("String", class("java.lang.String", ConstraintSet::of(Constraint::NonNull)));
    aliases.insert("Object", class("java.lang.Object", ConstraintSet::empty()));
    aliases.insert(
        "UInt",
        TypeAlias {
            resolved: ResolvedReference::Primitive(PrimitiveType::Int),
            constraints: ConstraintSet::of(Constraint::NonNegative),
        },
    );
    aliases.insert("Boolean", primitive(PrimitiveType::Boolean));
    aliases.insert("Byte", primitive(PrimitiveType::Byte));
    aliases.insert("Short", primitive(PrimitiveType::Short));
    aliases.insert("Char", primitive(PrimitiveType::Char));
    aliases.insert("Int", primitive(PrimitiveType::Int));
    aliases.insert("Long", primitive(PrimitiveType::Long));
    aliases.insert("Float", primitive(PrimitiveType::Float));
    aliases.insert("Double", primitive(PrimitiveType::Double));
    aliases
});

/// Short class names accepted where a qualified owner is expected
pub(crate) static CLASS_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("System", "java.lang.System"),
        ("Integer", "java.lang.Integer"),
        ("Math", "java.lang.Math"),
        ("PrintStream", "java.io.PrintStream"),
        ("IllegalArgumentException", "java.lang.IllegalArgumentException"),
    ])
});

const PRINT_STREAM: &str = "java/io/PrintStream";

pub(crate) static STATIC_FIELDS: Lazy<Vec<JvmFieldDefinition>> = Lazy::new(|| {
    vec![
        JvmFieldDefinition::new("java/lang/System", "out", JvmType::new("Ljava/io/PrintStream;"), true),
        JvmFieldDefinition::new("java/lang/System", "err", JvmType::new("Ljava/io/PrintStream;"), true),
        JvmFieldDefinition::new("java/lang/Integer", "MAX_VALUE", JvmType::new("I"), true),
        JvmFieldDefinition::new("java/lang/Integer", "MIN_VALUE", JvmType::new("I"), true),
    ]
});

pub(crate) static METHODS: Lazy<Vec<JvmMethodDefinition>> = Lazy::new(|| {
    vec![
        JvmMethodDefinition::new(PRINT_STREAM, "println", "()V", InvokeKind::Virtual),
        JvmMethodDefinition::new(PRINT_STREAM, "println", "(Ljava/lang/String;)V", InvokeKind::Virtual),
        JvmMethodDefinition::new(PRINT_STREAM, "println", "(Ljava/lang/Object;)V", InvokeKind::Virtual),
        JvmMethodDefinition::new(PRINT_STREAM, "println", "(I)V", InvokeKind::Virtual),
        JvmMethodDefinition::new(PRINT_STREAM, "println", "(J)V", InvokeKind::Virtual),
        JvmMethodDefinition::new(PRINT_STREAM, "print", "(Ljava/lang/String;)V", InvokeKind::Virtual),
        JvmMethodDefinition::new(PRINT_STREAM, "print", "(I)V", InvokeKind::Virtual),
        JvmMethodDefinition::new("java/lang/String", "length", "()I", InvokeKind::Virtual),
        JvmMethodDefinition::new("java/lang/String", "concat", "(Ljava/lang/String;)Ljava/lang/String;", InvokeKind::Virtual),
        JvmMethodDefinition::new("java/lang/String", "valueOf", "(I)Ljava/lang/String;", InvokeKind::Static),
        JvmMethodDefinition::new("java/lang/Integer", "toString", "(I)Ljava/lang/String;", InvokeKind::Static),
        JvmMethodDefinition::new("java/lang/Math", "abs", "(I)I", InvokeKind::Static),
        JvmMethodDefinition::new("java/lang/Object", "toString", "()Ljava/lang/String;", InvokeKind::Virtual),
    ]
});

pub(crate) static CONSTRUCTORS: Lazy<Vec<JvmConstructorDefinition>> = Lazy::new(|| {
    vec![
        JvmConstructorDefinition::new("java/lang/Object", "()V"),
        JvmConstructorDefinition::new("java/lang/IllegalArgumentException", "(Ljava/lang/String;)V"),
    ]
});
