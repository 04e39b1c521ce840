//! JVM-level definitions handed out by the resolver and consumed by emission

use super::opcodes;
use crate::common::error::{Error, Result};

/// Convert a dot-separated qualified name to its internal form (`a.b.C` -> `a/b/C`)
pub fn canonical_to_internal(name: &str) -> String {
    name.replace('.', "/")
}

/// Storage-width category of a value; decides the opcode family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// boolean, byte, short, char, int
    Int,
    Long,
    Float,
    Double,
    Reference,
    Void,
}

impl TypeCategory {
    /// Category of a field or return descriptor
    pub fn from_descriptor(descriptor: &str) -> Result<Self> {
        match descriptor.as_bytes().first() {
            Some(b'Z' | b'B' | b'S' | b'C' | b'I') => Ok(TypeCategory::Int),
            Some(b'J') => Ok(TypeCategory::Long),
            Some(b'F') => Ok(TypeCategory::Float),
            Some(b'D') => Ok(TypeCategory::Double),
            Some(b'L' | b'[') => Ok(TypeCategory::Reference),
            Some(b'V') => Ok(TypeCategory::Void),
            _ => Err(Error::codegen_error(format!("invalid type descriptor `{}`", descriptor))),
        }
    }

    /// Number of local-variable / operand-stack slots a value occupies
    pub fn width(self) -> u16 {
        match self {
            TypeCategory::Long | TypeCategory::Double => 2,
            TypeCategory::Void => 0,
            _ => 1,
        }
    }

    pub fn load_op(self) -> Result<u8> {
        match self {
            TypeCategory::Int => Ok(opcodes::ILOAD),
            TypeCategory::Long => Ok(opcodes::LLOAD),
            TypeCategory::Float => Ok(opcodes::FLOAD),
            TypeCategory::Double => Ok(opcodes::DLOAD),
            TypeCategory::Reference => Ok(opcodes::ALOAD),
            TypeCategory::Void => Err(Error::codegen_error("cannot load a void value")),
        }
    }

    pub fn store_op(self) -> Result<u8> {
        match self {
            TypeCategory::Int => Ok(opcodes::ISTORE),
            TypeCategory::Long => Ok(opcodes::LSTORE),
            TypeCategory::Float => Ok(opcodes::FSTORE),
            TypeCategory::Double => Ok(opcodes::DSTORE),
            TypeCategory::Reference => Ok(opcodes::ASTORE),
            TypeCategory::Void => Err(Error::codegen_error("cannot store a void value")),
        }
    }

    pub fn return_op(self) -> u8 {
        match self {
            TypeCategory::Int => opcodes::IRETURN,
            TypeCategory::Long => opcodes::LRETURN,
            TypeCategory::Float => opcodes::FRETURN,
            TypeCategory::Double => opcodes::DRETURN,
            TypeCategory::Reference => opcodes::ARETURN,
            TypeCategory::Void => opcodes::RETURN,
        }
    }
}

/// A type as seen by the JVM: erased descriptor plus generic signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JvmType {
    descriptor: String,
    signature: String,
}

impl JvmType {
    pub fn new(descriptor: impl Into<String>) -> Self {
        let descriptor = descriptor.into();
        Self { signature: descriptor.clone(), descriptor }
    }

    pub fn with_signature(descriptor: impl Into<String>, signature: impl Into<String>) -> Self {
        Self { descriptor: descriptor.into(), signature: signature.into() }
    }

    pub fn void() -> Self {
        Self::new("V")
    }

    /// Reference type for a dot-separated class name
    pub fn object(qualified_name: &str) -> Self {
        Self::new(format!("L{};", canonical_to_internal(qualified_name)))
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// True when the signature carries generic information the descriptor lacks
    pub fn is_generic(&self) -> bool {
        self.signature != self.descriptor
    }

    pub fn category(&self) -> TypeCategory {
        // Descriptors are built by this crate or checked by the resolver
        TypeCategory::from_descriptor(&self.descriptor).unwrap_or(TypeCategory::Reference)
    }

    pub fn is_void(&self) -> bool {
        self.descriptor == "V"
    }

    /// Internal class name for a reference descriptor (`Ljava/lang/String;` -> `java/lang/String`,
    /// arrays keep their descriptor form)
    pub fn internal_class_name(&self) -> Option<&str> {
        let d = self.descriptor.as_str();
        if d.starts_with('L') && d.ends_with(';') {
            Some(&d[1..d.len() - 1])
        } else if d.starts_with('[') {
            Some(d)
        } else {
            None
        }
    }
}

/// Split a method descriptor into parameter descriptors and return descriptor
pub fn parse_method_descriptor(descriptor: &str) -> Result<(Vec<String>, String)> {
    let invalid = || Error::codegen_error(format!("invalid method descriptor `{}`", descriptor));
    let rest = descriptor.strip_prefix('(').ok_or_else(invalid)?;
    let close = rest.find(')').ok_or_else(invalid)?;
    let (params, ret) = (&rest[..close], &rest[close + 1..]);

    let bytes = params.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        while bytes[i] == b'[' {
            i += 1;
            if i >= bytes.len() {
                return Err(invalid());
            }
        }
        match bytes[i] {
            b'Z' | b'B' | b'S' | b'C' | b'I' | b'J' | b'F' | b'D' => i += 1,
            b'L' => {
                let end = params[i..].find(';').ok_or_else(invalid)?;
                i += end + 1;
            }
            _ => return Err(invalid()),
        }
        out.push(params[start..i].to_string());
    }
    TypeCategory::from_descriptor(ret).map_err(|_| invalid())?;
    Ok((out, ret.to_string()))
}

/// Build a method descriptor from parameter and return types
pub fn method_descriptor(params: &[JvmType], ret: &JvmType) -> JvmType {
    let descriptor = format!(
        "({}){}",
        params.iter().map(|p| p.descriptor()).collect::<String>(),
        ret.descriptor()
    );
    let signature = format!(
        "({}){}",
        params.iter().map(|p| p.signature()).collect::<String>(),
        ret.signature()
    );
    JvmType::with_signature(descriptor, signature)
}

fn slots_of(descriptors: &[String]) -> i32 {
    descriptors
        .iter()
        .map(|d| TypeCategory::from_descriptor(d).map(|c| c.width() as i32).unwrap_or(1))
        .sum()
}

/// A field owned by some class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JvmFieldDefinition {
    /// Internal name of the owner (`java/lang/System`)
    pub owner: String,
    pub name: String,
    pub jvm_type: JvmType,
    pub is_static: bool,
}

impl JvmFieldDefinition {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, jvm_type: JvmType, is_static: bool) -> Self {
        Self { owner: owner.into(), name: name.into(), jvm_type, is_static }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Static,
    Special,
    Interface,
}

impl InvokeKind {
    pub fn opcode(self) -> u8 {
        match self {
            InvokeKind::Virtual => opcodes::INVOKEVIRTUAL,
            InvokeKind::Static => opcodes::INVOKESTATIC,
            InvokeKind::Special => opcodes::INVOKESPECIAL,
            InvokeKind::Interface => opcodes::INVOKEINTERFACE,
        }
    }

    pub fn has_receiver(self) -> bool {
        self != InvokeKind::Static
    }
}

/// Call target resolved for a function call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JvmMethodDefinition {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub kind: InvokeKind,
}

impl JvmMethodDefinition {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>, kind: InvokeKind) -> Self {
        Self { owner: owner.into(), name: name.into(), descriptor: descriptor.into(), kind }
    }

    pub fn parameter_descriptors(&self) -> Result<Vec<String>> {
        parse_method_descriptor(&self.descriptor).map(|(params, _)| params)
    }

    pub fn return_type(&self) -> Result<JvmType> {
        parse_method_descriptor(&self.descriptor).map(|(_, ret)| JvmType::new(ret))
    }

    pub fn returns_value(&self) -> bool {
        !self.descriptor.ends_with(")V")
    }

    /// Net operand-stack effect in slots: -arguments, -receiver, +result
    pub fn stack_delta(&self) -> Result<i32> {
        let (params, ret) = parse_method_descriptor(&self.descriptor)?;
        let receiver = if self.kind.has_receiver() { 1 } else { 0 };
        let result = TypeCategory::from_descriptor(&ret)?.width() as i32;
        Ok(result - slots_of(&params) - receiver)
    }
}

/// Constructor target of a creation expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JvmConstructorDefinition {
    /// Internal name of the class being instantiated
    pub owner: String,
    pub descriptor: String,
}

impl JvmConstructorDefinition {
    pub fn new(owner: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self { owner: owner.into(), descriptor: descriptor.into() }
    }

    pub fn parameter_descriptors(&self) -> Result<Vec<String>> {
        parse_method_descriptor(&self.descriptor).map(|(params, _)| params)
    }

    /// Slots consumed by the constructor arguments
    pub fn argument_slots(&self) -> Result<i32> {
        Ok(slots_of(&self.parameter_descriptors()?))
    }

    /// Type of the instance the constructor produces
    pub fn instance_type(&self) -> JvmType {
        JvmType::new(format!("L{};", self.owner))
    }
}
