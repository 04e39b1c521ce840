//! Composable instruction sequences
//!
//! A `BytecodeSequence` is a value describing a run of instructions. It is
//! built up front by the lowering code and only touches a method body when
//! `emit` is called with an explicit `MethodBuilder`.

use super::code::MethodBuilder;
use super::defs::LOCALVAR_INDEX_FOR_THIS;
use super::frame::FrameType;
use super::jvm::{JvmConstructorDefinition, JvmFieldDefinition, JvmMethodDefinition, JvmType, TypeCategory};
use super::opcodes;
use crate::common::error::{Error, Result};

/// Condition a guard checks before letting execution continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// int on top of stack is >= 0 (wider numbers are compared with zero first)
    NonNegative,
    /// reference on top of stack is not null
    NonNull,
}

impl Condition {
    /// Branch taken when the condition holds
    pub fn opcode(self) -> u8 {
        match self {
            Condition::NonNegative => opcodes::IFGE,
            Condition::NonNull => opcodes::IFNONNULL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BytecodeSequence {
    NoOp,
    PushIntConst(i32),
    PushStringConst(String),
    PushStaticField(JvmFieldDefinition),
    /// `aload_0`
    PushThis,
    LoadLocal { index: u16, category: TypeCategory },
    /// long/float/double -> int with the same sign
    CompareWithZero(TypeCategory),
    /// objectref -> value
    GetField(JvmFieldDefinition),
    /// objectref, value ->
    PutField(JvmFieldDefinition),
    /// `new`, `dup`, arguments, `invokespecial <init>`; leaves the instance
    NewInvocation { constructor: JvmConstructorDefinition, arguments: Box<BytecodeSequence> },
    /// Receiver and arguments must already be on the stack
    MethodInvocation(JvmMethodDefinition),
    /// `aload_0; invokespecial owner.<init>()V`
    InvokeSuperConstructor { owner: String },
    LocalVarAssignment { index: u16, jvm_type: JvmType },
    /// Run `load`, branch past `failure` when `condition` holds
    Guard { load: Box<BytecodeSequence>, condition: Condition, failure: Box<BytecodeSequence> },
    /// `athrow` of the exception on top of the stack
    Throw,
    Return(TypeCategory),
    Composed(Vec<BytecodeSequence>),
}

impl BytecodeSequence {
    pub fn emit(&self, builder: &mut MethodBuilder<'_>) -> Result<()> {
        match self {
            BytecodeSequence::NoOp => Ok(()),
            BytecodeSequence::PushIntConst(value) => builder.push_int(*value),
            BytecodeSequence::PushStringConst(value) => builder.push_string(value),
            BytecodeSequence::PushStaticField(field) => builder.get_static(field),
            BytecodeSequence::PushThis => builder.load_local(TypeCategory::Reference, LOCALVAR_INDEX_FOR_THIS),
            BytecodeSequence::LoadLocal { index, category } => builder.load_local(*category, *index),
            BytecodeSequence::CompareWithZero(category) => builder.compare_with_zero(*category),
            BytecodeSequence::GetField(field) => builder.get_field(field),
            BytecodeSequence::PutField(field) => builder.put_field(field),
            BytecodeSequence::NewInvocation { constructor, arguments } => {
                builder.new_object(&constructor.owner)?;
                builder.dup()?;
                arguments.emit(builder)?;
                builder.invoke_constructor(&constructor.owner, &constructor.descriptor)
            }
            BytecodeSequence::MethodInvocation(method) => builder.invoke(method),
            BytecodeSequence::InvokeSuperConstructor { owner } => {
                builder.load_local(TypeCategory::Reference, LOCALVAR_INDEX_FOR_THIS)?;
                builder.invoke_constructor(owner, "()V")?;
                builder.initialize_this();
                Ok(())
            }
            BytecodeSequence::LocalVarAssignment { index, jvm_type } => {
                builder.store_local(FrameType::of(jvm_type), jvm_type.category(), *index)
            }
            BytecodeSequence::Guard { load, condition, failure } => {
                if !failure.is_terminal() {
                    return Err(Error::codegen_error("guard failure path must end in a throw or return"));
                }
                let skip = builder.new_label();
                load.emit(builder)?;
                builder.branch(condition.opcode(), skip)?;
                failure.emit(builder)?;
                builder.bind(skip)
            }
            BytecodeSequence::Throw => builder.athrow(),
            BytecodeSequence::Return(category) => builder.return_value(*category),
            BytecodeSequence::Composed(parts) => parts.iter().try_for_each(|p| p.emit(builder)),
        }
    }

    /// Net change in operand-stack slots on the path that falls through.
    /// Terminal sequences report what they consume before leaving.
    pub fn stack_delta(&self) -> Result<i32> {
        Ok(match self {
            BytecodeSequence::NoOp => 0,
            BytecodeSequence::PushIntConst(_) | BytecodeSequence::PushStringConst(_) => 1,
            BytecodeSequence::PushStaticField(field) => field.jvm_type.category().width() as i32,
            BytecodeSequence::PushThis => 1,
            BytecodeSequence::LoadLocal { category, .. } => category.width() as i32,
            BytecodeSequence::CompareWithZero(category) => 1 - category.width() as i32,
            BytecodeSequence::GetField(field) => field.jvm_type.category().width() as i32 - 1,
            BytecodeSequence::PutField(field) => -(field.jvm_type.category().width() as i32) - 1,
            // new + dup + arguments - (arguments + receiver)
            BytecodeSequence::NewInvocation { .. } => 1,
            BytecodeSequence::MethodInvocation(method) => method.stack_delta()?,
            BytecodeSequence::InvokeSuperConstructor { .. } => 0,
            BytecodeSequence::LocalVarAssignment { jvm_type, .. } => -(jvm_type.category().width() as i32),
            BytecodeSequence::Guard { .. } => 0,
            BytecodeSequence::Throw => -1,
            BytecodeSequence::Return(category) => -(category.width() as i32),
            BytecodeSequence::Composed(parts) => {
                let mut total = 0;
                for part in parts {
                    total += part.stack_delta()?;
                }
                total
            }
        })
    }

    /// True when control never falls through the end of this sequence
    pub fn is_terminal(&self) -> bool {
        match self {
            BytecodeSequence::Throw | BytecodeSequence::Return(_) => true,
            BytecodeSequence::Composed(parts) => parts.last().map_or(false, |p| p.is_terminal()),
            _ => false,
        }
    }

    /// Sequence that runs `self` and then `next`
    pub fn then(self, next: BytecodeSequence) -> Self {
        [self, next].into_iter().collect()
    }

    fn into_parts(self) -> Vec<BytecodeSequence> {
        match self {
            BytecodeSequence::NoOp => Vec::new(),
            BytecodeSequence::Composed(parts) => parts,
            other => vec![other],
        }
    }
}

impl FromIterator<BytecodeSequence> for BytecodeSequence {
    /// Flattens nested compositions and drops no-ops
    fn from_iter<I: IntoIterator<Item = BytecodeSequence>>(iter: I) -> Self {
        let mut parts: Vec<_> = iter.into_iter().flat_map(BytecodeSequence::into_parts).collect();
        match parts.len() {
            0 => BytecodeSequence::NoOp,
            1 => parts.remove(0),
            _ => BytecodeSequence::Composed(parts),
        }
    }
}

impl From<Vec<BytecodeSequence>> for BytecodeSequence {
    fn from(parts: Vec<BytecodeSequence>) -> Self {
        parts.into_iter().collect()
    }
}
