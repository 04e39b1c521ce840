//! StackMapTable frames

use super::constpool::ConstantPool;
use super::jvm::{JvmType, TypeCategory};
use crate::common::error::Result;

/// Symbolic verification type tracked while a method body is built;
/// class references become pool indices only when the table is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameType {
    Top,
    Integer,
    Float,
    Long,
    Double,
    UninitializedThis,
    /// Internal class name (or array descriptor)
    Object(String),
}

impl FrameType {
    pub fn of(jvm_type: &JvmType) -> Self {
        match jvm_type.category() {
            TypeCategory::Int => FrameType::Integer,
            TypeCategory::Float => FrameType::Float,
            TypeCategory::Long => FrameType::Long,
            TypeCategory::Double => FrameType::Double,
            TypeCategory::Reference | TypeCategory::Void => {
                FrameType::Object(jvm_type.internal_class_name().unwrap_or("java/lang/Object").to_string())
            }
        }
    }

    /// Slots the value occupies in the local variable array
    pub fn width(&self) -> u16 {
        match self {
            FrameType::Long | FrameType::Double => 2,
            _ => 1,
        }
    }

    fn resolve(&self, constant_pool: &mut ConstantPool) -> Result<VerificationType> {
        Ok(match self {
            FrameType::Top => VerificationType::Top,
            FrameType::Integer => VerificationType::Integer,
            FrameType::Float => VerificationType::Float,
            FrameType::Long => VerificationType::Long,
            FrameType::Double => VerificationType::Double,
            FrameType::UninitializedThis => VerificationType::UninitializedThis,
            FrameType::Object(name) => VerificationType::Object(constant_pool.add_class(name)?),
        })
    }
}

/// Compact a per-slot local array into frame entries: the implicit second
/// slot of long/double is dropped, as are trailing unused slots.
pub fn frame_locals(slots: &[FrameType]) -> Vec<FrameType> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < slots.len() {
        let ty = &slots[i];
        out.push(ty.clone());
        i += ty.width() as usize;
    }
    while out.last() == Some(&FrameType::Top) {
        out.pop();
    }
    out
}

/// VerificationTypeInfo as defined in JVMS 4.7.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    UninitializedThis,
    Object(u16), // cpool index to CONSTANT_Class
}

impl VerificationType {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        match self {
            VerificationType::Top => bytes.push(0),
            VerificationType::Integer => bytes.push(1),
            VerificationType::Float => bytes.push(2),
            VerificationType::Double => bytes.push(3),
            VerificationType::Long => bytes.push(4),
            VerificationType::UninitializedThis => bytes.push(6),
            VerificationType::Object(cp_index) => {
                bytes.push(7);
                bytes.extend_from_slice(&cp_index.to_be_bytes());
            }
        }
        bytes
    }
}

/// StackMapFrame variants emitted at branch targets with an empty operand stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMapFrame {
    Same { offset_delta: u16 },
    Full { offset_delta: u16, locals: Vec<VerificationType> },
}

impl StackMapFrame {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        match self {
            StackMapFrame::Same { offset_delta } => {
                if *offset_delta <= 63 {
                    bytes.push(*offset_delta as u8);
                } else {
                    bytes.push(251); // same_frame_extended
                    bytes.extend_from_slice(&offset_delta.to_be_bytes());
                }
            }
            StackMapFrame::Full { offset_delta, locals } => {
                bytes.push(255);
                bytes.extend_from_slice(&offset_delta.to_be_bytes());
                bytes.extend_from_slice(&(locals.len() as u16).to_be_bytes());
                for l in locals {
                    bytes.extend_from_slice(&l.to_bytes());
                }
                // stack is always empty at our branch targets
                bytes.extend_from_slice(&0u16.to_be_bytes());
            }
        }
        bytes
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StackMapTable {
    pub frames: Vec<StackMapFrame>,
}

impl StackMapTable {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.frames.len() as u16).to_be_bytes());
        for f in &self.frames {
            bytes.extend_from_slice(&f.to_bytes());
        }
        bytes
    }

    /// Build the table from branch targets, in increasing pc order.
    ///
    /// Each target carries the compacted locals live at that pc. A frame is
    /// `same` when its locals equal the previous frame's (the implicit
    /// method-entry frame for the first one) and `full` otherwise.
    pub fn build(
        initial_locals: &[FrameType],
        targets: &[(u16, Vec<FrameType>)],
        constant_pool: &mut ConstantPool,
    ) -> Result<Self> {
        let mut table = StackMapTable::default();
        let mut previous_locals = initial_locals.to_vec();
        let mut previous_pc: Option<u16> = None;
        for (pc, locals) in targets {
            let offset_delta = match previous_pc {
                None => *pc,
                Some(prev) if *pc == prev => continue,
                Some(prev) => pc - prev - 1,
            };
            let frame = if *locals == previous_locals {
                StackMapFrame::Same { offset_delta }
            } else {
                let resolved = locals
                    .iter()
                    .map(|l| l.resolve(constant_pool))
                    .collect::<Result<Vec<_>>>()?;
                StackMapFrame::Full { offset_delta, locals: resolved }
            };
            table.frames.push(frame);
            previous_locals = locals.clone();
            previous_pc = Some(*pc);
        }
        Ok(table)
    }
}
