//! Attributes attached to classes, fields, methods and Code

use super::constpool::ConstantPool;
use super::defs::{CODE_ATTRIBUTE, SIGNATURE_ATTRIBUTE, STACK_MAP_TABLE_ATTRIBUTE};
use super::frame::StackMapTable;
use crate::common::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeInfo {
    Code(CodeAttribute),
    StackMapTable(StackMapTable),
    Signature { signature_index: u16 },
}

impl AttributeInfo {
    /// Attribute payload, without the name index and length prefix
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            AttributeInfo::Code(code) => code.to_bytes(),
            AttributeInfo::StackMapTable(table) => table.to_bytes(),
            AttributeInfo::Signature { signature_index } => signature_index.to_be_bytes().to_vec(),
        }
    }
}

/// An attribute together with its interned name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedAttribute {
    pub name_index: u16,
    pub info: AttributeInfo,
}

impl NamedAttribute {
    pub fn new_code_attribute(constant_pool: &mut ConstantPool, code: CodeAttribute) -> Result<Self> {
        Ok(Self { name_index: constant_pool.add_utf8(CODE_ATTRIBUTE)?, info: AttributeInfo::Code(code) })
    }

    pub fn new_stack_map_table(constant_pool: &mut ConstantPool, table: StackMapTable) -> Result<Self> {
        Ok(Self {
            name_index: constant_pool.add_utf8(STACK_MAP_TABLE_ATTRIBUTE)?,
            info: AttributeInfo::StackMapTable(table),
        })
    }

    pub fn new_signature(constant_pool: &mut ConstantPool, signature: &str) -> Result<Self> {
        let name_index = constant_pool.add_utf8(SIGNATURE_ATTRIBUTE)?;
        let signature_index = constant_pool.add_utf8(signature)?;
        Ok(Self { name_index, info: AttributeInfo::Signature { signature_index } })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = self.info.to_bytes();
        let mut bytes = Vec::with_capacity(payload.len() + 6);
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&payload);
        bytes
    }
}

/// Code attribute. Generated methods never declare exception handlers,
/// so the exception table is always written empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub attributes: Vec<NamedAttribute>,
}

impl CodeAttribute {
    pub fn new(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Self {
        Self { max_stack, max_locals, code, attributes: Vec::new() }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.max_stack.to_be_bytes());
        bytes.extend_from_slice(&self.max_locals.to_be_bytes());
        bytes.extend_from_slice(&(self.code.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.code);
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            bytes.extend_from_slice(&attribute.to_bytes());
        }
        bytes
    }
}
