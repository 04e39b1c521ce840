//! Constant pool and constants for Java class files
//!
//! Entries are interned: asking twice for the same constant yields the same
//! index, and indices are handed out in first-request order so identical
//! inputs always produce identical pools.

use std::collections::HashMap;

use super::defs::MAX_CONSTANT_POOL_INDEX;
use crate::common::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
}

pub(crate) mod constant_tags {
    pub const CONSTANT_UTF8: u8 = 1;
    pub const CONSTANT_INTEGER: u8 = 3;
    pub const CONSTANT_CLASS: u8 = 7;
    pub const CONSTANT_STRING: u8 = 8;
    pub const CONSTANT_FIELDREF: u8 = 9;
    pub const CONSTANT_METHODREF: u8 = 10;
    pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
    pub const CONSTANT_NAMEANDTYPE: u8 = 12;
}

/// Encode a string in the JVM's modified UTF-8: NUL becomes `C0 80` and
/// supplementary characters are written as surrogate pairs.
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct ConstantPool {
    pub(crate) constants: Vec<Constant>,
    lookup: HashMap<Constant, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries (the class file writes `len() + 1`)
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Entry at a 1-based pool index
    pub fn get(&self, index: u16) -> Option<&Constant> {
        (index as usize).checked_sub(1).and_then(|i| self.constants.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.constants.iter()
    }

    fn intern(&mut self, constant: Constant) -> Result<u16> {
        if let Some(&index) = self.lookup.get(&constant) {
            return Ok(index);
        }
        if self.constants.len() >= MAX_CONSTANT_POOL_INDEX {
            return Err(Error::codegen_error("constant pool is out of space"));
        }
        self.constants.push(constant.clone());
        let index = self.constants.len() as u16;
        self.lookup.insert(constant, index);
        Ok(index)
    }

    pub fn add_utf8(&mut self, value: &str) -> Result<u16> {
        if encode_modified_utf8(value).len() > u16::MAX as usize {
            return Err(Error::codegen_error(format!(
                "string constant of {} bytes exceeds the class-file limit",
                value.len()
            )));
        }
        self.intern(Constant::Utf8(value.to_string()))
    }

    pub fn add_integer(&mut self, value: i32) -> Result<u16> {
        self.intern(Constant::Integer(value))
    }

    pub fn add_class(&mut self, internal_name: &str) -> Result<u16> {
        let name_index = self.add_utf8(internal_name)?;
        self.intern(Constant::Class(name_index))
    }

    pub fn add_string(&mut self, value: &str) -> Result<u16> {
        let utf8_index = self.add_utf8(value)?;
        self.intern(Constant::String(utf8_index))
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.intern(Constant::NameAndType(name_index, descriptor_index))
    }

    pub fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.intern(Constant::FieldRef(class_index, name_and_type_index))
    }

    pub fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.intern(Constant::MethodRef(class_index, name_and_type_index))
    }

    pub fn add_interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.intern(Constant::InterfaceMethodRef(class_index, name_and_type_index))
    }
}
