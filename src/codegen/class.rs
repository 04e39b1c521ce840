//! Core classfile structures: ClassFile and the emitted artifact

use super::attribute::NamedAttribute;
use super::constpool::ConstantPool;
use super::defs::MAGIC;
use super::field::FieldInfo;
use super::method::MethodInfo;

#[derive(Debug)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<NamedAttribute>,
}

impl ClassFile {
    pub fn new(major_version: u16) -> Self {
        Self {
            magic: MAGIC,
            minor_version: 0,
            major_version,
            constant_pool: ConstantPool::new(),
            access_flags: 0,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

/// A finished class: its qualified name (`manga.MangaCharacter`) and the
/// serialized class-file bytes. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFileDefinition {
    name: String,
    bytecode: Vec<u8>,
}

impl ClassFileDefinition {
    pub fn new(name: impl Into<String>, bytecode: Vec<u8>) -> Self {
        Self { name: name.into(), bytecode }
    }

    /// Dot-separated qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    pub fn into_bytecode(self) -> Vec<u8> {
        self.bytecode
    }
}
