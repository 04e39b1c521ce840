//! Code generation: from resolved AST units to Java class files
//!
//! The class-file structures (`class`, `field`, `method`, `attribute`,
//! `frame`, `constpool`) are plain data serialized by `writer`. Method
//! bodies are described as `sequence::BytecodeSequence` values and emitted
//! through `code::MethodBuilder`. `emitter` guards the lifecycle of one
//! class, and `compilation` lowers whole files.

pub mod attribute;
pub mod class;
pub mod code;
pub mod compilation;
pub mod constpool;
pub mod constraint;
pub mod defs;
pub mod descriptor;
pub mod emitter;
pub mod field;
pub mod flag;
pub mod frame;
pub mod jvm;
pub mod method;
pub mod opcodes;
pub mod sequence;
pub mod writer;

pub use class::{ClassFile, ClassFileDefinition};
pub use code::{CodeOptions, Label, MethodBuilder};
pub use compilation::Compilation;
pub use constpool::{Constant, ConstantPool};
pub use constraint::guard_for;
pub use descriptor::descriptor_of;
pub use emitter::ClassEmitter;
pub use jvm::{
    InvokeKind, JvmConstructorDefinition, JvmFieldDefinition, JvmMethodDefinition, JvmType, TypeCategory,
};
pub use sequence::{BytecodeSequence, Condition};
pub use writer::{class_file_to_bytes, ClassfileWritable};
