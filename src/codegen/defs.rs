//! Generic classfile-specific definitions

/// Header of Java class file (magic number)
pub const MAGIC: u32 = 0xCAFEBABE;

/// Name of a constructor
pub const CONSTRUCTOR_METHOD_NAME: &str = "<init>";

/// Name and descriptor of a program entry point
pub const MAIN_METHOD_NAME: &str = "main";
pub const MAIN_METHOD_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

/// Implicit superclass of every generated class
pub const OBJECT_INTERNAL_NAME: &str = "java/lang/Object";

/// Exception thrown by constraint guards
pub const ILLEGAL_ARGUMENT_EXCEPTION: &str = "java/lang/IllegalArgumentException";

/// Local slot of the receiver in instance methods
pub const LOCALVAR_INDEX_FOR_THIS: u16 = 0;

/// Largest index a constant pool can hand out
pub const MAX_CONSTANT_POOL_INDEX: usize = u16::MAX as usize - 1;

/// Largest code array a method may carry
pub const MAX_CODE_LENGTH: usize = u16::MAX as usize;

/// Parameter slots a method may declare, counting `this` for instance methods
pub const MAX_PARAMETER_SLOTS: u16 = 255;

// Attribute names
pub const CODE_ATTRIBUTE: &str = "Code";
pub const STACK_MAP_TABLE_ATTRIBUTE: &str = "StackMapTable";
pub const SIGNATURE_ATTRIBUTE: &str = "Signature";
