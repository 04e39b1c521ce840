//! Java bytecode instruction opcodes used by the emitter
//!
//! Values are defined according to the Java Virtual Machine Specification
//! and ordered by opcode value.

// 0x00 - 0x14: Constants
pub const ICONST_M1: u8 = 0x02;
pub const ICONST_0: u8 = 0x03;
pub const ICONST_5: u8 = 0x08;
pub const LCONST_0: u8 = 0x09;
pub const FCONST_0: u8 = 0x0b;
pub const DCONST_0: u8 = 0x0e;
pub const BIPUSH: u8 = 0x10;
pub const SIPUSH: u8 = 0x11;
pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;

// 0x15 - 0x2D: Loads
pub const ILOAD: u8 = 0x15;
pub const LLOAD: u8 = 0x16;
pub const FLOAD: u8 = 0x17;
pub const DLOAD: u8 = 0x18;
pub const ALOAD: u8 = 0x19;
pub const ILOAD_0: u8 = 0x1a;
pub const ALOAD_0: u8 = 0x2a;

// 0x36 - 0x4E: Stores
pub const ISTORE: u8 = 0x36;
pub const LSTORE: u8 = 0x37;
pub const FSTORE: u8 = 0x38;
pub const DSTORE: u8 = 0x39;
pub const ASTORE: u8 = 0x3a;
pub const ISTORE_0: u8 = 0x3b;

// 0x59: Stack operations
pub const DUP: u8 = 0x59;

// 0x94 - 0x9C: Comparisons and branches
pub const LCMP: u8 = 0x94;
pub const FCMPL: u8 = 0x95;
pub const DCMPL: u8 = 0x97;
pub const IFGE: u8 = 0x9c;

// 0xAC - 0xB1: Returns
pub const IRETURN: u8 = 0xac;
pub const LRETURN: u8 = 0xad;
pub const FRETURN: u8 = 0xae;
pub const DRETURN: u8 = 0xaf;
pub const ARETURN: u8 = 0xb0;
pub const RETURN: u8 = 0xb1;

// 0xB2 - 0xBA: Field access and invocation
pub const GETSTATIC: u8 = 0xb2;
pub const GETFIELD: u8 = 0xb4;
pub const PUTFIELD: u8 = 0xb5;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;

// 0xBB - 0xC7: Objects, exceptions, extended
pub const NEW: u8 = 0xbb;
pub const ATHROW: u8 = 0xbf;
pub const WIDE: u8 = 0xc4;
pub const IFNONNULL: u8 = 0xc7;

/// Short-form load (`xload_<n>`) for a typed load opcode and slot 0..=3
pub fn short_load(op: u8, index: u16) -> Option<u8> {
    (index <= 3 && (ILOAD..=ALOAD).contains(&op)).then(|| ILOAD_0 + (op - ILOAD) * 4 + index as u8)
}

/// Short-form store (`xstore_<n>`) for a typed store opcode and slot 0..=3
pub fn short_store(op: u8, index: u16) -> Option<u8> {
    (index <= 3 && (ISTORE..=ASTORE).contains(&op)).then(|| ISTORE_0 + (op - ISTORE) * 4 + index as u8)
}

/// Mnemonic used when tracing emission
pub fn mnemonic(op: u8) -> &'static str {
    match op {
        ICONST_M1..=ICONST_5 => "iconst",
        LCONST_0 => "lconst_0",
        FCONST_0 => "fconst_0",
        DCONST_0 => "dconst_0",
        BIPUSH => "bipush",
        SIPUSH => "sipush",
        LDC => "ldc",
        LDC_W => "ldc_w",
        ILOAD => "iload",
        LLOAD => "lload",
        FLOAD => "fload",
        DLOAD => "dload",
        ALOAD => "aload",
        0x1a..=0x2d => "load_n",
        ISTORE => "istore",
        LSTORE => "lstore",
        FSTORE => "fstore",
        DSTORE => "dstore",
        ASTORE => "astore",
        0x3b..=0x4e => "store_n",
        DUP => "dup",
        LCMP => "lcmp",
        FCMPL => "fcmpl",
        DCMPL => "dcmpl",
        IFGE => "ifge",
        IRETURN => "ireturn",
        LRETURN => "lreturn",
        FRETURN => "freturn",
        DRETURN => "dreturn",
        ARETURN => "areturn",
        RETURN => "return",
        GETSTATIC => "getstatic",
        GETFIELD => "getfield",
        PUTFIELD => "putfield",
        INVOKEVIRTUAL => "invokevirtual",
        INVOKESPECIAL => "invokespecial",
        INVOKESTATIC => "invokestatic",
        INVOKEINTERFACE => "invokeinterface",
        NEW => "new",
        ATHROW => "athrow",
        WIDE => "wide",
        IFNONNULL => "ifnonnull",
        _ => "?",
    }
}
