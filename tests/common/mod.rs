// Common test utilities: a class-file reader and a small interpreter able to
// run generated constructors, accessors and programs without a JVM.
#![allow(dead_code)]

use std::collections::HashMap;

use turinc::ast::{Constraint, ConstraintSet, PropertyDefinition, TurinFile, TypeDefinition, TypeUsage};
use turinc::ClassFileDefinition;

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// The `MangaCharacter` file: `name: String` and `age: UInt`
pub fn manga_file() -> TurinFile {
    TurinFile::new("manga").with_type(
        TypeDefinition::new("MangaCharacter")
            .with_property(PropertyDefinition::new("name", TypeUsage::reference("String")))
            .with_property(PropertyDefinition::new("age", TypeUsage::reference("UInt"))),
    )
}

/// A property with an explicitly declared constraint set
pub fn constrained(name: &str, type_name: &str, constraints: &[Constraint]) -> PropertyDefinition {
    PropertyDefinition::new(name, TypeUsage::reference(type_name))
        .with_constraints(constraints.iter().copied().collect::<ConstraintSet>())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cp {
    Utf8(String),
    Integer(i32),
    Class(u16),
    String(u16),
    Ref(u16, u16),
    NameAndType(u16, u16),
}

#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<(String, Vec<u8>)>,
}

impl MemberInfo {
    pub fn attribute(&self, name: &str) -> Option<&[u8]> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, data)| data.as_slice())
    }
}

#[derive(Debug, Clone)]
pub struct CodeInfo {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub attributes: Vec<(String, Vec<u8>)>,
}

impl CodeInfo {
    pub fn attribute(&self, name: &str) -> Option<&[u8]> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, data)| data.as_slice())
    }

    /// Raw frame-type bytes of the StackMapTable, one per frame
    pub fn frame_types(&self) -> Vec<u8> {
        let Some(data) = self.attribute("StackMapTable") else {
            return Vec::new();
        };
        let mut r = Reader::new(data);
        let count = r.u2();
        let mut kinds = Vec::new();
        for _ in 0..count {
            let kind = r.u1();
            kinds.push(kind);
            match kind {
                0..=63 => {}
                251 => {
                    r.u2();
                }
                255 => {
                    r.u2();
                    let locals = r.u2();
                    for _ in 0..locals {
                        skip_verification_type(&mut r);
                    }
                    let stack = r.u2();
                    for _ in 0..stack {
                        skip_verification_type(&mut r);
                    }
                }
                other => panic!("unexpected frame type {}", other),
            }
        }
        kinds
    }
}

fn skip_verification_type(r: &mut Reader<'_>) {
    if r.u1() == 7 {
        r.u2();
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
    fn u1(&mut self) -> u8 {
        let v = self.data[self.pos];
        self.pos += 1;
        v
    }
    fn u2(&mut self) -> u16 {
        u16::from_be_bytes([self.u1(), self.u1()])
    }
    fn u4(&mut self) -> u32 {
        u32::from_be_bytes([self.u1(), self.u1(), self.u1(), self.u1()])
    }
    fn bytes(&mut self, n: usize) -> &'a [u8] {
        let data = self.data;
        let s = &data[self.pos..self.pos + n];
        self.pos += n;
        s
    }
    fn done(&self) -> bool {
        self.pos == self.data.len()
    }
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub minor: u16,
    pub major: u16,
    pub access: u16,
    pub this_class: String,
    pub super_class: String,
    pub interfaces: usize,
    pub constants: Vec<Option<Cp>>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<(String, Vec<u8>)>,
}

impl ClassInfo {
    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = Reader::new(bytes);
        assert_eq!(r.u4(), 0xCAFEBABE, "bad magic");
        let minor = r.u2();
        let major = r.u2();
        let count = r.u2();
        let mut constants = vec![None];
        for _ in 1..count {
            let cp = match r.u1() {
                1 => {
                    let len = r.u2() as usize;
                    Cp::Utf8(String::from_utf8_lossy(r.bytes(len)).into_owned())
                }
                3 => Cp::Integer(r.u4() as i32),
                7 => Cp::Class(r.u2()),
                8 => Cp::String(r.u2()),
                9 | 10 | 11 => Cp::Ref(r.u2(), r.u2()),
                12 => Cp::NameAndType(r.u2(), r.u2()),
                tag => panic!("unexpected constant tag {}", tag),
            };
            constants.push(Some(cp));
        }
        let mut info = ClassInfo {
            minor,
            major,
            access: 0,
            this_class: String::new(),
            super_class: String::new(),
            interfaces: 0,
            constants,
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        };
        info.access = r.u2();
        let this_class = r.u2();
        let super_class = r.u2();
        info.this_class = info.class_name(this_class);
        info.super_class = info.class_name(super_class);
        info.interfaces = r.u2() as usize;
        for _ in 0..info.interfaces {
            r.u2();
        }
        let fields = r.u2();
        for _ in 0..fields {
            let member = info.read_member(&mut r);
            info.fields.push(member);
        }
        let methods = r.u2();
        for _ in 0..methods {
            let member = info.read_member(&mut r);
            info.methods.push(member);
        }
        info.attributes = info.read_attributes(&mut r);
        assert!(r.done(), "trailing bytes after class file");
        info
    }

    fn read_member(&self, r: &mut Reader<'_>) -> MemberInfo {
        let access = r.u2();
        let name = self.utf8(r.u2());
        let descriptor = self.utf8(r.u2());
        let attributes = self.read_attributes(r);
        MemberInfo { access, name, descriptor, attributes }
    }

    fn read_attributes(&self, r: &mut Reader<'_>) -> Vec<(String, Vec<u8>)> {
        let count = r.u2();
        (0..count)
            .map(|_| {
                let name = self.utf8(r.u2());
                let len = r.u4() as usize;
                (name, r.bytes(len).to_vec())
            })
            .collect()
    }

    pub fn utf8(&self, index: u16) -> String {
        match &self.constants[index as usize] {
            Some(Cp::Utf8(s)) => s.clone(),
            other => panic!("constant {} is not utf8: {:?}", index, other),
        }
    }

    pub fn class_name(&self, index: u16) -> String {
        match &self.constants[index as usize] {
            Some(Cp::Class(name)) => self.utf8(*name),
            other => panic!("constant {} is not a class: {:?}", index, other),
        }
    }

    /// (owner, name, descriptor) of a field or method reference
    pub fn member_ref(&self, index: u16) -> (String, String, String) {
        match &self.constants[index as usize] {
            Some(Cp::Ref(class, nat)) => match &self.constants[*nat as usize] {
                Some(Cp::NameAndType(name, descriptor)) => {
                    (self.class_name(*class), self.utf8(*name), self.utf8(*descriptor))
                }
                other => panic!("bad name and type {:?}", other),
            },
            other => panic!("constant {} is not a member ref: {:?}", index, other),
        }
    }

    pub fn field(&self, name: &str) -> Option<&MemberInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MemberInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn method_by(&self, name: &str, descriptor: &str) -> Option<&MemberInfo> {
        self.methods.iter().find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn code(&self, method: &MemberInfo) -> CodeInfo {
        let data = method.attribute("Code").expect("method has no Code attribute");
        let mut r = Reader::new(data);
        let max_stack = r.u2();
        let max_locals = r.u2();
        let len = r.u4() as usize;
        let code = r.bytes(len).to_vec();
        assert_eq!(r.u2(), 0, "unexpected exception table");
        let attributes = self.read_attributes(&mut r);
        assert!(r.done());
        CodeInfo { max_stack, max_locals, code, attributes }
    }
}

pub fn parse(artifact: &ClassFileDefinition) -> ClassInfo {
    ClassInfo::parse(artifact.bytecode())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Null,
    Str(String),
    /// Heap object id
    Ref(usize),
    /// A static singleton such as `System.out`
    Static(String),
    /// Second half of a long or double in the locals array
    Top,
}

impl Value {
    fn width(&self) -> usize {
        match self {
            Value::Long(_) | Value::Double(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Object {
    pub class: String,
    pub fields: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Returned(Option<Value>),
    Threw { class: String, message: Option<String> },
}

pub struct Vm {
    classes: HashMap<String, ClassInfo>,
    pub heap: Vec<Object>,
    pub stdout: String,
    /// Instructions executed so far
    pub steps: usize,
}

impl Vm {
    pub fn new(artifacts: &[ClassFileDefinition]) -> Self {
        let classes = artifacts
            .iter()
            .map(|a| {
                let info = parse(a);
                (info.this_class.clone(), info)
            })
            .collect();
        Self { classes, heap: Vec::new(), stdout: String::new(), steps: 0 }
    }

    pub fn class(&self, internal_name: &str) -> &ClassInfo {
        self.classes.get(internal_name).unwrap_or_else(|| panic!("class {} not loaded", internal_name))
    }

    fn alloc(&mut self, class: &str) -> usize {
        self.heap.push(Object { class: class.to_string(), fields: HashMap::new() });
        self.heap.len() - 1
    }

    pub fn object(&self, reference: &Value) -> &Object {
        match reference {
            Value::Ref(id) => &self.heap[*id],
            other => panic!("not an object: {:?}", other),
        }
    }

    /// `new C(args)`: the allocated reference and how the constructor ended
    pub fn construct(&mut self, class: &str, descriptor: &str, args: Vec<Value>) -> (Value, Outcome) {
        let id = self.alloc(class);
        let mut receiver_and_args = vec![Value::Ref(id)];
        receiver_and_args.extend(args);
        let outcome = self.invoke(class, "<init>", descriptor, receiver_and_args);
        (Value::Ref(id), outcome)
    }

    pub fn call(&mut self, receiver: &Value, name: &str, descriptor: &str, args: Vec<Value>) -> Outcome {
        let class = self.object(receiver).class.clone();
        let mut receiver_and_args = vec![receiver.clone()];
        receiver_and_args.extend(args);
        self.invoke(&class, name, descriptor, receiver_and_args)
    }

    pub fn run_main(&mut self, class: &str) -> Outcome {
        self.invoke(class, "main", "([Ljava/lang/String;)V", vec![Value::Null])
    }

    /// Run a method of a loaded class. `args` includes the receiver for
    /// instance methods.
    pub fn invoke(&mut self, class: &str, name: &str, descriptor: &str, args: Vec<Value>) -> Outcome {
        let info = self.class(class).clone();
        let method = info
            .method_by(name, descriptor)
            .unwrap_or_else(|| panic!("no method {}.{}{}", class, name, descriptor))
            .clone();
        let code = info.code(&method);

        let mut locals: Vec<Value> = Vec::new();
        for arg in args {
            let wide = arg.width() == 2;
            locals.push(arg);
            if wide {
                locals.push(Value::Top);
            }
        }
        assert!(locals.len() <= code.max_locals as usize, "arguments exceed max_locals");
        locals.resize(code.max_locals as usize, Value::Top);

        let mut stack: Vec<Value> = Vec::new();
        let mut pc = 0usize;
        let c = &code.code;
        loop {
            self.steps += 1;
            assert!(self.steps < 100_000, "runaway execution");
            let depth: usize = stack.iter().map(Value::width).sum();
            assert!(depth <= code.max_stack as usize, "stack depth {} exceeds max_stack {}", depth, code.max_stack);

            let op = c[pc];
            let u2 = |at: usize| u16::from_be_bytes([c[at], c[at + 1]]);
            match op {
                0x02..=0x08 => {
                    stack.push(Value::Int(op as i32 - 3));
                    pc += 1;
                }
                0x09 => {
                    stack.push(Value::Long(0));
                    pc += 1;
                }
                0x0b => {
                    stack.push(Value::Float(0.0));
                    pc += 1;
                }
                0x0e => {
                    stack.push(Value::Double(0.0));
                    pc += 1;
                }
                0x10 => {
                    stack.push(Value::Int(c[pc + 1] as i8 as i32));
                    pc += 2;
                }
                0x11 => {
                    stack.push(Value::Int(u2(pc + 1) as i16 as i32));
                    pc += 3;
                }
                0x12 | 0x13 => {
                    let (index, len) = if op == 0x12 { (c[pc + 1] as u16, 2) } else { (u2(pc + 1), 3) };
                    stack.push(match &info.constants[index as usize] {
                        Some(Cp::Integer(v)) => Value::Int(*v),
                        Some(Cp::String(s)) => Value::Str(info.utf8(*s)),
                        other => panic!("unsupported ldc constant {:?}", other),
                    });
                    pc += len;
                }
                0x15..=0x19 => {
                    stack.push(locals[c[pc + 1] as usize].clone());
                    pc += 2;
                }
                0x1a..=0x2d => {
                    let index = ((op - 0x1a) % 4) as usize;
                    stack.push(locals[index].clone());
                    pc += 1;
                }
                0x36..=0x3a => {
                    let value = stack.pop().expect("store from empty stack");
                    locals[c[pc + 1] as usize] = value;
                    pc += 2;
                }
                0x3b..=0x4e => {
                    let index = ((op - 0x3b) % 4) as usize;
                    locals[index] = stack.pop().expect("store from empty stack");
                    pc += 1;
                }
                0xc4 => {
                    let inner = c[pc + 1];
                    let index = u2(pc + 2) as usize;
                    match inner {
                        0x15..=0x19 => stack.push(locals[index].clone()),
                        0x36..=0x3a => locals[index] = stack.pop().expect("store from empty stack"),
                        other => panic!("unsupported wide opcode {:#x}", other),
                    }
                    pc += 4;
                }
                0x59 => {
                    let top = stack.last().expect("dup on empty stack").clone();
                    stack.push(top);
                    pc += 1;
                }
                0x94 | 0x95 | 0x97 => {
                    let right = stack.pop().expect("compare on empty stack");
                    let left = stack.pop().expect("compare on empty stack");
                    // fcmpl/dcmpl push -1 for NaN
                    let ordering = match (&left, &right) {
                        (Value::Long(a), Value::Long(b)) => a.partial_cmp(b),
                        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
                        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
                        other => panic!("bad compare operands {:?}", other),
                    };
                    stack.push(Value::Int(ordering.map_or(-1, |o| o as i32)));
                    pc += 1;
                }
                0x9c | 0xc7 => {
                    let value = stack.pop().expect("branch on empty stack");
                    let taken = match (op, &value) {
                        (0x9c, Value::Int(v)) => *v >= 0,
                        (0xc7, Value::Null) => false,
                        (0xc7, _) => true,
                        other => panic!("bad branch operand {:?}", other),
                    };
                    if taken {
                        pc = (pc as isize + u2(pc + 1) as i16 as isize) as usize;
                    } else {
                        pc += 3;
                    }
                }
                0xac..=0xb0 => {
                    let value = stack.pop().expect("return from empty stack");
                    assert!(stack.is_empty(), "stack not balanced at return: {:?}", stack);
                    return Outcome::Returned(Some(value));
                }
                0xb1 => {
                    assert!(stack.is_empty(), "stack not balanced at return: {:?}", stack);
                    return Outcome::Returned(None);
                }
                0xb2 => {
                    let (owner, name, _) = info.member_ref(u2(pc + 1));
                    stack.push(match (owner.as_str(), name.as_str()) {
                        ("java/lang/Integer", "MAX_VALUE") => Value::Int(i32::MAX),
                        ("java/lang/Integer", "MIN_VALUE") => Value::Int(i32::MIN),
                        _ => Value::Static(format!("{}.{}", owner, name)),
                    });
                    pc += 3;
                }
                0xb4 => {
                    let (_, name, _) = info.member_ref(u2(pc + 1));
                    let receiver = stack.pop().expect("getfield without receiver");
                    let value = self.object(&receiver).fields.get(&name).cloned().unwrap_or(Value::Null);
                    stack.push(value);
                    pc += 3;
                }
                0xb5 => {
                    let (_, name, _) = info.member_ref(u2(pc + 1));
                    let value = stack.pop().expect("putfield without value");
                    let receiver = stack.pop().expect("putfield without receiver");
                    match receiver {
                        Value::Ref(id) => {
                            self.heap[id].fields.insert(name, value);
                        }
                        other => panic!("putfield on {:?}", other),
                    }
                    pc += 3;
                }
                0xb6 | 0xb7 | 0xb8 => {
                    let (owner, name, descriptor) = info.member_ref(u2(pc + 1));
                    let argc = parameter_count(&descriptor);
                    let mut call_args = stack.split_off(stack.len() - argc);
                    if op != 0xb8 {
                        call_args.insert(0, stack.pop().expect("invoke without receiver"));
                    }
                    let outcome = if self.classes.contains_key(&owner) {
                        self.invoke(&owner, &name, &descriptor, call_args)
                    } else {
                        self.library_call(&owner, &name, &descriptor, call_args)
                    };
                    match outcome {
                        Outcome::Returned(Some(value)) => stack.push(value),
                        Outcome::Returned(None) => {}
                        thrown => return thrown,
                    }
                    pc += 3;
                }
                0xbb => {
                    let class = info.class_name(u2(pc + 1));
                    let id = self.alloc(&class);
                    stack.push(Value::Ref(id));
                    pc += 3;
                }
                0xbf => {
                    let exception = stack.pop().expect("athrow on empty stack");
                    let object = self.object(&exception).clone();
                    let message = match object.fields.get("message") {
                        Some(Value::Str(s)) => Some(s.clone()),
                        _ => None,
                    };
                    return Outcome::Threw { class: object.class, message };
                }
                other => panic!("unsupported opcode {:#x} at pc {} in {}.{}", other, pc, class, name),
            }
        }
    }

    fn library_call(&mut self, owner: &str, name: &str, descriptor: &str, args: Vec<Value>) -> Outcome {
        let returned = match (owner, name, args.as_slice()) {
            ("java/lang/Object", "<init>", [_]) => None,
            ("java/lang/IllegalArgumentException", "<init>", [Value::Ref(id), message]) => {
                self.heap[*id].fields.insert("message".to_string(), message.clone());
                None
            }
            ("java/io/PrintStream", "println", [_, value]) => {
                let text = self.render(value);
                self.stdout.push_str(&text);
                self.stdout.push('\n');
                None
            }
            ("java/io/PrintStream", "println", [_]) => {
                self.stdout.push('\n');
                None
            }
            ("java/io/PrintStream", "print", [_, value]) => {
                let text = self.render(value);
                self.stdout.push_str(&text);
                None
            }
            ("java/lang/String", "length", [Value::Str(s)]) => Some(Value::Int(s.chars().count() as i32)),
            ("java/lang/String", "concat", [Value::Str(a), Value::Str(b)]) => Some(Value::Str(format!("{}{}", a, b))),
            ("java/lang/Integer", "toString", [Value::Int(v)]) | ("java/lang/String", "valueOf", [Value::Int(v)]) => {
                Some(Value::Str(v.to_string()))
            }
            ("java/lang/Math", "abs", [Value::Int(v)]) => Some(Value::Int(v.abs())),
            _ => panic!("unsupported library call {}.{}{} with {:?}", owner, name, descriptor, args),
        };
        Outcome::Returned(returned)
    }

    fn render(&self, value: &Value) -> String {
        match value {
            Value::Int(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Str(s) => s.clone(),
            Value::Null => "null".to_string(),
            Value::Ref(id) => format!("{}@{}", self.heap[*id].class.replace('/', "."), id),
            other => format!("{:?}", other),
        }
    }
}

/// Number of parameters (not slots) in a method descriptor
pub fn parameter_count(descriptor: &str) -> usize {
    let params = &descriptor[1..descriptor.find(')').expect("method descriptor")];
    let bytes = params.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        while bytes[i] == b'[' {
            i += 1;
        }
        if bytes[i] == b'L' {
            while bytes[i] != b';' {
                i += 1;
            }
        }
        i += 1;
        count += 1;
    }
    count
}
