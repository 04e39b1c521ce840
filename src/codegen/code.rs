//! Per-method code buffer
//!
//! `MethodBuilder` owns the bytes of one method body while borrowing the
//! class's constant pool. It tracks operand-stack depth (for `max_stack`),
//! the local variable array (for `max_locals` and frames) and forward branch
//! labels, and turns branch targets into a StackMapTable when asked to.

use log::trace;

use super::attribute::{CodeAttribute, NamedAttribute};
use super::constpool::ConstantPool;
use super::defs::{CONSTRUCTOR_METHOD_NAME, MAX_CODE_LENGTH};
use super::frame::{frame_locals, FrameType, StackMapTable};
use super::jvm::{InvokeKind, JvmFieldDefinition, JvmMethodDefinition, TypeCategory};
use super::opcodes::{self, mnemonic, short_load, short_store};
use crate::common::error::{Error, Result};

/// A forward branch target inside one method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Debug, Default)]
struct LabelState {
    pc: Option<u16>,
    /// Positions of branch opcodes jumping here
    fixups: Vec<usize>,
    /// Locals live at the branch sites
    locals: Option<Vec<FrameType>>,
}

/// Options that shape the emitted Code attribute
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeOptions {
    pub emit_frames: bool,
    pub debug: bool,
}

#[derive(Debug)]
pub struct MethodBuilder<'p> {
    constant_pool: &'p mut ConstantPool,
    this_class: String,
    code: Vec<u8>,
    stack: u16,
    max_stack: u16,
    /// Verification type per local slot; wide values own a trailing Top
    locals: Vec<FrameType>,
    initial_locals: Vec<FrameType>,
    max_locals: u16,
    labels: Vec<LabelState>,
    alive: bool,
    options: CodeOptions,
}

impl<'p> MethodBuilder<'p> {
    /// Start a method body. `parameters` lists the incoming locals in slot
    /// order (receiver first for instance methods), one entry per value.
    pub fn new(
        constant_pool: &'p mut ConstantPool,
        this_class: impl Into<String>,
        parameters: &[FrameType],
        options: CodeOptions,
    ) -> Self {
        let mut locals = Vec::new();
        for p in parameters {
            locals.push(p.clone());
            if p.width() == 2 {
                locals.push(FrameType::Top);
            }
        }
        let max_locals = locals.len() as u16;
        Self {
            constant_pool,
            this_class: this_class.into(),
            code: Vec::new(),
            stack: 0,
            max_stack: 0,
            initial_locals: frame_locals(&locals),
            locals,
            max_locals,
            labels: Vec::new(),
            alive: true,
            options,
        }
    }

    pub fn constant_pool(&mut self) -> &mut ConstantPool {
        &mut *self.constant_pool
    }

    /// Current bytecode offset
    pub fn pc(&self) -> usize {
        self.code.len()
    }

    pub fn stack_depth(&self) -> u16 {
        self.stack
    }

    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    fn adjust_stack(&mut self, delta: i32) -> Result<()> {
        let depth = self.stack as i32 + delta;
        if depth < 0 {
            return Err(Error::codegen_error(format!(
                "operand stack underflow at pc {} (depth {}, delta {})",
                self.pc(),
                self.stack,
                delta
            )));
        }
        self.stack = depth as u16;
        self.max_stack = self.max_stack.max(self.stack);
        Ok(())
    }

    /// Emit an opcode and apply its stack effect
    fn emitop(&mut self, op: u8, delta: i32) -> Result<()> {
        if !self.alive {
            return Err(Error::codegen_error(format!(
                "unreachable `{}` after a terminal instruction",
                mnemonic(op)
            )));
        }
        if self.options.debug {
            trace!("{:>5}: {} (stack {} -> {})", self.pc(), mnemonic(op), self.stack, self.stack as i32 + delta);
        }
        self.code.push(op);
        self.adjust_stack(delta)
    }

    fn emit1(&mut self, od: u8) {
        self.code.push(od);
    }

    fn emit2(&mut self, od: u16) {
        self.code.extend_from_slice(&od.to_be_bytes());
    }

    fn mark_dead(&mut self) {
        self.alive = false;
        self.stack = 0;
    }

    /// Push an int constant with the shortest encoding
    pub fn push_int(&mut self, value: i32) -> Result<()> {
        match value {
            -1..=5 => self.emitop((opcodes::ICONST_0 as i32 + value) as u8, 1),
            -128..=127 => {
                self.emitop(opcodes::BIPUSH, 1)?;
                self.emit1(value as i8 as u8);
                Ok(())
            }
            -32768..=32767 => {
                self.emitop(opcodes::SIPUSH, 1)?;
                self.emit2(value as i16 as u16);
                Ok(())
            }
            _ => {
                let index = self.constant_pool.add_integer(value)?;
                self.ldc(index)
            }
        }
    }

    pub fn push_string(&mut self, value: &str) -> Result<()> {
        let index = self.constant_pool.add_string(value)?;
        self.ldc(index)
    }

    fn ldc(&mut self, index: u16) -> Result<()> {
        if index <= u8::MAX as u16 {
            self.emitop(opcodes::LDC, 1)?;
            self.emit1(index as u8);
        } else {
            self.emitop(opcodes::LDC_W, 1)?;
            self.emit2(index);
        }
        Ok(())
    }

    pub fn load_local(&mut self, category: TypeCategory, index: u16) -> Result<()> {
        let op = category.load_op()?;
        let width = category.width() as i32;
        self.local_insn(op, short_load(op, index), index, width)
    }

    /// Store the top of stack into `index`, recording its type for frames
    pub fn store_local(&mut self, frame_type: FrameType, category: TypeCategory, index: u16) -> Result<()> {
        let op = category.store_op()?;
        let width = category.width();
        self.local_insn(op, short_store(op, index), index, -(width as i32))?;

        let end = (index + width) as usize;
        if self.locals.len() < end {
            self.locals.resize(end, FrameType::Top);
        }
        self.locals[index as usize] = frame_type;
        if width == 2 {
            self.locals[index as usize + 1] = FrameType::Top;
        }
        self.max_locals = self.max_locals.max(end as u16);
        Ok(())
    }

    fn local_insn(&mut self, op: u8, short: Option<u8>, index: u16, delta: i32) -> Result<()> {
        match short {
            Some(short) => self.emitop(short, delta),
            None if index <= u8::MAX as u16 => {
                self.emitop(op, delta)?;
                self.emit1(index as u8);
                Ok(())
            }
            None => {
                self.emitop(opcodes::WIDE, 0)?;
                self.emit1(op);
                self.emit2(index);
                self.adjust_stack(delta)
            }
        }
    }

    pub fn get_static(&mut self, field: &JvmFieldDefinition) -> Result<()> {
        let index = self.field_ref(field)?;
        self.emitop(opcodes::GETSTATIC, field.jvm_type.category().width() as i32)?;
        self.emit2(index);
        Ok(())
    }

    /// objectref -> value
    pub fn get_field(&mut self, field: &JvmFieldDefinition) -> Result<()> {
        let index = self.field_ref(field)?;
        self.emitop(opcodes::GETFIELD, field.jvm_type.category().width() as i32 - 1)?;
        self.emit2(index);
        Ok(())
    }

    /// objectref, value ->
    pub fn put_field(&mut self, field: &JvmFieldDefinition) -> Result<()> {
        let index = self.field_ref(field)?;
        self.emitop(opcodes::PUTFIELD, -(field.jvm_type.category().width() as i32) - 1)?;
        self.emit2(index);
        Ok(())
    }

    fn field_ref(&mut self, field: &JvmFieldDefinition) -> Result<u16> {
        self.constant_pool.add_field_ref(&field.owner, &field.name, field.jvm_type.descriptor())
    }

    pub fn invoke(&mut self, method: &JvmMethodDefinition) -> Result<()> {
        let delta = method.stack_delta()?;
        match method.kind {
            InvokeKind::Interface => {
                let index = self.constant_pool.add_interface_method_ref(&method.owner, &method.name, &method.descriptor)?;
                let count = 1 + method
                    .parameter_descriptors()?
                    .iter()
                    .map(|d| TypeCategory::from_descriptor(d).map(|c| c.width()))
                    .sum::<Result<u16>>()?;
                self.emitop(opcodes::INVOKEINTERFACE, delta)?;
                self.emit2(index);
                self.emit1(count as u8);
                self.emit1(0);
            }
            kind => {
                let index = self.constant_pool.add_method_ref(&method.owner, &method.name, &method.descriptor)?;
                self.emitop(kind.opcode(), delta)?;
                self.emit2(index);
            }
        }
        Ok(())
    }

    /// Invoke `owner.<init>` on the object below the arguments
    pub fn invoke_constructor(&mut self, owner: &str, descriptor: &str) -> Result<()> {
        let method = JvmMethodDefinition::new(owner, CONSTRUCTOR_METHOD_NAME, descriptor, InvokeKind::Special);
        self.invoke(&method)
    }

    /// Mark the receiver as initialized once the super constructor has run
    pub fn initialize_this(&mut self) {
        let this = FrameType::Object(self.this_class.clone());
        for slot in self.locals.iter_mut().filter(|l| **l == FrameType::UninitializedThis) {
            *slot = this.clone();
        }
    }

    pub fn new_object(&mut self, internal_name: &str) -> Result<()> {
        let index = self.constant_pool.add_class(internal_name)?;
        self.emitop(opcodes::NEW, 1)?;
        self.emit2(index);
        Ok(())
    }

    /// Replace the long/float/double on top of the stack with an int whose
    /// sign matches its own. NaN compares as negative.
    pub fn compare_with_zero(&mut self, category: TypeCategory) -> Result<()> {
        let (zero, compare) = match category {
            TypeCategory::Long => (opcodes::LCONST_0, opcodes::LCMP),
            TypeCategory::Float => (opcodes::FCONST_0, opcodes::FCMPL),
            TypeCategory::Double => (opcodes::DCONST_0, opcodes::DCMPL),
            other => {
                return Err(Error::codegen_error(format!("no zero comparison for {:?} values", other)));
            }
        };
        let width = category.width() as i32;
        self.emitop(zero, width)?;
        self.emitop(compare, 1 - 2 * width)
    }

    pub fn dup(&mut self) -> Result<()> {
        self.emitop(opcodes::DUP, 1)
    }

    pub fn athrow(&mut self) -> Result<()> {
        self.emitop(opcodes::ATHROW, -1)?;
        self.mark_dead();
        Ok(())
    }

    pub fn return_value(&mut self, category: TypeCategory) -> Result<()> {
        self.emitop(category.return_op(), -(category.width() as i32))?;
        self.mark_dead();
        Ok(())
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(LabelState::default());
        Label(self.labels.len() - 1)
    }

    /// Emit a conditional branch consuming one stack slot
    pub fn branch(&mut self, op: u8, label: Label) -> Result<()> {
        let at = self.pc();
        self.emitop(op, -1)?;
        self.emit2(0);
        if self.stack != 0 {
            return Err(Error::codegen_error("branch with a non-empty operand stack"));
        }
        let snapshot = frame_locals(&self.locals);
        let state = &mut self.labels[label.0];
        match &state.locals {
            Some(existing) if *existing != snapshot => {
                return Err(Error::codegen_error("branches to one label disagree on locals"));
            }
            Some(_) => {}
            None => state.locals = Some(snapshot),
        }
        state.fixups.push(at);
        Ok(())
    }

    /// Bind `label` to the current offset
    pub fn bind(&mut self, label: Label) -> Result<()> {
        if self.stack != 0 {
            return Err(Error::codegen_error("branch target with a non-empty operand stack"));
        }
        let pc = self.pc() as u16;
        let state = &mut self.labels[label.0];
        if state.pc.is_some() {
            return Err(Error::codegen_error("label bound twice"));
        }
        state.pc = Some(pc);
        if !self.alive {
            let locals = state
                .locals
                .clone()
                .ok_or_else(|| Error::codegen_error("unreachable label"))?;
            self.locals = expand_locals(&locals);
            self.alive = true;
        }
        Ok(())
    }

    /// Patch branches and assemble the Code attribute
    pub fn finish(mut self) -> Result<NamedAttribute> {
        if self.alive {
            return Err(Error::codegen_error("method body falls off the end of its code"));
        }
        if self.code.len() > MAX_CODE_LENGTH {
            return Err(Error::codegen_error(format!(
                "method code of {} bytes exceeds the class-file limit",
                self.code.len()
            )));
        }

        let mut targets = Vec::new();
        for state in &self.labels {
            let pc = match state.pc {
                Some(pc) => pc,
                None if state.fixups.is_empty() => continue,
                None => return Err(Error::codegen_error("branch to an unbound label")),
            };
            for &at in &state.fixups {
                let offset = (pc as i32 - at as i32) as i16;
                self.code[at + 1..at + 3].copy_from_slice(&offset.to_be_bytes());
            }
            if let Some(locals) = &state.locals {
                targets.push((pc, locals.clone()));
            }
        }
        targets.sort_by_key(|(pc, _)| *pc);

        let mut code = CodeAttribute::new(self.max_stack, self.max_locals, std::mem::take(&mut self.code));
        if self.options.emit_frames && !targets.is_empty() {
            let table = StackMapTable::build(&self.initial_locals, &targets, self.constant_pool)?;
            code.attributes.push(NamedAttribute::new_stack_map_table(self.constant_pool, table)?);
        }
        NamedAttribute::new_code_attribute(self.constant_pool, code)
    }
}

fn expand_locals(locals: &[FrameType]) -> Vec<FrameType> {
    let mut slots = Vec::new();
    for l in locals {
        slots.push(l.clone());
        if l.width() == 2 {
            slots.push(FrameType::Top);
        }
    }
    slots
}
