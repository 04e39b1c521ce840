//! Class emission engine
//!
//! A `ClassEmitter` produces exactly one class file. It starts `Idle`,
//! moves to `Building` on `begin_unit`, accepts fields and methods while
//! building, and becomes `Finalized` when `end_unit` hands out the artifact.
//! Calls out of that order fail with `Error::InvalidEngineState`.

use std::collections::HashSet;

use log::debug;

use super::attribute::NamedAttribute;
use super::class::{ClassFile, ClassFileDefinition};
use super::code::{CodeOptions, MethodBuilder};
use super::defs::{MAX_PARAMETER_SLOTS, OBJECT_INTERNAL_NAME};
use super::field::FieldInfo;
use super::flag::access_flags::{ACC_PUBLIC, ACC_STATIC, ACC_SUPER};
use super::frame::FrameType;
use super::jvm::{canonical_to_internal, parse_method_descriptor, JvmType, TypeCategory};
use super::method::MethodInfo;
use super::writer::class_file_to_bytes;
use crate::common::config::Config;
use crate::common::error::{Error, Result};

#[derive(Debug)]
struct ClassBuilder {
    qualified_name: String,
    internal_name: String,
    class_file: ClassFile,
    fields: HashSet<String>,
    methods: HashSet<(String, String)>,
}

#[derive(Debug)]
enum EmitterState {
    Idle,
    Building(ClassBuilder),
    Finalized,
}

impl EmitterState {
    fn name(&self) -> &'static str {
        match self {
            EmitterState::Idle => "idle",
            EmitterState::Building(_) => "building",
            EmitterState::Finalized => "finalized",
        }
    }
}

#[derive(Debug)]
pub struct ClassEmitter {
    major_version: u16,
    options: CodeOptions,
    state: EmitterState,
}

impl ClassEmitter {
    pub fn new(config: &Config) -> Self {
        Self {
            major_version: config.major_version(),
            options: CodeOptions { emit_frames: config.frames_enabled(), debug: config.debug },
            state: EmitterState::Idle,
        }
    }

    /// `idle`, `building` or `finalized`
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    pub fn begin_unit(&mut self, qualified_name: &str) -> Result<()> {
        if !matches!(self.state, EmitterState::Idle) {
            return Err(Error::invalid_state("begin unit", self.state.name()));
        }
        debug!("begin unit {}", qualified_name);

        let internal_name = canonical_to_internal(qualified_name);
        let mut class_file = ClassFile::new(self.major_version);
        class_file.access_flags = ACC_PUBLIC | ACC_SUPER;
        class_file.this_class = class_file.constant_pool.add_class(&internal_name)?;
        class_file.super_class = class_file.constant_pool.add_class(OBJECT_INTERNAL_NAME)?;

        self.state = EmitterState::Building(ClassBuilder {
            qualified_name: qualified_name.to_string(),
            internal_name,
            class_file,
            fields: HashSet::new(),
            methods: HashSet::new(),
        });
        Ok(())
    }

    fn building(&mut self, operation: &'static str) -> Result<&mut ClassBuilder> {
        match &mut self.state {
            EmitterState::Building(builder) => Ok(builder),
            other => Err(Error::invalid_state(operation, other.name())),
        }
    }

    pub fn add_field(&mut self, access_flags: u16, name: &str, jvm_type: &JvmType) -> Result<()> {
        let builder = self.building("add field")?;
        if !builder.fields.insert(name.to_string()) {
            return Err(Error::codegen_error(format!("field {} declared twice in {}", name, builder.qualified_name)));
        }
        debug!("field {}.{} {}", builder.qualified_name, name, jvm_type.descriptor());

        let pool = &mut builder.class_file.constant_pool;
        let mut field = FieldInfo::new(access_flags, pool.add_utf8(name)?, pool.add_utf8(jvm_type.descriptor())?);
        if jvm_type.is_generic() {
            field.attributes.push(NamedAttribute::new_signature(pool, jvm_type.signature())?);
        }
        builder.class_file.fields.push(field);
        Ok(())
    }

    /// Add a method whose body is produced by `body`. `parameters` are the
    /// locals live on entry (receiver first for instance methods).
    pub fn add_method<F>(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &JvmType,
        parameters: &[FrameType],
        body: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut MethodBuilder<'_>) -> Result<()>,
    {
        let options = self.options;
        let builder = self.building("add method")?;
        let slots = parameter_slots(access_flags, descriptor)?;
        if slots > MAX_PARAMETER_SLOTS as u32 {
            return Err(Error::codegen_error(format!(
                "method {}.{} needs {} parameter slots, the limit is {}",
                builder.qualified_name, name, slots, MAX_PARAMETER_SLOTS
            )));
        }
        if !builder.methods.insert((name.to_string(), descriptor.descriptor().to_string())) {
            return Err(Error::codegen_error(format!(
                "method {}{} declared twice in {}",
                name,
                descriptor.descriptor(),
                builder.qualified_name
            )));
        }
        debug!("method {}.{}{}", builder.qualified_name, name, descriptor.descriptor());

        let pool = &mut builder.class_file.constant_pool;
        let mut method = MethodInfo::new(access_flags, pool.add_utf8(name)?, pool.add_utf8(descriptor.descriptor())?);

        let mut code = MethodBuilder::new(pool, builder.internal_name.as_str(), parameters, options);
        body(&mut code)?;
        method.attributes.push(code.finish()?);

        if descriptor.is_generic() {
            method.attributes.push(NamedAttribute::new_signature(pool, descriptor.signature())?);
        }
        builder.class_file.methods.push(method);
        Ok(())
    }

    /// Serialize the class and finalize the emitter
    pub fn end_unit(&mut self) -> Result<ClassFileDefinition> {
        match std::mem::replace(&mut self.state, EmitterState::Finalized) {
            EmitterState::Building(builder) => {
                let bytecode = class_file_to_bytes(&builder.class_file);
                debug!(
                    "end unit {} ({} bytes, {} constants)",
                    builder.qualified_name,
                    bytecode.len(),
                    builder.class_file.constant_pool.len()
                );
                Ok(ClassFileDefinition::new(builder.qualified_name, bytecode))
            }
            other => {
                let state = other.name();
                self.state = other;
                Err(Error::invalid_state("end unit", state))
            }
        }
    }
}

/// Local slots taken by the receiver and the declared parameters
fn parameter_slots(access_flags: u16, descriptor: &JvmType) -> Result<u32> {
    let (parameters, _) = parse_method_descriptor(descriptor.descriptor())?;
    let mut slots = if access_flags & ACC_STATIC != 0 { 0 } else { 1 };
    for parameter in &parameters {
        slots += TypeCategory::from_descriptor(parameter)?.width() as u32;
    }
    Ok(slots)
}
