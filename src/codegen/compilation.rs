//! Lowering of compilation units to class files
//!
//! Every type definition and every program in a file becomes one class.
//! Units are independent of each other, so they can be compiled one after
//! the other or on scoped worker threads; either way the artifacts come back
//! in the order the units appear in the file.

use std::collections::HashSet;

use log::{debug, trace};

use super::class::ClassFileDefinition;
use super::constraint::guard_for;
use super::defs::{CONSTRUCTOR_METHOD_NAME, MAIN_METHOD_DESCRIPTOR, MAIN_METHOD_NAME, OBJECT_INTERNAL_NAME};
use super::emitter::ClassEmitter;
use super::flag::access_flags::{ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC};
use super::frame::FrameType;
use super::jvm::{canonical_to_internal, method_descriptor, JvmFieldDefinition, JvmMethodDefinition, JvmType, TypeCategory};
use super::sequence::BytecodeSequence;
use crate::ast::{Expression, FileMember, FunctionCall, Program, Statement, TurinFile, TypeDefinition};
use crate::common::config::Config;
use crate::common::error::{Error, Result};
use crate::resolver::Resolver;

#[derive(Debug, Clone, Copy)]
enum Unit<'a> {
    Type(&'a TypeDefinition),
    Program(&'a Program),
}

/// Hands out local variable slots in declaration order. Slots are never
/// reused; long and double values take two.
#[derive(Debug)]
struct SlotAllocator {
    next: u16,
}

impl SlotAllocator {
    fn starting_at(first: u16) -> Self {
        Self { next: first }
    }

    fn allocate(&mut self, jvm_type: &JvmType) -> Result<u16> {
        let index = self.next;
        self.next = index
            .checked_add(jvm_type.category().width())
            .ok_or_else(|| Error::codegen_error("too many local variables"))?;
        Ok(index)
    }
}

pub struct Compilation<'r> {
    resolver: &'r dyn Resolver,
    config: Config,
}

impl<'r> Compilation<'r> {
    pub fn new(resolver: &'r dyn Resolver, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { resolver, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile every unit of `file`, in order
    pub fn compile(&self, file: &TurinFile) -> Result<Vec<ClassFileDefinition>> {
        self.units(file)?
            .iter()
            .map(|(name, unit)| self.compile_unit(name, *unit))
            .collect()
    }

    /// Same output as [`Compilation::compile`], one worker thread per unit
    pub fn compile_parallel(&self, file: &TurinFile) -> Result<Vec<ClassFileDefinition>> {
        let units = self.units(file)?;
        std::thread::scope(|scope| {
            let workers: Vec<_> = units
                .iter()
                .map(|(name, unit)| scope.spawn(move || self.compile_unit(name, *unit)))
                .collect();
            workers
                .into_iter()
                .map(|worker| {
                    worker
                        .join()
                        .map_err(|_| Error::codegen_error("compilation worker panicked"))
                        .and_then(|artifact| artifact)
                })
                .collect()
        })
    }

    /// Qualified names of the file's units, rejecting duplicates
    fn units<'a>(&self, file: &'a TurinFile) -> Result<Vec<(String, Unit<'a>)>> {
        let mut seen = HashSet::new();
        let mut units = Vec::new();
        for member in &file.members {
            let (name, unit) = match member {
                FileMember::Type(definition) => (file.qualified_name(&definition.name), Unit::Type(definition)),
                FileMember::Program(program) => (file.qualified_name(&program.name), Unit::Program(program)),
                FileMember::Property(_) => continue,
            };
            if !seen.insert(name.clone()) {
                return Err(Error::DuplicateArtifact { name });
            }
            units.push((name, unit));
        }
        Ok(units)
    }

    fn compile_unit(&self, qualified_name: &str, unit: Unit<'_>) -> Result<ClassFileDefinition> {
        match unit {
            Unit::Type(definition) => self.compile_type_definition(qualified_name, definition),
            Unit::Program(program) => self.compile_program(qualified_name, program),
        }
    }

    /// A type becomes a class with one private field, a getter and a
    /// guarded setter per property, and a constructor taking every property
    /// in order. The constructor runs all guards before assigning any field.
    pub fn compile_type_definition(
        &self,
        qualified_name: &str,
        definition: &TypeDefinition,
    ) -> Result<ClassFileDefinition> {
        let properties = definition.direct_properties(self.resolver)?;
        let internal_name = canonical_to_internal(qualified_name);
        let this = FrameType::Object(internal_name.clone());

        let mut emitter = ClassEmitter::new(&self.config);
        emitter.begin_unit(qualified_name)?;

        for property in &properties {
            let category = property.jvm_type.category();
            let field = JvmFieldDefinition::new(&internal_name, property.field_name(), property.jvm_type.clone(), false);
            emitter.add_field(ACC_PRIVATE, property.field_name(), &property.jvm_type)?;

            let getter: BytecodeSequence = vec![
                BytecodeSequence::PushThis,
                BytecodeSequence::GetField(field.clone()),
                BytecodeSequence::Return(category),
            ]
            .into();
            emitter.add_method(
                ACC_PUBLIC,
                &property.getter_name(),
                &method_descriptor(&[], &property.jvm_type),
                &[this.clone()],
                |code| getter.emit(code),
            )?;

            let setter: BytecodeSequence = vec![
                guard_for(property, 1).unwrap_or(BytecodeSequence::NoOp),
                BytecodeSequence::PushThis,
                BytecodeSequence::LoadLocal { index: 1, category },
                BytecodeSequence::PutField(field),
                BytecodeSequence::Return(TypeCategory::Void),
            ]
            .into();
            emitter.add_method(
                ACC_PUBLIC,
                &property.setter_name(),
                &method_descriptor(&[property.jvm_type.clone()], &JvmType::void()),
                &[this.clone(), FrameType::of(&property.jvm_type)],
                |code| setter.emit(code),
            )?;
        }

        let mut guards = Vec::new();
        let mut assignments = Vec::new();
        let mut parameters = vec![FrameType::UninitializedThis];
        let mut slots = SlotAllocator::starting_at(1);
        for property in &properties {
            let slot = slots.allocate(&property.jvm_type)?;
            guards.push(guard_for(property, slot).unwrap_or(BytecodeSequence::NoOp));
            assignments.push(BytecodeSequence::PushThis);
            assignments.push(BytecodeSequence::LoadLocal { index: slot, category: property.jvm_type.category() });
            assignments.push(BytecodeSequence::PutField(JvmFieldDefinition::new(
                &internal_name,
                property.field_name(),
                property.jvm_type.clone(),
                false,
            )));
            parameters.push(FrameType::of(&property.jvm_type));
        }
        let constructor: BytecodeSequence =
            std::iter::once(BytecodeSequence::InvokeSuperConstructor { owner: OBJECT_INTERNAL_NAME.to_string() })
                .chain(guards)
                .chain(assignments)
                .chain(std::iter::once(BytecodeSequence::Return(TypeCategory::Void)))
                .collect();
        let parameter_types: Vec<JvmType> = properties.iter().map(|p| p.jvm_type.clone()).collect();
        emitter.add_method(
            ACC_PUBLIC,
            CONSTRUCTOR_METHOD_NAME,
            &method_descriptor(&parameter_types, &JvmType::void()),
            &parameters,
            |code| constructor.emit(code),
        )?;

        emitter.end_unit()
    }

    /// A program becomes a class with a single `public static void main(String[])`
    pub fn compile_program(&self, qualified_name: &str, program: &Program) -> Result<ClassFileDefinition> {
        let body = self.lower_program(program)?;

        let mut emitter = ClassEmitter::new(&self.config);
        emitter.begin_unit(qualified_name)?;
        emitter.add_method(
            ACC_PUBLIC | ACC_STATIC,
            MAIN_METHOD_NAME,
            &JvmType::new(MAIN_METHOD_DESCRIPTOR),
            &[FrameType::Object("[Ljava/lang/String;".to_string())],
            |code| body.emit(code),
        )?;
        emitter.end_unit()
    }

    fn lower_program(&self, program: &Program) -> Result<BytecodeSequence> {
        // slot 0 holds `args`
        let mut slots = SlotAllocator::starting_at(1);
        let mut parts = Vec::with_capacity(program.statements.len() + 1);
        let mut terminated = false;
        for statement in &program.statements {
            if terminated {
                return Err(Error::unsupported(format!("{} `{}` after return", statement.kind(), statement)));
            }
            trace!("lowering `{}` in {}", statement, program.name);
            match statement {
                Statement::VariableDeclaration(declaration) => {
                    let value_type = self.resolver.expression_type(&declaration.value)?;
                    let jvm_type = match &declaration.type_usage {
                        Some(declared) => {
                            let declared_type = self.resolver.jvm_type(declared)?;
                            if declared_type.category() != value_type.category() {
                                return Err(Error::resolution(format!(
                                    "cannot initialize {} of type {} with {}",
                                    declaration.name, declared, declaration.value
                                )));
                            }
                            declared_type
                        }
                        None => value_type,
                    };
                    parts.push(self.push_expression(&declaration.value)?);
                    let index = slots.allocate(&jvm_type)?;
                    debug!("local {} -> slot {} ({})", declaration.name, index, jvm_type.descriptor());
                    parts.push(BytecodeSequence::LocalVarAssignment { index, jvm_type });
                }
                Statement::ExpressionStatement(expression) => parts.push(self.execute_expression(expression)?),
                Statement::Return => {
                    parts.push(BytecodeSequence::Return(TypeCategory::Void));
                    terminated = true;
                }
            }
        }
        if !terminated {
            parts.push(BytecodeSequence::Return(TypeCategory::Void));
        }
        Ok(parts.into())
    }

    /// Sequence leaving the value of `expression` on the stack
    fn push_expression(&self, expression: &Expression) -> Result<BytecodeSequence> {
        match expression {
            Expression::IntLiteral(value) => Ok(BytecodeSequence::PushIntConst(*value)),
            Expression::StringLiteral(value) => Ok(BytecodeSequence::PushStringConst(value.clone())),
            Expression::StaticFieldAccess(access) => {
                Ok(BytecodeSequence::PushStaticField(self.resolver.static_field(access)?))
            }
            Expression::Creation(creation) => {
                let constructor = self.resolver.constructor_target(creation)?;
                let arguments = self.push_arguments(&creation.arguments)?;
                Ok(BytecodeSequence::NewInvocation { constructor, arguments: Box::new(arguments) })
            }
            Expression::FunctionCall(call) => {
                let target = self.resolver.call_target(call)?;
                if !target.returns_value() {
                    return Err(Error::unsupported(format!("void call `{}` used as a value", expression)));
                }
                self.invocation(call, target)
            }
            Expression::FieldAccess(_) => Err(Error::unsupported(format!("{} `{}`", expression.kind(), expression))),
        }
    }

    /// Sequence evaluating `expression` for its effect only
    fn execute_expression(&self, expression: &Expression) -> Result<BytecodeSequence> {
        match expression {
            Expression::IntLiteral(_) | Expression::StringLiteral(_) => Ok(BytecodeSequence::NoOp),
            Expression::FunctionCall(call) => {
                let target = self.resolver.call_target(call)?;
                if target.returns_value() {
                    return Err(Error::unsupported(format!(
                        "result of `{}` discarded in statement position",
                        expression
                    )));
                }
                self.invocation(call, target)
            }
            other => Err(Error::unsupported(format!("{} `{}` as a statement", other.kind(), other))),
        }
    }

    fn invocation(&self, call: &FunctionCall, target: JvmMethodDefinition) -> Result<BytecodeSequence> {
        let receiver = if target.kind.has_receiver() {
            match call.function.as_ref() {
                Expression::FieldAccess(access) => self.push_expression(&access.subject)?,
                other => return Err(Error::unsupported(format!("{} `{}` as a receiver", other.kind(), other))),
            }
        } else {
            BytecodeSequence::NoOp
        };
        let arguments = self.push_arguments(&call.arguments)?;
        Ok(vec![receiver, arguments, BytecodeSequence::MethodInvocation(target)].into())
    }

    fn push_arguments(&self, arguments: &[Expression]) -> Result<BytecodeSequence> {
        arguments.iter().map(|a| self.push_expression(a)).collect::<Result<Vec<_>>>().map(Into::into)
    }
}
