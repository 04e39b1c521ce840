//! Runtime guards for constrained properties
//!
//! A guard loads the incoming value, skips ahead when it is acceptable and
//! otherwise throws `IllegalArgumentException`. The same sequence guards the
//! constructor parameter and the setter parameter of a property.

use super::defs::ILLEGAL_ARGUMENT_EXCEPTION;
use super::jvm::{JvmConstructorDefinition, TypeCategory};
use super::sequence::{BytecodeSequence, Condition};
use crate::ast::Constraint;
use crate::resolver::Property;

/// Guards for `property` read from local `slot`, in constraint order, or
/// `None` when nothing needs checking. NonNull only applies to references and
/// NonNegative to numbers of any width; primitives are never null.
///
/// long, float and double values are compared with zero before the `ifge`,
/// so a NaN is rejected along with negative values.
pub fn guard_for(property: &Property, slot: u16) -> Option<BytecodeSequence> {
    let category = property.jvm_type.category();
    let guards: Vec<BytecodeSequence> = property
        .constraints
        .iter()
        .filter_map(|constraint| match (constraint, category) {
            (Constraint::NonNull, TypeCategory::Reference) => Some(guard(
                slot,
                category,
                Condition::NonNull,
                format!("{} cannot be null", property.name),
            )),
            (
                Constraint::NonNegative,
                TypeCategory::Int | TypeCategory::Long | TypeCategory::Float | TypeCategory::Double,
            ) => Some(guard(
                slot,
                category,
                Condition::NonNegative,
                format!("{} should be positive", property.name),
            )),
            _ => None,
        })
        .collect();
    if guards.is_empty() {
        None
    } else {
        Some(guards.into_iter().collect())
    }
}

fn guard(slot: u16, category: TypeCategory, condition: Condition, message: String) -> BytecodeSequence {
    let load = BytecodeSequence::LoadLocal { index: slot, category };
    let load = match category {
        TypeCategory::Long | TypeCategory::Float | TypeCategory::Double => {
            load.then(BytecodeSequence::CompareWithZero(category))
        }
        _ => load,
    };
    BytecodeSequence::Guard {
        load: Box::new(load),
        condition,
        failure: Box::new(throw_illegal_argument(message)),
    }
}

fn throw_illegal_argument(message: String) -> BytecodeSequence {
    BytecodeSequence::NewInvocation {
        constructor: JvmConstructorDefinition::new(ILLEGAL_ARGUMENT_EXCEPTION, "(Ljava/lang/String;)V"),
        arguments: Box::new(BytecodeSequence::PushStringConst(message)),
    }
    .then(BytecodeSequence::Throw)
}
