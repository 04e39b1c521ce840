//! Mapping from type usages to JVM descriptors and generic signatures

use super::jvm::{canonical_to_internal, JvmType, TypeCategory};
use crate::ast::{ReferenceTypeUsage, TypeUsage};
use crate::common::error::{Error, Result};
use crate::resolver::{ResolvedReference, Resolver};

/// JVM type of a type usage.
///
/// Primitives map to their one-letter descriptors, references to
/// `L<internal-name>;` after resolution, arrays prepend `[`. Type arguments
/// are erased from the descriptor and kept in the signature.
pub fn descriptor_of<R: Resolver + ?Sized>(type_usage: &TypeUsage, resolver: &R) -> Result<JvmType> {
    match type_usage {
        TypeUsage::Primitive(p) => Ok(JvmType::new(p.descriptor())),
        TypeUsage::Array(element) => {
            let element = descriptor_of(element, resolver)?;
            if element.is_void() {
                return Err(Error::unsupported(format!("array of void ({})", type_usage)));
            }
            Ok(JvmType::with_signature(
                format!("[{}", element.descriptor()),
                format!("[{}", element.signature()),
            ))
        }
        TypeUsage::Reference(reference) => reference_descriptor(reference, resolver),
    }
}

fn reference_descriptor<R: Resolver + ?Sized>(reference: &ReferenceTypeUsage, resolver: &R) -> Result<JvmType> {
    match resolver.resolve_reference(reference)? {
        ResolvedReference::Primitive(p) => {
            if !reference.type_arguments.is_empty() {
                return Err(Error::unsupported(format!("type arguments on primitive type {}", reference)));
            }
            Ok(JvmType::new(p.descriptor()))
        }
        ResolvedReference::Class { qualified_name } => {
            let internal = canonical_to_internal(&qualified_name);
            let descriptor = format!("L{};", internal);
            if reference.type_arguments.is_empty() {
                return Ok(JvmType::new(descriptor));
            }
            let mut signature = format!("L{}<", internal);
            for argument in &reference.type_arguments {
                let argument_type = descriptor_of(argument, resolver)?;
                if argument_type.category() != TypeCategory::Reference {
                    return Err(Error::unsupported(format!(
                        "primitive type argument {} in {}",
                        argument, reference
                    )));
                }
                signature.push_str(argument_type.signature());
            }
            signature.push_str(">;");
            Ok(JvmType::with_signature(descriptor, signature))
        }
    }
}
