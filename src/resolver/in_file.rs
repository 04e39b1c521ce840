//! Resolver over a single Turin file plus the built-in tables

use std::collections::HashMap;

use super::builtins::{CLASS_ALIASES, CONSTRUCTORS, METHODS, STATIC_FIELDS, TYPE_ALIASES};
use super::{ResolvedReference, Resolver};
use crate::ast::{
    ConstraintSet, Creation, Expression, FunctionCall, PropertyDefinition, ReferenceTypeUsage, StaticFieldAccess,
    TurinFile, TypeDefinition, TypeUsage,
};
use crate::codegen::defs::OBJECT_INTERNAL_NAME;
use crate::codegen::jvm::{
    canonical_to_internal, method_descriptor, InvokeKind, JvmConstructorDefinition, JvmFieldDefinition,
    JvmMethodDefinition, JvmType,
};
use crate::common::error::{Error, Result};

/// Resolves names declared in one file, falling back to the built-in
/// aliases and library members. Names containing a dot are taken to be
/// qualified JVM class names.
#[derive(Debug, Clone, Default)]
pub struct InFileResolver {
    namespace: String,
    /// File types by simple name
    types: HashMap<String, TypeDefinition>,
    /// File-level properties by name
    properties: HashMap<String, PropertyDefinition>,
}

impl InFileResolver {
    pub fn new(file: &TurinFile) -> Self {
        Self {
            namespace: file.namespace.clone(),
            types: file.types().map(|t| (t.name.clone(), t.clone())).collect(),
            properties: file.properties().map(|p| (p.name.clone(), p.clone())).collect(),
        }
    }

    fn qualify(&self, simple_name: &str) -> String {
        if self.namespace.is_empty() {
            simple_name.to_string()
        } else {
            format!("{}.{}", self.namespace, simple_name)
        }
    }

    /// File type named either by its simple or its qualified name
    fn file_type(&self, name: &str) -> Option<(String, &TypeDefinition)> {
        if let Some(definition) = self.types.get(name) {
            return Some((self.qualify(name), definition));
        }
        let simple = name.rsplit('.').next()?;
        self.types
            .get(simple)
            .filter(|_| self.qualify(simple) == name)
            .map(|definition| (name.to_string(), definition))
    }

    /// Qualified name of a class used as an owner (static access, creation)
    fn class_name(&self, name: &str) -> Result<String> {
        if let Some(alias) = TYPE_ALIASES.get(name) {
            if let ResolvedReference::Class { qualified_name } = &alias.resolved {
                return Ok(qualified_name.clone());
            }
        }
        if let Some((qualified, _)) = self.file_type(name) {
            return Ok(qualified);
        }
        if let Some(qualified) = CLASS_ALIASES.get(name) {
            return Ok(qualified.to_string());
        }
        if name.contains('.') {
            return Ok(name.to_string());
        }
        Err(Error::resolution(format!("unknown class {}", name)))
    }

    fn argument_descriptors(&self, arguments: &[Expression]) -> Result<Vec<String>> {
        arguments
            .iter()
            .map(|a| self.expression_type(a).map(|t| t.descriptor().to_string()))
            .collect()
    }

    /// Constructor descriptor of a file type: one parameter per property
    fn file_constructor(&self, qualified: &str, definition: &TypeDefinition) -> Result<JvmConstructorDefinition> {
        let parameters: Vec<JvmType> =
            definition.direct_properties(self)?.into_iter().map(|p| p.jvm_type).collect();
        let descriptor = method_descriptor(&parameters, &JvmType::void());
        Ok(JvmConstructorDefinition::new(canonical_to_internal(qualified), descriptor.descriptor()))
    }

    /// Getters and setters generated for a file type
    fn accessors(&self, owner: &str) -> Result<Vec<JvmMethodDefinition>> {
        let qualified = owner.replace('/', ".");
        let Some((_, definition)) = self.file_type(&qualified) else {
            return Ok(Vec::new());
        };
        let mut methods = Vec::new();
        for property in definition.direct_properties(self)? {
            let getter = method_descriptor(&[], &property.jvm_type);
            let setter = method_descriptor(&[property.jvm_type.clone()], &JvmType::void());
            methods.push(JvmMethodDefinition::new(owner, property.getter_name(), getter.descriptor(), InvokeKind::Virtual));
            methods.push(JvmMethodDefinition::new(owner, property.setter_name(), setter.descriptor(), InvokeKind::Virtual));
        }
        Ok(methods)
    }

    fn select_method(&self, owner: &str, name: &str, arguments: &[String], is_static: bool) -> Result<JvmMethodDefinition> {
        let wanted_static = |m: &&JvmMethodDefinition| (m.kind == InvokeKind::Static) == is_static;
        let mut candidates: Vec<JvmMethodDefinition> = METHODS
            .iter()
            .filter(|m| m.owner == owner && m.name == name)
            .filter(wanted_static)
            .cloned()
            .collect();
        if !is_static {
            candidates.extend(self.accessors(owner)?.into_iter().filter(|m| m.name == name));
            if owner != OBJECT_INTERNAL_NAME {
                candidates.extend(
                    METHODS
                        .iter()
                        .filter(|m| m.owner == OBJECT_INTERNAL_NAME && m.name == name)
                        .filter(wanted_static)
                        .cloned(),
                );
            }
        }
        let chosen = pick(&candidates, arguments, |m| m.parameter_descriptors())?;
        chosen.cloned().ok_or_else(|| {
            Error::resolution(format!(
                "no {}method {}.{}({}) found",
                if is_static { "static " } else { "" },
                owner.replace('/', "."),
                name,
                arguments.join(", ")
            ))
        })
    }
}

fn assignable(parameter: &str, argument: &str) -> bool {
    parameter == argument || (parameter == "Ljava/lang/Object;" && (argument.starts_with('L') || argument.starts_with('[')))
}

/// Exact parameter match first, then the first assignable one
fn pick<'a, T>(
    candidates: &'a [T],
    arguments: &[String],
    parameters_of: impl Fn(&T) -> Result<Vec<String>>,
) -> Result<Option<&'a T>> {
    let mut compatible = None;
    for candidate in candidates {
        let parameters = parameters_of(candidate)?;
        if parameters == arguments {
            return Ok(Some(candidate));
        }
        if compatible.is_none()
            && parameters.len() == arguments.len()
            && parameters.iter().zip(arguments).all(|(p, a)| assignable(p, a))
        {
            compatible = Some(candidate);
        }
    }
    Ok(compatible)
}

impl Resolver for InFileResolver {
    fn resolve_reference(&self, usage: &ReferenceTypeUsage) -> Result<ResolvedReference> {
        if let Some(alias) = TYPE_ALIASES.get(usage.name.as_str()) {
            return Ok(alias.resolved.clone());
        }
        if let Some((qualified_name, _)) = self.file_type(&usage.name) {
            return Ok(ResolvedReference::Class { qualified_name });
        }
        if usage.name.contains('.') {
            return Ok(ResolvedReference::Class { qualified_name: usage.name.clone() });
        }
        Err(Error::resolution(format!("unknown type {}", usage.name)))
    }

    fn type_constraints(&self, type_usage: &TypeUsage) -> ConstraintSet {
        match type_usage {
            TypeUsage::Reference(reference) => TYPE_ALIASES
                .get(reference.name.as_str())
                .map(|alias| alias.constraints)
                .unwrap_or_default(),
            _ => ConstraintSet::empty(),
        }
    }

    fn find_property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.get(name)
    }

    fn call_target(&self, call: &FunctionCall) -> Result<JvmMethodDefinition> {
        let arguments = self.argument_descriptors(&call.arguments)?;
        match call.function.as_ref() {
            Expression::FieldAccess(access) => {
                let receiver = self.expression_type(&access.subject)?;
                let owner = receiver.internal_class_name().ok_or_else(|| {
                    Error::resolution(format!(
                        "cannot invoke {} on {} of primitive type {}",
                        access.field,
                        access.subject,
                        receiver.descriptor()
                    ))
                })?;
                self.select_method(owner, &access.field, &arguments, false)
            }
            Expression::StaticFieldAccess(access) => {
                let owner = canonical_to_internal(&self.class_name(&access.type_name)?);
                self.select_method(&owner, &access.field, &arguments, true)
            }
            other => Err(Error::unsupported(format!("{} ({}) as a call target", other.kind(), other))),
        }
    }

    fn constructor_target(&self, creation: &Creation) -> Result<JvmConstructorDefinition> {
        let arguments = self.argument_descriptors(&creation.arguments)?;
        let qualified = self.class_name(&creation.type_name)?;
        let candidates = match self.file_type(&qualified) {
            Some((qualified, definition)) => vec![self.file_constructor(&qualified, definition)?],
            None => {
                let owner = canonical_to_internal(&qualified);
                CONSTRUCTORS.iter().filter(|c| c.owner == owner).cloned().collect()
            }
        };
        let chosen = pick(&candidates, &arguments, |c| c.parameter_descriptors())?;
        chosen.cloned().ok_or_else(|| {
            Error::resolution(format!("no constructor {}({}) found", qualified, arguments.join(", ")))
        })
    }

    fn static_field(&self, access: &StaticFieldAccess) -> Result<JvmFieldDefinition> {
        let owner = canonical_to_internal(&self.class_name(&access.type_name)?);
        STATIC_FIELDS
            .iter()
            .find(|f| f.owner == owner && f.name == access.field)
            .cloned()
            .ok_or_else(|| Error::resolution(format!("no static field {}.{} found", access.type_name, access.field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Constraint, Expression as E};

    fn manga() -> TurinFile {
        TurinFile::new("manga").with_type(
            TypeDefinition::new("MangaCharacter")
                .with_property(PropertyDefinition::new("name", TypeUsage::reference("String")))
                .with_property(PropertyDefinition::new("age", TypeUsage::reference("UInt"))),
        )
    }

    #[test]
    fn test_resolve_names() {
        let resolver = InFileResolver::new(&manga());
        let local = ReferenceTypeUsage::new("MangaCharacter");
        assert_eq!(resolver.qualified_name(&local).unwrap(), "manga.MangaCharacter");
        assert!(resolver.qualified_name(&ReferenceTypeUsage::new("UInt")).is_err());
        assert!(resolver.type_constraints(&TypeUsage::reference("UInt")).contains(Constraint::NonNegative));
        assert!(resolver.type_constraints(&TypeUsage::reference("Int")).is_empty());
    }

    #[test]
    fn test_println_overloads() {
        let resolver = InFileResolver::new(&manga());
        let out = E::static_field("java.lang.System", "out");
        if let E::FunctionCall(call) = E::method_call(out.clone(), "println", vec![E::int(3)]) {
            assert_eq!(resolver.call_target(&call).unwrap().descriptor, "(I)V");
        }
        if let E::FunctionCall(call) = E::method_call(out, "println", vec![E::string("hi")]) {
            let target = resolver.call_target(&call).unwrap();
            assert_eq!(target.owner, "java/io/PrintStream");
            assert_eq!(target.descriptor, "(Ljava/lang/String;)V");
            assert_eq!(target.kind, InvokeKind::Virtual);
        }
    }

    #[test]
    fn test_object_parameter_accepts_references() {
        let resolver = InFileResolver::new(&manga());
        let creation = E::creation("MangaCharacter", vec![E::string("Ranma"), E::int(16)]);
        if let E::FunctionCall(call) = E::method_call(E::static_field("System", "out"), "println", vec![creation]) {
            assert_eq!(resolver.call_target(&call).unwrap().descriptor, "(Ljava/lang/Object;)V");
        }
    }

    #[test]
    fn test_file_type_constructor_and_accessors() {
        let resolver = InFileResolver::new(&manga());
        if let E::Creation(creation) = E::creation("MangaCharacter", vec![E::string("Ranma"), E::int(16)]) {
            let ctor = resolver.constructor_target(&creation).unwrap();
            assert_eq!(ctor.owner, "manga/MangaCharacter");
            assert_eq!(ctor.descriptor, "(Ljava/lang/String;I)V");
        }
        let subject = E::creation("manga.MangaCharacter", vec![E::string("Ranma"), E::int(16)]);
        if let E::FunctionCall(call) = E::method_call(subject, "getAge", vec![]) {
            assert_eq!(resolver.call_target(&call).unwrap().descriptor, "()I");
        }
    }

    #[test]
    fn test_static_call() {
        let resolver = InFileResolver::new(&manga());
        if let E::FunctionCall(call) = E::call(E::static_field("Integer", "toString"), vec![E::int(1)]) {
            let target = resolver.call_target(&call).unwrap();
            assert_eq!(target.kind, InvokeKind::Static);
            assert_eq!(target.owner, "java/lang/Integer");
        }
    }

    #[test]
    fn test_failures() {
        let resolver = InFileResolver::new(&manga());
        if let E::Creation(creation) = E::creation("MangaCharacter", vec![E::int(16)]) {
            assert!(matches!(resolver.constructor_target(&creation), Err(Error::Resolution { .. })));
        }
        if let E::StaticFieldAccess(access) = E::static_field("java.lang.System", "in") {
            assert!(matches!(resolver.static_field(&access), Err(Error::Resolution { .. })));
        }
        if let E::FunctionCall(call) = E::method_call(E::int(1), "length", vec![]) {
            assert!(matches!(resolver.call_target(&call), Err(Error::Resolution { .. })));
        }
        if let E::FunctionCall(call) = E::call(E::int(1), vec![]) {
            assert!(matches!(resolver.call_target(&call), Err(Error::UnsupportedConstruct { .. })));
        }
    }
}
