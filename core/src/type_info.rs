//! Type model: the types and methods advice is matched against
//!
//! Pointcuts reason about *declared structure*: which type an object is,
//! which interfaces it implements, which methods it exposes. This module
//! describes that structure explicitly so matching never needs a live object.
//!
//! - [`TypeInfo`]: a class or interface with its supertypes and methods
//! - [`Method`]: a method declared by a type, with a precomputed identity
//! - [`MethodSignature`]: hashable method key (declaring type + name + params)
//! - [`TypeRegistry`]: immutable name → [`TypeRef`] lookup
//!
//! # Example
//!
//! ```
//! use weft::TypeInfo;
//!
//! let named = TypeInfo::interface("com.example.Named")
//!     .method_returning("getName", &[], "String")
//!     .build();
//! let person = TypeInfo::class("com.example.Person")
//!     .implements(&named)
//!     .method("setName", &["String"])
//!     .build();
//!
//! assert!(person.is_assignable_to("com.example.Named"));
//! assert_eq!(person.all_methods().len(), 2);
//! ```

use crate::AopError;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Shared handle to an immutable [`TypeInfo`].
pub type TypeRef = Arc<TypeInfo>;

/// Whether a type is a concrete class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A concrete (instantiable) type.
    Class,
    /// A capability contract; the only kind that can be introduced.
    Interface,
}

/// A method declared by some type.
///
/// The declaring type is held by name, not by reference, so types and their
/// methods never form a cycle.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Method {
    declaring_type: Arc<str>,
    name: Arc<str>,
    parameter_types: Arc<[String]>,
    return_type: Option<Arc<str>>,
    identity: Arc<str>,
}

impl Method {
    /// Create a method declared by `declaring_type` with no return value.
    pub fn new(declaring_type: &str, name: &str, parameter_types: &[&str]) -> Self {
        Self::build(declaring_type, name, parameter_types, None)
    }

    /// Create a method declared by `declaring_type` that returns `return_type`.
    pub fn returning(
        declaring_type: &str,
        name: &str,
        parameter_types: &[&str],
        return_type: &str,
    ) -> Self {
        Self::build(declaring_type, name, parameter_types, Some(return_type))
    }

    fn build(
        declaring_type: &str,
        name: &str,
        parameter_types: &[&str],
        return_type: Option<&str>,
    ) -> Self {
        Self {
            declaring_type: Arc::from(declaring_type),
            name: Arc::from(name),
            parameter_types: parameter_types.iter().map(|p| (*p).to_owned()).collect(),
            return_type: return_type.map(Arc::from),
            identity: Arc::from(format!("{declaring_type}.{name}")),
        }
    }

    /// Fully-qualified name of the type that declared this method.
    #[must_use]
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Simple method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter type names, in order.
    #[must_use]
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Return type name, or `None` when the method returns nothing.
    #[must_use]
    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    /// `declaringType.methodName`: the string pattern matchers run against.
    ///
    /// Uses the *declaring* type, so every subtype inheriting the method
    /// yields the same identity.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Hashable key identifying this method across calls.
    #[must_use]
    pub fn signature(&self) -> MethodSignature {
        MethodSignature {
            declaring_type: Arc::clone(&self.declaring_type),
            name: Arc::clone(&self.name),
            parameter_types: Arc::clone(&self.parameter_types),
        }
    }

    fn overrides(&self, other: &Method) -> bool {
        self.name == other.name && self.parameter_types == other.parameter_types
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.identity, self.parameter_types.join(", "))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Stable method identity: declaring type + name + parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    declaring_type: Arc<str>,
    name: Arc<str>,
    parameter_types: Arc<[String]>,
}

impl MethodSignature {
    /// Fully-qualified name of the declaring type.
    #[must_use]
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Simple method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A class or interface.
///
/// Immutable once built; share it through [`TypeRef`].
pub struct TypeInfo {
    name: String,
    kind: TypeKind,
    superclass: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    methods: Vec<Method>,
}

impl TypeInfo {
    /// Start building a class.
    pub fn class(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(name.into(), TypeKind::Class)
    }

    /// Start building an interface.
    pub fn interface(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(name.into(), TypeKind::Interface)
    }

    /// Fully-qualified type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class or interface.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Returns `true` for interfaces.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Direct superclass, if any. Always `None` for interfaces.
    #[must_use]
    pub fn superclass(&self) -> Option<&TypeRef> {
        self.superclass.as_ref()
    }

    /// Directly implemented interfaces (or, for an interface, extended ones).
    #[must_use]
    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    /// Methods declared directly on this type.
    #[must_use]
    pub fn declared_methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns `true` if this type is `name` or has `name` as a supertype.
    #[must_use]
    pub fn is_assignable_to(&self, name: &str) -> bool {
        self.name == name
            || self
                .superclass
                .as_ref()
                .is_some_and(|s| s.is_assignable_to(name))
            || self.interfaces.iter().any(|i| i.is_assignable_to(name))
    }

    /// Every interface reachable from this type, without duplicates.
    ///
    /// Order: own interfaces (each followed by the interfaces it extends),
    /// then those inherited through the superclass chain.
    #[must_use]
    pub fn all_interfaces(&self) -> Vec<TypeRef> {
        self.interface_refs().into_iter().map(Arc::clone).collect()
    }

    fn interface_refs(&self) -> Vec<&TypeRef> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_interfaces(&mut seen, &mut out);
        out
    }

    fn collect_interfaces<'a>(&'a self, seen: &mut HashSet<&'a str>, out: &mut Vec<&'a TypeRef>) {
        for ifc in &self.interfaces {
            if seen.insert(ifc.name.as_str()) {
                out.push(ifc);
            }
            ifc.collect_interfaces(seen, out);
        }
        if let Some(superclass) = &self.superclass {
            superclass.collect_interfaces(seen, out);
        }
    }

    /// Every method callable on this type.
    ///
    /// Declared methods come first, then methods inherited through the
    /// superclass chain, then interface methods. An inherited method with the
    /// same name and parameter types as one already collected is overridden
    /// and is skipped.
    #[must_use]
    pub fn all_methods(&self) -> Vec<&Method> {
        let mut out: Vec<&Method> = Vec::new();
        let mut current: Option<&TypeInfo> = Some(self);
        while let Some(ty) = current {
            collect_methods(&ty.methods, &mut out);
            current = ty.superclass.as_deref();
        }
        for ifc in self.interface_refs() {
            collect_methods(&ifc.methods, &mut out);
        }
        out
    }

    /// Every method declaration reachable on this type.
    ///
    /// Unlike [`all_methods`](Self::all_methods), interface declarations are
    /// kept even when the class chain re-declares them, so `app.Api.ping` and
    /// `app.Service.ping` both appear for a class implementing `app.Api`.
    /// Overrides within the class chain are still collapsed.
    #[must_use]
    pub fn reachable_methods(&self) -> Vec<&Method> {
        let mut out: Vec<&Method> = Vec::new();
        let mut current: Option<&TypeInfo> = Some(self);
        while let Some(ty) = current {
            collect_methods(&ty.methods, &mut out);
            current = ty.superclass.as_deref();
        }
        for ifc in self.interface_refs() {
            out.extend(&ifc.methods);
        }
        out
    }

    /// Find a callable method by name and parameter types.
    #[must_use]
    pub fn find_method(&self, name: &str, parameter_types: &[&str]) -> Option<&Method> {
        self.all_methods().into_iter().find(|m| {
            m.name() == name
                && m.parameter_types().len() == parameter_types.len()
                && m
                    .parameter_types()
                    .iter()
                    .zip(parameter_types)
                    .all(|(a, b)| a.as_str() == *b)
        })
    }
}

fn collect_methods<'a>(methods: &'a [Method], out: &mut Vec<&'a Method>) {
    for m in methods {
        if !out.iter().any(|seen| seen.overrides(m)) {
            out.push(m);
        }
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field(
                "superclass",
                &self.superclass.as_ref().map(|s| s.name.as_str()),
            )
            .field(
                "interfaces",
                &self
                    .interfaces
                    .iter()
                    .map(|i| i.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("methods", &self.methods.len())
            .finish()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Consuming builder for [`TypeInfo`].
#[derive(Debug)]
#[must_use]
pub struct TypeBuilder {
    name: String,
    kind: TypeKind,
    superclass: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    methods: Vec<Method>,
}

impl TypeBuilder {
    fn new(name: String, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Set the supertype.
    ///
    /// For a class this is the superclass; for an interface it adds an
    /// extended interface.
    pub fn extends(mut self, parent: &TypeRef) -> Self {
        match self.kind {
            TypeKind::Class => self.superclass = Some(Arc::clone(parent)),
            TypeKind::Interface => self.interfaces.push(Arc::clone(parent)),
        }
        self
    }

    /// Add a directly implemented interface.
    pub fn implements(mut self, interface: &TypeRef) -> Self {
        self.interfaces.push(Arc::clone(interface));
        self
    }

    /// Declare a method with no return value.
    pub fn method(mut self, name: &str, parameter_types: &[&str]) -> Self {
        self.methods
            .push(Method::new(&self.name, name, parameter_types));
        self
    }

    /// Declare a method returning `return_type`.
    pub fn method_returning(
        mut self,
        name: &str,
        parameter_types: &[&str],
        return_type: &str,
    ) -> Self {
        self.methods.push(Method::returning(
            &self.name,
            name,
            parameter_types,
            return_type,
        ));
        self
    }

    /// Finish the type.
    pub fn build(self) -> TypeRef {
        Arc::new(TypeInfo {
            name: self.name,
            kind: self.kind,
            superclass: self.superclass,
            interfaces: self.interfaces,
            methods: self.methods,
        })
    }
}

/// Immutable lookup of types by fully-qualified name.
///
/// Used by config loading to resolve type names written in configuration.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeRef>,
}

impl TypeRegistry {
    /// Build a registry from a set of types.
    ///
    /// Supertypes reachable from the given types are registered as well.
    #[must_use]
    pub fn new(types: impl IntoIterator<Item = TypeRef>) -> Self {
        let mut registry = Self::default();
        for ty in types {
            registry.insert(ty);
        }
        registry
    }

    fn insert(&mut self, ty: TypeRef) {
        if self.types.contains_key(ty.name()) {
            return;
        }
        if let Some(superclass) = ty.superclass() {
            self.insert(Arc::clone(superclass));
        }
        for ifc in ty.interfaces() {
            self.insert(Arc::clone(ifc));
        }
        self.types.insert(ty.name().to_owned(), ty);
    }

    /// Look up a type by name.
    ///
    /// # Errors
    ///
    /// Returns [`AopError::UnknownType`] listing the registered names.
    pub fn get(&self, name: &str) -> Result<&TypeRef, AopError> {
        self.types.get(name).ok_or_else(|| AopError::UnknownType {
            name: name.to_owned(),
            available: self.names(),
        })
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// Note: TypeInfo and Method only hold Arc/String/Vec, so they are Send + Sync
// without any manual impl.
