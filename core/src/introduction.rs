//! Introductions: make a proxy additionally implement interfaces.
//!
//! A delegate backs the introduced interfaces. [`IntroductionSupport`]
//! publishes every interface the delegate's type implements, minus
//! suppressed ones, and classifies methods as introduced or not.
//! [`DelegatingIntroductionInterceptor`] forwards introduced calls to the
//! delegate and lets everything else proceed.
//!
//! # Caching
//!
//! Method classification is cached per [`MethodSignature`] in a `DashMap`.
//! Concurrent first lookups may compute the same answer twice; the result is
//! identical, so the last write wins harmlessly.

use crate::{
    Advice, AdviceKind, AopError, InvocationFailure, Method, MethodInterceptor, MethodInvocation,
    MethodSignature, Thrown, TypeFilter, TypeFilters, TypeRef, Value,
};
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The object backing introduced interfaces.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `IntroductionDelegate`",
    label = "this type cannot back an introduction",
    note = "implement `delegate_type()` and `invoke(&self, &Method, &[Value])`"
)]
pub trait IntroductionDelegate: Send + Sync + fmt::Debug {
    /// The delegate's type; its interfaces are what gets published.
    fn delegate_type(&self) -> &TypeRef;

    /// Run `method` on the delegate.
    ///
    /// # Errors
    ///
    /// [`InvocationFailure::Target`] wrapping the delegate's own error, or
    /// [`InvocationFailure::NoSuchMethod`].
    fn invoke(&self, method: &Method, args: &[Value]) -> Result<Value, InvocationFailure>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IntroductionSupport
// ═══════════════════════════════════════════════════════════════════════════════

/// Published interface set plus the introduced-method cache.
pub struct IntroductionSupport {
    delegate_type: TypeRef,
    published: Vec<TypeRef>,
    introduced: DashMap<MethodSignature, bool>,
}

impl IntroductionSupport {
    /// Publish every interface `delegate_type` implements.
    #[must_use]
    pub fn new(delegate_type: &TypeRef) -> Self {
        Self {
            delegate_type: Arc::clone(delegate_type),
            published: delegate_type.all_interfaces(),
            introduced: DashMap::new(),
        }
    }

    /// Remove `interface` from the published set.
    ///
    /// The delegate still implements it; the proxy just won't expose it.
    pub fn suppress_interface(&mut self, interface: &str) {
        let before = self.published.len();
        self.published.retain(|i| i.name() != interface);
        if self.published.len() != before {
            self.introduced.clear();
            tracing::debug!(
                interface,
                delegate = self.delegate_type.name(),
                "suppressed introduced interface"
            );
        }
    }

    /// The published interfaces.
    #[must_use]
    pub fn interfaces(&self) -> &[TypeRef] {
        &self.published
    }

    /// The delegate's type.
    #[must_use]
    pub fn delegate_type(&self) -> &TypeRef {
        &self.delegate_type
    }

    /// Is `interface` (or a sub-interface of it) published?
    #[must_use]
    pub fn implements_interface(&self, interface: &str) -> bool {
        self.published.iter().any(|i| i.is_assignable_to(interface))
    }

    /// Does `method` belong to a published interface?
    ///
    /// Methods declared on a super-interface of a published interface count,
    /// even when that super-interface was itself suppressed.
    #[must_use]
    pub fn is_introduced_method(&self, method: &Method) -> bool {
        let signature = method.signature();
        if let Some(hit) = self.introduced.get(&signature) {
            return *hit;
        }
        let introduced = self
            .published
            .iter()
            .any(|i| i.is_assignable_to(method.declaring_type()));
        tracing::trace!(method = %method, introduced, "introduction cache fill");
        self.introduced.insert(signature, introduced);
        introduced
    }
}

impl fmt::Debug for IntroductionSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.published.iter().map(|i| i.name()).collect();
        f.debug_struct("IntroductionSupport")
            .field("delegate_type", &self.delegate_type.name())
            .field("published", &names)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Interceptor
// ═══════════════════════════════════════════════════════════════════════════════

/// Forwards introduced methods to a delegate; everything else proceeds.
#[derive(Debug)]
pub struct DelegatingIntroductionInterceptor {
    support: IntroductionSupport,
    delegate: Arc<dyn IntroductionDelegate>,
    order: Option<i32>,
}

impl DelegatingIntroductionInterceptor {
    /// Publish all of `delegate`'s interfaces.
    #[must_use]
    pub fn new(delegate: Arc<dyn IntroductionDelegate>) -> Self {
        Self {
            support: IntroductionSupport::new(delegate.delegate_type()),
            delegate,
            order: None,
        }
    }

    /// Hide `interface` from the proxy.
    #[must_use]
    pub fn suppress_interface(mut self, interface: &str) -> Self {
        self.support.suppress_interface(interface);
        self
    }

    /// Set the advice-level ordering hint.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Published interfaces and method classification.
    #[must_use]
    pub fn support(&self) -> &IntroductionSupport {
        &self.support
    }

    /// The backing delegate.
    #[must_use]
    pub fn delegate(&self) -> &Arc<dyn IntroductionDelegate> {
        &self.delegate
    }
}

impl MethodInterceptor for DelegatingIntroductionInterceptor {
    fn invoke(&self, invocation: &mut dyn MethodInvocation) -> Result<Value, Thrown> {
        if !self.support.is_introduced_method(invocation.method()) {
            return invocation.proceed();
        }
        self.delegate
            .invoke(invocation.method(), invocation.arguments())
            .map_err(InvocationFailure::into_thrown)
    }
}

impl Advice for DelegatingIntroductionInterceptor {
    fn kind(&self) -> AdviceKind {
        AdviceKind::Introduction
    }

    fn order(&self) -> Option<i32> {
        self.order
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IntroductionAdvisor
// ═══════════════════════════════════════════════════════════════════════════════

/// An introduction bound to the types it may be applied to.
///
/// Only obtainable through [`IntroductionAdvisor::builder`], which validates
/// the claimed interfaces.
#[derive(Debug, Clone)]
pub struct IntroductionAdvisor {
    interceptor: Arc<DelegatingIntroductionInterceptor>,
    interfaces: Vec<TypeRef>,
    type_filter: Arc<dyn TypeFilter>,
    order: Option<i32>,
}

impl IntroductionAdvisor {
    /// Start building an advisor for `interceptor`.
    #[must_use]
    pub fn builder(interceptor: DelegatingIntroductionInterceptor) -> IntroductionAdvisorBuilder {
        IntroductionAdvisorBuilder {
            interceptor,
            interfaces: Vec::new(),
            type_filter: None,
            order: None,
        }
    }

    /// The interfaces this advisor introduces.
    #[must_use]
    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    /// Which target types may receive the introduction.
    #[must_use]
    pub fn type_filter(&self) -> &Arc<dyn TypeFilter> {
        &self.type_filter
    }

    /// The forwarding interceptor.
    #[must_use]
    pub fn interceptor(&self) -> &Arc<DelegatingIntroductionInterceptor> {
        &self.interceptor
    }

    /// Explicit order, else the interceptor's own.
    #[must_use]
    pub fn order(&self) -> Option<i32> {
        self.order.or_else(|| self.interceptor.order())
    }

    pub(crate) fn set_order(&mut self, order: i32) {
        self.order = Some(order);
    }

    /// Check every claimed interface is an interface the delegate publishes.
    ///
    /// # Errors
    ///
    /// [`AopError::NotAnInterface`] or [`AopError::InterfaceNotImplemented`]
    /// for the first offending type.
    pub fn validate_interfaces(&self) -> Result<(), AopError> {
        validate(&self.interceptor, &self.interfaces)
    }
}

fn validate(
    interceptor: &DelegatingIntroductionInterceptor,
    interfaces: &[TypeRef],
) -> Result<(), AopError> {
    let support = interceptor.support();
    for interface in interfaces {
        if !interface.is_interface() {
            return Err(AopError::NotAnInterface {
                name: interface.name().to_owned(),
            });
        }
        if !support.implements_interface(interface.name()) {
            return Err(AopError::InterfaceNotImplemented {
                interface: interface.name().to_owned(),
                delegate: support.delegate_type().name().to_owned(),
            });
        }
    }
    Ok(())
}

/// Builder for [`IntroductionAdvisor`].
#[derive(Debug)]
pub struct IntroductionAdvisorBuilder {
    interceptor: DelegatingIntroductionInterceptor,
    interfaces: Vec<TypeRef>,
    type_filter: Option<Arc<dyn TypeFilter>>,
    order: Option<i32>,
}

impl IntroductionAdvisorBuilder {
    /// Claim `interface`. Without any claims, every published interface is
    /// introduced.
    #[must_use]
    pub fn interface(mut self, interface: &TypeRef) -> Self {
        self.interfaces.push(Arc::clone(interface));
        self
    }

    /// Restrict target types (default: all types).
    #[must_use]
    pub fn type_filter(mut self, filter: Arc<dyn TypeFilter>) -> Self {
        self.type_filter = Some(filter);
        self
    }

    /// Ordering hint for the advisor, overriding the interceptor's.
    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// See [`IntroductionAdvisor::validate_interfaces`].
    pub fn build(self) -> Result<IntroductionAdvisor, AopError> {
        let interfaces = if self.interfaces.is_empty() {
            self.interceptor.support().interfaces().to_vec()
        } else {
            self.interfaces
        };
        validate(&self.interceptor, &interfaces)?;
        Ok(IntroductionAdvisor {
            interceptor: Arc::new(self.interceptor),
            interfaces,
            type_filter: self.type_filter.unwrap_or_else(TypeFilters::always),
            order: self.order,
        })
    }
}
