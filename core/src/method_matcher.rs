//! `MethodMatcher`: Does advice apply to this method (and these arguments)?
//!
//! The method half of a [`Pointcut`](crate::Pointcut). A matcher always has a
//! static check over `(method, target type)`. If [`MethodMatcher::is_runtime`]
//! returns `true` it also has a dynamic check over the actual call arguments,
//! which callers run only after the static check passed.
//!
//! # Available Matchers
//!
//! - [`TrueMethodMatcher`]: matches every method ([`MethodMatchers::always`])
//! - [`StaticFnMatcher`] / [`DynamicFnMatcher`]: closure-backed matchers
//! - [`ArgumentMatcher`]: dynamic match on one argument's value
//! - [`UnionMethodMatcher`] / [`IntersectionMethodMatcher`]: boolean composition
//! - [`CoupledUnionMethodMatcher`]: union keeping each side bound to its own type filter

use crate::{Method, TypeFilter, TypeInfo, Value, ValueMatcher};
use std::fmt::{self, Debug};
use std::sync::{Arc, LazyLock};

/// Predicate over a method, with an optional argument-dependent stage.
///
/// # Contract
///
/// - [`matches_static`](Self::matches_static) is pure and is the complete
///   answer when [`is_runtime`](Self::is_runtime) is `false`.
/// - [`matches_dynamic`](Self::matches_dynamic) is only called when
///   `is_runtime()` is `true` **and** `matches_static` already returned `true`
///   for the same method and type. Calling it on a static-only matcher is a
///   caller defect; the default implementation panics.
pub trait MethodMatcher: Send + Sync + Debug {
    /// Does the method match, judged from its signature and the target type?
    fn matches_static(&self, method: &Method, target: &TypeInfo) -> bool;

    /// Does this matcher need the call arguments to decide?
    fn is_runtime(&self) -> bool {
        false
    }

    /// Argument-dependent check, run per call.
    ///
    /// # Panics
    ///
    /// The default implementation panics: static-only matchers have no
    /// dynamic stage. Check [`is_runtime`](Self::is_runtime) first.
    fn matches_dynamic(&self, method: &Method, target: &TypeInfo, args: &[Value]) -> bool {
        let _ = (target, args);
        panic!(
            "matches_dynamic called on static-only matcher {self:?} for {method}; \
             check is_runtime() first"
        )
    }

    /// Returns `true` only for a matcher accepting every method statically
    /// with no runtime stage.
    fn is_always(&self) -> bool {
        false
    }
}

static ALWAYS: LazyLock<Arc<dyn MethodMatcher>> = LazyLock::new(|| Arc::new(TrueMethodMatcher));

/// Constructors and evaluation helpers for method matchers.
#[derive(Debug, Clone, Copy)]
pub struct MethodMatchers;

impl MethodMatchers {
    /// The shared matcher accepting every method.
    #[must_use]
    pub fn always() -> Arc<dyn MethodMatcher> {
        Arc::clone(&ALWAYS)
    }

    /// A matcher accepting methods either operand accepts.
    #[must_use]
    pub fn union(a: Arc<dyn MethodMatcher>, b: Arc<dyn MethodMatcher>) -> Arc<dyn MethodMatcher> {
        Arc::new(UnionMethodMatcher::new(a, b))
    }

    /// A matcher accepting methods both operands accept.
    #[must_use]
    pub fn intersection(
        a: Arc<dyn MethodMatcher>,
        b: Arc<dyn MethodMatcher>,
    ) -> Arc<dyn MethodMatcher> {
        Arc::new(IntersectionMethodMatcher::new(a, b))
    }

    /// Full evaluation of one matcher: static, then dynamic if required.
    ///
    /// Safe for every matcher: the dynamic stage only runs for runtime
    /// matchers whose static stage passed.
    pub fn matches(
        matcher: &dyn MethodMatcher,
        method: &Method,
        target: &TypeInfo,
        args: &[Value],
    ) -> bool {
        matcher.matches_static(method, target)
            && (!matcher.is_runtime() || matcher.matches_dynamic(method, target, args))
    }
}

/// Matches every method.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrueMethodMatcher;

impl MethodMatcher for TrueMethodMatcher {
    fn matches_static(&self, _method: &Method, _target: &TypeInfo) -> bool {
        true
    }

    fn is_always(&self) -> bool {
        true
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Closure-backed matchers
// ═══════════════════════════════════════════════════════════════════════════════

type StaticCheck = dyn Fn(&Method, &TypeInfo) -> bool + Send + Sync;
type DynamicCheck = dyn Fn(&Method, &TypeInfo, &[Value]) -> bool + Send + Sync;

/// A static-only matcher backed by a closure.
///
/// # Example
///
/// ```
/// use weft::{Method, MethodMatcher, StaticFnMatcher, TypeInfo};
///
/// let no_args = StaticFnMatcher::new("no-arg methods", |m, _| m.parameter_types().is_empty());
/// let ty = TypeInfo::class("a.B").build();
/// assert!(no_args.matches_static(&Method::new("a.B", "run", &[]), &ty));
/// assert!(!no_args.is_runtime());
/// ```
pub struct StaticFnMatcher {
    description: String,
    check: Box<StaticCheck>,
}

impl StaticFnMatcher {
    /// Create a matcher from a description and a static check.
    pub fn new<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Method, &TypeInfo) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            check: Box::new(check),
        }
    }
}

impl Debug for StaticFnMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticFnMatcher")
            .field(&self.description)
            .finish()
    }
}

impl MethodMatcher for StaticFnMatcher {
    fn matches_static(&self, method: &Method, target: &TypeInfo) -> bool {
        (self.check)(method, target)
    }
}

/// A runtime matcher backed by closures.
///
/// The static stage accepts every method unless one is supplied with
/// [`with_static`](Self::with_static).
pub struct DynamicFnMatcher {
    description: String,
    static_check: Option<Box<StaticCheck>>,
    dynamic_check: Box<DynamicCheck>,
}

impl DynamicFnMatcher {
    /// Create a matcher from a description and an argument check.
    pub fn new<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Method, &TypeInfo, &[Value]) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            static_check: None,
            dynamic_check: Box::new(check),
        }
    }

    /// Narrow the static stage.
    #[must_use]
    pub fn with_static<F>(mut self, check: F) -> Self
    where
        F: Fn(&Method, &TypeInfo) -> bool + Send + Sync + 'static,
    {
        self.static_check = Some(Box::new(check));
        self
    }
}

impl Debug for DynamicFnMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynamicFnMatcher")
            .field(&self.description)
            .finish()
    }
}

impl MethodMatcher for DynamicFnMatcher {
    fn matches_static(&self, method: &Method, target: &TypeInfo) -> bool {
        self.static_check
            .as_ref()
            .map_or(true, |check| check(method, target))
    }

    fn is_runtime(&self) -> bool {
        true
    }

    fn matches_dynamic(&self, method: &Method, target: &TypeInfo, args: &[Value]) -> bool {
        (self.dynamic_check)(method, target, args)
    }
}

/// Dynamic match on the value of one call argument.
///
/// Statically, only methods with a parameter at `index` are candidates.
/// Dynamically, a missing argument or [`Value::Unit`] never matches.
#[derive(Debug)]
pub struct ArgumentMatcher {
    index: usize,
    matcher: Box<dyn ValueMatcher>,
}

impl ArgumentMatcher {
    /// Match the argument at `index` with `matcher`.
    #[must_use]
    pub fn new(index: usize, matcher: Box<dyn ValueMatcher>) -> Self {
        Self { index, matcher }
    }

    /// Zero-based argument position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl MethodMatcher for ArgumentMatcher {
    fn matches_static(&self, method: &Method, _target: &TypeInfo) -> bool {
        method.parameter_types().len() > self.index
    }

    fn is_runtime(&self) -> bool {
        true
    }

    fn matches_dynamic(&self, _method: &Method, _target: &TypeInfo, args: &[Value]) -> bool {
        match args.get(self.index) {
            None | Some(Value::Unit) => false,
            Some(value) => self.matcher.matches(value),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Composites
// ═══════════════════════════════════════════════════════════════════════════════

/// Accepts a method when either operand accepts it.
///
/// Runtime if either operand is. The dynamic stage evaluates each operand in
/// full (static, then dynamic if that operand is runtime), so an operand whose
/// static check fails never has its dynamic check invoked.
#[derive(Debug, Clone)]
pub struct UnionMethodMatcher {
    a: Arc<dyn MethodMatcher>,
    b: Arc<dyn MethodMatcher>,
}

impl UnionMethodMatcher {
    /// Create a union of two matchers.
    #[must_use]
    pub fn new(a: Arc<dyn MethodMatcher>, b: Arc<dyn MethodMatcher>) -> Self {
        Self { a, b }
    }
}

impl MethodMatcher for UnionMethodMatcher {
    fn matches_static(&self, method: &Method, target: &TypeInfo) -> bool {
        self.a.matches_static(method, target) || self.b.matches_static(method, target)
    }

    fn is_runtime(&self) -> bool {
        self.a.is_runtime() || self.b.is_runtime()
    }

    fn matches_dynamic(&self, method: &Method, target: &TypeInfo, args: &[Value]) -> bool {
        MethodMatchers::matches(&*self.a, method, target, args)
            || MethodMatchers::matches(&*self.b, method, target, args)
    }

    fn is_always(&self) -> bool {
        self.a.is_always() || self.b.is_always()
    }
}

/// Accepts a method only when both operands accept it.
///
/// Runtime if either operand is. The dynamic stage runs once the composite
/// static check has passed, so each operand's static check already holds:
/// a runtime operand is asked for its dynamic answer, a static-only operand
/// answers with its static check (its dynamic form is never called).
#[derive(Debug, Clone)]
pub struct IntersectionMethodMatcher {
    a: Arc<dyn MethodMatcher>,
    b: Arc<dyn MethodMatcher>,
}

impl IntersectionMethodMatcher {
    /// Create an intersection of two matchers.
    #[must_use]
    pub fn new(a: Arc<dyn MethodMatcher>, b: Arc<dyn MethodMatcher>) -> Self {
        Self { a, b }
    }

    fn operand_matches(
        operand: &dyn MethodMatcher,
        method: &Method,
        target: &TypeInfo,
        args: &[Value],
    ) -> bool {
        if operand.is_runtime() {
            operand.matches_dynamic(method, target, args)
        } else {
            operand.matches_static(method, target)
        }
    }
}

impl MethodMatcher for IntersectionMethodMatcher {
    fn matches_static(&self, method: &Method, target: &TypeInfo) -> bool {
        self.a.matches_static(method, target) && self.b.matches_static(method, target)
    }

    fn is_runtime(&self) -> bool {
        self.a.is_runtime() || self.b.is_runtime()
    }

    fn matches_dynamic(&self, method: &Method, target: &TypeInfo, args: &[Value]) -> bool {
        Self::operand_matches(&*self.a, method, target, args)
            && Self::operand_matches(&*self.b, method, target, args)
    }

    fn is_always(&self) -> bool {
        self.a.is_always() && self.b.is_always()
    }
}

/// Union of two `(type filter, method matcher)` sides.
///
/// A method matches when *one side* accepts both the target type and the
/// method. Side A's matcher is therefore never consulted for a type only side
/// B's filter accepts. This is the method half of
/// [`Pointcut::union`](crate::Pointcut::union).
#[derive(Debug, Clone)]
pub struct CoupledUnionMethodMatcher {
    a_filter: Arc<dyn TypeFilter>,
    a: Arc<dyn MethodMatcher>,
    b_filter: Arc<dyn TypeFilter>,
    b: Arc<dyn MethodMatcher>,
}

impl CoupledUnionMethodMatcher {
    /// Bind each matcher to its own type filter.
    #[must_use]
    pub fn new(
        a_filter: Arc<dyn TypeFilter>,
        a: Arc<dyn MethodMatcher>,
        b_filter: Arc<dyn TypeFilter>,
        b: Arc<dyn MethodMatcher>,
    ) -> Self {
        Self {
            a_filter,
            a,
            b_filter,
            b,
        }
    }
}

impl MethodMatcher for CoupledUnionMethodMatcher {
    fn matches_static(&self, method: &Method, target: &TypeInfo) -> bool {
        (self.a_filter.matches(target) && self.a.matches_static(method, target))
            || (self.b_filter.matches(target) && self.b.matches_static(method, target))
    }

    fn is_runtime(&self) -> bool {
        self.a.is_runtime() || self.b.is_runtime()
    }

    fn matches_dynamic(&self, method: &Method, target: &TypeInfo, args: &[Value]) -> bool {
        (self.a_filter.matches(target) && MethodMatchers::matches(&*self.a, method, target, args))
            || (self.b_filter.matches(target)
                && MethodMatchers::matches(&*self.b, method, target, args))
    }
}
