//! Pointcut: (type filter, method matcher) pairs and their algebra
//!
//! A [`Pointcut`] answers "does advice apply to this call?". It is a cheap,
//! clonable value: both halves are shared `Arc`s, so the same filter or
//! matcher can appear in many pointcuts.
//!
//! # Evaluation order
//!
//! [`Pointcut::applies_to`] evaluates strictly cheapest-first:
//!
//! 1. universal pointcut → `true` without running either half
//! 2. type filter rejects → `false` (method matcher never runs)
//! 3. static method check rejects → `false`
//! 4. no runtime stage → `true`
//! 5. otherwise the dynamic argument check decides
//!
//! # Union is coupled
//!
//! [`Pointcut::union`] is *not* `(union of filters, union of matchers)`: that
//! would let side A's method matcher fire on types only side B accepts. Each
//! side's matcher stays bound to its own filter via
//! [`CoupledUnionMethodMatcher`].

use crate::{
    CoupledUnionMethodMatcher, MatchStage, MatchTrace, Method, MethodMatcher, MethodMatchers,
    StaticFnMatcher, TypeFilter, TypeFilters, TypeInfo, Value,
};
use std::fmt;
use std::sync::{Arc, LazyLock};

static SETTERS: LazyLock<Arc<dyn MethodMatcher>> = LazyLock::new(|| {
    Arc::new(StaticFnMatcher::new("setters", |m, _| {
        m.name().starts_with("set") && m.parameter_types().len() == 1 && m.return_type().is_none()
    }))
});

static GETTERS: LazyLock<Arc<dyn MethodMatcher>> = LazyLock::new(|| {
    Arc::new(StaticFnMatcher::new("getters", |m, _| {
        m.name().starts_with("get") && m.parameter_types().is_empty()
    }))
});

/// Where advice applies: a type filter paired with a method matcher.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use weft::{Method, Pointcut, RootTypeFilter, TypeInfo};
///
/// let repo = TypeInfo::interface("app.Repository").build();
/// let users = TypeInfo::class("app.UserRepository")
///     .implements(&repo)
///     .method("setName", &["String"])
///     .build();
///
/// let pointcut = Pointcut::setters().intersect_type_filter(Arc::new(RootTypeFilter::new("app.Repository")));
/// let set_name = users.find_method("setName", &["String"]).unwrap();
/// assert!(pointcut.applies_to(set_name, &users, &["bob".into()]));
/// ```
#[derive(Clone)]
pub struct Pointcut {
    type_filter: Arc<dyn TypeFilter>,
    method_matcher: Arc<dyn MethodMatcher>,
}

impl Pointcut {
    /// Pair a type filter with a method matcher.
    #[must_use]
    pub fn new(type_filter: Arc<dyn TypeFilter>, method_matcher: Arc<dyn MethodMatcher>) -> Self {
        Self {
            type_filter,
            method_matcher,
        }
    }

    /// The universal pointcut: matches every call.
    #[must_use]
    pub fn always() -> Self {
        Self::new(TypeFilters::always(), MethodMatchers::always())
    }

    /// Every method of types accepted by `type_filter`.
    #[must_use]
    pub fn from_type_filter(type_filter: Arc<dyn TypeFilter>) -> Self {
        Self::new(type_filter, MethodMatchers::always())
    }

    /// Methods accepted by `method_matcher`, on any type.
    #[must_use]
    pub fn from_method_matcher(method_matcher: Arc<dyn MethodMatcher>) -> Self {
        Self::new(TypeFilters::always(), method_matcher)
    }

    /// Bean-style setters: `set*`, one parameter, no return value.
    #[must_use]
    pub fn setters() -> Self {
        Self::from_method_matcher(Arc::clone(&SETTERS))
    }

    /// Bean-style getters: `get*` with no parameters.
    ///
    /// The return type is not checked, so a `get*` method returning nothing
    /// still counts.
    #[must_use]
    pub fn getters() -> Self {
        Self::from_method_matcher(Arc::clone(&GETTERS))
    }

    /// The type half.
    #[must_use]
    pub fn type_filter(&self) -> &Arc<dyn TypeFilter> {
        &self.type_filter
    }

    /// The method half.
    #[must_use]
    pub fn method_matcher(&self) -> &Arc<dyn MethodMatcher> {
        &self.method_matcher
    }

    /// Returns `true` if this pointcut matches every call.
    #[must_use]
    pub fn is_always(&self) -> bool {
        self.type_filter.is_always() && self.method_matcher.is_always()
    }

    /// Does advice bound to this pointcut apply to the call?
    ///
    /// See the module docs for the evaluation order.
    #[must_use]
    pub fn applies_to(&self, method: &Method, target: &TypeInfo, args: &[Value]) -> bool {
        if self.is_always() {
            return true;
        }
        if !self.type_filter.matches(target) {
            return false;
        }
        if !self.method_matcher.matches_static(method, target) {
            return false;
        }
        if !self.method_matcher.is_runtime() {
            return true;
        }
        self.method_matcher.matches_dynamic(method, target, args)
    }

    /// [`applies_to`](Self::applies_to) with a record of the deciding stage.
    #[must_use]
    pub fn applies_to_with_trace(
        &self,
        method: &Method,
        target: &TypeInfo,
        args: &[Value],
    ) -> MatchTrace {
        if self.is_always() {
            return MatchTrace::always();
        }
        let mut trace = MatchTrace {
            matched: false,
            decided_by: MatchStage::TypeFilter,
            type_filter: Some(self.type_filter.matches(target)),
            static_match: None,
            dynamic_match: None,
        };
        if trace.type_filter == Some(false) {
            return trace;
        }

        let static_match = self.method_matcher.matches_static(method, target);
        trace.static_match = Some(static_match);
        if !static_match {
            trace.decided_by = MatchStage::Static;
            return trace;
        }
        if !self.method_matcher.is_runtime() {
            trace.matched = true;
            trace.decided_by = MatchStage::StaticOnly;
            return trace;
        }

        let dynamic_match = self.method_matcher.matches_dynamic(method, target, args);
        trace.matched = dynamic_match;
        trace.dynamic_match = Some(dynamic_match);
        trace.decided_by = MatchStage::Dynamic;
        trace
    }

    /// Calls matched by `self` or by `other`.
    ///
    /// Each side's method matcher only applies to types its own type filter
    /// accepts.
    #[must_use]
    pub fn union(&self, other: &Pointcut) -> Pointcut {
        Pointcut::new(
            TypeFilters::union(Arc::clone(&self.type_filter), Arc::clone(&other.type_filter)),
            Arc::new(CoupledUnionMethodMatcher::new(
                Arc::clone(&self.type_filter),
                Arc::clone(&self.method_matcher),
                Arc::clone(&other.type_filter),
                Arc::clone(&other.method_matcher),
            )),
        )
    }

    /// Calls matched by both `self` and `other`.
    #[must_use]
    pub fn intersection(&self, other: &Pointcut) -> Pointcut {
        Pointcut::new(
            TypeFilters::intersection(
                Arc::clone(&self.type_filter),
                Arc::clone(&other.type_filter),
            ),
            MethodMatchers::intersection(
                Arc::clone(&self.method_matcher),
                Arc::clone(&other.method_matcher),
            ),
        )
    }

    /// Widen the type half only.
    #[must_use]
    pub fn union_type_filter(self, filter: Arc<dyn TypeFilter>) -> Pointcut {
        Pointcut::new(TypeFilters::union(self.type_filter, filter), self.method_matcher)
    }

    /// Narrow the type half only.
    #[must_use]
    pub fn intersect_type_filter(self, filter: Arc<dyn TypeFilter>) -> Pointcut {
        Pointcut::new(
            TypeFilters::intersection(self.type_filter, filter),
            self.method_matcher,
        )
    }

    /// Widen the method half only.
    #[must_use]
    pub fn union_method_matcher(self, matcher: Arc<dyn MethodMatcher>) -> Pointcut {
        Pointcut::new(
            self.type_filter,
            MethodMatchers::union(self.method_matcher, matcher),
        )
    }

    /// Narrow the method half only.
    #[must_use]
    pub fn intersect_method_matcher(self, matcher: Arc<dyn MethodMatcher>) -> Pointcut {
        Pointcut::new(
            self.type_filter,
            MethodMatchers::intersection(self.method_matcher, matcher),
        )
    }
}

impl fmt::Debug for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pointcut")
            .field("type_filter", &self.type_filter)
            .field("method_matcher", &self.method_matcher)
            .finish()
    }
}

impl fmt::Display for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_always() {
            return f.write_str("Pointcut(always)");
        }
        write!(
            f,
            "Pointcut(types: {:?}, methods: {:?})",
            self.type_filter, self.method_matcher
        )
    }
}
