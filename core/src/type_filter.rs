//! `TypeFilter`: Does advice apply to instances of this type?
//!
//! The type half of a [`Pointcut`](crate::Pointcut). Filters are pure and
//! shared: the same filter may sit inside many pointcuts at once.
//!
//! # Available Filters
//!
//! - [`TrueTypeFilter`]: matches every type ([`TypeFilters::always`])
//! - [`RootTypeFilter`]: matches a type and all of its subtypes
//! - [`UnionTypeFilter`] / [`IntersectionTypeFilter`]: boolean composition

use crate::TypeInfo;
use std::fmt::Debug;
use std::sync::{Arc, LazyLock};

/// Predicate over a target type.
///
/// Implementations must return `false` (never fail) for types unrelated to
/// the advice's intended target.
///
/// # Example
///
/// ```
/// use weft::{RootTypeFilter, TypeFilter, TypeInfo};
///
/// let service = TypeInfo::interface("app.Service").build();
/// let impl_ = TypeInfo::class("app.ServiceImpl").implements(&service).build();
/// let other = TypeInfo::class("app.Other").build();
///
/// let filter = RootTypeFilter::new("app.Service");
/// assert!(filter.matches(&impl_));
/// assert!(!filter.matches(&other));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `TypeFilter`",
    label = "this type cannot filter target types",
    note = "use RootTypeFilter, TrueTypeFilter, or implement `matches(&self, &TypeInfo) -> bool`"
)]
pub trait TypeFilter: Send + Sync + Debug {
    /// Should advice apply to instances of `target`?
    fn matches(&self, target: &TypeInfo) -> bool;

    /// Returns `true` only for a filter that matches every type.
    ///
    /// Lets [`Pointcut::applies_to`](crate::Pointcut::applies_to) take its
    /// fast path. Default is `false`.
    fn is_always(&self) -> bool {
        false
    }
}

static ALWAYS: LazyLock<Arc<dyn TypeFilter>> = LazyLock::new(|| Arc::new(TrueTypeFilter));

/// Constructors for shared and composite type filters.
#[derive(Debug, Clone, Copy)]
pub struct TypeFilters;

impl TypeFilters {
    /// The shared filter matching every type.
    #[must_use]
    pub fn always() -> Arc<dyn TypeFilter> {
        Arc::clone(&ALWAYS)
    }

    /// A filter matching when either operand matches.
    #[must_use]
    pub fn union(a: Arc<dyn TypeFilter>, b: Arc<dyn TypeFilter>) -> Arc<dyn TypeFilter> {
        Arc::new(UnionTypeFilter::new(vec![a, b]))
    }

    /// A filter matching only when both operands match.
    #[must_use]
    pub fn intersection(a: Arc<dyn TypeFilter>, b: Arc<dyn TypeFilter>) -> Arc<dyn TypeFilter> {
        Arc::new(IntersectionTypeFilter::new(vec![a, b]))
    }
}

/// Matches every type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrueTypeFilter;

impl TypeFilter for TrueTypeFilter {
    fn matches(&self, _target: &TypeInfo) -> bool {
        true
    }

    fn is_always(&self) -> bool {
        true
    }
}

/// Matches `root` and every type assignable to it.
#[derive(Debug, Clone)]
pub struct RootTypeFilter {
    root: String,
}

impl RootTypeFilter {
    /// Create a filter rooted at the named type.
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// The root type name.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }
}

impl TypeFilter for RootTypeFilter {
    fn matches(&self, target: &TypeInfo) -> bool {
        target.is_assignable_to(&self.root)
    }
}

/// Matches when any operand matches.
///
/// An empty union matches nothing.
#[derive(Debug, Clone)]
pub struct UnionTypeFilter {
    filters: Vec<Arc<dyn TypeFilter>>,
}

impl UnionTypeFilter {
    /// Create a union over the given filters.
    #[must_use]
    pub fn new(filters: Vec<Arc<dyn TypeFilter>>) -> Self {
        Self { filters }
    }

    /// The operands, in evaluation order.
    #[must_use]
    pub fn filters(&self) -> &[Arc<dyn TypeFilter>] {
        &self.filters
    }
}

impl TypeFilter for UnionTypeFilter {
    fn matches(&self, target: &TypeInfo) -> bool {
        self.filters.iter().any(|f| f.matches(target))
    }

    fn is_always(&self) -> bool {
        self.filters.iter().any(|f| f.is_always())
    }
}

/// Matches when every operand matches.
///
/// An empty intersection matches everything (vacuous truth).
#[derive(Debug, Clone)]
pub struct IntersectionTypeFilter {
    filters: Vec<Arc<dyn TypeFilter>>,
}

impl IntersectionTypeFilter {
    /// Create an intersection over the given filters.
    #[must_use]
    pub fn new(filters: Vec<Arc<dyn TypeFilter>>) -> Self {
        Self { filters }
    }

    /// The operands, in evaluation order.
    #[must_use]
    pub fn filters(&self) -> &[Arc<dyn TypeFilter>] {
        &self.filters
    }
}

impl TypeFilter for IntersectionTypeFilter {
    fn matches(&self, target: &TypeInfo) -> bool {
        self.filters.iter().all(|f| f.matches(target))
    }

    fn is_always(&self) -> bool {
        self.filters.iter().all(|f| f.is_always())
    }
}
