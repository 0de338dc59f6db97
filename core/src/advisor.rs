//! Advisors: advice bound to where it applies.
//!
//! A closed set of variants:
//!
//! - [`PointcutAdvisor`]: advice gated by a [`Pointcut`]
//! - [`IntroductionAdvisor`]: interfaces added to types a filter accepts
//! - [`UnconditionalAdvisor`]: advice that applies everywhere
//!
//! An advisor's order is its explicit [`Advisor::with_order`] value, else the
//! advice's own [`Advice::order`], else none (lowest precedence).
//!
//! Advisors are shared across every proxy by default. A per-instance advisor
//! asks the proxy builder for a fresh advice instance per proxied object;
//! introductions are always per-instance since their delegate carries state.

use crate::{
    Advice, AopError, IntroductionAdvisor, NameMatchMethodMatcher, Pointcut, RegexMethodMatcher,
};
use std::fmt;
use std::sync::Arc;

/// Advice gated by a pointcut.
#[derive(Debug, Clone)]
pub struct PointcutAdvisor {
    pointcut: Pointcut,
    advice: Arc<dyn Advice>,
    order: Option<i32>,
    per_instance: bool,
}

impl PointcutAdvisor {
    /// Bind `advice` to `pointcut`.
    #[must_use]
    pub fn new(pointcut: Pointcut, advice: Arc<dyn Advice>) -> Self {
        Self {
            pointcut,
            advice,
            order: None,
            per_instance: false,
        }
    }

    /// Where the advice applies.
    #[must_use]
    pub fn pointcut(&self) -> &Pointcut {
        &self.pointcut
    }

    /// The advice.
    #[must_use]
    pub fn advice(&self) -> &Arc<dyn Advice> {
        &self.advice
    }
}

/// Advice that applies to every call on every type.
#[derive(Debug, Clone)]
pub struct UnconditionalAdvisor {
    advice: Arc<dyn Advice>,
    order: Option<i32>,
    per_instance: bool,
}

impl UnconditionalAdvisor {
    /// Wrap `advice`.
    #[must_use]
    pub fn new(advice: Arc<dyn Advice>) -> Self {
        Self {
            advice,
            order: None,
            per_instance: false,
        }
    }

    /// The advice.
    #[must_use]
    pub fn advice(&self) -> &Arc<dyn Advice> {
        &self.advice
    }
}

/// An advice payload and its applicability scope.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use weft::{Advice, AdviceKind, Advisor, LOWEST_PRECEDENCE};
///
/// #[derive(Debug)]
/// struct Audit;
///
/// impl Advice for Audit {
///     fn kind(&self) -> AdviceKind { AdviceKind::Before }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let advisor = Advisor::name_match(["app.Repo.save*"], Arc::new(Audit)).unwrap();
/// assert_eq!(advisor.order(), None);
/// assert_eq!(advisor.effective_order(), LOWEST_PRECEDENCE);
/// assert_eq!(advisor.with_order(10).order(), Some(10));
/// ```
#[derive(Debug, Clone)]
pub enum Advisor {
    /// Gated by a pointcut.
    Pointcut(PointcutAdvisor),
    /// Adds interfaces.
    Introduction(IntroductionAdvisor),
    /// Applies everywhere.
    Unconditional(UnconditionalAdvisor),
}

impl Advisor {
    /// Bind `advice` to `pointcut`.
    #[must_use]
    pub fn with_pointcut(pointcut: Pointcut, advice: Arc<dyn Advice>) -> Self {
        Self::Pointcut(PointcutAdvisor::new(pointcut, advice))
    }

    /// Advice on methods whose identity matches any regex in `patterns`.
    ///
    /// # Errors
    ///
    /// See [`PatternMethodMatcher::new`](crate::PatternMethodMatcher::new).
    pub fn regex<S: AsRef<str>>(
        patterns: impl IntoIterator<Item = S>,
        advice: Arc<dyn Advice>,
    ) -> Result<Self, AopError> {
        let matcher = RegexMethodMatcher::new(patterns)?;
        Ok(Self::with_pointcut(
            Pointcut::from_method_matcher(Arc::new(matcher)),
            advice,
        ))
    }

    /// Advice on methods whose identity matches any name glob in `names`.
    ///
    /// # Errors
    ///
    /// See [`PatternMethodMatcher::new`](crate::PatternMethodMatcher::new).
    pub fn name_match<S: AsRef<str>>(
        names: impl IntoIterator<Item = S>,
        advice: Arc<dyn Advice>,
    ) -> Result<Self, AopError> {
        let matcher = NameMatchMethodMatcher::new(names)?;
        Ok(Self::with_pointcut(
            Pointcut::from_method_matcher(Arc::new(matcher)),
            advice,
        ))
    }

    /// Advice that applies everywhere.
    #[must_use]
    pub fn unconditional(advice: Arc<dyn Advice>) -> Self {
        Self::Unconditional(UnconditionalAdvisor::new(advice))
    }

    /// Wrap a validated introduction.
    #[must_use]
    pub fn introduction(advisor: IntroductionAdvisor) -> Self {
        Self::Introduction(advisor)
    }

    /// Set an explicit order; lower runs first.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        match &mut self {
            Self::Pointcut(a) => a.order = Some(order),
            Self::Introduction(a) => a.set_order(order),
            Self::Unconditional(a) => a.order = Some(order),
        }
        self
    }

    /// Mark the advisor per-instance. Introductions already are.
    #[must_use]
    pub fn per_instance(mut self) -> Self {
        match &mut self {
            Self::Pointcut(a) => a.per_instance = true,
            Self::Unconditional(a) => a.per_instance = true,
            Self::Introduction(_) => {}
        }
        self
    }

    /// Does each proxied object need its own advice instance?
    #[must_use]
    pub fn is_per_instance(&self) -> bool {
        match self {
            Self::Pointcut(a) => a.per_instance,
            Self::Unconditional(a) => a.per_instance,
            Self::Introduction(_) => true,
        }
    }

    /// Explicit order, else the advice's own, else `None`.
    #[must_use]
    pub fn order(&self) -> Option<i32> {
        match self {
            Self::Pointcut(a) => a.order.or_else(|| a.advice.order()),
            Self::Introduction(a) => a.order(),
            Self::Unconditional(a) => a.order.or_else(|| a.advice.order()),
        }
    }

    /// [`order`](Self::order), defaulting to
    /// [`LOWEST_PRECEDENCE`](crate::LOWEST_PRECEDENCE).
    #[must_use]
    pub fn effective_order(&self) -> i32 {
        self.order().unwrap_or(crate::LOWEST_PRECEDENCE)
    }

    /// The advice payload.
    #[must_use]
    pub fn advice(&self) -> Arc<dyn Advice> {
        match self {
            Self::Pointcut(a) => Arc::clone(&a.advice),
            Self::Introduction(a) => Arc::clone(a.interceptor()) as Arc<dyn Advice>,
            Self::Unconditional(a) => Arc::clone(&a.advice),
        }
    }

    /// The pointcut, for pointcut advisors.
    #[must_use]
    pub fn pointcut(&self) -> Option<&Pointcut> {
        match self {
            Self::Pointcut(a) => Some(&a.pointcut),
            Self::Introduction(_) | Self::Unconditional(_) => None,
        }
    }
}

impl From<IntroductionAdvisor> for Advisor {
    fn from(advisor: IntroductionAdvisor) -> Self {
        Self::Introduction(advisor)
    }
}

impl From<PointcutAdvisor> for Advisor {
    fn from(advisor: PointcutAdvisor) -> Self {
        Self::Pointcut(advisor)
    }
}

impl fmt::Display for Advisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let advice = self.advice();
        match self {
            Self::Pointcut(a) => {
                write!(f, "{} advice {advice:?} at {}", advice.kind(), a.pointcut)?;
            }
            Self::Introduction(a) => {
                let names: Vec<&str> = a.interfaces().iter().map(|i| i.name()).collect();
                write!(f, "introduction of [{}] via {advice:?}", names.join(", "))?;
            }
            Self::Unconditional(_) => write!(f, "{} advice {advice:?} everywhere", advice.kind())?,
        }
        if let Some(order) = self.order() {
            write!(f, " (order {order})")?;
        }
        Ok(())
    }
}
