//! Applicability utilities for building per-type interception plans.
//!
//! These run once per (advisor, type) when a proxy is built, so they only use
//! static information: a type filter and the static half of each method
//! matcher. Per-call decisions stay with [`Pointcut::applies_to`].

use crate::{Advisor, Pointcut, TypeInfo};

/// Could `pointcut` ever apply to a call on `target`?
///
/// True when the type filter accepts `target` and at least one method
/// reachable on it (inherited and interface methods included) passes the
/// static method check.
#[must_use]
pub fn can_apply_pointcut(pointcut: &Pointcut, target: &TypeInfo) -> bool {
    if !pointcut.type_filter().matches(target) {
        return false;
    }
    let matcher = pointcut.method_matcher();
    if matcher.is_always() {
        return true;
    }
    target
        .reachable_methods()
        .into_iter()
        .any(|m| matcher.matches_static(m, target))
}

/// Could `advisor` ever apply to a call on `target`?
///
/// Introductions defer to their type filter alone; unconditional advisors
/// always apply.
#[must_use]
pub fn can_apply(advisor: &Advisor, target: &TypeInfo) -> bool {
    match advisor {
        Advisor::Pointcut(a) => can_apply_pointcut(a.pointcut(), target),
        Advisor::Introduction(a) => a.type_filter().matches(target),
        Advisor::Unconditional(_) => true,
    }
}

/// The candidates that can apply to `target`, in their original order.
#[must_use]
pub fn find_applicable_advisors(candidates: &[Advisor], target: &TypeInfo) -> Vec<Advisor> {
    candidates
        .iter()
        .filter(|advisor| {
            let applies = can_apply(advisor, target);
            tracing::debug!(
                type_name = target.name(),
                advisor = %advisor,
                applies,
                "advisor applicability"
            );
            applies
        })
        .cloned()
        .collect()
}

/// Stable sort by order; lower first, missing order last.
pub fn sort_by_order(advisors: &mut [Advisor]) {
    advisors.sort_by_key(Advisor::effective_order);
}
