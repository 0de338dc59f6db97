//! Match trace types for debugging applicability decisions.
//!
//! [`Pointcut::applies_to_with_trace`](crate::Pointcut::applies_to_with_trace)
//! runs the same staged procedure as `applies_to` and records which stage
//! settled the answer.
//!
//! # INV: `matched` == `applies_to()` result
//!
//! A trace never changes evaluation: stages that `applies_to` would skip are
//! skipped here too and recorded as `None`.

use std::fmt;

/// The stage that decided a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    /// The pointcut matches everything; no filter ran.
    Always,
    /// The type filter rejected the target type.
    TypeFilter,
    /// The method matcher's static check rejected the method.
    Static,
    /// The static check accepted and no runtime check exists.
    StaticOnly,
    /// The dynamic argument check decided.
    Dynamic,
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Always => "always",
            Self::TypeFilter => "type filter",
            Self::Static => "static method check",
            Self::StaticOnly => "static method check (no runtime check)",
            Self::Dynamic => "dynamic argument check",
        };
        f.write_str(s)
    }
}

/// Trace of one `applies_to` evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTrace {
    /// Final result (identical to `applies_to`).
    pub matched: bool,
    /// Which stage settled the result.
    pub decided_by: MatchStage,
    /// Type filter result, `None` if it did not run.
    pub type_filter: Option<bool>,
    /// Static method check result, `None` if it did not run.
    pub static_match: Option<bool>,
    /// Dynamic check result, `None` if it did not run.
    pub dynamic_match: Option<bool>,
}

impl MatchTrace {
    pub(crate) fn always() -> Self {
        Self {
            matched: true,
            decided_by: MatchStage::Always,
            type_filter: None,
            static_match: None,
            dynamic_match: None,
        }
    }
}

impl fmt::Display for MatchTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.matched { "matched" } else { "rejected" };
        write!(f, "{verdict} by {}", self.decided_by)
    }
}
