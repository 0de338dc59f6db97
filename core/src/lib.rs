//! weft - pointcut matching and advisor composition
//!
//! The predicate core of an aspect-oriented interception layer: decide which
//! advice applies to which method calls on which types, and compose those
//! decisions algebraically.
//!
//! # Architecture
//!
//! Matching is staged from cheapest to most expensive:
//!
//! - [`TypeFilter`]: does advice apply to instances of this type?
//! - [`MethodMatcher`]: static check on the method signature, optional
//!   dynamic check on the call's arguments
//! - [`Pointcut`]: a (type filter, method matcher) pair with union and
//!   intersection
//! - [`Advisor`]: a pointcut (or introduction, or nothing) bound to advice,
//!   with ordering metadata
//!
//! # Key Design Insights
//!
//! 1. **Fixed evaluation order**: [`Pointcut::applies_to`] never runs the
//!    method matcher on a rejected type, and never runs a dynamic check before
//!    the static check has accepted.
//!
//! 2. **Coupled union**: [`Pointcut::union`] keeps each side's method matcher
//!    bound to its own type filter, so one side's method predicate never leaks
//!    onto the other side's types.
//!
//! 3. **Immutable after construction**: every filter, matcher, pointcut and
//!    advisor is `Send + Sync` and shared by `Arc`. The only interior state is
//!    the introduction method cache and the control-flow evaluation counter.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weft::prelude::*;
//!
//! let service = TypeInfo::interface("app.AccountService")
//!     .method("getBalance", &["String"])
//!     .method("transfer", &["String", "String", "i64"])
//!     .build();
//! let impl_ = TypeInfo::class("app.AccountServiceImpl").implements(&service).build();
//!
//! let reads = Pointcut::from_method_matcher(Arc::new(
//!     RegexMethodMatcher::new([r".*\.get.*"]).unwrap(),
//! ))
//! .intersect_type_filter(Arc::new(RootTypeFilter::new("app.AccountService")));
//!
//! let balance = impl_.find_method("getBalance", &["String"]).unwrap();
//! let transfer = impl_.find_method("transfer", &["String", "String", "i64"]).unwrap();
//! assert!(reads.applies_to(balance, &impl_, &["acct-1".into()]));
//! assert!(!reads.applies_to(transfer, &impl_, &[]));
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod advice;
mod advisor;
mod control_flow;
mod introduction;
mod method_matcher;
mod pattern;
mod pointcut;
mod support;
mod trace;
mod type_filter;
mod type_info;
mod value;
mod value_matcher;

#[cfg(feature = "registry")]
mod config;
#[cfg(feature = "registry")]
mod registry;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Type model
pub use type_info::{
    Method, MethodSignature, TypeBuilder, TypeInfo, TypeKind, TypeRef, TypeRegistry,
};
pub use value::{CustomValue, Value};

// Core traits and algebra
pub use method_matcher::{
    ArgumentMatcher, CoupledUnionMethodMatcher, DynamicFnMatcher, IntersectionMethodMatcher,
    MethodMatcher, MethodMatchers, StaticFnMatcher, TrueMethodMatcher, UnionMethodMatcher,
};
pub use pointcut::Pointcut;
pub use type_filter::{
    IntersectionTypeFilter, RootTypeFilter, TrueTypeFilter, TypeFilter, TypeFilters,
    UnionTypeFilter,
};

// Pattern and control-flow matchers
pub use control_flow::{CallFrame, CallStack, ControlFlow, ControlFlowMatcher, FrameGuard};
pub use pattern::{
    IdentityPattern, NameMatchMethodMatcher, NamePattern, PatternMethodMatcher, PatternSpec,
    RegexMethodMatcher, RegexPattern,
};

// Argument value matchers
pub use value_matcher::{
    BoolMatcher, ContainsMatcher, ExactMatcher, IntMatcher, PrefixMatcher, RegexValueMatcher,
    SuffixMatcher, ValueMatchSpec, ValueMatcher,
};

// Advice, advisors, introductions
pub use advice::{
    Advice, AdviceKind, InvocationFailure, MethodInterceptor, MethodInvocation, Thrown,
};
pub use advisor::{Advisor, PointcutAdvisor, UnconditionalAdvisor};
pub use introduction::{
    DelegatingIntroductionInterceptor, IntroductionAdvisor, IntroductionAdvisorBuilder,
    IntroductionDelegate, IntroductionSupport,
};

// Applicability
pub use support::{can_apply, can_apply_pointcut, find_applicable_advisors, sort_by_order};

// Trace types
pub use trace::{MatchStage, MatchTrace};

// Registry (feature-gated)
#[cfg(feature = "registry")]
pub use config::{AdvisorConfig, PointcutConfig, TypeFilterConfig};
#[cfg(feature = "registry")]
pub use registry::{Registry, RegistryBuilder};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use weft::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Advice and advisors
        Advice,
        AdviceKind,
        Advisor,
        // Errors
        AopError,
        // Matchers
        ArgumentMatcher,
        ControlFlowMatcher,
        ExactMatcher,
        IntroductionAdvisor,
        IntroductionDelegate,
        // Core types
        Method,
        MethodMatcher,
        NameMatchMethodMatcher,
        Pointcut,
        RegexMethodMatcher,
        RootTypeFilter,
        TypeFilter,
        TypeFilters,
        TypeInfo,
        TypeRef,
        Value,
        // Applicability
        can_apply,
        find_applicable_advisors,
        sort_by_order,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum length for non-regex patterns (name globs, literal value matches).
pub const MAX_PATTERN_LENGTH: usize = 8192;

/// Maximum length for regex patterns.
///
/// Regex compilation is expensive even with the linear-time Rust `regex` crate.
/// Shorter limit than [`MAX_PATTERN_LENGTH`] because regex complexity scales
/// faster than literal matching.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4096;

/// Maximum nesting depth for union/intersection pointcuts loaded from config.
pub const MAX_COMPOSITE_DEPTH: usize = 32;

/// Order value that sorts before every other advisor.
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Order value that sorts after every other advisor; also the default.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors raised while building pointcuts and advisors.
///
/// These errors are caught at configuration time, not evaluation time.
/// Fix the configuration and reconstruct.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AopError {
    /// A regex or name pattern is malformed.
    #[error("invalid pattern \"{pattern}\"{}: {reason}", located(.location))]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Where the pattern was configured, if known.
        location: Option<String>,
        /// Why it was rejected.
        reason: String,
    },

    /// A pattern exceeds the maximum allowed length.
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length of the pattern.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// A pattern matcher was given no inclusion patterns.
    #[error("at least one pattern is required{}", located(.location))]
    EmptyPatterns {
        /// Where the pattern list was configured, if known.
        location: Option<String>,
    },

    /// An introduced type is a class, not an interface.
    #[error("\"{name}\" is not an interface and cannot be introduced")]
    NotAnInterface {
        /// The offending type.
        name: String,
    },

    /// An introduced interface is not implemented by the delegate.
    #[error("delegate \"{delegate}\" does not implement introduced interface \"{interface}\"")]
    InterfaceNotImplemented {
        /// The claimed interface.
        interface: String,
        /// The delegate's type.
        delegate: String,
    },

    /// A type name was not found in the type registry.
    #[error("unknown type \"{name}\"{}", registered(.available))]
    UnknownType {
        /// The unregistered name.
        name: String,
        /// Names that ARE registered (for self-correcting error messages).
        available: Vec<String>,
    },

    /// An advice name was not found in the registry.
    #[error("unknown advice \"{name}\"{}", registered(.available))]
    UnknownAdvice {
        /// The unregistered name.
        name: String,
        /// Names that ARE registered.
        available: Vec<String>,
    },

    /// An introduction delegate name was not found in the registry.
    #[error("unknown introduction delegate \"{name}\"{}", registered(.available))]
    UnknownDelegate {
        /// The unregistered name.
        name: String,
        /// Names that ARE registered.
        available: Vec<String>,
    },

    /// Configuration is structurally valid but semantically wrong.
    #[error("invalid config{}: {reason}", located(.location))]
    InvalidConfig {
        /// What is wrong.
        reason: String,
        /// Where, if known.
        location: Option<String>,
    },

    /// A delegate was asked to run a method it does not have.
    #[error("no method {name}({}) on \"{type_name}\"", .parameter_types.join(", "))]
    NoSuchMethod {
        /// Type the method was looked up on.
        type_name: String,
        /// Method name.
        name: String,
        /// Parameter type names.
        parameter_types: Vec<String>,
    },
}

impl AopError {
    /// Attach a location hint (e.g. `"advisor 'audit', patterns[1]"`).
    ///
    /// An existing hint is kept as the inner part: `outer, inner`. Errors
    /// without a location field are returned unchanged.
    #[must_use]
    pub fn at(mut self, outer: impl Into<String>) -> Self {
        let outer = outer.into();
        match &mut self {
            Self::InvalidPattern { location, .. }
            | Self::EmptyPatterns { location }
            | Self::InvalidConfig { location, .. } => {
                *location = Some(match location.take() {
                    Some(inner) => format!("{outer}, {inner}"),
                    None => outer,
                });
            }
            _ => {}
        }
        self
    }

    /// The location hint, if this error carries one.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::InvalidPattern { location, .. }
            | Self::EmptyPatterns { location }
            | Self::InvalidConfig { location, .. } => location.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
            location: None,
        }
    }
}

fn located(location: &Option<String>) -> String {
    location
        .as_deref()
        .map(|l| format!(" at {l}"))
        .unwrap_or_default()
}

fn registered(available: &[String]) -> String {
    if available.is_empty() {
        "; nothing is registered".to_owned()
    } else {
        format!("; registered: {}", available.join(", "))
    }
}
