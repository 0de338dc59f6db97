//! Config types for registry-driven advisor construction.
//!
//! These types mirror the runtime types but are serde-deserializable,
//! enabling config-driven construction via [`Registry`](crate::Registry).
//!
//! # Relationship to runtime types
//!
//! | Config type | Runtime type | Loader method |
//! |-------------|-------------|---------------|
//! | [`AdvisorConfig`] | [`Advisor`](crate::Advisor) | `Registry::load_advisor()` |
//! | [`PointcutConfig`] | [`Pointcut`](crate::Pointcut) | `Registry::load_pointcut()` |
//! | [`TypeFilterConfig`] | `Arc<dyn TypeFilter>` | `Registry::load_type_filter()` |
//! | [`ValueMatchSpec`] | `Box<dyn ValueMatcher>` | `ValueMatchSpec::to_value_matcher()` |

use crate::ValueMatchSpec;
use serde::Deserialize;

/// Configuration for a type filter.
///
/// Uses `#[serde(tag = "type")]` for discriminated union deserialization:
///
/// ```yaml
/// { type: always }
/// { type: subtype_of, name: app.Repository }
/// { type: union, filters: [ ... ] }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeFilterConfig {
    /// Every type. Also accepted as `"true"`.
    #[serde(alias = "true")]
    Always,

    /// The named type and its subtypes. The name must be registered.
    SubtypeOf {
        /// Root type name.
        name: String,
    },

    /// Any child filter matches.
    Union {
        /// Child filters.
        filters: Vec<TypeFilterConfig>,
    },

    /// Every child filter matches.
    Intersection {
        /// Child filters.
        filters: Vec<TypeFilterConfig>,
    },
}

/// Configuration for a [`Pointcut`](crate::Pointcut).
///
/// Leaf variants accept an optional `type_filter` that narrows the type half.
///
/// ```yaml
/// type: union
/// pointcuts:
///   - { type: regex, patterns: ['.*\.save.*'], type_filter: { type: subtype_of, name: app.Repo } }
///   - { type: setters }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointcutConfig {
    /// Every method (of types the filter accepts). Also accepted as `"true"`.
    #[serde(alias = "true")]
    Always {
        /// Optional type restriction.
        #[serde(default)]
        type_filter: Option<TypeFilterConfig>,
    },

    /// Regex dialect over method identities.
    Regex {
        /// Inclusion patterns.
        patterns: Vec<String>,
        /// Exclusion patterns.
        #[serde(default)]
        excludes: Vec<String>,
        /// Optional type restriction.
        #[serde(default)]
        type_filter: Option<TypeFilterConfig>,
    },

    /// Name-glob dialect over method identities.
    NameMatch {
        /// Inclusion globs.
        names: Vec<String>,
        /// Exclusion globs.
        #[serde(default)]
        excludes: Vec<String>,
        /// Optional type restriction.
        #[serde(default)]
        type_filter: Option<TypeFilterConfig>,
    },

    /// Bean-style setters.
    Setters {
        /// Optional type restriction.
        #[serde(default)]
        type_filter: Option<TypeFilterConfig>,
    },

    /// Bean-style getters.
    Getters {
        /// Optional type restriction.
        #[serde(default)]
        type_filter: Option<TypeFilterConfig>,
    },

    /// Calls made beneath an active call on `under` (optionally `under.method`).
    ControlFlow {
        /// Type that must be on the call stack.
        under: String,
        /// Method of that type, if narrowed.
        #[serde(default)]
        method: Option<String>,
        /// Optional type restriction.
        #[serde(default)]
        type_filter: Option<TypeFilterConfig>,
    },

    /// The argument at `index` matches `value_match`.
    Argument {
        /// Zero-based argument position.
        index: usize,
        /// How to match the argument.
        value_match: ValueMatchSpec,
        /// Optional type restriction.
        #[serde(default)]
        type_filter: Option<TypeFilterConfig>,
    },

    /// Coupled union of child pointcuts.
    Union {
        /// Child pointcuts (at least one).
        pointcuts: Vec<PointcutConfig>,
    },

    /// Intersection of child pointcuts.
    Intersection {
        /// Child pointcuts (at least one).
        pointcuts: Vec<PointcutConfig>,
    },
}

/// Configuration for an [`Advisor`](crate::Advisor).
///
/// ```yaml
/// - { kind: pointcut, advice: audit, order: 10, pointcut: { type: setters } }
/// - { kind: unconditional, advice: trace }
/// - { kind: introduction, delegate: lock_mixin, interfaces: [app.Lockable] }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvisorConfig {
    /// Named advice gated by a pointcut.
    Pointcut {
        /// Registered advice name.
        advice: String,
        /// Where it applies.
        pointcut: PointcutConfig,
        /// Explicit order (lower runs first).
        #[serde(default)]
        order: Option<i32>,
        /// Fresh advice per proxied object.
        #[serde(default)]
        per_instance: bool,
    },

    /// Named advice applied everywhere.
    Unconditional {
        /// Registered advice name.
        advice: String,
        /// Explicit order (lower runs first).
        #[serde(default)]
        order: Option<i32>,
        /// Fresh advice per proxied object.
        #[serde(default)]
        per_instance: bool,
    },

    /// Interfaces introduced through a named delegate.
    Introduction {
        /// Registered delegate name.
        delegate: String,
        /// Claimed interfaces; empty means every published interface.
        #[serde(default)]
        interfaces: Vec<String>,
        /// Interfaces to hide from the proxy.
        #[serde(default)]
        suppress: Vec<String>,
        /// Which target types receive the introduction.
        #[serde(default)]
        type_filter: Option<TypeFilterConfig>,
        /// Explicit order (lower runs first).
        #[serde(default)]
        order: Option<i32>,
    },
}
