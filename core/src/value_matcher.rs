//! `ValueMatcher`: Predicates over a single call argument
//!
//! Value matchers are the building block of argument-dependent (dynamic)
//! matching: an [`ArgumentMatcher`](crate::ArgumentMatcher) picks an argument
//! out of the call and hands it to a `ValueMatcher`.
//!
//! # Available Matchers
//!
//! - [`ExactMatcher`]: Exact string equality
//! - [`PrefixMatcher`]: String prefix match
//! - [`SuffixMatcher`]: String suffix match
//! - [`ContainsMatcher`]: String contains match
//! - [`RegexValueMatcher`]: Whole-string regular expression match
//! - [`BoolMatcher`]: Boolean equality
//! - [`IntMatcher`]: Integer equality

use crate::{AopError, Value, MAX_PATTERN_LENGTH, MAX_REGEX_PATTERN_LENGTH};
use std::fmt::{self, Debug};

/// Matches a single [`Value`].
///
/// Returns `false` for values of an incompatible type rather than failing.
///
/// # Example
///
/// ```
/// use weft::{ExactMatcher, Value, ValueMatcher};
///
/// let matcher = ExactMatcher::new("admin");
/// assert!(matcher.matches(&Value::from("admin")));
/// assert!(!matcher.matches(&Value::Int(1)));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `ValueMatcher`",
    label = "this type cannot match a call argument",
    note = "use a built-in matcher (ExactMatcher, PrefixMatcher, RegexValueMatcher, ...) or implement `matches(&self, &Value) -> bool`"
)]
pub trait ValueMatcher: Send + Sync + Debug {
    /// Check if the given value matches.
    fn matches(&self, value: &Value) -> bool;
}

#[diagnostic::do_not_recommend]
impl ValueMatcher for Box<dyn ValueMatcher> {
    fn matches(&self, value: &Value) -> bool {
        (**self).matches(value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// String Matchers
// ═══════════════════════════════════════════════════════════════════════════════

/// Exact string equality matcher.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    expected: String,
}

impl ExactMatcher {
    /// Create a new exact matcher with the given expected value.
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    /// Returns the expected value.
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }
}

impl ValueMatcher for ExactMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| s == self.expected)
    }
}

/// Prefix string matcher.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    /// Create a new prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ValueMatcher for PrefixMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| s.starts_with(&self.prefix))
    }
}

/// Suffix string matcher.
#[derive(Debug, Clone)]
pub struct SuffixMatcher {
    suffix: String,
}

impl SuffixMatcher {
    /// Create a new suffix matcher.
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl ValueMatcher for SuffixMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| s.ends_with(&self.suffix))
    }
}

/// Contains string matcher.
#[derive(Debug, Clone)]
pub struct ContainsMatcher {
    substring: String,
}

impl ContainsMatcher {
    /// Create a new contains matcher.
    pub fn new(substring: impl Into<String>) -> Self {
        Self {
            substring: substring.into(),
        }
    }
}

impl ValueMatcher for ContainsMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| s.contains(&self.substring))
    }
}

/// Regular expression matcher over the whole string value.
///
/// The pattern is anchored at both ends: `adm.*` matches `"admin"` but not
/// `"sysadmin"`.
#[derive(Clone)]
pub struct RegexValueMatcher {
    pattern: String,
    regex: regex::Regex,
}

impl RegexValueMatcher {
    /// Compile a whole-value regex matcher.
    ///
    /// # Errors
    ///
    /// Returns [`AopError::PatternTooLong`] or [`AopError::InvalidPattern`].
    pub fn new(pattern: &str) -> Result<Self, AopError> {
        Ok(Self {
            pattern: pattern.to_owned(),
            regex: compile_anchored(pattern)?,
        })
    }
}

impl Debug for RegexValueMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RegexValueMatcher").field(&self.pattern).finish()
    }
}

impl ValueMatcher for RegexValueMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| self.regex.is_match(s))
    }
}

/// Compile `pattern` so that it must match the entire input.
pub(crate) fn compile_anchored(pattern: &str) -> Result<regex::Regex, AopError> {
    if pattern.len() > MAX_REGEX_PATTERN_LENGTH {
        return Err(AopError::PatternTooLong {
            len: pattern.len(),
            max: MAX_REGEX_PATTERN_LENGTH,
        });
    }
    regex::Regex::new(&format!("^(?:{pattern})$")).map_err(|e| AopError::InvalidPattern {
        pattern: pattern.to_owned(),
        location: None,
        reason: e.to_string(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Scalar Matchers
// ═══════════════════════════════════════════════════════════════════════════════

/// Boolean equality matcher.
#[derive(Debug, Clone)]
pub struct BoolMatcher {
    expected: bool,
}

impl BoolMatcher {
    /// Create a new boolean matcher.
    #[must_use]
    pub fn new(expected: bool) -> Self {
        Self { expected }
    }
}

impl ValueMatcher for BoolMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_bool().is_some_and(|b| b == self.expected)
    }
}

/// Integer equality matcher.
#[derive(Debug, Clone)]
pub struct IntMatcher {
    expected: i64,
}

impl IntMatcher {
    /// Create a new integer matcher.
    #[must_use]
    pub fn new(expected: i64) -> Self {
        Self { expected }
    }
}

impl ValueMatcher for IntMatcher {
    fn matches(&self, value: &Value) -> bool {
        value.as_int().is_some_and(|i| i == self.expected)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ValueMatchSpec (config level)
// ═══════════════════════════════════════════════════════════════════════════════

/// A value match as written in configuration.
///
/// Compiles to a runtime [`ValueMatcher`] via [`to_value_matcher()`](Self::to_value_matcher).
///
/// # Example
///
/// ```
/// use weft::{ValueMatchSpec, Value};
///
/// let matcher = ValueMatchSpec::Prefix("acct-".into()).to_value_matcher().unwrap();
/// assert!(matcher.matches(&Value::from("acct-42")));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueMatchSpec {
    /// Exact string equality.
    Exact(String),
    /// String starts with prefix.
    Prefix(String),
    /// String ends with suffix.
    Suffix(String),
    /// String contains substring.
    Contains(String),
    /// Whole-string regular expression.
    Regex(String),
    /// Boolean equality.
    Bool(bool),
    /// Integer equality.
    Int(i64),
}

impl ValueMatchSpec {
    /// Compile this spec into a runtime [`ValueMatcher`].
    ///
    /// # Errors
    ///
    /// Returns [`AopError::InvalidPattern`] for a malformed regex and
    /// [`AopError::PatternTooLong`] for oversized patterns.
    pub fn to_value_matcher(&self) -> Result<Box<dyn ValueMatcher>, AopError> {
        if let Some(len) = self.literal_len() {
            if len > MAX_PATTERN_LENGTH {
                return Err(AopError::PatternTooLong {
                    len,
                    max: MAX_PATTERN_LENGTH,
                });
            }
        }
        Ok(match self {
            Self::Exact(v) => Box::new(ExactMatcher::new(v.as_str())),
            Self::Prefix(v) => Box::new(PrefixMatcher::new(v.as_str())),
            Self::Suffix(v) => Box::new(SuffixMatcher::new(v.as_str())),
            Self::Contains(v) => Box::new(ContainsMatcher::new(v.as_str())),
            Self::Regex(v) => Box::new(RegexValueMatcher::new(v)?),
            Self::Bool(b) => Box::new(BoolMatcher::new(*b)),
            Self::Int(i) => Box::new(IntMatcher::new(*i)),
        })
    }

    fn literal_len(&self) -> Option<usize> {
        match self {
            Self::Exact(v) | Self::Prefix(v) | Self::Suffix(v) | Self::Contains(v) => Some(v.len()),
            Self::Regex(_) | Self::Bool(_) | Self::Int(_) => None,
        }
    }
}

impl fmt::Display for ValueMatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "Exact(\"{v}\")"),
            Self::Prefix(v) => write!(f, "Prefix(\"{v}\")"),
            Self::Suffix(v) => write!(f, "Suffix(\"{v}\")"),
            Self::Contains(v) => write!(f, "Contains(\"{v}\")"),
            Self::Regex(v) => write!(f, "Regex(\"{v}\")"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
        }
    }
}
