//! Pattern method matchers over method identity strings.
//!
//! A method's identity is `declaringType.methodName`, built from the type
//! that *declared* the method, not the type it was invoked on. Two unrelated
//! subclasses inheriting the same base method match identically.
//!
//! Matching is whole-string: the regex `.*get.*` accepts
//! `com.example.Foo.getBar`, but `get.*` does not.
//!
//! Two dialects share one matcher shape ([`PatternMethodMatcher`]):
//!
//! | Dialect | Pattern | Alias |
//! |---------|---------|-------|
//! | regex | [`RegexPattern`] | [`RegexMethodMatcher`] |
//! | name glob | [`NamePattern`] | [`NameMatchMethodMatcher`] |
//!
//! Both are static-only: identity is known without a live call.

use crate::{AopError, Method, MethodMatcher, TypeInfo, MAX_PATTERN_LENGTH};
use std::fmt::{self, Debug};

/// A compiled pattern over identity strings.
pub trait IdentityPattern: Send + Sync + Debug + Sized {
    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`AopError::InvalidPattern`] or [`AopError::PatternTooLong`].
    fn compile(pattern: &str) -> Result<Self, AopError>;

    /// Whole-string match against `identity`.
    fn matches(&self, identity: &str) -> bool;

    /// The source text this pattern was compiled from.
    fn as_str(&self) -> &str;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dialects
// ═══════════════════════════════════════════════════════════════════════════════

/// Regular-expression dialect, anchored at both ends.
#[derive(Clone)]
pub struct RegexPattern {
    source: String,
    regex: regex::Regex,
}

impl IdentityPattern for RegexPattern {
    fn compile(pattern: &str) -> Result<Self, AopError> {
        Ok(Self {
            source: pattern.to_owned(),
            regex: crate::value_matcher::compile_anchored(pattern)?,
        })
    }

    fn matches(&self, identity: &str) -> bool {
        self.regex.is_match(identity)
    }

    fn as_str(&self) -> &str {
        &self.source
    }
}

impl Debug for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Regex({:?})", self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Glob {
    All,
    Exact,
    Prefix(String),
    Suffix(String),
}

/// Name-glob dialect: an exact identity, `prefix*`, `*suffix`, or `*`.
///
/// Evaluated with plain prefix/suffix checks, no regex compilation.
///
/// ```
/// use weft::{IdentityPattern, NamePattern};
///
/// let p = NamePattern::compile("app.Repo.find*").unwrap();
/// assert!(p.matches("app.Repo.findById"));
/// assert!(!p.matches("app.Repo.save"));
/// assert!(NamePattern::compile("app.*.find*").is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct NamePattern {
    source: String,
    glob: Glob,
}

impl IdentityPattern for NamePattern {
    fn compile(pattern: &str) -> Result<Self, AopError> {
        if pattern.len() > MAX_PATTERN_LENGTH {
            return Err(AopError::PatternTooLong {
                len: pattern.len(),
                max: MAX_PATTERN_LENGTH,
            });
        }
        let invalid = |reason: &str| AopError::InvalidPattern {
            pattern: pattern.to_owned(),
            location: None,
            reason: reason.to_owned(),
        };
        if pattern.is_empty() {
            return Err(invalid("empty name pattern"));
        }

        let glob = match pattern.matches('*').count() {
            0 => Glob::Exact,
            1 if pattern == "*" => Glob::All,
            1 if pattern.ends_with('*') => Glob::Prefix(pattern[..pattern.len() - 1].to_owned()),
            1 if pattern.starts_with('*') => Glob::Suffix(pattern[1..].to_owned()),
            _ => {
                return Err(invalid(
                    "name patterns support only `name`, `prefix*`, `*suffix` or `*`",
                ))
            }
        };
        Ok(Self {
            source: pattern.to_owned(),
            glob,
        })
    }

    fn matches(&self, identity: &str) -> bool {
        match &self.glob {
            Glob::All => true,
            Glob::Exact => identity == self.source,
            Glob::Prefix(prefix) => identity.starts_with(prefix.as_str()),
            Glob::Suffix(suffix) => identity.ends_with(suffix.as_str()),
        }
    }

    fn as_str(&self) -> &str {
        &self.source
    }
}

impl Debug for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.source)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PatternMethodMatcher
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches methods whose identity matches any include and no exclude.
///
/// Excludes are consulted only after an include hit and short-circuit on the
/// first exclude match.
///
/// # Example
///
/// ```
/// use weft::{Method, MethodMatcher, RegexMethodMatcher, TypeInfo};
///
/// let m = RegexMethodMatcher::new([r"app\.Repo\..*"])
///     .unwrap()
///     .with_excludes([r"app\.Repo\.internal.*"])
///     .unwrap();
///
/// let repo = TypeInfo::class("app.Repo").build();
/// assert!(m.matches_static(&Method::new("app.Repo", "save", &[]), &repo));
/// assert!(!m.matches_static(&Method::new("app.Repo", "internalFlush", &[]), &repo));
/// ```
#[derive(Clone)]
pub struct PatternMethodMatcher<P> {
    includes: Vec<P>,
    excludes: Vec<P>,
}

/// Regex-dialect pattern matcher.
pub type RegexMethodMatcher = PatternMethodMatcher<RegexPattern>;

/// Name-glob-dialect pattern matcher.
pub type NameMatchMethodMatcher = PatternMethodMatcher<NamePattern>;

fn compile_all<P: IdentityPattern, S: AsRef<str>>(
    patterns: impl IntoIterator<Item = S>,
    field: &str,
) -> Result<Vec<P>, AopError> {
    patterns
        .into_iter()
        .enumerate()
        .map(|(i, p)| P::compile(p.as_ref()).map_err(|e| e.at(format!("{field}[{i}]"))))
        .collect()
}

impl<P: IdentityPattern> PatternMethodMatcher<P> {
    /// Compile inclusion patterns.
    ///
    /// # Errors
    ///
    /// Returns [`AopError::EmptyPatterns`] if `includes` is empty, or the
    /// first compile error annotated with its index (`patterns[i]`).
    pub fn new<S: AsRef<str>>(includes: impl IntoIterator<Item = S>) -> Result<Self, AopError> {
        let includes = compile_all(includes, "patterns")?;
        if includes.is_empty() {
            return Err(AopError::EmptyPatterns { location: None });
        }
        Ok(Self {
            includes,
            excludes: Vec::new(),
        })
    }

    /// Add exclusion patterns. Replaces any previous excludes.
    ///
    /// # Errors
    ///
    /// Returns the first compile error annotated with its index
    /// (`excludes[i]`).
    pub fn with_excludes<S: AsRef<str>>(
        mut self,
        excludes: impl IntoIterator<Item = S>,
    ) -> Result<Self, AopError> {
        self.excludes = compile_all(excludes, "excludes")?;
        Ok(self)
    }

    /// Inclusion pattern sources.
    #[must_use]
    pub fn includes(&self) -> Vec<&str> {
        self.includes.iter().map(P::as_str).collect()
    }

    /// Exclusion pattern sources.
    #[must_use]
    pub fn excludes(&self) -> Vec<&str> {
        self.excludes.iter().map(P::as_str).collect()
    }

    /// Match an identity string directly.
    #[must_use]
    pub fn matches_identity(&self, identity: &str) -> bool {
        self.includes.iter().any(|p| p.matches(identity))
            && !self.excludes.iter().any(|p| p.matches(identity))
    }

    /// The pattern sources, for persisting and later reconstruction.
    #[must_use]
    pub fn spec(&self) -> PatternSpec {
        PatternSpec {
            patterns: self.includes().into_iter().map(str::to_owned).collect(),
            excludes: self.excludes().into_iter().map(str::to_owned).collect(),
        }
    }
}

impl<P: IdentityPattern> Debug for PatternMethodMatcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMethodMatcher")
            .field("includes", &self.includes)
            .field("excludes", &self.excludes)
            .finish()
    }
}

impl<P: IdentityPattern> MethodMatcher for PatternMethodMatcher<P> {
    fn matches_static(&self, method: &Method, _target: &TypeInfo) -> bool {
        self.matches_identity(method.identity())
    }
}

/// Persisted form of a pattern matcher.
///
/// Compilation is a pure function of these strings: a matcher rebuilt from
/// its `PatternSpec` behaves like the matcher it was taken from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatternSpec {
    /// Inclusion patterns (any may match).
    pub patterns: Vec<String>,
    /// Exclusion patterns (none may match).
    #[cfg_attr(feature = "serde", serde(default))]
    pub excludes: Vec<String>,
}

impl PatternSpec {
    /// Compile into a matcher of the given dialect.
    ///
    /// # Errors
    ///
    /// Same as [`PatternMethodMatcher::new`] and
    /// [`PatternMethodMatcher::with_excludes`].
    pub fn compile<P: IdentityPattern>(&self) -> Result<PatternMethodMatcher<P>, AopError> {
        PatternMethodMatcher::new(&self.patterns)?.with_excludes(&self.excludes)
    }
}
