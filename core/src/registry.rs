//! Registry for config-driven advisor construction.
//!
//! The registry enables **generic config loading**: JSON/YAML config ->
//! runtime [`Advisor`]s without hand-written wiring code. Advice payloads and
//! introduction delegates are opaque to the core, so they are registered by
//! name; config refers to them by that name.
//!
//! The registry is immutable once built. Loading never mutates it, so one
//! registry can serve concurrent loads.
//!
//! # Example
//!
//! ```ignore
//! let registry = RegistryBuilder::new()
//!     .types([account_service, user_repo])
//!     .advice("audit", Arc::new(AuditAdvice))
//!     .delegate("lock_mixin", Arc::new(LockMixin::new()))
//!     .build();
//!
//! let configs: Vec<AdvisorConfig> = serde_yaml::from_str(yaml)?;
//! let advisors = registry.load_advisors(&configs)?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    config::{AdvisorConfig, PointcutConfig, TypeFilterConfig},
    Advice, Advisor, AopError, ArgumentMatcher, ControlFlowMatcher,
    DelegatingIntroductionInterceptor, IntersectionTypeFilter, IntroductionAdvisor,
    IntroductionDelegate, MethodMatcher, MethodMatchers, NameMatchMethodMatcher, Pointcut,
    RegexMethodMatcher, RootTypeFilter, TypeFilter, TypeFilters, TypeRef, TypeRegistry,
    UnionTypeFilter, MAX_COMPOSITE_DEPTH,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Collects everything an advisor config can refer to by name, then freezes into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    types: Vec<TypeRef>,
    advice: HashMap<String, Arc<dyn Advice>>,
    delegates: HashMap<String, Arc<dyn IntroductionDelegate>>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register types (and, transitively, their supertypes).
    #[must_use]
    pub fn types(mut self, types: impl IntoIterator<Item = TypeRef>) -> Self {
        self.types.extend(types);
        self
    }

    /// Register advice under `name`. A later registration replaces an earlier one.
    #[must_use]
    pub fn advice(mut self, name: &str, advice: Arc<dyn Advice>) -> Self {
        self.advice.insert(name.to_owned(), advice);
        self
    }

    /// Register an introduction delegate under `name`.
    #[must_use]
    pub fn delegate(mut self, name: &str, delegate: Arc<dyn IntroductionDelegate>) -> Self {
        self.delegates.insert(name.to_owned(), delegate);
        self
    }

    /// Freeze into an immutable registry.
    #[must_use]
    pub fn build(self) -> Registry {
        let registry = Registry {
            types: TypeRegistry::new(self.types),
            advice: self.advice,
            delegates: self.delegates,
        };
        tracing::debug!(
            types = registry.types.len(),
            advice = registry.advice.len(),
            delegates = registry.delegates.len(),
            "registry built"
        );
        registry
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable lookup tables for loading config into runtime values.
pub struct Registry {
    types: TypeRegistry,
    advice: HashMap<String, Arc<dyn Advice>>,
    delegates: HashMap<String, Arc<dyn IntroductionDelegate>>,
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut names: Vec<String> = map.keys().cloned().collect();
    names.sort();
    names
}

impl Registry {
    /// The registered types.
    #[must_use]
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Registered advice names, sorted.
    #[must_use]
    pub fn advice_names(&self) -> Vec<String> {
        sorted_keys(&self.advice)
    }

    /// Registered delegate names, sorted.
    #[must_use]
    pub fn delegate_names(&self) -> Vec<String> {
        sorted_keys(&self.delegates)
    }

    /// Load every advisor, annotating errors with `advisors[i]`.
    ///
    /// # Errors
    ///
    /// The first failing advisor's error.
    pub fn load_advisors(&self, configs: &[AdvisorConfig]) -> Result<Vec<Advisor>, AopError> {
        let advisors = configs
            .iter()
            .enumerate()
            .map(|(i, c)| self.load_advisor(c).map_err(|e| e.at(format!("advisors[{i}]"))))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = advisors.len(), "advisors loaded");
        Ok(advisors)
    }

    /// Load one advisor.
    ///
    /// # Errors
    ///
    /// [`AopError::UnknownAdvice`], [`AopError::UnknownDelegate`],
    /// [`AopError::UnknownType`], pattern errors, or introduction validation
    /// errors.
    pub fn load_advisor(&self, config: &AdvisorConfig) -> Result<Advisor, AopError> {
        let (advisor, order) = match config {
            AdvisorConfig::Pointcut {
                advice,
                pointcut,
                order,
                per_instance,
            } => {
                let pointcut = self.load_pointcut(pointcut).map_err(|e| e.at("pointcut"))?;
                let advisor = Advisor::with_pointcut(pointcut, self.advice(advice)?);
                (if *per_instance { advisor.per_instance() } else { advisor }, *order)
            }
            AdvisorConfig::Unconditional {
                advice,
                order,
                per_instance,
            } => {
                let advisor = Advisor::unconditional(self.advice(advice)?);
                (if *per_instance { advisor.per_instance() } else { advisor }, *order)
            }
            AdvisorConfig::Introduction {
                delegate,
                interfaces,
                suppress,
                type_filter,
                order,
            } => {
                let mut interceptor =
                    DelegatingIntroductionInterceptor::new(self.delegate(delegate)?);
                for name in suppress {
                    interceptor = interceptor.suppress_interface(name);
                }
                let mut builder = IntroductionAdvisor::builder(interceptor);
                for name in interfaces {
                    builder = builder.interface(self.types.get(name)?);
                }
                if let Some(filter) = type_filter {
                    builder = builder.type_filter(
                        self.load_type_filter(filter).map_err(|e| e.at("type_filter"))?,
                    );
                }
                (Advisor::introduction(builder.build()?), *order)
            }
        };
        Ok(match order {
            Some(order) => advisor.with_order(order),
            None => advisor,
        })
    }

    /// Load a pointcut.
    ///
    /// # Errors
    ///
    /// Pattern errors (with `patterns[i]` locations), [`AopError::UnknownType`],
    /// or [`AopError::InvalidConfig`] for empty or over-deep composites.
    pub fn load_pointcut(&self, config: &PointcutConfig) -> Result<Pointcut, AopError> {
        self.load_pointcut_at(config, 0)
    }

    /// Load a type filter.
    ///
    /// # Errors
    ///
    /// [`AopError::UnknownType`] for an unregistered `subtype_of` name, or
    /// [`AopError::InvalidConfig`] for over-deep nesting.
    pub fn load_type_filter(
        &self,
        config: &TypeFilterConfig,
    ) -> Result<Arc<dyn TypeFilter>, AopError> {
        self.load_type_filter_at(config, 0)
    }

    fn advice(&self, name: &str) -> Result<Arc<dyn Advice>, AopError> {
        self.advice
            .get(name)
            .cloned()
            .ok_or_else(|| AopError::UnknownAdvice {
                name: name.to_owned(),
                available: self.advice_names(),
            })
    }

    fn delegate(&self, name: &str) -> Result<Arc<dyn IntroductionDelegate>, AopError> {
        self.delegates
            .get(name)
            .cloned()
            .ok_or_else(|| AopError::UnknownDelegate {
                name: name.to_owned(),
                available: self.delegate_names(),
            })
    }

    fn check_depth(depth: usize) -> Result<(), AopError> {
        if depth > MAX_COMPOSITE_DEPTH {
            return Err(AopError::invalid_config(format!(
                "nesting depth exceeds maximum of {MAX_COMPOSITE_DEPTH}"
            )));
        }
        Ok(())
    }

    fn load_type_filter_at(
        &self,
        config: &TypeFilterConfig,
        depth: usize,
    ) -> Result<Arc<dyn TypeFilter>, AopError> {
        Self::check_depth(depth)?;
        let children = |filters: &[TypeFilterConfig], kind: &str| {
            if filters.is_empty() {
                return Err(AopError::invalid_config(format!(
                    "{kind} requires at least one filter"
                )));
            }
            filters
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    self.load_type_filter_at(f, depth + 1)
                        .map_err(|e| e.at(format!("filters[{i}]")))
                })
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(match config {
            TypeFilterConfig::Always => TypeFilters::always(),
            TypeFilterConfig::SubtypeOf { name } => {
                self.types.get(name)?;
                Arc::new(RootTypeFilter::new(name.as_str()))
            }
            TypeFilterConfig::Union { filters } => {
                Arc::new(UnionTypeFilter::new(children(filters.as_slice(), "union")?))
            }
            TypeFilterConfig::Intersection { filters } => {
                let children = children(filters.as_slice(), "intersection")?;
                Arc::new(IntersectionTypeFilter::new(children))
            }
        })
    }

    fn leaf(
        &self,
        type_filter: Option<&TypeFilterConfig>,
        matcher: Arc<dyn MethodMatcher>,
        depth: usize,
    ) -> Result<Pointcut, AopError> {
        let filter = match type_filter {
            Some(config) => self
                .load_type_filter_at(config, depth + 1)
                .map_err(|e| e.at("type_filter"))?,
            None => TypeFilters::always(),
        };
        Ok(Pointcut::new(filter, matcher))
    }

    fn load_pointcut_at(
        &self,
        config: &PointcutConfig,
        depth: usize,
    ) -> Result<Pointcut, AopError> {
        Self::check_depth(depth)?;
        match config {
            PointcutConfig::Always { type_filter: None } => Ok(Pointcut::always()),
            PointcutConfig::Always { type_filter } => {
                self.leaf(type_filter.as_ref(), MethodMatchers::always(), depth)
            }
            PointcutConfig::Regex {
                patterns,
                excludes,
                type_filter,
            } => {
                let matcher = RegexMethodMatcher::new(patterns)?.with_excludes(excludes)?;
                self.leaf(type_filter.as_ref(), Arc::new(matcher), depth)
            }
            PointcutConfig::NameMatch {
                names,
                excludes,
                type_filter,
            } => {
                let matcher = NameMatchMethodMatcher::new(names)?.with_excludes(excludes)?;
                self.leaf(type_filter.as_ref(), Arc::new(matcher), depth)
            }
            PointcutConfig::Setters { type_filter } => {
                let matcher = Arc::clone(Pointcut::setters().method_matcher());
                self.leaf(type_filter.as_ref(), matcher, depth)
            }
            PointcutConfig::Getters { type_filter } => {
                let matcher = Arc::clone(Pointcut::getters().method_matcher());
                self.leaf(type_filter.as_ref(), matcher, depth)
            }
            PointcutConfig::ControlFlow {
                under,
                method,
                type_filter,
            } => {
                let mut matcher = ControlFlowMatcher::new(under.as_str());
                if let Some(method) = method {
                    matcher = matcher.with_method(method.as_str());
                }
                self.leaf(type_filter.as_ref(), Arc::new(matcher), depth)
            }
            PointcutConfig::Argument {
                index,
                value_match,
                type_filter,
            } => {
                let value_matcher = value_match
                    .to_value_matcher()
                    .map_err(|e| e.at("value_match"))?;
                self.leaf(
                    type_filter.as_ref(),
                    Arc::new(ArgumentMatcher::new(*index, value_matcher)),
                    depth,
                )
            }
            PointcutConfig::Union { pointcuts } => {
                self.fold(pointcuts, depth, "union", |a, b| a.union(b))
            }
            PointcutConfig::Intersection { pointcuts } => {
                self.fold(pointcuts, depth, "intersection", |a, b| a.intersection(b))
            }
        }
    }

    fn fold(
        &self,
        pointcuts: &[PointcutConfig],
        depth: usize,
        kind: &str,
        combine: impl Fn(&Pointcut, &Pointcut) -> Pointcut,
    ) -> Result<Pointcut, AopError> {
        let mut loaded = pointcuts.iter().enumerate().map(|(i, p)| {
            self.load_pointcut_at(p, depth + 1)
                .map_err(|e| e.at(format!("pointcuts[{i}]")))
        });
        let mut acc = loaded.next().ok_or_else(|| {
            AopError::invalid_config(format!("{kind} requires at least one pointcut"))
        })??;
        for next in loaded {
            acc = combine(&acc, &next?);
        }
        Ok(acc)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.types.names())
            .field("advice", &self.advice_names())
            .field("delegates", &self.delegate_names())
            .finish()
    }
}
