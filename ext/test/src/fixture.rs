//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against weft. A fixture declares a type
//! model, a pointcut in registry config form, and cases to evaluate:
//!
//! ```yaml
//! name: coupled union
//! description: each side's method matcher stays bound to its own type filter
//! types:
//!   - { name: app.A, methods: [{ name: foo }] }
//! pointcut: { type: name_match, names: ['app.A.foo'] }
//! cases:
//!   - { name: hit, target: app.A, method: foo, expect: true }
//! can_apply:
//!   - { target: app.A, expect: true }
//! ```
//!
//! A fixture whose pointcut must fail to load sets `expect_error` to a
//! substring of the error message and has no cases.

use serde::Deserialize;
use std::sync::Arc;
use weft::{
    can_apply_pointcut, AopError, CallStack, Method, Pointcut, PointcutConfig, RegistryBuilder,
    TypeInfo, TypeRef, TypeRegistry, Value,
};

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub types: Vec<TypeSpec>,
    pub pointcut: PointcutConfig,
    #[serde(default)]
    pub cases: Vec<TestCase>,
    #[serde(default)]
    pub can_apply: Vec<CanApplyCase>,
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// A type declaration. Supertypes must be declared earlier in the list.
#[derive(Debug, Deserialize)]
pub struct TypeSpec {
    pub name: String,
    #[serde(default)]
    pub interface: bool,
    /// Superclass (classes, at most one) or extended interfaces.
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
}

/// A method declaration
#[derive(Debug, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub returns: Option<String>,
}

/// One `applies_to` evaluation
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub target: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub args: Vec<serde_yaml::Value>,
    /// Active frames (`[type, method]`, outermost first) during evaluation.
    #[serde(default)]
    pub stack: Vec<(String, String)>,
    pub expect: bool,
}

/// One `can_apply` evaluation
#[derive(Debug, Deserialize)]
pub struct CanApplyCase {
    pub target: String,
    pub expect: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder: Convert specs to weft types
// ═══════════════════════════════════════════════════════════════════════════════

fn resolve<'a>(built: &'a [TypeRef], name: &str) -> Result<&'a TypeRef, AopError> {
    built
        .iter()
        .find(|t| t.name() == name)
        .ok_or_else(|| AopError::UnknownType {
            name: name.to_owned(),
            available: built.iter().map(|t| t.name().to_owned()).collect(),
        })
}

impl TypeSpec {
    fn build(&self, built: &[TypeRef]) -> Result<TypeRef, AopError> {
        let mut builder = if self.interface {
            TypeInfo::interface(self.name.as_str())
        } else {
            TypeInfo::class(self.name.as_str())
        };
        for parent in &self.extends {
            builder = builder.extends(resolve(built, parent)?);
        }
        for interface in &self.implements {
            builder = builder.implements(resolve(built, interface)?);
        }
        for m in &self.methods {
            let params: Vec<&str> = m.params.iter().map(String::as_str).collect();
            builder = match &m.returns {
                Some(ret) => builder.method_returning(&m.name, &params, ret),
                None => builder.method(&m.name, &params),
            };
        }
        Ok(builder.build())
    }
}

fn to_value(value: &serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Unit,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => n.as_i64().map_or(Value::Unit, Value::Int),
        serde_yaml::Value::String(s) => Value::String(s.clone()),
        other => Value::String(format!("{other:?}")),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: bool,
    pub actual: Result<bool, String>,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Build the declared types, in order.
    ///
    /// # Errors
    ///
    /// [`AopError::UnknownType`] if a supertype is referenced before it is
    /// declared.
    pub fn build_types(&self) -> Result<Vec<TypeRef>, AopError> {
        let mut built: Vec<TypeRef> = Vec::new();
        for spec in &self.types {
            let ty = spec.build(&built)?;
            built.push(ty);
        }
        Ok(built)
    }

    /// Build the types and load the pointcut through a registry.
    ///
    /// # Errors
    ///
    /// Any type or pointcut loading error.
    pub fn load(&self) -> Result<(TypeRegistry, Pointcut), AopError> {
        let types = self.build_types()?;
        let registry = RegistryBuilder::new().types(types).build();
        let pointcut = registry.load_pointcut(&self.pointcut)?;
        Ok((registry.types().clone(), pointcut))
    }

    /// Run all test cases and return results
    pub fn run(&self) -> Result<Vec<CaseResult>, AopError> {
        let (types, pointcut) = self.load()?;
        let mut results = Vec::new();

        for case in &self.cases {
            let actual = Self::evaluate(&types, &pointcut, case);
            results.push(CaseResult {
                case_name: case.name.clone(),
                passed: actual.as_ref().is_ok_and(|a| *a == case.expect),
                expected: case.expect,
                actual: actual.map_err(|e| e.to_string()),
            });
        }

        for case in &self.can_apply {
            let actual = types
                .get(&case.target)
                .map(|ty| can_apply_pointcut(&pointcut, ty));
            results.push(CaseResult {
                case_name: format!("can_apply {}", case.target),
                passed: actual.as_ref().is_ok_and(|a| *a == case.expect),
                expected: case.expect,
                actual: actual.map_err(|e| e.to_string()),
            });
        }
        Ok(results)
    }

    fn evaluate(
        types: &TypeRegistry,
        pointcut: &Pointcut,
        case: &TestCase,
    ) -> Result<bool, AopError> {
        let target = types.get(&case.target)?;
        let params: Vec<&str> = case.params.iter().map(String::as_str).collect();
        let method: Method = target
            .find_method(&case.method, &params)
            .cloned()
            .ok_or_else(|| AopError::NoSuchMethod {
                type_name: case.target.clone(),
                name: case.method.clone(),
                parameter_types: case.params.clone(),
            })?;
        let args: Vec<Value> = case.args.iter().map(to_value).collect();

        let _frames: Vec<_> = case
            .stack
            .iter()
            .map(|(ty, m)| CallStack::enter(ty, m))
            .collect();
        Ok(pointcut.applies_to(&method, Arc::as_ref(target), &args))
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        if let Some(expected) = &self.expect_error {
            match self.load() {
                Ok(_) => panic!(
                    "Fixture '{}' loaded, but expected an error containing {expected:?}",
                    self.name
                ),
                Err(e) => assert!(
                    e.to_string().contains(expected.as_str()),
                    "Fixture '{}' failed with {e}, expected an error containing {expected:?}",
                    self.name
                ),
            }
            return;
        }

        let results = self
            .run()
            .unwrap_or_else(|e| panic!("Fixture '{}' failed to load: {e}", self.name));
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {:?}, got {:?}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r"
name: setters on a hierarchy
types:
  - { name: t.Base, methods: [{ name: setX, params: [i64] }] }
  - { name: t.Child, extends: [t.Base], methods: [{ name: getX, returns: i64 }] }
pointcut: { type: setters }
cases:
  - { name: inherited setter, target: t.Child, method: setX, params: [i64], args: [1], expect: true }
  - { name: getter, target: t.Child, method: getX, expect: false }
can_apply:
  - { target: t.Child, expect: true }
";

    #[test]
    fn runs_a_fixture() {
        let fixture = Fixture::from_yaml(YAML).unwrap();
        assert_eq!(fixture.build_types().unwrap().len(), 2);
        let results = fixture.run().unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn forward_reference_is_an_error() {
        let fixture = Fixture::from_yaml(
            r"
name: bad order
types:
  - { name: t.Child, extends: [t.Base] }
  - { name: t.Base }
pointcut: { type: always }
",
        )
        .unwrap();
        assert!(matches!(
            fixture.build_types().unwrap_err(),
            AopError::UnknownType { .. }
        ));
    }

    #[test]
    fn missing_method_fails_case() {
        let fixture = Fixture::from_yaml(
            r"
name: missing
types: [{ name: t.A }]
pointcut: { type: always }
cases: [{ name: nope, target: t.A, method: nope, expect: true }]
",
        )
        .unwrap();
        let results = fixture.run().unwrap();
        assert!(!results[0].passed);
        assert!(results[0].actual.is_err());
    }

    #[test]
    fn yaml_values_convert() {
        assert_eq!(to_value(&serde_yaml::Value::Null), Value::Unit);
        assert_eq!(to_value(&serde_yaml::from_str("7").unwrap()), Value::Int(7));
        assert_eq!(to_value(&serde_yaml::from_str("true").unwrap()), Value::Bool(true));
        assert_eq!(to_value(&serde_yaml::from_str("x").unwrap()), Value::from("x"));
    }
}
