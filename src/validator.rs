use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::cache::Caches;
use crate::evaluate::{validate_field, FieldEnv};
use crate::registry::{Registry, RuleContext, RuleError};
use crate::statement::TypeCast;
use crate::types::{ValidationReport, ValidationResult};
use crate::{path, Error};

/// Builder for a [`Validator`].
///
/// # Example
///
/// ```
/// use valex::ValidatorBuilder;
/// use serde_json::json;
///
/// let validator = ValidatorBuilder::new()
///     .rule("even", &[], |v, _, _| Ok(v.as_i64().is_some_and(|n| n % 2 == 0)))
///     .alias("divisible_by_two", "even")
///     .macro_def("small_even", "even&max:10")
///     .build();
///
/// assert!(validator.validate_one(&json!(4), "[small_even]").unwrap().is_valid());
/// assert!(!validator.validate_one(&json!(12), "[small_even]").unwrap().is_valid());
/// ```
#[derive(Debug)]
pub struct ValidatorBuilder {
    registry: Registry,
    caches: Option<Arc<Caches>>,
    fail_fast: Option<usize>,
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorBuilder {
    /// A builder preloaded with the built-in rules, aliases and macros.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Registry::with_builtin_rules())
    }

    /// A builder with no rules at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_registry(Registry::new())
    }

    /// Start from an existing registry.
    #[must_use]
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            caches: None,
            fail_fast: None,
        }
    }

    /// Register a rule; an existing rule of the same name is replaced.
    #[must_use]
    pub fn rule<F>(mut self, name: &str, casts: &[TypeCast], func: F) -> Self
    where
        F: Fn(&Value, &[Value], &RuleContext<'_>) -> Result<bool, RuleError>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register(name, casts, func);
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: &str, target: &str) -> Self {
        self.registry.alias(alias, target);
        self
    }

    /// Define a macro, referenced as `[name]` inside expressions.
    #[must_use]
    pub fn macro_def(mut self, name: &str, expansion: &str) -> Self {
        self.registry.define_macro(name, expansion);
        self
    }

    /// Use `caches` instead of the process-wide [`Caches::global()`].
    #[must_use]
    pub fn caches(mut self, caches: Arc<Caches>) -> Self {
        self.caches = Some(caches);
        self
    }

    /// Stop a [`Validator::validate_all()`] run once `failures` fields have
    /// failed (verdict `false` or an error). Zero disables the limit.
    #[must_use]
    pub fn fail_fast(mut self, failures: usize) -> Self {
        self.fail_fast = (failures > 0).then_some(failures);
        self
    }

    pub fn build(self) -> Validator {
        Validator {
            registry: self.registry,
            caches: self.caches.unwrap_or_else(Caches::global),
            fail_fast: self.fail_fast,
        }
    }
}

/// An immutable validator. Thread-safe and designed to live behind `Arc`.
#[derive(Debug, Clone)]
#[must_use]
pub struct Validator {
    registry: Registry,
    caches: Arc<Caches>,
    fail_fast: Option<usize>,
}

impl Default for Validator {
    fn default() -> Self {
        ValidatorBuilder::new().build()
    }
}

impl Validator {
    #[must_use]
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn caches(&self) -> &Arc<Caches> {
        &self.caches
    }

    /// Validate a single value. Back-references resolve against the value
    /// itself.
    ///
    /// # Errors
    ///
    /// Any [`Error`] raised while evaluating the expression.
    pub fn validate_one(&self, value: &Value, expression: &str) -> Result<ValidationResult, Error> {
        let verdicts = HashMap::new();
        let env = FieldEnv {
            registry: &self.registry,
            caches: &self.caches,
            data: value,
            path: None,
            verdicts: &verdicts,
        };
        validate_field(&env, value, expression)
    }

    /// Validate every field of `data` named by `spec` (path → expression).
    ///
    /// Wildcard paths are expanded first. Fields are validated in order and a
    /// field's error is recorded against its path without affecting the
    /// others. `${@path}` back-references see the verdicts of fields validated
    /// earlier in the same run.
    pub fn validate_all<I, K, E>(&self, data: &Value, spec: I) -> ValidationReport
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: AsRef<str>,
    {
        let start = Instant::now();
        let spec: Vec<(String, E)> = spec.into_iter().map(|(k, e)| (k.into(), e)).collect();
        let expanded = path::expand_wildcards(&index_spec(&spec), data);

        let mut verdicts: HashMap<String, bool> = HashMap::new();
        let mut entries = Vec::with_capacity(expanded.len());
        let mut failures = 0;
        let mut stopped_early = false;
        for (field, index) in expanded {
            if self.fail_fast.is_some_and(|limit| failures >= limit) {
                stopped_early = true;
                break;
            }
            let value = path::get(data, &field, Value::Null);
            let env = FieldEnv {
                registry: &self.registry,
                caches: &self.caches,
                data,
                path: Some(field.as_str()),
                verdicts: &verdicts,
            };
            let result = validate_field(&env, &value, spec[index].1.as_ref());
            match &result {
                Ok(r) => {
                    verdicts.insert(field.clone(), r.is_valid());
                    if !r.is_valid() {
                        failures += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %field, error = %e, "field validation failed");
                    failures += 1;
                }
            }
            entries.push((field, result));
        }

        let report = ValidationReport::new(entries, stopped_early, start.elapsed());
        tracing::debug!(
            fields = report.len(),
            failures,
            stopped_early,
            duration = ?report.duration(),
            "validation run finished"
        );
        report
    }
}

/// Pair each path with its position so expansion can carry a cheap index.
fn index_spec<E>(spec: &[(String, E)]) -> Vec<(String, usize)> {
    spec.iter()
        .enumerate()
        .map(|(i, (path, _))| (path.clone(), i))
        .collect()
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({} rules", self.registry.names().len())?;
        if let Some(limit) = self.fail_fast {
            write!(f, ", fail fast after {limit}")?;
        }
        write!(f, ")")
    }
}
