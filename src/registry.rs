use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::expression;
use crate::statement::TypeCast;
use crate::{path, Error};

/// Longest alias chain followed before a name is reported unknown.
const MAX_ALIAS_DEPTH: usize = 8;
/// Macro expansion passes; expansions may reference further macros.
const MAX_MACRO_DEPTH: usize = 8;
/// Largest edit distance still offered as a suggestion.
const SUGGESTION_DISTANCE: usize = 3;

/// Failure raised by a rule implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuleError {
    message: String,
}

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What a rule can see beyond its own value and arguments.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    data: &'a Value,
    path: Option<&'a str>,
    statement: &'a str,
}

impl<'a> RuleContext<'a> {
    pub(crate) fn new(data: &'a Value, path: Option<&'a str>, statement: &'a str) -> Self {
        Self {
            data,
            path,
            statement,
        }
    }

    /// The whole data set being validated.
    #[must_use]
    pub fn data(&self) -> &'a Value {
        self.data
    }

    /// Path of the field under validation, when validating a data set.
    #[must_use]
    pub fn path(&self) -> Option<&'a str> {
        self.path
    }

    /// The statement text that invoked the rule.
    #[must_use]
    pub fn statement(&self) -> &'a str {
        self.statement
    }

    /// Look up a sibling field by dot path.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&'a Value> {
        path::get_ref(self.data, path)
    }
}

/// Signature of a rule implementation: value, cast arguments, context.
pub type RuleFn =
    Arc<dyn Fn(&Value, &[Value], &RuleContext<'_>) -> Result<bool, RuleError> + Send + Sync>;

/// A registered rule: its argument casts and implementation.
#[derive(Clone)]
pub struct RuleDefinition {
    name: String,
    casts: Vec<TypeCast>,
    func: RuleFn,
}

impl RuleDefinition {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn casts(&self) -> &[TypeCast] {
        &self.casts
    }

    /// Run the rule.
    ///
    /// # Errors
    ///
    /// Whatever the implementation reports.
    pub fn call(
        &self,
        value: &Value,
        arguments: &[Value],
        ctx: &RuleContext<'_>,
    ) -> Result<bool, RuleError> {
        (self.func)(value, arguments, ctx)
    }
}

impl fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("name", &self.name)
            .field("casts", &self.casts)
            .finish_non_exhaustive()
    }
}

/// Rules, aliases and macros available to a validator.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    rules: HashMap<String, RuleDefinition>,
    aliases: HashMap<String, String>,
    macros: HashMap<String, String>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in rules, aliases and macros.
    #[must_use]
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        crate::rules::register_builtin(&mut registry);
        registry
    }

    /// Register (or replace) a rule.
    pub fn register<F>(&mut self, name: &str, casts: &[TypeCast], func: F)
    where
        F: Fn(&Value, &[Value], &RuleContext<'_>) -> Result<bool, RuleError>
            + Send
            + Sync
            + 'static,
    {
        self.rules.insert(
            name.to_owned(),
            RuleDefinition {
                name: name.to_owned(),
                casts: casts.to_vec(),
                func: Arc::new(func),
            },
        );
    }

    /// Make `alias` resolve to `target`.
    pub fn alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(alias.to_owned(), target.to_owned());
    }

    /// Define a macro, referenced as `[name]` inside expressions.
    pub fn define_macro(&mut self, name: &str, expansion: &str) {
        self.macros.insert(name.to_owned(), expansion.to_owned());
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// Every name that resolves to a rule (rules and aliases), sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .rules
            .keys()
            .chain(self.aliases.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    /// Find the rule for `name`, following aliases.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRule`] with near-match suggestions.
    pub fn resolve(&self, name: &str) -> Result<&RuleDefinition, Error> {
        let mut current = name;
        for _ in 0..=MAX_ALIAS_DEPTH {
            if let Some(rule) = self.rules.get(current) {
                return Ok(rule);
            }
            match self.aliases.get(current) {
                Some(target) => current = target.as_str(),
                None => break,
            }
        }
        Err(Error::UnknownRule {
            name: name.to_owned(),
            suggestions: self.suggestions(name),
        })
    }

    /// Registered names within a small edit distance of `name`, closest first.
    #[must_use]
    pub fn suggestions(&self, name: &str) -> Vec<String> {
        let mut scored: Vec<(usize, &str)> = self
            .names()
            .into_iter()
            .map(|candidate| (strsim::levenshtein(name, candidate), candidate))
            .filter(|&(distance, _)| distance <= SUGGESTION_DISTANCE)
            .collect();
        scored.sort_unstable();
        scored
            .into_iter()
            .take(3)
            .map(|(_, candidate)| candidate.to_owned())
            .collect()
    }

    /// Replace every `[name]` that names a macro with its expansion.
    ///
    /// Quoted arguments are left alone, so `equals:'[nullable]'` compares
    /// against the literal text.
    #[must_use]
    pub fn expand_macros(&self, expression: &str) -> String {
        let mut current = expression.to_owned();
        if self.macros.is_empty() {
            return current;
        }
        for _ in 0..MAX_MACRO_DEPTH {
            let next = expression::replace_macro_references(&current, |name| {
                self.macros.get(name).map(String::as_str)
            });
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}
