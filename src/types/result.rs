use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::behavior::Behavior;

/// Outcome of one rule statement occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    name: String,
    statement: String,
    outcome: Option<bool>,
}

impl RuleOutcome {
    pub(crate) fn new(name: &str, statement: &str, outcome: Option<bool>) -> Self {
        Self {
            name: name.to_owned(),
            statement: statement.to_owned(),
            outcome,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// `None` when the rule was skipped by short-circuiting.
    #[must_use]
    pub fn outcome(&self) -> Option<bool> {
        self.outcome
    }
}

/// How a verdict was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    expression: String,
    behavior: Behavior,
    statements: Vec<String>,
    bitwise: String,
}

impl Metadata {
    pub(crate) fn new(
        expression: &str,
        behavior: Behavior,
        statements: Vec<String>,
        bitwise: String,
    ) -> Self {
        Self {
            expression: expression.to_owned(),
            behavior,
            statements,
            bitwise,
        }
    }

    /// The expression as written, before macro expansion.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    #[must_use]
    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Cleaned statement texts in order of appearance.
    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// The bit string handed to the evaluator, e.g. `1&(0|1)`.
    #[must_use]
    pub fn bitwise(&self) -> &str {
        &self.bitwise
    }
}

/// Verdict for one value checked against one expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[must_use]
pub struct ValidationResult {
    value: Value,
    result: bool,
    outcomes: Vec<RuleOutcome>,
    metadata: Metadata,
}

impl ValidationResult {
    pub(crate) fn new(
        value: Value,
        result: bool,
        outcomes: Vec<RuleOutcome>,
        metadata: Metadata,
    ) -> Self {
        Self {
            value,
            result,
            outcomes,
            metadata,
        }
    }

    /// The value that was validated.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.result
    }

    /// One entry per statement occurrence, in order.
    #[must_use]
    pub fn outcomes(&self) -> &[RuleOutcome] {
        &self.outcomes
    }

    /// Outcomes keyed by rule name.
    ///
    /// When a name occurs more than once, an evaluated outcome is never
    /// replaced by a skipped one.
    #[must_use]
    pub fn results(&self) -> BTreeMap<&str, Option<bool>> {
        let mut map: BTreeMap<&str, Option<bool>> = BTreeMap::new();
        for outcome in &self.outcomes {
            let slot = map.entry(outcome.name()).or_insert(None);
            if outcome.outcome.is_some() {
                *slot = outcome.outcome;
            }
        }
        map
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.result { "valid" } else { "invalid" })?;
        write!(f, " ({} => {})", self.metadata.expression, self.metadata.bitwise)?;
        let failed: Vec<&str> = self
            .outcomes
            .iter()
            .filter(|o| o.outcome == Some(false))
            .map(RuleOutcome::statement)
            .collect();
        if !failed.is_empty() {
            write!(f, ", failed: [{}]", failed.join(", "))?;
        }
        Ok(())
    }
}
