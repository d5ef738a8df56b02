pub mod bitwise;
pub mod cache;
mod error;
mod evaluate;
pub mod expression;
pub mod path;
pub mod registry;
mod rules;
pub mod statement;
mod types;
mod validator;

pub use cache::Caches;
pub use error::Error;
pub use expression::{ParsedExpression, Token};
pub use registry::{Registry, RuleContext, RuleError};
pub use statement::{Statement, TypeCast};
pub use types::{Behavior, Metadata, RuleOutcome, ValidationReport, ValidationResult};
pub use validator::{Validator, ValidatorBuilder};

use serde_json::Value;

/// Parse a rule statement such as `between:1,10` with the process-wide cache.
///
/// # Errors
///
/// Returns [`Error::InvalidRuleStatement`] when the statement cannot be parsed
/// or an argument cannot be cast.
pub fn parse_rule(statement: &str, casts: &[TypeCast]) -> Result<Statement, Error> {
    statement::parse(statement, casts, &Caches::global().statements)
}

/// Strip comments and whitespace outside double-quoted literals.
#[must_use]
pub fn clean_expression(text: &str) -> String {
    expression::clean(text, &Caches::global().cleaned).to_string()
}

/// Clean and tokenize an expression with the process-wide cache.
#[must_use]
pub fn parse_expression(text: &str) -> ParsedExpression {
    expression::parse(text, &Caches::global())
}

/// Reduce a bitwise expression such as `1&(0|~0)` to a boolean.
///
/// # Errors
///
/// [`Error::MalformedExpression`] or [`Error::NonTerminatingExpression`].
pub fn evaluate_bitwise_expression(expression: &str) -> Result<bool, Error> {
    bitwise::evaluate(expression, &Caches::global().bitwise)
}

/// Render argument values back into statement text (the part after `:`).
#[must_use]
pub fn serialize_arguments(arguments: &[Value]) -> String {
    statement::serialize_arguments(arguments)
}
