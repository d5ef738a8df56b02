use thiserror::Error;

/// Unified error type for expression parsing, reduction and rule execution.
///
/// Every variant is local to one field:
/// [`Validator::validate_all()`](crate::Validator::validate_all) records it
/// against the failing path and carries on with the remaining fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("malformed bitwise expression '{expression}': {reason}")]
    MalformedExpression { expression: String, reason: String },

    #[error("bitwise expression '{expression}' does not reduce to a single bit: {reason}")]
    NonTerminatingExpression { expression: String, reason: String },

    #[error("unknown rule '{name}'{}", format_suggestions(suggestions))]
    UnknownRule {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("rule '{rule}' failed: {message}")]
    RuleExecutionFailed { rule: String, message: String },

    #[error("invalid rule statement '{statement}': {reason}")]
    InvalidRuleStatement { statement: String, reason: String },
}

impl Error {
    pub(crate) fn malformed(expression: &str, reason: impl Into<String>) -> Self {
        Error::MalformedExpression {
            expression: expression.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn non_terminating(expression: &str, reason: impl Into<String>) -> Self {
        Error::NonTerminatingExpression {
            expression: expression.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_statement(statement: &str, reason: impl Into<String>) -> Self {
        Error::InvalidRuleStatement {
            statement: statement.to_owned(),
            reason: reason.into(),
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!("; did you mean {}?", suggestions.join(", "))
    }
}
