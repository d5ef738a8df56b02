use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::cache::Caches;
use crate::expression::{self, ParsedExpression, Token};
use crate::registry::{Registry, RuleContext, RuleDefinition};
use crate::statement::{self, is_back_reference, to_text};
use crate::types::{Metadata, RuleOutcome, ValidationResult};
use crate::{bitwise, path, Error};

/// Everything one field evaluation can see besides its own value.
pub(crate) struct FieldEnv<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) caches: &'a Caches,
    /// Root of the data set; back-references resolve against it.
    pub(crate) data: &'a Value,
    pub(crate) path: Option<&'a str>,
    /// Verdicts of fields already validated in this run.
    pub(crate) verdicts: &'a HashMap<String, bool>,
}

#[allow(clippy::expect_used)] // Static regex pattern is hardcoded and valid
fn placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^{}]+)\}").expect("valid regex"))
}

/// Validate `value` against `expression`.
pub(crate) fn validate_field(
    env: &FieldEnv<'_>,
    value: &Value,
    expression: &str,
) -> Result<ValidationResult, Error> {
    let expanded = env.registry.expand_macros(expression);
    let parsed = expression::parse(&expanded, env.caches);
    let behavior = parsed.behavior();

    let mut memo: HashMap<&str, bool> = HashMap::new();
    let mut outcomes: Vec<Option<bool>> = Vec::with_capacity(parsed.tokens().len());
    let mut stopped = false;
    for token in parsed.tokens() {
        if let Some(&known) = memo.get(token.statement()) {
            outcomes.push(Some(known));
            continue;
        }
        if stopped {
            outcomes.push(None);
            continue;
        }
        let outcome = run_statement(env, value, token)?;
        tracing::trace!(
            rule = token.name(),
            statement = token.statement(),
            outcome,
            "rule evaluated"
        );
        memo.insert(token.statement(), outcome);
        outcomes.push(Some(outcome));
        stopped = behavior.stops_on(outcome);
    }

    let bits = substitute_bits(&parsed, &outcomes);
    let result = bitwise::evaluate(&bits, &env.caches.bitwise)?;
    tracing::debug!(path = env.path, result, bitwise = %bits, "field validated");

    let rule_outcomes = parsed
        .tokens()
        .iter()
        .zip(&outcomes)
        .map(|(token, &outcome)| RuleOutcome::new(token.name(), token.statement(), outcome))
        .collect();
    let metadata = Metadata::new(
        expression,
        behavior,
        parsed.statements().map(str::to_owned).collect(),
        bits,
    );
    Ok(ValidationResult::new(value.clone(), result, rule_outcomes, metadata))
}

/// Write each token's bit over its span in the expression body.
///
/// Skipped tokens take the behavior's terminal bit.
fn substitute_bits(parsed: &ParsedExpression, outcomes: &[Option<bool>]) -> String {
    let body = parsed.body();
    let terminal = parsed.behavior().terminal_bit().unwrap_or('0');
    let mut bits = String::with_capacity(body.len());
    let mut last = 0;
    for (token, outcome) in parsed.tokens().iter().zip(outcomes) {
        let span = token.span();
        bits.push_str(&body[last..span.start]);
        bits.push(match outcome {
            Some(true) => '1',
            Some(false) => '0',
            None => terminal,
        });
        last = span.end;
    }
    bits.push_str(&body[last..]);
    bits
}

fn run_statement(env: &FieldEnv<'_>, value: &Value, token: &Token) -> Result<bool, Error> {
    let rule = env.registry.resolve(token.name())?;
    let arguments = arguments(env, value, token, rule)?;
    let ctx = RuleContext::new(env.data, env.path, token.statement());
    rule.call(value, &arguments, &ctx)
        .map_err(|e| Error::RuleExecutionFailed {
            rule: token.name().to_owned(),
            message: e.to_string(),
        })
}

/// Cast arguments for `token`, substituting back-references first.
///
/// Statements without placeholders go through the statement cache.
fn arguments(
    env: &FieldEnv<'_>,
    value: &Value,
    token: &Token,
    rule: &RuleDefinition,
) -> Result<Vec<Value>, Error> {
    let text = token.statement();
    if !text.contains("${") {
        let parsed = statement::parse(text, rule.casts(), &env.caches.statements)?;
        return Ok(parsed.into_parts().1);
    }
    let (_, raw) = statement::split(text)?;
    let raw = raw
        .into_iter()
        .map(|arg| {
            if is_back_reference(&arg) {
                resolve_reference(env, value, &arg[2..arg.len() - 1])
            } else {
                Value::String(interpolate(env, value, &arg))
            }
        })
        .collect();
    statement::cast_arguments(text, raw, rule.casts())
}

fn interpolate(env: &FieldEnv<'_>, value: &Value, text: &str) -> String {
    placeholder_pattern()
        .replace_all(text, |caps: &Captures<'_>| {
            to_text(&resolve_reference(env, value, &caps[1]))
        })
        .into_owned()
}

/// `self`, `@field.path` (a prior verdict) or `field.path` (a data value).
fn resolve_reference(env: &FieldEnv<'_>, value: &Value, reference: &str) -> Value {
    let reference = reference.trim();
    if reference == "self" {
        return value.clone();
    }
    match reference.strip_prefix('@') {
        Some(field) => env
            .verdicts
            .get(field)
            .map_or(Value::Null, |&verdict| Value::Bool(verdict)),
        None => path::get(env.data, reference, Value::Null),
    }
}
