//! Conversion between `name:arg1,arg2` rule statements and typed arguments.

mod cast;
mod grammar;
mod serialize;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{content_key, ContentCache, ContentKey};
use crate::Error;

pub use cast::TypeCast;
pub(crate) use cast::to_text;
pub use serialize::{is_back_reference, serialize_arguments, serialize_value};

/// Cache of parsed statements keyed by (statement text, cast signature).
pub type StatementCache = ContentCache<(ContentKey, Vec<TypeCast>), Statement>;

/// One parsed rule invocation: the rule name and its cast arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    name: String,
    arguments: Vec<Value>,
}

impl Statement {
    pub fn new(name: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.name, self.arguments)
    }

    /// Render back to statement text.
    #[must_use]
    pub fn to_text(&self) -> String {
        if self.arguments.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.name, serialize_arguments(&self.arguments))
        }
    }
}

/// Split a statement into its name and raw (uncast) argument texts.
///
/// # Errors
///
/// Returns [`Error::InvalidRuleStatement`] for an empty statement, an invalid
/// rule name or malformed argument quoting.
pub fn split(statement: &str) -> Result<(String, Vec<String>), Error> {
    use winnow::Parser;

    let trimmed = statement.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_statement(statement, "statement is empty"));
    }
    let (name, args) = match trimmed.split_once(':') {
        Some((name, args)) => (name.trim(), Some(args)),
        None => (trimmed, None),
    };
    if name.is_empty() {
        return Err(Error::invalid_statement(statement, "missing rule name"));
    }
    grammar::rule_name
        .parse(name)
        .map_err(|_| {
            Error::invalid_statement(statement, format!("'{name}' is not a valid rule name"))
        })?;

    let raw = match args {
        None | Some("") => Vec::new(),
        Some(args) => grammar::arguments
            .parse(args)
            .map_err(|e| Error::invalid_statement(statement, format!("malformed arguments: {e}")))?,
    };
    Ok((name.to_owned(), raw))
}

/// Cast argument values by position according to `casts`.
///
/// Missing trailing arguments are the empty string before casting; arguments
/// past the signature are cast with [`TypeCast::Auto`]; a variadic entry
/// collects everything that remains.
///
/// # Errors
///
/// Returns [`Error::InvalidRuleStatement`] when an argument cannot be cast.
pub fn cast_arguments(
    statement: &str,
    raw: Vec<Value>,
    casts: &[TypeCast],
) -> Result<Vec<Value>, Error> {
    let fail = |i: usize, reason: String| {
        Error::invalid_statement(statement, format!("argument {}: {reason}", i + 1))
    };

    let mut out = Vec::with_capacity(raw.len().max(casts.len()));
    let mut raw = raw.into_iter().enumerate();
    for cast in casts {
        if let TypeCast::Variadic(inner) = cast {
            let rest = raw
                .by_ref()
                .map(|(i, v)| inner.cast(v).map_err(|e| fail(i, e)))
                .collect::<Result<Vec<_>, _>>()?;
            out.push(Value::Array(rest));
            return Ok(out);
        }
        let (i, value) = raw
            .next()
            .unwrap_or((out.len(), Value::String(String::new())));
        out.push(cast.cast(value).map_err(|e| fail(i, e))?);
    }
    for (i, value) in raw {
        out.push(TypeCast::Auto.cast(value).map_err(|e| fail(i, e))?);
    }
    Ok(out)
}

/// Parse a statement and cast its arguments, memoizing the result.
///
/// # Errors
///
/// See [`split`] and [`cast_arguments`].
pub fn parse(
    statement: &str,
    casts: &[TypeCast],
    cache: &StatementCache,
) -> Result<Statement, Error> {
    let key = (content_key(statement), casts.to_vec());
    cache.get_or_try_insert(key, || {
        let (name, raw) = split(statement)?;
        let raw = raw.into_iter().map(Value::String).collect();
        let arguments = cast_arguments(statement, raw, casts)?;
        Ok(Statement { name, arguments })
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse_plain(statement: &str, casts: &[TypeCast]) -> Result<Statement, Error> {
        parse(statement, casts, &StatementCache::new())
    }

    #[test]
    fn name_only() {
        let st = parse_plain("required", &[]).unwrap();
        assert_eq!(st.name(), "required");
        assert!(st.arguments().is_empty());
    }

    #[test]
    fn dotted_name_with_arguments() {
        let st = parse_plain("string.length:3,'a,b'", &[]).unwrap();
        assert_eq!(st.name(), "string.length");
        assert_eq!(st.arguments(), &[json!(3), json!("a,b")]);
    }

    #[test]
    fn splits_on_first_colon_only() {
        let st = parse_plain("matches:'/^a:b$/'", &[TypeCast::String]).unwrap();
        assert_eq!(st.arguments(), &[json!("/^a:b$/")]);
    }

    #[test]
    fn casts_by_position() {
        let st = parse_plain("between:1,5.5", &[TypeCast::Int, TypeCast::Float]).unwrap();
        assert_eq!(st.arguments(), &[json!(1), json!(5.5)]);
    }

    #[test]
    fn missing_trailing_arguments_default_to_empty() {
        let st = parse_plain("min", &[TypeCast::Int, TypeCast::String]).unwrap();
        assert_eq!(st.arguments(), &[json!(0), json!("")]);
    }

    #[test]
    fn variadic_collects_remaining() {
        let casts = [
            TypeCast::String,
            TypeCast::Variadic(Box::new(TypeCast::Int)),
        ];
        let st = parse_plain("in:a,1,2,3", &casts).unwrap();
        assert_eq!(st.arguments(), &[json!("a"), json!([1, 2, 3])]);

        let st = parse_plain("in:a", &casts).unwrap();
        assert_eq!(st.arguments(), &[json!("a"), json!([])]);
    }

    #[test]
    fn invalid_statements() {
        for bad in ["", "   ", ":3", "1abc", "a b:1", "in:'open"] {
            assert!(
                matches!(parse_plain(bad, &[]), Err(Error::InvalidRuleStatement { .. })),
                "expected invalid statement for {bad:?}"
            );
        }
    }

    #[test]
    fn uncastable_argument_is_invalid() {
        let err = parse_plain("min:abc", &[TypeCast::Int]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid rule statement 'min:abc': argument 1: 'abc' is not an integer"
        );
    }

    #[test]
    fn cached_by_text_and_signature() {
        let cache = StatementCache::new();
        parse("min:3", &[TypeCast::Int], &cache).unwrap();
        parse("min:3", &[TypeCast::Int], &cache).unwrap();
        assert_eq!(cache.hits(), 1);

        let as_string = parse("min:3", &[TypeCast::String], &cache).unwrap();
        assert_eq!(as_string.arguments(), &[json!("3")]);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn to_text_round_trips() {
        let st = Statement::new("in", vec![json!("a b"), json!([1, 2]), json!(3)]);
        let text = st.to_text();
        assert_eq!(text, "in:\"a b\",'[1,2]',3");
        assert_eq!(parse_plain(&text, &[]).unwrap(), st);
    }
}
