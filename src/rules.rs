//! The built-in rule catalog.
//!
//! Sized rules (`min`, `max`, `between`) measure strings by character count,
//! arrays and objects by element count and numbers by value.

use std::sync::OnceLock;

use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;

use crate::registry::{Registry, RuleContext, RuleError};
use crate::statement::{to_text, TypeCast};

pub(crate) fn register_builtin(registry: &mut Registry) {
    use TypeCast::{Float, String as Str, Variadic};

    registry.register("required", &[], |v, _, _| Ok(!is_blank(v)));
    registry.register("allowed", &[], |_, _, _| Ok(true));
    registry.register("forbidden", &[], |v, _, _| Ok(v.is_null()));
    registry.register("null", &[], |v, _, _| Ok(v.is_null()));
    registry.register("empty", &[], |v, _, _| Ok(is_empty(v)));

    registry.register("string", &[], |v, _, _| Ok(v.is_string()));
    registry.register("integer", &[], |v, _, _| Ok(v.is_i64() || v.is_u64()));
    registry.register("float", &[], |v, _, _| Ok(v.is_f64()));
    registry.register("numeric", &[], |v, _, _| Ok(as_number(v).is_some()));
    registry.register("boolean", &[], |v, _, _| Ok(v.is_boolean()));
    registry.register("array", &[], |v, _, _| Ok(v.is_array()));
    registry.register("object", &[], |v, _, _| Ok(v.is_object()));

    registry.register("min", &[Float], |v, args, _| {
        Ok(size(v).is_some_and(|s| s >= number_arg(args, 0)))
    });
    registry.register("max", &[Float], |v, args, _| {
        Ok(size(v).is_some_and(|s| s <= number_arg(args, 0)))
    });
    registry.register("between", &[Float, Float], |v, args, _| {
        let (lo, hi) = (number_arg(args, 0), number_arg(args, 1));
        Ok(size(v).is_some_and(|s| lo <= s && s <= hi))
    });

    registry.register("equals", &[TypeCast::Auto], |v, args, _| {
        Ok(args.first().is_some_and(|expected| loosely_equal(v, expected)))
    });
    registry.register("same", &[Str], |v, args, ctx| {
        Ok(sibling(args, ctx).is_some_and(|other| loosely_equal(v, other)))
    });
    registry.register("different", &[Str], |v, args, ctx| {
        Ok(!sibling(args, ctx).is_some_and(|other| loosely_equal(v, other)))
    });
    registry.register("in", &[Variadic(Box::new(TypeCast::Auto))], |v, args, _| {
        Ok(choices(args).iter().any(|choice| loosely_equal(v, choice)))
    });

    registry.register("matches", &[Str], |v, args, _| {
        let pattern = args.first().map(to_text).unwrap_or_default();
        let re = compiled(&pattern)?;
        Ok(match v {
            Value::String(s) => re.is_match(s),
            Value::Number(n) => re.is_match(&n.to_string()),
            _ => false,
        })
    });
    registry.register("alpha", &[], |v, _, _| {
        Ok(non_empty_str(v).is_some_and(|s| s.chars().all(char::is_alphabetic)))
    });
    registry.register("alnum", &[], |v, _, _| {
        Ok(non_empty_str(v).is_some_and(|s| s.chars().all(char::is_alphanumeric)))
    });
    registry.register("email", &[], |v, _, _| {
        let re = compiled(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")?;
        Ok(v.as_str().is_some_and(|s| re.is_match(s)))
    });

    registry.alias("str", "string");
    registry.alias("int", "integer");
    registry.alias("bool", "boolean");
    registry.alias("regex", "matches");

    registry.define_macro("nullable", "?null");
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn is_empty(v: &Value) -> bool {
    match v {
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        other => is_blank(other),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn size(v: &Value) -> Option<f64> {
    match v {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Object(map) => Some(map.len() as f64),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn number_arg(args: &[Value], i: usize) -> f64 {
    args.get(i).and_then(Value::as_f64).unwrap_or(0.0)
}

fn non_empty_str(v: &Value) -> Option<&str> {
    v.as_str().filter(|s| !s.is_empty())
}

/// Equality with numbers compared by value (`1 == 1.0`).
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn sibling<'a>(args: &[Value], ctx: &RuleContext<'a>) -> Option<&'a Value> {
    args.first()
        .and_then(Value::as_str)
        .and_then(|path| ctx.lookup(path))
}

/// `in:a,b,c` and `in:'["a","b","c"]'` both list their choices.
fn choices(args: &[Value]) -> Vec<Value> {
    match args.first() {
        Some(Value::Array(items)) => match items.as_slice() {
            [Value::Array(inner)] => inner.clone(),
            _ => items.clone(),
        },
        _ => Vec::new(),
    }
}

fn regex_cache() -> &'static DashMap<String, Regex> {
    static CACHE: OnceLock<DashMap<String, Regex>> = OnceLock::new();
    CACHE.get_or_init(DashMap::new)
}

/// Compile `pattern`, accepting `/body/flags` delimiters, memoized process-wide.
fn compiled(pattern: &str) -> Result<Regex, RuleError> {
    if let Some(re) = regex_cache().get(pattern) {
        return Ok(re.value().clone());
    }
    let source = match pattern
        .strip_prefix('/')
        .and_then(|rest| rest.rfind('/').map(|end| (&rest[..end], &rest[end + 1..])))
    {
        Some((body, "")) => body.to_owned(),
        Some((body, flags)) => format!("(?{flags}){body}"),
        None => pattern.to_owned(),
    };
    let re = Regex::new(&source)
        .map_err(|e| RuleError::new(format!("invalid pattern '{pattern}': {e}")))?;
    regex_cache().insert(pattern.to_owned(), re.clone());
    Ok(re)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn check(name: &str, value: Value, args: &[Value]) -> Result<bool, RuleError> {
        let registry = Registry::with_builtin_rules();
        let data = json!({"user": {"password": "hunter2"}});
        let ctx = RuleContext::new(&data, None, name);
        registry.resolve(name).unwrap().call(&value, args, &ctx)
    }

    #[test]
    fn presence_rules() {
        assert_eq!(check("required", json!("x"), &[]), Ok(true));
        assert_eq!(check("required", json!("  "), &[]), Ok(false));
        assert_eq!(check("required", Value::Null, &[]), Ok(false));
        assert_eq!(check("required", json!(0), &[]), Ok(true));
        assert_eq!(check("allowed", Value::Null, &[]), Ok(true));
        assert_eq!(check("forbidden", Value::Null, &[]), Ok(true));
        assert_eq!(check("empty", json!(0), &[]), Ok(true));
        assert_eq!(check("empty", json!([1]), &[]), Ok(false));
    }

    #[test]
    fn type_rules() {
        assert_eq!(check("string", json!("abc"), &[]), Ok(true));
        assert_eq!(check("string", json!(5), &[]), Ok(false));
        assert_eq!(check("int", json!(5), &[]), Ok(true));
        assert_eq!(check("integer", json!(5.5), &[]), Ok(false));
        assert_eq!(check("float", json!(5.5), &[]), Ok(true));
        assert_eq!(check("numeric", json!("5.5"), &[]), Ok(true));
        assert_eq!(check("numeric", json!("x"), &[]), Ok(false));
        assert_eq!(check("bool", json!(false), &[]), Ok(true));
    }

    #[test]
    fn sized_rules() {
        assert_eq!(check("min", json!("abc"), &[json!(3.0)]), Ok(true));
        assert_eq!(check("min", json!("ab"), &[json!(3.0)]), Ok(false));
        assert_eq!(check("min", json!(5), &[json!(3.0)]), Ok(true));
        assert_eq!(check("max", json!([1, 2, 3]), &[json!(2.0)]), Ok(false));
        assert_eq!(check("between", json!(4), &[json!(1.0), json!(5.0)]), Ok(true));
        assert_eq!(check("min", Value::Null, &[json!(0.0)]), Ok(false));
    }

    #[test]
    fn comparison_rules() {
        assert_eq!(check("equals", json!(1), &[json!(1.0)]), Ok(true));
        assert_eq!(check("equals", json!("a"), &[json!("b")]), Ok(false));
        assert_eq!(check("same", json!("hunter2"), &[json!("user.password")]), Ok(true));
        assert_eq!(check("different", json!("x"), &[json!("user.password")]), Ok(true));
        assert_eq!(check("in", json!("b"), &[json!(["a", "b"])]), Ok(true));
        assert_eq!(check("in", json!("b"), &[json!([["a", "b"]])]), Ok(true));
        assert_eq!(check("in", json!("z"), &[json!(["a", "b"])]), Ok(false));
    }

    #[test]
    fn pattern_rules() {
        assert_eq!(check("matches", json!("abc"), &[json!("^a")]), Ok(true));
        assert_eq!(check("regex", json!("ABC"), &[json!("/^abc$/i")]), Ok(true));
        assert_eq!(check("matches", json!(42), &[json!(r"^\d+$")]), Ok(true));
        assert!(check("matches", json!("x"), &[json!("(")]).is_err());
        assert_eq!(check("alpha", json!("abc"), &[]), Ok(true));
        assert_eq!(check("alnum", json!("ab-1"), &[]), Ok(false));
        assert_eq!(check("email", json!("a@b.io"), &[]), Ok(true));
        assert_eq!(check("email", json!("a@b"), &[]), Ok(false));
    }

    #[test]
    fn nullable_macro_is_registered() {
        let registry = Registry::with_builtin_rules();
        assert_eq!(registry.expand_macros("[nullable]|string"), "?null|string");
    }
}
