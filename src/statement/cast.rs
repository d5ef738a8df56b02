use std::fmt;
use std::str::FromStr;

use serde_json::{Number, Value};

/// How a positional rule argument is converted before the rule sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TypeCast {
    /// JSON literal detection, falling back to the raw text.
    #[default]
    Auto,
    Int,
    Float,
    Bool,
    Array,
    String,
    /// Collects every remaining argument into one array, each element cast
    /// with the inner conversion.
    Variadic(Box<TypeCast>),
}

impl TypeCast {
    /// Parse a comma-separated signature such as `"int, ...string"`.
    ///
    /// # Errors
    ///
    /// Returns the offending entry when it names no known conversion.
    pub fn signature(text: &str) -> Result<Vec<TypeCast>, String> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        text.split(',').map(str::parse).collect()
    }

    /// Convert `value` according to this cast.
    ///
    /// # Errors
    ///
    /// Returns a description of why the value cannot be converted.
    pub fn cast(&self, value: Value) -> Result<Value, String> {
        match self {
            TypeCast::Auto => Ok(auto(value)),
            TypeCast::Int => to_int(value),
            TypeCast::Float => to_float(value),
            TypeCast::Bool => to_bool(value),
            TypeCast::Array => to_array(value),
            TypeCast::String => Ok(Value::String(to_text(&value))),
            TypeCast::Variadic(inner) => match inner.cast(value)? {
                Value::Array(items) => Ok(Value::Array(items)),
                other => Ok(Value::Array(vec![other])),
            },
        }
    }
}

impl FromStr for TypeCast {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_prefix("...") {
            return Ok(TypeCast::Variadic(Box::new(inner.parse()?)));
        }
        match s {
            "" | "auto" | "mixed" => Ok(TypeCast::Auto),
            "int" | "integer" => Ok(TypeCast::Int),
            "float" | "double" => Ok(TypeCast::Float),
            "bool" | "boolean" => Ok(TypeCast::Bool),
            "array" => Ok(TypeCast::Array),
            "string" => Ok(TypeCast::String),
            other => Err(format!("unknown type cast '{other}'")),
        }
    }
}

impl fmt::Display for TypeCast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeCast::Auto => write!(f, "auto"),
            TypeCast::Int => write!(f, "int"),
            TypeCast::Float => write!(f, "float"),
            TypeCast::Bool => write!(f, "bool"),
            TypeCast::Array => write!(f, "array"),
            TypeCast::String => write!(f, "string"),
            TypeCast::Variadic(inner) => write!(f, "...{inner}"),
        }
    }
}

fn auto(value: Value) -> Value {
    match value {
        Value::String(text) if !text.is_empty() => {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
        other => other,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_int(value: Value) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::from(0)),
        Value::Bool(b) => Ok(Value::from(i64::from(b))),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
        Value::Number(n) => Ok(Value::from(n.as_f64().unwrap_or(0.0).trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(Value::from(0));
            }
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Value::from(i));
            }
            match text.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Value::from(f.trunc() as i64)),
                _ => Err(format!("'{text}' is not an integer")),
            }
        }
        other => Err(format!("cannot cast {other} to int")),
    }
}

fn to_float(value: Value) -> Result<Value, String> {
    let f = match &value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(text) if text.trim().is_empty() => 0.0,
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{text}' is not a number"))?,
        other => return Err(format!("cannot cast {other} to float")),
    };
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| format!("{f} is not a finite number"))
}

fn to_bool(value: Value) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Bool(false)),
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" | "" => Ok(Value::Bool(false)),
            _ => Err(format!("'{text}' is not a boolean")),
        },
        other => Err(format!("cannot cast {other} to bool")),
    }
}

fn to_array(value: Value) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Array(Vec::new())),
        Value::Array(_) | Value::Object(_) => Ok(value),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(Value::Array(Vec::new()));
            }
            if trimmed.starts_with('[') || trimmed.starts_with('{') {
                return serde_json::from_str(trimmed)
                    .map_err(|e| format!("'{trimmed}' is not a valid array literal: {e}"));
            }
            Ok(Value::Array(vec![Value::String(text)]))
        }
        scalar => Ok(Value::Array(vec![scalar])),
    }
}

/// Canonical text of a value: strings verbatim, `null` empty, everything else JSON.
pub(crate) fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn text(s: &str) -> Value {
        Value::String(s.to_owned())
    }

    #[test]
    fn signature_parsing() {
        assert_eq!(
            TypeCast::signature("int, float,...string").unwrap(),
            vec![
                TypeCast::Int,
                TypeCast::Float,
                TypeCast::Variadic(Box::new(TypeCast::String)),
            ]
        );
        assert_eq!(
            TypeCast::signature("...").unwrap(),
            vec![TypeCast::Variadic(Box::new(TypeCast::Auto))]
        );
        assert!(TypeCast::signature("").unwrap().is_empty());
        assert!(TypeCast::signature("int,date").is_err());
    }

    #[test]
    fn display_matches_signature_syntax() {
        let casts = TypeCast::signature("int,...bool").unwrap();
        let rendered: Vec<String> = casts.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["int", "...bool"]);
    }

    #[test]
    fn auto_detects_json_literals() {
        assert_eq!(TypeCast::Auto.cast(text("3")), Ok(json!(3)));
        assert_eq!(TypeCast::Auto.cast(text("2.5")), Ok(json!(2.5)));
        assert_eq!(TypeCast::Auto.cast(text("true")), Ok(json!(true)));
        assert_eq!(TypeCast::Auto.cast(text("null")), Ok(Value::Null));
        assert_eq!(TypeCast::Auto.cast(text("[1,2]")), Ok(json!([1, 2])));
        assert_eq!(TypeCast::Auto.cast(text("\"1\"")), Ok(json!("1")));
        assert_eq!(TypeCast::Auto.cast(text("abc")), Ok(json!("abc")));
        assert_eq!(TypeCast::Auto.cast(text("")), Ok(json!("")));
    }

    #[test]
    fn int_casts() {
        assert_eq!(TypeCast::Int.cast(text("42")), Ok(json!(42)));
        assert_eq!(TypeCast::Int.cast(text(" 7 ")), Ok(json!(7)));
        assert_eq!(TypeCast::Int.cast(text("3.9")), Ok(json!(3)));
        assert_eq!(TypeCast::Int.cast(text("")), Ok(json!(0)));
        assert_eq!(TypeCast::Int.cast(json!(true)), Ok(json!(1)));
        assert!(TypeCast::Int.cast(text("abc")).is_err());
        assert!(TypeCast::Int.cast(json!([1])).is_err());
    }

    #[test]
    fn float_casts() {
        assert_eq!(TypeCast::Float.cast(text("1.5")), Ok(json!(1.5)));
        assert_eq!(TypeCast::Float.cast(text("")), Ok(json!(0.0)));
        assert_eq!(TypeCast::Float.cast(json!(2)), Ok(json!(2.0)));
        assert!(TypeCast::Float.cast(text("x")).is_err());
        assert!(TypeCast::Float.cast(text("inf")).is_err());
    }

    #[test]
    fn bool_casts() {
        for t in ["true", "1", "yes", "ON"] {
            assert_eq!(TypeCast::Bool.cast(text(t)), Ok(json!(true)), "{t}");
        }
        for f in ["false", "0", "no", "off", ""] {
            assert_eq!(TypeCast::Bool.cast(text(f)), Ok(json!(false)), "{f}");
        }
        assert!(TypeCast::Bool.cast(text("maybe")).is_err());
    }

    #[test]
    fn array_casts() {
        assert_eq!(TypeCast::Array.cast(text("[1,\"a\"]")), Ok(json!([1, "a"])));
        assert_eq!(TypeCast::Array.cast(text("{\"k\":1}")), Ok(json!({"k": 1})));
        assert_eq!(TypeCast::Array.cast(text("")), Ok(json!([])));
        assert_eq!(TypeCast::Array.cast(text("a")), Ok(json!(["a"])));
        assert_eq!(TypeCast::Array.cast(json!(5)), Ok(json!([5])));
        assert!(TypeCast::Array.cast(text("[1,")).is_err());
    }

    #[test]
    fn string_casts() {
        assert_eq!(TypeCast::String.cast(text("5")), Ok(json!("5")));
        assert_eq!(TypeCast::String.cast(json!(5)), Ok(json!("5")));
        assert_eq!(TypeCast::String.cast(Value::Null), Ok(json!("")));
        assert_eq!(TypeCast::String.cast(json!([1])), Ok(json!("[1]")));
    }
}
