use serde_json::Value;

/// Characters that force a rendered argument into single quotes.
const RESERVED: &[char] = &[
    '&', '|', '^', '~', '(', ')', '[', ']', '{', '}', ',', '\'', '\\',
];

/// Whether `text` is exactly one `${...}` back-reference.
#[must_use]
pub fn is_back_reference(text: &str) -> bool {
    text.strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .is_some_and(|inner| !inner.is_empty() && !inner.contains(|c: char| c == '{' || c == '}'))
}

/// Render one argument value as statement text.
///
/// Compound values render as compact JSON, scalars bare. Strings that would be
/// read back as something else (numbers, `true`, `null`, ...), that contain
/// whitespace, or that are empty are rendered as JSON strings. Anything that
/// then contains a connective, bracket, comma, quote or backslash is wrapped
/// in escaped single quotes. Back-references stay bare so they can still be
/// substituted.
#[must_use]
pub fn serialize_value(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) if is_back_reference(s) => return s.clone(),
        Value::String(s) if needs_json_quotes(s) => Value::String(s.clone()).to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if rendered.contains(RESERVED) {
        quote(&rendered)
    } else {
        rendered
    }
}

/// Render an argument list as the text after a statement's `:`.
#[must_use]
pub fn serialize_arguments(arguments: &[Value]) -> String {
    arguments
        .iter()
        .map(serialize_value)
        .collect::<Vec<_>>()
        .join(",")
}

fn needs_json_quotes(s: &str) -> bool {
    s.is_empty()
        || s.chars().any(char::is_whitespace)
        || serde_json::from_str::<Value>(s).is_ok()
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}
