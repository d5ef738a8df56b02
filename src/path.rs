//! Dot-notation access into nested data.
//!
//! Paths are split on `.` and resolved with backtracking: at every level the
//! longest compound key (`"a.b"` as one literal key) is tried before shorter
//! ones, so a literal dot-bearing key wins over an equivalently named nested
//! path. Array elements are addressed by their decimal index.

use serde_json::{Map, Value};

/// The wildcard path segment.
pub const WILDCARD: &str = "*";

fn segments(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

fn resolve<'a>(node: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    if segments.is_empty() {
        return Some(node);
    }
    for len in (1..=segments.len()).rev() {
        let key = segments[..len].join(".");
        if let Some(found) = child(node, &key).and_then(|next| resolve(next, &segments[len..])) {
            return Some(found);
        }
    }
    None
}

/// Borrow the value at `path`. The empty path addresses `data` itself.
#[must_use]
pub fn get_ref<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(data);
    }
    resolve(data, &segments(path))
}

/// Clone the value at `path`, or return `fallback` when nothing is there.
#[must_use]
pub fn get(data: &Value, path: &str, fallback: Value) -> Value {
    get_ref(data, path).cloned().unwrap_or(fallback)
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Existing keys are found with the same backtracking as [`get`]. A numeric
/// segment on an array replaces that element, or appends when it equals the
/// length (shorter gaps are filled with `null`). Returns `false` when the path
/// runs into an array with a non-numeric segment.
pub fn set(data: &mut Value, path: &str, value: Value) -> bool {
    set_segments(data, &segments(path), value)
}

fn set_segments(node: &mut Value, segments: &[&str], value: Value) -> bool {
    let Some((&first, rest)) = segments.split_first() else {
        *node = value;
        return true;
    };
    if rest.is_empty() {
        return insert_child(node, first, value);
    }

    let existing = (1..=segments.len()).rev().find(|&len| {
        let key = segments[..len].join(".");
        match child(node, &key) {
            Some(found) => len == segments.len() || found.is_object() || found.is_array(),
            None => false,
        }
    });
    if let Some(len) = existing {
        let key = segments[..len].join(".");
        if len == segments.len() {
            return insert_child(node, &key, value);
        }
        if let Some(next) = child_mut(node, &key) {
            return set_segments(next, &segments[len..], value);
        }
    }

    if !node.is_object() && !node.is_array() {
        *node = Value::Object(Map::new());
    }
    if !insert_child(node, first, Value::Object(Map::new())) {
        return false;
    }
    match child_mut(node, first) {
        Some(next) => set_segments(next, rest, value),
        None => false,
    }
}

fn insert_child(node: &mut Value, key: &str, value: Value) -> bool {
    if !node.is_object() && !node.is_array() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => {
            map.insert(key.to_owned(), value);
            true
        }
        Value::Array(items) => match key.parse::<usize>() {
            Ok(i) if i < items.len() => {
                items[i] = value;
                true
            }
            Ok(i) => {
                items.resize(i, Value::Null);
                items.push(value);
                true
            }
            Err(_) => false,
        },
        _ => false,
    }
}

/// Replace every `*`-bearing path in `spec` with one concrete path per element
/// found in `data` at the wildcard's position, preserving order.
///
/// Objects contribute their keys, arrays their indices; further wildcards in
/// the remainder of the path are expanded recursively. An empty container
/// contributes nothing. A wildcard whose prefix does not address a container
/// is kept verbatim, so the field still gets validated (against `null`).
#[must_use]
pub fn expand_wildcards<V: Clone>(spec: &[(String, V)], data: &Value) -> Vec<(String, V)> {
    let mut out = Vec::with_capacity(spec.len());
    for (path, item) in spec {
        let mut paths = Vec::new();
        expand(data, Vec::new(), &segments(path), &mut paths);
        out.extend(paths.into_iter().map(|p| (p, item.clone())));
    }
    out
}

fn expand(data: &Value, done: Vec<String>, rest: &[&str], out: &mut Vec<String>) {
    let join = |tail: &[&str]| {
        done.iter()
            .map(String::as_str)
            .chain(tail.iter().copied())
            .collect::<Vec<_>>()
            .join(".")
    };
    let Some(pos) = rest.iter().position(|s| *s == WILDCARD) else {
        out.push(join(rest));
        return;
    };

    let prefix = join(&rest[..pos]);
    let keys: Vec<String> = match get_ref(data, &prefix) {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        Some(Value::Array(items)) => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => {
            out.push(join(rest));
            return;
        }
    };

    let mut base = done.clone();
    base.extend(rest[..pos].iter().map(|s| (*s).to_owned()));
    for key in keys {
        let mut next = base.clone();
        next.push(key);
        expand(data, next, &rest[pos + 1..], out);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn get_nested() {
        let data = json!({"user": {"profile": {"age": 25}}});
        assert_eq!(get(&data, "user.profile.age", Value::Null), json!(25));
        assert_eq!(get(&data, "user.profile.name", json!("none")), json!("none"));
    }

    #[test]
    fn get_array_index() {
        let data = json!({"items": [{"name": "a"}, {"name": "b"}]});
        assert_eq!(get(&data, "items.1.name", Value::Null), json!("b"));
        assert_eq!(get(&data, "items.2.name", Value::Null), Value::Null);
        assert_eq!(get(&data, "items.x", Value::Null), Value::Null);
    }

    #[test]
    fn literal_compound_key_wins() {
        let data = json!({"a.b": 1, "a": {"b": 2}});
        assert_eq!(get(&data, "a.b", Value::Null), json!(1));
    }

    #[test]
    fn backtracks_when_compound_key_is_a_dead_end() {
        let data = json!({"a.b": {"x": 1}, "a": {"b": {"c": 3}}});
        assert_eq!(get(&data, "a.b.c", Value::Null), json!(3));
        assert_eq!(get(&data, "a.b.x", Value::Null), json!(1));
    }

    #[test]
    fn dotted_key_below_nested_container() {
        let data = json!({"config": {"db.host": "localhost"}});
        assert_eq!(get(&data, "config.db.host", Value::Null), json!("localhost"));
    }

    #[test]
    fn empty_path_is_root() {
        let data = json!(5);
        assert_eq!(get_ref(&data, ""), Some(&json!(5)));
    }

    #[test]
    fn set_creates_nested_objects() {
        let mut data = json!({});
        assert!(set(&mut data, "user.profile.age", json!(30)));
        assert_eq!(data, json!({"user": {"profile": {"age": 30}}}));
    }

    #[test]
    fn set_prefers_existing_compound_key() {
        let mut data = json!({"a.b": {"c": 1}});
        assert!(set(&mut data, "a.b.c", json!(2)));
        assert_eq!(data, json!({"a.b": {"c": 2}}));

        let mut data = json!({"a.b": 1});
        assert!(set(&mut data, "a.b", json!(9)));
        assert_eq!(data, json!({"a.b": 9}));
    }

    #[test]
    fn set_array_elements() {
        let mut data = json!({"items": [1, 2]});
        assert!(set(&mut data, "items.0", json!(10)));
        assert!(set(&mut data, "items.2", json!(3)));
        assert!(set(&mut data, "items.4", json!(5)));
        assert_eq!(data, json!({"items": [10, 2, 3, null, 5]}));
        assert!(!set(&mut data, "items.x", json!(0)));
    }

    #[test]
    fn set_replaces_scalar_on_the_way() {
        let mut data = json!({"a": 1});
        assert!(set(&mut data, "a.b", json!(2)));
        assert_eq!(data, json!({"a": {"b": 2}}));
    }

    #[test]
    fn expand_array_wildcard() {
        let spec = vec![("items.*.name".to_owned(), "$")];
        let data = json!({"items": [{"name": 1}, {"name": 2}]});
        assert_eq!(
            expand_wildcards(&spec, &data),
            vec![("items.0.name".to_owned(), "$"), ("items.1.name".to_owned(), "$")]
        );
    }

    #[test]
    fn expand_object_wildcard_preserves_key_order() {
        let spec = vec![("users.*.email".to_owned(), 1)];
        let data = json!({"users": {"zed": {}, "amy": {}, "bob": {}}});
        let paths: Vec<String> = expand_wildcards(&spec, &data)
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert_eq!(paths, ["users.zed.email", "users.amy.email", "users.bob.email"]);
    }

    #[test]
    fn expand_nested_wildcards() {
        let spec = vec![("groups.*.members.*".to_owned(), ())];
        let data = json!({"groups": [{"members": ["a", "b"]}, {"members": ["c"]}]});
        let paths: Vec<String> = expand_wildcards(&spec, &data)
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert_eq!(
            paths,
            ["groups.0.members.0", "groups.0.members.1", "groups.1.members.0"]
        );
    }

    #[test]
    fn expand_keeps_order_across_entries() {
        let spec = vec![
            ("name".to_owned(), 'a'),
            ("tags.*".to_owned(), 'b'),
            ("age".to_owned(), 'c'),
        ];
        let data = json!({"tags": ["x", "y"]});
        let expanded = expand_wildcards(&spec, &data);
        let labels: Vec<(&str, char)> = expanded.iter().map(|(p, v)| (p.as_str(), *v)).collect();
        assert_eq!(
            labels,
            [("name", 'a'), ("tags.0", 'b'), ("tags.1", 'b'), ("age", 'c')]
        );
    }

    #[test]
    fn expand_empty_container_yields_nothing() {
        let spec = vec![("items.*.name".to_owned(), ())];
        assert!(expand_wildcards(&spec, &json!({"items": []})).is_empty());
    }

    #[test]
    fn expand_missing_container_keeps_wildcard() {
        let spec = vec![("items.*.name".to_owned(), ())];
        let expanded = expand_wildcards(&spec, &json!({}));
        assert_eq!(expanded, vec![("items.*.name".to_owned(), ())]);
    }

    #[test]
    fn expand_literal_star_key_does_not_loop() {
        let spec = vec![("a.*".to_owned(), ())];
        let data = json!({"a": {"*": 1, "b": 2}});
        let paths: Vec<String> = expand_wildcards(&spec, &data)
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert_eq!(paths, ["a.*", "a.b"]);
    }
}
