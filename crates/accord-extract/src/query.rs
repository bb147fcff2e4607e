//! Query string decoding and encoding.
//!
//! Two modes are supported, and both sides of a contract must agree on the
//! mode in use:
//!
//! - [`QueryMode::Standard`]: conventional `key=value` pairs. Arrays repeat
//!   the key, nested objects use `key[sub]=value`, `null` is omitted. When
//!   decoding, the first value of a key wins unless the schema declares the
//!   key as an array field, in which case every value is collected.
//! - [`QueryMode::Json`]: one JSON text per key. Strings are sent raw unless
//!   they would themselves parse as JSON, in which case they are quoted, so
//!   decoding always gives back the same value.
//!
//! ```
//! use accord_extract::query::{decode_query, encode_query, QueryMode};
//! use serde_json::json;
//!
//! let value = json!({"take": 5, "filter": {"published": true}, "q": "7"});
//! let encoded = encode_query(&value, QueryMode::Json);
//! let decoded = decode_query(Some(&encoded), QueryMode::Json, |_| false);
//! assert_eq!(decoded, value);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How query values are represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Conventional `key=value` pairs.
    #[default]
    Standard,
    /// One JSON text per key.
    Json,
}

/// Splits a raw query string into decoded pairs.
///
/// Malformed input decodes to no pairs rather than failing; the schema then
/// reports whatever is missing.
#[must_use]
pub fn query_pairs(raw: &str) -> Vec<(String, String)> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    serde_urlencoded::from_str::<Vec<(String, String)>>(raw).unwrap_or_else(|error| {
        tracing::debug!(%error, "ignoring malformed query string");
        Vec::new()
    })
}

/// Decodes a query string into a JSON object.
///
/// `is_array` reports whether a top-level key expects an array; see
/// [`SchemaValidator::is_array_field`](accord_core::SchemaValidator::is_array_field).
pub fn decode_query<F>(raw: Option<&str>, mode: QueryMode, is_array: F) -> Value
where
    F: Fn(&str) -> bool,
{
    let pairs = raw.map(query_pairs).unwrap_or_default();
    let map = match mode {
        QueryMode::Standard => decode_standard(pairs, &is_array),
        QueryMode::Json => decode_json(pairs, &is_array),
    };
    Value::Object(map)
}

fn decode_standard(pairs: Vec<(String, String)>, is_array: &dyn Fn(&str) -> bool) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in pairs {
        let (base, path) = split_brackets(&key);
        let value = Value::String(value);

        if path.is_empty() {
            if is_array(base) {
                push_value(&mut out, base, value);
            } else if !out.contains_key(base) {
                out.insert(base.to_string(), value);
            }
            continue;
        }

        let mut path = path;
        let append = path.last() == Some(&"");
        if append {
            path.pop();
        }
        let Some((last, parents)) = path.split_last() else {
            push_value(&mut out, base, value);
            continue;
        };

        let mut target = out
            .entry(base.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let mut blocked = false;
        for segment in parents {
            let Value::Object(map) = target else {
                blocked = true;
                break;
            };
            target = map
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if blocked {
            continue;
        }
        if let Value::Object(map) = target {
            if append {
                push_value(map, last, value);
            } else {
                map.entry((*last).to_string()).or_insert(value);
            }
        }
    }
    out
}

fn decode_json(pairs: Vec<(String, String)>, is_array: &dyn Fn(&str) -> bool) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, raw) in pairs {
        let value = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
        if is_array(&key) {
            match out.get_mut(&key) {
                Some(Value::Array(items)) => items.push(value),
                Some(_) => {}
                None => {
                    let items = match value {
                        Value::Array(items) => items,
                        other => vec![other],
                    };
                    out.insert(key, Value::Array(items));
                }
            }
        } else if !out.contains_key(&key) {
            out.insert(key, value);
        }
    }
    out
}

fn push_value(map: &mut Map<String, Value>, key: &str, value: Value) {
    match map.get_mut(key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key.to_string(), Value::Array(vec![value]));
        }
    }
}

/// Splits `a[b][c]` into `("a", ["b", "c"])`. Keys that are not well formed
/// bracket paths are returned whole.
fn split_brackets(key: &str) -> (&str, Vec<&str>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    if open == 0 || !key.ends_with(']') {
        return (key, Vec::new());
    }

    let base = &key[..open];
    let mut segments = Vec::new();
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return (key, Vec::new());
        };
        segments.push(&stripped[..close]);
        rest = &stripped[close + 1..];
    }
    if rest.is_empty() {
        (base, segments)
    } else {
        (key, Vec::new())
    }
}

/// Encodes a JSON object as a query string, without a leading `?`.
///
/// Non-object values encode to an empty string.
#[must_use]
pub fn encode_query(value: &Value, mode: QueryMode) -> String {
    let Value::Object(map) = value else {
        return String::new();
    };

    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in map {
        match mode {
            QueryMode::Standard => flatten_standard(key.clone(), value, &mut pairs),
            QueryMode::Json => pairs.push((key.clone(), json_query_value(value))),
        }
    }

    serde_urlencoded::to_string(&pairs).unwrap_or_default()
}

/// The text sent for one key in JSON query mode.
#[must_use]
pub fn json_query_value(value: &Value) -> String {
    match value {
        Value::String(s) if serde_json::from_str::<Value>(s).is_err() => s.clone(),
        other => other.to_string(),
    }
}

fn flatten_standard(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Bool(_) | Value::Number(_) => pairs.push((key, value.to_string())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        flatten_standard(format!("{key}[{index}]"), item, pairs);
                    }
                    scalar => flatten_standard(key.clone(), scalar, pairs),
                }
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten_standard(format!("{key}[{sub}]"), item, pairs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn standard(raw: &str, arrays: &[&str]) -> Value {
        decode_query(Some(raw), QueryMode::Standard, |key| {
            arrays.iter().any(|array| *array == key)
        })
    }

    #[test]
    fn test_first_value_wins() {
        assert_eq!(standard("take=1&take=2", &[]), json!({"take": "1"}));
    }

    #[test]
    fn test_array_fields_collect() {
        assert_eq!(
            standard("tag=a&tag=b&q=x", &["tag"]),
            json!({"tag": ["a", "b"], "q": "x"})
        );
        assert_eq!(standard("tag=a", &["tag"]), json!({"tag": ["a"]}));
    }

    #[test]
    fn test_bracket_paths() {
        assert_eq!(
            standard("filter%5Bstatus%5D=draft&filter[author][id]=7&ids[]=1&ids[]=2", &[]),
            json!({
                "filter": {"status": "draft", "author": {"id": "7"}},
                "ids": ["1", "2"]
            })
        );
    }

    #[test]
    fn test_malformed_brackets_kept_whole() {
        assert_eq!(standard("a[b=1&[x]=2", &[]), json!({"a[b": "1", "[x]": "2"}));
    }

    #[test]
    fn test_missing_query_is_empty_object() {
        assert_eq!(decode_query(None, QueryMode::Standard, |_| false), json!({}));
        assert_eq!(standard("", &[]), json!({}));
    }

    #[test]
    fn test_json_mode_parses_values() {
        let decoded = decode_query(
            Some("take=5&published=true&q=hello&filter=%7B%22a%22%3A1%7D"),
            QueryMode::Json,
            |_| false,
        );
        assert_eq!(
            decoded,
            json!({"take": 5, "published": true, "q": "hello", "filter": {"a": 1}})
        );
    }

    #[test]
    fn test_json_mode_array_fields() {
        let single = decode_query(Some("ids=%5B1%2C2%5D"), QueryMode::Json, |k| k == "ids");
        assert_eq!(single, json!({"ids": [1, 2]}));

        let repeated = decode_query(Some("ids=1&ids=2"), QueryMode::Json, |k| k == "ids");
        assert_eq!(repeated, json!({"ids": [1, 2]}));
    }

    #[test]
    fn test_json_mode_quotes_ambiguous_strings() {
        assert_eq!(json_query_value(&json!("hello")), "hello");
        assert_eq!(json_query_value(&json!("5")), "\"5\"");
        assert_eq!(json_query_value(&json!("true")), "\"true\"");
        assert_eq!(json_query_value(&json!(5)), "5");
        assert_eq!(json_query_value(&json!(null)), "null");
    }

    #[test]
    fn test_standard_encoding() {
        let encoded = encode_query(
            &json!({"take": 5, "tags": ["a", "b"], "filter": {"x": true}, "skip": null}),
            QueryMode::Standard,
        );
        assert_eq!(encoded, "filter%5Bx%5D=true&tags=a&tags=b&take=5");
    }

    #[test]
    fn test_standard_round_trip_with_array_schema() {
        let value = json!({"q": "rust lang", "tags": ["a", "b"]});
        let encoded = encode_query(&value, QueryMode::Standard);
        assert_eq!(standard(&encoded, &["tags"]), value);
    }

    proptest::proptest! {
        #[test]
        fn prop_json_mode_strings_round_trip(s in ".*") {
            let value = json!({"s": s});
            let encoded = encode_query(&value, QueryMode::Json);
            let decoded = decode_query(Some(&encoded), QueryMode::Json, |_| false);
            proptest::prop_assert_eq!(decoded, value);
        }
    }
}
