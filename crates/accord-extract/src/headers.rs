//! Request headers as a JSON object.

use http::HeaderMap;
use serde_json::{Map, Value};

/// Converts request headers into the object a headers schema sees.
///
/// Names are lowercase. A header that appears more than once is joined with
/// `", "`, unless `is_array` reports the name as an array field, in which
/// case its values are kept apart. Values that are not visible ASCII are
/// skipped.
pub fn headers_to_value<F>(headers: &HeaderMap, is_array: F) -> Value
where
    F: Fn(&str) -> bool,
{
    let mut out = Map::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        if values.is_empty() {
            continue;
        }

        let key = name.as_str();
        let value = if is_array(key) {
            Value::Array(values.into_iter().map(|v| Value::String(v.to_string())).collect())
        } else {
            Value::String(values.join(", "))
        };
        out.insert(key.to_string(), value);
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer t"));
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));
        headers
    }

    #[test]
    fn test_repeated_headers_join() {
        assert_eq!(
            headers_to_value(&headers(), |_| false),
            json!({"authorization": "Bearer t", "x-tag": "a, b"})
        );
    }

    #[test]
    fn test_array_headers_stay_apart() {
        assert_eq!(
            headers_to_value(&headers(), |name| name == "x-tag"),
            json!({"authorization": "Bearer t", "x-tag": ["a", "b"]})
        );
    }

    #[test]
    fn test_opaque_values_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-bin", HeaderValue::from_bytes(&[0xfa]).unwrap());
        assert_eq!(headers_to_value(&headers, |_| false), json!({}));
    }
}
