//! Runtime parameters supplied with completions and triggers.
//!
//! Parameters are a JSON object. Conditions read them by key; an absent
//! parameter map is distinct from an empty one only in that callers may pass
//! `None` where no parameters exist.

use serde_json::Value;

/// Parameters passed to condition evaluation
pub type Params = serde_json::Map<String, Value>;

/// Integer view of `params[key]`.
///
/// Numbers are truncated toward zero; strings are parsed as a signed 64-bit
/// integer. Anything else, an unparsable string, a number outside the `i64`
/// range, or a missing key yields `None`.
pub fn param_as_i64(params: Option<&Params>, key: &str) -> Option<i64> {
    match params?.get(key)? {
        Value::Number(n) if n.is_f64() => n.as_f64().and_then(truncate),
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

// `i64::MAX as f64` rounds up to 2^63, hence the strict upper bound.
fn truncate(f: f64) -> Option<i64> {
    let t = f.trunc();
    (t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

/// Raw value of `params[key]`, if the key is present.
pub fn param_value<'a>(params: Option<&'a Params>, key: &str) -> Option<&'a Value> {
    params?.get(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_integer_views() {
        let p = params(json!({
            "int": 99999,
            "float": 12.9,
            "negative_float": -3.7,
            "text": "42",
            "bad_text": "4x",
            "flag": true,
            "nothing": null,
        }));

        assert_eq!(param_as_i64(Some(&p), "int"), Some(99999));
        assert_eq!(param_as_i64(Some(&p), "float"), Some(12));
        assert_eq!(param_as_i64(Some(&p), "negative_float"), Some(-3));
        assert_eq!(param_as_i64(Some(&p), "text"), Some(42));
        assert_eq!(param_as_i64(Some(&p), "bad_text"), None);
        assert_eq!(param_as_i64(Some(&p), "flag"), None);
        assert_eq!(param_as_i64(Some(&p), "nothing"), None);
        assert_eq!(param_as_i64(Some(&p), "missing"), None);
        assert_eq!(param_as_i64(None, "int"), None);
    }

    #[test]
    fn test_out_of_range_numbers_are_rejected() {
        let p = params(json!({
            "u64_max": u64::MAX,
            "just_above": (i64::MAX as u64) + 1,
            "i64_max": i64::MAX,
            "huge_float": 1e300,
            "tiny_float": -1e300,
        }));

        assert_eq!(param_as_i64(Some(&p), "u64_max"), None);
        assert_eq!(param_as_i64(Some(&p), "just_above"), None);
        assert_eq!(param_as_i64(Some(&p), "i64_max"), Some(i64::MAX));
        assert_eq!(param_as_i64(Some(&p), "huge_float"), None);
        assert_eq!(param_as_i64(Some(&p), "tiny_float"), None);
    }

    #[test]
    fn test_param_value_presence() {
        let p = params(json!({ "var": null }));
        assert_eq!(param_value(Some(&p), "var"), Some(&Value::Null));
        assert_eq!(param_value(Some(&p), "other"), None);
        assert_eq!(param_value(None, "var"), None);
    }
}
