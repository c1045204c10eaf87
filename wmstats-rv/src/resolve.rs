//! Nested attribute lookup with default fallback
//!
//! A path such as `status.submitted.running` is walked one segment at a
//! time. Walking stops at the first segment whose value is absent or falsy,
//! and the caller's default is returned instead. A present `0` therefore
//! reads the same as a missing field, including when it sits on an
//! intermediate node.

use serde_json::Value;
use tracing::debug;

use crate::merge::Record;

/// Presence test used at every step of a path walk
///
/// Falsy values: `null`, `false`, numeric zero (and NaN), the empty string.
/// Objects and arrays are always truthy, even when empty.
///
/// Zero counts are indistinguishable from missing ones under this rule.
/// Treating `0` as present means changing the `Value::Number` arm only.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Step from `value` into its child named `segment`
///
/// Arrays accept non-negative integer segments. Scalars have no children.
fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Resolve a dot-separated `path` against `record`, returning `default`
/// when any segment is absent or falsy.
pub fn resolve<'a>(record: &'a Record, path: &str, default: &'a Value) -> &'a Value {
    let mut segments = path.split('.');

    let mut current = match segments.next().and_then(|first| record.get(first)) {
        Some(value) if is_truthy(value) => value,
        _ => return default,
    };

    for segment in segments {
        current = match child(current, segment) {
            Some(value) if is_truthy(value) => value,
            _ => return default,
        };
    }

    current
}

/// Resolve `path` as a number
///
/// A truthy value that is not a JSON number (string, object, array, `true`)
/// also yields `default`.
pub fn resolve_number(record: &Record, path: &str, default: f64) -> f64 {
    match resolve(record, path, &Value::Null) {
        Value::Null => default,
        Value::Number(n) => n.as_f64().unwrap_or(default),
        other => {
            debug!(path = %path, value = %other, "Non-numeric operand, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("test record must be an object, got {}", other),
        }
    }

    #[test]
    fn test_truthiness_table() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!(-0.0)));
        assert!(!is_truthy(&json!("")));

        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!(0.5)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_resolves_nested_value() {
        let r = record(json!({"status": {"submitted": {"running": 7}}}));
        assert_eq!(resolve(&r, "status.submitted.running", &json!(0)), &json!(7));
    }

    #[test]
    fn test_missing_segment_returns_default() {
        let r = record(json!({"status": {"submitted": {}}}));
        assert_eq!(resolve(&r, "status.submitted.running", &json!(0)), &json!(0));
        assert_eq!(resolve(&r, "status.queued.first", &json!(0)), &json!(0));
        assert_eq!(resolve(&r, "nothing", &json!("d")), &json!("d"));
    }

    #[test]
    fn test_null_and_zero_leaf_return_default() {
        let r = record(json!({"a": {"null": null, "zero": 0, "empty": ""}}));
        assert_eq!(resolve(&r, "a.null", &json!(9)), &json!(9));
        assert_eq!(resolve(&r, "a.zero", &json!(9)), &json!(9));
        assert_eq!(resolve(&r, "a.empty", &json!(9)), &json!(9));
    }

    #[test]
    fn test_zero_intermediate_hides_deeper_value() {
        // `status` is 0 here, so nothing below it can be reached
        let r = record(json!({"status": 0, "other": {"status": {"x": 3}}}));
        assert_eq!(resolve(&r, "status.x", &json!(1)), &json!(1));

        let r = record(json!({"a": {"b": false}}));
        assert_eq!(resolve(&r, "a.b.c", &json!("fallback")), &json!("fallback"));
    }

    #[test]
    fn test_stepping_into_scalar_returns_default() {
        let r = record(json!({"status": {"queued": 5}}));
        assert_eq!(resolve(&r, "status.queued.first", &json!(0)), &json!(0));
    }

    #[test]
    fn test_array_index_segment() {
        let r = record(json!({"sites": ["T1_US_FNAL", "T2_CH_CERN"]}));
        assert_eq!(resolve(&r, "sites.1", &json!(null)), &json!("T2_CH_CERN"));
        assert_eq!(resolve(&r, "sites.5", &json!(null)), &json!(null));
        assert_eq!(resolve(&r, "sites.first", &json!(null)), &json!(null));
    }

    #[test]
    fn test_returns_non_scalar_leaf() {
        let r = record(json!({"status": {"queued": {"first": 1}}}));
        assert_eq!(
            resolve(&r, "status.queued", &json!(null)),
            &json!({"first": 1})
        );
    }

    #[test]
    fn test_resolve_number() {
        let r = record(json!({
            "total_jobs": 40,
            "ratio": 0.25,
            "label": "many",
            "nested": {"n": {"deep": 3}}
        }));
        assert_eq!(resolve_number(&r, "total_jobs", 1.0), 40.0);
        assert_eq!(resolve_number(&r, "ratio", 0.0), 0.25);
        assert_eq!(resolve_number(&r, "label", 0.0), 0.0);
        assert_eq!(resolve_number(&r, "nested.n", 1.0), 1.0);
        assert_eq!(resolve_number(&r, "missing", 1.0), 1.0);
    }
}
