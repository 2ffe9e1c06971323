// =============================================================================
// Scalar Coercion — reduce a messy wire cell to a single number
// =============================================================================
//
// Upstream data sources occasionally hand back a value where a scalar was
// expected: a one-element array, a stringified number, or an explicit null.
// `coerce_scalar` reduces any such cell to a single finite f64 or an explicit
// "missing" (`None`).  It must never panic, whatever the input shape.

use serde_json::Value;

/// Coerce an arbitrary JSON cell down to a single finite number.
///
/// Rules:
/// - `null` => `None`
/// - arrays => take the **last** element (the most recent value) and recurse;
///   an empty array is missing
/// - numbers => the number; strings => parsed number; booleans => 1.0 / 0.0
/// - objects, unparseable strings, and non-finite results => `None`
pub fn coerce_scalar(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Array(items) => items.last().and_then(coerce_scalar),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_missing() {
        assert_eq!(coerce_scalar(&Value::Null), None);
    }

    #[test]
    fn plain_number_passes_through() {
        assert_eq!(coerce_scalar(&json!(42.5)), Some(42.5));
        assert_eq!(coerce_scalar(&json!(-3)), Some(-3.0));
    }

    #[test]
    fn numeric_string_parses() {
        assert_eq!(coerce_scalar(&json!("101.25")), Some(101.25));
        assert_eq!(coerce_scalar(&json!("  7 ")), Some(7.0));
    }

    #[test]
    fn garbage_string_is_missing() {
        assert_eq!(coerce_scalar(&json!("not a number")), None);
        assert_eq!(coerce_scalar(&json!("NaN")), None);
    }

    #[test]
    fn one_element_array_yields_that_element() {
        assert_eq!(coerce_scalar(&json!([3.5])), Some(3.5));
    }

    #[test]
    fn multi_element_array_yields_last() {
        // "Last" is the most recent value in our time-ordered cells.
        assert_eq!(coerce_scalar(&json!([1.0, 2.0, 3.0])), Some(3.0));
    }

    #[test]
    fn empty_array_is_missing() {
        assert_eq!(coerce_scalar(&json!([])), None);
    }

    #[test]
    fn nested_array_recurses() {
        assert_eq!(coerce_scalar(&json!([[1.0, 2.0], [4.0, "5.5"]])), Some(5.5));
    }

    #[test]
    fn array_ending_in_null_is_missing() {
        assert_eq!(coerce_scalar(&json!([1.0, null])), None);
    }

    #[test]
    fn object_is_missing() {
        assert_eq!(coerce_scalar(&json!({"close": 10.0})), None);
    }

    #[test]
    fn booleans_coerce_numerically() {
        assert_eq!(coerce_scalar(&json!(true)), Some(1.0));
        assert_eq!(coerce_scalar(&json!(false)), Some(0.0));
    }
}
