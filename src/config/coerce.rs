//! Conversion of raw source values to the type implied by a schema leaf.

use crate::error::CoercionError;
use serde_json::{Number, Value};

/// Strings that count as `true` for a boolean leaf (compared lowercase).
const TRUTHY: &[&str] = &["on", "active", "yes", "y", "true", "t", "1"];

/// Convert `raw` to the type of `reference`.
///
/// | reference | raw                | result                                     |
/// |-----------|--------------------|--------------------------------------------|
/// | boolean   | boolean            | unchanged                                  |
/// | boolean   | number             | `raw != 0`                                 |
/// | boolean   | string             | lowercase value in the truthy set          |
/// | integer   | number/bool/string | numeric cast                               |
/// | float     | number/bool/string | numeric cast                               |
/// | string    | scalar             | stringified                                |
/// | string    | sequence/mapping   | compact JSON text, e.g. `["a"]`            |
/// | sequence  | sequence           | element-wise against the first element     |
/// | sequence  | string             | comma-split, then element-wise             |
///
/// An empty reference sequence has no element type: scalar elements are kept
/// as they are, nested values are rejected.
pub fn coerce(reference: &Value, raw: &Value) -> Result<Value, CoercionError> {
    match reference {
        Value::Bool(_) => to_bool(raw),
        Value::Number(n) if n.is_f64() => to_float(raw),
        Value::Number(_) => to_integer(raw),
        Value::String(_) => to_string(raw),
        Value::Array(items) => to_sequence(items.first(), raw),
        Value::Null | Value::Object(_) => Err(CoercionError::new(raw, "scalar leaf")),
    }
}

fn to_bool(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|v| v != 0.0))),
        Value::String(s) => {
            let lowered = s.to_lowercase();
            Ok(Value::Bool(TRUTHY.contains(&lowered.as_str())))
        }
        _ => Err(CoercionError::new(raw, "boolean")),
    }
}

fn to_integer(raw: &Value) -> Result<Value, CoercionError> {
    let fail = || CoercionError::new(raw, "integer");
    match raw {
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Ok(Value::Number(n.clone()))
            } else {
                // Floats truncate toward zero.
                let truncated = n.as_f64().map(f64::trunc).ok_or_else(fail)?;
                if truncated.is_finite()
                    && truncated >= i64::MIN as f64
                    && truncated <= i64::MAX as f64
                {
                    Ok(Value::from(truncated as i64))
                } else {
                    Err(fail())
                }
            }
        }
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(v) = trimmed.parse::<i64>() {
                Ok(Value::from(v))
            } else if let Ok(v) = trimmed.parse::<u64>() {
                Ok(Value::from(v))
            } else {
                Err(fail())
            }
        }
        _ => Err(fail()),
    }
}

fn to_float(raw: &Value) -> Result<Value, CoercionError> {
    let fail = || CoercionError::new(raw, "float");
    let value = match raw {
        Value::Number(n) => n.as_f64().ok_or_else(fail)?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| fail())?,
        _ => return Err(fail()),
    };
    // JSON numbers cannot hold NaN or infinities.
    Number::from_f64(value).map(Value::Number).ok_or_else(fail)
}

fn to_string(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Array(_) | Value::Object(_) => Ok(Value::String(raw.to_string())),
        Value::Null => Err(CoercionError::new(raw, "string")),
    }
}

fn to_sequence(element: Option<&Value>, raw: &Value) -> Result<Value, CoercionError> {
    let items: Vec<Value> = match raw {
        Value::Array(items) => items.clone(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        Value::String(s) => s
            .split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .collect(),
        _ => return Err(CoercionError::new(raw, "sequence")),
    };

    items
        .iter()
        .map(|item| match element {
            Some(reference) => coerce(reference, item),
            None => match item {
                Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(item.clone()),
                _ => Err(CoercionError::new(item, "scalar sequence element")),
            },
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool_from_bool_unchanged() {
        assert_eq!(coerce(&json!(true), &json!(false)).unwrap(), json!(false));
    }

    #[test]
    fn test_bool_from_strings() {
        assert_eq!(coerce(&json!(true), &json!("yes")).unwrap(), json!(true));
        assert_eq!(coerce(&json!(false), &json!("ON")).unwrap(), json!(true));
        assert_eq!(coerce(&json!(true), &json!("T")).unwrap(), json!(true));
        assert_eq!(coerce(&json!(true), &json!("maybe")).unwrap(), json!(false));
        assert_eq!(coerce(&json!(true), &json!("")).unwrap(), json!(false));
    }

    #[test]
    fn test_bool_from_numbers() {
        assert_eq!(coerce(&json!(true), &json!(0)).unwrap(), json!(false));
        assert_eq!(coerce(&json!(false), &json!(2)).unwrap(), json!(true));
        assert_eq!(coerce(&json!(false), &json!(0.5)).unwrap(), json!(true));
    }

    #[test]
    fn test_integer_casts() {
        assert_eq!(coerce(&json!(8010), &json!("9000")).unwrap(), json!(9000));
        assert_eq!(coerce(&json!(8010), &json!(" 42 ")).unwrap(), json!(42));
        assert_eq!(coerce(&json!(8010), &json!(3.9)).unwrap(), json!(3));
        assert_eq!(coerce(&json!(8010), &json!(true)).unwrap(), json!(1));
        assert!(coerce(&json!(8010), &json!("eighty")).is_err());
        assert!(coerce(&json!(8010), &json!("3.5")).is_err());
        assert!(coerce(&json!(8010), &json!([1])).is_err());
    }

    #[test]
    fn test_float_casts() {
        assert_eq!(coerce(&json!(1.5), &json!("2.25")).unwrap(), json!(2.25));
        assert_eq!(coerce(&json!(1.5), &json!(3)).unwrap(), json!(3.0));
        assert!(coerce(&json!(1.5), &json!("fast")).is_err());
        assert!(coerce(&json!(1.5), &json!("NaN")).is_err());
    }

    #[test]
    fn test_string_stringifies() {
        assert_eq!(coerce(&json!(""), &json!(8010)).unwrap(), json!("8010"));
        assert_eq!(coerce(&json!(""), &json!(true)).unwrap(), json!("true"));
        assert_eq!(coerce(&json!("x"), &json!("")).unwrap(), json!(""));
        assert!(coerce(&json!(""), &Value::Null).is_err());
    }

    #[test]
    fn test_string_from_collections_is_json_text() {
        assert_eq!(coerce(&json!(""), &json!(["a"])).unwrap(), json!(r#"["a"]"#));
        assert_eq!(coerce(&json!(""), &json!({"k": 1})).unwrap(), json!(r#"{"k":1}"#));
    }

    #[test]
    fn test_sequence_elementwise() {
        assert_eq!(
            coerce(&json!([0]), &json!(["1", 2, "3"])).unwrap(),
            json!([1, 2, 3])
        );
        assert_eq!(
            coerce(&json!(["a"]), &json!("x, y")).unwrap(),
            json!(["x", "y"])
        );
        assert_eq!(coerce(&json!(["a"]), &json!("")).unwrap(), json!([]));
        assert!(coerce(&json!([0]), &json!(["one"])).is_err());
        assert!(coerce(&json!([0]), &json!(5)).is_err());
    }

    #[test]
    fn test_empty_reference_sequence_passes_scalars() {
        assert_eq!(
            coerce(&json!([]), &json!([1, "two", true])).unwrap(),
            json!([1, "two", true])
        );
        assert!(coerce(&json!([]), &json!([[1]])).is_err());
        assert!(coerce(&json!([]), &json!([null])).is_err());
    }

    #[test]
    fn test_mapping_reference_rejected() {
        assert!(coerce(&json!({}), &json!("x")).is_err());
    }

    #[test]
    fn test_coerce_is_idempotent() {
        let cases = [
            (json!(true), json!("yes")),
            (json!(true), json!(0)),
            (json!(true), json!("maybe")),
            (json!(8010), json!("9000")),
            (json!(8010), json!(7.7)),
            (json!(1.5), json!("2")),
            (json!(""), json!(12)),
            (json!(""), json!(false)),
            (json!([0]), json!("1,2")),
            (json!(["s"]), json!([1, true])),
            (json!([]), json!(["a", 1])),
        ];
        for (reference, raw) in cases {
            let once = coerce(&reference, &raw).unwrap();
            let twice = coerce(&reference, &once).unwrap();
            assert_eq!(once, twice, "not idempotent for {reference} <- {raw}");
        }
    }
}
