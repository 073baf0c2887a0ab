//! URL encoding of descriptor field values.
//!
//! Field values reach the encoder as [`serde_json::Value`]s, so the set of
//! shapes is closed: strings, numbers and booleans are scalars, arrays are
//! sequences, and objects are rejected. Dates should be declared with a
//! type that serializes to `yyyy-MM-dd`, such as chrono's `NaiveDate`.

use crate::{Error, Result};
use serde_json::Value;

/// Encodes a field value as the text written into a path or query string.
///
/// Sequences are encoded element by element and joined with `,`. `field`
/// names the descriptor field in the error if the value is not encodable.
///
/// # Errors
///
/// Returns [`Error::UnsupportedValue`] for objects, and for `null` anywhere
/// inside a sequence.
///
/// # Examples
///
/// ```
/// use restmap::encode::encode;
/// use serde_json::json;
///
/// assert_eq!(encode("Count", &json!(25)).unwrap(), "25");
/// assert_eq!(encode("Ids", &json!([1, 2, 3])).unwrap(), "1,2,3");
/// assert!(encode("Filter", &json!({"a": 1})).is_err());
/// ```
pub fn encode(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(items) => {
            let parts = items
                .iter()
                .map(|item| encode(field, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(parts.join(","))
        }
        Value::Null | Value::Object(_) => Err(Error::UnsupportedValue {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(encode("Name", &json!("Potent Potables")).unwrap(), "Potent Potables");
        assert_eq!(encode("Value", &json!(400)).unwrap(), "400");
        assert_eq!(encode("Ratio", &json!(0.5)).unwrap(), "0.5");
        assert_eq!(encode("Daily", &json!(true)).unwrap(), "true");
    }

    #[test]
    fn test_date_is_iso() {
        let date = NaiveDate::from_ymd_opt(1996, 9, 30).unwrap();
        let value = serde_json::to_value(date).unwrap();
        assert_eq!(encode("MinDate", &value).unwrap(), "1996-09-30");
    }

    #[test]
    fn test_sequences() {
        assert_eq!(encode("Ids", &json!([1, 2, 3])).unwrap(), "1,2,3");
        assert_eq!(encode("Tags", &json!(["a", "b"])).unwrap(), "a,b");
        assert_eq!(encode("Nested", &json!([[1, 2], 3])).unwrap(), "1,2,3");
        assert_eq!(encode("Empty", &json!([])).unwrap(), "");
    }

    #[test]
    fn test_unsupported() {
        match encode("Filter", &json!({"min": 1})) {
            Err(Error::UnsupportedValue { field, value }) => {
                assert_eq!(field, "Filter");
                assert_eq!(value, r#"{"min":1}"#);
            }
            other => panic!("Expected UnsupportedValue, got {:?}", other),
        }

        assert!(matches!(
            encode("Ids", &json!([1, null])),
            Err(Error::UnsupportedValue { .. })
        ));
        assert!(matches!(
            encode("Ids", &json!([1, {"x": 2}])),
            Err(Error::UnsupportedValue { .. })
        ));
    }
}
