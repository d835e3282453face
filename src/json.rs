//! Conversion between plist values and JSON trees.
//!
//! JSON has no binary type, so `<data>` blobs cross this boundary as strings
//! carrying the [`DATA_PREFIX`] marker followed by their base64 text.

use base64::{engine::general_purpose::STANDARD as base64_standard, Engine};
use plist::{Dictionary, Value};
use serde_json::{Map, Number, Value as JsonValue};

/// Marks a JSON string as a base64-encoded `<data>` blob.
pub const DATA_PREFIX: &str = "DATA:";

/// Convert a plist value into its JSON form.
///
/// Dictionaries keep their key order. Reals that JSON cannot represent
/// (NaN, infinities) and plist-only types become `null`.
pub fn plist_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Dictionary(dict) => JsonValue::Object(
            dict.iter().map(|(key, value)| (key.clone(), plist_to_json(value))).collect(),
        ),
        Value::Array(items) => JsonValue::Array(items.iter().map(plist_to_json).collect()),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Integer(int) => match (int.as_signed(), int.as_unsigned()) {
            (Some(signed), _) => JsonValue::Number(signed.into()),
            (None, Some(unsigned)) => JsonValue::Number(unsigned.into()),
            (None, None) => JsonValue::Null,
        },
        Value::Real(real) => Number::from_f64(*real).map(JsonValue::Number).unwrap_or_default(),
        Value::Data(bytes) => {
            JsonValue::String(format!("{DATA_PREFIX}{}", base64_standard.encode(bytes)))
        }
        _other => JsonValue::Null,
    }
}

/// Convert a JSON tree into a plist value.
///
/// Returns `None` for `null`; `null` members of objects and arrays are
/// dropped. Integral numbers become `<integer>`, all others `<real>`.
pub fn json_to_plist(value: &JsonValue) -> Option<Value> {
    let value = match value {
        JsonValue::Null => return None,
        JsonValue::Object(map) => Value::Dictionary(json_object_to_dictionary(map)),
        JsonValue::Array(items) => Value::Array(items.iter().filter_map(json_to_plist).collect()),
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(signed) = n.as_i64() {
                Value::Integer(signed.into())
            } else if let Some(unsigned) = n.as_u64() {
                Value::Integer(unsigned.into())
            } else {
                Value::Real(n.as_f64()?)
            }
        }
        JsonValue::String(s) => match s.strip_prefix(DATA_PREFIX) {
            Some(encoded) => match base64_standard.decode(encoded.trim()) {
                Ok(bytes) => Value::Data(bytes),
                Err(e) => {
                    log::warn!("'{DATA_PREFIX}' string is not valid base64 ({e}), writing it as text");
                    Value::String(s.clone())
                }
            },
            None => Value::String(s.clone()),
        },
    };
    Some(value)
}

/// Convert a JSON object into a plist dictionary, dropping `null` members.
pub fn json_object_to_dictionary(map: &Map<String, JsonValue>) -> Dictionary {
    let mut dict = Dictionary::new();
    for (key, value) in map {
        if let Some(value) = json_to_plist(value) {
            dict.insert(key.clone(), value);
        }
    }
    dict
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn data_uses_the_marker() {
        let value = Value::Data(b"hello".to_vec());
        assert_eq!(plist_to_json(&value), json!("DATA:aGVsbG8="));
        assert_eq!(json_to_plist(&json!("DATA:aGVsbG8=")), Some(value));
    }

    #[test]
    fn integers_and_reals_stay_distinct() {
        assert_eq!(json_to_plist(&json!(3)), Some(Value::Integer(3.into())));
        assert_eq!(json_to_plist(&json!(3.0)), Some(Value::Real(3.0)));
        assert_eq!(plist_to_json(&Value::Integer(u64::MAX.into())), json!(u64::MAX));
        assert_eq!(plist_to_json(&Value::Real(f64::NAN)), JsonValue::Null);
    }

    #[test]
    fn object_order_and_nulls() {
        let tree = json!({"b": 1, "a": null, "c": [true, null, "x"]});
        let plist = json_to_plist(&tree).unwrap();
        let dict = plist.as_dictionary().unwrap();
        let keys: Vec<_> = dict.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c"]);
        assert_eq!(plist_to_json(&plist), json!({"b": 1, "c": [true, "x"]}));
    }

    #[test]
    fn bad_data_payload_is_kept_as_text() {
        assert_eq!(
            json_to_plist(&json!("DATA:not base64!")),
            Some(Value::String("DATA:not base64!".into()))
        );
    }
}
