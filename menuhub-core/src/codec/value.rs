//! Typed field values in the document store's wire format.
//!
//! Every field on the wire is an object carrying exactly one type tag:
//!
//! ```text
//! { "stringValue": "Drinks" }
//! { "integerValue": "42" }
//! { "doubleValue": 4.5 }
//! { "mapValue": { "fields": { ... } } }
//! { "arrayValue": { "values": [ ... ] } }
//! ```
//!
//! [`Value`] is the in-memory side of that mapping. Writers pick the
//! variant explicitly, so an integer price is never mistaken for a double.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value as Json};
use thiserror::Error;

/// Plain record fields keyed by name.
pub type Fields = BTreeMap<String, Value>;

/// Fields in wire form, as sent to and received from the store.
pub type WireFields = Map<String, Json>;

/// Errors produced when a wire value cannot be read.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Field value is not an object: {0}")]
    NotAnObject(String),

    #[error("Unrecognized value tag: {0}")]
    UnknownTag(String),

    #[error("Invalid {kind}: {raw}")]
    Invalid { kind: &'static str, raw: String },

    #[error("Nested arrays are not supported")]
    NestedArray,
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    /// ISO-8601 timestamp, kept verbatim.
    Timestamp(String),
    Map(Fields),
    Array(Vec<Value>),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    /// Timestamp value in RFC 3339 form with millisecond precision.
    pub fn timestamp(at: DateTime<Utc>) -> Self {
        Value::Timestamp(at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as a double; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Parses a timestamp value. String values are accepted too, since older
    /// documents stored dates as plain strings.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(s) | Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Wraps this value in its wire tag.
    pub fn to_wire(&self) -> Json {
        match self {
            Value::Null => json!({ "nullValue": null }),
            Value::String(s) => json!({ "stringValue": s }),
            Value::Integer(i) => json!({ "integerValue": i.to_string() }),
            Value::Double(d) => json!({ "doubleValue": d }),
            Value::Boolean(b) => json!({ "booleanValue": b }),
            Value::Timestamp(ts) => json!({ "timestampValue": ts }),
            Value::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
            Value::Array(values) => {
                let values: Vec<Json> = values.iter().map(Value::to_wire).collect();
                json!({ "arrayValue": { "values": values } })
            }
        }
    }

    /// Reads one wire value strictly.
    ///
    /// Nested maps and array elements are read leniently: a bad entry
    /// becomes [`Value::Null`] instead of failing the whole value.
    pub fn from_wire(raw: &Json) -> Result<Value, CodecError> {
        Self::parse(raw, true)
    }

    fn parse(raw: &Json, allow_array: bool) -> Result<Value, CodecError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| CodecError::NotAnObject(raw.to_string()))?;

        for (tag, inner) in obj {
            let value = match tag.as_str() {
                "nullValue" => Value::Null,
                "stringValue" => Value::String(
                    inner
                        .as_str()
                        .ok_or_else(|| invalid("string", inner))?
                        .to_string(),
                ),
                "integerValue" => Value::Integer(parse_integer(inner)?),
                "doubleValue" => Value::Double(parse_double(inner)?),
                "booleanValue" => {
                    Value::Boolean(inner.as_bool().ok_or_else(|| invalid("boolean", inner))?)
                }
                "timestampValue" => Value::Timestamp(
                    inner
                        .as_str()
                        .ok_or_else(|| invalid("timestamp", inner))?
                        .to_string(),
                ),
                "mapValue" => match inner.get("fields") {
                    Some(Json::Object(fields)) => Value::Map(decode_fields(fields)),
                    Some(Json::Null) | None => Value::Map(Fields::new()),
                    Some(other) => return Err(invalid("map", other)),
                },
                "arrayValue" => {
                    if !allow_array {
                        return Err(CodecError::NestedArray);
                    }
                    match inner.get("values") {
                        Some(Json::Array(values)) => {
                            Value::Array(values.iter().enumerate().map(decode_element).collect())
                        }
                        Some(Json::Null) | None => Value::Array(Vec::new()),
                        Some(other) => return Err(invalid("array", other)),
                    }
                }
                // Unknown keys are skipped so a known tag later in the
                // object still wins
                _ => continue,
            };
            return Ok(value);
        }

        let tags: Vec<&str> = obj.keys().map(String::as_str).collect();
        Err(CodecError::UnknownTag(if tags.is_empty() {
            "<none>".to_string()
        } else {
            tags.join(",")
        }))
    }
}

fn invalid(kind: &'static str, raw: &Json) -> CodecError {
    CodecError::Invalid {
        kind,
        raw: raw.to_string(),
    }
}

fn parse_integer(raw: &Json) -> Result<i64, CodecError> {
    match raw {
        Json::String(s) => s.trim().parse().map_err(|_| invalid("integer", raw)),
        Json::Number(n) => n.as_i64().ok_or_else(|| invalid("integer", raw)),
        _ => Err(invalid("integer", raw)),
    }
}

fn parse_double(raw: &Json) -> Result<f64, CodecError> {
    match raw {
        Json::Number(n) => n.as_f64().ok_or_else(|| invalid("double", raw)),
        Json::String(s) => s.trim().parse().map_err(|_| invalid("double", raw)),
        _ => Err(invalid("double", raw)),
    }
}

fn decode_element((index, raw): (usize, &Json)) -> Value {
    Value::parse(raw, false).unwrap_or_else(|e| {
        tracing::warn!(index, error = %e, "Could not decode array element, using null");
        Value::Null
    })
}

/// Decodes wire fields, substituting null for any field that fails to parse.
pub fn decode_fields(fields: &WireFields) -> Fields {
    fields
        .iter()
        .map(|(key, raw)| {
            let value = Value::from_wire(raw).unwrap_or_else(|e| {
                tracing::warn!(field = %key, error = %e, "Could not decode field, using null");
                Value::Null
            });
            (key.clone(), value)
        })
        .collect()
}

/// Wraps plain fields into wire form.
pub fn encode_fields(fields: &Fields) -> WireFields {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), value.to_wire()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_scalars() {
        assert_eq!(
            Value::from_wire(&json!({"stringValue": "Drinks"})).unwrap(),
            Value::string("Drinks")
        );
        assert_eq!(
            Value::from_wire(&json!({"integerValue": "42"})).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            Value::from_wire(&json!({"integerValue": 7})).unwrap(),
            Value::Integer(7)
        );
        assert_eq!(
            Value::from_wire(&json!({"doubleValue": 4.5})).unwrap(),
            Value::Double(4.5)
        );
        assert_eq!(
            Value::from_wire(&json!({"doubleValue": "2.25"})).unwrap(),
            Value::Double(2.25)
        );
        assert_eq!(
            Value::from_wire(&json!({"booleanValue": true})).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            Value::from_wire(&json!({"nullValue": null})).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_from_wire_rejects_bad_values() {
        assert!(matches!(
            Value::from_wire(&json!({"integerValue": "twelve"})),
            Err(CodecError::Invalid { kind: "integer", .. })
        ));
        assert!(matches!(
            Value::from_wire(&json!({"geoPointValue": {"latitude": 1.0}})),
            Err(CodecError::UnknownTag(_))
        ));
        assert!(matches!(
            Value::from_wire(&json!("bare")),
            Err(CodecError::NotAnObject(_))
        ));
    }

    #[test]
    fn test_map_recurses_leniently() {
        let raw = json!({"mapValue": {"fields": {
            "size": {"stringValue": "large"},
            "broken": {"integerValue": "x"},
        }}});

        let Value::Map(fields) = Value::from_wire(&raw).unwrap() else {
            panic!("expected map");
        };
        assert_eq!(fields["size"], Value::string("large"));
        assert_eq!(fields["broken"], Value::Null);
    }

    #[test]
    fn test_empty_map_and_array() {
        assert_eq!(
            Value::from_wire(&json!({"mapValue": {}})).unwrap(),
            Value::Map(Fields::new())
        );
        assert_eq!(
            Value::from_wire(&json!({"arrayValue": {}})).unwrap(),
            Value::Array(Vec::new())
        );
    }

    #[test]
    fn test_array_of_arrays_yields_null_element() {
        let raw = json!({"arrayValue": {"values": [
            {"stringValue": "salt"},
            {"arrayValue": {"values": [{"stringValue": "inner"}]}},
            {"mapValue": {"fields": {"qty": {"integerValue": "2"}}}},
        ]}});

        let Value::Array(values) = Value::from_wire(&raw).unwrap() else {
            panic!("expected array");
        };
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], Value::string("salt"));
        assert_eq!(values[1], Value::Null);
        assert!(matches!(&values[2], Value::Map(m) if m["qty"] == Value::Integer(2)));
    }

    #[test]
    fn test_to_wire_integer_is_decimal_string() {
        assert_eq!(
            Value::Integer(-3).to_wire(),
            json!({"integerValue": "-3"})
        );
    }

    #[test]
    fn test_as_f64_widens_integer() {
        assert_eq!(Value::Integer(12).as_f64(), Some(12.0));
        assert_eq!(Value::string("12").as_f64(), None);
    }

    #[test]
    fn test_timestamp_parses() {
        let value = Value::Timestamp("2024-05-01T10:00:00.000Z".to_string());
        let parsed = value.as_datetime().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert!(Value::Timestamp("yesterday".to_string())
            .as_datetime()
            .is_none());
    }
}
