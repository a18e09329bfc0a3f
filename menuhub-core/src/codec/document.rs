//! Store documents and their plain-record form.

use serde::{Deserialize, Serialize};

use super::value::{decode_fields, encode_fields, Fields, Value, WireFields};

/// A document as returned by the store.
///
/// `name` is the full resource path, e.g.
/// `projects/p/databases/(default)/documents/public-categories/c1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<WireFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Trailing path segment of the resource name.
    pub fn id(&self) -> Option<&str> {
        let name = self.name.as_deref()?;
        name.rsplit('/').next().filter(|segment| !segment.is_empty())
    }
}

/// A decoded document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub id: Option<String>,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// String field, or empty when missing or not a string.
    pub fn str_or_empty(&self, key: &str) -> String {
        self.get_str(key).unwrap_or_default().to_string()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }
}

/// Decodes a store document into a plain record.
///
/// Returns `None` when the document carries no fields. Individual fields
/// that fail to decode come back as [`Value::Null`]; this never fails.
pub fn decode(doc: &Document) -> Option<Record> {
    let Some(fields) = doc.fields.as_ref() else {
        tracing::warn!(name = ?doc.name, "Document has no fields");
        return None;
    };

    Some(Record {
        id: doc.id().map(str::to_string),
        fields: decode_fields(fields),
    })
}

/// Encodes plain fields for a create or update request.
pub fn encode(fields: &Fields) -> WireFields {
    encode_fields(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(name: Option<&str>, fields: serde_json::Value) -> Document {
        Document {
            name: name.map(str::to_string),
            fields: fields.as_object().cloned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_takes_id_from_name() {
        let d = doc(
            Some("projects/p/databases/(default)/documents/restaurants/r1/categories/c1"),
            json!({"name": {"stringValue": "Drinks"}}),
        );

        let record = decode(&d).unwrap();
        assert_eq!(record.id.as_deref(), Some("c1"));
        assert_eq!(record.get_str("name"), Some("Drinks"));
    }

    #[test]
    fn test_decode_without_fields_is_none() {
        let d = Document {
            name: Some("a/b".to_string()),
            ..Default::default()
        };
        assert!(decode(&d).is_none());
    }

    #[test]
    fn test_decode_without_name_has_no_id() {
        let record = decode(&doc(None, json!({"name": {"stringValue": "x"}}))).unwrap();
        assert!(record.id.is_none());

        let record = decode(&doc(Some("trailing/"), json!({}))).unwrap();
        assert!(record.id.is_none());
    }

    #[test]
    fn test_decode_unknown_tag_is_null_and_keeps_id() {
        let d = doc(
            Some("public-categories/c9"),
            json!({
                "name": {"stringValue": "Soups"},
                "location": {"geoPointValue": {"latitude": 1.0, "longitude": 2.0}},
            }),
        );

        let record = decode(&d).unwrap();
        assert_eq!(record.id.as_deref(), Some("c9"));
        assert_eq!(record.get("location"), Some(&Value::Null));
        assert_eq!(record.get_str("name"), Some("Soups"));
    }

    #[test]
    fn test_round_trip_scalar_fields() {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::string("Lemonade"));
        fields.insert("stock".to_string(), Value::Integer(12));
        fields.insert("price".to_string(), Value::Double(3.5));
        fields.insert("available".to_string(), Value::Boolean(false));
        fields.insert(
            "createdAt".to_string(),
            Value::Timestamp("2024-01-02T03:04:05.678Z".to_string()),
        );
        let record = Record::new("x1", fields);

        let wire = Document {
            name: Some("public-recipes/x1".to_string()),
            fields: Some(encode(&record.fields)),
            ..Default::default()
        };

        assert_eq!(decode(&wire), Some(record));
    }

    #[test]
    fn test_document_deserializes_store_json() {
        let raw = json!({
            "name": "projects/p/databases/(default)/documents/public-recipes/r7",
            "fields": {"price": {"doubleValue": 9.99}},
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-02T00:00:00Z"
        });
        let d: Document = serde_json::from_value(raw).unwrap();
        assert_eq!(d.id(), Some("r7"));
        assert_eq!(d.update_time.as_deref(), Some("2024-01-02T00:00:00Z"));
        assert_eq!(decode(&d).unwrap().get_f64("price"), Some(9.99));
    }
}
