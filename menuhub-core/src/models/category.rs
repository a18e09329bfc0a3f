use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::{Fields, Record, Value};
use crate::media::ImageUpload;

/// A menu category, as stored privately or mirrored publicly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub image_public_id: String,
    /// Only set on the public copy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    /// Builds a category from a decoded record. Records without an id are
    /// rejected; other missing fields fall back to empty values.
    pub fn from_record(record: &Record) -> Option<Self> {
        let id = record.id.clone()?;
        Some(Self {
            id,
            name: record.str_or_empty("name"),
            image_url: record.str_or_empty("imageUrl"),
            image_public_id: record.str_or_empty("imagePublicId"),
            restaurant_id: record.get_str("restaurantId").map(str::to_string),
            created_at: record.get("createdAt").and_then(Value::as_datetime),
            updated_at: record.get("updatedAt").and_then(Value::as_datetime),
        })
    }

    /// Field set written to the public mirror.
    pub fn public_fields(&self, restaurant_id: &str, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("id".to_string(), Value::string(&self.id));
        fields.insert("name".to_string(), Value::string(&self.name));
        fields.insert("imageUrl".to_string(), Value::string(&self.image_url));
        fields.insert(
            "imagePublicId".to_string(),
            Value::string(&self.image_public_id),
        );
        fields.insert("restaurantId".to_string(), Value::string(restaurant_id));
        fields.insert("updatedAt".to_string(), Value::timestamp(now));
        fields
    }

    pub fn has_image(&self) -> bool {
        !self.image_public_id.is_empty()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.has_image() {
            write!(f, " [image]")?;
        }
        write!(f, " ({})", self.id)
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub image: Option<ImageUpload>,
}

/// Input for updating a category. The name is always rewritten; the image
/// only when a new one is given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryChanges {
    pub name: String,
    pub image: Option<ImageUpload>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn private_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::string(self.name.trim()));
        fields
    }
}

impl CategoryChanges {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn private_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::string(self.name.trim()));
        fields
    }
}
