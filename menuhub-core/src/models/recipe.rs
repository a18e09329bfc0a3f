use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::{Fields, Record, Value};
use crate::media::ImageUpload;

/// A dish on the menu, filed under one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub ingredients: String,
    pub price: f64,
    pub image_url: String,
    pub image_public_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Recipe {
    pub fn from_record(record: &Record) -> Option<Self> {
        let id = record.id.clone()?;
        Some(Self {
            id,
            name: record.str_or_empty("name"),
            category_id: record.str_or_empty("categoryId"),
            ingredients: record.str_or_empty("ingredients"),
            // Integer prices from older documents are widened
            price: record.get_f64("price").unwrap_or(0.0),
            image_url: record.str_or_empty("imageUrl"),
            image_public_id: record.str_or_empty("imagePublicId"),
            restaurant_id: record.get_str("restaurantId").map(str::to_string),
            created_at: record.get("createdAt").and_then(Value::as_datetime),
            updated_at: record.get("updatedAt").and_then(Value::as_datetime),
        })
    }

    /// Field set written to the public mirror. Price is always a double.
    pub fn public_fields(&self, restaurant_id: &str, now: DateTime<Utc>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("id".to_string(), Value::string(&self.id));
        fields.insert("name".to_string(), Value::string(&self.name));
        fields.insert("categoryId".to_string(), Value::string(&self.category_id));
        fields.insert("ingredients".to_string(), Value::string(&self.ingredients));
        fields.insert("price".to_string(), Value::Double(self.price));
        fields.insert("imageUrl".to_string(), Value::string(&self.image_url));
        fields.insert(
            "imagePublicId".to_string(),
            Value::string(&self.image_public_id),
        );
        fields.insert("restaurantId".to_string(), Value::string(restaurant_id));
        fields.insert("updatedAt".to_string(), Value::timestamp(now));
        fields
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {:.2}", self.name, self.price)?;
        if !self.image_public_id.is_empty() {
            write!(f, " [image]")?;
        }
        write!(f, " ({})", self.id)?;
        if !self.ingredients.is_empty() {
            write!(f, "\n    {}", self.ingredients)?;
        }
        Ok(())
    }
}

/// Recipe fields supplied by an admin, for both create and update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeInput {
    pub name: String,
    pub category_id: String,
    pub ingredients: String,
    pub price: f64,
    pub image: Option<ImageUpload>,
}

pub type NewRecipe = RecipeInput;
pub type RecipeChanges = RecipeInput;

impl RecipeInput {
    pub fn new(name: impl Into<String>, category_id: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            category_id: category_id.into(),
            price,
            ..Default::default()
        }
    }

    pub fn with_ingredients(mut self, ingredients: impl Into<String>) -> Self {
        self.ingredients = ingredients.into();
        self
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn private_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::string(self.name.trim()));
        fields.insert("categoryId".to_string(), Value::string(&self.category_id));
        fields.insert("ingredients".to_string(), Value::string(&self.ingredients));
        fields.insert("price".to_string(), Value::Double(self.price));
        fields
    }
}
