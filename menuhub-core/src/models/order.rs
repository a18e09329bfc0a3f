use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::{Fields, Record, Value};

pub const DEFAULT_PAYMENT_METHOD: &str = "Cash on Delivery";

/// Where an order is in the kitchen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Preparing,
    Delivered,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Failed => "Failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "preparing" => Some(OrderStatus::Preparing),
            "delivered" => Some(OrderStatus::Delivered),
            "failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an order: a recipe and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    #[serde(default)]
    pub image: String,
}

impl OrderItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64, quantity: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity,
            image: String::new(),
        }
    }

    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }

    /// Map value stored in the order's `items` array. Quantity is an integer,
    /// price always a double.
    pub fn to_value(&self) -> Value {
        let mut fields = Fields::new();
        fields.insert("id".to_string(), Value::string(&self.id));
        fields.insert("name".to_string(), Value::string(&self.name));
        fields.insert("price".to_string(), Value::Double(self.price));
        fields.insert("quantity".to_string(), Value::Integer(self.quantity));
        fields.insert("image".to_string(), Value::string(&self.image));
        Value::Map(fields)
    }

    /// Reads one array entry. Entries that are not maps are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let Value::Map(fields) = value else {
            return None;
        };
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            id: text("id"),
            name: text("name"),
            price: fields.get("price").and_then(Value::as_f64).unwrap_or(0.0),
            quantity: fields.get("quantity").and_then(Value::as_i64).unwrap_or(0),
            image: text("image"),
        })
    }
}

/// A customer order placed with one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub restaurant_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub delivery_address: String,
    pub phone_number: String,
    pub order_notes: String,
    pub payment_method: String,
    /// `None` when the stored status is not one this crate knows.
    pub status: Option<OrderStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn from_record(record: &Record) -> Option<Self> {
        let id = record.id.clone()?;
        let items = match record.get("items") {
            Some(Value::Array(values)) => values.iter().filter_map(OrderItem::from_value).collect(),
            _ => Vec::new(),
        };
        Some(Self {
            id,
            user_id: record.str_or_empty("userId"),
            restaurant_id: record.str_or_empty("restaurantId"),
            items,
            total_amount: record.get_f64("totalAmount").unwrap_or(0.0),
            delivery_address: record.str_or_empty("deliveryAddress"),
            phone_number: record.str_or_empty("phoneNumber"),
            order_notes: record.str_or_empty("orderNotes"),
            payment_method: record.str_or_empty("paymentMethod"),
            status: record.get_str("status").and_then(OrderStatus::parse),
            created_at: record.get("createdAt").and_then(Value::as_datetime),
            updated_at: record.get("updatedAt").and_then(Value::as_datetime),
        })
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.status.map(|s| s.as_str()).unwrap_or("Unknown");
        write!(f, "{} [{}] {:.2} ({})", self.id, status, self.total_amount, self.user_id)?;
        if let Some(at) = self.created_at {
            write!(f, " {}", at.format("%Y-%m-%d %H:%M"))?;
        }
        for item in &self.items {
            write!(f, "\n    {} x {} @ {:.2}", item.quantity, item.name, item.price)?;
        }
        Ok(())
    }
}

/// What a customer submits at checkout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub delivery_address: String,
    pub phone_number: String,
    #[serde(default)]
    pub order_notes: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

fn default_payment_method() -> String {
    DEFAULT_PAYMENT_METHOD.to_string()
}

impl NewOrder {
    pub fn new(
        items: Vec<OrderItem>,
        delivery_address: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            items,
            delivery_address: delivery_address.into(),
            phone_number: phone_number.into(),
            order_notes: String::new(),
            payment_method: default_payment_method(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.order_notes = notes.into();
        self
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Fields of a freshly placed order. The total is computed from the items.
    pub fn fields(&self, user_id: &str, restaurant_id: &str, now: DateTime<Utc>) -> Fields {
        let items = self.items.iter().map(OrderItem::to_value).collect();
        let mut fields = Fields::new();
        fields.insert("userId".to_string(), Value::string(user_id));
        fields.insert("restaurantId".to_string(), Value::string(restaurant_id));
        fields.insert("items".to_string(), Value::Array(items));
        fields.insert("totalAmount".to_string(), Value::Double(self.total()));
        fields.insert(
            "deliveryAddress".to_string(),
            Value::string(self.delivery_address.trim()),
        );
        fields.insert("phoneNumber".to_string(), Value::string(self.phone_number.trim()));
        fields.insert("orderNotes".to_string(), Value::string(self.order_notes.trim()));
        fields.insert("paymentMethod".to_string(), Value::string(&self.payment_method));
        fields.insert(
            "status".to_string(),
            Value::string(OrderStatus::Pending.as_str()),
        );
        fields.insert("createdAt".to_string(), Value::timestamp(now));
        fields.insert("updatedAt".to_string(), Value::timestamp(now));
        fields
    }
}
