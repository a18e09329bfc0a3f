use std::cmp::Reverse;
use std::sync::Arc;

use chrono::Utc;

use super::error::OrderError;
use crate::codec::{decode, Document, Fields, Value};
use crate::models::{NewOrder, Order, OrderStatus};
use crate::store::{Credential, DocumentStore};

pub fn orders_collection(restaurant_id: &str) -> String {
    format!("restaurants/{}/orders", restaurant_id)
}

/// Places and tracks orders for a restaurant.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn DocumentStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Stores a new order in `Pending` status. The store assigns the id.
    pub async fn place_order(
        &self,
        restaurant_id: &str,
        user_id: &str,
        credential: &Credential,
        order: NewOrder,
    ) -> Result<Order, OrderError> {
        validate(user_id, &order)?;

        let fields = order.fields(user_id, restaurant_id, Utc::now());
        let doc = self
            .store
            .create_document(&orders_collection(restaurant_id), &fields, credential, None)
            .await?;
        let placed = order_of(&doc)?;
        tracing::info!(
            restaurant_id,
            user_id,
            order_id = %placed.id,
            items = placed.items.len(),
            "Placed order"
        );
        Ok(placed)
    }

    /// Every order of the restaurant, newest first.
    pub async fn list_orders(
        &self,
        restaurant_id: &str,
        credential: &Credential,
    ) -> Result<Vec<Order>, OrderError> {
        let documents = self
            .store
            .get_collection(&orders_collection(restaurant_id), credential)
            .await?;
        let mut orders: Vec<Order> = documents
            .iter()
            .filter_map(decode)
            .filter_map(|record| Order::from_record(&record))
            .collect();
        orders.sort_by_key(|order| Reverse(order.created_at));
        Ok(orders)
    }

    /// One customer's orders with the restaurant, newest first.
    pub async fn list_user_orders(
        &self,
        restaurant_id: &str,
        user_id: &str,
        credential: &Credential,
    ) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.list_orders(restaurant_id, credential).await?;
        orders.retain(|order| order.user_id == user_id);
        Ok(orders)
    }

    pub async fn update_status(
        &self,
        restaurant_id: &str,
        order_id: &str,
        status: OrderStatus,
        credential: &Credential,
    ) -> Result<Order, OrderError> {
        let path = format!("{}/{}", orders_collection(restaurant_id), order_id);

        // Updates create missing documents, so check first
        self.store
            .get_document(&path, credential)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    OrderError::NotFound(order_id.to_string())
                } else {
                    e.into()
                }
            })?;

        let mut fields = Fields::new();
        fields.insert("status".to_string(), Value::string(status.as_str()));
        fields.insert("updatedAt".to_string(), Value::timestamp(Utc::now()));
        let doc = self.store.update_document(&path, &fields, credential).await?;

        tracing::info!(restaurant_id, order_id, %status, "Updated order status");
        order_of(&doc)
    }
}

fn order_of(doc: &Document) -> Result<Order, OrderError> {
    decode(doc)
        .and_then(|record| Order::from_record(&record))
        .ok_or(OrderError::MissingId)
}

fn validate(user_id: &str, order: &NewOrder) -> Result<(), OrderError> {
    if user_id.trim().is_empty() {
        return Err(OrderError::validation("userId", "must not be empty"));
    }
    if order.items.is_empty() {
        return Err(OrderError::validation("items", "an order needs at least one item"));
    }
    for (index, item) in order.items.iter().enumerate() {
        if item.id.trim().is_empty() || item.name.trim().is_empty() {
            return Err(OrderError::validation(
                "items",
                format!("item {} needs an id and a name", index),
            ));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(OrderError::validation(
                "items",
                format!("item {} has an invalid price", index),
            ));
        }
        if item.quantity < 1 {
            return Err(OrderError::validation(
                "items",
                format!("item {} needs a quantity of at least 1", index),
            ));
        }
    }
    if order.delivery_address.trim().is_empty() {
        return Err(OrderError::validation("deliveryAddress", "must not be empty"));
    }
    if order.phone_number.trim().is_empty() {
        return Err(OrderError::validation("phoneNumber", "must not be empty"));
    }
    Ok(())
}
