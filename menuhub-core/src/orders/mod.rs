//! Customer orders.
//!
//! Orders live beside the private catalog, one collection per restaurant:
//!
//! ```text
//! restaurants/{restaurantId}/orders/{id}
//! ```
//!
//! Line items are stored as an array of maps on the order document.

mod error;
mod service;

pub use error::OrderError;
pub use service::{orders_collection, OrderService};
