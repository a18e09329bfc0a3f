//! Menuhub Core Library
//!
//! Catalog storage, media hosting, public mirror sync and customer orders
//! for the Menuhub storefront.

pub mod catalog;
pub mod codec;
pub mod media;
pub mod models;
pub mod orders;
pub mod public;
pub mod store;
pub mod sync;

pub use catalog::{CatalogError, CatalogService, MissingImage, Mutation, Publish};
pub use codec::{decode, encode, CodecError, Document, Fields, Record, Value};
pub use media::{
    Cloudinary, CloudinaryConfig, ImageUpload, InMemoryMediaHost, MediaError, MediaHost,
    UploadedImage,
};
pub use models::{
    CatalogKind, Category, CategoryChanges, NewCategory, NewOrder, NewRecipe, Order, OrderItem,
    OrderStatus, Recipe, RecipeChanges, RecipeInput,
};
pub use orders::{OrderError, OrderService};
pub use public::PublicCatalog;
pub use store::{
    Credential, DocumentStore, ErrorCode, InMemoryStore, RestStore, RetryPolicy, StoreConfig,
    StoreError,
};
pub use sync::{
    FullSyncReport, ItemFailure, Retention, SyncClass, SyncEngine, SyncError, SyncLocks,
    SyncReport, SyncStatus,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
