//! Admin catalog mutations.

mod error;
mod service;
mod validate;

pub use error::CatalogError;
pub use validate::{
    validate_image, validate_name, validate_price, MAX_IMAGE_BYTES, NAME_MAX_CHARS, NAME_MIN_CHARS,
};
pub use service::{CatalogService, MissingImage, Mutation, Publish};
