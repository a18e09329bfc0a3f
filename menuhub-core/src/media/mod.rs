//! Image hosting for catalog items.

mod cloudinary;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cloudinary::{Cloudinary, CloudinaryConfig};
pub use memory::InMemoryMediaHost;

/// An image file to upload.
#[derive(Clone, PartialEq)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A hosted image: its public URL and the handle used to delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media host not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Upload response missing {0}")]
    MissingField(&'static str),
}

/// Image host used by the catalog service.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, MediaError>;

    /// Removes a hosted image. Never fails: returns `false` and logs when
    /// the image could not be removed.
    async fn delete(&self, public_id: &str) -> bool;

    /// Whether the image is still served. Any failure counts as missing.
    async fn exists(&self, public_id: &str) -> bool;
}
