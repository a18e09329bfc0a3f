use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{ImageUpload, MediaError, MediaHost, UploadedImage};

/// Image host kept in memory, for tests and offline use.
#[derive(Debug, Default)]
pub struct InMemoryMediaHost {
    images: Mutex<BTreeMap<String, ImageUpload>>,
    deleted: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    fail_uploads: AtomicBool,
}

impl InMemoryMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn images(&self) -> MutexGuard<'_, BTreeMap<String, ImageUpload>> {
        self.images.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.images().contains_key(public_id)
    }

    pub fn len(&self) -> usize {
        self.images().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images().is_empty()
    }

    /// Ids passed to successful deletes, in order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Makes every following upload fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaHost for InMemoryMediaHost {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, MediaError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Rejected {
                status: 500,
                message: "upload disabled".to_string(),
            });
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let public_id = format!("menu/img-{}", n);
        let url = format!("memory://{}/{}", public_id, image.filename);
        self.images().insert(public_id.clone(), image);

        Ok(UploadedImage { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> bool {
        if self.images().remove(public_id).is_none() {
            tracing::warn!(%public_id, "Image not found, nothing deleted");
            return false;
        }
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(public_id.to_string());
        true
    }

    async fn exists(&self, public_id: &str) -> bool {
        self.contains(public_id)
    }
}
