//! Cloudinary image host.
//!
//! Uploads go through an unsigned upload preset, so only the cloud name and
//! preset are required. Deletes use the authenticated destroy endpoint and
//! need the API key and secret; without them deletes are skipped.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ImageUpload, MediaError, MediaHost, UploadedImage};

const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";
const DEFAULT_DELIVERY_URL: &str = "https://res.cloudinary.com";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Override for tests or a proxy.
    pub base_url: Option<String>,
    /// Override for the host that serves uploaded images.
    pub delivery_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    #[serde(default)]
    result: String,
}

#[derive(Debug, Clone)]
pub struct Cloudinary {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl Cloudinary {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!(
            "{}/v1_1/{}/image/{}",
            base, self.config.cloud_name, action
        )
    }

    /// Public URL of an uploaded image.
    fn delivery(&self, public_id: &str) -> String {
        let base = self
            .config
            .delivery_url
            .as_deref()
            .unwrap_or(DEFAULT_DELIVERY_URL)
            .trim_end_matches('/');
        format!(
            "{}/{}/image/upload/{}",
            base, self.config.cloud_name, public_id
        )
    }

    async fn destroy(&self, public_id: &str, api_key: &str, secret: &str) -> Result<bool, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id);
        params.insert("timestamp", timestamp.as_str());
        let signature = sign(&params, secret);

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", api_key),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: DestroyResponse = response.json().await?;
        Ok(body.result == "ok")
    }
}

/// Request signature: the sorted `key=value` pairs joined by `&`, followed
/// by the API secret, hashed with SHA-256 and hex encoded.
pub(crate) fn sign(params: &BTreeMap<&str, &str>, secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl MediaHost for Cloudinary {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, MediaError> {
        if self.config.cloud_name.is_empty() {
            return Err(MediaError::NotConfigured("cloud_name"));
        }
        if self.config.upload_preset.is_empty() {
            return Err(MediaError::NotConfigured("upload_preset"));
        }

        let form = Form::new()
            .part("file", Part::bytes(image.bytes).file_name(image.filename))
            .text("upload_preset", self.config.upload_preset.clone());

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        let url = body.secure_url.ok_or(MediaError::MissingField("secure_url"))?;
        let public_id = body.public_id.ok_or(MediaError::MissingField("public_id"))?;
        tracing::debug!(%public_id, "Uploaded image");

        Ok(UploadedImage { url, public_id })
    }

    async fn delete(&self, public_id: &str) -> bool {
        if public_id.is_empty() {
            tracing::warn!("No image id given, nothing to delete");
            return false;
        }
        let (Some(api_key), Some(secret)) = (&self.config.api_key, &self.config.api_secret) else {
            tracing::warn!(%public_id, "Media API credentials not configured, keeping image");
            return false;
        };

        match self.destroy(public_id, api_key, secret).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(%public_id, "Media host did not delete image");
                false
            }
            Err(e) => {
                tracing::warn!(%public_id, error = %e, "Failed to delete image");
                false
            }
        }
    }

    async fn exists(&self, public_id: &str) -> bool {
        if public_id.is_empty() || self.config.cloud_name.is_empty() {
            return false;
        }
        match self.client.head(self.delivery(public_id)).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                tracing::debug!(%public_id, error = %e, "Image check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_is_order_independent_hex() {
        let mut a = BTreeMap::new();
        a.insert("timestamp", "1700000000");
        a.insert("public_id", "menu/soup");

        let mut b = BTreeMap::new();
        b.insert("public_id", "menu/soup");
        b.insert("timestamp", "1700000000");

        let sig = sign(&a, "secret");
        assert_eq!(sig, sign(&b, "secret"));
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(sig, sign(&a, "other-secret"));
    }

    #[test]
    fn test_endpoint() {
        let host = Cloudinary::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            upload_preset: "unsigned".to_string(),
            ..Default::default()
        });
        assert_eq!(
            host.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            host.delivery("menu/soup"),
            "https://res.cloudinary.com/demo/image/upload/menu/soup"
        );
    }

    #[tokio::test]
    async fn test_exists_needs_an_id_and_a_cloud() {
        let host = Cloudinary::new(CloudinaryConfig::default());
        assert!(!host.exists("menu/soup").await);

        let host = Cloudinary::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            ..Default::default()
        });
        assert!(!host.exists("").await);
    }

    #[tokio::test]
    async fn test_delete_without_credentials_is_false() {
        let host = Cloudinary::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            ..Default::default()
        });
        assert!(!host.delete("menu/soup").await);
        assert!(!host.delete("").await);
    }

    #[tokio::test]
    async fn test_upload_requires_preset() {
        let host = Cloudinary::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            ..Default::default()
        });
        let err = host
            .upload(ImageUpload::new("a.png", vec![1, 2, 3]))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NotConfigured("upload_preset")));
    }
}
