//! Firestore REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::{ErrorCode, StoreError};
use super::retry::RetryPolicy;
use super::{Credential, DocumentStore};
use crate::codec::{encode, Document, Fields};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
const PAGE_SIZE: &str = "300";

/// Connection settings for [`RestStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub project_id: String,
    /// Web API key, sent as `?key=` on every request.
    pub api_key: Option<String>,
    pub database: String,
    /// Override for the emulator or a proxy.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: None,
            database: "(default)".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Document store backed by the Firestore REST API.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    config: StoreConfig,
    retry: RetryPolicy,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Retry policy for a create. Without an explicit id a timed-out create
    /// may still have landed, and retrying it would write a duplicate.
    fn create_retry(&self, id: Option<&str>) -> RetryPolicy {
        match id {
            Some(_) => self.retry,
            None => RetryPolicy::none(),
        }
    }

    /// Root URL of the documents resource.
    fn documents_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id,
            self.config.database
        )
    }

    /// URL for a collection or document path, segment-encoded.
    fn url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.documents_url(), encoded.join("/"))
    }

    fn request(&self, method: Method, url: &str, credential: &Credential) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.config.api_key {
            builder = builder.query(&[("key", key.as_str())]);
        }
        if let Some(token) = credential.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, StoreError> {
        let response = builder.send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        response.json::<T>().await.map_err(transport_error)
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(parse_error(status, &body))
}

/// Builds a [`StoreError`] from an error response.
fn parse_error(status: u16, body: &str) -> StoreError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = envelope
                .error
                .status
                .as_deref()
                .map(ErrorCode::parse)
                .filter(|code| *code != ErrorCode::Unknown)
                .unwrap_or_else(|| ErrorCode::from_http(status));
            StoreError::new(code, envelope.error.message)
        }
        Err(_) => StoreError::new(
            ErrorCode::from_http(status),
            format!("HTTP {}: {}", status, body.trim()),
        ),
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    let code = if e.is_timeout() {
        ErrorCode::DeadlineExceeded
    } else if e.is_connect() {
        ErrorCode::Unavailable
    } else if e.is_decode() {
        ErrorCode::Internal
    } else {
        ErrorCode::Unknown
    };
    StoreError::new(code, e.to_string())
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn get_collection(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<Vec<Document>, StoreError> {
        let url = self.url(path);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: ListResponse = self
                .retry
                .run("get_collection", || {
                    let mut builder = self
                        .request(Method::GET, &url, credential)
                        .query(&[("pageSize", PAGE_SIZE)]);
                    if let Some(token) = &page_token {
                        builder = builder.query(&[("pageToken", token.as_str())]);
                    }
                    Self::send(builder)
                })
                .await?;

            documents.extend(page.documents);
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn get_document(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<Document, StoreError> {
        let url = self.url(path);
        self.retry
            .run("get_document", || {
                Self::send(self.request(Method::GET, &url, credential))
            })
            .await
    }

    async fn create_document(
        &self,
        collection: &str,
        fields: &Fields,
        credential: &Credential,
        id: Option<&str>,
    ) -> Result<Document, StoreError> {
        let url = self.url(collection);
        let body = json!({ "fields": encode(fields) });

        self.create_retry(id)
            .run("create_document", || {
                let mut builder = self.request(Method::POST, &url, credential).json(&body);
                if let Some(id) = id {
                    builder = builder.query(&[("documentId", id)]);
                }
                Self::send(builder)
            })
            .await
    }

    async fn update_document(
        &self,
        path: &str,
        fields: &Fields,
        credential: &Credential,
    ) -> Result<Document, StoreError> {
        let url = self.url(path);
        let body = json!({ "fields": encode(fields) });
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();

        self.retry
            .run("update_document", || {
                Self::send(
                    self.request(Method::PATCH, &url, credential)
                        .query(&mask)
                        .json(&body),
                )
            })
            .await
    }

    async fn delete_document(&self, path: &str, credential: &Credential) -> Result<(), StoreError> {
        let url = self.url(path);
        let url = url.as_str();
        self.retry
            .run("delete_document", move || async move {
                let response = self
                    .request(Method::DELETE, url, credential)
                    .send()
                    .await
                    .map_err(transport_error)?;
                check_status(response).await.map(|_| ())
            })
            .await
    }
}
