//! Remote model archive client.
//!
//! Promoted models are copied to an object store and described by a
//! metadata record. The archive is reached over HTTP:
//!
//! - `PUT {base}/objects/{percent-encoded path}` with the raw bytes,
//!   answering `{ "url": "..." }`
//! - `POST {base}/records` with an `ArchiveRecord`, answering `{ "id": "..." }`
//! - `GET {base}/records?userId={uid}`, answering `{ "records": [...] }`
//!
//! Failures of any kind surface as `Error::Remote`. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::config::ArchiveConfig;
use crate::{Error, Result};

/// What an archived object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Model,
    Thumbnail,
}

impl ArchiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::Model => "model",
            ArchiveKind::Thumbnail => "thumbnail",
        }
    }
}

/// Destination path of an archived object:
/// `{user_id}/{model|thumbnail}/{unix_millis}_{file_name}`.
pub fn archive_path(user_id: &str, kind: ArchiveKind, timestamp_millis: i64, file_name: &str) -> String {
    format!("{}/{}/{}_{}", user_id, kind.as_str(), timestamp_millis, file_name)
}

/// Metadata stored next to an archived model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    pub name: String,
    pub model_url: String,
    pub model_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// A stored metadata record with its archive id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedModel {
    pub id: String,
    #[serde(flatten)]
    pub record: ArchiveRecord,
}

/// Durable storage for promoted models.
#[async_trait]
pub trait ModelArchive: Send + Sync {
    /// Store bytes at `destination_path` and return their download URL.
    async fn upload(&self, bytes: Vec<u8>, destination_path: &str) -> Result<String>;

    /// Store a metadata record and return its id.
    async fn record_metadata(&self, record: ArchiveRecord) -> Result<String>;

    /// Every record owned by `user_id`.
    async fn list_records(&self, user_id: &str) -> Result<Vec<ArchivedModel>>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RecordListResponse {
    records: Vec<ArchivedModel>,
}

/// `ModelArchive` over HTTP.
pub struct HttpModelArchive {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpModelArchive {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| Error::InvalidInput(format!("Invalid archive URL {}: {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Build the archive from configuration, `None` when no URL is set.
    pub fn from_config(config: &ArchiveConfig) -> Result<Option<Self>> {
        config
            .url
            .as_deref()
            .map(|url| Self::new(url, config.api_key.clone(), config.timeout))
            .transpose()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Internal(format!("Failed to build archive URL: {}", e)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(AUTHORIZATION, format!("Bearer {}", key)),
            None => request,
        }
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<T> {
        let response = self.authorize(request).send().await.map_err(|e| {
            error!("Archive {} failed: {}", action, e);
            Error::Remote(format!("{} failed: {}", action, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Archive {} rejected: {}", action, body);
            return Err(Error::Remote(format!(
                "{} failed with status {}",
                action, status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Remote(format!("{} returned an invalid response: {}", action, e)))
    }
}

#[async_trait]
impl ModelArchive for HttpModelArchive {
    async fn upload(&self, bytes: Vec<u8>, destination_path: &str) -> Result<String> {
        let url = self.endpoint(&format!(
            "objects/{}",
            urlencoding::encode(destination_path)
        ))?;
        debug!(path = destination_path, size = bytes.len(), "Uploading to archive");

        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes);

        let response: UploadResponse = self.send(request, "Archive upload").await?;
        Ok(response.url)
    }

    async fn record_metadata(&self, record: ArchiveRecord) -> Result<String> {
        let url = self.endpoint("records")?;
        debug!(name = %record.name, "Recording archive metadata");

        let request = self.client.post(url).json(&record);

        let response: RecordResponse = self.send(request, "Archive metadata").await?;
        Ok(response.id)
    }

    async fn list_records(&self, user_id: &str) -> Result<Vec<ArchivedModel>> {
        let url = self.endpoint("records")?;
        debug!(user_id, "Listing archive records");

        let request = self.client.get(url).query(&[("userId", user_id)]);

        let response: RecordListResponse = self.send(request, "Archive listing").await?;
        Ok(response.records)
    }
}
