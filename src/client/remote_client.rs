/**
 * Remote Ledger Client
 *
 * HTTP client for the four endpoints each dataset exposes: version count,
 * full snapshot, time-windowed patch, and single-record update.
 * The `RemoteSource` trait is the seam the orchestrator and the submitter
 * depend on, `HttpRemote` is the reqwest implementation.
 */

use crate::client::config::{Config, Endpoint};
use crate::client::types::{UpdateRequest, UpdateResponse, VersionResponse};
use crate::shared::dataset::{DatasetKind, VersionMarker};
use crate::shared::error::{Result, SyncError};
use crate::shared::record::Record;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Remote side of the sync core
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Cheap `(count, hash)` summary of the remote dataset
    async fn fetch_version(&self, kind: DatasetKind) -> Result<VersionMarker>;

    /// Complete current dataset
    async fn fetch_snapshot(&self, kind: DatasetKind) -> Result<Vec<Record>>;

    /// Records modified at or after `since`
    async fn fetch_patch(&self, kind: DatasetKind, since: DateTime<Utc>) -> Result<Vec<Record>>;

    /// Write one record's mutable fields
    async fn submit_update(&self, kind: DatasetKind, record: &Record) -> Result<()>;
}

/// reqwest-backed remote
#[derive(Debug, Clone)]
pub struct HttpRemote {
    config: Config,
    client: Client,
}

impl HttpRemote {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.app().request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SyncError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.session_cookie() {
            Some(cookie) => request.header(reqwest::header::COOKIE, cookie),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self
            .with_session(request)
            .send()
            .await
            .map_err(|e| SyncError::network(format!("Network error: {}", e)))?;
        let response = ensure_success(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::network(format!("Network error: {}", e)))?;
        serde_json::from_slice(&body)
            .map_err(|e| SyncError::data_format(format!("Failed to parse response: {}", e)))
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_else(|_| status.to_string());
    Err(SyncError::network(format!("HTTP {}: {}", status, error_text)))
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_version(&self, kind: DatasetKind) -> Result<VersionMarker> {
        let url = self.config.endpoint_url(kind, Endpoint::Version);
        let response: VersionResponse = self.get_json(self.client.get(&url)).await?;
        tracing::debug!(dataset = %kind, count = response.count, "version fetched");
        Ok(response.into())
    }

    async fn fetch_snapshot(&self, kind: DatasetKind) -> Result<Vec<Record>> {
        let url = self.config.endpoint_url(kind, Endpoint::Snapshot);
        let records: Vec<Record> = self.get_json(self.client.get(&url)).await?;
        tracing::debug!(dataset = %kind, records = records.len(), "snapshot fetched");
        Ok(records)
    }

    async fn fetch_patch(&self, kind: DatasetKind, since: DateTime<Utc>) -> Result<Vec<Record>> {
        let url = self.config.endpoint_url(kind, Endpoint::Patch);
        let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let request = self.client.get(&url).query(&[("since", since.as_str())]);
        let records: Vec<Record> = self.get_json(request).await?;
        tracing::debug!(dataset = %kind, records = records.len(), %since, "patch fetched");
        Ok(records)
    }

    async fn submit_update(&self, kind: DatasetKind, record: &Record) -> Result<()> {
        let url = self.config.endpoint_url(kind, Endpoint::Update);
        let request = self.client.post(&url).json(&UpdateRequest::from(record));
        let response: UpdateResponse = self.get_json(request).await?;
        if response.success {
            Ok(())
        } else {
            Err(SyncError::rejected(response.failure_reason()))
        }
    }
}
