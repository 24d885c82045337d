//! Transport contract and the `reqwest`-backed HTTP adapter.
//!
//! The action layer drives an injectable REST-style collaborator exposing
//! the four verbs. Paths are relative to the adapter's base URL; a 204
//! response carries no body and is reported as "no document" rather than a
//! parse error.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::resource::{Document, PrimaryData, Resource};

/// Errors surfaced by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success HTTP outcome.
    #[error("http status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// Response body, when one could be read as JSON.
        body: Option<Value>,
    },

    /// The request could not be performed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A success response carried an undecodable body.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    /// HTTP status of the failure, if known.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request(err) => err.status().map(|status| status.as_u16()),
            TransportError::Decode(_) => None,
        }
    }
}

/// Passthrough per-request configuration.
///
/// Handed to the transport untouched; the action layer never inspects it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Query parameters appended to the request URL.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<(String, String)>,
    /// Extra request headers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
}

impl RequestConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        RequestConfig::default()
    }

    /// Add a query parameter (builder pattern).
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Add a request header (builder pattern).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Outcome of a successful transport call.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The decoded body. Absent for 204 and other bodiless responses.
    pub document: Option<Document>,
}

impl TransportResponse {
    /// The document's primary data, if any.
    pub fn data(&self) -> Option<&PrimaryData> {
        self.document.as_ref().and_then(|doc| doc.data.as_ref())
    }
}

/// REST-style collaborator the action layer drives.
///
/// Each call performs exactly one outbound request. Deadlines and
/// cancellation belong to the implementation, not the callers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path`.
    async fn get(
        &self,
        path: &str,
        config: Option<&RequestConfig>,
    ) -> Result<TransportResponse, TransportError>;

    /// POST `body` to `path`.
    async fn post(
        &self,
        path: &str,
        body: &Resource,
        config: Option<&RequestConfig>,
    ) -> Result<TransportResponse, TransportError>;

    /// PATCH `body` onto `path`.
    async fn patch(
        &self,
        path: &str,
        body: &Resource,
        config: Option<&RequestConfig>,
    ) -> Result<TransportResponse, TransportError>;

    /// DELETE `path`.
    async fn delete(
        &self,
        path: &str,
        config: Option<&RequestConfig>,
    ) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport with a configured base URL.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a transport with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Create a transport with an explicit request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Create a transport over an existing client.
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        HttpTransport { base_url, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn prepare(
        &self,
        mut request: reqwest::RequestBuilder,
        config: Option<&RequestConfig>,
    ) -> reqwest::RequestBuilder {
        let Some(config) = config else {
            return request;
        };
        if !config.params.is_empty() {
            request = request.query(&config.params);
        }
        for (name, value) in &config.headers {
            request = request.header(name, value);
        }
        request
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<TransportResponse, TransportError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .ok()
                .and_then(|text| serde_json::from_str(&text).ok());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            // 204 and other bodiless successes.
            return Ok(TransportResponse {
                status: status.as_u16(),
                document: None,
            });
        }
        let document: Document = serde_json::from_str(&text)?;
        Ok(TransportResponse {
            status: status.as_u16(),
            document: Some(document),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        path: &str,
        config: Option<&RequestConfig>,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(path);
        debug!(%url, "GET");
        self.execute(self.prepare(self.client.get(&url), config))
            .await
    }

    async fn post(
        &self,
        path: &str,
        body: &Resource,
        config: Option<&RequestConfig>,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(path);
        debug!(%url, "POST");
        self.execute(self.prepare(self.client.post(&url).json(body), config))
            .await
    }

    async fn patch(
        &self,
        path: &str,
        body: &Resource,
        config: Option<&RequestConfig>,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(path);
        debug!(%url, "PATCH");
        self.execute(self.prepare(self.client.patch(&url).json(body), config))
            .await
    }

    async fn delete(
        &self,
        path: &str,
        config: Option<&RequestConfig>,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(path);
        debug!(%url, "DELETE");
        self.execute(self.prepare(self.client.delete(&url), config))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let transport =
            HttpTransport::with_client("http://example.com/", reqwest::Client::new());
        assert_eq!(transport.url("widget/1"), "http://example.com/widget/1");
        assert_eq!(transport.url("/widget/1"), "http://example.com/widget/1");
    }

    #[test]
    fn test_status_error_exposes_code() {
        let err = TransportError::Status {
            status: 500,
            body: None,
        };
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("500"));
    }
}
