//! HTTP client for the remote Markdown to PDF service.
//!
//! Three endpoints only: `/health`, `/api/stats` and `/api/convert-to-pdf`.
//! Nothing here retries or caches; callers decide what a failure means.

pub mod types;

use std::time::Duration;

use crate::error::ConvertError;
pub use types::{
    ConvertOptions, ConvertRequest, ErrorBody, HealthBody, ProcessId, ProcessInfo, StatsSnapshot,
};

const HEALTH_PATH: &str = "/health";
const STATS_PATH: &str = "/api/stats";
const CONVERT_PATH: &str = "/api/convert-to-pdf";

/// Raw result of a health request that reached the service and parsed.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    /// Whether the HTTP status was 2xx.
    pub ok: bool,
    pub body: HealthBody,
}

/// Cheap to clone; the underlying reqwest client is reference counted.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    /// `timeout` of `None` leaves timing entirely to the transport.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /health`. Non-JSON bodies surface as an `Err`, like a transport
    /// failure.
    pub async fn health(&self) -> Result<HealthProbe, reqwest::Error> {
        let response = self.http.get(self.url(HEALTH_PATH)).send().await?;
        let ok = response.status().is_success();
        let body = response.json::<HealthBody>().await?;
        Ok(HealthProbe { ok, body })
    }

    /// `GET /api/stats`.
    pub async fn stats(&self) -> Result<StatsSnapshot, reqwest::Error> {
        self.http
            .get(self.url(STATS_PATH))
            .send()
            .await?
            .error_for_status()?
            .json::<StatsSnapshot>()
            .await
    }

    /// `POST /api/convert-to-pdf`, returning the PDF bytes.
    ///
    /// A 2xx response with an empty body is an error: an empty document is
    /// never a valid result.
    pub async fn convert(&self, request: &ConvertRequest) -> Result<Vec<u8>, ConvertError> {
        let response = self
            .http
            .post(self.url(CONVERT_PATH))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.unwrap_or_default();
            return Err(ConvertError::http(status, body.error));
        }

        let payload = response.bytes().await?;
        if payload.is_empty() {
            return Err(ConvertError::EmptyPayload);
        }
        Ok(payload.to_vec())
    }
}
