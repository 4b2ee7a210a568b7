//! HTTP transport for the BorgWarehouse API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use tracing::debug;

use crate::error::TransportError;

/// Successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

/// A single-attempt request/response channel to the backend.
///
/// Non-success statuses are reported as [`TransportError`]; implementations
/// never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        headers: &HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response, TransportError>;
}

/// Transport backed by a `reqwest` client against a fixed base URL.
pub struct HttpTransport {
    base: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Validate `base_url` and build the client.
    ///
    /// A URL that does not parse, is not http(s), or carries a query or
    /// fragment is reported as `NetworkUnreachable`, same as an unreachable
    /// host. Request paths are appended to it verbatim.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let url = Url::parse(base_url.trim()).map_err(|e| {
            TransportError::NetworkUnreachable(format!("invalid URL {:?}: {}", base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https")
            || url.host_str().is_none()
            || url.query().is_some()
            || url.fragment().is_some()
        {
            return Err(TransportError::NetworkUnreachable(format!(
                "unsupported URL {:?}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                TransportError::NetworkUnreachable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            base: url.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        headers: &HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response, TransportError> {
        let url = format!("{}{}", self.base, path);
        debug!("{} {}", method, url);

        let mut req = self.client.request(method, &url).headers(headers.clone());
        if let Some(body) = body {
            req = req.body(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            debug!("{} answered {}", url, status);
            return Err(TransportError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
            ));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::NetworkUnreachable(e.to_string()))?;

        Ok(Response {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
