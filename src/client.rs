//! Request client for the reading-service API
//!
//! Issues single GET requests and turns every failure into a [`RequestError`]
//! whose retryability is fixed by the response status.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, RequestError, Result};

/// Thin wrapper around a shared [`reqwest::Client`] bound to one base URL
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the configured base URL
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL {:?}: {e}", config.base_url),
            key: Some("api.base_url".to_string()),
        })?;
        let http = build_http_client(config.timeout)?;
        Ok(Self { http, base_url })
    }

    /// Resolve `path` against the base URL and append `query` in order
    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.join(path).map_err(|e| Error::Config {
            message: format!("cannot join {path:?} onto base URL: {e}"),
            key: Some("api.base_url".to_string()),
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        Ok(url)
    }

    /// GET `url` and decode the body as JSON
    ///
    /// Non-2xx responses fail with the response status. Connection failures,
    /// timeouts and undecodable bodies carry no status and are retryable.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, RequestError> {
        let response = self.http.get(url.clone()).send().await.map_err(|e| {
            tracing::debug!(url = %url, error = %e, "Request failed before a response arrived");
            RequestError::network(format!("request to {url} failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = status.as_u16(), "Request returned error status");
            return Err(RequestError::from_status(status.as_u16()));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::debug!(url = %url, error = %e, "Response body could not be decoded");
            RequestError::network(format!("invalid response body from {url}: {e}"))
        })
    }
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Other(format!("failed to build HTTP client: {e}")))
}
