//! HTTP resource fetcher backed by reqwest

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::error::{WorkloadError, WorkloadResult};
use crate::traits::ResourceFetcher;

/// Fetches resources over HTTP(S) and drains the full body
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    request_timeout: Option<Duration>,
}

impl HttpFetcher {
    /// Create fetcher with a default client and no request timeout
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            request_timeout: None,
        }
    }

    /// Bound every single request (fluent API)
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn parse(url: &str) -> WorkloadResult<Url> {
        let parsed = Url::parse(url.trim()).map_err(|e| WorkloadError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(WorkloadError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> WorkloadResult<u64> {
        let target = Self::parse(url)?;

        let mut request = self.client.get(target);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WorkloadError::fetch(url, e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| WorkloadError::fetch(url, e.to_string()))?;

        Ok(body.len() as u64)
    }
}
