//! HTTP client for the FRA API.

use anyhow::{Context, Result};
use fra_core::constants::DEFAULT_API_VERSION;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// API version prefix (e.g. "/api/v1"). Set FRA_API_VERSION to match the server.
pub fn api_prefix() -> String {
    let version =
        std::env::var("FRA_API_VERSION").unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());
    fra_core::constants::api_prefix(&version)
}

/// HTTP client bound to one API base URL and version prefix.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_prefix: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_prefix: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_prefix: api_prefix.into(),
        })
    }

    /// Create client from environment: FRA_API_URL (default http://localhost:5000) and
    /// FRA_API_VERSION (default v1).
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("FRA_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self::new(base_url, api_prefix())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Full URL of the ingest endpoint.
    pub fn upload_url(&self) -> String {
        self.build_url(&format!("{}/upload", self.api_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_upload_url() {
        let client = ApiClient::new("http://localhost:5000/", "/api/v1").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.upload_url(), "http://localhost:5000/api/v1/upload");
        assert_eq!(client.build_url("/health"), "http://localhost:5000/health");
    }
}
