//! Client builder implementation
//!
//! Assembles a reqwest-backed [`Pipeline`] from a root URL and HTTP client
//! settings.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client as ReqwestClient;

use super::{Pipeline, ReqwestTransport, Transport};
use crate::error::ConfigError;
use crate::services::UserAgent;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for a pipeline over the reqwest transport
pub struct ClientBuilder {
    /// Root URL every request path is appended to
    base_url: Option<String>,

    /// Custom headers to include with all requests
    custom_headers: HashMap<String, String>,

    /// Request timeout
    timeout: Option<Duration>,

    /// User agent
    user_agent: Option<String>,

    /// Enable response decompression
    compression: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            custom_headers: HashMap::new(),
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: Some(UserAgent::default().to_string()),
            compression: true,
        }
    }
}

impl ClientBuilder {
    /// Create a new client builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root URL for the service
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Add a header sent with every request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(key.into(), value.into());
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the client-level timeout; use a `RequestContext` deadline instead
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Enable or disable gzip decompression
    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Build an HTTP client with the configured settings
    pub fn build_http_client(&self) -> Result<ReqwestClient, ConfigError> {
        let mut builder = ReqwestClient::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(ref user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        builder = builder.gzip(self.compression);

        let mut headers = HeaderMap::new();
        for (key, value) in &self.custom_headers {
            let header_name = HeaderName::from_str(key)
                .map_err(|e| ConfigError::invalid("header name", format!("{}: {}", key, e)))?;

            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ConfigError::invalid("header value", format!("{}: {}", key, e)))?;

            headers.insert(header_name, header_value);
        }

        builder = builder.default_headers(headers);

        builder
            .build()
            .map_err(|e| ConfigError::invalid("http client", e))
    }

    /// Build the reqwest transport
    pub fn build_transport(&self) -> Result<ReqwestTransport, ConfigError> {
        Ok(ReqwestTransport::new(self.build_http_client()?))
    }

    /// Build a pipeline over the reqwest transport
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        let transport = self.build_transport()?;
        self.build_with_transport(Arc::new(transport))
    }

    /// Build a pipeline over a caller-supplied transport, keeping only the root URL
    pub fn build_with_transport(self, transport: Arc<dyn Transport>) -> Result<Pipeline, ConfigError> {
        let base_url = self
            .base_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::missing("base_url"))?;

        debug!("Building pipeline for {}", base_url);
        Ok(Pipeline::new(transport, base_url))
    }
}
