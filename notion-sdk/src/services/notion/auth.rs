//! Authentication header injection for the Notion API

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};

use crate::core::{HttpRequest, RawResponse, Transport};
use crate::error::{BoxError, ConfigError};

/// Header carrying the API version
pub const NOTION_VERSION_HEADER: &str = "notion-version";

/// Transport decorator adding the bearer token and `Notion-Version` to every request
#[derive(Debug)]
pub struct AuthenticatedTransport<T> {
    inner: T,
    authorization: HeaderValue,
    version: HeaderValue,
}

impl<T: Transport> AuthenticatedTransport<T> {
    /// Wrap `inner`; fails if the token or version cannot be used as a header value
    pub fn new(inner: T, token: &str, version: &str) -> Result<Self, ConfigError> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ConfigError::invalid("notion_api_token", e))?;
        authorization.set_sensitive(true);

        let version = HeaderValue::from_str(version)
            .map_err(|e| ConfigError::invalid("notion_version", e))?;

        Ok(Self {
            inner,
            authorization,
            version,
        })
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for AuthenticatedTransport<T> {
    async fn send(&self, mut request: HttpRequest) -> Result<RawResponse, BoxError> {
        request
            .headers
            .insert(AUTHORIZATION, self.authorization.clone());
        request
            .headers
            .insert(HeaderName::from_static(NOTION_VERSION_HEADER), self.version.clone());

        self.inner.send(request).await
    }
}
