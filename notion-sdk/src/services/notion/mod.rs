//! Notion API client implementation
//!
//! This module provides a strongly-typed client for the Notion API databases
//! and pages endpoints, built on [`Pipeline::execute`].

mod auth;
mod error;
mod models;

pub use auth::{AuthenticatedTransport, NOTION_VERSION_HEADER};
pub use error::{ApiErrorCode, ApiServerError, NotionError};
pub use models::*;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{
    ConfigProvider, ConfigProviderExt, NotionConfig, ServiceConfig, DEFAULT_PROVIDER,
};
use crate::core::{ClientBuilder, Pipeline, RequestContext, Transport};
use crate::error::mapping::classify_status;
use crate::error::{ClientError, ConfigError};
use crate::services::common::UserAgent;

/// Result type for Notion endpoint calls
pub type Result<T> = std::result::Result<T, NotionError>;

/// Notion API client
#[derive(Debug, Clone)]
pub struct NotionClient {
    pipeline: Pipeline,
}

impl NotionClient {
    /// Create a client for `token` with default settings
    pub fn new(token: impl Into<String>) -> std::result::Result<Self, ConfigError> {
        Self::new_with_config(&NotionConfig::with_token(token))
    }

    /// Create a client from environment configuration (`NOTION_API_TOKEN`, ...)
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::new_with_config(&NotionConfig::from_provider(&**DEFAULT_PROVIDER)?)
    }

    /// Create a client from explicit configuration
    pub fn new_with_config(config: &NotionConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let transport = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(UserAgent::for_service("notion").to_string())
            .build_transport()?;

        Self::with_transport(transport, config)
    }

    /// Create a client sending authenticated requests through `transport`
    pub fn with_transport<T>(transport: T, config: &NotionConfig) -> std::result::Result<Self, ConfigError>
    where
        T: Transport + 'static,
    {
        config.validate()?;

        let transport =
            AuthenticatedTransport::new(transport, &config.api_token, &config.notion_version)?;
        let pipeline = ClientBuilder::new()
            .base_url(config.base_url.clone())
            .build_with_transport(Arc::new(transport))?;

        Ok(Self { pipeline })
    }

    /// Create a client over a ready pipeline; the pipeline's transport must authenticate
    pub fn from_pipeline(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Create a new builder for the Notion client
    pub fn builder() -> NotionClientBuilder {
        NotionClientBuilder::default()
    }

    /// The underlying pipeline, for endpoints this client does not wrap
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Retrieve a database by id.
    ///
    /// See <https://developers.notion.com/reference/get-database>
    pub async fn retrieve_database(&self, database_id: &str) -> Result<Database> {
        self.retrieve_database_with_context(&RequestContext::background(), database_id)
            .await
    }

    pub async fn retrieve_database_with_context(
        &self,
        ctx: &RequestContext,
        database_id: &str,
    ) -> Result<Database> {
        let path = format!("/databases/{}", database_id);
        self.call(ctx, "GET", &path, None, None::<&()>).await
    }

    /// List all databases shared with the integration, one page at a time.
    ///
    /// See <https://developers.notion.com/reference/get-databases>
    pub async fn list_databases(&self, page: &Pagination) -> Result<DatabaseList> {
        self.list_databases_with_context(&RequestContext::background(), page)
            .await
    }

    pub async fn list_databases_with_context(
        &self,
        ctx: &RequestContext,
        page: &Pagination,
    ) -> Result<DatabaseList> {
        let query = page.query();
        self.call(ctx, "GET", "/databases", Some(&query), None::<&()>)
            .await
    }

    /// Query the pages of a database with optional filter, sorts and pagination.
    ///
    /// See <https://developers.notion.com/reference/post-database-query>
    pub async fn query_database(&self, database_id: &str, query: &DatabaseQuery) -> Result<PageList> {
        self.query_database_with_context(&RequestContext::background(), database_id, query)
            .await
    }

    pub async fn query_database_with_context(
        &self,
        ctx: &RequestContext,
        database_id: &str,
        query: &DatabaseQuery,
    ) -> Result<PageList> {
        let path = format!("/databases/{}/query", database_id);
        self.call(ctx, "POST", &path, None, Some(query)).await
    }

    async fn call<B, T>(
        &self,
        ctx: &RequestContext,
        method: &str,
        path: &str,
        query: Option<&HashMap<String, String>>,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!("Notion request: {} {}", method, path);

        self.pipeline
            .execute::<B, T, ApiServerError>(ctx, method, path, query, body)
            .await
            .map_err(|err| match err {
                ClientError::Application { status, mut failure } => {
                    failure.http_status_code = status;
                    warn!(
                        "Notion API error on {} {}: {} ({})",
                        method,
                        path,
                        failure,
                        classify_status(status)
                    );
                    ClientError::Application { status, failure }
                }
                other => {
                    warn!("Notion request {} {} failed: {}", method, path, other);
                    other
                }
            })
    }
}

/// Builder for the Notion client
#[derive(Default)]
pub struct NotionClientBuilder {
    /// Integration token
    api_token: Option<String>,

    /// Root URL for the API
    base_url: Option<String>,

    /// `Notion-Version` header value
    notion_version: Option<String>,

    /// Request timeout
    timeout: Option<Duration>,

    /// Transport replacing the default reqwest one
    transport: Option<Arc<dyn Transport>>,

    /// Source of values not set explicitly; the environment when unset
    provider: Option<Arc<dyn ConfigProvider>>,
}

impl NotionClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the integration token
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the root URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the `Notion-Version` header value
    pub fn notion_version(mut self, version: impl Into<String>) -> Self {
        self.notion_version = Some(version.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a custom transport; authentication headers are still added
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Read unset values from `provider` instead of the environment
    pub fn config_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Build the Notion client.
    ///
    /// Values not set explicitly come from the environment, then from defaults.
    /// Each key is read on its own; a key that was set explicitly is never read.
    pub fn build(self) -> std::result::Result<NotionClient, ConfigError> {
        let provider: Arc<dyn ConfigProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::clone(&*DEFAULT_PROVIDER) as Arc<dyn ConfigProvider>,
        };
        let defaults = NotionConfig::default();

        let api_token = match self.api_token {
            Some(api_token) => api_token,
            None => provider.get_string_or("notion_api_token", "")?,
        };

        let base_url = match self.base_url {
            Some(base_url) => base_url,
            None => provider.get_string_or("notion_base_url", &defaults.base_url)?,
        };

        let notion_version = match self.notion_version {
            Some(version) => version,
            None => provider.get_string_or("notion_version", &defaults.notion_version)?,
        };

        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => provider.get_duration_or("notion_timeout", defaults.timeout)?,
        };

        let config = NotionConfig {
            api_token,
            base_url,
            notion_version,
            timeout,
        };

        match self.transport {
            Some(transport) => NotionClient::with_transport(transport, &config),
            None => NotionClient::new_with_config(&config),
        }
    }
}
