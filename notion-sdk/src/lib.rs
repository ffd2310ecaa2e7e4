//! # Notion SDK
//!
//! A typed client for the Notion REST API.
//!
//! This crate provides:
//!
//! - A generic request/response pipeline over an injectable transport
//! - A three-way error classification (local, transport, application)
//! - Typed Notion clients for databases, pages and queries
//! - Configuration management utilities
//!
//! ## Architecture
//!
//! - `Transport`: performs one HTTP exchange; `ReqwestTransport` in production
//! - `Pipeline`: builds requests, delegates to a transport, classifies and
//!   decodes responses
//! - `ClientError`: where in the call lifecycle a failure happened
//! - `NotionClient`: endpoint functions built on `Pipeline::execute`

// Re-export core modules
pub mod core;
pub use self::core::{
    CancelHandle, ClientBuilder, HttpRequest, Pipeline, RawResponse, RequestContext,
    ReqwestTransport, Transport,
};

// Re-export service-specific modules
pub mod services;
pub use services::notion;

// Re-export error handling
pub mod error;
pub use error::{BoxError, ClientError, ConfigError, ErrorKind, TransportFailure};

// Re-export configuration management
pub mod config;
pub use config::{ConfigProvider, NotionConfig, ServiceConfig};

// Utility module for common functionality
mod util;

#[cfg(test)]
mod tests;

/// Create a new default pipeline builder
pub fn client() -> ClientBuilder {
    ClientBuilder::new()
}

/// Create a Notion client builder, reading unset values from the environment
pub fn notion_client() -> notion::NotionClientBuilder {
    notion::NotionClient::builder()
}
