//! Core abstractions for the Notion SDK
//!
//! This module provides the request/response pipeline and the pieces it is
//! built from:
//!
//! - `Transport`: performs one HTTP exchange, nothing more
//! - `HttpRequest` / `RawResponse`: the values exchanged with a transport
//! - `RequestContext`: per-call deadline and cancellation
//! - `Pipeline`: builds requests, delegates to a transport, classifies and
//!   decodes responses
//! - `ClientBuilder`: assembles a reqwest-backed pipeline

pub mod builder;
pub mod context;
pub mod pipeline;
pub mod transport;

pub use builder::ClientBuilder;
pub use context::{CancelHandle, RequestContext};
pub use pipeline::Pipeline;
pub use transport::ReqwestTransport;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::Method;
use url::Url;

use crate::error::BoxError;

/// Body of a raw response, read as a stream of chunks
pub type BodyStream = BoxStream<'static, std::result::Result<Bytes, BoxError>>;

/// Trait responsible for performing a single HTTP exchange.
///
/// Implementations must not interpret status codes: any response received
/// from the peer is returned as-is. Implementations are shared across tasks
/// and must be safe for concurrent use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request, returning the raw response or the connectivity failure
    async fn send(&self, request: HttpRequest) -> std::result::Result<RawResponse, BoxError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> std::result::Result<RawResponse, BoxError> {
        (**self).send(request).await
    }
}

/// A fully built outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A response as handed back by a transport.
///
/// The body can be read exactly once: [`RawResponse::into_body`] consumes the
/// response, and dropping it releases the underlying connection.
pub struct RawResponse {
    status: u16,
    headers: HeaderMap,
    body: BodyStream,
}

impl RawResponse {
    /// Create a response from a status code and a body stream
    pub fn new(status: u16, body: BodyStream) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Create a response whose body is already in memory
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self::new(status, stream::once(async move { Ok(body) }).boxed())
    }

    /// Attach response headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Read the whole body, consuming the response
    pub async fn into_body(self) -> std::result::Result<Bytes, BoxError> {
        let mut body = self.body;
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
