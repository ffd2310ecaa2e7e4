//! reqwest-backed transport

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;

use super::{HttpRequest, RawResponse, Transport};
use crate::error::BoxError;

/// Production transport performing exchanges with a shared `reqwest::Client`.
///
/// Redirects, timeouts and default headers follow the client's own settings;
/// see [`crate::core::ClientBuilder`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, BoxError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map_err(|e| Box::new(e) as BoxError)
            .boxed();

        Ok(RawResponse::new(status, body).with_headers(headers))
    }
}
