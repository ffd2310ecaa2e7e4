//! Request/response pipeline
//!
//! `Pipeline::execute` is the single entry point resource clients use. It
//! turns a (method, path, query, body) tuple into an [`HttpRequest`], hands it
//! to the injected [`Transport`], and classifies the outcome:
//!
//! - status `<= 300`: the body is decoded into the success type `S`; a decode
//!   failure is a local error
//! - status `> 300`: the body is decoded into the failure type `F` on a best
//!   effort basis (falling back to `F::default()`), and an application error
//!   carrying it is returned
//! - no response: transport error naming the attempted URL

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use log::{debug, warn};
use url::Url;

use super::{HttpRequest, RequestContext, Transport};
use crate::error::mapping::is_success_status;
use crate::error::{BoxError, ClientError};
use crate::util::{generate_request_id, sanitize_for_logging, truncate_string};

/// Longest body excerpt included in logs
const LOGGED_BODY_LIMIT: usize = 200;

/// Stateless request pipeline over an injected transport.
///
/// Cloning is cheap and clones share the transport.
#[derive(Clone)]
pub struct Pipeline {
    root_url: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("root_url", &self.root_url)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline sending requests to `root_url` + path through `transport`
    pub fn new(transport: Arc<dyn Transport>, root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            transport,
        }
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// Issue a request and decode the response.
    ///
    /// Returns the decoded success value, or a [`ClientError`] classified as
    /// local, transport or application failure. Nothing is retried.
    pub async fn execute<B, S, F>(
        &self,
        ctx: &RequestContext,
        method: &str,
        path: &str,
        query: Option<&HashMap<String, String>>,
        body: Option<&B>,
    ) -> Result<S, ClientError<F>>
    where
        B: Serialize + Sync + ?Sized,
        S: DeserializeOwned,
        F: DeserializeOwned + Default,
    {
        let request = self.build_request::<B, F>(method, path, query, body)?;
        let url = request.url.to_string();
        let request_id = generate_request_id();

        debug!(
            "[{}] Sending {} {}",
            request_id,
            request.method,
            sanitize_for_logging(&url)
        );

        let start = Instant::now();
        let transport = &self.transport;
        let exchange = async move {
            let response = transport.send(request).await?;
            let status = response.status();
            let body = response.into_body().await;
            Ok::<_, BoxError>((status, body))
        };

        let (status, body) = match ctx.run(exchange).await {
            Ok(Ok(received)) => received,
            Ok(Err(source)) => {
                debug!("[{}] Transport failure: {}", request_id, source);
                return Err(ClientError::transport(url, source));
            }
            Err(aborted) => {
                debug!("[{}] Exchange aborted: {}", request_id, aborted);
                return Err(ClientError::transport(url, aborted));
            }
        };

        debug!(
            "[{}] Received status {} in {}ms",
            request_id,
            status,
            start.elapsed().as_millis()
        );

        Self::classify(status, body)
    }

    /// Issue a request and write the decoded payload into caller-owned slots.
    ///
    /// On success only `success` is written; on an application failure only
    /// `failure` is written. Local and transport failures leave both untouched.
    /// The returned error still carries the classification and status.
    #[allow(clippy::too_many_arguments)]
    pub async fn execute_into<B, S, F>(
        &self,
        ctx: &RequestContext,
        method: &str,
        path: &str,
        query: Option<&HashMap<String, String>>,
        body: Option<&B>,
        success: &mut S,
        failure: &mut F,
    ) -> Result<(), ClientError<()>>
    where
        B: Serialize + Sync + ?Sized,
        S: DeserializeOwned,
        F: DeserializeOwned + Default,
    {
        match self.execute::<B, S, F>(ctx, method, path, query, body).await {
            Ok(value) => {
                *success = value;
                Ok(())
            }
            Err(err) => Err(err.map_failure(|decoded| *failure = decoded)),
        }
    }

    /// Build the outbound request without performing any I/O
    pub fn build_request<B, F>(
        &self,
        method: &str,
        path: &str,
        query: Option<&HashMap<String, String>>,
        body: Option<&B>,
    ) -> Result<HttpRequest, ClientError<F>>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(|value| serde_json::to_vec(value))
            .transpose()
            .map_err(|e| ClientError::<F>::local("failed to encode the body", e))?
            .map(Bytes::from);

        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| ClientError::<F>::local("failed to create the request", e))?;

        let mut url = Url::parse(&format!("{}{}", self.root_url, path))
            .map_err(|e| ClientError::<F>::local("failed to create the request", e))?;

        if let Some(query) = query.filter(|q| !q.is_empty()) {
            let mut keys: Vec<&String> = query.keys().collect();
            keys.sort();

            let mut pairs = url.query_pairs_mut();
            for key in keys {
                pairs.append_pair(key, &query[key]);
            }
        }

        let mut headers = HeaderMap::new();
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Branch on the status and decode the body into the matching shape
    fn classify<S, F>(status: u16, body: Result<Bytes, BoxError>) -> Result<S, ClientError<F>>
    where
        S: DeserializeOwned,
        F: DeserializeOwned + Default,
    {
        if is_success_status(status) {
            let bytes = body.map_err(|e| ClientError::<F>::local("can't read successful response", e))?;
            return serde_json::from_slice(&bytes)
                .map_err(|e| ClientError::local("can't decode successful response", e));
        }

        let failure = match body {
            Ok(bytes) => match serde_json::from_slice::<F>(&bytes) {
                Ok(failure) => failure,
                Err(e) => {
                    warn!(
                        "Can't decode failure response (status {}): {}; body: {}",
                        status,
                        e,
                        truncate_string(&String::from_utf8_lossy(&bytes), LOGGED_BODY_LIMIT)
                    );
                    F::default()
                }
            },
            Err(e) => {
                warn!("Can't read failure response (status {}): {}", status, e);
                F::default()
            }
        };

        Err(ClientError::Application { status, failure })
    }
}
