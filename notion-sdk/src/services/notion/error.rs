//! Notion API error payload
//!
//! See <https://developers.notion.com/reference/errors>

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::mapping::classify_status;
use crate::error::ClientError;

/// Error classified by the Notion client; application failures carry an [`ApiServerError`]
pub type NotionError = ClientError<ApiServerError>;

/// Error body returned by the Notion API server.
///
/// `http_status_code` is not part of the body; the client fills it from the
/// response status, so it is set even when the body could not be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiServerError {
    #[serde(skip)]
    pub http_status_code: u16,

    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub message: String,
}

impl ApiServerError {
    /// Parsed form of [`ApiServerError::code`]
    pub fn error_code(&self) -> ApiErrorCode {
        ApiErrorCode::from_code(&self.code)
    }

    /// Coarse category of the HTTP status, e.g. "rate_limit"
    pub fn category(&self) -> &'static str {
        classify_status(self.http_status_code)
    }
}

impl fmt::Display for ApiServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.http_status_code, self.code, self.message)
    }
}

impl std::error::Error for ApiServerError {}

/// Error codes documented by the Notion API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApiErrorCode {
    InvalidJson,
    InvalidRequestUrl,
    InvalidRequest,
    ValidationError,
    MissingVersion,
    Unauthorized,
    RestrictedResource,
    ObjectNotFound,
    ConflictError,
    RateLimited,
    InternalServerError,
    ServiceUnavailable,
    /// Empty when the body was not a Notion error object
    Other(String),
}

impl ApiErrorCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "invalid_json" => ApiErrorCode::InvalidJson,
            "invalid_request_url" => ApiErrorCode::InvalidRequestUrl,
            "invalid_request" => ApiErrorCode::InvalidRequest,
            "validation_error" => ApiErrorCode::ValidationError,
            "missing_version" => ApiErrorCode::MissingVersion,
            "unauthorized" => ApiErrorCode::Unauthorized,
            "restricted_resource" => ApiErrorCode::RestrictedResource,
            "object_not_found" => ApiErrorCode::ObjectNotFound,
            "conflict_error" => ApiErrorCode::ConflictError,
            "rate_limited" => ApiErrorCode::RateLimited,
            "internal_server_error" => ApiErrorCode::InternalServerError,
            "service_unavailable" => ApiErrorCode::ServiceUnavailable,
            other => ApiErrorCode::Other(other.to_string()),
        }
    }
}
