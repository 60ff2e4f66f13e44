//! Error taxonomy for the Jobo API client and the status-code translator.
//!
//! # Design
//! Every non-2xx response maps to exactly one of five HTTP kinds, chosen by
//! status code alone. Each carries an `ApiErrorBody` with the numeric status,
//! a human-readable detail, and the raw body. The remaining variants are
//! client-side failures that never came from an HTTP status: bad parameters,
//! bad configuration, unparseable bodies, and transport faults.

use serde_json::Value;
use thiserror::Error;

use crate::http::HttpResponse;

/// Status, detail, and raw body of a failed API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub status: u16,
    pub detail: String,
    pub body: String,
}

impl ApiErrorBody {
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            detail: extract_detail(response.status, &response.body),
            body: response.body.clone(),
        }
    }
}

/// Errors returned by every `JoboApi` parse method and by the SDK surfaces.
#[derive(Debug, Error)]
pub enum JoboError {
    /// 401: the API key is missing or invalid.
    #[error("authentication failed (HTTP {}): {}", .0.status, .0.detail)]
    Authentication(ApiErrorBody),

    /// 429: too many requests. `retry_after` comes from the `Retry-After` header.
    #[error("rate limit exceeded (HTTP {}): {}", .response.status, .response.detail)]
    RateLimit {
        response: ApiErrorBody,
        retry_after: Option<u64>,
    },

    /// 400: the server rejected the request parameters.
    #[error("invalid request (HTTP {}): {}", .0.status, .0.detail)]
    Validation(ApiErrorBody),

    /// 5xx.
    #[error("server error (HTTP {}): {}", .0.status, .0.detail)]
    Server(ApiErrorBody),

    /// Any other non-2xx status.
    #[error("API error (HTTP {}): {}", .0.status, .0.detail)]
    Api(ApiErrorBody),

    /// A 2xx body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A request parameter failed client-side validation; nothing was sent.
    #[error("invalid request parameter: {0}")]
    InvalidRequest(String),

    /// Client configuration is unusable (missing key, bad base URL, ...).
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl JoboError {
    /// Translate a failed response into its error kind.
    ///
    /// Callers are expected to check `is_success()` first; a 2xx response
    /// passed here still lands in `Api`.
    pub fn from_response(response: &HttpResponse) -> Self {
        let body = ApiErrorBody::from_response(response);
        match response.status {
            401 => JoboError::Authentication(body),
            429 => JoboError::RateLimit {
                retry_after: response.header("retry-after").and_then(parse_retry_after),
                response: body,
            },
            400 => JoboError::Validation(body),
            status if status >= 500 => JoboError::Server(body),
            _ => JoboError::Api(body),
        }
    }

    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        JoboError::Transport(Box::new(err))
    }

    fn api_body(&self) -> Option<&ApiErrorBody> {
        match self {
            JoboError::Authentication(body)
            | JoboError::Validation(body)
            | JoboError::Server(body)
            | JoboError::Api(body) => Some(body),
            JoboError::RateLimit { response, .. } => Some(response),
            _ => None,
        }
    }

    /// HTTP status for errors translated from a response.
    pub fn status(&self) -> Option<u16> {
        self.api_body().map(|body| body.status)
    }

    pub fn detail(&self) -> Option<&str> {
        self.api_body().map(|body| body.detail.as_str())
    }

    pub fn raw_body(&self) -> Option<&str> {
        self.api_body().map(|body| body.body.as_str())
    }

    /// Seconds the server asked us to wait, for rate-limit errors.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            JoboError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Whether repeating the same call later may succeed. The client itself
    /// never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JoboError::RateLimit { .. } | JoboError::Server(_) | JoboError::Transport(_)
        )
    }
}

fn extract_detail(status: u16, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(Value::Null) | None => fallback_detail(status, body),
            Some(other) => other.to_string(),
        },
        _ => fallback_detail(status, body),
    }
}

fn fallback_detail(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

fn parse_retry_after(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}
