//! Failure classification and retry policy for provider HTTP calls.
//!
//! Distinguishes transient failures (retried with backoff) from permanent
//! ones, and maps whatever is left after retries onto [`AppError`] so the
//! research stages can tell quota exhaustion apart from service errors.

use crate::types::AppError;
use std::time::Duration;

/// Maximum length of a provider error body carried into messages
const MAX_ERROR_CONTENT_LEN: usize = 300;

/// Classification of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 429 or `RESOURCE_EXHAUSTED` - transient
    RateLimited,
    /// HTTP 5xx - transient
    ServerError,
    /// HTTP 4xx other than 429 - permanent
    ClientError,
    /// Connection failure or timeout - transient
    NetworkError,
    /// Response body could not be decoded - permanent
    ParseError,
}

impl FailureKind {
    /// Check if this failure kind should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureKind::RateLimited | FailureKind::ServerError | FailureKind::NetworkError
        )
    }
}

/// A single failed provider call.
#[derive(Debug, Clone)]
pub struct ApiFailure {
    pub kind: FailureKind,
    pub status_code: Option<u16>,
    pub message: String,
    /// Delay requested by the server through `Retry-After`
    pub retry_after: Option<Duration>,
}

impl ApiFailure {
    /// Build a failure from a non-success HTTP response.
    ///
    /// Google APIs report quota exhaustion as `"status": "RESOURCE_EXHAUSTED"`
    /// in the error body, which is honoured even when the status code differs.
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let error = parsed.as_ref().and_then(|v| v.get("error"));

        let api_status = error
            .and_then(|e| e.get("status"))
            .and_then(|s| s.as_str())
            .unwrap_or_default();
        let message = error
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| truncate(body, MAX_ERROR_CONTENT_LEN));

        let kind = if api_status == "RESOURCE_EXHAUSTED" {
            FailureKind::RateLimited
        } else {
            classify_http_status(status)
        };

        Self {
            kind,
            status_code: Some(status),
            message,
            retry_after,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::NetworkError,
            status_code: None,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::ParseError,
            status_code: None,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "HTTP {}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<ApiFailure> for AppError {
    fn from(failure: ApiFailure) -> Self {
        match failure.kind {
            FailureKind::RateLimited => AppError::Quota(failure.to_string()),
            FailureKind::ServerError | FailureKind::ClientError => {
                AppError::LLM(failure.to_string())
            }
            FailureKind::NetworkError | FailureKind::ParseError => {
                AppError::Internal(failure.to_string())
            }
        }
    }
}

/// Map an HTTP status code onto a failure kind.
pub fn classify_http_status(status: u16) -> FailureKind {
    match status {
        429 => FailureKind::RateLimited,
        400..=499 => FailureKind::ClientError,
        _ => FailureKind::ServerError,
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Whether `failure` on attempt `attempt` (0-based) warrants another try.
    pub fn should_retry(&self, failure: &ApiFailure, attempt: u32) -> bool {
        failure.is_transient() && attempt < self.max_retries
    }

    /// Delay before the retry following attempt `attempt`.
    pub fn delay_for(&self, failure: &ApiFailure, attempt: u32) -> Duration {
        if let Some(retry_after) = failure.retry_after {
            return retry_after.min(self.max_delay);
        }

        let multiplier = 2u32.saturating_pow(attempt);
        let base = match failure.kind {
            // Quota windows reset slowly
            FailureKind::RateLimited => self.base_delay.saturating_mul(4),
            _ => self.base_delay,
        };
        base.saturating_mul(multiplier).min(self.max_delay)
    }
}

fn truncate(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
