#![allow(dead_code)]

use thiserror::Error;

use crate::error_classifier::{self, ErrorInput};

/// Typed error hierarchy for the routing core.
///
/// Use at module boundaries (selector, tracker, retry handler, config loading).
/// Internal/leaf functions can continue using `anyhow::Result` — the `Internal`
/// variant allows seamless conversion via the `?` operator.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no candidate models for category {category}")]
    NoCandidates { category: String },

    #[error("context window exceeded: required {required} tokens with 20% margin exceeds window {window}")]
    ContextWindowExceeded { required: u64, window: u64 },

    #[error("all candidate models are rate limited")]
    AllRateLimited,

    #[error("no candidate model satisfies cost constraint")]
    CostConstraintUnmet,

    #[error("unknown selection strategy: {0}")]
    UnknownStrategy(String),

    #[error("rate limited")]
    RateLimited { retry_after: Option<u64> },

    #[error("authentication failed: {0}")]
    AuthError(String),

    #[error("server error: {status}")]
    ServerError { status: u16 },

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("client error: {status}")]
    ClientError { status: u16 },

    #[error("circuit open for provider {provider_id}")]
    CircuitOpen { provider_id: String },

    #[error("cancelled")]
    Cancelled,

    #[error("unknown error: {0}")]
    Unknown(String),

    #[error("{message}")]
    RetryExhausted {
        message: String,
        attempts: u32,
        error_history: Vec<String>,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience alias for results using GatewayError.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Whether this error is retryable by the Retry Handler, per the Error
    /// Classifier's table (§4.6). Delegates rather than keeping its own copy
    /// of the retryability table.
    pub fn is_retryable(&self) -> bool {
        match self.classifier_input() {
            Some(input) => error_classifier::classify(&input).retryable,
            None => false,
        }
    }

    /// Map to the shape the Error Classifier expects. Variants with no
    /// upstream-failure analogue (bad input, exhausted retries, cancellation,
    /// ...) aren't classifiable and are never retryable.
    fn classifier_input(&self) -> Option<ErrorInput> {
        match self {
            GatewayError::RateLimited { .. } => Some(ErrorInput {
                status: Some(429),
                network_code: None,
                message: self.to_string(),
            }),
            GatewayError::AuthError(_) => Some(ErrorInput {
                status: Some(401),
                network_code: None,
                message: self.to_string(),
            }),
            GatewayError::ServerError { status } => Some(ErrorInput {
                status: Some(*status),
                network_code: None,
                message: self.to_string(),
            }),
            GatewayError::ClientError { status } => Some(ErrorInput {
                status: Some(*status),
                network_code: None,
                message: self.to_string(),
            }),
            GatewayError::NetworkError(code) => Some(ErrorInput {
                status: None,
                network_code: Some(code.clone()),
                message: self.to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_window_exceeded_mentions_context_window() {
        let err = GatewayError::ContextWindowExceeded {
            required: 10_000,
            window: 8_192,
        };
        assert!(err.to_string().contains("context window"));
    }

    #[test]
    fn rate_limited_is_retryable() {
        let err = GatewayError::RateLimited {
            retry_after: Some(5),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn auth_error_not_retryable() {
        let err = GatewayError::AuthError("bad key".into());
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_error_retryable() {
        let err = GatewayError::ServerError { status: 503 };
        assert!(err.is_retryable());
    }

    #[test]
    fn internal_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("something broke");
        let err: GatewayError = anyhow_err.into();
        assert!(matches!(err, GatewayError::Internal(_)));
        assert!(!err.is_retryable());
    }
}
