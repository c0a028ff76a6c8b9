use std::fmt;
use thiserror::Error;

/// Configuration problem detected before any work starts (missing API key,
/// no quiz files, invalid flag combination). Fatal at the CLI boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Errors from a single chat-completion round-trip.
///
/// The dispatch runner matches on these to decide between backoff, a fixed
/// gateway wait, or giving up on the row.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("rate limit exceeded (status 429): {0}")]
    RateLimited(String),

    #[error("API quota exceeded (status 402): {0}")]
    QuotaExceeded(String),

    #[error("invalid API key (status 401): {0}")]
    Unauthorized(String),

    #[error("content flagged by moderation: {0}")]
    Moderation(String),

    #[error("input exceeds model context length: {0}")]
    ContextLength(String),

    #[error("provider unavailable (status 502): {0}")]
    ProviderUnavailable(String),

    #[error("gateway timeout (status 504): {0}")]
    GatewayTimeout(String),

    #[error("unhandled API error (status {status}): {message}")]
    Unhandled { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// How the runner reacts to a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Exponential backoff with jitter, bounded retry budget.
    Backoff,
    /// Fixed wait, retried without limit.
    GatewayWait,
    /// Give up on this row.
    Permanent,
}

impl ProviderError {
    pub fn retry_class(&self) -> RetryClass {
        match self {
            ProviderError::RateLimited(_) | ProviderError::Transport(_) => RetryClass::Backoff,
            ProviderError::ProviderUnavailable(_) | ProviderError::GatewayTimeout(_) => {
                RetryClass::GatewayWait
            }
            ProviderError::QuotaExceeded(_)
            | ProviderError::Unauthorized(_)
            | ProviderError::Moderation(_)
            | ProviderError::ContextLength(_)
            | ProviderError::Unhandled { .. }
            | ProviderError::Decode(_) => RetryClass::Permanent,
        }
    }

    /// Maps a non-success HTTP status plus the API's error message to a variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => ProviderError::RateLimited(message),
            402 => ProviderError::QuotaExceeded(message),
            401 => ProviderError::Unauthorized(message),
            400 => {
                let lower = message.to_lowercase();
                if lower.contains("moderation") {
                    ProviderError::Moderation(message)
                } else if lower.contains("context_length") {
                    ProviderError::ContextLength(message)
                } else {
                    ProviderError::Unhandled { status, message }
                }
            }
            502 => ProviderError::ProviderUnavailable(message),
            504 => ProviderError::GatewayTimeout(message),
            _ => ProviderError::Unhandled { status, message },
        }
    }
}
