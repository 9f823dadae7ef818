//! Error types for rlens-core.

use thiserror::Error;

/// Result type alias using rlens-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for rlens operations
#[derive(Error, Debug)]
pub enum Error {
    // Repository metadata errors
    #[error("Repository lookup failed for {owner}/{repo}: {message}")]
    RepositoryLookup {
        owner: String,
        repo: String,
        message: String,
    },

    #[error("Invalid repository descriptor: {0}")]
    InvalidDescriptor(String),

    // Generation service errors
    #[error("Generation API key not configured. Set RLENS_GENERATION_API_KEY or add it to config.toml.")]
    MissingApiKey,

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Generation request failed: {0}")]
    Generation(String),

    // Transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Payload errors
    #[error("Unexpected response payload: {0}")]
    Decode(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a rate-limit signal from an external service.
    ///
    /// Recognizes an explicit 429 as well as error messages mentioning
    /// "quota" or "rate limit", so backoff is applied only when warranted.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Error::RateLimited(_) => true,
            Error::Http(err) => err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS),
            Error::Generation(message) => {
                let message = message.to_lowercase();
                message.contains("quota") || message.contains("rate limit")
            }
            _ => false,
        }
    }
}
