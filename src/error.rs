//! Error types for the coach client.
//!
//! The `Display` text of each variant is what the terminal shows the user as
//! a blocking notice.

/// Top-level error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Please enter a user ID first.")]
    MissingIdentity,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Coach exchange failed: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Missing or malformed external configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Please enter a user ID before connecting Strava.")]
    MissingIdentity,

    #[error("Strava client ID is not configured (set STRAVA_CLIENT_ID).")]
    MissingClientId,

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// User input that fails the presence checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your weight or FTP.")]
    EmptyProfile,

    #[error("Please type a message first.")]
    EmptyTranscript,
}

/// Failure talking to the coaching backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExchangeError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("backend returned HTTP {status}")]
    Status { status: u16 },

    #[error("invalid reply from backend: {reason}")]
    InvalidReply { reason: String },
}

/// Rejections from the interaction gates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Connect your Strava account to start chatting.")]
    NotLinked,

    #[error("Your coach is still answering. Please wait.")]
    ExchangeInFlight,
}

/// Durable key-value store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
