//! Error types for the repset_core library.
//!
//! Only the edges of a session can fail: loading config, fetching and
//! validating a plan, constructing the controller, and the completion log.
//! Controller operations on a running session never return an error; a
//! stale or out-of-order event is a logged no-op instead.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for repset_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested plan does not exist in any source
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    /// Plan failed validation
    #[error("Plan validation error: {0}")]
    PlanValidation(String),

    /// Session could not be constructed (empty plan, zero duration fallback)
    #[error("Session error: {0}")]
    Session(String),

    /// Completion reporter failure; logged by the dispatcher, never shown
    /// to the user
    #[error("Reporter error: {0}")]
    Reporter(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
