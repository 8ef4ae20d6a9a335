//! Application error types.

use thiserror::Error;

/// Application-level errors for hostsync.
#[derive(Error, Debug)]
pub enum AppError {
    // Transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Graph store errors
    #[error("Graph query error: {message}")]
    Query { message: String, query: String },

    #[error("Bulk upload failed during {stage}: {message}")]
    Upload { stage: &'static str, message: String },

    #[error("Authentication rejected by {service} (HTTP {status})")]
    Unauthorized { service: &'static str, status: u16 },

    // Per-host errors
    #[error("Failed to resolve {host}: {message}")]
    Resolve { host: String, message: String },

    #[error("Shodan has no information for {0}")]
    NoIntel(String),

    #[error("Shodan rate limit exceeded")]
    RateLimited,

    #[error("Shodan request failed (HTTP {status}): {message}")]
    Intel { status: u16, message: String },

    #[error("Certificate fetch failed for {host}: {message}")]
    Certificate { host: String, message: String },

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}
