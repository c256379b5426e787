//! Error types for Nilufar

use thiserror::Error;

/// Failure category for a DeepSeek analysis call
///
/// Classified from the HTTP status or transport error so callers can show a
/// remediation message matching the actual problem instead of a generic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisErrorKind {
    /// Invalid, expired, or unconfigured API key (401)
    Auth,
    /// Key valid but lacks permission (403)
    Forbidden,
    /// Connection-level failure (DNS, refused, reset)
    Network,
    /// Request exceeded the configured timeout, retries exhausted
    Timeout,
    /// Account quota or rate limit hit (429)
    Quota,
    /// Anything else (5xx, malformed response, empty completion)
    Other,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation detected in application code (duplicate
    /// category name or username)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Row still referenced by expense records and cannot be deleted
    #[error("In use: {0}")]
    InUse(String),

    /// Credential re-verification failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Policy refusal (e.g. deleting the admin account)
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// DeepSeek analysis failure with a user-facing remediation message
    #[error("{message}")]
    Analysis {
        kind: AnalysisErrorKind,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
