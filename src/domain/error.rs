//! # Error Taxonomy
//!
//! Failure classes mirror how they are handled: configuration errors stop
//! startup, session errors force a long-poll re-acquisition, transient errors
//! are retried with a fixed backoff, and catalog errors become apologetic
//! replies without ever escalating.

use thiserror::Error;

/// A failed request to the booking/catalog service.
///
/// Covers transport failures, non-2xx statuses, and malformed bodies alike;
/// the caller only needs to know which operation failed and why.
#[derive(Debug, Clone, Error)]
#[error("catalog {operation} failed: {cause}")]
pub struct CatalogError {
    pub operation: &'static str,
    pub cause: String,
}

impl CatalogError {
    pub fn new(operation: &'static str, cause: impl ToString) -> Self {
        Self {
            operation,
            cause: cause.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BotError {
    /// Fatal; the bot refuses to start (missing credentials, unreadable config).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The long-poll session is invalid or expired; a full server/key/ts
    /// re-acquisition is required, retrying the fetch is pointless.
    #[error("long-poll session invalid: {0}")]
    Session(String),

    /// Network-level failure; retried with the fixed backoff, bounded only by
    /// cancellation.
    #[error("transient failure: {0}")]
    Transient(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// An outbound VK API call failed (send, keyboard encoding).
    #[error("vk api error: {0}")]
    Vk(String),
}

/// Severity attached to recorded errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Critical,
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Fatal => "FATAL",
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        }
    }
}
