//! Error types for Vela Core

use thiserror::Error;

use crate::types::DeliveryMethod;

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, Error>;

/// Resolution error types
#[derive(Error, Debug)]
pub enum Error {
    // Catalog errors
    #[error("empty or malformed content locator for {delivery} stream (provider {provider}, format {format_id})")]
    EmptyContent {
        provider: String,
        delivery: DeliveryMethod,
        format_id: i32,
    },

    #[error("no delivery strategy for {delivery} stream (provider {provider}, stream type {stream_type})")]
    UnsupportedDelivery {
        provider: String,
        delivery: DeliveryMethod,
        stream_type: String,
    },

    // Manifest synthesis errors
    #[error("manifest synthesis failed: {0}")]
    ManifestCreation(String),

    #[error("stream carries no format profile, cannot synthesize a manifest (format {format_id})")]
    MissingProfile { format_id: i32 },

    // Manifest parse errors
    #[error("failed to parse {kind} manifest: {reason}")]
    ManifestParse { kind: &'static str, reason: String },

    // Download index errors
    #[error("local download lookup timed out after {timeout_ms}ms for {content_id}")]
    LookupTimeout { content_id: String, timeout_ms: u64 },

    // Internal errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a synthesis precondition failure
    pub fn creation(msg: impl Into<String>) -> Self {
        Error::ManifestCreation(msg.into())
    }

    /// Returns true if resolution may continue past this error.
    ///
    /// Recoverable errors are appended to the plan's metadata tag; the
    /// remaining streams of the content item are still attempted.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ManifestCreation(_)
                | Error::ManifestParse { .. }
                | Error::LookupTimeout { .. }
        )
    }

    /// Returns the error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::EmptyContent { .. } => "EMPTY_CONTENT",
            Error::UnsupportedDelivery { .. } => "UNSUPPORTED_DELIVERY",
            Error::ManifestCreation(_) => "MANIFEST_CREATE",
            Error::MissingProfile { .. } => "MISSING_PROFILE",
            Error::ManifestParse { .. } => "MANIFEST_PARSE",
            Error::LookupTimeout { .. } => "LOOKUP_TIMEOUT",
            Error::Io(_) => "IO",
        }
    }
}
