//! Cross-cutting error types for xblive.
//!
//! Network and orchestration errors live in `xbl-auth`; this module only
//! covers failures that can happen while building or decoding core values.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A persisted token carried a kind tag that is not one of the six known kinds.
    #[error("Unknown token kind: {0}")]
    UnknownTokenKind(String),

    /// A timestamp could not be parsed as ISO 8601.
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// A provider-supplied lifetime does not fit in a timestamp.
    #[error("Token lifetime of {0}s is out of range")]
    LifetimeOutOfRange(i64),

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
