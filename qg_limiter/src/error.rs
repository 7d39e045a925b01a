use std::time::Duration;

use thiserror::Error;

/// Result type for admission operations
pub type Result<T> = std::result::Result<T, AdmissionError>;

/// Errors returned by the admission gate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// Caller bug: a block size of zero (or otherwise malformed request)
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Gate construction rejected the configuration
    #[error("invalid gate configuration: {0}")]
    InvalidConfig(&'static str),

    /// Every candidate lacked headroom for the requested block.
    ///
    /// `retry_in` is the time until the nearest ceiling-viable tier's short
    /// window resets, so callers can back off instead of busy-polling. It is
    /// `None` when no tier's ceiling could ever satisfy the request.
    #[error("quota exhausted on all candidates (retry_in: {retry_in:?})")]
    QuotaExhausted { retry_in: Option<Duration> },

    /// The candidate search came up empty: the pool has no credential left
    /// in rotation. Configuration problem, escalate to the operator.
    #[error("no credentials available in the pool")]
    NoCredentialsAvailable,

    /// Outcome recorded against an id the pool has never seen. Programming
    /// error on the caller side; silent loss of accounting is never allowed.
    #[error("unknown credential id: {0}")]
    UnknownCredential(String),
}
