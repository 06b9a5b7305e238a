//! Transfer error types used for retry classification.

use std::time::Duration;
use thiserror::Error;

/// Error produced by a single transfer attempt, or surfaced by the retry
/// loop as the final failure once the attempt budget is spent.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Server answered outside the 2xx success band. 1xx/3xx/4xx responses
    /// are protocol-level failures a retry cannot fix; 5xx is retryable.
    /// `body` holds a decoded diagnostic snippet of the error response, if any.
    #[error("Failed to {what}, response: {status} {reason}, body: {}", .body.as_deref().unwrap_or("(none)"))]
    Status {
        /// Verbose operation description, e.g. "download https://… to /tmp/f".
        what: String,
        status: u32,
        reason: String,
        body: Option<String>,
    },

    /// libcurl failure before any status was obtained (DNS, connect, TLS,
    /// read/recv). Retryable until the attempt budget is exhausted.
    #[error("transport: {0}")]
    Transport(#[from] curl::Error),

    /// The attempt did not produce a result within the per-attempt deadline.
    /// The worker's eventual outcome is discarded.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Abort requested by the caller. Never retried.
    #[error("transfer aborted")]
    Aborted,

    /// Local file I/O failed (upload source read, part-file write). Not
    /// retried: a full disk or bad permissions do not heal between attempts.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// HTTP status code associated with this error, or 0 when the attempt
    /// never obtained one (transport failure, timeout, abort, local I/O).
    pub fn status_code(&self) -> u32 {
        match self {
            TransferError::Status { status, .. } => *status,
            _ => 0,
        }
    }

    /// True for the per-attempt deadline expiry kind, so callers can tell a
    /// timeout apart from other transport-level failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransferError::Timeout(_))
    }
}
