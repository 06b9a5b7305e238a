//! Map HTTP statuses and transfer errors onto retry error kinds.

use super::ErrorKind;
use crate::error::TransferError;

/// Classify an HTTP status code for retry decisions.
///
/// Only the 5xx band is presumed transient. 1xx/3xx/4xx indicate a
/// protocol-level problem a retry cannot fix (bad request, not found,
/// unauthorized) and are never retried. Status 0 means no status line was
/// obtained at all (DNS failure, refused connection) and is always retryable.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        0 => ErrorKind::Connection,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions. All of these happen before a
/// usable response exists, so they count as connection-level failures.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    ErrorKind::Connection
}

/// Classify a transfer error into an `ErrorKind`.
pub fn classify(e: &TransferError) -> ErrorKind {
    match e {
        TransferError::Status { status, .. } => classify_http_status(*status),
        TransferError::Transport(ce) => classify_curl_error(ce),
        TransferError::Timeout(_) => ErrorKind::Timeout,
        TransferError::Aborted | TransferError::Io(_) => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn no_status_is_retryable() {
        assert_eq!(classify_http_status(0), ErrorKind::Connection);
    }

    #[test]
    fn http_5xx_retryable() {
        assert!(matches!(classify_http_status(500), ErrorKind::Http5xx(500)));
        assert!(matches!(classify_http_status(502), ErrorKind::Http5xx(502)));
        assert!(matches!(classify_http_status(503), ErrorKind::Http5xx(503)));
    }

    #[test]
    fn http_1xx_3xx_4xx_fatal() {
        assert_eq!(classify_http_status(101), ErrorKind::Other);
        assert_eq!(classify_http_status(304), ErrorKind::Other);
        assert_eq!(classify_http_status(401), ErrorKind::Other);
        assert_eq!(classify_http_status(404), ErrorKind::Other);
        assert_eq!(classify_http_status(429), ErrorKind::Other);
    }

    #[test]
    fn timeout_and_abort_kinds() {
        assert_eq!(
            classify(&TransferError::Timeout(Duration::from_secs(1))),
            ErrorKind::Timeout
        );
        assert_eq!(classify(&TransferError::Aborted), ErrorKind::Other);
    }

    #[test]
    fn local_io_is_not_retried() {
        let err = TransferError::Io(std::io::Error::other("disk full"));
        assert_eq!(classify(&err), ErrorKind::Other);
    }
}
