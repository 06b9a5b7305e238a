//! Transfer cancellation: a shared abort token.
//!
//! The retry loop polls the token while waiting on an attempt worker and
//! between backoff slices; a control thread (e.g. a signal handler) calls
//! `abort` and the loop stops with `TransferError::Aborted` instead of
//! retrying further.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable abort flag shared between a transfer and whoever may cancel it.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    flag: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. The transfer observes the flag at its next suspension
    /// point (worker poll or backoff slice) and stops without further retries.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
