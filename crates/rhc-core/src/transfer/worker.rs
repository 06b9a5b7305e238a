//! Deadline-bounded attempt execution on budgeted worker threads.
//!
//! An attempt runs on its own thread so the calling thread can enforce a
//! wall-clock deadline even though the blocking transport cannot be
//! cancelled. On expiry the worker is abandoned: its eventual result is
//! discarded, but its budget slot stays held until it actually returns, so
//! true in-flight work remains bounded.

use std::io;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use crate::control::AbortToken;
use crate::error::TransferError;

/// How often blocked waits wake up to poll the abort token.
const ABORT_POLL: Duration = Duration::from_millis(50);

/// Worker slots available to the process-wide shared budget.
const DEFAULT_WORKERS: usize = 8;

/// Bounded count of concurrently running attempt workers. Shared across all
/// transfers in the process; one slot covers one attempt.
#[derive(Debug)]
pub struct WorkerBudget {
    max: usize,
    in_use: Mutex<usize>,
    freed: Condvar,
}

impl WorkerBudget {
    pub fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            in_use: Mutex::new(0),
            freed: Condvar::new(),
        }
    }

    /// The process-wide budget used by clients that don't bring their own.
    pub fn shared() -> Arc<WorkerBudget> {
        static SHARED: OnceLock<Arc<WorkerBudget>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(WorkerBudget::new(DEFAULT_WORKERS))))
    }

    /// Number of slots currently held.
    pub fn in_use(&self) -> usize {
        *self.in_use.lock().unwrap()
    }

    /// Block until a slot frees up, polling the abort token while waiting.
    fn acquire(self: &Arc<Self>, abort: &AbortToken) -> Result<BudgetGuard, TransferError> {
        let mut in_use = self.in_use.lock().unwrap();
        while *in_use >= self.max {
            if abort.is_aborted() {
                return Err(TransferError::Aborted);
            }
            in_use = self.freed.wait_timeout(in_use, ABORT_POLL).unwrap().0;
        }
        *in_use += 1;
        drop(in_use);
        Ok(BudgetGuard {
            budget: Arc::clone(self),
        })
    }
}

/// Releases the held slot when dropped, including inside an abandoned worker.
struct BudgetGuard {
    budget: Arc<WorkerBudget>,
}

impl Drop for BudgetGuard {
    fn drop(&mut self) {
        let mut in_use = self.budget.in_use.lock().unwrap();
        *in_use = in_use.saturating_sub(1);
        self.budget.freed.notify_one();
    }
}

/// Run `job` on a worker thread and join it with a wall-clock deadline.
///
/// Returns the job's result, `Timeout` once `deadline` passes without one, or
/// `Aborted` as soon as the token is observed set. A timed-out worker keeps
/// running to completion; its result is dropped with the channel.
pub(crate) fn run_attempt<T, F>(
    budget: &Arc<WorkerBudget>,
    deadline: Duration,
    abort: &AbortToken,
    job: F,
) -> Result<T, TransferError>
where
    F: FnOnce() -> Result<T, TransferError> + Send + 'static,
    T: Send + 'static,
{
    if abort.is_aborted() {
        return Err(TransferError::Aborted);
    }
    let slot = budget.acquire(abort)?;
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("rhc-attempt".into())
        .spawn(move || {
            let _slot = slot;
            // Send fails if the caller already gave up; the result is simply
            // discarded in that case.
            let _ = tx.send(job());
        })
        .map_err(TransferError::Io)?;

    let start = Instant::now();
    loop {
        if abort.is_aborted() {
            return Err(TransferError::Aborted);
        }
        let Some(remaining) = deadline.checked_sub(start.elapsed()) else {
            return Err(TransferError::Timeout(deadline));
        };
        match rx.recv_timeout(remaining.min(ABORT_POLL)) {
            Ok(result) => return result,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(TransferError::Io(io::Error::other(
                    "attempt worker exited without a result",
                )));
            }
        }
    }
}

/// Sleep for `delay` in short slices so an abort interrupts the backoff
/// promptly instead of waiting out the full delay.
pub(crate) fn sleep_interruptibly(delay: Duration, abort: &AbortToken) -> Result<(), TransferError> {
    let deadline = Instant::now() + delay;
    loop {
        if abort.is_aborted() {
            return Err(TransferError::Aborted);
        }
        match deadline.checked_duration_since(Instant::now()) {
            Some(remaining) if !remaining.is_zero() => thread::sleep(remaining.min(ABORT_POLL)),
            _ => return Ok(()),
        }
    }
}
