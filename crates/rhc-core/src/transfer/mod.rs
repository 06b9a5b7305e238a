//! Resilient HTTP transfers: bounded retries, exponential backoff, and
//! per-attempt timeouts around a blocking curl transport.
//!
//! The calling thread blocks; each attempt runs on a budgeted worker thread
//! joined with a deadline, so a hung transport surfaces as a timeout and the
//! next attempt starts from a fresh handle.

mod attempt;
mod worker;

pub use attempt::AttemptResponse;
pub use worker::WorkerBudget;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::control::AbortToken;
use crate::error::TransferError;
use crate::retry::{classify, RetryDecision, RetryPolicy};
use crate::storage::PartFile;
use crate::url_model;

/// Outcome of a successful transfer.
#[derive(Debug, Clone, Copy)]
pub struct TransferReport {
    /// Final HTTP status code.
    pub status: u32,
    /// Payload bytes moved.
    pub bytes: u64,
    /// Attempts used, counting the successful one.
    pub attempts: u32,
}

/// HTTP client with protection against transient failures.
///
/// One client executes one logical operation at a time; attempts within a
/// call are strictly sequential. Concurrency exists only across independent
/// clients, which share the process-wide worker budget.
pub struct RobustClient {
    policy: RetryPolicy,
    budget: Arc<WorkerBudget>,
    abort: AbortToken,
}

impl Default for RobustClient {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RobustClient {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_budget(policy, WorkerBudget::shared())
    }

    /// Like `new` but with an explicit worker budget instead of the shared
    /// process-wide one.
    pub fn with_budget(policy: RetryPolicy, budget: Arc<WorkerBudget>) -> Self {
        Self {
            policy,
            budget,
            abort: AbortToken::new(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Token for cancelling this client's in-flight call from another thread.
    pub fn abort_handle(&self) -> AbortToken {
        self.abort.clone()
    }

    /// Perform an HTTP network operation with timeouts and retries.
    ///
    /// `establish` runs on the worker thread, builds a fresh transport handle,
    /// issues the request, and returns the attempt response plus whatever
    /// per-attempt payload `consume` will need (e.g. the part file a download
    /// streamed into). It must be safe to invoke repeatedly: a retry re-runs
    /// it from scratch, so the underlying operation has to tolerate being
    /// re-issued. `consume` is invoked only once a success-band (2xx) status
    /// was observed.
    ///
    /// 2xx is success. Transport errors with no status, 5xx responses, and
    /// attempt timeouts are retried with exponential backoff until the
    /// attempt budget is spent; the last underlying error is then surfaced
    /// verbatim. Any other status (1xx/3xx/4xx) fails immediately, even on
    /// the first attempt. An abort observed at any suspension point
    /// propagates as [`TransferError::Aborted`] without further retries.
    ///
    /// `what_concise` names the operation in retry notices ("download");
    /// `what_verbose` names it in failure messages and should already have
    /// credentials redacted (see [`url_model::sanitize`]).
    pub fn connect<P, E, U>(
        &self,
        what_concise: &str,
        what_verbose: &str,
        establish: E,
        consume: U,
        sink: &mut dyn Write,
    ) -> Result<TransferReport, TransferError>
    where
        P: Send + 'static,
        E: Fn() -> Result<(AttemptResponse, P), TransferError> + Send + Sync + 'static,
        U: Fn(P, &AttemptResponse) -> Result<(), TransferError> + Send + Sync + 'static,
    {
        let establish = Arc::new(establish);
        let consume = Arc::new(consume);
        let mut attempt: u32 = 1;
        loop {
            let outcome = {
                let establish = Arc::clone(&establish);
                let consume = Arc::clone(&consume);
                let what = what_verbose.to_string();
                worker::run_attempt(
                    &self.budget,
                    self.policy.attempt_timeout,
                    &self.abort,
                    move || {
                        let (response, payload) = establish()?;
                        if !(200..300).contains(&response.status) {
                            // Dropping the payload here discards any partial
                            // per-attempt state (e.g. removes the part file).
                            return Err(TransferError::Status {
                                what,
                                status: response.status,
                                reason: response.reason,
                                body: response.body,
                            });
                        }
                        consume(payload, &response)?;
                        Ok(response)
                    },
                )
            };
            match outcome {
                Ok(response) => {
                    // Avoid interleaving with concurrent output from other
                    // sources sharing the sink.
                    let _ = sink.flush();
                    tracing::debug!(
                        status = response.status,
                        bytes = response.bytes,
                        attempts = attempt,
                        "{what_concise} succeeded"
                    );
                    return Ok(TransferReport {
                        status: response.status,
                        bytes: response.bytes,
                        attempts: attempt,
                    });
                }
                Err(TransferError::Aborted) => return Err(TransferError::Aborted),
                Err(err) => match self.policy.decide(attempt, classify(&err)) {
                    RetryDecision::NoRetry => {
                        tracing::warn!(attempt, "{what_concise} failed: {err}");
                        return Err(err);
                    }
                    RetryDecision::RetryAfter(delay) => {
                        let _ = writeln!(sink, "Retrying {what_concise} after: {err}");
                        tracing::info!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying {what_concise}"
                        );
                        worker::sleep_interruptibly(delay, &self.abort)?;
                        attempt += 1;
                    }
                },
            }
        }
    }

    /// Download `url` to `dest` with retries.
    ///
    /// The body streams into a temp part file; the destination is replaced
    /// atomically only after a fully successful attempt, so a failed attempt
    /// never leaves a half-written file at the final path.
    pub fn download(
        &self,
        url: &str,
        dest: &Path,
        sink: &mut dyn Write,
    ) -> Result<TransferReport, TransferError> {
        let what_verbose = format!(
            "download {} to {}",
            url_model::sanitize_str(url),
            dest.display()
        );
        let url = url.to_string();
        let dest = dest.to_path_buf();
        let timeout = self.policy.attempt_timeout;
        self.connect(
            "download",
            &what_verbose,
            move || {
                let mut part = PartFile::create(&dest)?;
                let response = attempt::perform_get(&url, timeout, |data| part.write(data))?;
                Ok((response, part))
            },
            |part: PartFile, _response| part.finalize().map_err(TransferError::from),
            sink,
        )
    }

    /// Upload `file` to `url` via PUT with retries. Success is determined
    /// purely by the response status.
    pub fn upload(
        &self,
        file: &Path,
        url: &str,
        content_type: Option<&str>,
        sink: &mut dyn Write,
    ) -> Result<TransferReport, TransferError> {
        let what_verbose = format!(
            "upload {} to {}",
            file.display(),
            url_model::sanitize_str(url)
        );
        let file = file.to_path_buf();
        let url = url.to_string();
        let content_type = content_type.map(str::to_string);
        let timeout = self.policy.attempt_timeout;
        self.connect(
            "upload",
            &what_verbose,
            move || {
                let response =
                    attempt::perform_put(&url, &file, content_type.as_deref(), timeout)?;
                Ok((response, ()))
            },
            |_payload: (), _response| Ok(()),
            sink,
        )
    }
}
