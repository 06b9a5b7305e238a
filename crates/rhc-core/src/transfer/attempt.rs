//! One HTTP attempt over a fresh curl easy handle.
//!
//! Every attempt builds its own handle so no connection state survives a
//! failed try. The status line is captured as headers arrive; the body is
//! routed to the caller's sink only while the observed status is in the
//! success band, and into a capped diagnostic buffer otherwise.

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str;
use std::time::Duration;

use crate::error::TransferError;

/// Cap on the diagnostic body kept for non-2xx responses.
const DIAG_LIMIT: usize = 16 * 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: u32 = 10;

/// Final status line of one attempt plus body accounting.
#[derive(Debug, Clone)]
pub struct AttemptResponse {
    pub status: u32,
    /// Reason phrase from the status line; empty if the server sent none.
    pub reason: String,
    /// Decoded snippet of the response body, kept only for non-2xx statuses.
    pub body: Option<String>,
    /// Payload bytes streamed to the body sink (downloads) or sent from the
    /// source file (uploads).
    pub bytes: u64,
}

/// Issue a GET and stream the success-band body into `sink`.
///
/// `timeout` is the attempt deadline enforced by the caller; the handle gets
/// twice that as a transport-level backstop so an abandoned worker does not
/// block forever, while the deadline itself always classifies the failure.
pub(crate) fn perform_get<S>(
    url: &str,
    timeout: Duration,
    mut sink: S,
) -> Result<AttemptResponse, TransferError>
where
    S: FnMut(&[u8]) -> io::Result<()>,
{
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTS)?;
    easy.connect_timeout(CONNECT_TIMEOUT)?;
    easy.timeout(timeout.saturating_mul(2))?;

    let status = Cell::new(0u32);
    let reason = RefCell::new(String::new());
    let diag = RefCell::new(Vec::<u8>::new());
    let sink_err = RefCell::new(None::<io::Error>);
    let bytes = Cell::new(0u64);

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            if let Some((code, phrase)) = parse_status_line(line) {
                // A redirect hop starts a new response; diagnostics from the
                // previous hop no longer apply.
                status.set(code);
                *reason.borrow_mut() = phrase;
                diag.borrow_mut().clear();
            }
            true
        })?;
        transfer.write_function(|data| {
            if (200..300).contains(&status.get()) {
                match sink(data) {
                    Ok(()) => {
                        bytes.set(bytes.get() + data.len() as u64);
                        Ok(data.len())
                    }
                    Err(e) => {
                        *sink_err.borrow_mut() = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            } else {
                append_capped(&mut diag.borrow_mut(), data);
                Ok(data.len())
            }
        })?;
        if let Err(e) = transfer.perform() {
            // A sink failure surfaces as a curl write error; the stored I/O
            // error is the real cause.
            if let Some(ioe) = sink_err.borrow_mut().take() {
                return Err(TransferError::Io(ioe));
            }
            return Err(TransferError::Transport(e));
        }
    }

    finish(&mut easy, reason.into_inner(), diag.into_inner(), bytes.get())
}

/// Issue a PUT of `source`'s full contents. The response body is only kept
/// as a diagnostic for non-2xx statuses.
pub(crate) fn perform_put(
    url: &str,
    source: &Path,
    content_type: Option<&str>,
    timeout: Duration,
) -> Result<AttemptResponse, TransferError> {
    let mut file = File::open(source)?;
    let len = file.metadata()?.len();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.upload(true)?;
    easy.in_filesize(len)?;
    easy.connect_timeout(CONNECT_TIMEOUT)?;
    easy.timeout(timeout.saturating_mul(2))?;
    if let Some(ct) = content_type {
        let mut list = curl::easy::List::new();
        list.append(&format!("Content-Type: {}", ct.trim()))?;
        easy.http_headers(list)?;
    }

    let reason = RefCell::new(String::new());
    let diag = RefCell::new(Vec::<u8>::new());
    let read_err = RefCell::new(None::<io::Error>);

    {
        let mut transfer = easy.transfer();
        transfer.read_function(|into| match file.read(into) {
            Ok(n) => Ok(n),
            Err(e) => {
                *read_err.borrow_mut() = Some(e);
                Err(curl::easy::ReadError::Abort)
            }
        })?;
        transfer.header_function(|line| {
            if let Some((_, phrase)) = parse_status_line(line) {
                *reason.borrow_mut() = phrase;
                diag.borrow_mut().clear();
            }
            true
        })?;
        transfer.write_function(|data| {
            append_capped(&mut diag.borrow_mut(), data);
            Ok(data.len())
        })?;
        if let Err(e) = transfer.perform() {
            if let Some(ioe) = read_err.borrow_mut().take() {
                return Err(TransferError::Io(ioe));
            }
            return Err(TransferError::Transport(e));
        }
    }

    finish(&mut easy, reason.into_inner(), diag.into_inner(), len)
}

fn finish(
    easy: &mut curl::easy::Easy,
    reason: String,
    diag: Vec<u8>,
    bytes: u64,
) -> Result<AttemptResponse, TransferError> {
    let status = easy.response_code()?;
    let body = if (200..300).contains(&status) || diag.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&diag).into_owned())
    };
    Ok(AttemptResponse {
        status,
        reason,
        body,
        bytes,
    })
}

fn append_capped(buf: &mut Vec<u8>, data: &[u8]) {
    let room = DIAG_LIMIT.saturating_sub(buf.len());
    buf.extend_from_slice(&data[..data.len().min(room)]);
}

/// Parse a `HTTP/<ver> <code> [<phrase>]` header line; returns `None` for
/// ordinary header lines.
fn parse_status_line(line: &[u8]) -> Option<(u32, String)> {
    let text = str::from_utf8(line).ok()?.trim_end();
    let rest = text.strip_prefix("HTTP/")?;
    let mut parts = rest.splitn(3, ' ');
    let _version = parts.next()?;
    let code = parts.next()?.parse::<u32>().ok()?;
    let phrase = parts.next().unwrap_or("").trim().to_string();
    Some((code, phrase))
}
