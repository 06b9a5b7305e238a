//! `rhc upload <file> <url>` – PUT a local file to a URL with retries.

use anyhow::{Context, Result};
use rhc_core::retry::RetryPolicy;
use rhc_core::transfer::RobustClient;
use rhc_core::url_model;
use std::io;
use std::path::Path;

pub fn run_upload(
    file: &Path,
    url: &str,
    content_type: Option<&str>,
    policy: RetryPolicy,
) -> Result<()> {
    let client = RobustClient::new(policy);
    let mut sink = io::stderr();
    let report = client
        .upload(file, url, content_type, &mut sink)
        .with_context(|| format!("upload of {} failed", file.display()))?;

    println!(
        "Uploaded {} to {} ({} bytes, {} attempt(s))",
        file.display(),
        url_model::sanitize_str(url),
        report.bytes,
        report.attempts
    );
    Ok(())
}
