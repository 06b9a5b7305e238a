//! `rhc download <url>` – fetch a URL to a local file with retries.

use anyhow::{Context, Result};
use rhc_core::checksum;
use rhc_core::retry::RetryPolicy;
use rhc_core::transfer::RobustClient;
use rhc_core::url_model;
use std::io;
use std::path::{Path, PathBuf};

pub fn run_download(
    url: &str,
    output: Option<&Path>,
    sha256: Option<&str>,
    policy: RetryPolicy,
) -> Result<()> {
    let dest: PathBuf = match output {
        Some(path) => path.to_path_buf(),
        None => url_model::default_filename(url)
            .unwrap_or_else(|| "download.bin".to_string())
            .into(),
    };

    let client = RobustClient::new(policy);
    let mut sink = io::stderr();
    let report = client
        .download(url, &dest, &mut sink)
        .with_context(|| format!("download of {} failed", url_model::sanitize_str(url)))?;

    if let Some(expected) = sha256 {
        checksum::verify_sha256(&dest, expected)?;
    }

    println!(
        "Downloaded {} to {} ({} bytes, {} attempt(s))",
        url_model::sanitize_str(url),
        dest.display(),
        report.bytes,
        report.attempts
    );
    Ok(())
}
