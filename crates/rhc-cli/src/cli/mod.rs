//! CLI for RHC robust HTTP transfers.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rhc_core::config;
use rhc_core::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

use commands::{run_checksum, run_download, run_upload};

/// Top-level CLI for the RHC transfer client.
#[derive(Debug, Parser)]
#[command(name = "rhc")]
#[command(about = "RHC: HTTP transfers with bounded retries and per-attempt timeouts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Retry tunables; each flag overrides the config file for this invocation.
#[derive(Debug, Args)]
pub struct RetryOverrides {
    /// Maximum attempts per transfer, including the first.
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Base backoff delay in milliseconds.
    #[arg(long, value_name = "MS")]
    pub base_delay_ms: Option<u64>,

    /// Ceiling on any single backoff delay, in seconds.
    #[arg(long, value_name = "SECS")]
    pub max_delay_secs: Option<u64>,

    /// Wall-clock budget for one attempt, in seconds.
    #[arg(long, value_name = "SECS")]
    pub attempt_timeout_secs: Option<u64>,
}

impl RetryOverrides {
    fn apply(&self, mut policy: RetryPolicy) -> RetryPolicy {
        if let Some(n) = self.max_attempts {
            policy.max_attempts = n.max(1);
        }
        if let Some(ms) = self.base_delay_ms {
            policy.base_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = self.max_delay_secs {
            policy.max_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = self.attempt_timeout_secs {
            policy.attempt_timeout = Duration::from_secs(secs);
        }
        policy
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL to a local file.
    Download {
        /// Direct HTTP/HTTPS URL to fetch.
        url: String,

        /// Destination path; defaults to the URL's last path segment.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Verify the downloaded file against this SHA-256 hex digest.
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,

        #[command(flatten)]
        retry: RetryOverrides,
    },

    /// Upload a local file to a URL via PUT.
    Upload {
        /// File to send.
        file: PathBuf,

        /// Destination URL.
        url: String,

        /// Content-Type header for the request body.
        #[arg(long, value_name = "TYPE")]
        content_type: Option<String>,

        #[command(flatten)]
        retry: RetryOverrides,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Download {
                url,
                output,
                sha256,
                retry,
            } => run_download(
                &url,
                output.as_deref(),
                sha256.as_deref(),
                retry.apply(cfg.retry_policy()),
            ),
            CliCommand::Upload {
                file,
                url,
                content_type,
                retry,
            } => run_upload(
                &file,
                &url,
                content_type.as_deref(),
                retry.apply(cfg.retry_policy()),
            ),
            CliCommand::Checksum { path } => run_checksum(&path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_download_with_overrides() {
        let cli = Cli::try_parse_from([
            "rhc",
            "download",
            "https://example.com/a/file.tar.gz",
            "--output",
            "/tmp/file.tar.gz",
            "--max-attempts",
            "3",
            "--attempt-timeout-secs",
            "60",
        ])
        .unwrap();
        match cli.command {
            CliCommand::Download {
                url, output, retry, ..
            } => {
                assert_eq!(url, "https://example.com/a/file.tar.gz");
                assert_eq!(output.unwrap(), PathBuf::from("/tmp/file.tar.gz"));
                let policy = retry.apply(RetryPolicy::default());
                assert_eq!(policy.max_attempts, 3);
                assert_eq!(policy.attempt_timeout, Duration::from_secs(60));
                assert_eq!(policy.base_delay, RetryPolicy::default().base_delay);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_upload_with_content_type() {
        let cli = Cli::try_parse_from([
            "rhc",
            "upload",
            "./artifact.bin",
            "https://example.com/put/here",
            "--content-type",
            "application/octet-stream",
        ])
        .unwrap();
        match cli.command {
            CliCommand::Upload {
                file,
                url,
                content_type,
                ..
            } => {
                assert_eq!(file, PathBuf::from("./artifact.bin"));
                assert_eq!(url, "https://example.com/put/here");
                assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_url() {
        assert!(Cli::try_parse_from(["rhc", "download"]).is_err());
    }
}
