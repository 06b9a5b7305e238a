use anyhow::{Context, Result};
use std::fs;
use tracing_subscriber::EnvFilter;

/// Initialize structured logging to `~/.local/state/rhc/rhc.log`.
///
/// Transfer progress goes to the caller's sink; tracing output is diagnostic
/// only and stays out of the terminal. `RUST_LOG` overrides the default
/// filter.
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rhc")?;
    let log_dir = xdg_dirs.get_state_home();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("rhc.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,rhc_core=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(move || file.try_clone().expect("failed to clone log file handle"))
        .with_ansi(false)
        .init();

    tracing::debug!("logging initialized at {}", log_path.display());

    Ok(())
}
