//! Tracing setup. The terminal belongs to the UI, so logs go to a file.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// `verbose` forces `debug`; otherwise `RUST_LOG`, falling back to `info`.
pub fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber, appending to `log_path`.
pub fn init(log_path: &Path, verbose: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| anyhow::anyhow!("Failed to install logger: {}", err))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "heatmap-tui starting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_appends_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(crate::config::LOG_FILE_NAME);
        std::fs::write(&path, "previous run\n").unwrap();

        init(&path, true).unwrap();
        tracing::debug!("debug line");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("previous run"));
        assert!(contents.contains("heatmap-tui starting"));
        assert!(contents.contains("debug line"));
    }
}
