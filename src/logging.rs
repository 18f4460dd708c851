use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing_appender::non_blocking;
use tracing_subscriber::EnvFilter;

use crate::data_paths::DataPaths;

pub struct LoggingConfig {
    pub data_paths: DataPaths,
    pub session_id: String,
    pub verbosity: u8,
}

impl LoggingConfig {
    pub fn new(data_paths: DataPaths, verbosity: u8) -> Self {
        let session_id = generate_session_id();
        Self { data_paths, session_id, verbosity }
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.data_paths.logs().join(format!("keyaudit-{}.log", self.session_id))
    }

    fn default_directive(&self) -> &'static str {
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Initialize console + per-session file logging. Warnings about ledger
/// quality go to the operational log; the report file itself never carries
/// error state.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    config.data_paths.ensure_directories()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let log_file = std::fs::File::create(config.log_file_path())
        .map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    let (file_writer, _file_guard) = non_blocking(log_file);

    // Store the guard to prevent it from being dropped
    std::mem::forget(_file_guard);

    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let multi_writer = std::io::stderr.and(file_writer);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(multi_writer)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .init();

    tracing::info!(
        session_id = %config.session_id,
        log_file = %config.log_file_path().display(),
        "Logging initialized"
    );

    Ok(())
}

/// Generate a unique session ID with timestamp
fn generate_session_id() -> String {
    let now: DateTime<Utc> = Utc::now();
    format!("{}", now.format("%Y%m%d_%H%M%S_%3f"))
}

/// Log session end
pub fn log_session_end() {
    tracing::info!("Session ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let session_id = generate_session_id();
        // Should be in format: YYYYMMDD_HHMMSS_mmm
        let parts: Vec<&str> = session_id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 3);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn test_logging_config() {
        let data_paths = DataPaths::new("/tmp/test");

        let config = LoggingConfig::new(data_paths.clone(), 0);

        assert!(config.log_file_path().starts_with(data_paths.logs()));
        assert!(config.log_file_path().to_string_lossy().contains("keyaudit-"));
        assert_eq!(config.default_directive(), "info");
        assert_eq!(LoggingConfig::new(data_paths, 2).default_directive(), "trace");
    }
}
