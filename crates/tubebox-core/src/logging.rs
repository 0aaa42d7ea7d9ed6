//! Logging configuration
//!
//! Persisted as part of the settings document; consumed by the application's
//! `logging_setup` module at startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level (trace, debug, info, warn, error)
    pub level: String,
    /// Mirror logs to stderr
    pub console_output: bool,
    /// Write logs to a file under `log_dir`
    pub file_output: bool,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Keep at most this many old log files
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: true,
            log_dir: PathBuf::from("/var/log/tubebox"),
            max_files: 5,
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO on junk input.
    pub fn parse_level(&self) -> tracing::level_filters::LevelFilter {
        self.level
            .parse()
            .unwrap_or(tracing::level_filters::LevelFilter::INFO)
    }

    /// Path of the current log file.
    pub fn current_log_path(&self) -> PathBuf {
        self.log_dir.join("tubebox.log")
    }

    /// Create the log directory if missing.
    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.log_dir)
    }

    /// Delete the oldest rotated files beyond `max_files`.
    pub fn cleanup_old_logs(&self) -> std::io::Result<()> {
        let mut logs: Vec<PathBuf> = std::fs::read_dir(&self.log_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension().map(|e| e == "log").unwrap_or(false)
                    && p.file_stem()
                        .and_then(|s| s.to_str())
                        .map(|s| s.starts_with("tubebox"))
                        .unwrap_or(false)
            })
            .collect();
        logs.sort();

        while logs.len() > self.max_files {
            let oldest = logs.remove(0);
            std::fs::remove_file(oldest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_level_falls_back_to_info() {
        let config = LogConfig {
            level: "shouty".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.parse_level(),
            tracing::level_filters::LevelFilter::INFO
        );
    }

    #[test]
    fn level_parses_known_names() {
        let config = LogConfig {
            level: "debug".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.parse_level(),
            tracing::level_filters::LevelFilter::DEBUG
        );
    }
}
