//! Logging configuration
//!
//! Persisted alongside the rest of the kiosk configuration; the binary turns
//! it into a `tracing-subscriber` registry at startup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

const LOG_FILE_PREFIX: &str = "kiosk_";
const LOG_FILE_EXTENSION: &str = "log";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level name: trace, debug, info, warn, error
    pub level: String,
    /// Directory log files are written to
    pub log_path: PathBuf,
    /// Number of log files kept by cleanup
    pub max_files: usize,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a file in `log_path`
    pub file_output: bool,
    /// File name used by [`LogConfig::current_log_path`]; set on first use
    #[serde(skip)]
    session_file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        let log_path = dirs::data_local_dir()
            .map(|dir| dir.join("avatar-kiosk").join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"));

        Self {
            level: "info".to_string(),
            log_path,
            max_files: 10,
            console_output: true,
            file_output: false,
            session_file: None,
        }
    }
}

impl LogConfig {
    /// Parse `level`, falling back to INFO
    pub fn parse_level(&self) -> LevelFilter {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "warn" | "warning" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            "off" => LevelFilter::OFF,
            _ => LevelFilter::INFO,
        }
    }

    /// Create the log directory if missing
    pub fn ensure_log_directory(&self) -> io::Result<()> {
        fs::create_dir_all(&self.log_path)
    }

    /// Path of this run's log file
    pub fn current_log_path(&self) -> PathBuf {
        let name = self.session_file.clone().unwrap_or_else(|| {
            format!(
                "{}{}.{}",
                LOG_FILE_PREFIX,
                chrono::Local::now().format("%Y%m%d_%H%M%S"),
                LOG_FILE_EXTENSION
            )
        });
        self.log_path.join(name)
    }

    /// Pin the log file name for the rest of the run
    pub fn pin_session_file(&mut self) -> PathBuf {
        let path = self.current_log_path();
        self.session_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        path
    }

    /// Delete the oldest log files beyond `max_files`.
    ///
    /// The newest file always survives, so call this after creating the
    /// current run's file. Returns the number of files removed.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(LOG_FILE_EXTENSION)
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
            })
            .collect();

        let keep = self.max_files.max(1);
        if logs.len() <= keep {
            return Ok(0);
        }

        // Timestamped names sort chronologically
        logs.sort();
        let excess = logs.len() - keep;
        let mut removed = 0;
        for path in logs.into_iter().take(excess) {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let mut config = LogConfig::default();
        assert_eq!(config.parse_level(), LevelFilter::INFO);
        config.level = "DEBUG".to_string();
        assert_eq!(config.parse_level(), LevelFilter::DEBUG);
        config.level = "nonsense".to_string();
        assert_eq!(config.parse_level(), LevelFilter::INFO);
    }

    #[test]
    fn test_cleanup_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in ["20260101_000000", "20260102_000000", "20260103_000000"] {
            fs::write(dir.path().join(format!("kiosk_{}.log", stamp)), "x").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let config = LogConfig {
            log_path: dir.path().to_path_buf(),
            max_files: 2,
            ..LogConfig::default()
        };
        assert_eq!(config.cleanup_old_logs().unwrap(), 1);
        assert!(!dir.path().join("kiosk_20260101_000000.log").exists());
        assert!(dir.path().join("kiosk_20260103_000000.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_cleanup_never_removes_newest() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in ["20260101_000000", "20260102_000000"] {
            fs::write(dir.path().join(format!("kiosk_{}.log", stamp)), "x").unwrap();
        }

        let config = LogConfig {
            log_path: dir.path().to_path_buf(),
            max_files: 0,
            ..LogConfig::default()
        };
        assert_eq!(config.cleanup_old_logs().unwrap(), 1);
        assert!(dir.path().join("kiosk_20260102_000000.log").exists());
    }

    #[test]
    fn test_pinned_log_path_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LogConfig {
            log_path: dir.path().join("logs"),
            ..LogConfig::default()
        };
        config.ensure_log_directory().unwrap();
        let pinned = config.pin_session_file();
        assert_eq!(config.current_log_path(), pinned);
        assert!(pinned.starts_with(dir.path()));
    }
}
