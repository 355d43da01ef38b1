// Logging setup for qpong
// Headless runs log to stderr; the terminal UI owns stdout/stderr, so watch mode logs to a file

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Level;

use crate::error::{Error, Result};

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    Stderr,
    /// Truncated on start; ANSI colours are disabled
    File(PathBuf),
}

/// Default log file for terminal sessions: `<temp dir>/qpong.log`
pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("qpong.log")
}

/// Level for the `--debug` flag
pub fn level_for(debug: bool) -> Level {
    if debug {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Install the global `tracing` subscriber.
///
/// Fails if a subscriber is already installed or the log file cannot be opened.
pub fn init(level: Level, destination: &LogDestination) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let installed = match destination {
        LogDestination::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogDestination::File(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    installed.map_err(|e| Error::Logging(e.to_string()))?;
    tracing::debug!(?destination, %level, "logging initialised");
    Ok(())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_raises_level() {
        assert_eq!(level_for(false), Level::INFO);
        assert_eq!(level_for(true), Level::DEBUG);
    }

    #[test]
    fn test_default_log_file_lives_in_temp_dir() {
        let path = default_log_file();
        assert_eq!(path.file_name().unwrap(), "qpong.log");
        assert!(path.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_second_init_reports_logging_error() {
        // Whichever call installs the subscriber, the next one must be refused
        let _ = init(Level::ERROR, &LogDestination::Stderr);
        let err = init(Level::ERROR, &LogDestination::Stderr).unwrap_err();
        assert!(matches!(err, Error::Logging(_)), "unexpected error: {}", err);
    }

    #[test]
    fn test_open_log_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("qpong.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
