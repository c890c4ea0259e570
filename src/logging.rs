use anyhow::{Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Mutex;
use std::time::Instant;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Warning or error surfaced to whatever front end is attached
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub level: Level,
    pub message: String,
    pub timestamp: Instant,
}

impl StatusMessage {
    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

/// Logger with two sinks: a daily-rolling file for records at `file_level`,
/// and an optional channel receiving records at `status_level` and above so
/// a front end can show them without tailing the log file
struct HansnapLogger {
    file: Mutex<RollingFileAppender>,
    status: Option<Mutex<Sender<StatusMessage>>>,
    file_level: LevelFilter,
    status_level: LevelFilter,
}

impl HansnapLogger {
    fn write_file(&self, level: Level, message: &str) {
        if let Ok(mut writer) = self.file.lock() {
            let now = chrono::Local::now();
            let _ = writeln!(
                writer,
                "{} [{}] {}",
                now.format("%Y-%m-%d %H:%M:%S"),
                level,
                message
            );
        }
    }

    fn send_status(&self, level: Level, message: String) {
        let Some(tx) = &self.status else {
            return;
        };
        if let Ok(tx) = tx.lock() {
            // A disconnected receiver just means no front end is listening
            let _ = tx.send(StatusMessage {
                level,
                message,
                timestamp: Instant::now(),
            });
        }
    }
}

impl Log for HansnapLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.file_level || metadata.level() <= self.status_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = record.level();
        let message = record.args().to_string();

        if level <= self.file_level {
            self.write_file(level, &message);
        }
        if level <= self.status_level {
            self.send_status(level, message);
        }
    }

    fn flush(&self) {
        // RollingFileAppender writes through on every record
    }
}

/// Parse log level string to LevelFilter
pub fn parse_level(level_str: &str) -> LevelFilter {
    match level_str.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info, // Default to info
    }
}

/// Build the daily-rolling appender for the given log file path,
/// keeping at most 3 rotated files
fn rolling_appender(log_file_path: &Path) -> Result<RollingFileAppender> {
    let directory = log_file_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Invalid log file path"))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(3)
        .filename_prefix(
            log_file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("hansnap"),
        )
        .filename_suffix(
            log_file_path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("log"),
        )
        .build(directory)
        .context("Failed to create rotating file appender")
}

/// Install the global logger
///
/// When `status_tx` is given, records at `status_level` and above are also
/// forwarded as [`StatusMessage`]s for the caller to drain.
pub fn init_logger(
    log_file_path: PathBuf,
    status_tx: Option<Sender<StatusMessage>>,
    file_level: &str,
    status_level: &str,
) -> Result<()> {
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let file_level = parse_level(file_level);
    let status_level = parse_level(status_level);

    let logger = HansnapLogger {
        file: Mutex::new(rolling_appender(&log_file_path)?),
        status: status_tx.map(Mutex::new),
        file_level,
        status_level,
    };

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(file_level.max(status_level));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn test_logger(dir: &Path, status: Option<Sender<StatusMessage>>) -> HansnapLogger {
        HansnapLogger {
            file: Mutex::new(rolling_appender(&dir.join("test.log")).unwrap()),
            status: status.map(Mutex::new),
            file_level: LevelFilter::Info,
            status_level: LevelFilter::Warn,
        }
    }

    fn log_files_content(dir: &Path) -> String {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| fs::read_to_string(entry.unwrap().path()).ok())
            .collect()
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("error"), LevelFilter::Error);
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("Debug"), LevelFilter::Debug);
        assert_eq!(parse_level("trace"), LevelFilter::Trace);
        assert_eq!(parse_level("bogus"), LevelFilter::Info);
    }

    #[test]
    fn test_warn_records_reach_the_status_channel() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let logger = test_logger(dir.path(), Some(tx));

        logger.log(
            &Record::builder()
                .args(format_args!("backend unreachable"))
                .level(Level::Warn)
                .build(),
        );

        let status = rx.try_recv().expect("warn should be forwarded");
        assert_eq!(status.level, Level::Warn);
        assert_eq!(status.message, "backend unreachable");
        assert!(!status.is_error());

        // The file sink receives it as well
        assert!(log_files_content(dir.path()).contains("backend unreachable"));
    }

    #[test]
    fn test_error_status_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let logger = test_logger(dir.path(), Some(tx));

        logger.log(
            &Record::builder()
                .args(format_args!("translation failed"))
                .level(Level::Error)
                .build(),
        );

        assert!(rx.try_recv().unwrap().is_error());
    }

    #[test]
    fn test_info_records_skip_the_status_channel() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let logger = test_logger(dir.path(), Some(tx));

        logger.log(
            &Record::builder()
                .args(format_args!("routine detail"))
                .level(Level::Info)
                .build(),
        );

        assert!(rx.try_recv().is_err());
        assert!(log_files_content(dir.path()).contains("routine detail"));
    }

    #[test]
    fn test_logger_works_without_a_status_channel() {
        let dir = tempfile::tempdir().unwrap();
        let logger = test_logger(dir.path(), None);

        logger.log(
            &Record::builder()
                .args(format_args!("no listener attached"))
                .level(Level::Error)
                .build(),
        );

        assert!(log_files_content(dir.path()).contains("no listener attached"));
    }
}
