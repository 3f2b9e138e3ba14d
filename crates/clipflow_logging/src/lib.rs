#![deny(missing_docs)]
//! Shared logging utilities for the clipflow workspace.
//!
//! This crate provides the `clip_*` logging macros used across the codebase,
//! the active-job context that tags every line with the job being monitored,
//! and the logger initializers for the binary and for tests.

use std::cell::RefCell;
use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

#[doc(hidden)]
pub use log as __log;

thread_local! {
    /// Job id of the push-channel subscription currently open on this thread.
    static ACTIVE_JOB: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Marks `job_id` as the job whose progress is being monitored.
/// Subsequent `clip_*` lines on this thread carry a `[job …]` prefix.
pub fn set_active_job(job_id: impl Into<String>) {
    let job_id = job_id.into();
    ACTIVE_JOB.with(|slot| *slot.borrow_mut() = Some(job_id));
}

/// Clears the active job tag, typically when its subscription is released.
pub fn clear_active_job() {
    ACTIVE_JOB.with(|slot| *slot.borrow_mut() = None);
}

/// Returns the job id currently tagged on this thread, if any.
pub fn active_job() -> Option<String> {
    ACTIVE_JOB.with(|slot| slot.borrow().clone())
}

/// Expands to a log call at `$level`, prefixed with the active job when one is set.
#[doc(hidden)]
#[macro_export]
macro_rules! __clip_log {
    ($level:ident, $($arg:tt)*) => {{
        match $crate::active_job() {
            Some(job) => $crate::__log::$level!("[job {}] {}", job, format_args!($($arg)*)),
            None => $crate::__log::$level!($($arg)*),
        }
    }};
}

/// Logs a trace-level message tagged with the active job.
#[macro_export]
macro_rules! clip_trace {
    ($($arg:tt)*) => {{
        $crate::__clip_log!(trace, $($arg)*);
    }};
}

/// Logs a debug-level message tagged with the active job.
#[macro_export]
macro_rules! clip_debug {
    ($($arg:tt)*) => {{
        $crate::__clip_log!(debug, $($arg)*);
    }};
}

/// Logs an info-level message tagged with the active job.
#[macro_export]
macro_rules! clip_info {
    ($($arg:tt)*) => {{
        $crate::__clip_log!(info, $($arg)*);
    }};
}

/// Logs a warn-level message tagged with the active job.
#[macro_export]
macro_rules! clip_warn {
    ($($arg:tt)*) => {{
        $crate::__clip_log!(warn, $($arg)*);
    }};
}

/// Logs an error-level message tagged with the active job.
#[macro_export]
macro_rules! clip_error {
    ($($arg:tt)*) => {{
        $crate::__clip_log!(error, $($arg)*);
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogDestination {
    /// Write to the configured log file only.
    File,
    /// Write to the terminal (stderr for warnings, stdout otherwise).
    #[default]
    Terminal,
    /// Write to both file and terminal.
    Both,
}

/// Initializes the global logger with the specified destination.
///
/// `log_file` is truncated on start. If it cannot be created the file logger
/// is skipped and a warning goes to stderr. A second call is a no-op.
pub fn initialize(destination: LogDestination, level: LevelFilter, log_file: &Path) {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if matches!(destination, LogDestination::Terminal | LogDestination::Both) {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }
    if matches!(destination, LogDestination::File | LogDestination::Both) {
        if let Some(file_logger) = create_file_logger(level, config, log_file) {
            loggers.push(file_logger);
        }
    }
    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    log_path: &Path,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}
