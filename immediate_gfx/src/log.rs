//! Internal logging system for immediate_gfx
//!
//! - Customizable logger via the [`Logger`] trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default, filtered by a minimum severity
//! - File and line information for ERROR logs

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use immediate_gfx::igfx::log::{Logger, LogEntry};
///
/// struct FileLogger;
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,

    pub timestamp: SystemTime,

    /// Source component (e.g., "igfx::CommandContext", "igfx::vulkan")
    pub source: String,

    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-command information (barriers, binds)
    Trace,

    /// Object creation, cache misses
    Debug,

    /// Lifecycle events
    Info,

    Warn,

    /// Errors, printed with file:line
    Error,
}

impl LogSeverity {
    /// Fixed-width label used in console output
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colorize(self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

/// Default logger using colored console output
///
/// Lines look like `12:04:31.207 INFO  igfx::Renderer | message`; entries
/// carrying a location append ` @ file:line` and go to stderr.
///
/// Entries below `min_severity` are dropped. The default threshold is Info,
/// since the command context logs every barrier at Trace.
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl DefaultLogger {
    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    /// Render an entry without colors (used by tests and by custom sinks)
    pub fn format_plain(entry: &LogEntry) -> String {
        Self::compose(entry, entry.severity.label(), &entry.source)
    }

    fn compose(entry: &LogEntry, severity: impl std::fmt::Display, source: impl std::fmt::Display) -> String {
        let local: DateTime<Local> = entry.timestamp.into();
        let mut line = format!("{} {} {} | {}", local.format("%H:%M:%S%.3f"), severity, source, entry.message);
        if let (Some(file), Some(number)) = (entry.file, entry.line) {
            line.push_str(&format!(" @ {}:{}", file, number));
        }
        line
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::with_min_severity(LogSeverity::Info)
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.severity < self.min_severity {
            return;
        }

        let line = Self::compose(entry, entry.severity.colorize(), entry.source.bright_blue());
        if entry.file.is_some() && entry.line.is_some() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
#[macro_export]
macro_rules! igfx_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::igfx::Engine::log(
            $crate::igfx::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! igfx_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::igfx::Engine::log(
            $crate::igfx::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
///
/// ```no_run
/// immediate_gfx::igfx_info!("igfx::Renderer", "Renderer ready ({} presentable images)", 2);
/// ```
#[macro_export]
macro_rules! igfx_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::igfx::Engine::log(
            $crate::igfx::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! igfx_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::igfx::Engine::log(
            $crate::igfx::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! igfx_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::igfx::Engine::log_detailed(
            $crate::igfx::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and evaluate to `Error::BackendError` carrying the same message
///
/// ```no_run
/// # use immediate_gfx::igfx::Error;
/// # fn f(code: i32) -> Error {
/// immediate_gfx::igfx_err!("igfx::vulkan", "vkCreateImage failed: {}", code)
/// # }
/// ```
#[macro_export]
macro_rules! igfx_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::igfx::Engine::log_detailed(
            $crate::igfx::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::igfx::Error::BackendError(message)
    }};
}

/// Log an ERROR and return `Err(Error::BackendError)` from the enclosing function
#[macro_export]
macro_rules! igfx_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::igfx_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
