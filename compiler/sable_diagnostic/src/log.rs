//! Named severities and the logging capability.
//!
//! The compiler core never prints. It hands user-facing messages to a
//! [`Logger`], which decides from the message's [`LogLevel`] whether to emit.

use std::fmt;
use std::str::FromStr;

use parking_lot::Mutex;

/// Severity of a user-facing message, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Every level, least severe first.
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Whether a message at this level passes a `min` threshold.
    #[inline]
    pub fn is_at_least(self, min: LogLevel) -> bool {
        self >= min
    }

    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing a level name that is not registered.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level {0:?}")]
pub struct UnknownLogLevel(pub String);

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLogLevel(s.to_string()))
    }
}

/// Sink for user-facing messages.
pub trait Logger {
    /// Messages below this level are dropped.
    fn min_level(&self) -> LogLevel;

    /// Emit `message` unconditionally. Callers go through [`Logger::log`].
    fn emit(&self, level: LogLevel, message: &str);

    /// Emit `message` if `level` passes the threshold.
    fn log(&self, level: LogLevel, message: &str) {
        if level.is_at_least(self.min_level()) {
            self.emit(level, message);
        }
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }
}

/// Forwards messages to `tracing` events.
#[derive(Clone, Copy, Debug)]
pub struct TracingLogger {
    pub min_level: LogLevel,
}

impl Default for TracingLogger {
    fn default() -> Self {
        TracingLogger {
            min_level: LogLevel::Warn,
        }
    }
}

impl Logger for TracingLogger {
    fn min_level(&self) -> LogLevel {
        self.min_level
    }

    fn emit(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "sable", "{message}"),
            LogLevel::Debug => tracing::debug!(target: "sable", "{message}"),
            LogLevel::Info => tracing::info!(target: "sable", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "sable", "{message}"),
            LogLevel::Error => tracing::error!(target: "sable", "{message}"),
        }
    }
}

/// Keeps every emitted message in memory.
///
/// Used by tests, and by drivers that batch warnings for later display.
#[derive(Debug)]
pub struct RecordingLogger {
    min_level: LogLevel,
    messages: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
    pub fn new(min_level: LogLevel) -> Self {
        RecordingLogger {
            min_level,
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the messages emitted so far.
    pub fn messages(&self) -> Vec<(LogLevel, String)> {
        self.messages.lock().clone()
    }
}

impl Default for RecordingLogger {
    fn default() -> Self {
        Self::new(LogLevel::Trace)
    }
}

impl Logger for RecordingLogger {
    fn min_level(&self) -> LogLevel {
        self.min_level
    }

    fn emit(&self, level: LogLevel, message: &str) {
        self.messages.lock().push((level, message.to_string()));
    }
}
