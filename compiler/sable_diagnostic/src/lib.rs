//! Diagnostics for the Sable compiler front end.
//!
//! - `SyntaxError`: the one error type that crosses the scoping and import
//!   core. It keeps its message stable while location context is layered
//!   on as it propagates through enclosing `@import` frames.
//! - `LogLevel` and `Logger`: the named-severity capability used to decide
//!   whether a user-facing warning is emitted.

mod error;
mod log;

pub use error::{BacktraceEntry, SyntaxError, SyntaxErrorKind, SyntaxResult};
pub use log::{LogLevel, Logger, RecordingLogger, TracingLogger, UnknownLogLevel};
