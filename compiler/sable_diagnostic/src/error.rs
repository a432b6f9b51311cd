//! Syntax errors with location context and import backtraces.
//!
//! An error is raised with a structured kind and, usually, no location. It
//! is located at the failing statement via [`SyntaxError::with_location`],
//! and each enclosing `@import` or mixin call becomes a [`BacktraceEntry`],
//! so the user sees both where the failure happened and how it was reached.

use std::fmt;

use sable_ir::SourceLocation;

/// Result alias used throughout the compiler core.
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Structured error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
    /// Neither the importing file's resolver nor any load path matched.
    #[error(
        "File to import not found or unreadable: {reference}.\n{}",
        describe_load_paths(.load_paths)
    )]
    ImportNotFound {
        reference: String,
        load_paths: Vec<String>,
    },

    /// A unit imports itself, directly or through intermediate files.
    ///
    /// `chain` lists the files in import order, ending with the file that
    /// closes the loop.
    #[error("An @import loop has been found:{}", describe_loop(.chain))]
    ImportLoop { chain: Vec<String> },

    #[error("{message}")]
    Custom { message: String },
}

fn describe_load_paths(paths: &[String]) -> String {
    match paths {
        [] => String::from("Load paths: (none)"),
        [single] => format!("Load path: {single}"),
        _ => {
            let mut out = String::from("Load paths:");
            for path in paths {
                out.push_str("\n  ");
                out.push_str(path);
            }
            out
        }
    }
}

fn describe_loop(chain: &[String]) -> String {
    chain
        .windows(2)
        .map(|pair| format!("\n    {} imports {}", pair[0], pair[1]))
        .collect()
}

/// One "from line N of file" step in an error's import backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceEntry {
    pub location: SourceLocation,
    /// What was happening at this frame (`@import "mid"`, `mixin button`).
    pub context: Option<String>,
}

impl BacktraceEntry {
    pub fn new(location: SourceLocation) -> Self {
        BacktraceEntry {
            location,
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for BacktraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from {}", self.location)?;
        if let Some(context) = &self.context {
            write!(f, ", in {context}")?;
        }
        Ok(())
    }
}

/// A compile error raised by the scoping or import core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Rendered from `kind`; never changes once the error exists.
    pub message: String,
    /// Where the error happened, once known.
    pub location: Option<SourceLocation>,
    /// Enclosing frames, innermost first.
    pub backtrace: Vec<BacktraceEntry>,
}

impl SyntaxError {
    /// Create an error from a structured kind, without location.
    #[cold]
    pub fn from_kind(kind: SyntaxErrorKind) -> Self {
        let message = kind.to_string();
        SyntaxError {
            kind,
            message,
            location: None,
            backtrace: Vec::new(),
        }
    }

    /// Create an error with just a message.
    #[cold]
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_kind(SyntaxErrorKind::Custom {
            message: message.into(),
        })
    }

    #[cold]
    pub fn import_not_found(reference: impl Into<String>, load_paths: Vec<String>) -> Self {
        Self::from_kind(SyntaxErrorKind::ImportNotFound {
            reference: reference.into(),
            load_paths,
        })
    }

    #[cold]
    pub fn import_loop(chain: Vec<String>) -> Self {
        Self::from_kind(SyntaxErrorKind::ImportLoop { chain })
    }

    /// Re-wrap with the location of the statement the error passed through.
    ///
    /// An error without a location adopts `location` as its own. An error
    /// that already points somewhere keeps that primary location and records
    /// `location` as the next backtrace frame instead. The message is kept.
    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        } else {
            self.backtrace.push(BacktraceEntry::new(location));
        }
        self
    }

    /// Record an enclosing frame the error propagated through.
    #[must_use]
    pub fn with_backtrace_entry(mut self, entry: BacktraceEntry) -> Self {
        self.backtrace.push(entry);
        self
    }

    /// Line of the primary location, if any.
    pub fn line(&self) -> Option<u32> {
        self.location.as_ref().map(|loc| loc.line)
    }

    /// File of the primary location, if any.
    pub fn filename(&self) -> Option<&str> {
        self.location.as_ref().and_then(|loc| loc.filename.as_deref())
    }

    /// Full multi-line report: message, primary location, then each frame.
    pub fn report(&self) -> String {
        let mut out = format!("Error: {}", self.message);
        if let Some(location) = &self.location {
            out.push_str("\n        on ");
            out.push_str(&location.to_string());
        }
        for entry in &self.backtrace {
            out.push_str("\n        ");
            out.push_str(&entry.to_string());
        }
        out
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SyntaxError {}
