//! Source locations attached to errors and trace frames.

use std::fmt;

/// A line in a style-sheet, identified by file name when one is known.
///
/// Lines are 1-based. A missing file name means the source was supplied
/// directly (a string input rather than a file).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub line: u32,
    pub filename: Option<String>,
}

impl SourceLocation {
    pub fn new(line: u32, filename: Option<String>) -> Self {
        SourceLocation { line, filename }
    }

    /// A location in a named file.
    pub fn in_file(line: u32, filename: impl Into<String>) -> Self {
        SourceLocation {
            line,
            filename: Some(filename.into()),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.line)?;
        if let Some(filename) = &self.filename {
            write!(f, " of {filename}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        assert_eq!(SourceLocation::in_file(3, "a.scss").to_string(), "line 3 of a.scss");
        assert_eq!(SourceLocation::new(7, None).to_string(), "line 7");
    }
}
