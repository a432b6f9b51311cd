//! Compilation options snapshot.

use std::sync::Arc;

use crate::import::SharedResolver;

/// Shared, immutable options. Every environment in a chain points at one.
pub type SharedOptions = Arc<Options>;

/// Configuration for one style-sheet compilation.
///
/// Immutable once an environment holds it; derive a new snapshot with
/// [`Options::for_import`] when descending into an imported unit.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Identity of the file being compiled (`None` for string input).
    pub filename: Option<String>,
    /// Resolver bound to `filename`, consulted first for relative lookups.
    pub importer: Option<SharedResolver>,
    /// Search-path resolvers, consulted in order; the first match wins.
    pub load_paths: Vec<SharedResolver>,
    /// Suppress user-facing warnings.
    pub quiet: bool,
}

impl Options {
    /// Options with the given load paths and nothing else set.
    pub fn with_load_paths(load_paths: Vec<SharedResolver>) -> Self {
        Options {
            load_paths,
            ..Options::default()
        }
    }

    /// Snapshot used while evaluating a unit found by `resolver`.
    ///
    /// Load paths and flags carry over; the unit becomes the current file
    /// and `resolver` the relative importer for its own imports.
    #[must_use]
    pub fn for_import(&self, identifier: &str, resolver: SharedResolver) -> Options {
        Options {
            filename: Some(identifier.to_string()),
            importer: Some(resolver),
            load_paths: self.load_paths.clone(),
            quiet: self.quiet,
        }
    }

    /// Display form of every load path, in search order.
    pub fn load_path_names(&self) -> Vec<String> {
        self.load_paths.iter().map(ToString::to_string).collect()
    }

    #[must_use]
    pub fn into_shared(self) -> SharedOptions {
        Arc::new(self)
    }
}
