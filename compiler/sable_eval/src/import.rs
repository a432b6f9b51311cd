//! `@import` resolution.
//!
//! Each `@import` occurrence becomes one [`ImportNode`]. Resolving it asks
//! the importing file's own resolver for a relative match first, then each
//! load path in order, and keeps the first unit found. The outcome is
//! memoized on the node: later queries (passthrough detection, cache keys,
//! emptiness) never consult a resolver again.

mod expand;

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use sable_diagnostic::{SyntaxError, SyntaxResult};
use sable_ir::SourceLocation;

use crate::options::Options;
use crate::tree::CompiledUnit;

pub use expand::ImportExpander;

/// Extension marking a plain CSS file that is emitted rather than inlined.
const CSS_EXTENSION: &str = ".css";

/// Something that can turn an import reference into a compiled unit.
///
/// Concrete resolvers (filesystem, in-memory) live outside this crate, apart
/// from the test double in [`crate::testing`]. `Display` names the resolver
/// in "not found" errors.
pub trait Resolver: fmt::Debug + fmt::Display + Send + Sync {
    /// Find `reference` relative to the file `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if a candidate exists but cannot be compiled.
    fn find_relative(
        &self,
        reference: &str,
        origin: &str,
        options: &Options,
    ) -> SyntaxResult<Option<CompiledUnit>>;

    /// Find `reference` from this resolver's root.
    ///
    /// # Errors
    ///
    /// Returns an error if a candidate exists but cannot be compiled.
    fn find(&self, reference: &str, options: &Options) -> SyntaxResult<Option<CompiledUnit>>;

    /// Cache key for `reference` as this resolver would resolve it.
    fn key(&self, reference: &str, options: &Options) -> ImportKey;
}

/// Resolvers are shared between options snapshots and compilations.
pub type SharedResolver = Arc<dyn Resolver>;

/// Opaque identity of a resolved import, for compilation caches.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImportKey(String);

impl ImportKey {
    pub fn new(key: impl Into<String>) -> Self {
        ImportKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A successfully resolved import.
#[derive(Debug)]
pub struct Resolution {
    pub unit: CompiledUnit,
    /// The resolver that found `unit`; it becomes the unit's relative importer.
    pub resolver: SharedResolver,
}

/// One `@import`ed reference.
#[derive(Debug)]
pub struct ImportNode {
    reference: String,
    line: u32,
    /// Set once an attempt completes; `Some(None)` records "not found".
    resolution: OnceCell<Option<Resolution>>,
}

impl ImportNode {
    pub fn new(reference: impl Into<String>, line: u32) -> Self {
        ImportNode {
            reference: reference.into(),
            line,
            resolution: OnceCell::new(),
        }
    }

    /// The reference as written in the `@import`.
    pub fn imported_filename(&self) -> &str {
        &self.reference
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Location of this statement in the file `options` describes.
    pub fn location(&self, options: &Options) -> SourceLocation {
        SourceLocation::new(self.line, options.filename.clone())
    }

    /// Resolve the reference, or return the memoized outcome.
    ///
    /// `Ok(None)` means no resolver had a match. That outcome is memoized
    /// too; an error raised by a resolver is not, so the attempt can be
    /// retried.
    ///
    /// # Errors
    ///
    /// Propagates resolver errors, re-wrapped with this statement's location.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(reference = %self.reference, line = self.line)
    )]
    pub fn resolve(&self, options: &Options) -> SyntaxResult<Option<&Resolution>> {
        if let Some(outcome) = self.resolution.get() {
            return Ok(outcome.as_ref());
        }
        let outcome = self
            .search(options)
            .map_err(|err| err.with_location(self.location(options)))?;
        match &outcome {
            Some(found) => tracing::debug!(
                identifier = found.unit.identifier(),
                resolver = %found.resolver,
                "resolved import"
            ),
            None => tracing::debug!("import not found"),
        }
        Ok(self.resolution.get_or_init(|| outcome).as_ref())
    }

    fn search(&self, options: &Options) -> SyntaxResult<Option<Resolution>> {
        if let (Some(importer), Some(origin)) = (&options.importer, options.filename.as_deref()) {
            if let Some(unit) = importer.find_relative(&self.reference, origin, options)? {
                return Ok(Some(Resolution {
                    unit,
                    resolver: Arc::clone(importer),
                }));
            }
        }
        for resolver in &options.load_paths {
            if let Some(unit) = resolver.find(&self.reference, options)? {
                return Ok(Some(Resolution {
                    unit,
                    resolver: Arc::clone(resolver),
                }));
            }
        }
        Ok(None)
    }

    /// The successful resolution: the unit and the resolver that found it.
    ///
    /// # Errors
    ///
    /// Fails with "file to import not found", listing every load path and
    /// located at this statement, whenever resolution found nothing. A
    /// memoized miss fails the same way on every call.
    pub fn resolved(&self, options: &Options) -> SyntaxResult<&Resolution> {
        self.resolve(options)?.ok_or_else(|| {
            SyntaxError::import_not_found(self.reference.as_str(), options.load_path_names())
                .with_location(self.location(options))
        })
    }

    /// The resolved unit.
    ///
    /// # Errors
    ///
    /// As [`ImportNode::resolved`].
    pub fn imported_file(&self, options: &Options) -> SyntaxResult<&CompiledUnit> {
        Ok(&self.resolved(options)?.unit)
    }

    /// Whether this import is emitted as a CSS `@import` rather than inlined.
    ///
    /// A reference spelled with the CSS extension answers without resolving.
    ///
    /// # Errors
    ///
    /// As [`ImportNode::imported_file`] when resolution is needed.
    pub fn is_css_import(&self, options: &Options) -> SyntaxResult<bool> {
        if self.reference.ends_with(CSS_EXTENSION) {
            return Ok(true);
        }
        Ok(self.imported_file(options)?.identifier().ends_with(CSS_EXTENSION))
    }

    /// Cache key from the resolver that found the unit, if any did.
    ///
    /// # Errors
    ///
    /// As [`ImportNode::resolve`].
    pub fn import_key(&self, options: &Options) -> SyntaxResult<Option<ImportKey>> {
        Ok(self
            .resolve(options)?
            .map(|found| found.resolver.key(&self.reference, options)))
    }

    /// Whether the resolved unit renders to nothing.
    ///
    /// # Errors
    ///
    /// As [`ImportNode::imported_file`].
    pub fn invisible(&self, options: &Options) -> SyntaxResult<bool> {
        Ok(self.imported_file(options)?.to_string().is_empty())
    }

    /// The unit, if resolution has already succeeded. Never resolves.
    pub fn resolved_unit(&self) -> Option<&CompiledUnit> {
        self.resolution
            .get()
            .and_then(Option::as_ref)
            .map(|found| &found.unit)
    }
}
