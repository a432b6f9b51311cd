//! Splicing imported units into the importing one.

use std::sync::Arc;

use sable_diagnostic::{SyntaxError, SyntaxResult};

use super::ImportNode;
use crate::environment::Scoped;
use crate::options::Options;
use crate::stack::SharedStack;
use crate::tree::{CompiledUnit, Node};

/// Renders a unit with every `@import` expanded in place.
///
/// - Style-sheet imports are resolved and rendered recursively, each inside
///   an `Import` frame on the compilation's stack.
/// - CSS imports are emitted as `@import "<reference>";`.
/// - Imports that render to nothing leave no trace in the output.
#[derive(Clone, Debug)]
pub struct ImportExpander {
    stack: SharedStack,
}

impl ImportExpander {
    pub fn new(stack: SharedStack) -> Self {
        ImportExpander { stack }
    }

    /// Expander sharing the stack of `env`'s chain.
    pub fn for_environment(env: &impl Scoped) -> Self {
        Self::new(env.stack())
    }

    pub fn stack(&self) -> &SharedStack {
        &self.stack
    }

    /// Render the top-level `unit` compiled under `options`.
    ///
    /// # Errors
    ///
    /// Fails on the first import that cannot be resolved or that closes an
    /// import loop. The error is located at the failing statement and its
    /// backtrace lists every enclosing `@import`, innermost first.
    pub fn expand(&self, unit: &CompiledUnit, options: &Options) -> SyntaxResult<String> {
        self.stack
            .with_base(options.filename.as_deref(), 1, || self.render(unit, options))
    }

    fn render(&self, unit: &CompiledUnit, options: &Options) -> SyntaxResult<String> {
        let mut pieces = Vec::new();
        for node in unit.root().children() {
            let piece = match node {
                Node::Css(css) => css.clone(),
                Node::Import(import) => self.render_import(import, options)?,
            };
            if !piece.is_empty() {
                pieces.push(piece);
            }
        }
        Ok(pieces.join("\n"))
    }

    fn render_import(&self, import: &ImportNode, options: &Options) -> SyntaxResult<String> {
        let target = self
            .locate(import, options)
            .map_err(|err| self.stack.attach_backtrace(err))?;
        let Some((unit, nested)) = target else {
            return Ok(format!("@import \"{}\";", import.imported_filename()));
        };

        tracing::debug!(identifier = unit.identifier(), "expanding import");
        self.stack.with_import(
            options.filename.as_deref(),
            import.line(),
            import.imported_filename(),
            || self.render(unit, &nested),
        )
    }

    /// The unit `import` names and the options to render it under, or
    /// `None` for a CSS import.
    fn locate<'n>(
        &self,
        import: &'n ImportNode,
        options: &Options,
    ) -> SyntaxResult<Option<(&'n CompiledUnit, Options)>> {
        if import.is_css_import(options)? {
            return Ok(None);
        }
        let found = import.resolved(options)?;
        let identifier = found.unit.identifier();
        self.check_loop(import, identifier, options)?;
        let nested = options.for_import(identifier, Arc::clone(&found.resolver));
        Ok(Some((&found.unit, nested)))
    }

    /// Fail if expanding `identifier` would re-enter a file still being
    /// expanded.
    fn check_loop(
        &self,
        import: &ImportNode,
        identifier: &str,
        options: &Options,
    ) -> SyntaxResult<()> {
        let current = options.filename.as_deref();
        let chain = if current == Some(identifier) {
            vec![identifier.to_string(); 2]
        } else {
            let stack = self.stack.borrow();
            let Some(start) = stack.importing_position(identifier) else {
                return Ok(());
            };
            let mut chain: Vec<String> = stack.frames()[start..]
                .iter()
                .filter(|frame| frame.is_import())
                .filter_map(|frame| frame.filename.clone())
                .collect();
            chain.extend(current.map(str::to_string));
            chain.push(identifier.to_string());
            chain
        };
        Err(SyntaxError::import_loop(chain).with_location(import.location(options)))
    }
}
