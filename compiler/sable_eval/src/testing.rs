//! Testing utilities for import resolution.
//!
//! [`MemoryResolver`] serves small style-sheets from memory and records
//! every lookup it receives, so tests can check which resolvers were
//! consulted and how often.
//!
//! ```ignore
//! use sable_eval::testing::{MemoryResolver, SheetItem};
//!
//! let lib = MemoryResolver::new("lib")
//!     .with_file("_grid.scss", vec![SheetItem::css(".row { display: flex }")])
//!     .into_shared();
//! ```

use std::rc::Rc;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use sable_diagnostic::{SyntaxError, SyntaxResult};
use sable_ir::SourceLocation;

use crate::import::{ImportKey, ImportNode, Resolver};
use crate::options::Options;
use crate::tree::{CompiledUnit, Node, RootNode};

/// One top-level item of an in-memory sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetItem {
    Css(String),
    Import { reference: String, line: u32 },
}

impl SheetItem {
    pub fn css(text: &str) -> Self {
        SheetItem::Css(text.to_string())
    }

    pub fn import(reference: &str, line: u32) -> Self {
        SheetItem::Import {
            reference: reference.to_string(),
            line,
        }
    }
}

/// A lookup received by a [`MemoryResolver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Probe {
    Relative { reference: String, origin: String },
    Absolute { reference: String },
}

#[derive(Clone, Debug)]
enum Sheet {
    Items(Vec<SheetItem>),
    /// Exists, but fails to compile with this message.
    Broken(String),
}

/// An in-memory load path.
///
/// Files are addressed by path relative to the root; unit identifiers are
/// `"<root>/<path>"`. A reference `dir/name` matches, in order,
/// `dir/name.scss`, `dir/_name.scss` and `dir/name.css`. Files ending in
/// `.css` resolve to passthrough units.
#[derive(Debug)]
pub struct MemoryResolver {
    root: String,
    files: FxHashMap<String, Sheet>,
    probes: Mutex<Vec<Probe>>,
}

impl MemoryResolver {
    pub fn new(root: &str) -> Self {
        MemoryResolver {
            root: root.to_string(),
            files: FxHashMap::default(),
            probes: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: &str, items: Vec<SheetItem>) -> Self {
        self.files.insert(path.to_string(), Sheet::Items(items));
        self
    }

    /// Add a file that is found but fails to compile.
    #[must_use]
    pub fn with_broken_file(mut self, path: &str, message: &str) -> Self {
        self.files
            .insert(path.to_string(), Sheet::Broken(message.to_string()));
        self
    }

    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Identifier a unit at `path` gets.
    pub fn identifier(&self, path: &str) -> String {
        format!("{}/{path}", self.root)
    }

    /// Compile the file at exactly `path`, without recording a probe.
    ///
    /// # Errors
    ///
    /// Fails if the file was added with [`MemoryResolver::with_broken_file`].
    pub fn compile(&self, path: &str) -> SyntaxResult<Option<CompiledUnit>> {
        let Some(sheet) = self.files.get(path) else {
            return Ok(None);
        };
        let identifier = self.identifier(path);
        match sheet {
            Sheet::Broken(message) => {
                Err(SyntaxError::new(message.as_str())
                    .with_location(SourceLocation::in_file(1, identifier)))
            }
            Sheet::Items(_) if path.ends_with(".css") => {
                Ok(Some(CompiledUnit::passthrough(identifier)))
            }
            Sheet::Items(items) => {
                let children = items
                    .iter()
                    .map(|item| match item {
                        SheetItem::Css(text) => Node::Css(text.clone()),
                        SheetItem::Import { reference, line } => {
                            Node::Import(Rc::new(ImportNode::new(reference.as_str(), *line)))
                        }
                    })
                    .collect();
                Ok(Some(CompiledUnit::new(identifier, RootNode::new(children))))
            }
        }
    }

    /// Every lookup received so far, oldest first.
    pub fn probes(&self) -> Vec<Probe> {
        self.probes.lock().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.lock().len()
    }

    fn lookup(&self, path: &str) -> SyntaxResult<Option<CompiledUnit>> {
        for candidate in candidates(path) {
            if let Some(unit) = self.compile(&candidate)? {
                return Ok(Some(unit));
            }
        }
        Ok(None)
    }
}

/// File names tried for `reference`, most specific first.
fn candidates(reference: &str) -> Vec<String> {
    let (dir, base) = match reference.rsplit_once('/') {
        Some((dir, base)) => (format!("{dir}/"), base),
        None => (String::new(), reference),
    };
    if base.ends_with(".scss") || base.ends_with(".css") {
        vec![reference.to_string(), format!("{dir}_{base}")]
    } else {
        vec![
            format!("{reference}.scss"),
            format!("{dir}_{base}.scss"),
            format!("{reference}.css"),
        ]
    }
}

impl Resolver for MemoryResolver {
    fn find_relative(
        &self,
        reference: &str,
        origin: &str,
        _options: &Options,
    ) -> SyntaxResult<Option<CompiledUnit>> {
        self.probes.lock().push(Probe::Relative {
            reference: reference.to_string(),
            origin: origin.to_string(),
        });
        let Some(origin_path) = origin
            .strip_prefix(self.root.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return Ok(None);
        };
        match origin_path.rsplit_once('/') {
            Some((dir, _)) => self.lookup(&format!("{dir}/{reference}")),
            None => self.lookup(reference),
        }
    }

    fn find(&self, reference: &str, _options: &Options) -> SyntaxResult<Option<CompiledUnit>> {
        self.probes.lock().push(Probe::Absolute {
            reference: reference.to_string(),
        });
        self.lookup(reference)
    }

    fn key(&self, reference: &str, _options: &Options) -> ImportKey {
        ImportKey::new(format!("{}:{reference}", self.root))
    }
}

impl std::fmt::Display for MemoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.root)
    }
}
