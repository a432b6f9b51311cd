//! Minimal compiled-unit tree consumed by import resolution.
//!
//! The full style-sheet node hierarchy lives with the parser and printer.
//! Import resolution only needs a unit with an identity, a root it can walk
//! for nested `@import`s, and a rendered form to test for emptiness.

use std::fmt;
use std::rc::Rc;

use crate::import::ImportNode;

/// A node in a unit's root.
#[derive(Clone, Debug)]
pub enum Node {
    /// Already-rendered CSS.
    Css(String),
    /// An `@import` whose target is resolved on demand.
    Import(Rc<ImportNode>),
}

/// Top-level children of a unit, in source order.
#[derive(Clone, Debug, Default)]
pub struct RootNode {
    children: Vec<Node>,
}

impl RootNode {
    pub fn new(children: Vec<Node>) -> Self {
        RootNode { children }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Import nodes directly under this root.
    pub fn imports(&self) -> impl Iterator<Item = &Rc<ImportNode>> {
        self.children.iter().filter_map(|node| match node {
            Node::Import(import) => Some(import),
            Node::Css(_) => None,
        })
    }
}

/// A style-sheet produced by a resolver.
#[derive(Clone, Debug)]
pub struct CompiledUnit {
    identifier: String,
    root: RootNode,
}

impl CompiledUnit {
    pub fn new(identifier: impl Into<String>, root: RootNode) -> Self {
        CompiledUnit {
            identifier: identifier.into(),
            root,
        }
    }

    /// A plain CSS file emitted as an `@import` rather than inlined.
    pub fn passthrough(identifier: impl Into<String>) -> Self {
        Self::new(identifier, RootNode::default())
    }

    /// Identity of the unit (usually its resolved path).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn root(&self) -> &RootNode {
        &self.root
    }
}

/// Renders CSS children, and any imported unit that has already been
/// resolved, in source order. Unresolved imports render as nothing.
impl fmt::Display for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for node in self.root.children() {
            let rendered = match node {
                Node::Css(css) => css.clone(),
                Node::Import(import) => match import.resolved_unit() {
                    Some(unit) => unit.to_string(),
                    None => continue,
                },
            };
            if rendered.is_empty() {
                continue;
            }
            if !first {
                f.write_str("\n")?;
            }
            f.write_str(&rendered)?;
            first = false;
        }
        Ok(())
    }
}
