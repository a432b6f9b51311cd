//! Sable Eval - scoping and import resolution for the Sable style-sheet compiler.
//!
//! # Architecture
//!
//! - `Environment`: a chain of lexical scopes holding variable, mixin and
//!   function bindings, with call-site (`caller`) and content-block captures
//! - `ReadOnlyEnvironment`: an immutable view whose captures are views too
//! - `ImportNode`: memoized relative-then-load-path resolution of one
//!   `@import`
//! - `ImportExpander`: splices resolved units into the importing one,
//!   detecting import loops on the trace stack
//! - `Stack`: import/mixin frames used for error backtraces
//!
//! The core is single-threaded: environments and import nodes use `Rc` and
//! interior mutability, and belong to one compilation. Resolvers and options
//! are `Arc`-shared and may be reused across compilations.

mod callable;
pub mod environment;
pub mod import;
mod options;
pub mod stack;
pub mod testing;
mod tree;

use std::sync::Once;

pub use callable::{Callable, CallableKind};
pub use environment::{
    as_read_only, Content, ContentBlock, EnvRef, Environment, ReadOnlyContent,
    ReadOnlyEnvironment, Scoped, WeakEnvironment,
};
pub use import::{ImportExpander, ImportKey, ImportNode, Resolution, Resolver, SharedResolver};
pub use options::{Options, SharedOptions};
pub use stack::{Frame, FrameGuard, FrameKind, SharedStack, Stack};
pub use tree::{CompiledUnit, Node, RootNode};

// Re-export the types that cross this crate's API
pub use sable_diagnostic::{
    BacktraceEntry, LogLevel, Logger, SyntaxError, SyntaxErrorKind, SyntaxResult,
};
pub use sable_ir::{Name, SelectorList, SourceLocation, Value};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debugging scope and import resolution.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=sable_eval=debug` or `RUST_LOG=sable_eval=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .init();
        }
    });
}
