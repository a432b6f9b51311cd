//! Immutable views over environments.
//!
//! Functions and control directives sometimes need to inspect a scope
//! without being able to change it. A [`ReadOnlyEnvironment`] forwards every
//! read to the scope it wraps and exposes no setters. Its closure fields are
//! themselves wrapped lazily, and the wrappers are memoized so repeated
//! access yields the very same view.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use sable_ir::SelectorList;

use super::{Content, ContentBlock, Environment, Namespace, Scoped};
use crate::options::SharedOptions;

/// Content block as seen through a read-only view.
pub type ReadOnlyContent = ContentBlock<ReadOnlyEnvironment>;

/// Either a mutable environment or a read-only view of one.
///
/// Captured call sites may be either, so closure fields hold this.
#[derive(Clone, Debug)]
pub enum EnvRef {
    Owned(Environment),
    Viewed(ReadOnlyEnvironment),
}

impl EnvRef {
    pub fn caller(&self) -> Option<EnvRef> {
        match self {
            EnvRef::Owned(env) => env.caller(),
            EnvRef::Viewed(view) => view.caller().map(EnvRef::Viewed),
        }
    }

    pub fn content(&self) -> Option<Content> {
        match self {
            EnvRef::Owned(env) => env.content(),
            EnvRef::Viewed(view) => view
                .content()
                .map(|content| content.map_environment(EnvRef::Viewed)),
        }
    }

    /// Whether both refer to the same scope or the same view.
    pub fn ptr_eq(&self, other: &EnvRef) -> bool {
        match (self, other) {
            (EnvRef::Owned(a), EnvRef::Owned(b)) => a.ptr_eq(b),
            (EnvRef::Viewed(a), EnvRef::Viewed(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Environment> for EnvRef {
    fn from(env: Environment) -> Self {
        EnvRef::Owned(env)
    }
}

impl From<ReadOnlyEnvironment> for EnvRef {
    fn from(view: ReadOnlyEnvironment) -> Self {
        EnvRef::Viewed(view)
    }
}

impl Scoped for EnvRef {
    fn options(&self) -> &SharedOptions {
        match self {
            EnvRef::Owned(env) => env.options(),
            EnvRef::Viewed(view) => view.options(),
        }
    }

    fn get<N: Namespace>(&self, name: &str) -> Option<N::Value> {
        match self {
            EnvRef::Owned(env) => env.get::<N>(name),
            EnvRef::Viewed(view) => view.get::<N>(name),
        }
    }

    fn is_global<N: Namespace>(&self, name: &str) -> bool {
        match self {
            EnvRef::Owned(env) => env.is_global::<N>(name),
            EnvRef::Viewed(view) => view.is_global::<N>(name),
        }
    }

    fn selector(&self) -> Option<SelectorList> {
        match self {
            EnvRef::Owned(env) => env.selector(),
            EnvRef::Viewed(view) => view.selector(),
        }
    }

    fn global_env(&self) -> Environment {
        match self {
            EnvRef::Owned(env) => env.global_env(),
            EnvRef::Viewed(view) => view.global_env(),
        }
    }
}

/// View `env` read-only. A view is returned as-is rather than re-wrapped.
pub fn as_read_only(env: &EnvRef) -> ReadOnlyEnvironment {
    match env {
        EnvRef::Viewed(view) => view.clone(),
        EnvRef::Owned(owned) => ReadOnlyEnvironment::new(env.clone(), owned.options().clone()),
    }
}

struct View {
    inner: EnvRef,
    options: SharedOptions,
    caller: OnceCell<Option<ReadOnlyEnvironment>>,
    content: OnceCell<Option<ReadOnlyContent>>,
}

/// A read-only view of an environment.
///
/// Lookups forward to the wrapped scope, so later mutations through the
/// wrapped environment are visible here.
#[derive(Clone)]
pub struct ReadOnlyEnvironment(Rc<View>);

impl ReadOnlyEnvironment {
    /// Wrap `inner`, reporting `options` as this view's snapshot.
    pub fn new(inner: impl Into<EnvRef>, options: SharedOptions) -> Self {
        ReadOnlyEnvironment(Rc::new(View {
            inner: inner.into(),
            options,
            caller: OnceCell::new(),
            content: OnceCell::new(),
        }))
    }

    /// The scope this view forwards to.
    pub fn wrapped(&self) -> &EnvRef {
        &self.0.inner
    }

    /// Read-only view of the wrapped scope's caller.
    ///
    /// Built on first access; later calls return the same view.
    pub fn caller(&self) -> Option<ReadOnlyEnvironment> {
        self.0
            .caller
            .get_or_init(|| self.0.inner.caller().as_ref().map(as_read_only))
            .clone()
    }

    /// The wrapped scope's content block, with a read-only environment.
    ///
    /// Built on first access; later calls return the same view.
    pub fn content(&self) -> Option<ReadOnlyContent> {
        self.0
            .content
            .get_or_init(|| {
                self.0
                    .inner
                    .content()
                    .map(|content| content.map_environment(|env| as_read_only(&env)))
            })
            .clone()
    }

    pub fn ptr_eq(&self, other: &ReadOnlyEnvironment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Scoped for ReadOnlyEnvironment {
    fn options(&self) -> &SharedOptions {
        &self.0.options
    }

    fn get<N: Namespace>(&self, name: &str) -> Option<N::Value> {
        self.0.inner.get::<N>(name)
    }

    fn is_global<N: Namespace>(&self, name: &str) -> bool {
        self.0.inner.is_global::<N>(name)
    }

    fn selector(&self) -> Option<SelectorList> {
        self.0.inner.selector()
    }

    fn global_env(&self) -> Environment {
        self.0.inner.global_env()
    }
}

impl fmt::Debug for ReadOnlyEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlyEnvironment").field(&self.0.inner).finish()
    }
}

#[cfg(test)]
mod tests;
