//! Per-scope binding tables and the namespaces that select them.
//!
//! Every scope owns one table per namespace. The chain algorithms in
//! `environment` are written once, generic over [`Namespace`], and the
//! namespace marker picks which table they read or write.

use rustc_hash::FxHashMap;

use sable_ir::{Name, Value};

use crate::callable::Callable;

/// Mapping from normalized name to value for one scope level.
///
/// The map is only allocated once the first binding is set.
#[derive(Clone, Debug)]
pub struct BindingTable<V> {
    bindings: Option<FxHashMap<Name, V>>,
}

impl<V> Default for BindingTable<V> {
    fn default() -> Self {
        BindingTable { bindings: None }
    }
}

impl<V> BindingTable<V> {
    /// Look up an already-normalized name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&V> {
        self.bindings.as_ref()?.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Create or overwrite a binding.
    pub fn insert(&mut self, name: Name, value: V) {
        self.bindings
            .get_or_insert_with(FxHashMap::default)
            .insert(name, value);
    }

    /// Overwrite a binding only if it already exists here.
    ///
    /// Hands `value` back when the name is not bound at this level, so the
    /// caller can keep walking outward with it.
    pub fn replace_existing(&mut self, name: &str, value: V) -> Result<(), V> {
        match self.bindings.as_mut().and_then(|map| map.get_mut(name)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(value),
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.as_ref().map_or(0, FxHashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the table has ever been written.
    pub fn is_allocated(&self) -> bool {
        self.bindings.is_some()
    }

    /// Bound names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.bindings.iter().flat_map(FxHashMap::keys)
    }
}

/// The three tables held by one scope.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    pub variables: BindingTable<Value>,
    pub mixins: BindingTable<Callable>,
    pub functions: BindingTable<Callable>,
}

/// Selects one table out of a scope's [`Bindings`].
pub trait Namespace {
    /// What the namespace binds.
    type Value: Clone;

    /// Human-readable namespace name, for tracing.
    const KIND: &'static str;

    fn table(bindings: &Bindings) -> &BindingTable<Self::Value>;

    fn table_mut(bindings: &mut Bindings) -> &mut BindingTable<Self::Value>;
}

/// `$variable` bindings.
#[derive(Clone, Copy, Debug)]
pub enum Variables {}

/// `@mixin` definitions.
#[derive(Clone, Copy, Debug)]
pub enum Mixins {}

/// `@function` definitions.
#[derive(Clone, Copy, Debug)]
pub enum Functions {}

impl Namespace for Variables {
    type Value = Value;
    const KIND: &'static str = "variable";

    #[inline]
    fn table(bindings: &Bindings) -> &BindingTable<Value> {
        &bindings.variables
    }

    #[inline]
    fn table_mut(bindings: &mut Bindings) -> &mut BindingTable<Value> {
        &mut bindings.variables
    }
}

impl Namespace for Mixins {
    type Value = Callable;
    const KIND: &'static str = "mixin";

    #[inline]
    fn table(bindings: &Bindings) -> &BindingTable<Callable> {
        &bindings.mixins
    }

    #[inline]
    fn table_mut(bindings: &mut Bindings) -> &mut BindingTable<Callable> {
        &mut bindings.mixins
    }
}

impl Namespace for Functions {
    type Value = Callable;
    const KIND: &'static str = "function";

    #[inline]
    fn table(bindings: &Bindings) -> &BindingTable<Callable> {
        &bindings.functions
    }

    #[inline]
    fn table_mut(bindings: &mut Bindings) -> &mut BindingTable<Callable> {
        &mut bindings.functions
    }
}
