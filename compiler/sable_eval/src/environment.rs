//! Lexical environments for style-sheet evaluation.
//!
//! The evaluator creates one [`Environment`] per scope-introducing construct
//! (rule block, control directive, mixin or function body), linked to the
//! enclosing one. Lookups walk outward to the root. Assignment either
//! mutates the nearest existing binding wherever it lives, or declares a new
//! binding in the assigning scope when the name is bound nowhere.
//!
//! Three namespaces (variables, mixins, functions) are stored side by side;
//! the chain algorithms are written once and parameterized by [`Namespace`].
//!
//! Mixin and function bodies additionally capture the call site (`caller`)
//! and any passed content block (`content`), independent of lexical nesting.
//! [`ReadOnlyEnvironment`] presents any of these as an immutable view.

mod binding;
mod read_only;

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::iter;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashSet;

use sable_diagnostic::Logger;
use sable_ir::{Name, SelectorList, SourceLocation, Value};

use crate::callable::Callable;
use crate::options::SharedOptions;
use crate::stack::SharedStack;
use crate::tree::Node;

pub use binding::{BindingTable, Bindings, Functions, Mixins, Namespace, Variables};
pub use read_only::{as_read_only, EnvRef, ReadOnlyContent, ReadOnlyEnvironment};

/// A content block passed to a mixin, with the scope it closes over.
#[derive(Clone, Debug)]
pub struct ContentBlock<E> {
    pub nodes: Rc<[Node]>,
    pub environment: E,
}

/// Content block as captured by a mutable environment.
pub type Content = ContentBlock<EnvRef>;

impl<E> ContentBlock<E> {
    pub fn new(nodes: Vec<Node>, environment: E) -> Self {
        ContentBlock {
            nodes: nodes.into(),
            environment,
        }
    }

    /// Same nodes, environment transformed by `f`.
    pub fn map_environment<F, T>(self, f: F) -> ContentBlock<T>
    where
        F: FnOnce(E) -> T,
    {
        ContentBlock {
            nodes: self.nodes,
            environment: f(self.environment),
        }
    }
}

/// Read operations shared by mutable environments and read-only views.
pub trait Scoped {
    /// Options snapshot in effect for this scope.
    fn options(&self) -> &SharedOptions;

    /// Nearest binding of `name` in namespace `N`, walking outward.
    fn get<N: Namespace>(&self, name: &str) -> Option<N::Value>;

    /// Whether the nearest scope binding `name` is the root.
    ///
    /// `false` when `name` is bound nowhere.
    fn is_global<N: Namespace>(&self, name: &str) -> bool;

    /// Current fully-resolved selector, if inside a style rule.
    fn selector(&self) -> Option<SelectorList>;

    /// The root environment of this chain.
    fn global_env(&self) -> Environment;

    /// The compilation's trace stack, owned by the root.
    fn stack(&self) -> SharedStack {
        self.global_env().root_stack()
    }

    fn var(&self, name: &str) -> Option<Value> {
        self.get::<Variables>(name)
    }

    fn mixin(&self, name: &str) -> Option<Callable> {
        self.get::<Mixins>(name)
    }

    fn function(&self, name: &str) -> Option<Callable> {
        self.get::<Functions>(name)
    }

    fn is_var_global(&self, name: &str) -> bool {
        self.is_global::<Variables>(name)
    }

    fn is_mixin_global(&self, name: &str) -> bool {
        self.is_global::<Mixins>(name)
    }

    fn is_function_global(&self, name: &str) -> bool {
        self.is_global::<Functions>(name)
    }
}

/// How a scope hangs off the chain.
enum Link {
    /// The unique scope with no parent. Owns the trace stack and the
    /// one-time warning keys of the whole chain.
    Root {
        stack: SharedStack,
        warnings: RefCell<WarningLedger>,
    },
    Child {
        parent: Environment,
        /// Memoized root of the chain.
        global: OnceCell<Environment>,
    },
}

/// Keys of one-time warnings already emitted.
#[derive(Default)]
struct WarningLedger {
    /// (variable, file, line) of global assignments already warned about.
    global_warning_given: FxHashSet<(Name, Option<String>, u32)>,
    /// (file, line) of deprecated `false` uses already warned about.
    deprecated_false_warning_given: FxHashSet<(Option<String>, u32)>,
}

struct Scope {
    link: Link,
    options: SharedOptions,
    caller: Option<EnvRef>,
    content: Option<Content>,
    bindings: RefCell<Bindings>,
    selector: RefCell<Option<SelectorList>>,
}

impl Scope {
    fn parent(&self) -> Option<&Environment> {
        match &self.link {
            Link::Root { .. } => None,
            Link::Child { parent, .. } => Some(parent),
        }
    }
}

/// A mutable lexical environment.
///
/// Cheap to clone: clones are handles to the same scope.
#[derive(Clone)]
pub struct Environment(Rc<Scope>);

impl Environment {
    /// Create an environment.
    ///
    /// Options default to the parent's, or to `Options::default()` at the
    /// root. A root gets a fresh trace stack.
    pub fn new(parent: Option<&Environment>, options: Option<SharedOptions>) -> Self {
        match parent {
            Some(parent) => {
                let options = options.unwrap_or_else(|| parent.options().clone());
                Self::with_link(
                    Link::Child {
                        parent: parent.clone(),
                        global: OnceCell::new(),
                    },
                    options,
                    None,
                    None,
                )
            }
            None => Self::root_with_stack(options.unwrap_or_default(), SharedStack::new()),
        }
    }

    /// A root environment with a fresh trace stack.
    pub fn root(options: SharedOptions) -> Self {
        Self::root_with_stack(options, SharedStack::new())
    }

    /// A root environment sharing a stack the evaluator already holds.
    pub fn root_with_stack(options: SharedOptions, stack: SharedStack) -> Self {
        let link = Link::Root {
            stack,
            warnings: RefCell::default(),
        };
        Self::with_link(link, options, None, None)
    }

    /// A nested scope inheriting this one's options.
    #[must_use]
    pub fn child(&self) -> Self {
        Self::new(Some(self), None)
    }

    /// The body scope of a mixin or function invocation.
    ///
    /// `parent` is the declaring scope; `caller` and `content` are fixed at
    /// construction and never change afterwards.
    pub fn for_call(parent: &Environment, caller: EnvRef, content: Option<Content>) -> Self {
        Self::with_link(
            Link::Child {
                parent: parent.clone(),
                global: OnceCell::new(),
            },
            parent.options().clone(),
            Some(caller),
            content,
        )
    }

    fn with_link(
        link: Link,
        options: SharedOptions,
        caller: Option<EnvRef>,
        content: Option<Content>,
    ) -> Self {
        Environment(Rc::new(Scope {
            link,
            options,
            caller,
            content,
            bindings: RefCell::new(Bindings::default()),
            selector: RefCell::new(None),
        }))
    }

    /// The enclosing environment, or `None` at the root.
    pub fn parent(&self) -> Option<&Environment> {
        self.0.parent()
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Number of enclosing scopes (0 at the root).
    pub fn depth(&self) -> usize {
        self.scopes().count() - 1
    }

    /// Whether both handles point at the same scope.
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A handle that does not keep this scope alive.
    pub fn downgrade(&self) -> WeakEnvironment {
        WeakEnvironment(Rc::downgrade(&self.0))
    }

    /// This scope followed by each ancestor up to the root.
    fn scopes(&self) -> impl Iterator<Item = &Scope> {
        iter::successors(Some(&*self.0), |scope| scope.parent().map(|p| &*p.0))
    }

    fn root_stack(&self) -> SharedStack {
        match &self.0.link {
            Link::Root { stack, .. } => stack.clone(),
            Link::Child { .. } => self.global_env().root_stack(),
        }
    }

    /// Run `f` on the root's warning ledger.
    fn with_warnings<T>(&self, f: impl FnOnce(&mut WarningLedger) -> T) -> T {
        match &self.0.link {
            Link::Root { warnings, .. } => f(&mut warnings.borrow_mut()),
            Link::Child { .. } => self.global_env().with_warnings(f),
        }
    }

    // Closure fields

    /// Call-site scope of the nearest enclosing mixin or function body.
    pub fn caller(&self) -> Option<EnvRef> {
        self.scopes().find_map(|scope| scope.caller.clone())
    }

    /// Content block of the nearest enclosing mixin body.
    pub fn content(&self) -> Option<Content> {
        self.scopes().find_map(|scope| scope.content.clone())
    }

    /// Set the selector of the style rule this scope belongs to.
    pub fn set_selector(&self, selector: SelectorList) {
        *self.0.selector.borrow_mut() = Some(selector);
    }

    /// Child scope for a style rule written here.
    ///
    /// The rule's selector is resolved against the enclosing one, so
    /// `&` and descendant nesting are already applied in the child.
    #[must_use]
    pub fn rule_scope(&self, selector: &SelectorList) -> Environment {
        let resolved = match self.selector() {
            Some(enclosing) => enclosing.nest(selector),
            None => selector.clone(),
        };
        let scope = self.child();
        scope.set_selector(resolved);
        scope
    }

    // Assignment

    /// Overwrite the nearest existing binding of `name`, wherever it lives.
    ///
    /// Hands `value` back if `name` is bound nowhere in the chain.
    pub fn try_assign<N: Namespace>(&self, name: &str, value: N::Value) -> Result<(), N::Value> {
        let name = Name::normalize(name);
        let mut value = value;
        for scope in self.scopes() {
            let mut bindings = scope.bindings.borrow_mut();
            match N::table_mut(&mut bindings).replace_existing(&name, value) {
                Ok(()) => return Ok(()),
                Err(unassigned) => value = unassigned,
            }
        }
        Err(value)
    }

    /// Assign to the nearest existing binding, or declare `name` in this
    /// scope if it is bound nowhere in the chain.
    pub fn assign_or_declare<N: Namespace>(&self, name: &str, value: N::Value) {
        if let Err(value) = self.try_assign::<N>(name, value) {
            self.declare_local::<N>(name, value);
        }
    }

    /// Create or overwrite `name` in this scope, shadowing outer bindings.
    pub fn declare_local<N: Namespace>(&self, name: &str, value: N::Value) {
        N::table_mut(&mut self.0.bindings.borrow_mut()).insert(Name::new(name), value);
    }

    /// Create or overwrite `name` on the root, ignoring nearer bindings.
    pub fn declare_global<N: Namespace>(&self, name: &str, value: N::Value) {
        tracing::trace!(kind = N::KIND, name, "declaring global binding");
        self.global_env().declare_local::<N>(name, value);
    }

    pub fn set_var(&self, name: &str, value: Value) {
        self.assign_or_declare::<Variables>(name, value);
    }

    pub fn try_set_var(&self, name: &str, value: Value) -> Result<(), Value> {
        self.try_assign::<Variables>(name, value)
    }

    pub fn set_local_var(&self, name: &str, value: Value) {
        self.declare_local::<Variables>(name, value);
    }

    pub fn set_global_var(&self, name: &str, value: Value) {
        self.declare_global::<Variables>(name, value);
    }

    pub fn set_mixin(&self, name: &str, mixin: Callable) {
        self.assign_or_declare::<Mixins>(name, mixin);
    }

    pub fn try_set_mixin(&self, name: &str, mixin: Callable) -> Result<(), Callable> {
        self.try_assign::<Mixins>(name, mixin)
    }

    pub fn set_local_mixin(&self, name: &str, mixin: Callable) {
        self.declare_local::<Mixins>(name, mixin);
    }

    pub fn set_global_mixin(&self, name: &str, mixin: Callable) {
        self.declare_global::<Mixins>(name, mixin);
    }

    pub fn set_function(&self, name: &str, function: Callable) {
        self.assign_or_declare::<Functions>(name, function);
    }

    pub fn try_set_function(&self, name: &str, function: Callable) -> Result<(), Callable> {
        self.try_assign::<Functions>(name, function)
    }

    pub fn set_local_function(&self, name: &str, function: Callable) {
        self.declare_local::<Functions>(name, function);
    }

    pub fn set_global_function(&self, name: &str, function: Callable) {
        self.declare_global::<Functions>(name, function);
    }

    // One-time warnings

    /// Warn, once per variable and location, about assigning a global
    /// variable from a nested scope without `!global`.
    ///
    /// Keys are recorded on the root. Returns whether this call was the
    /// first for its key (the warning may still be muted by `quiet`).
    pub fn warn_global_assignment(
        &self,
        logger: &dyn Logger,
        name: &str,
        location: &SourceLocation,
    ) -> bool {
        let key = (Name::new(name), location.filename.clone(), location.line);
        let first = self.with_warnings(|ledger| ledger.global_warning_given.insert(key));
        if first && !self.options().quiet {
            let name = Name::normalize(name);
            logger.warn(&format!(
                "DEPRECATION WARNING on {location}:\n\
                 Assigning to global variable \"${name}\" from a nested scope without !global is deprecated.\n\
                 Write \"${name}: <value> !global\" to keep assigning to the global variable."
            ));
        }
        first
    }

    /// Warn, once per location, about relying on a `false` result that will
    /// become `null`.
    pub fn warn_deprecated_false(&self, logger: &dyn Logger, location: &SourceLocation) -> bool {
        let key = (location.filename.clone(), location.line);
        let first = self.with_warnings(|ledger| ledger.deprecated_false_warning_given.insert(key));
        if first && !self.options().quiet {
            logger.warn(&format!(
                "DEPRECATION WARNING on {location}:\n\
                 This result will change from false to null; avoid comparing it with \"== false\"."
            ));
        }
        first
    }
}

impl Scoped for Environment {
    fn options(&self) -> &SharedOptions {
        &self.0.options
    }

    fn get<N: Namespace>(&self, name: &str) -> Option<N::Value> {
        let name = Name::normalize(name);
        self.scopes()
            .find_map(|scope| N::table(&scope.bindings.borrow()).get(&name).cloned())
    }

    fn is_global<N: Namespace>(&self, name: &str) -> bool {
        let name = Name::normalize(name);
        self.scopes()
            .find(|scope| N::table(&scope.bindings.borrow()).contains(&name))
            .is_some_and(|scope| scope.parent().is_none())
    }

    /// Local selector, else the call site's, else the lexical parent's.
    fn selector(&self) -> Option<SelectorList> {
        if let Some(selector) = self.0.selector.borrow().clone() {
            return Some(selector);
        }
        if let Some(selector) = self.0.caller.as_ref().and_then(EnvRef::selector) {
            return Some(selector);
        }
        self.parent().and_then(Scoped::selector)
    }

    fn global_env(&self) -> Environment {
        match &self.0.link {
            Link::Root { .. } => self.clone(),
            Link::Child { parent, global } => global.get_or_init(|| parent.global_env()).clone(),
        }
    }
}

/// Non-owning handle to an [`Environment`].
///
/// Callables hold their declaring scope this way, since that scope usually
/// stores the callable in its own bindings.
#[derive(Clone)]
pub struct WeakEnvironment(Weak<Scope>);

impl WeakEnvironment {
    /// The scope, if some `Environment` handle still holds it.
    pub fn upgrade(&self) -> Option<Environment> {
        self.0.upgrade().map(Environment)
    }
}

impl fmt::Debug for WeakEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.0.strong_count() > 0 { "live" } else { "dropped" };
        write!(f, "WeakEnvironment({state})")
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.0.bindings.borrow();
        let mut variables: Vec<&str> = bindings.variables.names().map(Name::as_str).collect();
        variables.sort_unstable();
        f.debug_struct("Environment")
            .field("depth", &self.depth())
            .field("variables", &variables)
            .field("mixins", &bindings.mixins.len())
            .field("functions", &bindings.functions.len())
            .field("has_caller", &self.0.caller.is_some())
            .field("has_content", &self.0.content.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
