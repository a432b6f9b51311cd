//! Mixin and function descriptors.

use std::fmt;
use std::rc::Rc;

use sable_diagnostic::{SyntaxError, SyntaxResult};
use sable_ir::{Name, SourceLocation};

use crate::environment::{Content, EnvRef, Environment, WeakEnvironment};
use crate::stack::SharedStack;
use crate::tree::Node;

/// Which namespace a callable was declared in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallableKind {
    Mixin,
    Function,
}

impl CallableKind {
    pub fn name(self) -> &'static str {
        match self {
            CallableKind::Mixin => "mixin",
            CallableKind::Function => "function",
        }
    }
}

/// A user-defined mixin or function, closed over its defining scope.
#[derive(Clone)]
pub struct Callable {
    pub name: Name,
    pub params: Vec<Name>,
    /// Name bound to any extra arguments (`$args...`).
    pub rest: Option<Name>,
    pub body: Rc<[Node]>,
    /// Whether the body contains `@content`.
    pub has_content: bool,
    pub kind: CallableKind,
    /// Scope the callable was declared in. Not kept alive by the callable.
    pub environment: WeakEnvironment,
}

impl Callable {
    pub fn mixin(name: &str, params: &[&str], body: Vec<Node>, environment: &Environment) -> Self {
        Self::declare(CallableKind::Mixin, name, params, body, environment)
    }

    pub fn function(
        name: &str,
        params: &[&str],
        body: Vec<Node>,
        environment: &Environment,
    ) -> Self {
        Self::declare(CallableKind::Function, name, params, body, environment)
    }

    fn declare(
        kind: CallableKind,
        name: &str,
        params: &[&str],
        body: Vec<Node>,
        environment: &Environment,
    ) -> Self {
        Callable {
            name: Name::new(name),
            params: params.iter().map(|p| Name::new(p)).collect(),
            rest: None,
            body: body.into(),
            has_content: false,
            kind,
            environment: environment.downgrade(),
        }
    }

    #[must_use]
    pub fn with_rest(mut self, rest: &str) -> Self {
        self.rest = Some(Name::new(rest));
        self
    }

    #[must_use]
    pub fn with_content_block(mut self) -> Self {
        self.has_content = true;
        self
    }

    /// Scope for one invocation of the body.
    ///
    /// Lexically nested in the declaring scope, with `caller` recording the
    /// call site and `content` the block passed to `@include`, if any.
    /// Arguments are then bound with `declare_local` so they shadow rather
    /// than overwrite outer bindings of the same name.
    ///
    /// `None` once the declaring scope has been dropped.
    pub fn invocation_environment(
        &self,
        caller: EnvRef,
        content: Option<Content>,
    ) -> Option<Environment> {
        let declaring = self.environment.upgrade()?;
        Some(Environment::for_call(&declaring, caller, content))
    }

    /// Evaluate `body` in a fresh invocation scope.
    ///
    /// A mixin body runs inside a `Mixin` frame opened at `call_site`, so
    /// errors it raises through [`SharedStack::attach_backtrace`] name the
    /// `@include`.
    ///
    /// # Errors
    ///
    /// Fails at `call_site` when the declaring scope no longer exists;
    /// otherwise returns whatever `body` does.
    pub fn invoke<T>(
        &self,
        stack: &SharedStack,
        call_site: &SourceLocation,
        caller: EnvRef,
        content: Option<Content>,
        body: impl FnOnce(&Environment) -> SyntaxResult<T>,
    ) -> SyntaxResult<T> {
        let Some(scope) = self.invocation_environment(caller, content) else {
            let err = SyntaxError::new(format!(
                "The scope declaring {} {} has already ended.",
                self.kind.name(),
                self.name
            ));
            return Err(stack.attach_backtrace(err.with_location(call_site.clone())));
        };
        tracing::trace!(kind = self.kind.name(), name = %self.name, "invoking");
        match self.kind {
            CallableKind::Mixin => stack.with_mixin(
                call_site.filename.as_deref(),
                call_site.line,
                self.name.as_str(),
                || body(&scope),
            ),
            CallableKind::Function => body(&scope),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("rest", &self.rest)
            .field("has_content", &self.has_content)
            .finish_non_exhaustive()
    }
}

/// Two callables are the same declaration when they share a body.
impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name && Rc::ptr_eq(&self.body, &other.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Scoped;
    use crate::options::SharedOptions;
    use sable_ir::Value;

    #[test]
    fn test_invocation_scope_nests_in_declaring_scope() {
        let root = Environment::root(SharedOptions::default());
        let library = root.child();
        library.set_local_var("radius", Value::dimension(4.0, "px"));
        let mixin = Callable::mixin("rounded", &["size"], Vec::new(), &library)
            .with_rest("extra_args")
            .with_content_block();

        let call_site = root.child();
        let Some(body) = mixin.invocation_environment(call_site.clone().into(), None) else {
            panic!("declaring scope is alive");
        };
        body.set_local_var("size", Value::number(2.0));

        assert!(body.parent().is_some_and(|parent| parent.ptr_eq(&library)));
        assert_eq!(body.var("radius"), Some(Value::dimension(4.0, "px")));
        assert_eq!(call_site.var("size"), None);
        assert!(body.caller().is_some_and(|caller| caller.ptr_eq(&call_site.into())));
        assert_eq!(mixin.rest.as_ref().map(Name::as_str), Some("extra-args"));
        assert!(mixin.has_content);
    }

    #[test]
    fn test_equality_is_by_declaration() {
        let root = Environment::root(SharedOptions::default());
        let a = Callable::function("f", &["x"], Vec::new(), &root);
        let b = Callable::function("f", &["x"], Vec::new(), &root);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.kind, CallableKind::Function);
    }

    #[test]
    fn test_invocation_after_declaring_scope_ends() {
        let root = Environment::root(SharedOptions::default());
        let block = root.child();
        let mixin = Callable::mixin("gone", &[], Vec::new(), &block);
        drop(block);

        assert!(mixin.invocation_environment(root.clone().into(), None).is_none());

        let stack = root.stack();
        let call_site = SourceLocation::in_file(8, "main.scss");
        let Err(err) = mixin.invoke(&stack, &call_site, root.into(), None, |_| Ok(())) else {
            panic!("invocation must fail");
        };
        assert_eq!(err.message, "The scope declaring mixin gone has already ended.");
        assert_eq!(err.location, Some(call_site));
        assert!(err.backtrace.is_empty());
    }

    #[test]
    fn test_mixin_body_runs_inside_its_frame() {
        let root = Environment::root(SharedOptions::default());
        let mixin = Callable::mixin("columns", &["n"], Vec::new(), &root);
        let stack = root.stack();
        let call_site = SourceLocation::in_file(3, "_grid.scss");

        let result = stack.with_import(Some("main.scss"), 1, "grid", || {
            mixin.invoke(&stack, &call_site, root.clone().into(), None, |body| {
                body.set_local_var("n", Value::number(12.0));
                assert!(body.parent().is_some_and(|parent| parent.ptr_eq(&root)));
                assert_eq!(stack.borrow().depth(), 2);
                let raised = SyntaxError::new("Undefined variable: \"$width\".")
                    .with_location(SourceLocation::in_file(5, "_grid.scss"));
                Err::<(), _>(stack.attach_backtrace(raised))
            })
        });
        let Err(err) = result else {
            panic!("body error must propagate");
        };

        assert_eq!(root.var("n"), None);
        assert!(stack.borrow().is_empty());
        assert_eq!(
            err.report(),
            "Error: Undefined variable: \"$width\".\n        \
             on line 5 of _grid.scss\n        \
             from line 3 of _grid.scss, in mixin `columns`\n        \
             from line 1 of main.scss, in @import \"grid\""
        );
    }

    #[test]
    fn test_function_body_opens_no_frame() {
        let root = Environment::root(SharedOptions::default());
        let function = Callable::function("double", &["x"], Vec::new(), &root);
        let stack = root.stack();

        let depth = function.invoke(
            &stack,
            &SourceLocation::in_file(2, "main.scss"),
            root.clone().into(),
            None,
            |_| Ok(stack.borrow().depth()),
        );
        assert_eq!(depth, Ok(0));
    }
}
