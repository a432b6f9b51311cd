use super::*;
use crate::options::Options;
use crate::tree::Node;
use pretty_assertions::assert_eq;
use sable_ir::Value;

fn body_with_captures() -> (Environment, Environment, Environment) {
    let root = Environment::root(SharedOptions::default());
    let call_site = root.child();
    let content = Content::new(vec![Node::Css("p { m: 0 }".into())], call_site.clone().into());
    let body = Environment::for_call(&root, call_site.clone().into(), Some(content));
    (root, call_site, body)
}

#[test]
fn test_reads_forward_to_wrapped_environment() {
    let (root, _, body) = body_with_captures();
    root.set_var("gutter", Value::dimension(8.0, "px"));
    let view = as_read_only(&body.clone().into());

    assert_eq!(view.var("gutter"), Some(Value::dimension(8.0, "px")));
    assert!(view.is_var_global("gutter"));
    assert!(view.global_env().ptr_eq(&root));
    assert!(view.stack().ptr_eq(&root.stack()));

    // Later writes through the owner are visible
    body.set_local_var("gutter", Value::number(0.0));
    assert_eq!(view.var("gutter"), Some(Value::number(0.0)));
    assert!(!view.is_var_global("gutter"));
}

#[test]
fn test_caller_is_wrapped_once_and_memoized() {
    let (_, call_site, body) = body_with_captures();
    let view = as_read_only(&body.into());

    let first = view.caller();
    let second = view.caller();
    let (Some(first), Some(second)) = (first, second) else {
        panic!("body has a caller");
    };
    assert!(first.ptr_eq(&second));
    assert!(matches!(first.wrapped(), EnvRef::Owned(env) if env.ptr_eq(&call_site)));
}

#[test]
fn test_content_is_wrapped_once_and_memoized() {
    let (_, call_site, body) = body_with_captures();
    let view = as_read_only(&body.into());

    let first = view.content().map(|content| content.environment);
    let second = view.content().map(|content| content.environment);
    let (Some(first), Some(second)) = (first, second) else {
        panic!("body has a content block");
    };
    assert!(first.ptr_eq(&second));
    assert!(matches!(first.wrapped(), EnvRef::Owned(env) if env.ptr_eq(&call_site)));
    assert_eq!(view.content().map(|content| content.nodes.len()), Some(1));
}

#[test]
fn test_already_read_only_capture_is_not_rewrapped() {
    let root = Environment::root(SharedOptions::default());
    let call_site = as_read_only(&root.child().into());
    let body = Environment::for_call(&root, call_site.clone().into(), None);

    let view = as_read_only(&body.into());
    let caller = view.caller();
    assert!(caller.is_some_and(|caller| caller.ptr_eq(&call_site)));
}

#[test]
fn test_as_read_only_is_idempotent() {
    let root = Environment::root(SharedOptions::default());
    let view = as_read_only(&root.into());
    let again = as_read_only(&EnvRef::Viewed(view.clone()));
    assert!(again.ptr_eq(&view));
}

#[test]
fn test_view_of_view_forwards_captures() {
    let (_, call_site, body) = body_with_captures();
    let inner = as_read_only(&body.into());
    let outer = ReadOnlyEnvironment::new(inner.clone(), inner.options().clone());

    assert!(!outer.ptr_eq(&inner));
    let caller = outer.caller();
    assert!(caller.is_some_and(|caller| {
        matches!(caller.wrapped(), EnvRef::Owned(env) if env.ptr_eq(&call_site))
    }));
    // The inner view's memoized wrapper is reused, not wrapped again
    let (Some(a), Some(b)) = (outer.caller(), inner.caller()) else {
        panic!("body has a caller");
    };
    assert!(a.ptr_eq(&b));
}

#[test]
fn test_view_reports_its_own_options() {
    let root = Environment::root(SharedOptions::default());
    let options = Options {
        filename: Some("main.scss".into()),
        ..Options::default()
    }
    .into_shared();
    let view = ReadOnlyEnvironment::new(root, options);
    assert_eq!(view.options().filename.as_deref(), Some("main.scss"));
}

#[test]
fn test_selector_forwards_through_caller() {
    let root = Environment::root(SharedOptions::default());
    let call_site = root.child();
    call_site.set_selector(SelectorList::new([".card"]));
    let body = Environment::for_call(&root, call_site.into(), None);

    let view = as_read_only(&body.into());
    assert_eq!(view.selector(), Some(SelectorList::new([".card"])));
}

#[test]
fn test_envref_dispatch_and_equality() {
    let root = Environment::root(SharedOptions::default());
    root.set_var("a", Value::Bool(true));
    let owned = EnvRef::from(root.clone());
    let viewed = EnvRef::from(as_read_only(&owned));

    assert_eq!(owned.var("a"), viewed.var("a"));
    assert!(owned.ptr_eq(&EnvRef::Owned(root)));
    assert!(!owned.ptr_eq(&viewed));
    assert!(viewed.caller().is_none());
    assert!(viewed.content().is_none());
}
