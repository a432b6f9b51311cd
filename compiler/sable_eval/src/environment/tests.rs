use super::*;
use std::sync::Arc;

use crate::options::Options;
use pretty_assertions::assert_eq;
use sable_diagnostic::{LogLevel, RecordingLogger};

fn chain(len: usize) -> Vec<Environment> {
    let mut envs = vec![Environment::root(SharedOptions::default())];
    for _ in 1..len {
        let next = envs[envs.len() - 1].child();
        envs.push(next);
    }
    envs
}

#[test]
fn test_lookup_falls_back_to_outer_scopes_only() {
    let envs = chain(4);
    envs[1].set_local_var("x", Value::number(1.0));

    assert_eq!(envs[0].var("x"), None);
    for env in &envs[1..] {
        assert_eq!(env.var("x"), Some(Value::number(1.0)));
    }
}

#[test]
fn test_names_are_normalized() {
    let root = Environment::root(SharedOptions::default());
    root.set_var("main_color", Value::ident("red"));
    assert_eq!(root.var("main-color"), Some(Value::ident("red")));
    assert_eq!(root.var("main_color"), Some(Value::ident("red")));
}

#[test]
fn test_assignment_mutates_existing_outer_binding() {
    let envs = chain(4);
    envs[1].set_local_var("x", Value::number(1.0));

    envs[3].set_var("x", Value::number(2.0));

    // Visible from an intermediate scope, so depth 1 was mutated in place
    assert_eq!(envs[2].var("x"), Some(Value::number(2.0)));
    assert_eq!(envs[1].var("x"), Some(Value::number(2.0)));
    assert!(!envs[3].0.bindings.borrow().variables.contains("x"));
}

#[test]
fn test_assignment_declares_locally_when_unbound() {
    let envs = chain(3);
    envs[2].set_var("y", Value::number(5.0));

    assert_eq!(envs[2].var("y"), Some(Value::number(5.0)));
    assert_eq!(envs[1].var("y"), None);
    assert_eq!(envs[0].var("y"), None);
}

#[test]
fn test_try_assign_reports_failure_without_declaring() {
    let envs = chain(2);
    assert_eq!(
        envs[1].try_set_var("z", Value::number(1.0)),
        Err(Value::number(1.0))
    );
    assert_eq!(envs[1].var("z"), None);

    envs[0].set_local_var("z", Value::Null);
    assert_eq!(envs[1].try_set_var("z", Value::Bool(true)), Ok(()));
    assert_eq!(envs[0].var("z"), Some(Value::Bool(true)));
}

#[test]
fn test_local_declaration_shadows_without_touching_outer() {
    let envs = chain(2);
    envs[0].set_var("x", Value::number(1.0));

    envs[1].set_local_var("x", Value::number(2.0));

    assert_eq!(envs[1].var("x"), Some(Value::number(2.0)));
    assert_eq!(envs[0].var("x"), Some(Value::number(1.0)));
}

#[test]
fn test_is_global_follows_nearest_binder() {
    let envs = chain(3);
    assert!(!envs[2].is_var_global("x"));
    assert!(!envs[0].is_var_global("x"));

    envs[0].set_var("x", Value::number(1.0));
    assert!(envs[0].is_var_global("x"));
    assert!(envs[2].is_var_global("x"));

    envs[1].set_local_var("x", Value::number(2.0));
    assert!(!envs[2].is_var_global("x"));
    assert!(envs[0].is_var_global("x"));
}

#[test]
fn test_declare_global_ignores_nearer_bindings() {
    let envs = chain(3);
    envs[1].set_local_var("x", Value::number(1.0));

    envs[2].set_global_var("x", Value::number(9.0));

    assert_eq!(envs[0].var("x"), Some(Value::number(9.0)));
    // The shadowing binding is untouched
    assert_eq!(envs[2].var("x"), Some(Value::number(1.0)));
}

#[test]
fn test_namespaces_are_independent() {
    let root = Environment::root(SharedOptions::default());
    let mixin = Callable::mixin("button", &["color"], Vec::new(), &root);
    root.set_mixin("button", mixin.clone());

    assert_eq!(root.mixin("button"), Some(mixin));
    assert_eq!(root.function("button"), None);
    assert_eq!(root.var("button"), None);
    assert!(root.is_mixin_global("button"));
    assert!(!root.is_function_global("button"));
}

#[test]
fn test_mixin_and_function_setters_walk_the_chain() {
    let envs = chain(2);
    let first = Callable::function("double", &["n"], Vec::new(), &envs[0]);
    let second = Callable::function("double", &["x"], Vec::new(), &envs[0]);
    envs[0].set_local_function("double", first);

    envs[1].set_function("double", second.clone());
    assert_eq!(envs[0].function("double"), Some(second));

    let helper = Callable::mixin("helper", &[], Vec::new(), &envs[1]);
    assert!(envs[1].try_set_mixin("helper", helper.clone()).is_err());
    envs[1].set_global_mixin("helper", helper.clone());
    assert_eq!(envs[0].mixin("helper"), Some(helper));
}

#[test]
fn test_options_inherit_from_parent() {
    let options = Options {
        quiet: true,
        ..Options::default()
    }
    .into_shared();
    let root = Environment::root(options.clone());
    let child = root.child();
    assert!(Arc::ptr_eq(child.options(), &options));

    let own = Options::default().into_shared();
    let explicit = Environment::new(Some(&root), Some(own.clone()));
    assert!(Arc::ptr_eq(explicit.options(), &own));
}

#[test]
fn test_global_env_and_stack_come_from_root() {
    let envs = chain(4);
    for env in &envs {
        assert!(env.global_env().ptr_eq(&envs[0]));
        assert!(env.stack().ptr_eq(&envs[0].stack()));
    }
    assert_eq!(envs[3].depth(), 3);
    assert!(envs[0].is_root());
    assert!(!envs[3].is_root());
}

#[test]
fn test_root_with_stack_shares_the_given_stack() {
    let stack = SharedStack::new();
    let root = Environment::root_with_stack(SharedOptions::default(), stack.clone());
    assert!(root.child().stack().ptr_eq(&stack));
}

#[test]
fn test_caller_and_content_fall_back_lexically() {
    let root = Environment::root(SharedOptions::default());
    let call_site = root.child();
    let mixin = Callable::mixin("m", &[], Vec::new(), &root);
    let content = Content::new(vec![Node::Css("a { b: c }".into())], call_site.clone().into());

    let Some(body) = mixin.invocation_environment(call_site.clone().into(), Some(content)) else {
        panic!("declaring scope is alive");
    };
    let nested = body.child();

    assert!(root.caller().is_none());
    assert!(root.content().is_none());
    let caller = nested.caller().map(|c| c.ptr_eq(&EnvRef::Owned(call_site.clone())));
    assert_eq!(caller, Some(true));
    let content = nested.content().map(|c| c.nodes.len());
    assert_eq!(content, Some(1));
}

#[test]
fn test_selector_prefers_local_then_caller_then_parent() {
    let root = Environment::root(SharedOptions::default());
    let definition = root.child();
    definition.set_selector(SelectorList::new(["nav"]));

    let call_site = root.child();
    call_site.set_selector(SelectorList::new([".button"]));

    let body = Environment::for_call(&definition, call_site.clone().into(), None);
    assert_eq!(body.selector(), Some(SelectorList::new([".button"])));

    body.set_selector(SelectorList::new(["a"]));
    assert_eq!(body.selector(), Some(SelectorList::new(["a"])));

    // No caller: purely lexical
    assert_eq!(definition.child().selector(), Some(SelectorList::new(["nav"])));
    assert_eq!(root.selector(), None);
}

#[test]
fn test_rule_scope_resolves_against_enclosing_selector() {
    let root = Environment::root(SharedOptions::default());
    let nav = root.rule_scope(&SelectorList::new(["nav", "aside"]));
    let link = nav.rule_scope(&SelectorList::new(["a"]));
    let hover = link.rule_scope(&SelectorList::new(["&:hover"]));

    assert_eq!(nav.selector(), Some(SelectorList::new(["nav", "aside"])));
    assert_eq!(link.selector(), Some(SelectorList::new(["nav a", "aside a"])));
    let rendered = hover.selector().map(|selector| selector.to_string());
    assert_eq!(rendered.as_deref(), Some("nav a:hover, aside a:hover"));
    assert!(hover.parent().is_some_and(|parent| parent.ptr_eq(&link)));
    assert_eq!(root.selector(), None);
}

#[test]
fn test_rule_scope_in_mixin_body_nests_under_call_site() {
    let root = Environment::root(SharedOptions::default());
    let call_site = root.rule_scope(&SelectorList::new([".card"]));
    let body = Environment::for_call(&root, call_site.into(), None);

    let title = body.rule_scope(&SelectorList::new(["h2"]));
    assert_eq!(title.selector(), Some(SelectorList::new([".card h2"])));
}

#[test]
fn test_global_assignment_warning_is_emitted_once_per_key() {
    let envs = chain(3);
    let logger = RecordingLogger::default();
    let here = SourceLocation::in_file(4, "main.scss");
    let there = SourceLocation::in_file(9, "main.scss");

    assert!(envs[2].warn_global_assignment(&logger, "main_color", &here));
    assert!(!envs[1].warn_global_assignment(&logger, "main-color", &here));
    assert!(envs[2].warn_global_assignment(&logger, "main-color", &there));

    let messages = logger.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].0, LogLevel::Warn);
    assert!(messages[0].1.starts_with("DEPRECATION WARNING on line 4 of main.scss:"));
    assert!(messages[0].1.contains("\"$main-color\""));
    let key = (Name::new("main-color"), Some("main.scss".to_string()), 9);
    assert!(envs[2].with_warnings(|ledger| ledger.global_warning_given.contains(&key)));
    assert!(envs[0].with_warnings(|ledger| ledger.global_warning_given.len() == 2));
}

#[test]
fn test_quiet_suppresses_warnings_but_records_key() {
    let options = Options {
        quiet: true,
        ..Options::default()
    }
    .into_shared();
    let env = Environment::root(options).child();
    let logger = RecordingLogger::default();
    let location = SourceLocation::new(2, None);

    assert!(env.warn_deprecated_false(&logger, &location));
    assert!(!env.warn_deprecated_false(&logger, &location));
    assert!(logger.messages().is_empty());
}

#[test]
fn test_warning_respects_logger_threshold() {
    let env = Environment::root(SharedOptions::default());
    let logger = RecordingLogger::new(LogLevel::Error);
    assert!(env.warn_deprecated_false(&logger, &SourceLocation::new(1, None)));
    assert!(logger.messages().is_empty());
}

#[test]
fn test_debug_lists_local_variables() {
    let root = Environment::root(SharedOptions::default());
    root.set_var("b", Value::Null);
    root.set_var("a", Value::Null);
    let rendered = format!("{root:?}");
    assert!(rendered.starts_with("Environment { depth: 0, variables: [\"a\", \"b\"]"));
}

#[test]
fn test_declared_callables_do_not_keep_their_scope_alive() {
    let root = Environment::root(SharedOptions::default());
    let scope = Rc::downgrade(&root.0);
    root.set_mixin("m", Callable::mixin("m", &[], Vec::new(), &root));
    root.set_function("f", Callable::function("f", &[], Vec::new(), &root));

    drop(root);
    assert!(scope.upgrade().is_none());
}

#[test]
fn test_nested_declaration_is_freed_with_its_scope() {
    let root = Environment::root(SharedOptions::default());
    let block = root.child();
    let scope = Rc::downgrade(&block.0);
    block.set_local_mixin("m", Callable::mixin("m", &[], Vec::new(), &block));

    drop(block);
    assert!(scope.upgrade().is_none());
    assert_eq!(Rc::strong_count(&root.0), 1);
}

#[test]
fn test_weak_handle_upgrades_while_scope_lives() {
    let root = Environment::root(SharedOptions::default());
    let weak = root.child().downgrade();
    assert!(weak.upgrade().is_none());
    assert_eq!(format!("{weak:?}"), "WeakEnvironment(dropped)");

    let weak = root.downgrade();
    assert!(weak.upgrade().is_some_and(|env| env.ptr_eq(&root)));
    assert_eq!(format!("{weak:?}"), "WeakEnvironment(live)");
}
