//! Tests for DispatchTable, MethodTable and validation helpers

use std::sync::Arc;

use riposte::protocol::{codes, Value};
use riposte::server::{validate, CallContext, DispatchTable, MethodTable, ServiceHandler};

fn ctx(service_id: i32, method_id: i32) -> CallContext {
    CallContext {
        service_id,
        method_id,
        auth_code: None,
    }
}

fn named(name: &'static str) -> Arc<dyn ServiceHandler> {
    Arc::new(MethodTable::new(name).method(1, name, move |_args, _ctx| Ok(Value::from(name))))
}

// =============================================================================
// DispatchTable Tests
// =============================================================================

#[test]
fn test_register_and_resolve() {
    let mut table = DispatchTable::new();
    assert!(table.is_empty());

    table.register(7, named("seven"));

    assert_eq!(table.len(), 1);
    assert!(table.resolve(7).is_some());
    assert!(table.resolve(8).is_none());
}

#[test]
fn test_register_last_write_wins() {
    let mut table = DispatchTable::new();
    assert!(table.register(1, named("old")).is_none());
    assert!(table.register(1, named("new")).is_some());

    let handler = table.resolve(1).unwrap();
    let result = handler.dispatch(1, vec![], &ctx(1, 1)).unwrap();

    assert_eq!(result, Value::from("new"));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_from_iterator() {
    let table: DispatchTable = vec![(1, named("one")), (2, named("two"))].into_iter().collect();

    let mut ids: Vec<i32> = table.service_ids().collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_debug_lists_service_ids() {
    let table: DispatchTable = vec![(3, named("c")), (1, named("a"))].into_iter().collect();
    assert_eq!(format!("{:?}", table), "DispatchTable { services: [1, 3] }");
}

// =============================================================================
// MethodTable Tests
// =============================================================================

#[test]
fn test_method_table_dispatch() {
    let table = MethodTable::new("Math")
        .method(1, "double", |args, _ctx| {
            let n = validate::check_some(validate::arg(&args, 0)?.as_i32(), "expected int")?;
            Ok(Value::Int(n * 2))
        });

    assert_eq!(table.service_name(), "Math");
    assert_eq!(
        table.dispatch(1, vec![Value::Int(21)], &ctx(1, 1)).unwrap(),
        Value::Int(42)
    );
}

#[test]
fn test_method_table_unknown_method() {
    let table = MethodTable::new("Math");
    let err = table.dispatch(5, vec![], &ctx(1, 5)).unwrap_err();

    assert_eq!(err.cause(), codes::METHOD_NOT_FOUND);
    assert!(!err.is_loggable());
}

#[test]
fn test_method_name_without_invocation() {
    let table = MethodTable::new("Users")
        .method(1, "lookup", |_args, _ctx| Ok(Value::Null))
        .method(2, "rename", |_args, _ctx| Ok(Value::Null));

    assert_eq!(table.method_name(1), Some("lookup"));
    assert_eq!(table.method_name(2), Some("rename"));
    assert_eq!(table.method_name(3), None);
}

#[test]
fn test_method_receives_context() {
    let table = MethodTable::new("Auth").method(9, "who", |_args, ctx| {
        Ok(Value::from(format!("{}:{}:{:?}", ctx.service_id, ctx.method_id, ctx.auth_code)))
    });

    let context = CallContext {
        service_id: 4,
        method_id: 9,
        auth_code: Some("abc".to_string()),
    };
    assert_eq!(
        table.dispatch(9, vec![], &context).unwrap(),
        Value::from("4:9:Some(\"abc\")")
    );
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_check() {
    assert!(validate::check(true, "unused").is_ok());

    let err = validate::check(false, "name required").unwrap_err();
    assert_eq!(err.cause(), "name required");
    assert!(!err.is_loggable());
}

#[test]
fn test_check_some() {
    assert_eq!(validate::check_some(Some(3), "missing").unwrap(), 3);
    assert_eq!(
        validate::check_some(None::<i32>, "missing").unwrap_err().cause(),
        "missing"
    );
}

#[test]
fn test_arg_out_of_range() {
    let args = vec![Value::Int(1)];
    assert_eq!(validate::arg(&args, 0).unwrap(), &Value::Int(1));

    let err = validate::arg(&args, 1).unwrap_err();
    assert_eq!(err.cause(), "Missing argument 1 (got 1)");
}
