use jfunc::{
    evaluate_with_json, has_function, register_function, unregister_function, Argument, CustomFunction,
    Error, FunctionRegistry, Scope,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

// Global test mutex to prevent concurrent access to the global function registry
static TEST_MUTEX: Mutex<()> = Mutex::new(());

/// Doubles a number
struct DoubleFunction;

impl CustomFunction for DoubleFunction {
    fn name(&self) -> &str {
        "double"
    }

    fn arity(&self) -> usize {
        1
    }

    fn execute(&self, _scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value, Error> {
        Ok(Value::from(args[0].as_f64() * 2.0))
    }

    fn description(&self) -> Option<&str> {
        Some("Doubles a number")
    }
}

/// Writes a stamp into the enclosing document
struct StampFunction;

impl CustomFunction for StampFunction {
    fn name(&self) -> &str {
        "stamp"
    }

    fn arity(&self) -> usize {
        2
    }

    fn execute(&self, scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value, Error> {
        let key = args[0].key_name();
        let text = args[1]
            .as_text()
            .ok_or_else(|| Error::invalid_argument("stamp", "second argument is absent"))?;
        scope.document.insert(key, Value::String(text.clone()));
        Ok(Value::String(text))
    }
}

#[test]
fn test_custom_function_registration() {
    let _lock = TEST_MUTEX.lock().unwrap();
    unregister_function("double");

    assert!(register_function(Arc::new(DoubleFunction)).is_ok());
    assert!(has_function("double"));
    assert_eq!(evaluate_with_json("double(n)", r#"{"n": 21}"#), Ok(json!(42.0)));

    assert!(unregister_function("double"));
    assert!(!has_function("double"));
    assert!(matches!(
        evaluate_with_json("double(n)", r#"{"n": 21}"#),
        Err(Error::UnknownFunction { .. })
    ));
}

/// Tries to take over a standard built-in name
struct ShadowCountArray;

impl CustomFunction for ShadowCountArray {
    fn name(&self) -> &str {
        "countArray"
    }

    fn arity(&self) -> usize {
        1
    }

    fn execute(&self, _scope: &mut Scope<'_>, _args: &[Argument]) -> Result<Value, Error> {
        Ok(json!(-1))
    }
}

#[test]
fn test_builtins_cannot_be_removed_or_replaced() {
    let _lock = TEST_MUTEX.lock().unwrap();

    assert!(!unregister_function("countArray"));
    assert!(has_function("countArray"));
    assert!(matches!(
        register_function(Arc::new(ShadowCountArray)),
        Err(Error::InvalidDescriptor(_))
    ));
    assert_eq!(evaluate_with_json("countArray(array)", r#"{"array": [1, 2]}"#), Ok(json!(2)));
}

#[test]
fn custom_function_can_edit_the_document() {
    let registry = FunctionRegistry::with_builtins();
    registry.register(Arc::new(StampFunction)).unwrap();
    let snap = registry.snapshot();

    let mut doc = jfunc::Document::try_from(json!({"who": "owner", "v": "x"})).unwrap();
    let result = jfunc::invoker::call(&snap, "stamp(who,v)", &mut Scope::new(&mut doc));
    assert_eq!(result, Ok(json!("x")));
    assert_eq!(doc.get("owner"), Some(&json!("x")));

    let result = jfunc::invoker::call(&snap, "stamp(who,missing)", &mut Scope::new(&mut doc));
    assert!(matches!(result, Err(Error::InvalidArgument { .. })));
}

#[test]
fn overloads_are_chosen_by_arity() {
    let registry = FunctionRegistry::new();
    registry.register(Arc::new(DoubleFunction)).unwrap();
    registry.register(Arc::new(StampFunction)).unwrap();
    let snap = registry.snapshot();
    assert_eq!(snap.list_functions(), vec!["double".to_string(), "stamp".to_string()]);
    assert!(snap.function("plus", 2).is_err());

    let err = snap.function("double", 3).err().unwrap();
    assert_eq!(err.to_string(), "double expects 1 arguments, got 3");
}
