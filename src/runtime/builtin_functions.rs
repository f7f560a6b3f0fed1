use super::{access, arithmetic, collection, introspection, type_casting};
use crate::custom::{Builtin, CustomFunction, Handler, Scope};
use crate::error::{Error, Result};
use crate::registry::{insert_overload, BuiltinTable, Snapshot};
use crate::types::Document;
use serde_json::{json, Value};
use std::sync::Arc;

const fn builtin(
    name: &'static str,
    arity: usize,
    handler: Handler,
    description: &'static str,
    example: &'static str,
) -> Builtin {
    Builtin { name, arity, handler, description, example }
}

/// Every standard built-in, one entry per overload
pub const BUILTINS: &[Builtin] = &[
    builtin("plus", 2, arithmetic::plus, "Sum of two numbers", "plus(i0,i1)"),
    builtin("minus", 2, arithmetic::minus, "Difference of two numbers", "minus(i0,i1)"),
    builtin("multiply", 2, arithmetic::multiply, "Product of two numbers", "multiply(i0,i1)"),
    builtin("divide", 2, arithmetic::divide, "Quotient of two numbers", "divide(i0,i1)"),
    builtin("isArrayEmpty", 1, collection::is_array_empty, "Whether the array is absent or empty", "isArrayEmpty(array)"),
    builtin("isObjectEmpty", 1, collection::is_object_empty, "Whether the object is absent or empty", "isObjectEmpty(object)"),
    builtin("isContain", 2, collection::is_contain, "Whether the array contains the value", "isContain(array,id)"),
    builtin("isContainKey", 2, collection::is_contain_key, "Whether the object contains the key", "isContainKey(object,key)"),
    builtin("isContainValue", 2, collection::is_contain_value, "Whether the object contains the value", "isContainValue(object,value)"),
    builtin("countArray", 1, collection::count_array, "Number of array elements", "countArray(array)"),
    builtin("countObject", 1, collection::count_object, "Number of object entries", "countObject(object)"),
    builtin("getFromArray", 2, collection::get_from_array, "Element at a position", "getFromArray(array,@position)"),
    builtin("getFromObject", 2, collection::get_from_object, "Value at a key", "getFromObject(object,key)"),
    builtin("removeIndex", 1, collection::remove_index, "Remove the document entry at a position", "removeIndex(position)"),
    builtin("removeKey", 1, collection::remove_key, "Remove a document key", "removeKey(key)"),
    builtin("booleanValue", 1, type_casting::boolean_value, "Value as boolean, false when absent", "booleanValue(value)"),
    builtin("intValue", 1, type_casting::int_value, "Value as 32-bit integer, 0 when absent", "intValue(value)"),
    builtin("longValue", 1, type_casting::long_value, "Value as 64-bit integer, 0 when absent", "longValue(value)"),
    builtin("floatValue", 1, type_casting::float_value, "Value as single precision, 0 when absent", "floatValue(value)"),
    builtin("doubleValue", 1, type_casting::double_value, "Value as double precision, 0 when absent", "doubleValue(value)"),
    builtin("getWithDefault", 2, type_casting::get_with_default, "Value, or the default when null", "getWithDefault(value,defaultValue)"),
    builtin("verifyAccess", 0, access::verify_access, "Reject OWNER requests for another user", "verifyAccess()"),
    builtin("getMethodArguments", 0, introspection::get_method_arguments, "Argument types of methodArgs", "getMethodArguments()"),
    builtin("getMethodArguments", 1, introspection::get_method_arguments, "Argument types under a key", "getMethodArguments(methodArgs)"),
    builtin("getMethodDefinition", 0, introspection::get_method_definition, "Java method definition", "getMethodDefinition()"),
    builtin(
        "getMethodDefinition",
        5,
        introspection::get_method_definition,
        "Method definition in a dialect",
        "getMethodDefinition(method,arguments,genericType,genericExceptions,TypeScript)",
    ),
    builtin("getMethodRequest", 0, introspection::get_method_request, "Request body of a method", "getMethodRequest()"),
    builtin("getFunctionDemo", 0, introspection::get_function_demo, "Demo of a function row", "getFunctionDemo()"),
    builtin("getFunctionDetail", 0, introspection::get_function_detail, "Signature and detail of a function row", "getFunctionDetail()"),
];

lazy_static::lazy_static! {
    static ref STANDARD: Arc<BuiltinTable> = {
        let mut table = BuiltinTable::new();
        for b in BUILTINS {
            let function: Arc<dyn CustomFunction> = Arc::new(*b);
            insert_overload(&mut table, b.name.to_string(), function);
        }
        Arc::new(table)
    };
}

/// Shared table of the standard built-ins
pub fn standard() -> Arc<BuiltinTable> {
    Arc::clone(&STANDARD)
}

fn fixture() -> Document {
    let value = json!({
        "id": 10,
        "i0": 1,
        "i1": -2,
        "arr": [{}],
        "array": [1, 2, 4, 10],
        "position": 1,
        "@position": 0,
        "key": "key",
        "object": {"key": "success"}
    });
    Document::try_from(value).unwrap_or_default()
}

/// Run the reference invocations against a fixture document and fail on
/// the first unexpected result. Used as a deployment health check.
pub fn self_check(snapshot: &Snapshot) -> Result<()> {
    let cases: [(&str, Value); 4] = [
        ("countArray(array)", json!(4)),
        ("isContain(array,id)", json!(true)),
        ("getFromArray(array,@position)", json!(1)),
        ("getFromObject(object,key)", json!("success")),
    ];
    for (expr, expected) in cases {
        let mut doc = fixture();
        let actual = crate::invoker::call(snapshot, expr, &mut Scope::new(&mut doc))?;
        log::info!("{} = {}", expr, actual);
        if actual != expected {
            let name = expr.split('(').next().unwrap_or(expr).to_string();
            return Err(Error::ValidationFailed {
                name,
                message: format!("{} returned {}, expected {}", expr, actual, expected),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_every_family() {
        let table = standard();
        for name in ["plus", "isContain", "countObject", "removeKey", "doubleValue", "verifyAccess", "getFunctionDetail"] {
            assert!(table.contains_key(name), "{} missing", name);
        }
        assert_eq!(table["getMethodDefinition"].len(), 2);
        assert_eq!(table.values().map(Vec::len).sum::<usize>(), BUILTINS.len());
    }

    #[test]
    fn self_check_passes_on_standard_table() {
        let registry = crate::FunctionRegistry::with_builtins();
        assert_eq!(self_check(&registry.snapshot()), Ok(()));
    }
}
