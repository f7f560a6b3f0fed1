//! `plus`, `minus`, `multiply`, `divide`: double precision with lenient
//! operands. No overflow checks; division by zero yields infinity or NaN.

use crate::custom::Scope;
use crate::error::Result;
use crate::resolver::Argument;
use serde_json::Value;

pub fn exec_arithmetic(name: &str, a: f64, b: f64) -> f64 {
    match name {
        "plus" => a + b,
        "minus" => a - b,
        "multiply" => a * b,
        "divide" => a / b,
        _ => f64::NAN,
    }
}

/// JSON has no infinity or NaN; those serialize as null.
pub fn number(n: f64) -> Value {
    Value::from(n)
}

pub fn plus(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(number(exec_arithmetic("plus", args[0].as_f64(), args[1].as_f64())))
}

pub fn minus(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(number(exec_arithmetic("minus", args[0].as_f64(), args[1].as_f64())))
}

pub fn multiply(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(number(exec_arithmetic("multiply", args[0].as_f64(), args[1].as_f64())))
}

pub fn divide(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(number(exec_arithmetic("divide", args[0].as_f64(), args[1].as_f64())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_semantics() {
        assert_eq!(exec_arithmetic("plus", 1.0, -2.0), -1.0);
        assert_eq!(exec_arithmetic("minus", 1.0, -2.0), 3.0);
        assert_eq!(exec_arithmetic("multiply", 1.5, 4.0), 6.0);
        assert_eq!(exec_arithmetic("divide", 1.0, 0.0), f64::INFINITY);
        assert!(exec_arithmetic("divide", 0.0, 0.0).is_nan());
    }

    #[test]
    fn non_finite_is_null_in_json() {
        assert_eq!(number(f64::INFINITY), Value::Null);
        assert_eq!(number(2.5), serde_json::json!(2.5));
    }
}
