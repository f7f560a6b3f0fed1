use crate::custom::Scope;
use crate::error::Result;
use crate::resolver::Argument;
use serde_json::Value;

pub fn boolean_value(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(Value::Bool(args[0].as_bool()))
}

pub fn int_value(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(Value::from(args[0].as_i32()))
}

pub fn long_value(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(Value::from(args[0].as_i64()))
}

pub fn float_value(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(Value::from(f64::from(args[0].as_f32())))
}

pub fn double_value(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(Value::from(args[0].as_f64()))
}

/// The primary value unless absent or null, else the value at the second key
pub fn get_with_default(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    let value = match args[0].value() {
        Some(v) if !v.is_null() => v.clone(),
        _ => args[1].value().cloned().unwrap_or(Value::Null),
    };
    Ok(value)
}
