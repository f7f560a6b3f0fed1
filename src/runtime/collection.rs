//! Emptiness, containment, sizing, keyed access and removal.

use crate::custom::Scope;
use crate::error::Result;
use crate::resolver::Argument;
use crate::types::text_form;
use serde_json::{Map, Value};

pub fn is_array_empty(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(Value::Bool(args[0].as_array().map_or(true, |a| a.is_empty())))
}

pub fn is_object_empty(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(Value::Bool(args[0].as_object().map_or(true, |o| o.is_empty())))
}

/// Elements and needle are compared by their string form, so `10` stored
/// as a 64-bit integer matches a `10` literal of any width.
pub fn contains_text(items: &[Value], needle: Option<&Value>) -> bool {
    let needle = text_form(needle);
    items.iter().any(|item| text_form(Some(item)) == needle)
}

pub fn is_contain(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    let found = args[0]
        .as_array()
        .map_or(false, |items| contains_text(&items, args[1].value()));
    Ok(Value::Bool(found))
}

pub fn is_contain_key(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    let found = match (args[0].as_object(), args[1].as_text()) {
        (Some(object), Some(key)) => object.contains_key(&key),
        _ => false,
    };
    Ok(Value::Bool(found))
}

pub fn is_contain_value(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    let needle = args[1].value().unwrap_or(&Value::Null);
    let found = args[0]
        .as_object()
        .map_or(false, |object| object.values().any(|v| v == needle));
    Ok(Value::Bool(found))
}

pub fn count_array(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(Value::from(args[0].as_array().map_or(0, |a| a.len())))
}

pub fn count_object(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(Value::from(args[0].as_object().map_or(0, |o| o.len())))
}

pub fn element_at(items: &[Value], position: i32) -> Value {
    usize::try_from(position)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .unwrap_or(Value::Null)
}

/// `position` may be a literal (`getFromArray(array,0)`) or a key
/// (`getFromArray(array,@position)`).
pub fn get_from_array(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    Ok(args[0]
        .as_array()
        .map_or(Value::Null, |items| element_at(&items, args[1].position())))
}

pub fn get_from_object(_scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    let object: Map<String, Value> = match args[0].as_object() {
        Some(o) => o,
        None => return Ok(Value::Null),
    };
    Ok(object.get(&args[1].key_name()).cloned().unwrap_or(Value::Null))
}

pub fn remove_index(scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    if let Ok(position) = usize::try_from(args[0].position()) {
        if let Some((key, _)) = scope.document.remove_at(position) {
            log::debug!("removeIndex removed '{}' at {}", key, position);
        }
    }
    Ok(Value::Null)
}

pub fn remove_key(scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    scope.document.remove(&args[0].key_name());
    Ok(Value::Null)
}
