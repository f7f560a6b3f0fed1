//! String formatters used by API documentation tooling. They read
//! descriptor-like fields from the document and never modify it.

use crate::custom::Scope;
use crate::descriptor::{function_call, DEMO_RESULT_KEY};
use crate::error::{Error, Result};
use crate::resolver::Argument;
use crate::types::{text_form, Document};
use regex::Regex;
use serde_json::{Map, Value};

lazy_static::lazy_static! {
    static ref COMMENT: Regex = Regex::new(r"(//.*)|(/\*[\s\S]*?\*/)").expect("comment pattern");
}

pub const DEFAULT_METHOD_ARGS_KEY: &str = "methodArgs";

/// Output dialect of a method definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Java,
    TypeScript,
    Go,
}

impl Dialect {
    /// Unknown names fall back to Java
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "TypeScript" => Dialect::TypeScript,
            "Go" => Dialect::Go,
            _ => Dialect::Java,
        }
    }
}

/// Strip `//` and `/* */` comments
pub fn remove_comment(json: &str) -> String {
    COMMENT.replace_all(json, "").into_owned()
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// Simple type name for an argument value without a declared type
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Object",
        Value::Bool(_) => "Boolean",
        Value::Number(n) => match n.as_i64() {
            Some(i) if i32::try_from(i).is_ok() => "Integer",
            Some(_) => "Long",
            None if n.is_u64() => "Long",
            None => "Double",
        },
        Value::String(_) => "String",
        Value::Array(_) => "JSONArray",
        Value::Object(_) => "JSONObject",
    }
}

/// Comma-joined argument types of the `methodArgs`-style list under `key`,
/// read from `request.<key>` first, then from the top level.
pub fn method_arguments(doc: &Document, key: &str) -> Result<String> {
    let nested = doc
        .get_object("request")
        .and_then(|request| text_form(request.get(key)));
    let text = match non_blank(nested).or_else(|| non_blank(doc.get_string(key))) {
        Some(t) => t,
        None => return Ok(String::new()),
    };
    let items: Vec<Value> = serde_json::from_str(&remove_comment(&text))
        .map_err(|e| Error::invalid_argument("getMethodArguments", e.to_string()))?;

    let types: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Object(arg) => match arg.get("type") {
                Some(Value::String(t)) => t.clone(),
                _ => type_name(arg.get("value").unwrap_or(&Value::Null)).to_string(),
            },
            other => type_name(other).to_string(),
        })
        .collect();
    Ok(types.join(","))
}

/// `name(arguments): type throws exceptions`, `name(arguments) type ...` for Go.
/// Empty parts are left out.
pub fn format_definition(
    name: &str,
    arguments: Option<&str>,
    return_type: Option<&str>,
    exceptions: Option<&str>,
    dialect: Dialect,
) -> String {
    let present = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).is_some();
    let mut out = format!("{}({})", name, if present(arguments) { arguments.unwrap_or("") } else { "" });
    if present(return_type) {
        let t = return_type.unwrap_or("");
        match dialect {
            Dialect::Go => out.push_str(&format!(" {}", t)),
            Dialect::Java | Dialect::TypeScript => out.push_str(&format!(": {}", t)),
        }
    }
    if present(exceptions) {
        out.push_str(&format!(" throws {}", exceptions.unwrap_or("")));
    }
    out
}

pub fn method_definition(
    doc: &Document,
    method_key: &str,
    arguments_key: &str,
    type_key: &str,
    exceptions_key: &str,
    dialect: Dialect,
) -> Result<String> {
    let name = non_blank(doc.get_string(method_key)).ok_or_else(|| {
        Error::invalid_argument("getMethodDefinition", format!("'{}' is empty", method_key))
    })?;
    Ok(format_definition(
        &name,
        doc.get_string(arguments_key).as_deref(),
        doc.get_string(type_key).as_deref(),
        doc.get_string(exceptions_key).as_deref(),
        dialect,
    ))
}

/// The `request` field when set, otherwise an object assembled from
/// `static`, `methodArgs` and `classArgs`.
pub fn method_request(doc: &Document) -> String {
    if let Some(request) = non_blank(doc.get_string("request")) {
        return request;
    }
    let mut out = String::from("{");
    let mut comma = false;
    if doc.get_bool("static") {
        out.push_str("\n    \"static\": true");
        comma = true;
    }
    if let Some(method_args) = non_blank(doc.get_string("methodArgs")) {
        out.push_str(if comma { "," } else { "" });
        out.push_str(&format!("\n    \"methodArgs\": {}", method_args));
        comma = true;
    }
    if let Some(class_args) = non_blank(doc.get_string("classArgs")) {
        out.push_str(if comma { "," } else { "" });
        out.push_str(&format!("\n    \"classArgs\": {}", class_args));
    }
    out.push_str("\n}");
    out
}

/// Demo of the function row in `doc`; `{}` plus a `result()` call when it has none
pub fn function_demo(doc: &Document) -> Map<String, Value> {
    let mut demo = doc
        .get_string("demo")
        .and_then(|text| serde_json::from_str::<Map<String, Value>>(&text).ok())
        .unwrap_or_default();
    if !demo.contains_key(DEMO_RESULT_KEY) {
        let call = function_call(
            &doc.get_string("name").unwrap_or_default(),
            doc.get_string("arguments").as_deref(),
        );
        demo.insert(DEMO_RESULT_KEY.to_string(), Value::String(call));
    }
    demo
}

pub fn function_detail(doc: &Document) -> String {
    format!(
        "{}: {}",
        function_call(
            &doc.get_string("name").unwrap_or_default(),
            doc.get_string("arguments").as_deref()
        ),
        doc.get_string("detail").unwrap_or_default().trim()
    )
}

pub fn get_method_arguments(scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    let key = args.first().map_or(DEFAULT_METHOD_ARGS_KEY, |a| a.raw());
    method_arguments(scope.document, key).map(Value::String)
}

pub fn get_method_definition(scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
    let definition = match args {
        [method, arguments, ty, exceptions, language] => method_definition(
            scope.document,
            method.raw(),
            arguments.raw(),
            ty.raw(),
            exceptions.raw(),
            Dialect::from_name(language.raw()),
        )?,
        _ => method_definition(
            scope.document,
            "method",
            "arguments",
            "genericType",
            "genericExceptions",
            Dialect::Java,
        )?,
    };
    Ok(Value::String(definition))
}

pub fn get_method_request(scope: &mut Scope<'_>, _args: &[Argument]) -> Result<Value> {
    Ok(Value::String(method_request(scope.document)))
}

pub fn get_function_demo(scope: &mut Scope<'_>, _args: &[Argument]) -> Result<Value> {
    Ok(Value::Object(function_demo(scope.document)))
}

pub fn get_function_detail(scope: &mut Scope<'_>, _args: &[Argument]) -> Result<Value> {
    Ok(Value::String(function_detail(scope.document)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        Document::try_from(v).unwrap()
    }

    #[test]
    fn definition_dialects() {
        let args = Some("String,int");
        assert_eq!(
            format_definition("find", args, Some("List<User>"), Some("IOException"), Dialect::Java),
            "find(String,int): List<User> throws IOException"
        );
        assert_eq!(
            format_definition("find", args, Some("User[]"), None, Dialect::TypeScript),
            "find(String,int): User[]"
        );
        assert_eq!(
            format_definition("find", None, Some("error"), Some(" "), Dialect::Go),
            "find() error"
        );
        assert_eq!(Dialect::from_name("Kotlin"), Dialect::Java);
    }

    #[test]
    fn method_arguments_infer_types() {
        let d = doc(json!({
            "methodArgs": "[{\"type\": \"long\", \"value\": 1}, // id\n {\"value\": \"a\"}, /* flag */ {\"value\": true}, {\"value\": 3000000000}, {}]"
        }));
        assert_eq!(method_arguments(&d, "methodArgs").unwrap(), "long,String,Boolean,Long,Object");
        assert_eq!(method_arguments(&d, "other").unwrap(), "");

        let nested = doc(json!({"request": {"methodArgs": "[{\"value\": 1.5}]"}, "methodArgs": "[]"}));
        assert_eq!(method_arguments(&nested, "methodArgs").unwrap(), "Double");

        let bad = doc(json!({"methodArgs": "[{"}));
        assert!(matches!(method_arguments(&bad, "methodArgs"), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn method_definition_requires_name() {
        let d = doc(json!({"method": "plus", "arguments": "a,b", "genericType": "double"}));
        assert_eq!(
            method_definition(&d, "method", "arguments", "genericType", "genericExceptions", Dialect::Go)
                .unwrap(),
            "plus(a,b) double"
        );
        let empty = doc(json!({"method": "  "}));
        assert!(method_definition(&empty, "method", "a", "t", "e", Dialect::Java).is_err());
    }

    #[test]
    fn method_request_assembly() {
        assert_eq!(method_request(&doc(json!({"request": "{\"a\":1}"}))), "{\"a\":1}");
        assert_eq!(
            method_request(&doc(json!({"static": true, "methodArgs": "[1]", "classArgs": "[]"}))),
            "{\n    \"static\": true,\n    \"methodArgs\": [1],\n    \"classArgs\": []\n}"
        );
        assert_eq!(method_request(&doc(json!({}))), "{\n}");
    }

    #[test]
    fn function_demo_and_detail() {
        let d = doc(json!({"name": "countArray", "arguments": " array ", "detail": " Count items "}));
        assert_eq!(function_demo(&d).get("result()"), Some(&json!("countArray(array)")));
        assert_eq!(function_detail(&d), "countArray(array): Count items");

        let with_demo = doc(json!({"name": "f", "demo": "{\"result()\": \"f(x)\", \"x\": 1}"}));
        let demo = function_demo(&with_demo);
        assert_eq!(demo.get("result()"), Some(&json!("f(x)")));
        assert_eq!(demo.len(), 2);
    }
}
