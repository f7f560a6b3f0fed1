use crate::error::{Error, Result};
use crate::types::{self, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Key of the computed field added to a demo that does not declare one
pub const DEMO_RESULT_KEY: &str = "result()";

/// Request verbs a remote function can be exposed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Gets,
    Heads,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Gets => "GETS",
            Method::Heads => "HEADS",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "GETS" => Ok(Method::Gets),
            "HEADS" => Ok(Method::Heads),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(Error::InvalidDescriptor(format!("unknown method '{}'", other))),
        }
    }
}

/// `name(arguments)` with the arguments trimmed
pub fn function_call(name: &str, arguments: Option<&str>) -> String {
    format!("{}({})", name, arguments.map(str::trim).unwrap_or(""))
}

/// A remote function as configured in the external store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDescriptor {
    pub name: String,
    /// Empty means any method
    pub methods: Vec<Method>,
    /// Raw demo text as stored
    pub demo: Option<String>,
    pub arguments: Option<String>,
    pub tag: Option<String>,
    pub version: i32,
    pub detail: Option<String>,
    #[serde(skip)]
    record: Map<String, Value>,
}

impl FunctionDescriptor {
    /// Build from a raw store record.
    pub fn from_record(record: Map<String, Value>) -> Result<Self> {
        let name = match record.get("name") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => {
                return Err(Error::InvalidDescriptor(
                    "record has no non-empty 'name'".to_string(),
                ))
            }
        };

        let methods = match record.get("methods") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(Method::from_str)
                .collect::<Result<Vec<_>>>()?,
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|m| m.as_str())
                .map(Method::from_str)
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::InvalidDescriptor(format!(
                    "function {}: 'methods' must be a string or list, got {}",
                    name, other
                )))
            }
        };

        let demo = match record.get("demo") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        Ok(Self {
            methods,
            demo,
            arguments: types::text_form(record.get("arguments")),
            tag: types::text_form(record.get("tag")).filter(|t| !t.trim().is_empty()),
            version: types::coerce_i32(record.get("version")),
            detail: types::text_form(record.get("detail")),
            name,
            record,
        })
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    /// Call expression built from the name and declared arguments
    pub fn call(&self) -> String {
        function_call(&self.name, self.arguments.as_deref())
    }

    /// The demo document, with a `result()` call synthesized when missing.
    pub fn demo_document(&self) -> Result<Document> {
        let text = match self.demo.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() && t != "null" => t,
            _ => return Err(Error::MissingDemo { name: self.name.clone() }),
        };
        let value: Value = serde_json::from_str(text).map_err(|e| Error::InvalidDemo {
            name: self.name.clone(),
            reason: e.to_string(),
        })?;
        let mut demo = Document::try_from(value).map_err(|other| Error::InvalidDemo {
            name: self.name.clone(),
            reason: format!("expected a JSON object, got {}", other),
        })?;
        if !demo.contains_key(DEMO_RESULT_KEY) {
            demo.insert(DEMO_RESULT_KEY, Value::String(self.call()));
        }
        Ok(demo)
    }

    /// Method the demo runs under: the first declared, GET when none
    pub fn demo_method(&self) -> Method {
        self.methods.first().copied().unwrap_or_default()
    }

    pub fn allows(&self, method: Method) -> bool {
        self.methods.is_empty() || self.methods.contains(&method)
    }
}

/// Field conditions selecting a subset ("table") of store records.
///
/// An empty filter selects everything and makes a refresh unscoped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionFilter(Map<String, Value>);

impl FunctionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_name<N: Into<String>>(name: N) -> Self {
        Self::new().with("name", Value::String(name.into()))
    }

    pub fn with<K: Into<String>>(mut self, field: K, value: Value) -> Self {
        self.0.insert(field.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every condition equals the record's field
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        self.0.iter().all(|(field, expected)| {
            record.get(field).map_or(expected.is_null(), |actual| {
                actual == expected
                    || (types::text_form(Some(actual)) == types::text_form(Some(expected)))
            })
        })
    }
}

impl From<Map<String, Value>> for FunctionFilter {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
