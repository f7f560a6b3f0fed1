use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON object a call expression is resolved against.
///
/// Keys keep their document order. Typed getters are lenient: an absent or
/// non-coercible value yields the type's zero value instead of an error, so
/// documents from upstream systems that omit optional fields still resolve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a JSON object from text
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert<K: Into<String>>(&mut self, key: K, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Remove the entry at `position` in document order
    pub fn remove_at(&mut self, position: usize) -> Option<(String, Value)> {
        let key = self.0.keys().nth(position)?.clone();
        self.0.shift_remove(&key).map(|v| (key, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn get_bool(&self, key: &str) -> bool {
        coerce_bool(self.get(key))
    }

    pub fn get_i32(&self, key: &str) -> i32 {
        coerce_i32(self.get(key))
    }

    pub fn get_i64(&self, key: &str) -> i64 {
        coerce_i64(self.get(key))
    }

    pub fn get_f32(&self, key: &str) -> f32 {
        coerce_f32(self.get(key))
    }

    pub fn get_f64(&self, key: &str) -> f64 {
        coerce_f64(self.get(key))
    }

    /// Textual form of the value; `None` for absent or null
    pub fn get_string(&self, key: &str) -> Option<String> {
        text_form(self.get(key))
    }

    pub fn get_array(&self, key: &str) -> Option<Vec<Value>> {
        coerce_array(self.get(key))
    }

    pub fn get_object(&self, key: &str) -> Option<Map<String, Value>> {
        coerce_object(self.get(key))
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}

impl TryFrom<Value> for Document {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

pub fn coerce_bool(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true")
                || s == "1"
                || s.eq_ignore_ascii_case("y")
                || s.eq_ignore_ascii_case("t")
        }
        _ => false,
    }
}

pub fn coerce_i64(v: Option<&Value>) -> i64 {
    match v {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .unwrap_or(0)
        }
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

/// Narrowing wraps like a 64 to 32 bit integer cast
pub fn coerce_i32(v: Option<&Value>) -> i32 {
    coerce_i64(v) as i32
}

pub fn coerce_f64(v: Option<&Value>) -> f64 {
    match v {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

pub fn coerce_f32(v: Option<&Value>) -> f32 {
    coerce_f64(v) as f32
}

/// Normalized string form used for structural comparison.
/// Strings are taken verbatim, everything else as compact JSON.
pub fn text_form(v: Option<&Value>) -> Option<String> {
    match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Arrays are taken as-is; strings holding a JSON array are parsed.
pub fn coerce_array(v: Option<&Value>) -> Option<Vec<Value>> {
    match v {
        Some(Value::Array(items)) => Some(items.clone()),
        Some(Value::String(s)) => serde_json::from_str::<Vec<Value>>(s).ok(),
        _ => None,
    }
}

pub fn coerce_object(v: Option<&Value>) -> Option<Map<String, Value>> {
    match v {
        Some(Value::Object(map)) => Some(map.clone()),
        Some(Value::String(s)) => serde_json::from_str::<Map<String, Value>>(s).ok(),
        _ => None,
    }
}
