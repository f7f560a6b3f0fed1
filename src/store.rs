use crate::descriptor::FunctionFilter;
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Where remote function descriptors come from.
pub trait FunctionStore: Send + Sync {
    /// Raw descriptor records selected by `filter`, in store order
    fn fetch(&self, filter: &FunctionFilter) -> Result<Vec<Map<String, Value>>>;
}

fn select(records: Vec<Value>, filter: &FunctionFilter, source: &str) -> Vec<Map<String, Value>> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match record {
            Value::Object(map) => Some(map),
            other => {
                log::warn!("{}: skipping record {} that is not an object: {}", source, i, other);
                None
            }
        })
        .filter(|map| filter.matches(map))
        .collect()
}

/// In-memory store, mainly for tests and embedding
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Value>>,
}

impl MemoryStore {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records: RwLock::new(records) }
    }

    /// Replace the stored records
    pub fn set(&self, records: Vec<Value>) {
        *self.records.write().unwrap_or_else(|e| e.into_inner()) = records;
    }
}

impl FunctionStore for MemoryStore {
    fn fetch(&self, filter: &FunctionFilter) -> Result<Vec<Map<String, Value>>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner()).clone();
        Ok(select(records, filter, "memory store"))
    }
}

/// JSON file holding either an array of records or an object with the
/// array under `"Function[]"`. Read on every fetch so edits are picked up
/// by the next refresh.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FunctionStore for JsonFileStore {
    fn fetch(&self, filter: &FunctionFilter) -> Result<Vec<Map<String, Value>>> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::StoreUnavailable(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            Error::StoreUnavailable(format!("invalid JSON in {}: {}", self.path.display(), e))
        })?;
        let records = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("Function[]") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(Error::StoreUnavailable(format!(
                        "{} has no \"Function[]\" array",
                        self.path.display()
                    )))
                }
            },
            _ => {
                return Err(Error::StoreUnavailable(format!(
                    "{} must hold an array of function records",
                    self.path.display()
                )))
            }
        };
        Ok(select(records, filter, &self.path.display().to_string()))
    }
}
