//! Request pipeline contract and the reference document pipeline.
//!
//! A pipeline runs a whole request document. The reference
//! [`DocumentPipeline`] resolves every call key (`key()`, `key-()`,
//! `key+()`) against the object holding it and writes the result under
//! the key with the suffix stripped.

use crate::custom::{Scope, Visitor};
use crate::descriptor::Method;
use crate::error::{Error, Result};
use crate::invoker;
use crate::parser::Parser;
use crate::registry::Snapshot;
use crate::types::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const CODE_SUCCESS: u16 = 200;
pub const MSG_SUCCESS: &str = "success";

/// Status keys of a serialized response; the body cannot carry them
pub const RESERVED_KEYS: [&str; 2] = ["code", "msg"];

/// Call keys run in this order; each suffix marks a phase
const PHASES: [&str; 3] = ["-()", "()", "+()"];

pub struct Request {
    pub method: Method,
    pub tag: Option<String>,
    pub version: i32,
    pub body: Document,
    pub visitor: Option<Arc<dyn Visitor>>,
}

impl Request {
    pub fn new(method: Method, body: Document) -> Self {
        Self { method, tag: None, version: 0, body, visitor: None }
    }

    pub fn with_tag<T: Into<String>>(mut self, tag: Option<T>) -> Self {
        self.tag = tag.map(Into::into);
        self
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn with_visitor(mut self, visitor: Arc<dyn Visitor>) -> Self {
        self.visitor = Some(visitor);
        self
    }
}

/// Pipeline outcome: status fields plus the processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub code: u16,
    pub msg: String,
    #[serde(flatten)]
    pub body: Document,
}

impl Response {
    pub fn success(mut body: Document) -> Self {
        for key in RESERVED_KEYS {
            if body.remove(key).is_some() {
                log::debug!("dropping '{}' from response body, the key is reserved", key);
            }
        }
        Self { code: CODE_SUCCESS, msg: MSG_SUCCESS.to_string(), body }
    }

    pub fn error(err: &Error) -> Self {
        Self { code: err.code(), msg: err.to_string(), body: Document::new() }
    }

    pub fn is_success(&self) -> bool {
        self.code == CODE_SUCCESS
    }
}

/// The surrounding request pipeline.
pub trait Pipeline: Send + Sync {
    /// Run `request` with the functions visible in `snapshot`
    fn run_request(&self, snapshot: &Snapshot, request: Request) -> Response;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Only allow functions with a committed remote descriptor that admits
    /// the request's method, tag and version
    pub require_whitelist: bool,
}

impl PipelineOptions {
    /// Reads `JFUNC_REQUIRE_WHITELIST`
    pub fn from_env() -> Self {
        Self { require_whitelist: env_flag("JFUNC_REQUIRE_WHITELIST") }
    }
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default)]
pub struct DocumentPipeline {
    options: PipelineOptions,
}

impl DocumentPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    fn check_allowed(&self, snapshot: &Snapshot, name: &str, request: &Request) -> Result<()> {
        if !self.options.require_whitelist {
            return Ok(());
        }
        let denied = |reason: String| Error::FunctionNotAllowed { name: name.to_string(), reason };
        let descriptor = snapshot
            .descriptor(name)
            .ok_or_else(|| denied("not configured as a remote function".to_string()))?;
        if !descriptor.allows(request.method) {
            return Err(denied(format!("method {} not allowed", request.method)));
        }
        if let (Some(expected), Some(actual)) = (&descriptor.tag, &request.tag) {
            if expected != actual {
                return Err(denied(format!("tag {} not allowed", actual)));
            }
        }
        if descriptor.version > 0 && request.version > 0 && request.version < descriptor.version {
            return Err(denied(format!(
                "requires version {}, request has {}",
                descriptor.version, request.version
            )));
        }
        Ok(())
    }

    fn process(&self, snapshot: &Snapshot, request: &Request, document: &mut Document) -> Result<()> {
        let keys: Vec<String> = document.keys().cloned().collect();
        for key in &keys {
            if call_phase(key).is_some() {
                continue;
            }
            if let Some(Value::Object(map)) = document.get_mut(key) {
                let mut child = Document::from(std::mem::take(map));
                let outcome = self.process(snapshot, request, &mut child);
                document.insert(key.as_str(), Value::from(child));
                outcome?;
            }
        }

        for phase in 0..PHASES.len() {
            for key in keys.iter().filter(|k| call_phase(k) == Some(phase)) {
                let expr = match document.remove(key) {
                    Some(Value::String(expr)) => expr,
                    Some(other) => {
                        return Err(Error::malformed(other.to_string(), format!("value of '{}' is not a string", key)))
                    }
                    None => continue,
                };
                let call = Parser::new(&expr).parse()?;
                self.check_allowed(snapshot, &call.name, request)?;

                let mut scope = Scope::new(document);
                if let Some(visitor) = request.visitor.as_deref() {
                    scope = scope.with_visitor(visitor);
                }
                let result = invoker::invoke_expression(snapshot, &call, &mut scope)?;

                let target = &key[..key.len() - PHASES[phase].len()];
                if !result.is_null() && !target.is_empty() {
                    document.insert(target, result);
                }
            }
        }
        Ok(())
    }
}

/// Phase index of a call key, `None` for plain keys
fn call_phase(key: &str) -> Option<usize> {
    if key.ends_with("-()") {
        Some(0)
    } else if key.ends_with("+()") {
        Some(2)
    } else if key.ends_with("()") {
        Some(1)
    } else {
        None
    }
}

impl Pipeline for DocumentPipeline {
    fn run_request(&self, snapshot: &Snapshot, request: Request) -> Response {
        let mut request = request;
        let mut body = std::mem::take(&mut request.body);
        match self.process(snapshot, &request, &mut body) {
            Ok(()) => Response::success(body),
            Err(err) => {
                log::debug!("{} request failed: {}", request.method, err);
                Response::error(&err)
            }
        }
    }
}
