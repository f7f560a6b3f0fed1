pub mod ast;
pub mod custom;
pub mod descriptor;
pub mod error;
pub mod invoker;
pub mod loader;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod store;
pub mod types;

pub use ast::{ArgToken, CallExpression};
pub use custom::{CustomFunction, Scope, Visitor};
pub use descriptor::{FunctionDescriptor, FunctionFilter, Method};
pub use error::{Error, Result};
pub use loader::{LoadState, LoaderOptions, RefreshReport, RegistryLoader};
pub use pipeline::{DocumentPipeline, Pipeline, PipelineOptions, Request, Response};
pub use registry::{FunctionRegistry, Snapshot};
pub use resolver::Argument;
pub use runtime::self_check;
pub use store::{FunctionStore, JsonFileStore, MemoryStore};
pub use types::Document;
use serde_json::Value;
use std::sync::Arc;

// Global function registry
lazy_static::lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<FunctionRegistry> = Arc::new(FunctionRegistry::with_builtins());
}

/// The process-wide registry, pre-populated with the standard built-ins
pub fn global_registry() -> Arc<FunctionRegistry> {
    Arc::clone(&GLOBAL_REGISTRY)
}

/// Parse a call expression such as `getFromArray(array,@position)`.
pub fn parse(input: &str) -> Result<CallExpression> {
    parser::Parser::new(input.trim()).parse()
}

/// Evaluate a call expression against `document` with the global registry.
/// Functions that edit the document (`removeKey`, `removeIndex`) edit it in place.
pub fn evaluate(input: &str, document: &mut Document) -> Result<Value> {
    let snapshot = GLOBAL_REGISTRY.snapshot();
    invoker::call(&snapshot, input.trim(), &mut Scope::new(document))
}

/// Evaluate with the document provided as a JSON object string.
pub fn evaluate_with_json(input: &str, json_document: &str) -> Result<Value> {
    let mut document = Document::from_json(json_document)
        .map_err(|e| Error::invalid_argument("document", format!("Invalid JSON: {}", e)))?;
    evaluate(input, &mut document)
}

/// Register a custom function globally
pub fn register_function(function: Arc<dyn CustomFunction>) -> Result<()> {
    GLOBAL_REGISTRY.register(function)
}

/// Unregister a custom function by name; built-ins stay
pub fn unregister_function(name: &str) -> bool {
    GLOBAL_REGISTRY.unregister(name)
}

/// List all globally callable functions
pub fn list_functions() -> Vec<String> {
    GLOBAL_REGISTRY.snapshot().list_functions()
}

/// Check if a function is registered globally
pub fn has_function(name: &str) -> bool {
    GLOBAL_REGISTRY.snapshot().has_function(name)
}
