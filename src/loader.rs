//! Loads remote function descriptors and verifies each one by running its
//! demo through the request pipeline before the batch becomes visible.
//!
//! States: `Idle -> Fetching -> Validating(i) -> Committed | Aborted`.
//! All changes are staged; lookups keep seeing the previous table until
//! the whole batch has been verified and swapped in.

use crate::descriptor::{FunctionDescriptor, FunctionFilter};
use crate::error::{Error, Result};
use crate::pipeline::{env_flag, Pipeline, Request, Response};
use crate::registry::{replace_matching, FunctionRegistry, RemoteTable, Snapshot};
use crate::store::FunctionStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Exit the process on an aborted refresh instead of returning the error
    pub shutdown_on_error: bool,
}

impl LoaderOptions {
    /// Reads `JFUNC_SHUTDOWN_ON_ERROR`
    pub fn from_env() -> Self {
        Self { shutdown_on_error: env_flag("JFUNC_SHUTDOWN_ON_ERROR") }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadState {
    Idle,
    Fetching,
    /// Index of the descriptor whose demo is running
    Validating(usize),
    Committed,
    Aborted,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoRun {
    pub name: String,
    pub response: Response,
}

/// What a committed refresh loaded, for logging and audit.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub scoped: bool,
    pub functions: Vec<FunctionDescriptor>,
    pub demos: Vec<DemoRun>,
    pub refreshed_at: DateTime<Utc>,
}

pub struct RegistryLoader {
    registry: Arc<FunctionRegistry>,
    store: Arc<dyn FunctionStore>,
    pipeline: Arc<dyn Pipeline>,
    options: LoaderOptions,
    state: Mutex<LoadState>,
}

impl RegistryLoader {
    pub fn new(
        registry: Arc<FunctionRegistry>,
        store: Arc<dyn FunctionStore>,
        pipeline: Arc<dyn Pipeline>,
        options: LoaderOptions,
    ) -> Self {
        Self {
            registry,
            store,
            pipeline,
            options,
            state: Mutex::new(LoadState::Idle),
        }
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    pub fn state(&self) -> LoadState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, next: LoadState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        log::debug!("remote function load: {:?} -> {:?}", *state, next);
        *state = next;
    }

    /// Reload every remote function
    pub fn refresh_all(&self) -> Result<RefreshReport> {
        self.refresh(&FunctionFilter::new())
    }

    /// Reload the remote functions selected by `filter`; an empty filter
    /// reloads everything and requires the store to return at least one.
    pub fn refresh(&self, filter: &FunctionFilter) -> Result<RefreshReport> {
        let _writer = self.registry.begin_reload();
        let scoped = !filter.is_empty();

        self.transition(LoadState::Fetching);
        let records = match self.store.fetch(filter) {
            Ok(records) => records,
            Err(err) => return self.abort(err),
        };
        if !scoped && records.is_empty() {
            log::warn!("unscoped refresh found no remote functions");
            self.transition(LoadState::Aborted);
            return Err(Error::NoFunctionsAvailable);
        }

        let current = self.registry.snapshot();
        let mut staged: Arc<RemoteTable> = Arc::new(replace_matching(current.remote(), filter, Vec::new()));
        let mut functions = Vec::with_capacity(records.len());
        let mut demos = Vec::with_capacity(records.len());

        for (i, record) in records.into_iter().enumerate() {
            self.transition(LoadState::Validating(i));
            let descriptor = match FunctionDescriptor::from_record(record) {
                Ok(d) => d,
                Err(err) => return self.abort(err),
            };
            let demo = match descriptor.demo_document() {
                Ok(d) => d,
                Err(err) => return self.abort(err),
            };

            // Staged before the demo runs so the demo can call it
            Arc::make_mut(&mut staged).insert(descriptor.name.clone(), descriptor.clone());
            let view = Snapshot::new(Arc::clone(current.builtins()), Arc::clone(&staged));
            let request = Request::new(descriptor.demo_method(), demo)
                .with_tag(descriptor.tag.clone())
                .with_version(descriptor.version);
            let response = self.pipeline.run_request(&view, request);
            if !response.is_success() {
                return self.abort(Error::ValidationFailed {
                    name: descriptor.name.clone(),
                    message: response.msg,
                });
            }
            log::debug!("demo of {} passed", descriptor.name);
            demos.push(DemoRun { name: descriptor.name.clone(), response });
            functions.push(descriptor);
        }

        self.registry.commit(staged);
        self.transition(LoadState::Committed);
        log::info!(
            "loaded {} remote function(s){}",
            functions.len(),
            if scoped { " (scoped)" } else { "" }
        );
        Ok(RefreshReport {
            scoped,
            functions,
            demos,
            refreshed_at: Utc::now(),
        })
    }

    fn abort<T>(&self, err: Error) -> Result<T> {
        self.transition(LoadState::Aborted);
        log::error!(
            "remote function self-check failed; add the function used by the demo or fix the demo \
             so the published function documentation stays correct. cause: {}",
            err
        );
        if self.options.shutdown_on_error {
            std::process::exit(1);
        }
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{DocumentPipeline, PipelineOptions};
    use crate::store::MemoryStore;
    use serde_json::{json, Value};

    fn loader(records: Vec<Value>) -> (RegistryLoader, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(records));
        let loader = RegistryLoader::new(
            Arc::new(FunctionRegistry::with_builtins()),
            store.clone(),
            Arc::new(DocumentPipeline::new(PipelineOptions { require_whitelist: true })),
            LoaderOptions::default(),
        );
        (loader, store)
    }

    fn count_array() -> Value {
        json!({"name": "countArray", "arguments": "array", "demo": "{\"array\": [1, 2]}"})
    }

    #[test]
    fn commits_after_every_demo_passes() {
        let (loader, _) = loader(vec![
            count_array(),
            json!({"name": "isContain", "arguments": "array,id", "demo": "{\"array\": [1], \"id\": 1}", "methods": "GET,POST"}),
        ]);
        let report = loader.refresh_all().unwrap();
        assert!(!report.scoped);
        assert_eq!(report.functions.len(), 2);
        assert_eq!(report.demos[0].response.body.get("result"), Some(&json!(2)));
        assert_eq!(loader.state(), LoadState::Committed);

        let snap = loader.registry().snapshot();
        assert_eq!(snap.remote_names(), vec!["countArray".to_string(), "isContain".to_string()]);
    }

    #[test]
    fn empty_unscoped_store_fails() {
        let (loader, _) = loader(Vec::new());
        assert_eq!(loader.refresh_all().unwrap_err(), Error::NoFunctionsAvailable);
        assert_eq!(loader.state(), LoadState::Aborted);
    }

    #[test]
    fn failed_demo_keeps_previous_table() {
        let (loader, store) = loader(vec![count_array()]);
        loader.refresh_all().unwrap();

        store.set(vec![
            json!({"name": "countObject", "arguments": "object", "demo": "{\"object\": {}}"}),
            json!({"name": "nope", "arguments": "x", "demo": "{}"}),
        ]);
        let err = loader.refresh_all().unwrap_err();
        match err {
            Error::ValidationFailed { name, message } => {
                assert_eq!(name, "nope");
                assert!(message.contains("nope"), "{}", message);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(loader.state(), LoadState::Aborted);
        assert_eq!(loader.registry().snapshot().remote_names(), vec!["countArray".to_string()]);
    }

    #[test]
    fn missing_demo_aborts() {
        let (loader, _) = loader(vec![json!({"name": "countArray", "arguments": "array"})]);
        assert!(matches!(loader.refresh_all(), Err(Error::MissingDemo { .. })));
        assert!(loader.registry().snapshot().remote_names().is_empty());
    }

    #[test]
    fn scoped_refresh_keeps_other_entries() {
        let (loader, store) = loader(vec![
            count_array(),
            json!({"name": "countObject", "arguments": "object", "demo": "{\"object\": {\"a\": 1}}"}),
        ]);
        loader.refresh_all().unwrap();

        store.set(vec![json!({
            "name": "countArray", "arguments": "array", "demo": "{\"array\": []}", "detail": "v2"
        })]);
        let report = loader.refresh(&FunctionFilter::by_name("countArray")).unwrap();
        assert!(report.scoped);

        let snap = loader.registry().snapshot();
        assert_eq!(snap.remote_names().len(), 2);
        assert_eq!(snap.descriptor("countArray").unwrap().detail.as_deref(), Some("v2"));
    }

    #[test]
    fn unreachable_store_aborts() {
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let loader = RegistryLoader::new(
            registry,
            Arc::new(crate::store::JsonFileStore::new("/nonexistent/functions.json")),
            Arc::new(DocumentPipeline::default()),
            LoaderOptions::default(),
        );
        assert!(matches!(loader.refresh_all(), Err(Error::StoreUnavailable(_))));
    }
}
