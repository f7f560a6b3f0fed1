use crate::custom::CustomFunction;
use crate::descriptor::{FunctionDescriptor, FunctionFilter};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Overloads per function name, distinguished by arity
pub type BuiltinTable = HashMap<String, Vec<Arc<dyn CustomFunction>>>;

/// Committed remote descriptors by name
pub type RemoteTable = HashMap<String, FunctionDescriptor>;

/// Process-wide function registry.
///
/// Built-ins are registered at startup. Remote descriptors only change
/// through [`FunctionRegistry::commit`], which swaps the whole table at
/// once: readers holding a [`Snapshot`] see either the old or the new
/// table, never a mix.
pub struct FunctionRegistry {
    /// Functions the registry was built with; never replaced or removed
    fixed: Arc<BuiltinTable>,
    builtins: RwLock<Arc<BuiltinTable>>,
    remote: RwLock<Arc<RemoteTable>>,
    reload: Mutex<()>,
}

/// Immutable view of the registry at one instant.
#[derive(Clone)]
pub struct Snapshot {
    builtins: Arc<BuiltinTable>,
    remote: Arc<RemoteTable>,
}

/// Result of a name lookup
pub struct Entry {
    pub overloads: Vec<Arc<dyn CustomFunction>>,
    pub descriptor: Option<FunctionDescriptor>,
}

impl FunctionRegistry {
    /// Create a registry with no functions at all
    pub fn new() -> Self {
        Self::from_builtins(Arc::new(BuiltinTable::new()))
    }

    /// Create a registry pre-populated with the standard built-ins
    pub fn with_builtins() -> Self {
        Self::from_builtins(crate::runtime::builtin_functions::standard())
    }

    fn from_builtins(builtins: Arc<BuiltinTable>) -> Self {
        Self {
            fixed: Arc::clone(&builtins),
            builtins: RwLock::new(builtins),
            remote: RwLock::new(Arc::new(RemoteTable::new())),
            reload: Mutex::new(()),
        }
    }

    /// Register a function; an existing custom overload with the same arity
    /// is replaced. Names of the fixed built-ins are refused.
    pub fn register(&self, function: Arc<dyn CustomFunction>) -> Result<()> {
        let name = function.name().to_string();
        if name.is_empty() {
            return Err(Error::InvalidDescriptor("function name cannot be empty".to_string()));
        }
        if self.is_fixed(&name) {
            return Err(Error::InvalidDescriptor(format!(
                "{} is a built-in function and cannot be replaced",
                name
            )));
        }
        let mut guard = self.builtins.write().unwrap_or_else(|e| e.into_inner());
        let mut table = BuiltinTable::clone(&guard);
        insert_overload(&mut table, name, function);
        *guard = Arc::new(table);
        Ok(())
    }

    /// Remove every overload of a custom function; false when it was not
    /// registered or is a fixed built-in
    pub fn unregister(&self, name: &str) -> bool {
        if self.is_fixed(name) {
            log::warn!("refusing to unregister built-in function {}", name);
            return false;
        }
        let mut guard = self.builtins.write().unwrap_or_else(|e| e.into_inner());
        if !guard.contains_key(name) {
            return false;
        }
        let mut table = BuiltinTable::clone(&guard);
        table.remove(name);
        *guard = Arc::new(table);
        true
    }

    /// Whether `name` is one of the functions the registry was built with
    pub fn is_fixed(&self, name: &str) -> bool {
        self.fixed.contains_key(name)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            builtins: Arc::clone(&self.builtins.read().unwrap_or_else(|e| e.into_inner())),
            remote: Arc::clone(&self.remote.read().unwrap_or_else(|e| e.into_inner())),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Entry> {
        self.snapshot().lookup(name)
    }

    /// Serialize reload cycles; lookups are not blocked
    pub fn begin_reload(&self) -> MutexGuard<'_, ()> {
        self.reload.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Atomically replace the remote table
    pub fn commit(&self, table: Arc<RemoteTable>) {
        let mut guard = self.remote.write().unwrap_or_else(|e| e.into_inner());
        *guard = table;
    }

    /// Drop every remote descriptor; built-ins stay
    pub fn clear(&self) {
        self.commit(Arc::new(RemoteTable::new()));
    }

    /// Replace the remote entries selected by `filter` with `descriptors`,
    /// leaving the others untouched.
    pub fn replace_all(&self, filter: &FunctionFilter, descriptors: Vec<FunctionDescriptor>) {
        let _writer = self.begin_reload();
        let current = self.snapshot().remote;
        self.commit(Arc::new(replace_matching(&current, filter, descriptors)));
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

pub(crate) fn insert_overload(table: &mut BuiltinTable, name: String, function: Arc<dyn CustomFunction>) {
    let overloads = table.entry(name).or_default();
    overloads.retain(|f| f.arity() != function.arity());
    overloads.push(function);
}

/// Copy of `current` without the entries `filter` selects, plus `descriptors`.
/// An empty filter selects every entry.
pub fn replace_matching(
    current: &RemoteTable,
    filter: &FunctionFilter,
    descriptors: Vec<FunctionDescriptor>,
) -> RemoteTable {
    let mut table: RemoteTable = current
        .iter()
        .filter(|(_, d)| !filter.is_empty() && !filter.matches(d.record()))
        .map(|(k, d)| (k.clone(), d.clone()))
        .collect();
    for d in descriptors {
        table.insert(d.name.clone(), d);
    }
    table
}

impl Snapshot {
    pub fn new(builtins: Arc<BuiltinTable>, remote: Arc<RemoteTable>) -> Self {
        Self { builtins, remote }
    }

    pub fn builtins(&self) -> &Arc<BuiltinTable> {
        &self.builtins
    }

    pub fn remote(&self) -> &Arc<RemoteTable> {
        &self.remote
    }

    /// Handler for `name` taking exactly `arity` arguments
    pub fn function(&self, name: &str, arity: usize) -> Result<Arc<dyn CustomFunction>> {
        let overloads = self
            .builtins
            .get(name)
            .ok_or_else(|| Error::UnknownFunction { name: name.to_string() })?;
        overloads
            .iter()
            .find(|f| f.arity() == arity)
            .cloned()
            .ok_or_else(|| {
                let mut expected: Vec<usize> = overloads.iter().map(|f| f.arity()).collect();
                expected.sort_unstable();
                Error::ArityMismatch {
                    name: name.to_string(),
                    expected,
                    actual: arity,
                }
            })
    }

    pub fn descriptor(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.remote.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<Entry> {
        let overloads = self.builtins.get(name).cloned().unwrap_or_default();
        let descriptor = self.remote.get(name).cloned();
        if overloads.is_empty() && descriptor.is_none() {
            return Err(Error::UnknownFunction { name: name.to_string() });
        }
        Ok(Entry { overloads, descriptor })
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Built-in names, sorted
    pub fn list_functions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builtins.keys().cloned().collect();
        names.sort();
        names
    }

    /// Remote descriptor names, sorted
    pub fn remote_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.remote.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::Scope;
    use crate::resolver::Argument;
    use serde_json::{json, Map, Value};

    struct TestFunction {
        name: String,
        arity: usize,
    }

    impl CustomFunction for TestFunction {
        fn name(&self) -> &str {
            &self.name
        }
        fn arity(&self) -> usize {
            self.arity
        }
        fn execute(&self, _scope: &mut Scope<'_>, args: &[Argument]) -> Result<Value> {
            Ok(Value::String(format!("{}({})", self.name, args.len())))
        }
    }

    fn test_fn(name: &str, arity: usize) -> Arc<dyn CustomFunction> {
        Arc::new(TestFunction { name: name.to_string(), arity })
    }

    fn descriptor(name: &str, tag: &str) -> FunctionDescriptor {
        let mut record = Map::new();
        record.insert("name".into(), json!(name));
        record.insert("tag".into(), json!(tag));
        FunctionDescriptor::from_record(record).unwrap()
    }

    #[test]
    fn overloads_by_arity() {
        let registry = FunctionRegistry::new();
        registry.register(test_fn("f", 0)).unwrap();
        registry.register(test_fn("f", 2)).unwrap();
        let snap = registry.snapshot();
        assert_eq!(snap.function("f", 2).unwrap().arity(), 2);
        match snap.function("f", 1) {
            Err(Error::ArityMismatch { expected, actual, .. }) => {
                assert_eq!(expected, vec![0, 2]);
                assert_eq!(actual, 1);
            }
            _ => panic!("expected arity mismatch"),
        }
        assert!(matches!(snap.function("g", 0), Err(Error::UnknownFunction { .. })));
    }

    #[test]
    fn snapshot_is_isolated_from_later_commits() {
        let registry = FunctionRegistry::new();
        let before = registry.snapshot();
        let mut table = RemoteTable::new();
        table.insert("a".into(), descriptor("a", "x"));
        registry.commit(Arc::new(table));
        assert!(before.descriptor("a").is_none());
        assert!(registry.snapshot().descriptor("a").is_some());
        assert!(registry.lookup("a").unwrap().overloads.is_empty());
        registry.clear();
        assert!(matches!(registry.lookup("a"), Err(Error::UnknownFunction { .. })));
    }

    #[test]
    fn replace_all_only_touches_selected_entries() {
        let registry = FunctionRegistry::new();
        registry.replace_all(
            &FunctionFilter::new(),
            vec![descriptor("a", "x"), descriptor("b", "y")],
        );
        registry.replace_all(
            &FunctionFilter::new().with("tag", json!("x")),
            vec![descriptor("c", "x")],
        );
        assert_eq!(registry.snapshot().remote_names(), vec!["b", "c"]);
    }

    #[test]
    fn standard_builtins_are_fixed() {
        let registry = FunctionRegistry::with_builtins();
        assert!(matches!(
            registry.register(test_fn("countArray", 1)),
            Err(Error::InvalidDescriptor(_))
        ));
        assert!(matches!(
            registry.register(test_fn("countArray", 3)),
            Err(Error::InvalidDescriptor(_))
        ));
        assert!(!registry.unregister("countArray"));
        let snap = registry.snapshot();
        assert_eq!(snap.function("countArray", 1).unwrap().description(), Some("Number of array elements"));
        assert!(snap.function("countArray", 3).is_err());

        registry.register(test_fn("countRows", 1)).unwrap();
        assert!(registry.unregister("countRows"));
        assert!(!registry.unregister("countRows"));
    }

    #[test]
    fn concurrent_lookups() {
        let registry = Arc::new(FunctionRegistry::new());
        registry.register(test_fn("FUNC1", 0)).unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        assert!(registry.snapshot().has_function("FUNC1"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
