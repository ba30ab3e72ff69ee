//! Scoped name bindings shared between the evaluator and spawned tasks.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, RwLock};

use crate::value::Value;

/// Counts live background tasks; `wait_tasks` blocks until it reaches zero.
///
/// Only the root environment owns one.
struct TaskTracker {
    count: Mutex<usize>,
    zero: Condvar,
}

impl TaskTracker {
    fn new() -> Self {
        TaskTracker {
            count: Mutex::new(0),
            zero: Condvar::new(),
        }
    }

    fn lock_count(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn add(&self) {
        *self.lock_count() += 1;
    }

    fn done(&self) {
        let mut count = self.lock_count();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.zero.notify_all();
        }
    }

    fn wait(&self) {
        let mut count = self.lock_count();
        while *count > 0 {
            count = self
                .zero
                .wait(count)
                .unwrap_or_else(|e| e.into_inner());
        }
    }
}

/// A lexically-scoped name→value mapping with an optional enclosing scope.
///
/// Environments are shared via `Arc`: closures keep their defining scope
/// alive, and spawned tasks read and write scopes concurrently with the
/// main thread. Every access locks only this environment's own mapping and
/// releases it before walking outward, so sibling tasks never hold two
/// locks at once.
pub struct Environment {
    store: RwLock<HashMap<String, Value>>,
    outer: Option<Arc<Environment>>,
    tasks: Option<TaskTracker>,
}

impl Environment {
    /// Create a root environment. It owns the task wait-group for the whole
    /// program run.
    pub fn new() -> Arc<Environment> {
        Arc::new(Environment {
            store: RwLock::new(HashMap::new()),
            outer: None,
            tasks: Some(TaskTracker::new()),
        })
    }

    /// Create a scope enclosed by `outer` (function call, loop body, catch
    /// clause).
    pub fn new_enclosed(outer: &Arc<Environment>) -> Arc<Environment> {
        Arc::new(Environment {
            store: RwLock::new(HashMap::new()),
            outer: Some(Arc::clone(outer)),
            tasks: None,
        })
    }

    /// The outermost environment in the chain.
    pub fn root(self: &Arc<Self>) -> Arc<Environment> {
        let mut env = Arc::clone(self);
        while let Some(outer) = env.outer.clone() {
            env = outer;
        }
        env
    }

    fn read_store(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Value>> {
        self.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_store(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.store.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Look `name` up in this scope, then outward through the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        let local = self.read_store().get(name).cloned();
        match local {
            Some(value) => Some(value),
            None => self.outer.as_ref().and_then(|outer| outer.get(name)),
        }
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.write_store().insert(name.into(), value);
    }

    /// Update the nearest enclosing binding of `name`. When no scope in the
    /// chain has one, the binding is created here.
    pub fn update(&self, name: &str, value: Value) {
        if !self.try_update(name, &value) {
            self.set(name, value);
        }
    }

    fn try_update(&self, name: &str, value: &Value) -> bool {
        {
            let mut store = self.write_store();
            if let Some(slot) = store.get_mut(name) {
                *slot = value.clone();
                return true;
            }
        }
        match &self.outer {
            Some(outer) => outer.try_update(name, value),
            None => false,
        }
    }

    /// Snapshot this scope's local bindings as a hash. Used by module
    /// imports to expose a module's top-level names.
    pub fn export(&self) -> Value {
        Value::Hash(self.read_store().clone())
    }

    /// Count one more live background task. No-op outside the root.
    pub fn add_task(&self) {
        if let Some(tasks) = &self.tasks {
            tasks.add();
        }
    }

    /// Mark one background task finished. No-op outside the root.
    pub fn task_done(&self) {
        if let Some(tasks) = &self.tasks {
            tasks.done();
        }
    }

    /// Block until every spawned task has finished. No-op outside the root.
    pub fn wait_tasks(&self) {
        if let Some(tasks) = &self.tasks {
            tasks.wait();
        }
    }
}
