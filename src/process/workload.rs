/*!
 * Workload Registry
 * Named task entry points resolved at creation time
 */

use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::scheduler::TaskContext;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Task entry point. Runs on the task's own thread and talks to the
/// scheduler only through the context it is handed.
pub type Workload = Arc<dyn Fn(&TaskContext) + Send + Sync + 'static>;

/// Workloads addressable by name
#[derive(Clone, Default)]
pub struct WorkloadRegistry {
    entries: BTreeMap<String, Workload>,
}

impl WorkloadRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the sample workloads
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        super::workloads::register_builtin(&mut registry);
        registry
    }

    /// Register (or replace) a workload under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, workload: F) -> &mut Self
    where
        F: Fn(&TaskContext) + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(workload));
        self
    }

    /// Builder form of [`register`](Self::register)
    pub fn with<F>(mut self, name: impl Into<String>, workload: F) -> Self
    where
        F: Fn(&TaskContext) + Send + Sync + 'static,
    {
        self.register(name, workload);
        self
    }

    pub fn resolve(&self, name: &str) -> SchedulerResult<Workload> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| SchedulerError::UnknownWorkload(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for WorkloadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
