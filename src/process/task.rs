/*!
 * Task Control Block
 * Schedulable state for one task: identity, timing counters, held resources
 * and the resumable execution handle
 */

use super::workload::{Workload, WorkloadRegistry};
use crate::core::errors::SchedulerResult;
use crate::core::types::{Priority, TaskId, Tick};
use crate::resource::ResourceSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread::JoinHandle;

/// Task state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Waiting in the ready queue to be dispatched
    Ready,
    /// Holds the CPU
    Running,
    /// Sleeping or blocked on resources
    Waiting,
    /// Finished, voluntarily or by deletion. Never dispatched again.
    Terminated,
}

impl TaskState {
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Waiting => "WAITING",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a task's logic is parked.
///
/// A task starts `Fresh`, bound to its workload entry point; the first
/// dispatch spawns the thread that carries its call stack from then on.
pub(crate) enum ExecutionHandle {
    Fresh(Workload),
    Started(JoinHandle<()>),
    Reaped,
}

impl ExecutionHandle {
    /// Take the entry point if the task has never run
    pub(crate) fn take_fresh(&mut self) -> Option<Workload> {
        match std::mem::replace(self, ExecutionHandle::Reaped) {
            ExecutionHandle::Fresh(workload) => Some(workload),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Take the thread handle for joining
    pub(crate) fn take_thread(&mut self) -> Option<JoinHandle<()>> {
        match std::mem::replace(self, ExecutionHandle::Reaped) {
            ExecutionHandle::Started(handle) => Some(handle),
            other => {
                *self = other;
                None
            }
        }
    }
}

impl fmt::Debug for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionHandle::Fresh(_) => f.write_str("Fresh"),
            ExecutionHandle::Started(handle) => f
                .debug_tuple("Started")
                .field(&handle.thread().name())
                .finish(),
            ExecutionHandle::Reaped => f.write_str("Reaped"),
        }
    }
}

/// Task control block
#[derive(Debug)]
pub struct Task {
    pub(crate) id: TaskId,
    pub(crate) name: String,
    pub(crate) workload: String,
    pub(crate) priority: Priority,
    pub(crate) state: TaskState,
    pub(crate) running: Tick,
    pub(crate) waiting: Tick,
    pub(crate) turnaround: Tick,
    pub(crate) sleep_remaining: Tick,
    pub(crate) held: ResourceSet,
    pub(crate) quantum_remaining: Tick,
    /// Outstanding request while blocked under wake-on-release
    pub(crate) blocked_on: Option<ResourceSet>,
    pub(crate) handle: ExecutionHandle,
}

impl Task {
    /// Allocate a READY task bound to a registered workload.
    ///
    /// Fails with `UnknownWorkload` if `workload_name` is not registered.
    pub fn create(
        id: TaskId,
        name: &str,
        workload_name: &str,
        priority: Priority,
        registry: &WorkloadRegistry,
    ) -> SchedulerResult<Self> {
        let workload = registry.resolve(workload_name)?;
        Ok(Self {
            id,
            name: name.to_string(),
            workload: workload_name.to_string(),
            priority,
            state: TaskState::Ready,
            running: 0,
            waiting: 0,
            turnaround: 0,
            sleep_remaining: 0,
            held: ResourceSet::EMPTY,
            quantum_remaining: 0,
            blocked_on: None,
            handle: ExecutionHandle::Fresh(workload),
        })
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[inline(always)]
    pub fn state(&self) -> TaskState {
        self.state
    }

    #[inline(always)]
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, TaskState::Terminated)
    }

    #[inline]
    pub fn held_resources(&self) -> ResourceSet {
        self.held
    }

    /// Read-only copy for reporting
    pub fn view(&self) -> TaskView {
        TaskView {
            id: self.id,
            name: self.name.clone(),
            workload: self.workload.clone(),
            state: self.state,
            priority: self.priority,
            running: self.running,
            waiting: self.waiting,
            turnaround: self.turnaround,
            resources: self.held,
            sleep_remaining: self.sleep_remaining,
            quantum_remaining: self.quantum_remaining,
        }
    }
}

/// Snapshot of a task as shown by `ps`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub name: String,
    pub workload: String,
    pub state: TaskState,
    pub priority: Priority,
    pub running: Tick,
    pub waiting: Tick,
    pub turnaround: Tick,
    pub resources: ResourceSet,
    pub sleep_remaining: Tick,
    pub quantum_remaining: Tick,
}
