/*!
 * Task Context
 * The operations a running workload uses to talk to the scheduler
 */

use super::state::{Core, Owner, Shared};
use super::events::SchedulerEvent;
use super::types::ticks_for;
use crate::core::types::{ResourceId, TaskId};
use crate::process::TaskState;
use crate::resource::ResourceSet;
use parking_lot::MutexGuard;
use std::panic;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Unwind payload ending a task's call stack after `exit` or deletion
pub(crate) struct TaskExit;

/// Handle given to a workload for the duration of its run.
///
/// Every method is a suspension point: if the task was preempted, deleted
/// or the simulation is pausing, the call parks the task (or ends it)
/// before doing anything else.
pub struct TaskContext {
    shared: Arc<Shared>,
    id: TaskId,
    name: String,
}

impl TaskContext {
    pub(crate) fn new(shared: Arc<Shared>, id: TaskId, name: String) -> Self {
        Self { shared, id, name }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Preemption point for compute loops. Returns once the task owns the
    /// CPU again.
    pub fn checkpoint(&self) {
        drop(self.enter());
    }

    /// Block for at least `duration`, measured in timer ticks
    pub fn sleep(&self, duration: Duration) {
        let mut core = self.enter();
        let ticks = ticks_for(duration, core.config.tick_interval);
        if let Some(task) = core.queue.get_mut(self.id) {
            task.state = TaskState::Waiting;
            task.sleep_remaining = ticks;
            task.blocked_on = None;
        }
        core.record(SchedulerEvent::Sleeping {
            task: self.name.clone(),
        });
        drop(self.settle(core));
    }

    /// Terminate the task. Nothing after this call runs.
    pub fn exit(&self) -> ! {
        let mut core = self.enter();
        core.terminate(self.id);
        drop(core);
        panic::resume_unwind(Box::new(TaskExit))
    }

    /// Take every resource in `ids` at once, blocking until that is possible.
    ///
    /// Malformed requests are ignored.
    pub fn acquire(&self, ids: &[ResourceId]) {
        let Some(request) = self.validate(ids) else {
            return;
        };

        let mut core = self.enter();
        loop {
            if core.pool.try_grant(request, self.id) {
                if let Some(task) = core.queue.get_mut(self.id) {
                    task.held = task.held.union(request);
                    task.blocked_on = None;
                }
                for resource in request.iter() {
                    core.record(SchedulerEvent::Granted {
                        task: self.name.clone(),
                        resource,
                    });
                }
                return;
            }

            if let Some(task) = core.queue.get_mut(self.id) {
                task.state = TaskState::Waiting;
                task.sleep_remaining = 0;
                task.blocked_on = Some(request);
            }
            core.record(SchedulerEvent::WaitingResource {
                task: self.name.clone(),
            });
            core = self.settle(core);
        }
    }

    /// Return resources to the pool. Never blocks.
    ///
    /// The pool frees the named ids whoever holds them. Malformed requests
    /// are ignored.
    pub fn release(&self, ids: &[ResourceId]) {
        let Some(set) = self.validate(ids) else {
            return;
        };

        let mut core = self.enter();
        core.pool.release(set);
        if let Some(task) = core.queue.get_mut(self.id) {
            task.held = task.held.difference(set);
        }
        for resource in set.iter() {
            core.record(SchedulerEvent::Released {
                task: self.name.clone(),
                resource,
            });
        }
    }

    fn validate(&self, ids: &[ResourceId]) -> Option<ResourceSet> {
        match ResourceSet::try_from_ids(ids) {
            Ok(set) => Some(set),
            Err(e) => {
                debug!(task = %self.name, error = %e, "Ignoring resource request");
                None
            }
        }
    }

    /// Lock the core once this task is cleared to run
    fn enter(&self) -> MutexGuard<'_, Core> {
        let core = self.shared.core.lock();
        self.settle(core)
    }

    /// Park until this task is RUNNING and holds the token.
    ///
    /// Hands the token back first if the task still has it but may not
    /// continue. Unwinds the task's stack if it was terminated or the
    /// scheduler is shutting down.
    fn settle<'a>(&'a self, mut core: MutexGuard<'a, Core>) -> MutexGuard<'a, Core> {
        loop {
            let state = core.queue.get(self.id).map(|t| t.state());
            if core.shutdown || matches!(state, None | Some(TaskState::Terminated)) {
                drop(core);
                panic::resume_unwind(Box::new(TaskExit));
            }

            let owns = core.owner == Owner::Task(self.id);
            if owns && state == Some(TaskState::Running) && !core.pause_requested {
                return core;
            }
            if owns {
                core.owner = Owner::Dispatcher;
                self.shared.wake_all();
            }
            self.shared.turnstile.wait(&mut core);
        }
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
