/*!
 * Dispatcher
 * The scheduler loop, and the threads that carry each task's call stack
 */

use super::context::{TaskContext, TaskExit};
use super::state::{Core, Owner, Shared};
use super::events::SchedulerEvent;
use super::types::{Phase, RunOutcome};
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::TaskId;
use crate::monitoring::span_task;
use crate::process::task::ExecutionHandle;
use crate::process::{TaskState, Workload};
use parking_lot::MutexGuard;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

impl Shared {
    /// Run tasks until every one has terminated or a pause is requested.
    ///
    /// Called on the thread that drives the simulation. Each pass hands the
    /// token to one task and waits for it to come back.
    pub(crate) fn run_dispatcher(self: &Arc<Self>) -> SchedulerResult<RunOutcome> {
        let mut core = self.core.lock();
        loop {
            if core.pause_requested || core.shutdown {
                core.pause_requested = false;
                core.phase = Phase::Paused;
                info!("Simulation paused");
                return Ok(RunOutcome::Paused);
            }

            match core.pick_next() {
                Some(id) => {
                    if let Err(e) = self.dispatch(&mut core, id) {
                        core.phase = Phase::Paused;
                        return Err(e);
                    }
                }
                None if core.queue.all_terminated() => {
                    core.phase = Phase::Finished;
                    core.current = None;
                    core.record(SchedulerEvent::SimulationOver);
                    return Ok(RunOutcome::Completed);
                }
                None => {
                    core.record(SchedulerEvent::Idle);
                    core.idle = true;
                    while core.idle && !core.pause_requested && !core.shutdown {
                        self.turnstile.wait(&mut core);
                    }
                    core.idle = false;
                }
            }
        }
    }

    /// Give the token to `id` and wait until it is handed back
    fn dispatch(self: &Arc<Self>, core: &mut MutexGuard<'_, Core>, id: TaskId) -> SchedulerResult<()> {
        let stack_size = core.config.task_stack_size;
        let task = core
            .queue
            .get_mut(id)
            .ok_or_else(|| SchedulerError::TaskNotFound(id.to_string()))?;

        if let Some(workload) = task.handle.take_fresh() {
            match self.spawn_task(id, task.name.clone(), Arc::clone(&workload), stack_size) {
                Ok(handle) => task.handle = ExecutionHandle::Started(handle),
                Err(e) => {
                    // Never ran, so it can be dispatched again from scratch
                    warn!(tid = id, error = %e, "Task thread failed to start");
                    task.handle = ExecutionHandle::Fresh(workload);
                    task.state = TaskState::Ready;
                    core.current = None;
                    return Err(e);
                }
            }
        }

        core.owner = Owner::Task(id);
        self.wake_all();
        while core.owner != Owner::Dispatcher {
            self.turnstile.wait(core);
        }
        Ok(())
    }

    fn spawn_task(
        self: &Arc<Self>,
        id: TaskId,
        name: String,
        workload: Workload,
        stack_size: usize,
    ) -> SchedulerResult<JoinHandle<()>> {
        let shared = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(format!("task-{}", name))
            .stack_size(stack_size)
            .spawn(move || shared.run_task(id, name, workload))?;
        debug!(tid = id, "Task thread spawned");
        Ok(handle)
    }

    /// Body of a task thread
    fn run_task(self: Arc<Self>, id: TaskId, name: String, workload: Workload) {
        let span = span_task(id, &name);
        let _entered = span.enter();
        let ctx = TaskContext::new(Arc::clone(&self), id, name);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            ctx.checkpoint();
            workload(&ctx);
        }));

        let mut core = self.core.lock();
        match outcome {
            // Returning from the workload counts as exit
            Ok(()) => core.terminate(id),
            Err(payload) if payload.is::<TaskExit>() => {}
            Err(payload) => {
                error!(
                    task = %ctx.name(),
                    reason = panic_message(payload.as_ref()),
                    "Task panicked"
                );
                core.terminate(id);
            }
        }

        if core.owner == Owner::Task(id) {
            core.owner = Owner::Dispatcher;
            self.wake_all();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
