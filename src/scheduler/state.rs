/*!
 * Scheduler State
 * State shared by the dispatcher, task threads and the timer, plus the
 * turnstile that lets exactly one of them run simulated code at a time
 */

use super::events::{EventLog, SchedulerEvent};
use super::types::{Phase, SchedulerStatus};
use crate::core::config::SchedulerConfig;
use crate::core::types::TaskId;
use crate::process::{ReadyQueue, Task, TaskState};
use crate::resource::{ResourcePool, ResourceSet};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

/// Holder of the execution token.
///
/// Only the dispatcher moves the token to a task, and only that task's
/// thread hands it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owner {
    Dispatcher,
    Task(TaskId),
}

/// Mutable scheduler state, guarded by `Shared::core`
#[derive(Debug)]
pub(crate) struct Core {
    pub(crate) config: SchedulerConfig,
    pub(crate) queue: ReadyQueue,
    pub(crate) pool: ResourcePool,
    pub(crate) current: Option<TaskId>,
    pub(crate) owner: Owner,
    pub(crate) phase: Phase,
    pub(crate) idle: bool,
    pub(crate) pause_requested: bool,
    pub(crate) shutdown: bool,
    pub(crate) next_id: TaskId,
    pub(crate) ticks: u64,
    pub(crate) events: EventLog,
}

impl Core {
    pub(crate) fn new(config: SchedulerConfig) -> Self {
        Self {
            queue: ReadyQueue::new(config.policy.into()),
            pool: ResourcePool::new(),
            current: None,
            owner: Owner::Dispatcher,
            phase: Phase::NotStarted,
            idle: false,
            pause_requested: false,
            shutdown: false,
            next_id: 1,
            ticks: 0,
            events: EventLog::new(config.event_capacity),
            config,
        }
    }

    /// Log an event and append it to the event log
    pub(crate) fn record(&mut self, event: SchedulerEvent) {
        info!("{}", event);
        self.events.push(event);
    }

    /// Give the CPU to `id`: RUNNING, fresh quantum under round-robin.
    ///
    /// `announce` controls whether "is running" is recorded.
    pub(crate) fn select(&mut self, id: TaskId, announce: bool) {
        let quantum = self.config.quantum.ticks();
        let round_robin = self.config.policy.is_round_robin();

        let Some(task) = self.queue.get_mut(id) else {
            return;
        };
        task.state = TaskState::Running;
        if round_robin {
            task.quantum_remaining = quantum;
        }
        let name = task.name.clone();

        self.current = Some(id);
        if announce {
            self.record(SchedulerEvent::Running { task: name });
        }
    }

    /// Mark a task TERMINATED after it exits on its own.
    ///
    /// A task already terminated (deleted) is left alone.
    pub(crate) fn terminate(&mut self, id: TaskId) {
        let Some(task) = self.queue.get_mut(id) else {
            return;
        };
        if task.is_terminated() {
            return;
        }
        task.state = TaskState::Terminated;
        task.blocked_on = None;
        let name = task.name.clone();

        if self.config.reclaim_on_terminate {
            self.reclaim(id);
        }
        self.record(SchedulerEvent::Terminated { task: name });
    }

    /// Return to the pool whatever `id` still owns there.
    ///
    /// Ids in the task's held set that were freed by someone else (and maybe
    /// granted again) are only dropped from the set.
    pub(crate) fn reclaim(&mut self, id: TaskId) {
        let owned = self.pool.held_by(id);
        let Some(task) = self.queue.get_mut(id) else {
            return;
        };
        let held = std::mem::replace(&mut task.held, ResourceSet::EMPTY);
        let reclaimed = held.intersection(owned);
        if !reclaimed.is_empty() {
            debug!(tid = id, resources = %reclaimed, "Reclaiming resources");
            self.pool.release(reclaimed);
        }
    }

    /// Next task the dispatcher should hand the token to, selecting it if
    /// it was READY
    pub(crate) fn pick_next(&mut self) -> Option<TaskId> {
        if let Some(id) = self.current {
            match self.queue.get(id).map(Task::state) {
                // Resume the task that held the CPU when control came back
                Some(TaskState::Running) => return Some(id),
                Some(TaskState::Terminated) if self.config.policy.is_round_robin() => {
                    if let Some(next) = self.queue.next_ready_after(id) {
                        self.select(next, true);
                        return Some(next);
                    }
                }
                _ => {}
            }
        }

        let id = self.queue.first_runnable()?;
        match self.queue.get(id).map(Task::state) {
            Some(TaskState::Ready) => self.select(id, true),
            _ => self.current = Some(id),
        }
        Some(id)
    }

    pub(crate) fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            policy: self.config.policy,
            phase: self.phase,
            idle: self.idle,
            current: self.current,
            ticks: self.ticks,
            tasks: self.queue.len(),
        }
    }
}

/// Core state plus the condition variable every party parks on
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) core: Mutex<Core>,
    pub(crate) turnstile: Condvar,
}

impl Shared {
    pub(crate) fn new(config: SchedulerConfig) -> Self {
        Self {
            core: Mutex::new(Core::new(config)),
            turnstile: Condvar::new(),
        }
    }

    /// Wake every parked party so it can re-check the state
    #[inline]
    pub(crate) fn wake_all(&self) {
        self.turnstile.notify_all();
    }
}
