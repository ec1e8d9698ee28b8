/*!
 * Scheduler Module
 * Public handle over the dispatcher, tick handler, timer and task threads
 */

mod context;
mod dispatch;
mod events;
mod report;
mod state;
mod tick;
mod timer;
pub mod types;

pub use context::TaskContext;
pub use events::SchedulerEvent;
pub use report::TaskReport;
pub use types::{
    Phase, ResourceWaitPolicy, RunOutcome, SchedulerStatus, SchedulingPolicy, TickSource,
    TimeQuantum,
};

use self::state::Shared;
use self::timer::TimerTask;
use crate::core::config::SchedulerConfig;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{Priority, TaskId};
use crate::monitoring::span_dispatch;
use crate::process::{Task, TaskView, WorkloadRegistry};
use crate::resource::ResourcePool;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Simulated CPU scheduler.
///
/// Tasks are created from registered workloads and run one at a time under
/// the configured policy. The thread calling [`start_or_resume`] acts as the
/// dispatcher until every task terminates or [`pause`] is called from
/// elsewhere.
///
/// [`start_or_resume`]: Scheduler::start_or_resume
/// [`pause`]: Scheduler::pause
pub struct Scheduler {
    shared: Arc<Shared>,
    registry: WorkloadRegistry,
    timer: Mutex<Option<TimerTask>>,
    driver: Mutex<()>,
}

impl Scheduler {
    /// Scheduler running the built-in sample workloads
    pub fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        Self::with_registry(config, WorkloadRegistry::builtin())
    }

    pub fn with_registry(config: SchedulerConfig, registry: WorkloadRegistry) -> SchedulerResult<Self> {
        config.validate()?;
        info!(
            policy = %config.policy,
            tick_ms = config.tick_interval.as_millis() as u64,
            quantum_ticks = config.quantum.ticks(),
            "Scheduler initialized"
        );
        Ok(Self {
            shared: Arc::new(Shared::new(config)),
            registry,
            timer: Mutex::new(None),
            driver: Mutex::new(()),
        })
    }

    pub fn policy(&self) -> SchedulingPolicy {
        self.shared.core.lock().config.policy
    }

    pub fn config(&self) -> SchedulerConfig {
        self.shared.core.lock().config.clone()
    }

    pub fn registry(&self) -> &WorkloadRegistry {
        &self.registry
    }

    /// Create a READY task running `workload` and insert it per policy
    pub fn create_and_enqueue(
        &self,
        name: &str,
        workload: &str,
        priority: Priority,
    ) -> SchedulerResult<TaskId> {
        let mut core = self.shared.core.lock();
        let id = core.next_id;
        let task = Task::create(id, name, workload, priority, &self.registry)?;
        core.next_id += 1;
        core.queue.enqueue(task);
        core.record(SchedulerEvent::Ready {
            task: name.to_string(),
        });

        if core.idle {
            core.idle = false;
            self.shared.wake_all();
        }
        Ok(id)
    }

    /// Force the task named `name` to TERMINATED. Its remaining code never
    /// runs.
    pub fn request_termination(&self, name: &str) -> SchedulerResult<()> {
        let mut core = self.shared.core.lock();
        let id = core
            .queue
            .mark_terminated(name)
            .ok_or_else(|| SchedulerError::TaskNotFound(name.to_string()))?;

        if core.config.reclaim_on_terminate {
            core.reclaim(id);
        }
        core.record(SchedulerEvent::Killed {
            task: name.to_string(),
        });

        if core.idle && core.queue.all_terminated() {
            core.idle = false;
        }
        // Parked task threads re-check their state
        self.shared.wake_all();
        Ok(())
    }

    /// Snapshot of every task in queue order
    pub fn list(&self) -> Vec<TaskView> {
        self.shared.core.lock().queue.snapshot()
    }

    pub fn report(&self) -> TaskReport {
        TaskReport::new(self.list())
    }

    /// Copy of the resource pool as it stands now
    pub fn resources(&self) -> ResourcePool {
        self.shared.core.lock().pool.clone()
    }

    pub fn status(&self) -> SchedulerStatus {
        self.shared.core.lock().status()
    }

    /// Recent events, oldest first
    pub fn events(&self) -> Vec<SchedulerEvent> {
        self.shared.core.lock().events.to_vec()
    }

    /// Deliver one tick by hand. Meant for `TickSource::Manual`.
    pub fn tick(&self) {
        self.shared.tick();
    }

    /// Run the simulation on the calling thread until every task has
    /// terminated or a pause is requested.
    ///
    /// After a pause the next call continues exactly where execution
    /// stopped.
    pub fn start_or_resume(&self) -> SchedulerResult<RunOutcome> {
        let _driver = self.driver.try_lock().ok_or(SchedulerError::AlreadyRunning)?;
        let span = span_dispatch(self.policy().as_str());
        let _entered = span.enter();

        {
            let mut core = self.shared.core.lock();
            core.phase = Phase::Running;
            core.pause_requested = false;
        }
        info!("Start simulation.");

        self.arm_timer()?;
        let outcome = self.shared.run_dispatcher();
        self.disarm_timer();

        if let Ok(RunOutcome::Completed) = outcome {
            self.reap();
        }
        outcome
    }

    /// Ask a running simulation to stop at the next suspension point.
    /// No effect unless the simulation is running.
    pub fn pause(&self) {
        let mut core = self.shared.core.lock();
        if core.phase != Phase::Running {
            return;
        }
        core.pause_requested = true;
        drop(core);

        if let Some(timer) = self.timer.lock().as_ref() {
            timer.pause();
        }
        self.shared.wake_all();
    }

    fn arm_timer(&self) -> SchedulerResult<()> {
        let (source, interval) = {
            let core = self.shared.core.lock();
            (core.config.tick_source, core.config.tick_interval)
        };
        if source == TickSource::Manual {
            return Ok(());
        }

        let mut timer = self.timer.lock();
        match timer.as_ref() {
            Some(timer) => timer.resume(),
            None => *timer = Some(TimerTask::spawn(Arc::clone(&self.shared), interval)?),
        }
        Ok(())
    }

    fn disarm_timer(&self) {
        if let Some(timer) = self.timer.lock().as_ref() {
            timer.pause();
        }
    }

    /// Join the threads of terminated tasks
    fn reap(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut core = self.shared.core.lock();
            core.queue
                .iter_mut()
                .filter(|t| t.is_terminated())
                .filter_map(|t| t.handle.take_thread())
                .collect()
        };
        join_all(handles);
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.shutdown();
        }

        let handles: Vec<JoinHandle<()>> = {
            let mut core = self.shared.core.lock();
            core.shutdown = true;
            core.queue
                .iter_mut()
                .filter_map(|t| t.handle.take_thread())
                .collect()
        };
        self.shared.wake_all();
        join_all(handles);
    }
}

fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if handle.join().is_err() {
            warn!("Task thread ended abnormally");
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("status", &self.status())
            .field("registry", &self.registry)
            .finish()
    }
}
