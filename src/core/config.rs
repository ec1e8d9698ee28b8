/*!
 * Scheduler Configuration
 * Startup configuration with environment overrides
 */

use super::errors::{SchedulerError, SchedulerResult};
use super::types::{
    Tick, DEFAULT_EVENT_CAPACITY, DEFAULT_TASK_STACK_SIZE, DEFAULT_TICK_MS,
};
use crate::scheduler::types::{ResourceWaitPolicy, SchedulingPolicy, TickSource, TimeQuantum};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding the tick interval (milliseconds)
pub const ENV_TICK_MS: &str = "SCHED_TICK_MS";
/// Environment variable overriding the round-robin slice (ticks)
pub const ENV_QUANTUM_TICKS: &str = "SCHED_QUANTUM_TICKS";
/// Environment variable selecting the resource wait policy
pub const ENV_RESOURCE_WAIT: &str = "SCHED_RESOURCE_WAIT";
/// Environment variable enabling resource reclamation on termination
pub const ENV_RECLAIM: &str = "SCHED_RECLAIM_ON_TERMINATE";

/// Scheduler configuration, fixed for the lifetime of a `Scheduler`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub policy: SchedulingPolicy,
    pub tick_interval: Duration,
    pub tick_source: TickSource,
    pub quantum: TimeQuantum,
    pub resource_wait: ResourceWaitPolicy,
    /// Release a task's held resources when it terminates.
    /// Off by default: forced deletion leaks whatever the task held.
    pub reclaim_on_terminate: bool,
    pub event_capacity: usize,
    pub task_stack_size: usize,
}

impl SchedulerConfig {
    /// Default configuration for a policy
    pub fn new(policy: SchedulingPolicy) -> Self {
        Self {
            policy,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            tick_source: TickSource::Timer,
            quantum: TimeQuantum::default(),
            resource_wait: ResourceWaitPolicy::Polling,
            reclaim_on_terminate: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            task_stack_size: DEFAULT_TASK_STACK_SIZE,
        }
    }

    /// Default configuration with `SCHED_*` environment overrides applied
    pub fn from_env(policy: SchedulingPolicy) -> SchedulerResult<Self> {
        let mut config = Self::new(policy);

        if let Some(ms) = read_env::<u64>(ENV_TICK_MS)? {
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(ticks) = read_env::<Tick>(ENV_QUANTUM_TICKS)? {
            config.quantum = TimeQuantum::new(ticks)?;
        }
        if let Ok(value) = std::env::var(ENV_RESOURCE_WAIT) {
            config.resource_wait = value.parse()?;
        }
        if let Some(flag) = read_env::<bool>(ENV_RECLAIM)? {
            config.reclaim_on_terminate = flag;
        }

        config.validate()?;
        debug!(?config, "Scheduler configuration loaded from environment");
        Ok(config)
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_tick_source(mut self, source: TickSource) -> Self {
        self.tick_source = source;
        self
    }

    /// Ticks are delivered by the caller instead of a timer thread
    pub fn manual_ticks(self) -> Self {
        self.with_tick_source(TickSource::Manual)
    }

    pub fn with_quantum(mut self, quantum: TimeQuantum) -> Self {
        self.quantum = quantum;
        self
    }

    pub fn with_resource_wait(mut self, policy: ResourceWaitPolicy) -> Self {
        self.resource_wait = policy;
        self
    }

    pub fn with_reclaim_on_terminate(mut self, reclaim: bool) -> Self {
        self.reclaim_on_terminate = reclaim;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.tick_interval < Duration::from_millis(1) {
            return Err(SchedulerError::InvalidConfig(format!(
                "tick interval {:?} is below 1ms",
                self.tick_interval
            )));
        }
        if self.task_stack_size < 64 * 1024 {
            return Err(SchedulerError::InvalidConfig(format!(
                "task stack size {} is below 64KiB",
                self.task_stack_size
            )));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(SchedulingPolicy::Fcfs)
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> SchedulerResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SchedulerError::InvalidConfig(format!("{}={} is not valid", key, raw))),
        Err(_) => Ok(None),
    }
}
