/*!
 * Task Scheduler Simulator Library
 * A single simulated CPU shared by cooperative tasks under FCFS, round-robin
 * or priority scheduling, with a timer-driven tick and a fixed resource pool
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod resource;
pub mod scheduler;

// Re-exports
pub use crate::core::{
    Priority, ResourceId, SchedulerConfig, SchedulerError, SchedulerResult, TaskId, Tick,
    RESOURCE_COUNT,
};
pub use monitoring::init_tracing;
pub use process::{TaskState, TaskView, Workload, WorkloadRegistry};
pub use resource::{ResourcePool, ResourceSet};
pub use scheduler::{
    Phase, ResourceWaitPolicy, RunOutcome, Scheduler, SchedulerEvent, SchedulerStatus,
    SchedulingPolicy, TaskContext, TaskReport, TickSource, TimeQuantum,
};
