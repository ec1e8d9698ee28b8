/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-related errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Unknown workload: {0}")]
    #[diagnostic(
        code(scheduler::unknown_workload),
        help("Workloads are resolved by name from the registry. Run `help` to list them.")
    )]
    UnknownWorkload(String),

    #[error("Cannot find task {0}")]
    #[diagnostic(
        code(scheduler::task_not_found),
        help("Check the task name with `ps`.")
    )]
    TaskNotFound(String),

    #[error("Invalid resource request: {0}")]
    #[diagnostic(
        code(resource::invalid_request),
        help("Resource ids range over 0..8 and a request names between 1 and 7 of them.")
    )]
    InvalidResourceRequest(String),

    #[error("Invalid scheduling policy: {0}")]
    #[diagnostic(
        code(scheduler::invalid_policy),
        help("Use FCFS, RR or PP.")
    )]
    InvalidPolicy(String),

    #[error("Invalid time quantum: {0}")]
    #[diagnostic(
        code(scheduler::invalid_quantum),
        help("The round-robin slice must be between 1 and 1000 ticks.")
    )]
    InvalidQuantum(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(scheduler::invalid_config),
        help("Review the SCHED_* environment variables and command-line flags.")
    )]
    InvalidConfig(String),

    #[error("Scheduler is already running")]
    #[diagnostic(
        code(scheduler::already_running),
        help("Only one caller may drive the dispatcher at a time. Pause it first.")
    )]
    AlreadyRunning,

    #[error("Failed to spawn thread: {0}")]
    #[diagnostic(
        code(scheduler::spawn),
        help("Task threads need a stack of `task_stack_size` bytes. Lower it or free memory.")
    )]
    Spawn(String),

    #[error("Timer failure: {0}")]
    #[diagnostic(
        code(scheduler::timer),
        help("The periodic tick thread could not be started.")
    )]
    Timer(String),
}

impl SchedulerError {
    /// Short stable label for logs
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::UnknownWorkload(_) => "unknown_workload",
            SchedulerError::TaskNotFound(_) => "task_not_found",
            SchedulerError::InvalidResourceRequest(_) => "invalid_resource_request",
            SchedulerError::InvalidPolicy(_) => "invalid_policy",
            SchedulerError::InvalidQuantum(_) => "invalid_quantum",
            SchedulerError::InvalidConfig(_) => "invalid_config",
            SchedulerError::AlreadyRunning => "already_running",
            SchedulerError::Spawn(_) => "spawn",
            SchedulerError::Timer(_) => "timer",
        }
    }
}

impl From<std::io::Error> for SchedulerError {
    fn from(err: std::io::Error) -> Self {
        SchedulerError::Spawn(err.to_string())
    }
}
