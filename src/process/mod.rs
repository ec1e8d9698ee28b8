/*!
 * Process Module
 * Task control blocks, the ready queue and the workloads tasks run
 */

pub mod queue;
pub mod task;
pub mod workload;
pub mod workloads;

pub use queue::{QueueOrder, ReadyQueue};
pub use task::{Task, TaskState, TaskView};
pub use workload::{Workload, WorkloadRegistry};
