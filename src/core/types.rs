/*!
 * Core Types
 * Common types used across the simulator
 */

/// Task identifier, assigned at creation and never reused
pub type TaskId = u32;

/// Scheduling priority (lower value = more important)
pub type Priority = u32;

/// Count of timer ticks
pub type Tick = u32;

/// Resource identifier in `0..RESOURCE_COUNT`
pub type ResourceId = u8;

/// Number of exclusive resources managed by the pool
pub const RESOURCE_COUNT: usize = 8;

/// Default timer interval in milliseconds
pub const DEFAULT_TICK_MS: u64 = 10;

/// Default round-robin slice, in ticks (30ms at the default interval)
pub const DEFAULT_QUANTUM_TICKS: Tick = 3;

/// Upper bound accepted for a round-robin slice
pub const MAX_QUANTUM_TICKS: Tick = 1_000;

/// Default capacity of the in-memory event log
pub const DEFAULT_EVENT_CAPACITY: usize = 1_024;

/// Default stack size for task threads
pub const DEFAULT_TASK_STACK_SIZE: usize = 512 * 1024;
