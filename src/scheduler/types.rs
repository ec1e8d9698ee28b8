/*!
 * Scheduler Types
 * Domain types for scheduling policy, time slicing and run control
 */

use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{TaskId, Tick, DEFAULT_QUANTUM_TICKS, MAX_QUANTUM_TICKS};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Scheduling discipline, fixed once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulingPolicy {
    /// First come, first served
    Fcfs,
    /// Round-robin with a fixed time quantum
    RoundRobin,
    /// Priority ordering (lower value runs first)
    Priority,
}

impl SchedulingPolicy {
    /// Convert to the short name used on the command line
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fcfs => "FCFS",
            Self::RoundRobin => "RR",
            Self::Priority => "PP",
        }
    }

    #[inline]
    pub const fn is_round_robin(&self) -> bool {
        matches!(self, Self::RoundRobin)
    }
}

impl FromStr for SchedulingPolicy {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fcfs" | "fifo" => Ok(Self::Fcfs),
            "rr" | "round_robin" | "roundrobin" => Ok(Self::RoundRobin),
            "pp" | "priority" | "prio" => Ok(Self::Priority),
            _ => Err(SchedulerError::InvalidPolicy(format!(
                "'{}'. Valid: FCFS, RR, PP",
                s
            ))),
        }
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SchedulingPolicy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SchedulingPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Round-robin time slice, counted in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeQuantum {
    ticks: Tick,
}

impl TimeQuantum {
    /// Create a new time quantum
    pub fn new(ticks: Tick) -> SchedulerResult<Self> {
        if ticks == 0 || ticks > MAX_QUANTUM_TICKS {
            return Err(SchedulerError::InvalidQuantum(format!(
                "{} must be between 1 and {} ticks",
                ticks, MAX_QUANTUM_TICKS
            )));
        }
        Ok(Self { ticks })
    }

    /// Quantum covering `duration`, rounded up to whole ticks
    pub fn from_duration(duration: Duration, tick: Duration) -> SchedulerResult<Self> {
        Self::new(ticks_for(duration, tick))
    }

    #[inline(always)]
    pub const fn ticks(&self) -> Tick {
        self.ticks
    }

    /// Wall-clock length of the slice at the given tick interval
    pub fn as_duration(&self, tick: Duration) -> Duration {
        tick * self.ticks
    }
}

impl Default for TimeQuantum {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_QUANTUM_TICKS,
        }
    }
}

impl<'de> Deserialize<'de> for TimeQuantum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Inner {
            ticks: Tick,
        }

        let inner = Inner::deserialize(deserializer)?;
        Self::new(inner.ticks).map_err(serde::de::Error::custom)
    }
}

/// Number of whole ticks needed to cover `duration` (rounded up)
pub fn ticks_for(duration: Duration, tick: Duration) -> Tick {
    let tick_nanos = tick.as_nanos().max(1);
    let ticks = duration.as_nanos().div_ceil(tick_nanos);
    Tick::try_from(ticks).unwrap_or(Tick::MAX)
}

/// What drives the timer tick handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickSource {
    /// Periodic timer thread firing every `tick_interval`
    Timer,
    /// Ticks are delivered by calling `Scheduler::tick`
    Manual,
}

/// How a task blocked on resources gets another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceWaitPolicy {
    /// Blocked tasks are made READY on the next tick and retry (classic behavior)
    Polling,
    /// Blocked tasks stay WAITING until every requested resource is free
    WakeOnRelease,
}

impl FromStr for ResourceWaitPolicy {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "poll" | "polling" => Ok(Self::Polling),
            "wake" | "wake_on_release" => Ok(Self::WakeOnRelease),
            _ => Err(SchedulerError::InvalidConfig(format!(
                "resource wait policy '{}'. Valid: polling, wake_on_release",
                s
            ))),
        }
    }
}

/// Result of a `start_or_resume` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every task reached TERMINATED
    Completed,
    /// A pause was requested; the next call resumes from the paused point
    Paused,
}

/// Lifecycle of the simulation as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Running,
    Paused,
    Finished,
}

/// Point-in-time view of the dispatcher
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub policy: SchedulingPolicy,
    pub phase: Phase,
    pub idle: bool,
    pub current: Option<TaskId>,
    pub ticks: u64,
    pub tasks: usize,
}
