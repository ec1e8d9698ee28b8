/*!
 * Tick Handler
 * Per-tick accounting, sleep countdown, wake-ups and round-robin preemption
 */

use super::state::{Core, Shared};
use super::types::{Phase, ResourceWaitPolicy};
use crate::core::types::TaskId;
use crate::process::TaskState;
use tracing::trace;

/// What a tick changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TickOutcome {
    /// WAITING tasks moved to READY
    pub promoted: usize,
    /// Quantum expiry switched the CPU from the first task to the second
    pub preempted: Option<(TaskId, TaskId)>,
    /// The idle dispatcher has to look at the queue again
    pub wake_dispatcher: bool,
}

impl Core {
    /// Apply one timer tick.
    ///
    /// Ignored unless the simulation is running and not pausing. A
    /// preempted task keeps executing until its next suspension point,
    /// where it finds itself READY and hands the CPU back.
    pub(crate) fn on_tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.phase != Phase::Running || self.pause_requested {
            return outcome;
        }
        self.ticks += 1;

        let round_robin = self.config.policy.is_round_robin();
        let wake_on_release = self.config.resource_wait == ResourceWaitPolicy::WakeOnRelease;
        let pool = &self.pool;
        let mut running = false;

        for task in self.queue.iter_mut() {
            match task.state {
                TaskState::Waiting => {
                    let wake = match task.blocked_on {
                        Some(request) if wake_on_release => pool.is_free(request),
                        _ => {
                            task.sleep_remaining = task.sleep_remaining.saturating_sub(1);
                            task.sleep_remaining == 0
                        }
                    };
                    if wake {
                        task.state = TaskState::Ready;
                        task.blocked_on = None;
                        outcome.promoted += 1;
                    }
                }
                TaskState::Running => {
                    task.running += 1;
                    running = true;
                }
                TaskState::Ready => task.waiting += 1,
                TaskState::Terminated => {}
            }

            if round_robin && task.state == TaskState::Running && task.quantum_remaining > 0 {
                task.quantum_remaining -= 1;
                if task.quantum_remaining == 0 {
                    task.state = TaskState::Ready;
                }
            }

            if !task.is_terminated() {
                task.turnaround += 1;
            }
        }

        if round_robin {
            outcome.preempted = self.rotate_expired();
        }

        if self.idle && !running && outcome.promoted > 0 {
            self.idle = false;
            outcome.wake_dispatcher = true;
        }

        trace!(tick = self.ticks, ?outcome, "Tick");
        outcome
    }

    /// Hand the CPU to the next READY task once the current one used up
    /// its quantum
    fn rotate_expired(&mut self) -> Option<(TaskId, TaskId)> {
        let current = self.current?;
        let task = self.queue.get(current)?;
        if task.state != TaskState::Ready || task.quantum_remaining > 0 {
            return None;
        }

        let next = self.queue.next_ready_after(current)?;
        self.select(next, next != current);
        (next != current).then_some((current, next))
    }
}

impl Shared {
    /// Deliver one tick and wake whoever it concerns
    pub(crate) fn tick(&self) {
        let outcome = self.core.lock().on_tick();
        if outcome.wake_dispatcher {
            self.wake_all();
        }
    }
}
