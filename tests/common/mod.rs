/*!
 * Shared helpers for the integration suites
 */

#![allow(dead_code)]

use scheduler_sim::{
    Phase, RunOutcome, Scheduler, SchedulerConfig, SchedulerEvent, SchedulerResult,
    SchedulingPolicy, TaskView,
};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration with ticks delivered by the test
pub fn manual(policy: SchedulingPolicy) -> SchedulerConfig {
    SchedulerConfig::new(policy).manual_ticks()
}

/// Drive the dispatcher on a background thread
pub fn spawn_run(scheduler: &Arc<Scheduler>) -> JoinHandle<SchedulerResult<RunOutcome>> {
    let scheduler = Arc::clone(scheduler);
    thread::spawn(move || scheduler.start_or_resume())
}

pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Wait until the dispatcher has nothing left to do before the next tick
pub fn settle(scheduler: &Scheduler) {
    let quiet = wait_until(|| {
        let status = scheduler.status();
        status.idle || matches!(status.phase, Phase::Paused | Phase::Finished)
    });
    assert!(quiet, "scheduler never went quiet: {:?}", scheduler.status());
}

/// Tick once and let the dispatcher react
pub fn step(scheduler: &Scheduler) {
    scheduler.tick();
    settle(scheduler);
}

pub fn view(scheduler: &Scheduler, name: &str) -> TaskView {
    scheduler
        .list()
        .into_iter()
        .find(|v| v.name == name)
        .unwrap_or_else(|| panic!("no task named {}", name))
}

pub fn position(events: &[SchedulerEvent], wanted: &SchedulerEvent) -> usize {
    events
        .iter()
        .position(|e| e == wanted)
        .unwrap_or_else(|| panic!("missing event {:?} in {:#?}", wanted, events))
}

pub fn running(task: &str) -> SchedulerEvent {
    SchedulerEvent::Running { task: task.into() }
}

/// Names of tasks in the order they were announced as running
pub fn run_order(events: &[SchedulerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            SchedulerEvent::Running { task } => Some(task.clone()),
            _ => None,
        })
        .collect()
}
