/*!
 * Resource Tests
 * All-or-nothing acquisition, blocking and release through running tasks
 */

mod common;

use common::{manual, position, spawn_run, step, view, wait_until};
use pretty_assertions::assert_eq;
use scheduler_sim::{
    ResourceWaitPolicy, RunOutcome, Scheduler, SchedulerEvent, SchedulingPolicy, TaskContext,
    TaskState, WorkloadRegistry,
};
use std::sync::Arc;
use std::time::Duration;

fn granted(task: &str, resource: u8) -> SchedulerEvent {
    SchedulerEvent::Granted {
        task: task.into(),
        resource,
    }
}

fn released(task: &str, resource: u8) -> SchedulerEvent {
    SchedulerEvent::Released {
        task: task.into(),
        resource,
    }
}

fn waiting(task: &str) -> SchedulerEvent {
    SchedulerEvent::WaitingResource { task: task.into() }
}

/// Every task's held set matches what the pool records for it
fn assert_holdings_consistent(scheduler: &Scheduler) {
    let pool = scheduler.resources();
    for task in scheduler.list() {
        assert_eq!(
            task.resources,
            pool.held_by(task.id),
            "{} disagrees with the pool",
            task.name
        );
    }
}

/// Step the clock until the run finishes
fn run_out(scheduler: &Scheduler, max_ticks: usize) {
    for _ in 0..max_ticks {
        if scheduler.status().phase == scheduler_sim::Phase::Finished {
            return;
        }
        step(scheduler);
    }
}

#[test]
fn test_contention_with_polling() {
    let scheduler = Arc::new(Scheduler::new(manual(SchedulingPolicy::Fcfs)).unwrap());
    scheduler.create_and_enqueue("T1", "test_resource1", 0).unwrap();
    scheduler.create_and_enqueue("T2", "test_resource2", 0).unwrap();

    let runner = spawn_run(&scheduler);
    assert!(wait_until(|| scheduler.status().idle));

    // T1 sleeps on 1 3 7 while T2 is blocked on 3
    assert_eq!(view(&scheduler, "T1").resources.to_vec(), vec![1, 3, 7]);
    assert_eq!(view(&scheduler, "T2").state, TaskState::Waiting);
    assert!(view(&scheduler, "T2").resources.is_empty());

    run_out(&scheduler, 50);
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Completed);

    let events = scheduler.events();
    assert!(position(&events, &released("T1", 3)) < position(&events, &granted("T2", 3)));
    assert!(position(&events, &granted("T1", 7)) < position(&events, &waiting("T2")));

    // Polling retries on every tick of T1's 50ms sleep
    let retries = events.iter().filter(|e| **e == waiting("T2")).count();
    assert_eq!(retries, 5);

    for name in ["T1", "T2"] {
        let task = view(&scheduler, name);
        assert_eq!(task.state, TaskState::Terminated);
        assert!(task.resources.is_empty());
    }
}

#[test]
fn test_contention_with_wake_on_release() {
    let config = manual(SchedulingPolicy::Fcfs).with_resource_wait(ResourceWaitPolicy::WakeOnRelease);
    let scheduler = Arc::new(Scheduler::new(config).unwrap());
    scheduler.create_and_enqueue("T1", "test_resource1", 0).unwrap();
    scheduler.create_and_enqueue("T2", "test_resource2", 0).unwrap();

    let runner = spawn_run(&scheduler);
    assert!(wait_until(|| scheduler.status().idle));

    run_out(&scheduler, 50);
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Completed);

    let events = scheduler.events();
    assert_eq!(events.iter().filter(|e| **e == waiting("T2")).count(), 1);
    assert!(position(&events, &released("T1", 3)) < position(&events, &granted("T2", 0)));
}

#[test]
fn test_blocked_task_accrues_no_waiting_time() {
    let config = manual(SchedulingPolicy::Fcfs).with_resource_wait(ResourceWaitPolicy::WakeOnRelease);
    let scheduler = Arc::new(Scheduler::new(config).unwrap());
    scheduler.create_and_enqueue("T1", "test_resource1", 0).unwrap();
    scheduler.create_and_enqueue("T2", "test_resource2", 0).unwrap();

    let runner = spawn_run(&scheduler);
    assert!(wait_until(|| scheduler.status().idle));
    for _ in 0..3 {
        step(&scheduler);
    }

    let blocked = view(&scheduler, "T2");
    assert_eq!(blocked.state, TaskState::Waiting);
    assert_eq!(blocked.waiting, 0);
    assert_eq!(blocked.turnaround, 3);

    run_out(&scheduler, 50);
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Completed);
}

#[test]
fn test_malformed_requests_are_ignored() {
    let registry = WorkloadRegistry::new().with("sloppy", |ctx: &TaskContext| {
        ctx.acquire(&[]);
        ctx.acquire(&[8]);
        ctx.acquire(&[0, 1, 2, 3, 4, 5, 6, 7]);
        ctx.release(&[9]);
        ctx.acquire(&[6]);
        ctx.exit();
    });
    let scheduler = Scheduler::with_registry(manual(SchedulingPolicy::Fcfs), registry).unwrap();
    scheduler.create_and_enqueue("S", "sloppy", 0).unwrap();

    assert_eq!(scheduler.start_or_resume().unwrap(), RunOutcome::Completed);

    let grants: Vec<SchedulerEvent> = scheduler
        .events()
        .into_iter()
        .filter(|e| matches!(e, SchedulerEvent::Granted { .. }))
        .collect();
    assert_eq!(grants, vec![granted("S", 6)]);

    // Exiting without releasing keeps the resource held
    assert_eq!(view(&scheduler, "S").resources.to_vec(), vec![6]);
}

#[test]
fn test_leaked_resource_blocks_later_tasks() {
    let registry = WorkloadRegistry::builtin()
        .with("hog", |ctx: &TaskContext| {
            ctx.acquire(&[2]);
            ctx.sleep(Duration::from_secs(10));
            ctx.exit();
        })
        .with("taker", |ctx: &TaskContext| {
            ctx.acquire(&[2]);
            ctx.release(&[2]);
            ctx.exit();
        });
    let scheduler =
        Arc::new(Scheduler::with_registry(manual(SchedulingPolicy::Fcfs), registry).unwrap());
    scheduler.create_and_enqueue("hog", "hog", 0).unwrap();

    let runner = spawn_run(&scheduler);
    assert!(wait_until(|| scheduler.status().idle));
    scheduler.request_termination("hog").unwrap();
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Completed);
    assert_eq!(view(&scheduler, "hog").resources.to_vec(), vec![2]);

    scheduler.create_and_enqueue("taker", "taker", 0).unwrap();
    let runner = spawn_run(&scheduler);
    assert!(wait_until(|| scheduler.status().idle));
    for _ in 0..5 {
        step(&scheduler);
    }
    assert_eq!(view(&scheduler, "taker").state, TaskState::Waiting);

    scheduler.request_termination("taker").unwrap();
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Completed);
}

#[test]
fn test_reclaim_on_terminate() {
    let registry = WorkloadRegistry::builtin()
        .with("hog", |ctx: &TaskContext| {
            ctx.acquire(&[2]);
            ctx.sleep(Duration::from_secs(10));
            ctx.exit();
        })
        .with("taker", |ctx: &TaskContext| {
            ctx.acquire(&[2]);
            ctx.release(&[2]);
            ctx.exit();
        });
    let config = manual(SchedulingPolicy::Fcfs).with_reclaim_on_terminate(true);
    let scheduler = Arc::new(Scheduler::with_registry(config, registry).unwrap());
    scheduler.create_and_enqueue("hog", "hog", 0).unwrap();

    let runner = spawn_run(&scheduler);
    assert!(wait_until(|| scheduler.status().idle));
    scheduler.request_termination("hog").unwrap();
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Completed);
    assert!(view(&scheduler, "hog").resources.is_empty());

    scheduler.create_and_enqueue("taker", "taker", 0).unwrap();
    assert_eq!(scheduler.start_or_resume().unwrap(), RunOutcome::Completed);
    assert!(scheduler.events().contains(&granted("taker", 2)));
}

#[test]
fn test_scripted_workloads_finish_under_round_robin() {
    let config = manual(SchedulingPolicy::RoundRobin);
    let scheduler = Arc::new(Scheduler::new(config).unwrap());
    for (name, workload) in [("t4", "task4"), ("t6", "task6"), ("t8", "task8")] {
        scheduler.create_and_enqueue(name, workload, 0).unwrap();
    }

    let runner = spawn_run(&scheduler);
    assert!(wait_until(|| scheduler.status().idle));
    run_out(&scheduler, 500);
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Completed);

    for name in ["t4", "t6", "t8"] {
        let task = view(&scheduler, name);
        assert_eq!(task.state, TaskState::Terminated);
        assert!(task.resources.is_empty(), "{} still holds {}", name, task.resources);
    }
}

#[test]
fn test_holdings_match_pool_throughout_run() {
    let scheduler = Arc::new(Scheduler::new(manual(SchedulingPolicy::Fcfs)).unwrap());
    for (name, workload) in [("t4", "task4"), ("t6", "task6"), ("t7", "task7"), ("t8", "task8")] {
        scheduler.create_and_enqueue(name, workload, 0).unwrap();
    }

    let runner = spawn_run(&scheduler);
    assert!(wait_until(|| scheduler.status().idle));
    assert_holdings_consistent(&scheduler);

    for _ in 0..500 {
        if scheduler.status().phase == scheduler_sim::Phase::Finished {
            break;
        }
        step(&scheduler);
        assert_holdings_consistent(&scheduler);
    }
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Completed);
    assert_eq!(scheduler.resources().free_count(), scheduler_sim::RESOURCE_COUNT);
}

#[test]
fn test_reclaim_skips_resources_regranted_to_others() {
    let registry = WorkloadRegistry::new()
        .with("keeper", |ctx: &TaskContext| {
            ctx.acquire(&[3]);
            ctx.sleep(Duration::from_secs(10));
            ctx.exit();
        })
        .with("stray", |ctx: &TaskContext| {
            ctx.release(&[3]);
            ctx.exit();
        })
        .with("waiter", |ctx: &TaskContext| {
            ctx.acquire(&[3]);
            ctx.release(&[3]);
            ctx.exit();
        });
    let config = manual(SchedulingPolicy::Fcfs).with_reclaim_on_terminate(true);
    let scheduler = Arc::new(Scheduler::with_registry(config, registry).unwrap());
    scheduler.create_and_enqueue("A", "keeper", 0).unwrap();
    scheduler.create_and_enqueue("B", "stray", 0).unwrap();
    let c = scheduler.create_and_enqueue("C", "keeper", 0).unwrap();
    scheduler.create_and_enqueue("D", "waiter", 0).unwrap();

    let runner = spawn_run(&scheduler);
    assert!(wait_until(|| scheduler.status().idle));

    // B freed 3 behind A's back, so C holds it while A still lists it
    assert_eq!(scheduler.resources().holder(3), Some(c));
    assert_eq!(view(&scheduler, "A").resources.to_vec(), vec![3]);
    assert_eq!(view(&scheduler, "D").state, TaskState::Waiting);

    scheduler.request_termination("A").unwrap();
    step(&scheduler);

    assert_eq!(scheduler.resources().holder(3), Some(c));
    assert!(view(&scheduler, "A").resources.is_empty());
    let d = view(&scheduler, "D");
    assert_eq!(d.state, TaskState::Waiting);
    assert!(d.resources.is_empty());

    // Deleting the real holder hands 3 to D
    scheduler.request_termination("C").unwrap();
    run_out(&scheduler, 10);
    assert_eq!(runner.join().unwrap().unwrap(), RunOutcome::Completed);
    assert!(scheduler.events().contains(&granted("D", 3)));
}
