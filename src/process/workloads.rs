/*!
 * Sample Workloads
 * Short scripts exercising exit, sleep and resources, plus CPU-bound jobs
 * that pass through preemption checkpoints
 */

use super::workload::WorkloadRegistry;
use crate::core::types::ResourceId;
use crate::scheduler::TaskContext;
use rand::Rng;
use std::time::Duration;
use tracing::info;

const SORT_LEN: usize = 12_000;
const MATRIX_DIM: usize = 512;
const SEARCH_LEN: usize = 10_000_000;
const SEARCH_TARGET: u32 = 65_409;
const CHECKPOINT_STRIDE: usize = 4_096;

pub(crate) fn register_builtin(registry: &mut WorkloadRegistry) {
    registry
        .register("test_exit", test_exit)
        .register("test_sleep", test_sleep)
        .register("test_resource1", test_resource1)
        .register("test_resource2", test_resource2)
        .register("idle", idle)
        .register("task1", task1)
        .register("task2", task2)
        .register("task3", task3)
        .register("task4", task4)
        .register("task5", task5)
        .register("task6", task6)
        .register("task7", task7)
        .register("task8", task8)
        .register("task9", task9);
}

/// Terminate immediately
pub fn test_exit(ctx: &TaskContext) {
    ctx.exit();
}

/// Sleep 200ms, then terminate
pub fn test_sleep(ctx: &TaskContext) {
    ctx.sleep(Duration::from_millis(200));
    ctx.exit();
}

pub fn test_resource1(ctx: &TaskContext) {
    hold(ctx, &[1, 3, 7], 50);
    ctx.exit();
}

pub fn test_resource2(ctx: &TaskContext) {
    ctx.acquire(&[0, 3]);
    ctx.release(&[0, 3]);
    ctx.exit();
}

/// Spin forever, yielding at every iteration
pub fn idle(ctx: &TaskContext) {
    loop {
        ctx.checkpoint();
        std::hint::spin_loop();
    }
}

/// Selection sort over random integers
pub fn task1(ctx: &TaskContext) {
    let mut rng = rand::thread_rng();
    let mut values: Vec<u32> = (0..SORT_LEN).map(|_| rng.gen()).collect();

    for i in 0..values.len() {
        ctx.checkpoint();
        let mut min = i;
        for j in (i + 1)..values.len() {
            if values[j] < values[min] {
                min = j;
            }
        }
        values.swap(i, min);
    }

    info!(task = ctx.name(), len = values.len(), "Sort finished");
    ctx.exit();
}

/// Dense matrix multiply
pub fn task2(ctx: &TaskContext) {
    let mut rng = rand::thread_rng();
    let n = MATRIX_DIM;
    let a: Vec<u32> = (0..n * n).map(|_| rng.gen_range(0..16)).collect();
    let b: Vec<u32> = (0..n * n).map(|_| rng.gen_range(0..16)).collect();
    let mut c = vec![0u32; n * n];

    for i in 0..n {
        ctx.checkpoint();
        for k in 0..n {
            let lhs = a[i * n + k];
            for j in 0..n {
                c[i * n + j] = c[i * n + j].wrapping_add(lhs.wrapping_mul(b[k * n + j]));
            }
        }
    }

    info!(task = ctx.name(), dim = n, "Matrix multiply finished");
    ctx.exit();
}

/// Linear search for a fixed value
pub fn task3(ctx: &TaskContext) {
    let mut rng = rand::thread_rng();
    let values: Vec<u32> = (0..SEARCH_LEN).map(|_| rng.gen_range(0..1_000_000)).collect();

    let mut found = None;
    for (chunk_index, chunk) in values.chunks(CHECKPOINT_STRIDE).enumerate() {
        ctx.checkpoint();
        if let Some(offset) = chunk.iter().position(|&v| v == SEARCH_TARGET) {
            found = Some(chunk_index * CHECKPOINT_STRIDE + offset);
            break;
        }
    }

    info!(task = ctx.name(), target = SEARCH_TARGET, index = ?found, "Search finished");
    ctx.exit();
}

pub fn task4(ctx: &TaskContext) {
    hold(ctx, &[0, 1, 2], 700);
    ctx.exit();
}

pub fn task5(ctx: &TaskContext) {
    ctx.acquire(&[1, 4]);
    ctx.sleep(Duration::from_millis(200));
    ctx.acquire(&[5]);
    ctx.sleep(Duration::from_millis(400));
    ctx.release(&[1, 4, 5]);
    ctx.exit();
}

pub fn task6(ctx: &TaskContext) {
    hold(ctx, &[2, 4], 600);
    ctx.exit();
}

pub fn task7(ctx: &TaskContext) {
    hold(ctx, &[1, 3, 6], 800);
    ctx.exit();
}

pub fn task8(ctx: &TaskContext) {
    hold(ctx, &[0, 4, 7], 400);
    ctx.exit();
}

pub fn task9(ctx: &TaskContext) {
    ctx.acquire(&[5]);
    ctx.sleep(Duration::from_millis(800));
    ctx.acquire(&[4, 6]);
    ctx.sleep(Duration::from_millis(400));
    ctx.release(&[4, 5, 6]);
    ctx.exit();
}

/// Acquire `ids`, keep them for `millis`, release them
fn hold(ctx: &TaskContext, ids: &[ResourceId], millis: u64) {
    ctx.acquire(ids);
    ctx.sleep(Duration::from_millis(millis));
    ctx.release(ids);
}
