/*!
 * Periodic Timer
 * Background thread delivering ticks at a fixed interval on its own
 * single-threaded tokio runtime
 */

use super::state::Shared;
use crate::core::errors::{SchedulerError, SchedulerResult};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Control messages for the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerCommand {
    /// Stop delivering ticks
    Pause,
    /// Deliver ticks again, a full interval from now
    Resume,
    /// Exit the timer thread
    Shutdown,
}

/// Handle to the timer thread
pub(crate) struct TimerTask {
    command_tx: mpsc::UnboundedSender<TimerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl TimerTask {
    /// Start the timer thread, already delivering ticks
    pub(crate) fn spawn(shared: Arc<Shared>, interval: Duration) -> SchedulerResult<Self> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| SchedulerError::Timer(e.to_string()))?;

        let handle = thread::Builder::new()
            .name("sched-timer".into())
            .spawn(move || runtime.block_on(run_timer_loop(shared, interval, command_rx)))?;

        info!(interval_ms = interval.as_millis() as u64, "Timer spawned");

        Ok(Self {
            command_tx,
            handle: Some(handle),
        })
    }

    pub(crate) fn pause(&self) {
        let _ = self.command_tx.send(TimerCommand::Pause);
    }

    pub(crate) fn resume(&self) {
        let _ = self.command_tx.send(TimerCommand::Resume);
    }

    /// Stop the thread and wait for it to exit
    pub(crate) fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.command_tx.send(TimerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Timer thread panicked");
            } else {
                debug!("Timer shutdown complete");
            }
        }
    }
}

async fn run_timer_loop(
    shared: Arc<Shared>,
    period: Duration,
    mut command_rx: mpsc::UnboundedReceiver<TimerCommand>,
) {
    let mut active = true;
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if active {
                    shared.tick();
                }
            }

            cmd = command_rx.recv() => {
                match cmd {
                    Some(TimerCommand::Pause) => {
                        debug!("Timer paused");
                        active = false;
                    }
                    Some(TimerCommand::Resume) => {
                        debug!("Timer resumed");
                        interval.reset();
                        active = true;
                    }
                    Some(TimerCommand::Shutdown) | None => break,
                }
            }
        }
    }
}

impl Drop for TimerTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}
