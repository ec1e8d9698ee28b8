/*!
 * Scheduler Events
 * Everything the engine announces, kept in a bounded log
 */

use crate::core::types::ResourceId;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Observable scheduler event.
///
/// `Display` renders the line the simulator prints for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SchedulerEvent {
    Ready { task: String },
    Running { task: String },
    Sleeping { task: String },
    Terminated { task: String },
    Killed { task: String },
    Granted { task: String, resource: ResourceId },
    WaitingResource { task: String },
    Released { task: String, resource: ResourceId },
    Idle,
    SimulationOver,
}

impl SchedulerEvent {
    /// Task the event is about, if any
    pub fn task(&self) -> Option<&str> {
        match self {
            Self::Ready { task }
            | Self::Running { task }
            | Self::Sleeping { task }
            | Self::Terminated { task }
            | Self::Killed { task }
            | Self::Granted { task, .. }
            | Self::WaitingResource { task }
            | Self::Released { task, .. } => Some(task),
            Self::Idle | Self::SimulationOver => None,
        }
    }
}

impl fmt::Display for SchedulerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready { task } => write!(f, "Task {} is ready.", task),
            Self::Running { task } => write!(f, "Task {} is running.", task),
            Self::Sleeping { task } => write!(f, "Task {} goes to sleep.", task),
            Self::Terminated { task } => write!(f, "Task {} has terminated.", task),
            Self::Killed { task } => write!(f, "Task {} is killed.", task),
            Self::Granted { task, resource } => write!(f, "Task {} gets resource {}", task, resource),
            Self::WaitingResource { task } => write!(f, "Task {} is waiting resource.", task),
            Self::Released { task, resource } => {
                write!(f, "Task {} releases resource {}", task, resource)
            }
            Self::Idle => f.write_str("CPU idle."),
            Self::SimulationOver => f.write_str("Simulation over."),
        }
    }
}

/// Ring of the most recent events; the oldest is dropped when full
#[derive(Debug)]
pub(crate) struct EventLog {
    capacity: usize,
    entries: VecDeque<SchedulerEvent>,
}

impl EventLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.clamp(1, 4_096)),
        }
    }

    pub(crate) fn push(&mut self, event: SchedulerEvent) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    pub(crate) fn to_vec(&self) -> Vec<SchedulerEvent> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lines() {
        let granted = SchedulerEvent::Granted {
            task: "T1".into(),
            resource: 3,
        };
        assert_eq!(granted.to_string(), "Task T1 gets resource 3");
        assert_eq!(
            SchedulerEvent::WaitingResource { task: "T2".into() }.to_string(),
            "Task T2 is waiting resource."
        );
        assert_eq!(SchedulerEvent::Idle.to_string(), "CPU idle.");
        assert_eq!(granted.task(), Some("T1"));
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&SchedulerEvent::Released {
            task: "T1".into(),
            resource: 7,
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"released","task":"T1","resource":7}"#);
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = EventLog::new(2);
        log.push(SchedulerEvent::Idle);
        log.push(SchedulerEvent::Ready { task: "A".into() });
        log.push(SchedulerEvent::SimulationOver);
        assert_eq!(
            log.to_vec(),
            vec![
                SchedulerEvent::Ready { task: "A".into() },
                SchedulerEvent::SimulationOver
            ]
        );
    }
}
