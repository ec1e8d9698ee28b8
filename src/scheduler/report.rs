/*!
 * Task Report
 * The `ps` table
 */

use crate::process::TaskView;
use serde::Serialize;
use std::fmt;

const SEPARATOR_WIDTH: usize = 80;

/// Snapshot of every task, in queue order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskReport {
    rows: Vec<TaskView>,
}

impl TaskReport {
    pub fn new(rows: Vec<TaskView>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[TaskView] {
        &self.rows
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.rows)
    }
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>4}|{:>11}|{:>11}|{:>8}|{:>8}|{:>11}|{:>10}|{:>9}",
            "TID", "name", "state", "running", "waiting", "turnaround", "resources", "priority"
        )?;
        writeln!(f, "{}", "-".repeat(SEPARATOR_WIDTH))?;

        for row in &self.rows {
            let turnaround = match row.turnaround {
                0 => "none".to_string(),
                n => n.to_string(),
            };
            writeln!(
                f,
                "{:>4}|{:>11}|{:>11}|{:>8}|{:>8}|{:>11}|{:>10}|{:>9}",
                row.id,
                row.name,
                row.state.as_str(),
                row.running,
                row.waiting,
                turnaround,
                row.resources.to_string(),
                row.priority
            )?;
        }
        Ok(())
    }
}
