// src/engine/report.rs

use std::fmt;

use crate::tasks::TaskName;

/// What happened to the tasks of one or more runs.
///
/// Group tasks only aggregate other tasks and are not listed under
/// `executed` or `up_to_date`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub executed: Vec<TaskName>,
    pub up_to_date: Vec<TaskName>,
    pub failed: Vec<TaskName>,
    /// Never ran because something upstream failed.
    pub blocked: Vec<TaskName>,
    /// Never finished because shutdown was requested.
    pub interrupted: Vec<TaskName>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.blocked.is_empty() && self.interrupted.is_empty()
    }

    pub fn was_interrupted(&self) -> bool {
        !self.interrupted.is_empty()
    }

    /// Append another report, e.g. of a later phase.
    pub fn merge(&mut self, other: RunReport) {
        self.executed.extend(other.executed);
        self.up_to_date.extend(other.up_to_date);
        self.failed.extend(other.failed);
        self.blocked.extend(other.blocked);
        self.interrupted.extend(other.interrupted);
    }

    /// Sort every list so reports compare independent of completion order.
    pub fn sorted(mut self) -> Self {
        self.executed.sort();
        self.up_to_date.sort();
        self.failed.sort();
        self.blocked.sort();
        self.interrupted.sort();
        self
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} executed, {} up to date, {} failed, {} blocked",
            self.executed.len(),
            self.up_to_date.len(),
            self.failed.len(),
            self.blocked.len()
        )?;
        if !self.interrupted.is_empty() {
            write!(f, ", {} interrupted", self.interrupted.len())?;
        }
        Ok(())
    }
}
