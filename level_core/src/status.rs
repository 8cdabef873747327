//! Outcome of one poll of the monitor.

use crate::pipeline::LevelEstimate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    /// Scan still running; nothing was processed.
    Busy,
    /// A full cycle ran and produced this estimate.
    Completed(LevelEstimate),
}

impl CycleStatus {
    pub fn estimate(&self) -> Option<LevelEstimate> {
        match self {
            CycleStatus::Busy => None,
            CycleStatus::Completed(est) => Some(*est),
        }
    }
}
