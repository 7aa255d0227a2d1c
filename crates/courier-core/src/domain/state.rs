//! State - worker の状態

use serde::{Deserialize, Serialize};

/// Worker lifecycle.
///
/// State transitions:
/// - Idle -> Loaded (launch)
/// - Loaded -> Running (scheduler calls resume)
/// - Running -> Idle (worker pushes itself back into the hub)
///
/// There is no terminal state; workers live as long as their hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Loaded,
    Running,
}

impl WorkerState {
    /// Only idle workers may sit in the hub's idle set.
    pub fn is_idle(self) -> bool {
        matches!(self, WorkerState::Idle)
    }
}
