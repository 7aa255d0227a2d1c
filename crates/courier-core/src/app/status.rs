use serde::{Deserialize, Serialize};

/// Snapshot of a hub's counters, as returned by `WorkerHub::status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubStatus {
    pub capacity: usize,
    pub allocated: usize,
    pub idle: usize,
    pub launched: u64,
    /// Runs that finished, successful or not.
    pub completed: u64,
    pub failed: u64,
}

impl HubStatus {
    pub fn busy(&self) -> usize {
        self.allocated - self.idle
    }

    /// Launched but not yet finished.
    pub fn in_flight(&self) -> u64 {
        self.launched.saturating_sub(self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_counts() {
        let status = HubStatus {
            capacity: 4,
            allocated: 3,
            idle: 1,
            launched: 10,
            completed: 8,
            failed: 2,
        };
        assert_eq!(status.busy(), 2);
        assert_eq!(status.in_flight(), 2);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["failed"], 2);
    }
}
