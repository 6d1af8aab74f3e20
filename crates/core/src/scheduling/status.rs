//! Point-in-time job snapshots for health inspection

use serde::Serialize;

/// Snapshot of one job's lifecycle flags and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    /// Job id
    pub id: String,
    /// Between a successful start and the next stop or cancel
    pub started: bool,
    /// Execution task alive
    pub running: bool,
    /// Work currently being invoked
    pub executing: bool,
    /// Invocations begun since creation
    pub invocations: u64,
    /// Invocations whose work returned an error
    pub failures: u64,
    /// Invocations cut short by the per-call timeout
    pub timeouts: u64,
}

impl JobStatus {
    /// True when the job is neither started nor running.
    pub fn is_idle(&self) -> bool {
        !self.started && !self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_flat() {
        let status = JobStatus {
            id: "id0".into(),
            started: true,
            running: true,
            executing: false,
            invocations: 4,
            failures: 1,
            timeouts: 0,
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["id"], "id0");
        assert_eq!(value["invocations"], 4);
        assert!(!status.is_idle());
    }
}
