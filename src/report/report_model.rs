use serde::{Deserialize, Serialize};

// ============================================================================
// Run report: outcome of one script run
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Reached a screen that selects no action
    Done,

    /// Aborted by an error; device state is left as it was
    Failed,
}

/// Summary of a run, produced in both the done and the failed case.
///
/// `past_screens` is the forensic trace of the run: every screen the
/// runner acted on, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub app_name: String,
    pub version: String,
    pub status: RunStatus,

    /// Screens acted on, in order
    pub past_screens: Vec<u32>,

    /// Number of actions dispatched
    pub actions_performed: usize,

    /// Error message if the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Total run duration in milliseconds (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

impl RunReport {
    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Done
    }
}
