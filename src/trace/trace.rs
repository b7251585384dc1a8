use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::graph::{screen_model::ActionId, script_graph::ExpectedScreenSet};

/// One line of the JSONL run trace, written once per runner cycle.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub cycle: u64,

    pub state: String,

    pub screen_nr: Option<u32>,
    pub polls: Option<u32>,
    pub optional_present: usize,

    pub action: Option<String>,
    pub expected_screens: Option<Vec<u32>>,

    pub error: Option<String>,
}

impl TraceEvent {
    pub fn now(cycle: u64, state: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            cycle,
            state: state.to_string(),
            screen_nr: None,
            polls: None,
            optional_present: 0,
            action: None,
            expected_screens: None,
            error: None,
        }
    }

    pub fn with_screen(mut self, screen_nr: u32, polls: u32, optional_present: usize) -> Self {
        self.screen_nr = Some(screen_nr);
        self.polls = Some(polls);
        self.optional_present = optional_present;
        self
    }

    pub fn with_action(mut self, action: &ActionId) -> Self {
        self.action = Some(action.to_string());
        self
    }

    pub fn with_expected(mut self, expected: &ExpectedScreenSet) -> Self {
        self.expected_screens = Some(expected.as_slice().to_vec());
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}
