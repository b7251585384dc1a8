use serde::{Deserialize, Serialize};

use crate::graph::screen_model::{
    DEFAULT_MAX_RETRIES, DEFAULT_WAIT_TIME_SEC, ElementSignature, ScreenNr,
};
use crate::graph::selection::Condition;

/// A script as written in YAML. Built into a `Script` by
/// `script::builder::build_script`.
///
/// ```yaml
/// app_name: org.torproject.android
/// version: 16.6.3 RC 1
/// screens:
///   - screen_nr: 1
///     max_retries: 1
///     wait_time_sec: 0.1
///     required_objects:
///       - "@text": Hello
///     actions:
///       - index: 0
///         name: next
///         steps:
///           - step: click
///             target: { resourceId: "org.torproject.android:id/next" }
///         successors: [2]
///   - screen_nr: 2
///     required_objects:
///       - text: Connect
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptDefinition {
    pub app_name: String,
    pub version: String,
    pub screens: Vec<ScreenDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenDefinition {
    pub screen_nr: ScreenNr,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_wait_time_sec")]
    pub wait_time_sec: f64,

    /// All must be present for the screen to match
    pub required_objects: Vec<ElementSignature>,

    /// Only consulted by action `when` clauses
    #[serde(default)]
    pub optional_objects: Vec<ElementSignature>,

    /// No actions makes the screen terminal
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionDefinition {
    /// Tags the graph edges this action produces
    pub index: u32,

    pub name: String,

    /// When this action applies; absent means always
    #[serde(default)]
    pub when: Condition,

    /// Device interaction, performed in order
    #[serde(default)]
    pub steps: Vec<DeviceStep>,

    /// Screens that may follow this action
    pub successors: Vec<ScreenNr>,
}

/// A single device interaction inside an action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum DeviceStep {
    /// Click the element matching `target`
    Click { target: ElementSignature },

    /// Type `text` into the element matching `target`
    SendText {
        target: ElementSignature,
        text: String,
    },

    /// Pause before the next step
    Wait { duration_ms: u64 },
}

fn default_max_retries() -> u32 { DEFAULT_MAX_RETRIES }
fn default_wait_time_sec() -> f64 { DEFAULT_WAIT_TIME_SEC }

/// Parse a script definition from YAML text.
pub fn parse_definition(yaml: &str) -> Result<ScriptDefinition, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}
