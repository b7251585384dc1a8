use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::device::Device;
use crate::engine::dispatcher::{Action, ActionContext, ActionOutput};
use crate::engine::error::ScriptError;
use crate::graph::screen_model::{ActionId, Screen, ScreenNr};
use crate::graph::script_graph::ScriptGraph;
use crate::graph::selection::RuleSelector;
use crate::script::definition::{
    ActionDefinition, DeviceStep, ScreenDefinition, ScriptDefinition, parse_definition,
};
use crate::script::script_model::Script;

// ============================================================================
// Step-list actions
// ============================================================================

/// Action body made of declarative device steps. After the steps run it
/// expects whatever the graph declares for its own edge.
#[derive(Debug, Clone, PartialEq)]
pub struct StepAction {
    pub steps: Vec<DeviceStep>,
}

impl StepAction {
    pub fn new(steps: Vec<DeviceStep>) -> Self {
        Self { steps }
    }
}

impl Action for StepAction {
    fn perform(&self, device: &mut dyn Device, ctx: &mut ActionContext<'_>) -> Result<ActionOutput, ScriptError> {
        for step in &self.steps {
            debug!(screen_nr = ctx.screen_nr, ?step, "device step");
            match step {
                DeviceStep::Click { target } => device.click(target)?,
                DeviceStep::SendText { target, text } => device.send_text(target, text)?,
                DeviceStep::Wait { duration_ms } => {
                    std::thread::sleep(Duration::from_millis(*duration_ms));
                }
            }
        }

        Ok(ActionOutput::expecting(ctx.declared_successors()))
    }
}

// ============================================================================
// Definition → Script
// ============================================================================

/// Build and validate a script from its definition.
pub fn build_script(definition: &ScriptDefinition) -> Result<Script, ScriptError> {
    let mut graph = ScriptGraph::new();
    let declared: BTreeSet<ScreenNr> = definition.screens.iter().map(|s| s.screen_nr).collect();

    for screen_def in &definition.screens {
        check_conditions(screen_def, &declared)?;
        for action in &screen_def.actions {
            for &successor in &action.successors {
                graph.add_edge(screen_def.screen_nr, action.index, successor);
            }
        }
        graph.add_screen(build_screen(screen_def)?)?;
    }

    Ok(Script::new(&definition.app_name, &definition.version, graph)?)
}

fn build_screen(def: &ScreenDefinition) -> Result<Screen, ScriptError> {
    let wait_time = Duration::try_from_secs_f64(def.wait_time_sec).map_err(|e| {
        ScriptError::Definition {
            path: format!("screen {}", def.screen_nr),
            message: format!("invalid wait_time_sec {}: {}", def.wait_time_sec, e),
        }
    })?;

    let mut screen = Screen::new(def.screen_nr).with_retries(def.max_retries, wait_time);
    for signature in &def.required_objects {
        screen = screen.with_required(signature.clone());
    }
    for signature in &def.optional_objects {
        screen = screen.with_optional(signature.clone());
    }

    let mut selector = RuleSelector::new();
    for action in &def.actions {
        let id = ActionId::new(action.index, &action.name);
        selector = selector.rule(id.clone(), action.when.clone());
        screen = screen.with_action(id, StepAction::new(action.steps.clone()));
    }

    if !selector.is_empty() {
        screen = screen.with_selector(selector);
    }
    Ok(screen)
}

/// Reject `when` clauses that could never observe what they name: matching
/// only reports a screen's declared optional objects, and `visited` checks
/// are only meaningful for screens of this script.
fn check_conditions(def: &ScreenDefinition, declared: &BTreeSet<ScreenNr>) -> Result<(), ScriptError> {
    let invalid = |action: &ActionDefinition, message: String| ScriptError::Definition {
        path: format!("screen {}", def.screen_nr),
        message: format!("`when` of {}: {}", ActionId::new(action.index, &action.name), message),
    };

    for action in &def.actions {
        let when = &action.when;
        for signature in when.present.iter().chain(&when.absent) {
            if !def.optional_objects.contains(signature) {
                return Err(invalid(
                    action,
                    format!("{} is not one of the screen's optional_objects", signature),
                ));
            }
        }
        for &screen_nr in when.visited.iter().chain(&when.not_visited) {
            if !declared.contains(&screen_nr) {
                return Err(invalid(action, format!("screen {} is not declared", screen_nr)));
            }
        }
    }
    Ok(())
}

/// Read, parse and build a script from a YAML file.
pub fn load_script(path: &Path) -> Result<Script, ScriptError> {
    let content = std::fs::read_to_string(path).map_err(|e| ScriptError::Definition {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let definition = parse_definition(&content).map_err(|e| ScriptError::Definition {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    build_script(&definition)
}
