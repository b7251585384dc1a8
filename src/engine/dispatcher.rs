use tracing::info;

use crate::device::Device;
use crate::engine::error::ScriptError;
use crate::engine::history::History;
use crate::engine::matcher::ScreenMatch;
use crate::graph::screen_model::{ActionId, ScreenNr};
use crate::graph::script_graph::{ExpectedScreenSet, ScriptGraph, get_expected_screen_nrs};

// ============================================================================
// Action trait: body of one screen action
// ============================================================================

/// Everything an action body may look at or update.
pub struct ActionContext<'a> {
    pub screen_nr: ScreenNr,
    pub action: &'a ActionId,
    pub graph: &'a ScriptGraph,
    pub observed: &'a ScreenMatch,
    pub history: &'a mut History,
}

impl ActionContext<'_> {
    /// Successors declared in the graph for the action being performed.
    pub fn declared_successors(&self) -> ExpectedScreenSet {
        get_expected_screen_nrs(self.graph, self.screen_nr, self.action.index)
    }
}

/// What an action reports back once its device interaction is done.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutput {
    /// Screens the device may show next. Required.
    pub expected_screens: Option<ExpectedScreenSet>,
}

impl ActionOutput {
    pub fn expecting(expected_screens: ExpectedScreenSet) -> Self {
        Self {
            expected_screens: Some(expected_screens),
        }
    }
}

/// Device interaction performed when a screen selects this action.
///
/// Implementations interact with the device and then report the screens
/// that may follow, normally via `ActionContext::declared_successors`.
pub trait Action {
    fn perform(&self, device: &mut dyn Device, ctx: &mut ActionContext<'_>) -> Result<ActionOutput, ScriptError>;
}

// ============================================================================
// Dispatch
// ============================================================================

/// Enforce "exactly one action or none" on a screen's selection.
pub fn single_action(
    screen_nr: ScreenNr,
    mut selected: Vec<ActionId>,
) -> Result<Option<ActionId>, ScriptError> {
    match selected.len() {
        0 => Ok(None),
        1 => Ok(selected.pop()),
        _ => Err(ScriptError::AmbiguousAction {
            screen_nr,
            actions: selected,
        }),
    }
}

/// Run the selected action of the matched screen and return the screens
/// the device is expected to show next.
pub fn perform_action(
    device: &mut dyn Device,
    graph: &ScriptGraph,
    observed: &ScreenMatch,
    action: &ActionId,
    history: &mut History,
) -> Result<ExpectedScreenSet, ScriptError> {
    let screen_nr = observed.screen_nr;
    let screen = graph
        .screen(screen_nr)
        .ok_or(ScriptError::UnknownScreen(screen_nr))?;
    let body = screen
        .action(action)
        .ok_or_else(|| ScriptError::UnknownAction {
            screen_nr,
            action: action.clone(),
        })?;

    info!(screen_nr, action = %action, "performing action");

    let mut ctx = ActionContext {
        screen_nr,
        action,
        graph,
        observed,
        history,
    };
    let output = body.perform(device, &mut ctx)?;

    let expected = output
        .expected_screens
        .ok_or_else(|| ScriptError::MissingExpectedScreens {
            screen_nr,
            action: action.clone(),
        })?;

    if expected.is_empty() {
        return Err(ScriptError::NoSuccessors {
            screen_nr,
            action: action.clone(),
        });
    }

    Ok(expected)
}
