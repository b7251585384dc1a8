use std::time::Duration;

use thiserror::Error;

use crate::device::DeviceError;
use crate::graph::screen_model::{ActionId, ScreenNr};
use crate::graph::script_graph::GraphError;

/// Everything that can abort a script run or the loading of a script.
///
/// None of these are retried by the engine: the matcher's own retry budget
/// is the only place timing variance is absorbed.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// No expected screen matched within the retry budgets
    #[error(
        "none of the expected screens {tried:?} matched after {polls} polls in {:.2}s \
         (slow rendering or a wrongly declared expected set)",
        .elapsed.as_secs_f64()
    )]
    ScreenNotFound {
        tried: Vec<ScreenNr>,
        polls: u32,
        elapsed: Duration,
    },

    /// A screen selected more than one action in a single cycle
    #[error("screen {screen_nr} selected {} actions ({}); exactly one or none is allowed", .actions.len(), format_actions(.actions))]
    AmbiguousAction {
        screen_nr: ScreenNr,
        actions: Vec<ActionId>,
    },

    /// An action finished without declaring the screens it leads to
    #[error("{action} on screen {screen_nr} did not return its expected screens")]
    MissingExpectedScreens { screen_nr: ScreenNr, action: ActionId },

    /// An action declared an empty successor set
    #[error("{action} on screen {screen_nr} leads to no screen in the graph")]
    NoSuccessors { screen_nr: ScreenNr, action: ActionId },

    /// The selected action has no registered body on its screen
    #[error("screen {screen_nr} selected {action}, which it does not register")]
    UnknownAction { screen_nr: ScreenNr, action: ActionId },

    /// An expected screen number is not declared in the graph
    #[error("screen {0} is not declared in the script graph")]
    UnknownScreen(ScreenNr),

    #[error("invalid script graph: {0}")]
    InvalidGraph(#[from] GraphError),

    #[error("failed to load script definition '{path}': {message}")]
    Definition { path: String, message: String },

    #[error("failed to export screen data to '{path}': {source}")]
    Export {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Device(#[from] DeviceError),
}

fn format_actions(actions: &[ActionId]) -> String {
    actions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
