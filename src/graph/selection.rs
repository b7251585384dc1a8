use serde::{Deserialize, Serialize};

use crate::engine::history::History;
use crate::graph::screen_model::{ActionId, ElementSignature, MatchedElement, ScreenNr};

// ============================================================================
// SelectAction trait: per-screen decision of what to do next
// ============================================================================

/// Decides which action a screen takes, given what was observed on the
/// device and what happened earlier in the run.
///
/// An empty result marks the screen as terminal. More than one entry is
/// rejected by the dispatcher, so implementations should return at most
/// one action.
pub trait SelectAction {
    fn select_action(
        &self,
        required: &[MatchedElement],
        optional: &[MatchedElement],
        history: &History,
    ) -> Vec<ActionId>;
}

/// Never selects an action. The run ends on this screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminal;

impl SelectAction for Terminal {
    fn select_action(&self, _: &[MatchedElement], _: &[MatchedElement], _: &History) -> Vec<ActionId> {
        Vec::new()
    }
}

/// Always selects the same action.
#[derive(Debug, Clone)]
pub struct Always(pub ActionId);

impl SelectAction for Always {
    fn select_action(&self, _: &[MatchedElement], _: &[MatchedElement], _: &History) -> Vec<ActionId> {
        vec![self.0.clone()]
    }
}

// ============================================================================
// Rule-based selection (declarative scripts)
// ============================================================================

/// Condition under which a declared action applies. All listed parts must
/// hold; an empty condition always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Optional objects that must have been present at match time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub present: Vec<ElementSignature>,

    /// Optional objects that must have been absent at match time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub absent: Vec<ElementSignature>,

    /// Screens that must appear in the run's past screens
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visited: Vec<ScreenNr>,

    /// Screens that must not appear in the run's past screens
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_visited: Vec<ScreenNr>,
}

impl Condition {
    pub fn holds(&self, optional: &[MatchedElement], history: &History) -> bool {
        let observed = |signature: &ElementSignature| {
            optional.iter().any(|found| &found.signature == signature)
        };

        self.present.iter().all(|s| observed(s))
            && !self.absent.iter().any(|s| observed(s))
            && self.visited.iter().all(|nr| history.has_visited(*nr))
            && !self.not_visited.iter().any(|nr| history.has_visited(*nr))
    }
}

/// Selects every action whose condition holds, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSelector {
    rules: Vec<(ActionId, Condition)>,
}

impl RuleSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, action: ActionId, condition: Condition) -> Self {
        self.rules.push((action, condition));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl SelectAction for RuleSelector {
    fn select_action(
        &self,
        _required: &[MatchedElement],
        optional: &[MatchedElement],
        history: &History,
    ) -> Vec<ActionId> {
        self.rules
            .iter()
            .filter(|(_, condition)| condition.holds(optional, history))
            .map(|(action, _)| action.clone())
            .collect()
    }
}
