use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::screen_model::{Screen, ScreenNr};

// ============================================================================
// Graph data model
// ============================================================================

/// A directed edge: taking action `action_index` on `from` may lead to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: ScreenNr,
    pub action_index: u32,
    pub to: ScreenNr,
}

/// Ordered set of screens accepted as "current" on the next detection.
///
/// Keeps insertion order and drops repeated entries, so the matcher's
/// positional tie-break follows the order the edges were declared in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ScreenNr>")]
pub struct ExpectedScreenSet(Vec<ScreenNr>);

impl ExpectedScreenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, screen_nr: ScreenNr) -> bool {
        if self.0.contains(&screen_nr) {
            return false;
        }
        self.0.push(screen_nr);
        true
    }

    pub fn contains(&self, screen_nr: ScreenNr) -> bool {
        self.0.contains(&screen_nr)
    }

    pub fn iter(&self) -> impl Iterator<Item = ScreenNr> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[ScreenNr] {
        &self.0
    }
}

impl FromIterator<ScreenNr> for ExpectedScreenSet {
    fn from_iter<I: IntoIterator<Item = ScreenNr>>(iter: I) -> Self {
        let mut set = Self::new();
        for screen_nr in iter {
            set.insert(screen_nr);
        }
        set
    }
}

impl From<Vec<ScreenNr>> for ExpectedScreenSet {
    fn from(screen_nrs: Vec<ScreenNr>) -> Self {
        screen_nrs.into_iter().collect()
    }
}

impl fmt::Display for ExpectedScreenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Topology problems found while building or validating a graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("screen {0} is declared twice")]
    DuplicateScreen(ScreenNr),

    #[error("edge {from} --action_{action_index}--> {to} references undeclared screen {missing}")]
    DanglingEdge {
        from: ScreenNr,
        action_index: u32,
        to: ScreenNr,
        missing: ScreenNr,
    },

    #[error("screen {screen_nr} registers action index {action_index} more than once")]
    DuplicateActionIndex { screen_nr: ScreenNr, action_index: u32 },

    #[error("screen {screen_nr} registers action index {action_index} but no edge leaves it with that index")]
    ActionWithoutEdges { screen_nr: ScreenNr, action_index: u32 },

    #[error("edge {from} --action_{action_index}--> {to} is tagged with an action that screen {from} does not register")]
    EdgeWithoutAction {
        from: ScreenNr,
        action_index: u32,
        to: ScreenNr,
    },

    #[error("graph has no start screen (every screen has an incoming edge)")]
    NoStartScreens,
}

/// Directed graph of screens. Nodes are keyed by screen number, edges are
/// tagged with the index of the action that produces them.
#[derive(Debug, Default)]
pub struct ScriptGraph {
    screens: BTreeMap<ScreenNr, Screen>,
    edges: Vec<Edge>,
}

impl ScriptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a screen. Screen numbers must be unique.
    pub fn add_screen(&mut self, screen: Screen) -> Result<(), GraphError> {
        if self.screens.contains_key(&screen.screen_nr) {
            return Err(GraphError::DuplicateScreen(screen.screen_nr));
        }
        self.screens.insert(screen.screen_nr, screen);
        Ok(())
    }

    /// Declare that `action_index` on `from` may lead to `to`.
    pub fn add_edge(&mut self, from: ScreenNr, action_index: u32, to: ScreenNr) {
        let edge = Edge {
            from,
            action_index,
            to,
        };
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    pub fn screen(&self, screen_nr: ScreenNr) -> Option<&Screen> {
        self.screens.get(&screen_nr)
    }

    pub fn screens(&self) -> impl Iterator<Item = &Screen> {
        self.screens.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    /// Screens without incoming edges, in ascending screen number order.
    pub fn start_nodes(&self) -> ExpectedScreenSet {
        let targets: BTreeSet<ScreenNr> = self.edges.iter().map(|e| e.to).collect();
        self.screens
            .keys()
            .copied()
            .filter(|nr| !targets.contains(nr))
            .collect()
    }

    /// Check that the topology agrees with the screens' registered actions.
    pub fn validate(&self) -> Result<(), GraphError> {
        for edge in &self.edges {
            for endpoint in [edge.from, edge.to] {
                if !self.screens.contains_key(&endpoint) {
                    return Err(GraphError::DanglingEdge {
                        from: edge.from,
                        action_index: edge.action_index,
                        to: edge.to,
                        missing: endpoint,
                    });
                }
            }
        }

        for screen in self.screens.values() {
            let mut seen = BTreeSet::new();
            for id in screen.action_ids() {
                if !seen.insert(id.index) {
                    return Err(GraphError::DuplicateActionIndex {
                        screen_nr: screen.screen_nr,
                        action_index: id.index,
                    });
                }
                if get_expected_screen_nrs(self, screen.screen_nr, id.index).is_empty() {
                    return Err(GraphError::ActionWithoutEdges {
                        screen_nr: screen.screen_nr,
                        action_index: id.index,
                    });
                }
            }
        }

        for edge in &self.edges {
            let registered = self
                .screens
                .get(&edge.from)
                .is_some_and(|s| s.action_ids().any(|id| id.index == edge.action_index));
            if !registered {
                return Err(GraphError::EdgeWithoutAction {
                    from: edge.from,
                    action_index: edge.action_index,
                    to: edge.to,
                });
            }
        }

        if self.start_nodes().is_empty() {
            return Err(GraphError::NoStartScreens);
        }

        Ok(())
    }
}

/// Every successor of `screen_nr` along edges tagged `action_index`, in
/// edge declaration order.
pub fn get_expected_screen_nrs(
    graph: &ScriptGraph,
    screen_nr: ScreenNr,
    action_index: u32,
) -> ExpectedScreenSet {
    graph
        .edges
        .iter()
        .filter(|e| e.from == screen_nr && e.action_index == action_index)
        .map(|e| e.to)
        .collect()
}
