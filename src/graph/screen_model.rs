use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::dispatcher::Action;
use crate::engine::history::History;
use crate::graph::selection::{SelectAction, Terminal};

/// Number identifying a screen within one script graph.
pub type ScreenNr = u32;

/// Attribute name → value pairs reported by the device for one UI element.
pub type ElementAttributes = BTreeMap<String, String>;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_WAIT_TIME_SEC: f64 = 1.0;

// ============================================================================
// Element signatures
// ============================================================================

/// Attribute name → expected value. Matches a device element whose
/// attributes carry all of these values.
///
/// Attribute names are normalized on construction, so hierarchy-dump names
/// (`@text`, `@resource-id`) and selector names (`text`, `resourceId`) are
/// interchangeable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct ElementSignature {
    attributes: BTreeMap<String, String>,
}

impl ElementSignature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one attribute, normalizing its name.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .insert(normalize_attribute_name(name), value.to_string());
        self
    }

    pub fn text(value: &str) -> Self {
        Self::new().with("text", value)
    }

    pub fn resource_id(value: &str) -> Self {
        Self::new().with("resourceId", value)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Whether an element with these attributes satisfies the signature.
    pub fn matches(&self, element: &ElementAttributes) -> bool {
        self.attributes
            .iter()
            .all(|(name, expected)| element.get(name) == Some(expected))
    }
}

impl From<BTreeMap<String, String>> for ElementSignature {
    fn from(raw: BTreeMap<String, String>) -> Self {
        let attributes = raw
            .into_iter()
            .map(|(name, value)| (normalize_attribute_name(&name), value))
            .collect();
        Self { attributes }
    }
}

impl From<ElementSignature> for BTreeMap<String, String> {
    fn from(signature: ElementSignature) -> Self {
        signature.attributes
    }
}

impl fmt::Display for ElementSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .attributes
            .iter()
            .map(|(name, value)| format!("{}={:?}", name, value))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Map hierarchy-dump attribute names onto uiautomator selector names.
pub fn normalize_attribute_name(name: &str) -> String {
    let bare = name.strip_prefix('@').unwrap_or(name);
    match bare {
        "resource-id" => "resourceId".to_string(),
        "content-desc" => "description".to_string(),
        "class" => "className".to_string(),
        "package" => "packageName".to_string(),
        other => other.to_string(),
    }
}

/// An element found on the device while matching a screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedElement {
    pub signature: ElementSignature,
    pub attributes: ElementAttributes,
}

// ============================================================================
// Action identity
// ============================================================================

/// Identity of an action on a screen. The index tags the graph edges
/// that leave the screen when this action is taken.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId {
    pub index: u32,
    pub name: String,
}

impl ActionId {
    pub fn new(index: u32, name: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action_{} ({})", self.index, self.name)
    }
}

// ============================================================================
// Screen
// ============================================================================

/// One recognizable UI state of the app.
///
/// Built once when the script is defined. `required_objects` gate the
/// match, `optional_objects` only feed action selection.
pub struct Screen {
    pub screen_nr: ScreenNr,
    pub required_objects: Vec<ElementSignature>,
    pub optional_objects: Vec<ElementSignature>,
    pub max_retries: u32,
    pub wait_time: Duration,
    selector: Box<dyn SelectAction>,
    actions: Vec<(ActionId, Box<dyn Action>)>,
}

impl Screen {
    /// A terminal screen with default retry settings and no actions.
    pub fn new(screen_nr: ScreenNr) -> Self {
        Self {
            screen_nr,
            required_objects: Vec::new(),
            optional_objects: Vec::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            wait_time: Duration::from_secs_f64(DEFAULT_WAIT_TIME_SEC),
            selector: Box::new(Terminal),
            actions: Vec::new(),
        }
    }

    pub fn with_required(mut self, signature: ElementSignature) -> Self {
        self.required_objects.push(signature);
        self
    }

    pub fn with_optional(mut self, signature: ElementSignature) -> Self {
        self.optional_objects.push(signature);
        self
    }

    pub fn with_retries(mut self, max_retries: u32, wait_time: Duration) -> Self {
        self.max_retries = max_retries;
        self.wait_time = wait_time;
        self
    }

    pub fn with_selector(mut self, selector: impl SelectAction + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Register the body that runs when `id` is selected.
    pub fn with_action(mut self, id: ActionId, action: impl Action + 'static) -> Self {
        self.actions.push((id, Box::new(action)));
        self
    }

    /// Ask the screen's selection behavior which actions apply.
    pub fn select_action(
        &self,
        required: &[MatchedElement],
        optional: &[MatchedElement],
        history: &History,
    ) -> Vec<ActionId> {
        self.selector.select_action(required, optional, history)
    }

    /// Look up a registered action body.
    pub fn action(&self, id: &ActionId) -> Option<&dyn Action> {
        self.actions
            .iter()
            .find(|(registered, _)| registered == id)
            .map(|(_, action)| action.as_ref())
    }

    pub fn action_ids(&self) -> impl Iterator<Item = &ActionId> {
        self.actions.iter().map(|(id, _)| id)
    }
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen")
            .field("screen_nr", &self.screen_nr)
            .field("required_objects", &self.required_objects)
            .field("optional_objects", &self.optional_objects)
            .field("max_retries", &self.max_retries)
            .field("wait_time", &self.wait_time)
            .field("actions", &self.action_ids().collect::<Vec<_>>())
            .finish()
    }
}
