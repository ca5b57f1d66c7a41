use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of UI action a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    #[default]
    Click,
    TextInput,
    PressKey,
    SwipeElement,
    SwipeScreen,
}

impl ActionKind {
    /// Actions that need a resolved screen element before they can run.
    pub fn targets_element(&self) -> bool {
        matches!(
            self,
            ActionKind::Click | ActionKind::TextInput | ActionKind::SwipeElement
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::TextInput => "text_input",
            ActionKind::PressKey => "press_key",
            ActionKind::SwipeElement => "swipe_element",
            ActionKind::SwipeScreen => "swipe_screen",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Pending` → `Executed` | `Broken`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    #[default]
    Pending,
    Executed,
    Broken,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionState::Pending)
    }
}

/// Target element of an action, described in natural language and filled
/// in with a locator once resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    pub description: String,
    #[serde(rename = "xpath", default)]
    pub locator: Option<String>,
}

impl ElementDescriptor {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            name: None,
            description: description.into(),
            locator: None,
        }
    }
}

/// One step of a scenario. Mutated in place while the scenario runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(default)]
    pub element: Option<ElementDescriptor>,

    /// Typed text, key name or swipe direction
    #[serde(default)]
    pub data: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: ActionKind,

    #[serde(default)]
    pub status: ExecutionState,
}

impl ActionRecord {
    pub fn click(description: &str) -> Self {
        Self::on_element(ActionKind::Click, description, None)
    }

    pub fn text_input(description: &str, text: &str) -> Self {
        Self::on_element(ActionKind::TextInput, description, Some(text))
    }

    pub fn swipe_element(description: &str, direction: &str) -> Self {
        Self::on_element(ActionKind::SwipeElement, description, Some(direction))
    }

    pub fn press_key(key: &str) -> Self {
        Self::device_level(ActionKind::PressKey, key)
    }

    pub fn swipe_screen(direction: &str) -> Self {
        Self::device_level(ActionKind::SwipeScreen, direction)
    }

    fn on_element(kind: ActionKind, description: &str, data: Option<&str>) -> Self {
        Self {
            element: Some(ElementDescriptor::new(description)),
            data: data.map(str::to_string),
            kind,
            status: ExecutionState::Pending,
        }
    }

    fn device_level(kind: ActionKind, data: &str) -> Self {
        Self {
            element: None,
            data: Some(data.to_string()),
            kind,
            status: ExecutionState::Pending,
        }
    }

    /// Locator resolved for this action's element, if any.
    pub fn locator(&self) -> Option<&str> {
        self.element.as_ref().and_then(|e| e.locator.as_deref())
    }

    /// Short human-readable label for logs and summaries.
    pub fn label(&self) -> String {
        match (&self.element, &self.data) {
            (Some(element), Some(data)) => {
                format!("{} '{}' ({})", self.kind, element.description, data)
            }
            (Some(element), None) => format!("{} '{}'", self.kind, element.description),
            (None, Some(data)) => format!("{} {}", self.kind, data),
            (None, None) => self.kind.to_string(),
        }
    }
}

/// Ordered list of actions. Insertion order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub actions: Vec<ActionRecord>,
}

impl Scenario {
    pub fn new(actions: Vec<ActionRecord>) -> Self {
        Self { actions }
    }
}

/// Screen on which an action was resolved or executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub name: String,
    pub description: String,
    /// Raw hierarchy dump captured at that moment
    pub hierarchy: String,
}

impl ScreenInfo {
    /// Snapshot with no oracle-assigned name, for device-level steps and failures.
    pub fn unnamed(hierarchy: String) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            hierarchy,
        }
    }
}

/// Closed vocabulary of failures recorded on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Oracle did not confirm the element after the presence bound
    ElementNotFoundError,
    /// A verified locator matched nothing at execution time
    XPathResolutionError,
    InvalidKeyError,
    InvalidDirectionError,
    /// Element-targeting action without an element descriptor
    InvalidActionError,
    /// Locator disambiguation did not converge
    LocatorAmbiguityError,
    OracleParseError,
    OracleError,
    DeviceError,
    HierarchyError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }
}

/// One trace entry: an action with the screen it ran on and its failure, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub screen: Option<ScreenInfo>,
    pub action: ActionRecord,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

impl Frame {
    pub fn pending(action: ActionRecord) -> Self {
        Self {
            screen: None,
            action,
            error: None,
        }
    }

    pub fn status(&self) -> ExecutionState {
        self.action.status
    }
}

/// Ordered frames of one run; persisted as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    pub frames: Vec<Frame>,
}

impl Trace {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn count(&self, status: ExecutionState) -> usize {
        self.frames.iter().filter(|f| f.status() == status).count()
    }

    /// Index of the frame that halted the run.
    pub fn halted_at(&self) -> Option<usize> {
        self.frames
            .iter()
            .position(|f| f.status() == ExecutionState::Broken)
    }

    pub fn is_complete(&self) -> bool {
        self.frames
            .iter()
            .all(|f| f.status() == ExecutionState::Executed)
    }

    /// Last frame that is not pending: the one to inspect after a halt.
    pub fn last_settled(&self) -> Option<&Frame> {
        self.frames.iter().rev().find(|f| f.status().is_terminal())
    }
}

impl From<Scenario> for Trace {
    fn from(scenario: Scenario) -> Self {
        Trace::new(scenario.actions.into_iter().map(Frame::pending).collect())
    }
}
