use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::scenario::scenario_model::{ActionKind, ErrorKind, ExecutionState};

/// One line of the run journal.
#[derive(Debug, Clone, Serialize)]
pub struct RunEvent {
    pub timestamp_ms: u128,
    pub step: usize,

    pub phase: String,

    pub action: Option<String>,
    pub status: Option<String>,

    /// SHA-1 of the hierarchy the step ran against
    pub screen: Option<String>,
    pub locator: Option<String>,
    pub error: Option<String>,
}

impl RunEvent {
    pub fn now(step: usize, phase: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            step,
            phase: phase.to_string(),
            action: None,
            status: None,
            screen: None,
            locator: None,
            error: None,
        }
    }

    pub fn with_action(mut self, kind: ActionKind) -> Self {
        self.action = Some(kind.as_str().to_string());
        self
    }

    pub fn with_status(mut self, status: ExecutionState) -> Self {
        self.status = Some(format!("{:?}", status).to_lowercase());
        self
    }

    pub fn with_screen(mut self, fingerprint: impl ToString) -> Self {
        self.screen = Some(fingerprint.to_string());
        self
    }

    pub fn with_locator(mut self, locator: &str) -> Self {
        self.locator = Some(locator.to_string());
        self
    }

    pub fn with_error(mut self, kind: ErrorKind) -> Self {
        self.error = Some(kind.to_string());
        self
    }
}
