use thiserror::Error;
use tracing::{info, warn};

use crate::oracle::backend::Oracle;
use crate::oracle::conversation::Conversation;
use crate::oracle::error::{OracleError, OracleParseError};
use crate::oracle::parse::parse_json_reply;
use crate::scenario::scenario_model::{ExecutionState, Scenario};

#[derive(Debug, Error)]
pub enum ScenarioParseError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("could not decode a scenario after {attempts} attempt(s): {source}")]
    Parse {
        attempts: u32,
        source: OracleParseError,
    },
}

pub const DEFAULT_PARSE_ATTEMPTS: u32 = 2;

/// Turns a free-text interaction description into an ordered [`Scenario`]
/// with a single oracle request (plus re-prompts when the reply is malformed).
pub struct ScenarioParser<'o> {
    oracle: &'o dyn Oracle,
    max_attempts: u32,
}

impl<'o> ScenarioParser<'o> {
    pub fn new(oracle: &'o dyn Oracle) -> Self {
        Self {
            oracle,
            max_attempts: DEFAULT_PARSE_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn parse(&self, request: &str) -> Result<Scenario, ScenarioParseError> {
        let mut conversation = Conversation::prompt(build_scenario_prompt(request));
        let mut attempt = 0;

        loop {
            attempt += 1;
            let reply = self.oracle.complete(&conversation)?;

            match decode_scenario(&reply) {
                Ok(scenario) => {
                    info!(steps = scenario.actions.len(), "scenario extracted");
                    return Ok(scenario);
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(attempt, "scenario reply rejected: {}", e);
                    conversation.push_assistant(reply);
                    conversation.push_user(format!(
                        "Your answer could not be used: {}. Reply again with only the JSON object in the required schema.",
                        e
                    ));
                }
                Err(e) => {
                    return Err(ScenarioParseError::Parse {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}

/// Decode and validate a scenario reply. Every action comes back `pending`
/// with no locator, whatever the oracle wrote.
pub fn decode_scenario(reply: &str) -> Result<Scenario, OracleParseError> {
    let mut scenario: Scenario = parse_json_reply(reply)?;

    if scenario.actions.is_empty() {
        return Err(OracleParseError::Schema("scenario has no actions".into()));
    }

    for (i, action) in scenario.actions.iter_mut().enumerate() {
        if action.kind.targets_element() && action.element.is_none() {
            return Err(OracleParseError::Schema(format!(
                "action {} ({}) needs an element",
                i + 1,
                action.kind
            )));
        }
        if !action.kind.targets_element() && action.data.is_none() {
            return Err(OracleParseError::Schema(format!(
                "action {} ({}) needs data",
                i + 1,
                action.kind
            )));
        }
        if !action.kind.targets_element() {
            action.element = None;
        }
        if let Some(element) = action.element.as_mut() {
            element.locator = None;
        }
        action.status = ExecutionState::Pending;
    }

    Ok(scenario)
}

fn build_scenario_prompt(request: &str) -> String {
    format!(
        r#"Split the following description of a user interaction with an Android application into an ordered list of step-by-step actions.

Action types:
- "click": tap an element. "element" describes the element.
- "text_input": type text into an element. "element" describes the field, "data" is the text.
- "swipe_element": swipe on an element. "data" is one of up, down, left, right.
- "press_key": press a device key. "element" is null, "data" is one of home, back, left, right, up, down, center, menu, search, enter, delete, recent, volume_up, volume_down, volume_mute, camera, power.
- "swipe_screen": swipe across the whole screen. "element" is null, "data" is one of up, down, left, right.

Scenario:
{request}

Return ONLY a JSON object in this schema:
{{
  "actions": [
    {{
      "element": {{"description": "short description of the element"}} or null,
      "data": "text, key name or direction" or null,
      "type": "click|text_input|press_key|swipe_element|swipe_screen"
    }}
  ]
}}"#
    )
}
