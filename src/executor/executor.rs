use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::device::driver::{DeviceDriver, DeviceKey, Direction, Point};
use crate::executor::error::ExecutionError;
use crate::scenario::scenario_model::{ActionKind, ActionRecord, ExecutionState};

pub const DEFAULT_SETTLE_DELAY_MS: u64 = 3000;
pub const DEFAULT_EDGE_MARGIN: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Wait between focusing a field and typing, for the soft keyboard to appear
    pub settle_delay_ms: u64,
    /// Distance from the screen edge where screen swipes start and end
    pub edge_margin: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            edge_margin: DEFAULT_EDGE_MARGIN,
        }
    }
}

/// Performs one action on the device. Never talks to the oracle.
#[derive(Debug, Clone, Default)]
pub struct ActionExecutor {
    config: ExecutorConfig,
}

impl ActionExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.config.settle_delay_ms)
    }

    /// Run the action's side effect and mark it `executed`.
    ///
    /// Element actions use the locator already stored on the action's
    /// element; the status is left untouched on error.
    pub fn perform(
        &self,
        device: &mut dyn DeviceDriver,
        action: &mut ActionRecord,
    ) -> Result<(), ExecutionError> {
        debug!(action = %action.label(), "performing");

        match action.kind {
            ActionKind::PressKey => {
                let key = parse_key(action.data.as_deref())?;
                device.press(key)?;
            }

            ActionKind::SwipeScreen => {
                let direction = parse_direction(action.data.as_deref())?;
                let (width, height) = device.window_size()?;
                let (from, to) =
                    screen_swipe_points(width, height, direction, self.config.edge_margin);
                info!("swiping screen {} from {} to {}", direction.as_str(), from, to);
                device.swipe(from, to)?;
            }

            ActionKind::SwipeElement => {
                let direction = parse_direction(action.data.as_deref())?;
                let locator = require_locator(action)?;
                device.swipe_element(locator, direction)?;
            }

            ActionKind::TextInput => {
                let locator = require_locator(action)?;
                device.click(locator)?;
                if let Some(text) = action.data.as_deref() {
                    thread::sleep(self.settle_delay());
                    device.send_keys(text)?;
                }
            }

            ActionKind::Click => {
                let locator = require_locator(action)?;
                device.click(locator)?;
            }
        }

        action.status = ExecutionState::Executed;
        Ok(())
    }
}

fn require_locator(action: &ActionRecord) -> Result<&str, ExecutionError> {
    action
        .locator()
        .ok_or(ExecutionError::MissingLocator(action.kind))
}

/// Validate a key name against the device key allow-list.
pub fn parse_key(data: Option<&str>) -> Result<DeviceKey, ExecutionError> {
    let name = data.unwrap_or_default();
    name.parse()
        .map_err(|_| ExecutionError::InvalidKey(name.to_string()))
}

pub fn parse_direction(data: Option<&str>) -> Result<Direction, ExecutionError> {
    let name = data.unwrap_or_default();
    name.parse()
        .map_err(|_| ExecutionError::InvalidDirection(name.to_string()))
}

/// Edge-to-edge swipe endpoints for a viewport, centred on the other axis.
///
/// `Up` moves the finger from the bottom margin to the top margin, so on a
/// 1080x1920 screen with a margin of 100 it runs from (540, 1820) to (540, 100).
pub fn screen_swipe_points(
    width: u32,
    height: u32,
    direction: Direction,
    margin: u32,
) -> (Point, Point) {
    let center_x = width / 2;
    let center_y = height / 2;
    let top = margin;
    let bottom = height.saturating_sub(margin);
    let left = margin;
    let right = width.saturating_sub(margin);

    match direction {
        Direction::Up => (Point::new(center_x, bottom), Point::new(center_x, top)),
        Direction::Down => (Point::new(center_x, top), Point::new(center_x, bottom)),
        Direction::Left => (Point::new(right, center_y), Point::new(left, center_y)),
        Direction::Right => (Point::new(left, center_y), Point::new(right, center_y)),
    }
}
