use std::collections::{HashMap, HashSet, VecDeque};

use scenario_explorer::device::driver::{DeviceDriver, DeviceKey, Direction, Point};
use scenario_explorer::device::error::DeviceError;

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Dump,
    Count(String),
    Click(String),
    SwipeElement(String, Direction),
    Swipe(Point, Point),
    SendKeys(String),
    Press(DeviceKey),
    WindowSize,
}

/// In-memory device: serves canned dumps, answers match counts from a table
/// and records every side effect.
pub struct FakeDevice {
    /// Dumps served in order; the last one repeats
    screens: VecDeque<String>,
    counts: HashMap<String, usize>,
    invalid: HashSet<String>,
    vanished: HashSet<String>,
    pub window: (u32, u32),
    pub calls: Vec<DeviceCall>,
    pub stop_calls: usize,
    pub fail_dump: bool,
    /// Dumps that succeed before every later one fails
    pub dump_limit: Option<usize>,
}

impl FakeDevice {
    pub fn new(screen: &str) -> Self {
        Self {
            screens: VecDeque::from([screen.to_string()]),
            counts: HashMap::new(),
            invalid: HashSet::new(),
            vanished: HashSet::new(),
            window: (1080, 1920),
            calls: Vec::new(),
            stop_calls: 0,
            fail_dump: false,
            dump_limit: None,
        }
    }

    /// Queue another dump, served after the current one.
    pub fn then_screen(mut self, screen: &str) -> Self {
        self.screens.push_back(screen.to_string());
        self
    }

    pub fn with_matches(mut self, locator: &str, count: usize) -> Self {
        self.counts.insert(locator.to_string(), count);
        self
    }

    /// Locator the device refuses to evaluate.
    pub fn with_invalid(mut self, locator: &str) -> Self {
        self.invalid.insert(locator.to_string());
        self
    }

    /// Locator that counts as unique but is gone when acted on.
    pub fn with_vanished(mut self, locator: &str) -> Self {
        self.vanished.insert(locator.to_string());
        self
    }

    pub fn stopped(&self) -> bool {
        self.stop_calls > 0
    }

    pub fn dumps(&self) -> usize {
        self.calls.iter().filter(|c| **c == DeviceCall::Dump).count()
    }

    /// Side effects only: clicks, swipes, typing and key presses.
    pub fn actions(&self) -> Vec<DeviceCall> {
        self.calls
            .iter()
            .filter(|c| {
                !matches!(
                    c,
                    DeviceCall::Dump | DeviceCall::Count(_) | DeviceCall::WindowSize
                )
            })
            .cloned()
            .collect()
    }

    fn target(&self, locator: &str) -> Result<(), DeviceError> {
        if self.vanished.contains(locator) || self.counts.get(locator).copied().unwrap_or(0) == 0 {
            return Err(DeviceError::LocatorNotFound(locator.to_string()));
        }
        Ok(())
    }
}

impl DeviceDriver for FakeDevice {
    fn dump_hierarchy(&mut self) -> Result<String, DeviceError> {
        self.calls.push(DeviceCall::Dump);
        if self.fail_dump || self.dump_limit.is_some_and(|limit| self.dumps() > limit) {
            return Err(DeviceError::SessionIO("dump failed".into()));
        }
        let screen = if self.screens.len() > 1 {
            self.screens.pop_front().unwrap()
        } else {
            self.screens.front().cloned().unwrap_or_default()
        };
        Ok(screen)
    }

    fn count_matches(&mut self, locator: &str) -> Result<usize, DeviceError> {
        self.calls.push(DeviceCall::Count(locator.to_string()));
        if self.invalid.contains(locator) {
            return Err(DeviceError::InvalidLocator {
                locator: locator.to_string(),
                reason: "invalid expression".into(),
            });
        }
        Ok(self.counts.get(locator).copied().unwrap_or(0))
    }

    fn click(&mut self, locator: &str) -> Result<(), DeviceError> {
        self.target(locator)?;
        self.calls.push(DeviceCall::Click(locator.to_string()));
        Ok(())
    }

    fn swipe_element(&mut self, locator: &str, direction: Direction) -> Result<(), DeviceError> {
        self.target(locator)?;
        self.calls
            .push(DeviceCall::SwipeElement(locator.to_string(), direction));
        Ok(())
    }

    fn swipe(&mut self, from: Point, to: Point) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::Swipe(from, to));
        Ok(())
    }

    fn send_keys(&mut self, text: &str) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::SendKeys(text.to_string()));
        Ok(())
    }

    fn press(&mut self, key: DeviceKey) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::Press(key));
        Ok(())
    }

    fn window_size(&mut self) -> Result<(u32, u32), DeviceError> {
        self.calls.push(DeviceCall::WindowSize);
        Ok(self.window)
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.stop_calls += 1;
        Ok(())
    }
}
