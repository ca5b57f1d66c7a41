use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::error::DeviceError;

/// Capability surface of a device automation backend.
///
/// Every call is blocking. Locators are XPath-style expressions evaluated by
/// the backend against its live hierarchy.
pub trait DeviceDriver {
    /// Raw XML dump of the current window hierarchy.
    fn dump_hierarchy(&mut self) -> Result<String, DeviceError>;

    /// Number of elements the locator currently selects.
    ///
    /// A locator the backend cannot evaluate yields `DeviceError::InvalidLocator`.
    fn count_matches(&mut self, locator: &str) -> Result<usize, DeviceError>;

    /// Tap the element selected by `locator`.
    fn click(&mut self, locator: &str) -> Result<(), DeviceError>;

    /// Swipe on the element selected by `locator`.
    fn swipe_element(&mut self, locator: &str, direction: Direction) -> Result<(), DeviceError>;

    /// Straight swipe between two screen points.
    fn swipe(&mut self, from: Point, to: Point) -> Result<(), DeviceError>;

    /// Type text into the focused element.
    fn send_keys(&mut self, text: &str) -> Result<(), DeviceError>;

    fn press(&mut self, key: DeviceKey) -> Result<(), DeviceError>;

    /// Viewport size as `(width, height)`.
    fn window_size(&mut self) -> Result<(u32, u32), DeviceError>;

    /// Release the automation session.
    fn stop(&mut self) -> Result<(), DeviceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(s.to_string()),
        }
    }
}

/// Device keys the engine is allowed to press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKey {
    Home,
    Back,
    Left,
    Right,
    Up,
    Down,
    Center,
    Menu,
    Search,
    Enter,
    Delete,
    Recent,
    VolumeUp,
    VolumeDown,
    VolumeMute,
    Camera,
    Power,
}

impl DeviceKey {
    pub const ALL: [DeviceKey; 17] = [
        DeviceKey::Home,
        DeviceKey::Back,
        DeviceKey::Left,
        DeviceKey::Right,
        DeviceKey::Up,
        DeviceKey::Down,
        DeviceKey::Center,
        DeviceKey::Menu,
        DeviceKey::Search,
        DeviceKey::Enter,
        DeviceKey::Delete,
        DeviceKey::Recent,
        DeviceKey::VolumeUp,
        DeviceKey::VolumeDown,
        DeviceKey::VolumeMute,
        DeviceKey::Camera,
        DeviceKey::Power,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKey::Home => "home",
            DeviceKey::Back => "back",
            DeviceKey::Left => "left",
            DeviceKey::Right => "right",
            DeviceKey::Up => "up",
            DeviceKey::Down => "down",
            DeviceKey::Center => "center",
            DeviceKey::Menu => "menu",
            DeviceKey::Search => "search",
            DeviceKey::Enter => "enter",
            DeviceKey::Delete => "delete",
            DeviceKey::Recent => "recent",
            DeviceKey::VolumeUp => "volume_up",
            DeviceKey::VolumeDown => "volume_down",
            DeviceKey::VolumeMute => "volume_mute",
            DeviceKey::Camera => "camera",
            DeviceKey::Power => "power",
        }
    }
}

impl FromStr for DeviceKey {
    type Err = String;

    /// Exact, case-sensitive match against the allow-list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
