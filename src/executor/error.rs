use thiserror::Error;

use crate::device::error::DeviceError;
use crate::scenario::scenario_model::{ActionKind, ErrorKind};

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Locator verified during resolution no longer selects anything
    #[error("locator '{0}' no longer resolves")]
    LocatorNotFound(String),

    #[error("'{0}' is not an allowed device key")]
    InvalidKey(String),

    #[error("'{0}' is not a swipe direction (up, down, left, right)")]
    InvalidDirection(String),

    #[error("{0} action has no resolved locator")]
    MissingLocator(ActionKind),

    #[error(transparent)]
    Device(DeviceError),
}

impl From<DeviceError> for ExecutionError {
    fn from(error: DeviceError) -> Self {
        match error {
            DeviceError::LocatorNotFound(locator) => ExecutionError::LocatorNotFound(locator),
            DeviceError::InvalidLocator { locator, .. } => ExecutionError::LocatorNotFound(locator),
            other => ExecutionError::Device(other),
        }
    }
}

impl ExecutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::LocatorNotFound(_) => ErrorKind::XPathResolutionError,
            ExecutionError::InvalidKey(_) => ErrorKind::InvalidKeyError,
            ExecutionError::InvalidDirection(_) => ErrorKind::InvalidDirectionError,
            ExecutionError::MissingLocator(_) => ErrorKind::InvalidActionError,
            ExecutionError::Device(_) => ErrorKind::DeviceError,
        }
    }
}
