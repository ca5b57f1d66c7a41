use thiserror::Error;

use crate::device::error::DeviceError;
use crate::hierarchy::view_node::HierarchyError;
use crate::oracle::error::{OracleError, OracleParseError};
use crate::scenario::scenario_model::ErrorKind;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Presence check never came back affirmative
    #[error("'{request}' not found on screen after {attempts} attempt(s)")]
    ElementNotFound { request: String, attempts: u32 },

    /// Locator retry bound reached without a unique match
    #[error("no unique locator for '{request}' after {retries} retries (last '{locator}' matched {matches})")]
    LocatorAmbiguity {
        request: String,
        locator: String,
        matches: usize,
        retries: u32,
    },

    #[error("oracle output unusable after {attempts} attempt(s): {source}")]
    OracleParse {
        attempts: u32,
        source: OracleParseError,
    },

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::ElementNotFound { .. } => ErrorKind::ElementNotFoundError,
            ResolveError::LocatorAmbiguity { .. } => ErrorKind::LocatorAmbiguityError,
            ResolveError::OracleParse { .. } => ErrorKind::OracleParseError,
            ResolveError::Oracle(_) => ErrorKind::OracleError,
            ResolveError::Device(_) => ErrorKind::DeviceError,
            ResolveError::Hierarchy(_) => ErrorKind::HierarchyError,
        }
    }
}
