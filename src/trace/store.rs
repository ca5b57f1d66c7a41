use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::scenario::scenario_model::{Scenario, Trace};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("'{path}' is not valid JSON for this format: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Write a trace as a pretty-printed JSON array.
pub fn save_trace(path: impl AsRef<Path>, trace: &Trace) -> Result<(), StoreError> {
    write_json(path.as_ref(), trace)
}

pub fn load_trace(path: impl AsRef<Path>) -> Result<Trace, StoreError> {
    read_json(path.as_ref())
}

pub fn save_scenario(path: impl AsRef<Path>, scenario: &Scenario) -> Result<(), StoreError> {
    write_json(path.as_ref(), scenario)
}

pub fn load_scenario(path: impl AsRef<Path>) -> Result<Scenario, StoreError> {
    read_json(path.as_ref())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Json {
        path: path.display().to_string(),
        source: e,
    })?;
    fs::write(path, json).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| StoreError::Json {
        path: path.display().to_string(),
        source: e,
    })
}
