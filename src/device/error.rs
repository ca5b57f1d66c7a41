use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    /// Bridge process failed to spawn
    #[error("failed to spawn device bridge '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// Reading from or writing to the bridge failed
    #[error("device bridge I/O error: {0}")]
    SessionIO(String),

    /// Bridge answered a command with ok=false
    #[error("device command '{command}' failed: {error}")]
    Protocol { command: String, error: String },

    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },

    /// The locator selects nothing on the live screen
    #[error("no element matches locator '{0}'")]
    LocatorNotFound(String),

    /// The locator is not a valid expression
    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },
}
