use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("oracle at {endpoint} answered {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("oracle returned an empty completion")]
    EmptyCompletion,

    /// Scripted oracle ran out of canned replies
    #[error("no scripted reply left for prompt #{0}")]
    ScriptExhausted(usize),

    #[error("oracle is not configured: {0}")]
    Config(String),
}

/// Structured output that could not be decoded from oracle text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OracleParseError {
    #[error("no JSON object found in oracle response")]
    NoJson,

    #[error("oracle JSON does not match the expected schema: {0}")]
    Schema(String),

    #[error("oracle left field '{0}' empty")]
    EmptyField(&'static str),

    #[error("oracle returned an empty locator")]
    EmptyLocator,

    /// Reply text that is not a locator expression
    #[error("oracle reply is not a locator: '{0}'")]
    NotALocator(String),
}
