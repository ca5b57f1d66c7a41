use std::cell::RefCell;
use std::collections::VecDeque;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::oracle::conversation::{Conversation, Message};
use crate::oracle::error::OracleError;

/// Text-completion capability: a conversation in, free text out.
pub trait Oracle {
    fn complete(&self, conversation: &Conversation) -> Result<String, OracleError>;

    /// Short provider label used in logs.
    fn name(&self) -> &str;
}

// ============================================================================
// Ollama Backend
// ============================================================================

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434/api/chat";
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5:1.5b";

pub struct OllamaOracle {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    client: reqwest::blocking::Client,
}

impl Default for OllamaOracle {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL)
    }
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

impl OllamaOracle {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            temperature: 0.0,
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Oracle for OllamaOracle {
    fn complete(&self, conversation: &Conversation) -> Result<String, OracleError> {
        let request = OllamaChatRequest {
            model: &self.model,
            messages: conversation.messages(),
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        let response: OllamaChatResponse = post_json(&self.client, &self.endpoint, &request, &[])?;
        non_empty(response.message.content)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// ============================================================================
// Anthropic Backend
// ============================================================================

pub const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicOracle {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    api_key: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicOracle {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            endpoint: DEFAULT_ANTHROPIC_ENDPOINT.to_string(),
            model: model.to_string(),
            temperature: 0.0,
            max_tokens: 8000,
            api_key: api_key.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_limits(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

impl Oracle for AnthropicOracle {
    fn complete(&self, conversation: &Conversation) -> Result<String, OracleError> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: conversation.messages(),
        };

        let headers = [
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
        ];
        let response: AnthropicResponse =
            post_json(&self.client, &self.endpoint, &request, &headers)?;

        let text = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        non_empty(text)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

fn post_json<Req: Serialize, Resp: DeserializeOwned>(
    client: &reqwest::blocking::Client,
    endpoint: &str,
    body: &Req,
    headers: &[(&str, &str)],
) -> Result<Resp, OracleError> {
    let http_error = |source| OracleError::Http {
        endpoint: endpoint.to_string(),
        source,
    };

    let mut request = client.post(endpoint).json(body);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request.send().map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(OracleError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    response.json().map_err(http_error)
}

fn non_empty(text: String) -> Result<String, OracleError> {
    if text.trim().is_empty() {
        Err(OracleError::EmptyCompletion)
    } else {
        Ok(text)
    }
}

// ============================================================================
// Scripted Backend (canned replies, no network)
// ============================================================================

/// Oracle that answers from a fixed queue of replies and records every
/// conversation it was shown.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    replies: RefCell<VecDeque<String>>,
    seen: RefCell<Vec<Conversation>>,
}

impl ScriptedOracle {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: RefCell::new(replies.into_iter().map(Into::into).collect()),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.borrow_mut().push_back(reply.into());
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.seen.borrow().clone()
    }
}

impl Oracle for ScriptedOracle {
    fn complete(&self, conversation: &Conversation) -> Result<String, OracleError> {
        self.seen.borrow_mut().push(conversation.clone());
        let call = self.calls();
        let reply = self
            .replies
            .borrow_mut()
            .pop_front()
            .ok_or(OracleError::ScriptExhausted(call))?;
        debug!(call, "scripted oracle reply: {}", reply);
        Ok(reply)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Absent Backend (replay of fully executed traces)
// ============================================================================

/// Oracle for runs that must never consult one; every completion fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOracle;

impl Oracle for NoOracle {
    fn complete(&self, _conversation: &Conversation) -> Result<String, OracleError> {
        Err(OracleError::Config("replay needs no oracle".to_string()))
    }

    fn name(&self) -> &str {
        "none"
    }
}
