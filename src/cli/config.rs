use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::device::session::BridgeCommand;
use crate::executor::executor::ExecutorConfig;
use crate::oracle::backend::{DEFAULT_ANTHROPIC_MODEL, DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL};
use crate::resolver::resolver::ResolverConfig;

pub const DEFAULT_CONFIG_PATH: &str = "scenario-explorer.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "scenario-explorer",
    version,
    about = "LLM-guided scenario exploration for Android applications"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: scenario-explorer.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Oracle provider: anthropic or ollama
    #[arg(long, global = true)]
    pub oracle: Option<String>,

    /// Oracle API endpoint
    #[arg(long, global = true)]
    pub oracle_endpoint: Option<String>,

    /// Oracle model name
    #[arg(long, global = true)]
    pub oracle_model: Option<String>,

    /// Append engine events to this JSONL file
    #[arg(long, global = true)]
    pub journal: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn a free-text scenario into structured actions
    Parse {
        /// Text file describing the interaction
        #[arg(long)]
        scenario: String,

        /// Write the scenario JSON here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Explore a scenario on the device and record a trace
    Explore {
        /// Free-text description (.txt) or structured scenario (.json)
        #[arg(long)]
        scenario: String,

        /// Trace output path
        #[arg(short, long, default_value = "explore_result.json")]
        output: String,
    },

    /// Replay a recorded trace, resuming at its first unfinished step
    Replay {
        /// Trace recorded by `explore` or a previous `replay`
        #[arg(long)]
        trace: String,

        /// Trace output path
        #[arg(short, long, default_value = "replay_result.json")]
        output: String,
    },
}

/// Default log filter for a `-v` count when `RUST_LOG` is unset.
pub fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `scenario-explorer.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub oracle: OracleConfig,
    pub device: BridgeCommand,
    pub resolver: ResolverConfig,
    pub executor: ExecutorConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub provider: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: None,
            endpoint: None,
            model: None,
            api_key: None,
            temperature: 0.0,
            max_tokens: 8000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub journal: Option<String>,
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = config_path, "ignoring malformed config: {}", e);
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Oracle Settings (CLI > config file > environment > defaults)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    Ollama,
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "ollama" => Ok(Provider::Ollama),
            other => Err(format!("unknown oracle provider: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleSettings {
    pub provider: Provider,
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl OracleSettings {
    /// Merge CLI flags, the config file and environment variables.
    ///
    /// Without an explicit provider, Anthropic is used when an API key is
    /// available and Ollama otherwise.
    pub fn resolve(
        cli: &Cli,
        config: &OracleConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env("ANTHROPIC_API_KEY"))
            .filter(|k| !k.trim().is_empty());

        let provider = match cli.oracle.as_deref().or(config.provider.as_deref()) {
            Some(name) => name.parse()?,
            None if api_key.is_some() => Provider::Anthropic,
            None => Provider::Ollama,
        };

        let endpoint = cli
            .oracle_endpoint
            .clone()
            .or_else(|| config.endpoint.clone())
            .or_else(|| match provider {
                Provider::Ollama => env("OLLAMA_HOST").map(|host| ollama_chat_endpoint(&host)),
                Provider::Anthropic => None,
            });

        let model = cli
            .oracle_model
            .clone()
            .or_else(|| config.model.clone())
            .unwrap_or_else(|| match provider {
                Provider::Anthropic => DEFAULT_ANTHROPIC_MODEL.to_string(),
                Provider::Ollama => DEFAULT_OLLAMA_MODEL.to_string(),
            });

        Ok(Self {
            provider,
            endpoint,
            model,
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn ollama_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_ENDPOINT)
    }
}

/// `OLLAMA_HOST` holds a host (optionally with scheme); the chat API lives under it.
fn ollama_chat_endpoint(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        format!("{}/api/chat", host)
    } else {
        format!("http://{}/api/chat", host)
    }
}
