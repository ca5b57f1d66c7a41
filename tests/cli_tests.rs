use std::collections::HashMap;

use clap::Parser;
use scenario_explorer::cli::commands::{
    build_oracle, format_trace_summary, load_scenario_input, needs_resolution,
};
use scenario_explorer::cli::config::{
    load_config, verbosity_filter, AppConfig, Cli, Commands, OracleConfig, OracleSettings,
    Provider,
};
use scenario_explorer::oracle::backend::{Oracle, ScriptedOracle};
use scenario_explorer::scenario::scenario_model::{
    ActionRecord, ErrorInfo, ErrorKind, ExecutionState, Frame, Scenario, Trace,
};
use scenario_explorer::trace::store::save_scenario;

fn env_with<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    let map: HashMap<&str, &str> = vars.iter().copied().collect();
    move |key| map.get(key).map(|v| v.to_string())
}

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_explore_defaults_output() {
    let cli = Cli::parse_from(["scenario-explorer", "explore", "--scenario", "open_settings.txt"]);
    match cli.command {
        Commands::Explore { scenario, output } => {
            assert_eq!(scenario, "open_settings.txt");
            assert_eq!(output, "explore_result.json");
        }
        _ => panic!("Expected Explore command"),
    }
    assert_eq!(cli.verbose, 0);
}

#[test]
fn cli_parse_replay_with_globals() {
    let cli = Cli::parse_from([
        "scenario-explorer",
        "replay",
        "--trace",
        "explore_result.json",
        "-o",
        "again.json",
        "-vv",
        "--oracle",
        "ollama",
        "--oracle-model",
        "llama3",
        "--journal",
        "run.jsonl",
    ]);
    match &cli.command {
        Commands::Replay { trace, output } => {
            assert_eq!(trace, "explore_result.json");
            assert_eq!(output, "again.json");
        }
        _ => panic!("Expected Replay command"),
    }
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.oracle.as_deref(), Some("ollama"));
    assert_eq!(cli.oracle_model.as_deref(), Some("llama3"));
    assert_eq!(cli.journal.as_deref(), Some("run.jsonl"));
}

#[test]
fn cli_parse_parse_without_output() {
    let cli = Cli::parse_from(["scenario-explorer", "parse", "--scenario", "s.txt"]);
    assert!(matches!(cli.command, Commands::Parse { output: None, .. }));
}

#[test]
fn cli_requires_a_subcommand() {
    assert!(Cli::try_parse_from(["scenario-explorer"]).is_err());
}

#[test]
fn verbosity_maps_to_log_levels() {
    assert_eq!(verbosity_filter(0), "warn");
    assert_eq!(verbosity_filter(1), "info");
    assert_eq!(verbosity_filter(2), "debug");
    assert_eq!(verbosity_filter(5), "trace");
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn missing_config_file_gives_defaults() {
    let config = load_config(Some("/nonexistent/scenario-explorer.yaml"));
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.resolver.presence_attempts, 3);
    assert_eq!(config.executor.settle_delay_ms, 3000);
    assert_eq!(config.device.program, "python3");
}

#[test]
fn partial_config_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario-explorer.yaml");
    std::fs::write(
        &path,
        r#"
oracle:
  provider: ollama
  model: qwen2.5:7b
device:
  serial: emulator-5554
resolver:
  max_locator_retries: 8
executor:
  settle_delay_ms: 500
output:
  journal: run.jsonl
"#,
    )
    .unwrap();

    let config = load_config(path.to_str());

    assert_eq!(config.oracle.provider.as_deref(), Some("ollama"));
    assert_eq!(config.oracle.max_tokens, 8000);
    assert_eq!(config.device.serial.as_deref(), Some("emulator-5554"));
    assert_eq!(config.device.program, "python3");
    assert_eq!(config.resolver.max_locator_retries, 8);
    assert_eq!(config.resolver.presence_attempts, 3);
    assert_eq!(config.executor.settle_delay_ms, 500);
    assert_eq!(config.executor.edge_margin, 100);
    assert_eq!(config.output.journal.as_deref(), Some("run.jsonl"));
}

#[test]
fn malformed_config_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "resolver: [not, a, map").unwrap();

    assert_eq!(load_config(path.to_str()), AppConfig::default());
}

// ============================================================================
// Oracle Settings Precedence
// ============================================================================

#[test]
fn api_key_in_environment_selects_anthropic() {
    let cli = Cli::parse_from(["scenario-explorer", "parse", "--scenario", "s.txt"]);
    let settings = OracleSettings::resolve(
        &cli,
        &OracleConfig::default(),
        env_with(&[("ANTHROPIC_API_KEY", "sk-test")]),
    )
    .unwrap();

    assert_eq!(settings.provider, Provider::Anthropic);
    assert_eq!(settings.model, "claude-3-5-haiku-latest");
    assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
    assert_eq!(settings.temperature, 0.0);
}

#[test]
fn without_api_key_ollama_is_used_with_ollama_host() {
    let cli = Cli::parse_from(["scenario-explorer", "parse", "--scenario", "s.txt"]);
    let settings = OracleSettings::resolve(
        &cli,
        &OracleConfig::default(),
        env_with(&[("OLLAMA_HOST", "10.0.0.5:11434")]),
    )
    .unwrap();

    assert_eq!(settings.provider, Provider::Ollama);
    assert_eq!(settings.ollama_endpoint(), "http://10.0.0.5:11434/api/chat");
    assert_eq!(settings.model, "qwen2.5:1.5b");
}

#[test]
fn cli_beats_config_beats_environment() {
    let cli = Cli::parse_from([
        "scenario-explorer",
        "parse",
        "--scenario",
        "s.txt",
        "--oracle-endpoint",
        "http://cli:11434/api/chat",
    ]);
    let config = OracleConfig {
        provider: Some("ollama".into()),
        endpoint: Some("http://config:11434/api/chat".into()),
        model: Some("config-model".into()),
        ..OracleConfig::default()
    };

    let settings = OracleSettings::resolve(
        &cli,
        &config,
        env_with(&[("ANTHROPIC_API_KEY", "sk-test"), ("OLLAMA_HOST", "env:1")]),
    )
    .unwrap();

    assert_eq!(settings.provider, Provider::Ollama);
    assert_eq!(settings.ollama_endpoint(), "http://cli:11434/api/chat");
    assert_eq!(settings.model, "config-model");
}

#[test]
fn unknown_provider_is_an_error() {
    let cli = Cli::parse_from([
        "scenario-explorer",
        "parse",
        "--scenario",
        "s.txt",
        "--oracle",
        "gpt",
    ]);
    assert!(OracleSettings::resolve(&cli, &OracleConfig::default(), env_with(&[])).is_err());
}

#[test]
fn anthropic_without_key_cannot_be_built() {
    let cli = Cli::parse_from([
        "scenario-explorer",
        "parse",
        "--scenario",
        "s.txt",
        "--oracle",
        "anthropic",
    ]);
    let settings = OracleSettings::resolve(&cli, &OracleConfig::default(), env_with(&[])).unwrap();

    assert!(build_oracle(&settings).is_err());
}

#[test]
fn ollama_oracle_builds_without_network() {
    let cli = Cli::parse_from(["scenario-explorer", "parse", "--scenario", "s.txt"]);
    let settings = OracleSettings::resolve(&cli, &OracleConfig::default(), env_with(&[])).unwrap();

    let oracle = build_oracle(&settings).unwrap();
    assert_eq!(oracle.name(), "ollama");
}

// ============================================================================
// Command Helpers
// ============================================================================

#[test]
fn json_scenario_input_skips_the_parser() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.json");
    let scenario = Scenario::new(vec![ActionRecord::press_key("home")]);
    save_scenario(&path, &scenario).unwrap();

    let oracle = ScriptedOracle::default();
    let loaded = load_scenario_input(path.to_str().unwrap(), &oracle).unwrap();

    assert_eq!(loaded, scenario);
    assert_eq!(oracle.calls(), 0);
}

#[test]
fn text_scenario_input_goes_through_the_parser() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.txt");
    std::fs::write(&path, "Press the home button").unwrap();

    let oracle = ScriptedOracle::new([r#"{"actions": [{"type": "press_key", "data": "home"}]}"#]);
    let loaded = load_scenario_input(path.to_str().unwrap(), &oracle).unwrap();

    assert_eq!(loaded.actions.len(), 1);
    assert_eq!(oracle.calls(), 1);
}

#[test]
fn replay_needs_the_oracle_only_for_unfinished_element_steps() {
    let mut done = ActionRecord::click("OK");
    done.status = ExecutionState::Executed;
    let finished = Trace::new(vec![
        Frame::pending(done),
        Frame::pending(ActionRecord::press_key("home")),
    ]);
    assert!(!needs_resolution(&finished));

    let unfinished = Trace::new(vec![Frame::pending(ActionRecord::click("Cancel"))]);
    assert!(needs_resolution(&unfinished));
}

#[test]
fn summary_lists_every_frame() {
    let mut click = ActionRecord::click("Settings");
    click.status = ExecutionState::Executed;
    if let Some(element) = click.element.as_mut() {
        element.locator = Some("//*[@text='Settings']".into());
    }
    let mut key = ActionRecord::press_key("bogus_key");
    key.status = ExecutionState::Broken;

    let trace = Trace::new(vec![
        Frame::pending(click),
        Frame {
            screen: None,
            action: key,
            error: Some(ErrorInfo::new(ErrorKind::InvalidKeyError, "'bogus_key' is not an allowed device key")),
        },
        Frame::pending(ActionRecord::press_key("back")),
    ]);

    let summary = format_trace_summary(&trace);
    let lines: Vec<&str> = summary.lines().collect();

    assert_eq!(lines[0], "3 steps: 1 executed, 1 broken, 1 pending");
    assert!(lines[1].contains("[1] ok"));
    assert!(lines[1].contains("//*[@text='Settings']"));
    assert!(lines[2].contains("BROKEN"));
    assert!(lines[2].contains("InvalidKeyError"));
    assert!(lines[3].contains("press_key back"));
}
