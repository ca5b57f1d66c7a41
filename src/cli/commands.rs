use std::error::Error;
use std::path::Path;

use tracing::info;

use crate::cli::config::{AppConfig, OracleSettings, Provider};
use crate::device::session::DeviceSession;
use crate::engine::engine::ScenarioEngine;
use crate::executor::executor::ActionExecutor;
use crate::oracle::backend::{AnthropicOracle, NoOracle, OllamaOracle, Oracle};
use crate::oracle::error::OracleError;
use crate::resolver::resolver::ElementResolver;
use crate::scenario::parser::ScenarioParser;
use crate::scenario::scenario_model::{ExecutionState, Scenario, Trace};
use crate::trace::logger::RunJournal;
use crate::trace::store::{load_scenario, load_trace, save_trace};

// ============================================================================
// parse subcommand
// ============================================================================

pub fn cmd_parse(
    scenario_path: &str,
    output: Option<&str>,
    settings: &OracleSettings,
) -> Result<(), Box<dyn Error>> {
    let text = std::fs::read_to_string(scenario_path)?;
    let oracle = build_oracle(settings)?;
    let scenario = ScenarioParser::new(oracle.as_ref()).parse(&text)?;

    let json = serde_json::to_string_pretty(&scenario)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!("Wrote {} actions to {}", scenario.actions.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

// ============================================================================
// explore subcommand
// ============================================================================

/// Explore a scenario and return whether every step executed.
pub fn cmd_explore(
    scenario_path: &str,
    output: &str,
    settings: &OracleSettings,
    config: &AppConfig,
    journal: Option<&str>,
) -> Result<bool, Box<dyn Error>> {
    let oracle = build_oracle(settings)?;
    let scenario = load_scenario_input(scenario_path, oracle.as_ref())?;
    info!(steps = scenario.actions.len(), "scenario ready");

    let mut device = DeviceSession::launch(&config.device)?;
    let mut engine = build_engine(oracle.as_ref(), config, journal);
    let trace = engine.explore(&mut device, scenario);

    finish(&trace, output)
}

/// A `.json` path is a structured scenario; anything else is free text for
/// the scenario parser.
pub fn load_scenario_input(path: &str, oracle: &dyn Oracle) -> Result<Scenario, Box<dyn Error>> {
    let is_json = Path::new(path)
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(load_scenario(path)?)
    } else {
        let text = std::fs::read_to_string(path)?;
        Ok(ScenarioParser::new(oracle).parse(&text)?)
    }
}

// ============================================================================
// replay subcommand
// ============================================================================

pub fn cmd_replay(
    trace_path: &str,
    output: &str,
    settings: &OracleSettings,
    config: &AppConfig,
    journal: Option<&str>,
) -> Result<bool, Box<dyn Error>> {
    let trace = load_trace(trace_path)?;

    // A fully executed trace replays without consulting the oracle.
    let oracle: Box<dyn Oracle> = if needs_resolution(&trace) {
        build_oracle(settings)?
    } else {
        Box::new(NoOracle)
    };

    let mut device = DeviceSession::launch(&config.device)?;
    let mut engine = build_engine(oracle.as_ref(), config, journal);
    let trace = engine.replay(&mut device, trace);

    finish(&trace, output)
}

/// Whether replaying `trace` may reach the resolver.
pub fn needs_resolution(trace: &Trace) -> bool {
    trace
        .frames
        .iter()
        .any(|f| f.status() != ExecutionState::Executed && f.action.kind.targets_element())
}

// ============================================================================
// Helpers
// ============================================================================

/// Build the oracle selected by the merged settings.
pub fn build_oracle(settings: &OracleSettings) -> Result<Box<dyn Oracle>, OracleError> {
    match settings.provider {
        Provider::Anthropic => {
            let api_key = settings.api_key.as_deref().ok_or_else(|| {
                OracleError::Config("ANTHROPIC_API_KEY is not set".to_string())
            })?;
            let mut oracle = AnthropicOracle::new(api_key, &settings.model)
                .with_limits(settings.temperature, settings.max_tokens);
            if let Some(endpoint) = settings.endpoint.as_deref() {
                oracle = oracle.with_endpoint(endpoint);
            }
            Ok(Box::new(oracle))
        }
        Provider::Ollama => Ok(Box::new(
            OllamaOracle::new(settings.ollama_endpoint(), &settings.model)
                .with_temperature(settings.temperature),
        )),
    }
}

fn build_engine<'o>(
    oracle: &'o dyn Oracle,
    config: &AppConfig,
    journal: Option<&str>,
) -> ScenarioEngine<'o> {
    let resolver = ElementResolver::with_config(oracle, config.resolver.clone());
    let executor = ActionExecutor::new(config.executor.clone());
    let journal = match journal.or(config.output.journal.as_deref()) {
        Some(path) => RunJournal::open(path),
        None => RunJournal::disabled(),
    };
    ScenarioEngine::new(resolver, executor).with_journal(journal)
}

fn finish(trace: &Trace, output: &str) -> Result<bool, Box<dyn Error>> {
    save_trace(output, trace)?;
    print!("{}", format_trace_summary(trace));
    println!("Trace written to {}", output);
    Ok(trace.halted_at().is_none())
}

/// Console summary: one line per frame plus totals.
pub fn format_trace_summary(trace: &Trace) -> String {
    let mut out = format!(
        "{} steps: {} executed, {} broken, {} pending\n",
        trace.len(),
        trace.count(ExecutionState::Executed),
        trace.count(ExecutionState::Broken),
        trace.count(ExecutionState::Pending),
    );

    for (i, frame) in trace.frames.iter().enumerate() {
        let status = match frame.status() {
            ExecutionState::Executed => "ok",
            ExecutionState::Broken => "BROKEN",
            ExecutionState::Pending => "-",
        };
        out.push_str(&format!("  [{}] {:<6} {}", i + 1, status, frame.action.label()));
        if let Some(locator) = frame.action.locator() {
            out.push_str(&format!("  {}", locator));
        }
        if let Some(error) = &frame.error {
            out.push_str(&format!(
                "  {}: {}",
                error.kind,
                error.message.as_deref().unwrap_or_default()
            ));
        }
        out.push('\n');
    }
    out
}
