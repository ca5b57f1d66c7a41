use clap::Parser;
use scenario_explorer::cli::commands::{cmd_explore, cmd_parse, cmd_replay};
use scenario_explorer::cli::config::{Cli, Commands, OracleSettings, load_config, verbosity_filter};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());

    // Resolve oracle settings: CLI > config > env > defaults
    let settings = OracleSettings::resolve(&cli, &config.oracle, |key| std::env::var(key).ok())?;
    let journal = cli.journal.as_deref();

    match &cli.command {
        Commands::Parse { scenario, output } => {
            cmd_parse(scenario, output.as_deref(), &settings)?;
        }
        Commands::Explore { scenario, output } => {
            let complete = cmd_explore(scenario, output, &settings, &config, journal)?;
            if !complete {
                std::process::exit(1);
            }
        }
        Commands::Replay { trace, output } => {
            let complete = cmd_replay(trace, output, &settings, &config, journal)?;
            if !complete {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the `-v` count picks the level. Logs go to stderr.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
