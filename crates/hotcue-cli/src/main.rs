mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use hotcue_core::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "hotcue-mesh",
    about = "Route DJ hotcue events to OBS, lighting and network endpoints",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to the service config
    #[arg(long, global = true, env = "HOTCUE_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the orchestrator with its event and config intakes
    Serve {
        /// Override listen.events (TCP event stream)
        #[arg(long)]
        events_addr: Option<String>,

        /// Override listen.config (HTTP config push)
        #[arg(long)]
        config_addr: Option<String>,
    },

    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Inspect the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// List the configured destination targets
    Targets,

    /// Dry-run the matcher: which triggers would fire for an event
    Match {
        /// JSON file holding an array of triggers
        #[arg(long)]
        triggers: PathBuf,

        /// The event as a JSON object
        #[arg(long)]
        event: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let config = cli.config.as_path();
    let result = match cli.command {
        Commands::Serve {
            events_addr,
            config_addr,
        } => cmd::serve::run(config, events_addr, config_addr),
        Commands::Init { force } => cmd::init::run(config, force),
        Commands::Config { subcommand } => cmd::config::run(config, subcommand, cli.json),
        Commands::Targets => cmd::targets::run(config, cli.json),
        Commands::Match { triggers, event } => {
            cmd::matching::run(config, &triggers, &event, cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
