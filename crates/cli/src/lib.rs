pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "amica",
    about = "Amica routing operator CLI",
    long_about = "Inspect intent routing decisions, effective configuration, and runtime readiness.",
    after_help = "Examples:\n  amica route \"remind me to take aspirin at 8am\"\n  amica route \"yes\" --screen info\n  amica config\n  amica doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Classify one utterance and print the routing decision as JSON")]
    Route {
        #[arg(help = "Transcribed utterance to classify")]
        utterance: String,
        #[arg(long, default_value = "home", help = "Screen the utterance was spoken on")]
        screen: String,
        #[arg(long, help = "Run a full turn against the configured collaborator services")]
        live: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and collaborator endpoint readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = amica_core::config::AppConfig::load(Default::default()) {
        amica_agent::telemetry::init_logging(&config.logging);
    }

    let result = match cli.command {
        Command::Route { utterance, screen, live } => {
            if live {
                commands::route::run_live(&utterance, &screen)
            } else {
                commands::route::run(&utterance, &screen)
            }
        }
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
