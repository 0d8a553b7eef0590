mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sluice",
    version,
    about = "Declarative ETL: assemble chains of components from a config and run them"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every chain in a configuration document
    Run {
        /// Path to the configuration YAML file
        config: PathBuf,
    },
    /// Assemble every configured chain without running it
    Check {
        /// Path to the configuration YAML file
        config: PathBuf,
    },
    /// List the available component classes
    Components,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run { config } => commands::run::execute(&config),
        Commands::Check { config } => commands::check::execute(&config),
        Commands::Components => {
            commands::components::execute();
            Ok(())
        }
    }
}
