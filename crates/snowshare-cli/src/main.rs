//! snowshare CLI
//!
//! Command-line interface for reader-account provisioning

use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Debug, Parser)]
#[command(name = "snowshare")]
#[command(about = "Snowflake reader account and share provisioning", long_about = None)]
struct Cli {
    /// Emit JSON structured logs instead of human-readable output
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full provisioning pipeline
    Provision(commands::provision::ProvisionArgs),
    /// Load and validate a configuration file without touching anything
    CheckConfig(commands::check_config::CheckConfigArgs),
}

fn main() {
    let cli = Cli::parse();
    logging::init(if cli.json_logs {
        logging::Profile::Production
    } else {
        logging::Profile::Development
    });

    let result = match cli.command {
        Commands::Provision(args) => commands::provision::execute(args),
        Commands::CheckConfig(args) => commands::check_config::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
