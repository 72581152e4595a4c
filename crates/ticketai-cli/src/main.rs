//! TicketAI CLI
//!
//! Command-line interface for the reporting pipeline and the assignment
//! advisor

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ticketai_core::logging_facility;
use ticketai_engine::config::{Config, DEFAULT_CONFIG_FILE};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "ticketai")]
#[command(about = "TicketAI - model-assisted ticket reporting and assignment", long_about = None)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Database path, overriding `[database] path`
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Init(commands::init::InitArgs),
    /// Answer a natural-language report request
    Report(commands::report::ReportArgs),
    /// Suggest an assignee for a ticket
    Suggest(commands::suggest::SuggestArgs),
    /// Normalize and validate a view/fragment pair without running it
    Check(commands::check::CheckArgs),
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env_overrides();
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    logging_facility::init(config.logging.profile());

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &config),
        Commands::Report(args) => commands::report::execute(args, &config).await,
        Commands::Suggest(args) => commands::suggest::execute(args, &config).await,
        Commands::Check(args) => commands::check::execute(args, &config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
