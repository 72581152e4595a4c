//! Database initialization command

use clap::Args;
use ticketai_engine::Config;
use ticketai_store::{db, demo, migrations};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Load the demo dataset after migrating
    #[arg(long)]
    pub demo: bool,
}

pub fn execute(args: InitArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut conn = db::open(path)?;
    migrations::apply_migrations(&mut conn)?;
    let applied = migrations::applied_migrations(&conn)?;

    println!("Database ready: {}", path.display());
    println!("  Migrations applied: {}", applied.join(", "));

    if args.demo {
        let summary = demo::seed_demo(&mut conn)?;
        println!(
            "  Demo data: {} users, {} products, {} tickets, {} comments",
            summary.users, summary.products, summary.tickets, summary.comments
        );
    }

    Ok(())
}
