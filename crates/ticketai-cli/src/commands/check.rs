//! Offline plan check
//!
//! Runs the normalizer and the validator over a view/fragment pair and
//! prints the statement the executor would run. Nothing touches the
//! database.

use clap::Args;
use std::sync::Arc;
use ticketai_core::{normalize_fragment, ExError, PlanValidator, QueryPlan};
use ticketai_engine::Config;
use ticketai_store::views::build_statement;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// View name as the model would propose it
    #[arg(long)]
    pub view: String,

    /// Fragment as the model would propose it
    #[arg(long, default_value = "")]
    pub fragment: String,
}

pub fn execute(args: CheckArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(config.view_registry()?);
    let validator = PlanValidator::new(registry.clone());

    let normalized = normalize_fragment(&args.fragment);
    println!("Normalized fragment: {:?}", normalized);
    if !args.fragment.trim().is_empty() && normalized.is_empty() {
        println!("  Note: the fragment had no WHERE/ORDER BY and was discarded");
    }

    let plan = validator
        .validate(&QueryPlan::new(&args.view, normalized))
        .map_err(|e| {
            ExError::from(e)
                .with_view(args.view.trim())
                .with_fragment(args.fragment.trim())
        })?;

    println!("Accepted");
    println!("  View: {}", plan.view());
    println!("  Statement: {}", build_statement(&registry, &plan));

    Ok(())
}
