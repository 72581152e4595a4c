//! Assignment suggestion command

use clap::Args;
use std::sync::Arc;
use ticketai_core_types::RequestContext;
use ticketai_engine::{AssignAdvisor, Config, GeminiClient, ModelClient};
use ticketai_store::db;

use super::cancel_on_ctrl_c;

#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Ticket id
    pub ticket_id: i64,
}

pub async fn execute(args: SuggestArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // An incomplete model section still yields a (fallback) answer
    let model: Option<Arc<dyn ModelClient>> = if config.model.is_complete() {
        Some(Arc::new(GeminiClient::new(&config.model)?))
    } else {
        None
    };
    let advisor = AssignAdvisor::new(model, config.advisor.candidate_limit);

    let conn = db::open_read_only(&config.database.path)?;
    let cancel = cancel_on_ctrl_c();
    let ctx = RequestContext::new();

    let decision = advisor.suggest(&ctx, args.ticket_id, &conn, &cancel).await?;
    if let Some(reason) = decision.fallback_reason() {
        eprintln!("Fallback: {}", reason.label());
    }
    println!("{}", serde_json::to_string_pretty(decision.suggestion())?);

    Ok(())
}
