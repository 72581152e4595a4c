//! Natural-language report command

use clap::Args;
use std::sync::Arc;
use ticketai_core_types::RequestContext;
use ticketai_engine::{Config, GeminiClient, ReportPipeline};
use ticketai_store::db;

use super::cancel_on_ctrl_c;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// The request, e.g. "open tickets for PrintHub"
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

pub async fn execute(args: ReportArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(config.view_registry()?);
    let model = Arc::new(GeminiClient::new(&config.model)?);
    let pipeline = ReportPipeline::new(model, registry);

    let conn = db::open_read_only(&config.database.path)?;
    let cancel = cancel_on_ctrl_c();
    let ctx = RequestContext::new();

    let prompt = args.prompt.join(" ");
    match pipeline.run(&ctx, &prompt, &conn, &cancel).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(failure) => {
            println!("{}", serde_json::to_string_pretty(&failure)?);
            Err(failure.into())
        }
    }
}
