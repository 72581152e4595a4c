//! TicketAI Engine - async orchestration of the query pipelines
//!
//! Provides:
//! - Configuration loading (`ticketai.toml` plus environment overrides)
//! - The `ModelClient` seam and its Gemini implementation
//! - The reporting pipeline (`ReportPipeline`)
//! - The ticket-assignment advisor (`AssignAdvisor`)

pub mod advisor;
pub mod config;
pub mod gemini;
pub mod model;
pub mod report;

pub use advisor::AssignAdvisor;
pub use config::Config;
pub use gemini::GeminiClient;
pub use model::{complete_with_cancel, ModelClient};
pub use report::{ReportFailure, ReportPipeline, ReportResponse};
