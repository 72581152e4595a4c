//! TicketAI Core - pure pipeline stages for model-mediated queries
//!
//! This crate holds everything that runs between "the model answered" and
//! "SQL text exists", with no I/O:
//! - Extraction of JSON payloads from free-form model output
//! - Plan decoding, fragment normalization and the validator trust boundary
//! - The immutable view registry shared by every request
//! - Quality evaluation of report answers
//! - Candidate selection for the ticket-assignment advisor
//! - Prompt builders, the error facility and the logging facility

pub mod assign;
pub mod errors;
pub mod extract;
pub mod logging_facility;
pub mod normalize;
pub mod plan;
pub mod prompt;
pub mod quality;
pub mod registry;
pub mod ticket;
pub mod validate;

// Used by the logging macros as `$crate::schema`
pub use ticketai_core_types::schema;

// Re-export commonly used types
pub use assign::{precheck, select_candidate, AssignDecision, AssignSuggestion, FallbackReason};
pub use errors::{DecodeError, ExError, ExErrorKind, Result, ValidationError};
pub use extract::extract_json;
pub use normalize::normalize_fragment;
pub use plan::{decode_plan, QueryPlan};
pub use quality::{QualityEvaluator, QualityVerdict};
pub use registry::ViewRegistry;
pub use ticket::{AssignCandidate, TicketBrief, TicketComment, TicketStatus};
pub use validate::{PlanValidator, ValidatedPlan};
