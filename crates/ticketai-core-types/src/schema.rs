//! Canonical schema constants for structured logging
//!
//! Every log line emitted by the pipelines uses these keys so that report
//! and assignment traces can be filtered the same way.

// Canonical field keys
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Plan context
pub const FIELD_VIEW: &str = "view";
pub const FIELD_FRAGMENT: &str = "fragment";
pub const FIELD_ROW_COUNT: &str = "row_count";

// Assignment context
pub const FIELD_TICKET_ID: &str = "ticket_id";
pub const FIELD_CANDIDATE_COUNT: &str = "candidate_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_FALLBACK: &str = "fallback";
pub const EVENT_REJECTED: &str = "rejected";
