//! Candidate selection for the assignment advisor
//!
//! The model's answer is advisory. Whatever it says, the outcome names an
//! employee from the candidate list or no employee at all; an id the model
//! invented is replaced by the top-ranked candidate and flagged as fallback.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DecodeError;
use crate::extract::extract_json;
use crate::plan::decode_object;
use crate::ticket::{AssignCandidate, TicketBrief, TicketStatus};

pub const DEFAULT_INVALID_CANDIDATE_WARNING: &str = "AI did not return a valid candidate id.";
pub const DEFAULT_FALLBACK_REASON: &str = "Fallback selection based on top employees list.";

/// Advisor result as returned to callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignSuggestion {
    pub suggested_employee_id: Option<i64>,
    pub suggested_employee_name: Option<String>,
    pub confidence: f64,
    pub reason: String,
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip)]
    pub raw_text: Option<String>,
}

/// Why a suggestion is a fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    TicketNotFound,
    TicketClosed,
    NoCandidates,
    ModelNotConfigured,
    /// The model call failed; carries the transport description
    TransportFailure(String),
    /// The extracted text was not a JSON object
    DecodeFailure(String),
    /// Missing id, or an id outside the candidate set
    InvalidCandidate,
}

impl FallbackReason {
    /// Warning shown to the caller
    pub fn warning(&self) -> String {
        match self {
            FallbackReason::TicketNotFound => "Ticket not found.".to_string(),
            FallbackReason::TicketClosed => "Ticket is closed.".to_string(),
            FallbackReason::NoCandidates => "No employee candidates available.".to_string(),
            FallbackReason::ModelNotConfigured => {
                "Model configuration is missing (base_url/api_key/model).".to_string()
            }
            FallbackReason::TransportFailure(detail) => detail.clone(),
            FallbackReason::DecodeFailure(detail) => format!("Failed to parse AI JSON: {detail}"),
            FallbackReason::InvalidCandidate => DEFAULT_INVALID_CANDIDATE_WARNING.to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FallbackReason::TicketNotFound => "ticket_not_found",
            FallbackReason::TicketClosed => "ticket_closed",
            FallbackReason::NoCandidates => "no_candidates",
            FallbackReason::ModelNotConfigured => "model_not_configured",
            FallbackReason::TransportFailure(_) => "transport_failure",
            FallbackReason::DecodeFailure(_) => "decode_failure",
            FallbackReason::InvalidCandidate => "invalid_candidate",
        }
    }
}

/// Advisor outcome
#[derive(Debug, Clone, PartialEq)]
pub enum AssignDecision {
    /// The model picked a member of the candidate set
    Confident(AssignSuggestion),
    Fallback {
        suggestion: AssignSuggestion,
        reason: FallbackReason,
    },
}

impl AssignDecision {
    /// Fallback with no suggested employee, warning derived from `reason`
    pub fn unassigned(reason: FallbackReason) -> Self {
        let suggestion = AssignSuggestion {
            is_fallback: true,
            warning: Some(reason.warning()),
            ..AssignSuggestion::default()
        };
        AssignDecision::Fallback { suggestion, reason }
    }

    pub fn suggestion(&self) -> &AssignSuggestion {
        match self {
            AssignDecision::Confident(s) => s,
            AssignDecision::Fallback { suggestion, .. } => suggestion,
        }
    }

    pub fn into_suggestion(self) -> AssignSuggestion {
        match self {
            AssignDecision::Confident(s) => s,
            AssignDecision::Fallback { suggestion, .. } => suggestion,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AssignDecision::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            AssignDecision::Confident(_) => None,
            AssignDecision::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// Outcomes decided before any model call
///
/// A closed ticket or an empty candidate list never reaches the model.
pub fn precheck(ticket: &TicketBrief, candidates: &[AssignCandidate]) -> Option<AssignDecision> {
    if ticket.status == TicketStatus::Closed {
        return Some(AssignDecision::unassigned(FallbackReason::TicketClosed));
    }
    if candidates.is_empty() {
        return Some(AssignDecision::unassigned(FallbackReason::NoCandidates));
    }
    None
}

/// Decoded model reply; every field optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionReply {
    pub suggested_employee_id: Option<i64>,
    pub confidence: Option<f64>,
    pub reason: Option<String>,
    pub warning: Option<String>,
}

/// Decode the advisor reply
///
/// Keys match case-insensitively. Ids and confidences given as numeric
/// strings are accepted; anything else of the wrong type reads as absent.
///
/// # Errors
///
/// [`DecodeError`] when the text is not a JSON object.
pub fn decode_suggestion(json: &str) -> Result<SuggestionReply, DecodeError> {
    let map = decode_object(json)?;

    Ok(SuggestionReply {
        suggested_employee_id: map.get("suggestedemployeeid").and_then(as_i64),
        confidence: map.get("confidence").and_then(as_f64),
        reason: map.get("reason").and_then(as_string),
        warning: map.get("warning").and_then(as_string),
    })
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Clamp into `[0, 1]`; NaN reads as 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Turn raw model output into a decision over `candidates`
///
/// `candidates` is ranked; index 0 is the fallback pick. An empty list
/// yields [`FallbackReason::NoCandidates`].
pub fn select_candidate(candidates: &[AssignCandidate], raw_text: &str) -> AssignDecision {
    let Some(top) = candidates.first() else {
        return AssignDecision::unassigned(FallbackReason::NoCandidates);
    };

    let cleaned = extract_json(raw_text);

    let reply = match decode_suggestion(&cleaned) {
        Ok(reply) => reply,
        Err(err) => {
            let reason = FallbackReason::DecodeFailure(err.to_string());
            let suggestion = AssignSuggestion {
                is_fallback: true,
                warning: Some(reason.warning()),
                raw_text: Some(cleaned),
                ..AssignSuggestion::default()
            };
            return AssignDecision::Fallback { suggestion, reason };
        }
    };

    let confidence = clamp_confidence(reply.confidence.unwrap_or(0.0));
    let chosen = reply
        .suggested_employee_id
        .and_then(|id| candidates.iter().find(|c| c.employee_id == id));

    match chosen {
        Some(candidate) => AssignDecision::Confident(AssignSuggestion {
            suggested_employee_id: Some(candidate.employee_id),
            suggested_employee_name: Some(candidate.employee_name.clone()),
            confidence,
            reason: reply.reason.unwrap_or_default(),
            is_fallback: false,
            warning: reply.warning,
            raw_text: Some(cleaned),
        }),
        None => AssignDecision::Fallback {
            suggestion: AssignSuggestion {
                suggested_employee_id: Some(top.employee_id),
                suggested_employee_name: Some(top.employee_name.clone()),
                confidence,
                reason: reply
                    .reason
                    .unwrap_or_else(|| DEFAULT_FALLBACK_REASON.to_string()),
                is_fallback: true,
                warning: Some(
                    reply
                        .warning
                        .unwrap_or_else(|| DEFAULT_INVALID_CANDIDATE_WARNING.to_string()),
                ),
                raw_text: Some(cleaned),
            },
            reason: FallbackReason::InvalidCandidate,
        },
    }
}
