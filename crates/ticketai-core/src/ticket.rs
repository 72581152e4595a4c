//! Ticket domain types seen by the pipelines
//!
//! These are read models: the store fills them, the prompt builders and the
//! candidate selector consume them. Nothing here is persisted back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticket lifecycle status, stored as an integer column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum TicketStatus {
    New = 0,
    InProgress = 1,
    WaitingClient = 2,
    Resolved = 3,
    Closed = 4,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::New,
        TicketStatus::InProgress,
        TicketStatus::WaitingClient,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            TicketStatus::New => "New",
            TicketStatus::InProgress => "InProgress",
            TicketStatus::WaitingClient => "WaitingClient",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
        }
    }

    /// Statuses counted as "open" in reports
    pub fn is_open(self) -> bool {
        matches!(
            self,
            TicketStatus::New | TicketStatus::InProgress | TicketStatus::WaitingClient
        )
    }
}

impl From<TicketStatus> for i64 {
    fn from(s: TicketStatus) -> i64 {
        s.code()
    }
}

impl TryFrom<i64> for TicketStatus {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        TicketStatus::from_code(code).ok_or_else(|| format!("unknown ticket status code {code}"))
    }
}

/// A comment on a ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketComment {
    pub created_at: DateTime<Utc>,
    pub text: String,
}

/// The slice of a ticket the assignment advisor needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketBrief {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub product_name: Option<String>,
    /// In storage order; the prompt builder sorts newest first.
    pub comments: Vec<TicketComment>,
}

/// An employee eligible to take a ticket, with workload counters
///
/// Candidate lists arrive pre-ranked: index 0 is the top candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignCandidate {
    pub employee_id: i64,
    pub employee_name: String,
    pub assigned_count: i64,
    pub closed_count: i64,
}
