//! Prompt builders for the two model calls
//!
//! Both prompts follow the same layout: fixed instructions, a
//! `USER REQUEST:` separator, then request-specific text.

use crate::registry::ViewRegistry;
use crate::ticket::{AssignCandidate, TicketBrief};

pub const USER_REQUEST_SEPARATOR: &str = "\nUSER REQUEST:\n";

/// Comments included in the assignment prompt
pub const PROMPT_COMMENT_LIMIT: usize = 3;

/// Plan proposed when the request cannot be mapped to a view
pub const UNCLEAR_REQUEST_VIEW: &str = "vw_Tickets_AI_Report";
pub const UNCLEAR_REQUEST_FRAGMENT: &str = "ORDER BY CreatedAt DESC";

/// Prompt asking the model for a `{view, fragment}` plan
pub fn build_report_prompt(registry: &ViewRegistry, user_prompt: &str) -> String {
    let views = registry.views().collect::<Vec<_>>().join(", ");

    let system = format!(
        r#"You output ONLY JSON. No markdown. No extra text.

Choose ONE view from:
[{views}]

Return JSON exactly like:
{{ "view": "vw_Tickets_AI_Report", "fragment": "WHERE Status IN (0,1,2) ORDER BY CreatedAt DESC" }}

Fragment rules:
- Fragment can be empty "" OR must start with WHERE or ORDER BY.
- Do NOT use any of these: SELECT, FROM, JOIN, UNION, INSERT, UPDATE, DELETE, DROP, ALTER, EXEC, WITH, /*, --, ;
- Fragment must NOT mention dbo. or vw_ or any table/view name.

Tickets Status is INT:
0 New, 1 InProgress, 2 WaitingClient, 3 Resolved, 4 Closed
Open tickets = Status IN (0,1,2)
Closed tickets = Status = 4
Resolved (not closed) = Status = 3
DO NOT compare Status to text like 'Open' or 'Closed'.

Examples:
User: show open tickets
Output: {{ "view": "vw_Tickets_AI_Report", "fragment": "WHERE Status IN (0,1,2) ORDER BY CreatedAt DESC" }}

User: show active users
Output: {{ "view": "vw_Users_AI_Safe", "fragment": "WHERE IsActive = 1 ORDER BY CreatedAt DESC" }}

If user request is unclear, return:
{{ "view": "{UNCLEAR_REQUEST_VIEW}", "fragment": "{UNCLEAR_REQUEST_FRAGMENT}" }}
"#
    );

    format!("{system}{USER_REQUEST_SEPARATOR}{}", user_prompt.trim())
}

const ASSIGN_INSTRUCTIONS: &str = r#"You are a support manager assistant.

Return ONLY valid JSON. No markdown. No code fences. No explanations.

JSON schema:
{
  "suggestedEmployeeId": 123,
  "confidence": 0.0,
  "reason": "short reason",
  "warning": null
}

Rules:
- suggestedEmployeeId MUST be one of the candidate IDs provided.
- confidence is between 0.0 and 1.0
- reason must be concise and practical for assigning the ticket.
- If uncertain, set suggestedEmployeeId to null and add warning.
"#;

/// Prompt asking the model to pick one of `candidates` for `ticket`
pub fn build_assign_prompt(ticket: &TicketBrief, candidates: &[AssignCandidate]) -> String {
    let mut comments: Vec<_> = ticket.comments.iter().collect();
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let comment_lines: Vec<String> = comments
        .into_iter()
        .take(PROMPT_COMMENT_LIMIT)
        .map(|c| format!("- ({}) {}", c.created_at.format("%Y-%m-%d %H:%M:%SZ"), c.text))
        .collect();
    let comment_block = if comment_lines.is_empty() {
        "- none".to_string()
    } else {
        comment_lines.join("\n")
    };

    let candidate_block = candidates
        .iter()
        .map(|c| {
            format!(
                "- Id={}, Name={}, Assigned={}, Closed={}",
                c.employee_id, c.employee_name, c.assigned_count, c.closed_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let user = format!(
        "TICKET:\n\
         - Id: {}\n\
         - Title: {}\n\
         - Description: {}\n\
         - Product: {}\n\
         \n\
         LAST COMMENTS (if any):\n\
         {comment_block}\n\
         \n\
         CANDIDATE EMPLOYEES (choose ONLY from these IDs):\n\
         {candidate_block}\n",
        ticket.id,
        ticket.title,
        ticket.description,
        ticket.product_name.as_deref().unwrap_or_default(),
    );

    format!("{ASSIGN_INSTRUCTIONS}{USER_REQUEST_SEPARATOR}{user}")
}
