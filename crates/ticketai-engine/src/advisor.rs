//! Ticket-assignment advisor
//!
//! Never fails because of the model: missing configuration, transport errors
//! and unusable answers all become fallback suggestions. Only database
//! errors and cancellation reach the caller as `Err`.

use rusqlite::Connection;
use std::sync::Arc;
use std::time::Instant;
use ticketai_core::errors::{ExErrorKind, Result};
use ticketai_core::prompt::build_assign_prompt;
use ticketai_core::schema;
use ticketai_core::{
    log_op_end, log_op_error, log_op_start, precheck, select_candidate, AssignCandidate,
    AssignDecision, FallbackReason, TicketBrief, TicketStatus,
};
use ticketai_core_types::RequestContext;
use ticketai_store::tickets::{load_ticket, top_employees, DEFAULT_CANDIDATE_LIMIT};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::model::{complete_with_cancel, ModelClient};

pub struct AssignAdvisor {
    model: Option<Arc<dyn ModelClient>>,
    candidate_limit: usize,
}

impl AssignAdvisor {
    /// `model` is `None` when the model configuration is incomplete
    pub fn new(model: Option<Arc<dyn ModelClient>>, candidate_limit: usize) -> Self {
        Self {
            model,
            candidate_limit: if candidate_limit == 0 {
                DEFAULT_CANDIDATE_LIMIT
            } else {
                candidate_limit
            },
        }
    }

    pub fn candidate_limit(&self) -> usize {
        self.candidate_limit
    }

    /// Suggest an assignee for a stored ticket
    ///
    /// # Errors
    ///
    /// `Persistence` if the ticket or candidates cannot be read, `Cancelled`
    /// if `cancel` fires during the model call.
    pub async fn suggest(
        &self,
        ctx: &RequestContext,
        ticket_id: i64,
        conn: &Connection,
        cancel: &CancellationToken,
    ) -> Result<AssignDecision> {
        let start = Instant::now();
        log_op_start!("assign_suggest", request_id = %ctx.request_id, ticket_id = ticket_id);

        let result = self.suggest_stored(ctx, ticket_id, conn, cancel).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(decision) => {
                if let Some(reason) = decision.fallback_reason() {
                    log_fallback(ctx, ticket_id, reason);
                }
                log_op_end!(
                    "assign_suggest",
                    duration_ms = duration_ms,
                    request_id = %ctx.request_id,
                    ticket_id = ticket_id,
                    is_fallback = decision.is_fallback()
                );
            }
            Err(e) => {
                log_op_error!(
                    "assign_suggest",
                    e.clone().with_request_id(ctx.request_id.clone()),
                    duration_ms = duration_ms
                );
            }
        }

        result
    }

    async fn suggest_stored(
        &self,
        ctx: &RequestContext,
        ticket_id: i64,
        conn: &Connection,
        cancel: &CancellationToken,
    ) -> Result<AssignDecision> {
        let Some(ticket) = load_ticket(conn, ticket_id)? else {
            return Ok(AssignDecision::unassigned(FallbackReason::TicketNotFound));
        };

        // Closed tickets never need the ranking query
        if ticket.status == TicketStatus::Closed {
            return Ok(AssignDecision::unassigned(FallbackReason::TicketClosed));
        }

        let candidates = top_employees(conn, self.candidate_limit)?;
        info!(
            component = module_path!(),
            op = "assign_suggest",
            request_id = %ctx.request_id,
            ticket_id = ticket_id,
            candidate_count = candidates.len(),
            "candidates ranked"
        );

        self.suggest_for(ctx, &ticket, &candidates, cancel).await
    }

    /// Suggest an assignee from an already loaded ticket and candidate list
    ///
    /// # Errors
    ///
    /// `Cancelled` if `cancel` fires during the model call.
    pub async fn suggest_for(
        &self,
        ctx: &RequestContext,
        ticket: &TicketBrief,
        candidates: &[AssignCandidate],
        cancel: &CancellationToken,
    ) -> Result<AssignDecision> {
        if let Some(decision) = precheck(ticket, candidates) {
            return Ok(decision);
        }

        let Some(model) = &self.model else {
            return Ok(AssignDecision::unassigned(FallbackReason::ModelNotConfigured));
        };

        let prompt = build_assign_prompt(ticket, candidates);
        match complete_with_cancel(ctx, model.as_ref(), &prompt, cancel).await {
            Ok(reply) => Ok(select_candidate(candidates, &reply)),
            Err(e) if e.kind() == ExErrorKind::Cancelled => Err(e),
            Err(e) => Ok(AssignDecision::unassigned(FallbackReason::TransportFailure(
                e.message().to_string(),
            ))),
        }
    }
}

fn log_fallback(ctx: &RequestContext, ticket_id: i64, reason: &FallbackReason) {
    info!(
        component = module_path!(),
        op = "assign_suggest",
        event = schema::EVENT_FALLBACK,
        request_id = %ctx.request_id,
        ticket_id = ticket_id,
        reason = reason.label(),
    );
}
