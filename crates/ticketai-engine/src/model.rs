//! Model client seam
//!
//! The model is an opaque text completion: one prompt in, free text out. Both
//! pipelines depend only on this trait, so tests can script the replies.

use async_trait::async_trait;
use std::time::Instant;
use ticketai_core::errors::{ExError, ExErrorKind, Result};
use ticketai_core::{log_op_end, log_op_error, log_op_start};
use ticketai_core_types::RequestContext;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Complete a prompt
    ///
    /// # Errors
    ///
    /// `ExternalService` for non-success responses, `Timeout` when the call
    /// exceeds its deadline, `Serialization` for unreadable response bodies.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub(crate) fn cancelled(op: &str) -> ExError {
    ExError::new(ExErrorKind::Cancelled)
        .with_op(op)
        .with_message("request cancelled")
}

/// Run one model call, abandoning it if `cancel` fires first
///
/// # Errors
///
/// `Cancelled` if the token fires before the model answers, otherwise
/// whatever the client returns.
pub async fn complete_with_cancel(
    ctx: &RequestContext,
    model: &dyn ModelClient,
    prompt: &str,
    cancel: &CancellationToken,
) -> Result<String> {
    let start = Instant::now();
    log_op_start!(
        "model_complete",
        request_id = %ctx.request_id,
        prompt_len = prompt.len()
    );

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancelled("model_complete")),
        reply = model.complete(prompt) => reply,
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    match &result {
        Ok(text) => {
            log_op_end!(
                "model_complete",
                duration_ms = duration_ms,
                request_id = %ctx.request_id,
                reply_len = text.len()
            );
        }
        Err(e) => {
            log_op_error!(
                "model_complete",
                e.clone().with_request_id(ctx.request_id.clone()),
                duration_ms = duration_ms
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ModelClient for Echo {
        async fn complete(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_uppercase())
        }
    }

    struct Never;

    #[async_trait]
    impl ModelClient for Never {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_completes_when_not_cancelled() {
        let ctx = RequestContext::new();
        let token = CancellationToken::new();
        let reply = complete_with_cancel(&ctx, &Echo, "hi", &token).await.unwrap();
        assert_eq!(reply, "HI");
    }

    #[tokio::test]
    async fn test_cancelled_token_wins_over_ready_reply() {
        let ctx = RequestContext::new();
        let token = CancellationToken::new();
        token.cancel();
        let err = complete_with_cancel(&ctx, &Echo, "hi", &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_call() {
        let ctx = RequestContext::new();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let err = complete_with_cancel(&ctx, &Never, "hi", &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Cancelled);
    }
}
