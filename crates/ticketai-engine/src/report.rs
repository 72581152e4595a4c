//! Natural-language reporting pipeline
//!
//! prompt -> model -> extract -> decode -> normalize -> validate -> execute
//! -> quality. Only an empty prompt, a validation rejection or an execution
//! failure produce a [`ReportFailure`]; every way the model can answer badly
//! ends in a successful response flagged as fallback.

use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use ticketai_core::errors::{ExError, ExErrorKind};
use ticketai_core::prompt::build_report_prompt;
use ticketai_core::schema;
use ticketai_core::{
    decode_plan, extract_json, log_op_end, log_op_error, log_op_start, normalize_fragment,
    PlanValidator, QualityEvaluator, QualityVerdict, QueryPlan, ViewRegistry,
};
use ticketai_core_types::RequestContext;
use ticketai_store::{execute_plan, ReportRows};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::model::{cancelled, complete_with_cancel, ModelClient};

pub const ERROR_PROMPT_REQUIRED: &str = "Prompt is required.";
pub const ERROR_EXECUTION_FAILED: &str = "SQL execution failed.";
pub const WARNING_NO_PLAN: &str =
    "AI did not choose a view. Try again or describe what you need in more detail.";
pub const WARNING_FRAGMENT_DISCARDED: &str = "AI returned a filter that could not be used; \
showing unfiltered results. Try again or describe what you need in more detail.";

/// Successful report answer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub view: String,
    pub fragment: String,
    pub data: Option<ReportRows>,
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Cleaned model output, kept when it could not be decoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl ReportResponse {
    fn fallback(view: &str, fragment: &str, warning: impl Into<String>) -> Self {
        Self {
            view: view.to_string(),
            fragment: fragment.to_string(),
            data: None,
            is_fallback: true,
            warning: Some(warning.into()),
            raw_text: None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.data.as_ref().map_or(0, ReportRows::len)
    }
}

/// Fatal report outcome, surfaced with the plan that was attempted
#[derive(Debug, Clone, Serialize)]
pub struct ReportFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    #[serde(skip)]
    kind: ExErrorKind,
}

impl ReportFailure {
    fn new(kind: ExErrorKind, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            view: None,
            fragment: None,
            kind,
        }
    }

    fn with_plan(mut self, view: &str, fragment: &str) -> Self {
        self.view = Some(view.to_string());
        self.fragment = Some(fragment.to_string());
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }
}

impl std::fmt::Display for ReportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.error)?;
        if let Some(details) = &self.details {
            write!(f, " {details}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ReportFailure {}

impl From<ExError> for ReportFailure {
    fn from(err: ExError) -> Self {
        Self {
            error: err.message().to_string(),
            details: None,
            view: err.view().map(str::to_string),
            fragment: err.fragment().map(str::to_string),
            kind: err.kind(),
        }
    }
}

impl From<ReportFailure> for ExError {
    fn from(failure: ReportFailure) -> Self {
        let mut message = failure.error;
        if let Some(details) = failure.details {
            message = format!("{message} {details}");
        }
        let mut err = ExError::new(failure.kind)
            .with_op("report")
            .with_message(message);
        if let Some(view) = failure.view {
            err = err.with_view(view);
        }
        if let Some(fragment) = failure.fragment {
            err = err.with_fragment(fragment);
        }
        err
    }
}

pub struct ReportPipeline {
    model: Arc<dyn ModelClient>,
    validator: PlanValidator,
    quality: QualityEvaluator,
}

impl ReportPipeline {
    pub fn new(model: Arc<dyn ModelClient>, registry: Arc<ViewRegistry>) -> Self {
        Self {
            model,
            validator: PlanValidator::new(registry),
            quality: QualityEvaluator::standard(),
        }
    }

    pub fn with_quality(mut self, quality: QualityEvaluator) -> Self {
        self.quality = quality;
        self
    }

    pub fn registry(&self) -> &Arc<ViewRegistry> {
        self.validator.registry()
    }

    /// Answer a natural-language report request
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty prompt
    /// - a validation kind when the model's plan is rejected
    /// - `Persistence` when the validated query fails
    /// - `Cancelled` when `cancel` fires before SQL runs
    pub async fn run(
        &self,
        ctx: &RequestContext,
        user_prompt: &str,
        conn: &Connection,
        cancel: &CancellationToken,
    ) -> Result<ReportResponse, ReportFailure> {
        let start = Instant::now();
        log_op_start!("report", request_id = %ctx.request_id);

        let result = self.run_inner(ctx, user_prompt, conn, cancel).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => {
                log_op_end!(
                    "report",
                    duration_ms = duration_ms,
                    request_id = %ctx.request_id,
                    view = %response.view,
                    row_count = response.row_count(),
                    is_fallback = response.is_fallback
                );
            }
            Err(failure) => {
                log_op_error!(
                    "report",
                    ExError::from(failure.clone()).with_request_id(ctx.request_id.clone()),
                    duration_ms = duration_ms
                );
            }
        }

        result
    }

    async fn run_inner(
        &self,
        ctx: &RequestContext,
        user_prompt: &str,
        conn: &Connection,
        cancel: &CancellationToken,
    ) -> Result<ReportResponse, ReportFailure> {
        if user_prompt.trim().is_empty() {
            return Err(ReportFailure::new(
                ExErrorKind::InvalidInput,
                ERROR_PROMPT_REQUIRED,
            ));
        }

        let prompt = build_report_prompt(self.registry(), user_prompt);
        let reply = match complete_with_cancel(ctx, self.model.as_ref(), &prompt, cancel).await {
            Ok(reply) => reply,
            Err(e) if e.kind() == ExErrorKind::Cancelled => return Err(e.into()),
            Err(e) => {
                log_fallback(ctx, "transport_failure");
                return Ok(ReportResponse::fallback("", "", e.message()));
            }
        };

        let json = extract_json(&reply);
        let plan = match decode_plan(&json) {
            Ok(plan) => plan,
            Err(e) => {
                log_fallback(ctx, "decode_failure");
                let mut response =
                    ReportResponse::fallback("", "", format!("Failed to parse AI JSON: {e}"));
                response.raw_text = Some(json);
                return Ok(response);
            }
        };

        if plan.is_empty() {
            log_fallback(ctx, "no_view");
            return Ok(ReportResponse::fallback("", "", WARNING_NO_PLAN));
        }

        let fragment = normalize_fragment(&plan.fragment);
        let discarded = !plan.fragment.trim().is_empty() && fragment.is_empty();
        let candidate = QueryPlan::new(plan.view.trim(), fragment);

        let validated = self.validator.validate(&candidate).map_err(|e| {
            warn!(
                component = module_path!(),
                op = "report",
                event = schema::EVENT_REJECTED,
                request_id = %ctx.request_id,
                view = %candidate.view,
                fragment = %candidate.fragment,
                err.kind = ?e.kind(),
                err.code = e.kind().code(),
            );
            ReportFailure::new(e.kind(), e.to_string())
                .with_plan(&candidate.view, &candidate.fragment)
        })?;

        // Last exit before SQL text reaches the database
        if cancel.is_cancelled() {
            return Err(ReportFailure::from(cancelled("report"))
                .with_plan(validated.view(), validated.fragment()));
        }

        let executed = execute_plan(conn, self.registry(), &validated).map_err(|e| {
            let mut failure = ReportFailure::new(e.kind(), ERROR_EXECUTION_FAILED)
                .with_plan(validated.view(), validated.fragment());
            failure.details = Some(e.message().to_string());
            failure
        })?;

        let verdict = if discarded {
            QualityVerdict::fallback(WARNING_FRAGMENT_DISCARDED)
        } else {
            self.quality
                .evaluate(validated.fragment(), executed.row_count())
        };
        if verdict.is_fallback {
            log_fallback(ctx, if discarded { "fragment_discarded" } else { "low_quality" });
        }

        Ok(ReportResponse {
            view: executed.view,
            fragment: executed.fragment,
            data: Some(executed.rows),
            is_fallback: verdict.is_fallback,
            warning: verdict.warning,
            raw_text: None,
        })
    }
}

fn log_fallback(ctx: &RequestContext, reason: &str) {
    info!(
        component = module_path!(),
        op = "report",
        event = schema::EVENT_FALLBACK,
        request_id = %ctx.request_id,
        reason = reason,
    );
}
