#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{
    demo_db, registry, transport_error, CancellingModel, PendingModel, ScriptedModel, PRODUCTS,
    TICKETS, USERS,
};
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;
use ticketai_core::errors::ExErrorKind;
use ticketai_core::logging_facility::test_capture::init_test_capture;
use ticketai_core::quality::{WARNING_GENERIC_ANSWER, WARNING_NO_RESULTS};
use ticketai_core_types::schema::{EVENT_FALLBACK, EVENT_REJECTED};
use ticketai_core_types::{RequestContext, RequestId};
use ticketai_engine::report::{
    ERROR_EXECUTION_FAILED, ERROR_PROMPT_REQUIRED, WARNING_FRAGMENT_DISCARDED, WARNING_NO_PLAN,
};
use ticketai_engine::{ReportPipeline, ReportResponse};
use ticketai_store::{migrations, ReportRows};
use tokio_util::sync::CancellationToken;

fn pipeline(model: Arc<ScriptedModel>) -> ReportPipeline {
    ReportPipeline::new(model, registry(50))
}

async fn ask(model: Arc<ScriptedModel>, prompt: &str) -> ReportResponse {
    let conn = demo_db();
    pipeline(model)
        .run(&RequestContext::new(), prompt, &conn, &CancellationToken::new())
        .await
        .expect("report should succeed")
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_closed_tickets_report() {
    let model = ScriptedModel::replying(
        "```json\n{\"view\": \"vw_tickets_ai_report\", \"fragment\": \"WHERE Status = 'Closed' ORDER BY Id\"}\n```",
    );
    let response = ask(model.clone(), "show me closed tickets").await;

    assert_eq!(response.view, TICKETS);
    assert_eq!(response.fragment, "WHERE Status = 4 ORDER BY Id");
    assert!(!response.is_fallback);
    assert_eq!(response.warning, None);

    let Some(ReportRows::Tickets(rows)) = &response.data else {
        panic!("expected ticket rows, got {:?}", response.data);
    };
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.status == 4));
    assert_eq!(rows[0].title, "Mailbox quota");

    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_prose_around_plan_is_ignored() {
    let model = ScriptedModel::replying(
        "Sure! Here is the plan: {\"VIEW\": \"vw_Users_AI_Safe\", \"Fragment\": \"where IsActive = 1 and UserType = 1\"} Hope that helps.",
    );
    let response = ask(model, "active support staff").await;

    assert_eq!(response.view, USERS);
    assert_eq!(response.fragment, "WHERE IsActive = 1 and UserType = 1");
    let Some(ReportRows::Users(rows)) = &response.data else {
        panic!("expected user rows");
    };
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_prompt_lists_views_and_user_request() {
    let model = ScriptedModel::replying(r#"{"view":"vw_Products_AI_Safe","fragment":""}"#);
    let response = ask(model.clone(), "  all products  ").await;
    assert_eq!(response.view, PRODUCTS);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("vw_Tickets_AI_Report, vw_Users_AI_Safe, vw_Products_AI_Safe"));
    assert!(prompts[0].ends_with("\nUSER REQUEST:\nall products"));
}

#[tokio::test]
async fn test_response_json_shape() {
    let model = ScriptedModel::replying(
        r#"{"view":"vw_Products_AI_Safe","fragment":"WHERE Code = 'PH-01'"}"#,
    );
    let response = ask(model, "printing product").await;

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["view"], PRODUCTS);
    assert_eq!(json["fragment"], "WHERE Code = 'PH-01'");
    assert_eq!(json["isFallback"], false);
    assert!(json.get("warning").is_none());
    assert_eq!(json["data"][0]["code"], "PH-01");
}

// ---------------------------------------------------------------------------
// Quality fallbacks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_generic_fragment_is_flagged() {
    let model = ScriptedModel::replying(
        r#"{"view":"vw_Tickets_AI_Report","fragment":"ORDER BY CreatedAt DESC"}"#,
    );
    let response = ask(model, "what is going on with the espresso machine").await;

    assert!(response.is_fallback);
    assert_eq!(response.warning.as_deref(), Some(WARNING_GENERIC_ANSWER));
    assert_eq!(response.row_count(), 8);
}

#[tokio::test]
async fn test_normalized_open_status_matches_generic_default() {
    let model = ScriptedModel::replying(
        r#"{"view":"vw_Tickets_AI_Report","fragment":"WHERE Status = \"open\" ORDER BY CreatedAt DESC"}"#,
    );
    let response = ask(model, "open tickets").await;

    assert_eq!(
        response.fragment,
        "WHERE Status IN (0,1,2) ORDER BY CreatedAt DESC"
    );
    assert!(response.is_fallback);
    assert_eq!(response.row_count(), 3);
}

#[tokio::test]
async fn test_empty_fragment_with_rows_is_genuine() {
    let model = ScriptedModel::replying(r#"{"view":"vw_Products_AI_Safe","fragment":""}"#);
    let response = ask(model, "list products").await;

    assert!(!response.is_fallback);
    assert_eq!(response.row_count(), 3);
}

#[tokio::test]
async fn test_empty_fragment_without_rows_is_fallback() {
    let mut conn = Connection::open_in_memory().unwrap();
    migrations::apply_migrations(&mut conn).unwrap();

    let model = ScriptedModel::replying(r#"{"view":"vw_Products_AI_Safe","fragment":""}"#);
    let response = pipeline(model)
        .run(&RequestContext::new(), "list products", &conn, &CancellationToken::new())
        .await
        .unwrap();

    assert!(response.is_fallback);
    assert_eq!(response.warning.as_deref(), Some(WARNING_NO_RESULTS));
    assert_eq!(response.row_count(), 0);
    assert!(response.data.is_some());
}

#[tokio::test]
async fn test_discarded_fragment_is_flagged() {
    let model = ScriptedModel::replying(
        r#"{"view":"vw_Users_AI_Safe","fragment":"IsActive = 1"}"#,
    );
    let response = ask(model, "active users").await;

    assert_eq!(response.fragment, "");
    assert!(response.is_fallback);
    assert_eq!(response.warning.as_deref(), Some(WARNING_FRAGMENT_DISCARDED));
    assert_eq!(response.row_count(), 7);
}

// ---------------------------------------------------------------------------
// Model failures are successful fallbacks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_object_reply_is_fallback() {
    let model = ScriptedModel::replying("I am not sure what you mean.");
    let response = ask(model, "???").await;

    assert!(response.is_fallback);
    assert_eq!(response.view, "");
    assert_eq!(response.data, None);
    assert_eq!(response.warning.as_deref(), Some(WARNING_NO_PLAN));
}

#[tokio::test]
async fn test_undecodable_reply_keeps_raw_text() {
    let model = ScriptedModel::replying("```json\n[\"vw_Users_AI_Safe\"]\n```");
    let response = ask(model, "users").await;

    assert!(response.is_fallback);
    assert!(response
        .warning
        .as_deref()
        .unwrap()
        .starts_with("Failed to parse AI JSON"));
    assert_eq!(response.raw_text.as_deref(), Some("[\"vw_Users_AI_Safe\"]"));
}

#[tokio::test]
async fn test_transport_failure_is_fallback() {
    let model = ScriptedModel::failing(transport_error(
        "AI call failed: 503 Service Unavailable. overloaded",
    ));
    let response = ask(model, "open tickets").await;

    assert!(response.is_fallback);
    assert_eq!(response.data, None);
    assert_eq!(
        response.warning.as_deref(),
        Some("AI call failed: 503 Service Unavailable. overloaded")
    );
}

#[tokio::test]
async fn test_fallback_is_logged() {
    let capture = init_test_capture();
    let request_id = RequestId::from_string("report-fallback-log-1".to_string());
    let conn = demo_db();

    let model = ScriptedModel::replying("{}");
    pipeline(model)
        .run(
            &RequestContext::with_request_id(request_id),
            "anything",
            &conn,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let fallbacks = capture.count_events(|e| {
        e.event.as_deref() == Some(EVENT_FALLBACK)
            && e.field("request_id") == Some("report-fallback-log-1")
    });
    assert_eq!(fallbacks, 1);
}

// ---------------------------------------------------------------------------
// Fatal outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_prompt_never_calls_model() {
    let model = ScriptedModel::replying(r#"{"view":"vw_Users_AI_Safe","fragment":""}"#);
    let conn = demo_db();

    let failure = pipeline(model.clone())
        .run(&RequestContext::new(), "   ", &conn, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ExErrorKind::InvalidInput);
    assert_eq!(failure.error, ERROR_PROMPT_REQUIRED);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_injected_statement_is_rejected() {
    let capture = init_test_capture();
    let request_id = RequestId::from_string("report-reject-log-1".to_string());
    let conn = demo_db();

    let model = ScriptedModel::replying(
        r#"{"view":"vw_Users_AI_Safe","fragment":"WHERE 1=1; DROP TABLE Users"}"#,
    );
    let failure = pipeline(model)
        .run(
            &RequestContext::with_request_id(request_id),
            "users",
            &conn,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ExErrorKind::SemicolonNotAllowed);
    assert_eq!(failure.error, "Semicolons are not allowed.");
    assert_eq!(failure.view.as_deref(), Some(USERS));
    assert_eq!(failure.fragment.as_deref(), Some("WHERE 1=1; DROP TABLE Users"));

    let rejected = capture.count_events(|e| {
        e.event.as_deref() == Some(EVENT_REJECTED)
            && e.field("request_id") == Some("report-reject-log-1")
    });
    assert_eq!(rejected, 1);

    // Nothing ran
    let users: i64 = conn
        .query_row("SELECT COUNT(*) FROM Users", [], |r| r.get(0))
        .unwrap();
    assert_eq!(users, 7);
}

#[tokio::test]
async fn test_unknown_view_is_rejected() {
    let model = ScriptedModel::replying(r#"{"view":"vw_Secret","fragment":""}"#);
    let conn = demo_db();

    let failure = pipeline(model)
        .run(&RequestContext::new(), "secrets", &conn, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ExErrorKind::ViewNotAllowed);
    assert_eq!(failure.error, "View not allowed: vw_Secret");
    assert_eq!(failure.view.as_deref(), Some("vw_Secret"));
}

#[tokio::test]
async fn test_unrewritten_textual_status_is_rejected() {
    let model = ScriptedModel::replying(
        r#"{"view":"vw_Tickets_AI_Report","fragment":"WHERE Status = 'InProgress'"}"#,
    );
    let conn = demo_db();

    let failure = pipeline(model)
        .run(&RequestContext::new(), "in progress", &conn, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ExErrorKind::TextualStatus);
}

#[tokio::test]
async fn test_execution_failure_carries_details() {
    let model = ScriptedModel::replying(
        r#"{"view":"vw_Tickets_AI_Report","fragment":"WHERE NoSuchColumn = 1"}"#,
    );
    let conn = demo_db();

    let failure = pipeline(model)
        .run(&RequestContext::new(), "weird", &conn, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ExErrorKind::Persistence);
    assert_eq!(failure.error, ERROR_EXECUTION_FAILED);
    assert!(failure.details.as_deref().unwrap().contains("NoSuchColumn"));
    assert_eq!(failure.view.as_deref(), Some(TICKETS));
    assert_eq!(failure.fragment.as_deref(), Some("WHERE NoSuchColumn = 1"));

    let json = serde_json::to_value(&failure).unwrap();
    assert_eq!(json["error"], ERROR_EXECUTION_FAILED);
    assert!(json.get("kind").is_none());
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cancelled_before_model_call() {
    let model = ScriptedModel::replying(r#"{"view":"vw_Users_AI_Safe","fragment":""}"#);
    let conn = demo_db();
    let token = CancellationToken::new();
    token.cancel();

    let failure = pipeline(model.clone())
        .run(&RequestContext::new(), "users", &conn, &token)
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ExErrorKind::Cancelled);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_cancel_interrupts_pending_model() {
    let pipeline = ReportPipeline::new(Arc::new(PendingModel), registry(50));
    let conn = demo_db();
    let token = CancellationToken::new();

    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let failure = pipeline
        .run(&RequestContext::new(), "users", &conn, &token)
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), ExErrorKind::Cancelled);
}

#[tokio::test]
async fn test_cancel_after_validation_skips_execution() {
    let token = CancellationToken::new();
    let model = CancellingModel {
        reply: r#"{"view":"vw_Users_AI_Safe","fragment":"WHERE IsActive = 1"}"#.to_string(),
        token: token.clone(),
    };
    let pipeline = ReportPipeline::new(Arc::new(model), registry(50));
    let conn = demo_db();

    let failure = pipeline
        .run(&RequestContext::new(), "active users", &conn, &token)
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ExErrorKind::Cancelled);
    assert_ne!(failure.error, ERROR_EXECUTION_FAILED);
    // The plan was validated, so it is reported back with the failure
    assert_eq!(failure.view.as_deref(), Some(USERS));
    assert_eq!(failure.fragment.as_deref(), Some("WHERE IsActive = 1"));
}
