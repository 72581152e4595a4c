//! Bounded view executor
//!
//! Turns a [`ValidatedPlan`] into exactly one statement of the form
//! `SELECT * FROM <schema>.<view> [fragment] LIMIT <top>` and materializes at
//! most `top` rows into the row shape registered for that view. A fragment
//! with its own `LIMIT` runs as a subquery under the outer cap. Registry
//! membership alone is not enough: a view without a row shape here is
//! refused before any SQL text is built.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, Statement};
use serde::Serialize;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Instant;
use ticketai_core::errors::{ExError, ExErrorKind};
use ticketai_core::{log_op_end, log_op_error, log_op_start, ValidatedPlan, ViewRegistry};

use crate::errors::{execution_error, Result};

/// Row shapes the executor knows how to materialize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    TicketReport,
    UserSafe,
    ProductSafe,
}

impl RowShape {
    pub const ALL: [RowShape; 3] = [
        RowShape::TicketReport,
        RowShape::UserSafe,
        RowShape::ProductSafe,
    ];

    pub fn view_name(self) -> &'static str {
        match self {
            RowShape::TicketReport => "vw_Tickets_AI_Report",
            RowShape::UserSafe => "vw_Users_AI_Safe",
            RowShape::ProductSafe => "vw_Products_AI_Safe",
        }
    }

    /// Case-insensitive view name to shape
    pub fn resolve(view: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.view_name().eq_ignore_ascii_case(view))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketReportRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub client_id: i64,
    pub client_full_name: Option<String>,
    pub client_user_name: Option<String>,
    pub client_email: Option<String>,
    pub assigned_employee_id: Option<i64>,
    pub employee_full_name: Option<String>,
    pub employee_user_name: Option<String>,
    pub employee_email: Option<String>,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub product_code: Option<String>,
    pub product_is_active: Option<bool>,
}

impl TicketReportRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("Id")?,
            title: row.get("Title")?,
            description: row.get("Description")?,
            status: row.get("Status")?,
            created_at: row.get("CreatedAt")?,
            updated_at: row.get("UpdatedAt")?,
            client_id: row.get("ClientId")?,
            client_full_name: row.get("ClientFullName")?,
            client_user_name: row.get("ClientUserName")?,
            client_email: row.get("ClientEmail")?,
            assigned_employee_id: row.get("AssignedEmployeeId")?,
            employee_full_name: row.get("EmployeeFullName")?,
            employee_user_name: row.get("EmployeeUserName")?,
            employee_email: row.get("EmployeeEmail")?,
            product_id: row.get("ProductId")?,
            product_name: row.get("ProductName")?,
            product_code: row.get("ProductCode")?,
            product_is_active: row.get("ProductIsActive")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSafeRow {
    pub id: i64,
    pub full_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub user_name: String,
    pub user_type: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserSafeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("Id")?,
            full_name: row.get("FullName")?,
            email: row.get("Email")?,
            phone_number: row.get("PhoneNumber")?,
            address: row.get("Address")?,
            date_of_birth: row.get("DateOfBirth")?,
            user_name: row.get("UserName")?,
            user_type: row.get("UserType")?,
            is_active: row.get("IsActive")?,
            created_at: row.get("CreatedAt")?,
            updated_at: row.get("UpdatedAt")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSafeRow {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProductSafeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("Id")?,
            name: row.get("Name")?,
            code: row.get("Code")?,
            description: row.get("Description")?,
            is_active: row.get("IsActive")?,
            created_at: row.get("CreatedAt")?,
            updated_at: row.get("UpdatedAt")?,
        })
    }
}

/// Materialized rows, serialized as a plain JSON array
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportRows {
    Tickets(Vec<TicketReportRow>),
    Users(Vec<UserSafeRow>),
    Products(Vec<ProductSafeRow>),
}

impl ReportRows {
    pub fn len(&self) -> usize {
        match self {
            ReportRows::Tickets(rows) => rows.len(),
            ReportRows::Users(rows) => rows.len(),
            ReportRows::Products(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub view: String,
    pub fragment: String,
    pub statement: String,
    pub rows: ReportRows,
}

impl ExecutionResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

static LIMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blimit\b").expect("valid limit regex"));

/// The exact statement a validated plan runs as
pub fn build_statement(registry: &ViewRegistry, plan: &ValidatedPlan) -> String {
    let mut sql = format!("SELECT * FROM {}.{}", registry.schema(), plan.view());
    if !plan.fragment().is_empty() {
        sql.push(' ');
        sql.push_str(plan.fragment());
    }
    if LIMIT_RE.is_match(plan.fragment()) {
        sql = format!("SELECT * FROM ({sql})");
    }
    sql.push_str(&format!(" LIMIT {}", registry.default_top()));
    sql
}

/// Run a validated plan and materialize its rows
///
/// # Errors
///
/// - `ViewNotAllowed` if `registry` does not list the plan's view
/// - `UnsupportedView` if the view has no row shape
/// - `ReadOnlyViolation` if the prepared statement could write
/// - `Persistence` for any database failure (never retried)
pub fn execute_plan(
    conn: &Connection,
    registry: &ViewRegistry,
    plan: &ValidatedPlan,
) -> Result<ExecutionResult> {
    let start = Instant::now();
    log_op_start!("view_execute", view = plan.view(), fragment = plan.fragment());

    let result = run(conn, registry, plan);
    let duration_ms = start.elapsed().as_millis() as u64;

    match &result {
        Ok(r) => {
            log_op_end!(
                "view_execute",
                duration_ms = duration_ms,
                row_count = r.row_count()
            );
        }
        Err(e) => {
            log_op_error!("view_execute", e.clone(), duration_ms = duration_ms);
        }
    }

    result
}

fn run(
    conn: &Connection,
    registry: &ViewRegistry,
    plan: &ValidatedPlan,
) -> Result<ExecutionResult> {
    let view = plan.view();
    let fragment = plan.fragment();

    // The plan may come from a validator bound to another registry
    if registry.lookup(view) != Some(view) {
        return Err(ExError::new(ExErrorKind::ViewNotAllowed)
            .with_op("view_execute")
            .with_view(view)
            .with_fragment(fragment)
            .with_message(format!("View not allowed: {view}")));
    }

    let shape = RowShape::resolve(view).ok_or_else(|| {
        ExError::new(ExErrorKind::UnsupportedView)
            .with_op("view_execute")
            .with_view(view)
            .with_fragment(fragment)
            .with_message(format!("Unsupported view: {view}"))
    })?;

    let statement = build_statement(registry, plan);
    let cap = registry.default_top() as usize;

    let mut stmt = conn
        .prepare(&statement)
        .map_err(|e| execution_error(view, fragment, e))?;

    if !stmt.readonly() {
        return Err(ExError::new(ExErrorKind::ReadOnlyViolation)
            .with_op("view_execute")
            .with_view(view)
            .with_fragment(fragment)
            .with_message("statement is not read-only"));
    }

    let rows = match shape {
        RowShape::TicketReport => {
            collect_capped(&mut stmt, cap, TicketReportRow::from_row).map(ReportRows::Tickets)
        }
        RowShape::UserSafe => {
            collect_capped(&mut stmt, cap, UserSafeRow::from_row).map(ReportRows::Users)
        }
        RowShape::ProductSafe => {
            collect_capped(&mut stmt, cap, ProductSafeRow::from_row).map(ReportRows::Products)
        }
    }
    .map_err(|e| execution_error(view, fragment, e))?;

    Ok(ExecutionResult {
        view: view.to_string(),
        fragment: fragment.to_string(),
        statement,
        rows,
    })
}

fn collect_capped<T>(
    stmt: &mut Statement<'_>,
    cap: usize,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while out.len() < cap {
        match rows.next()? {
            Some(row) => out.push(map(row)?),
            None => break,
        }
    }
    Ok(out)
}
