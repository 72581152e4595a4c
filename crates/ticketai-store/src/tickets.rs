//! Ticket repository for the assignment advisor

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use ticketai_core::errors::{ExError, ExErrorKind};
use ticketai_core::{AssignCandidate, TicketBrief, TicketComment, TicketStatus};

use crate::errors::{from_rusqlite, Result};

/// Maximum candidates handed to the model
pub const DEFAULT_CANDIDATE_LIMIT: usize = 8;

/// `Users.UserType` codes
pub mod user_type {
    pub const SUPPORT_MANAGER: i64 = 0;
    pub const SUPPORT_EMPLOYEE: i64 = 1;
    pub const EXTERNAL_CLIENT: i64 = 2;
}

/// Load a ticket with its product name and comments
///
/// Returns `None` if no ticket has this id.
pub fn load_ticket(conn: &Connection, ticket_id: i64) -> Result<Option<TicketBrief>> {
    let header: Option<(i64, String, String, i64, Option<String>)> = conn
        .query_row(
            "SELECT t.Id, t.Title, t.Description, t.Status, p.Name
             FROM Tickets t
             LEFT JOIN Products p ON p.Id = t.ProductId
             WHERE t.Id = ?1",
            [ticket_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .optional()
        .map_err(from_rusqlite)?;

    let Some((id, title, description, status_code, product_name)) = header else {
        return Ok(None);
    };

    let status = TicketStatus::from_code(status_code).ok_or_else(|| {
        ExError::new(ExErrorKind::Persistence)
            .with_op("load_ticket")
            .with_message(format!(
                "ticket {id} has unknown status code {status_code}"
            ))
    })?;

    let mut stmt = conn
        .prepare(
            "SELECT CreatedAt, CommentText FROM TicketComments
             WHERE TicketId = ?1
             ORDER BY CreatedAt, Id",
        )
        .map_err(from_rusqlite)?;
    let comments = stmt
        .query_map([id], |row| {
            Ok(TicketComment {
                created_at: row.get::<_, DateTime<Utc>>(0)?,
                text: row.get(1)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    Ok(Some(TicketBrief {
        id,
        title,
        description,
        status,
        product_name,
        comments,
    }))
}

/// Active support employees ranked for assignment
///
/// Most closed tickets first, then most assigned, then lowest id. Employees
/// with no tickets yet are included with zero counts.
pub fn top_employees(conn: &Connection, limit: usize) -> Result<Vec<AssignCandidate>> {
    let mut stmt = conn
        .prepare(
            "SELECT u.Id,
                    COALESCE(NULLIF(u.FullName, ''), u.UserName) AS Name,
                    COUNT(t.Id) AS AssignedCount,
                    COALESCE(SUM(CASE WHEN t.Status = ?1 THEN 1 ELSE 0 END), 0) AS ClosedCount
             FROM Users u
             LEFT JOIN Tickets t ON t.AssignedEmployeeId = u.Id
             WHERE u.UserType = ?2 AND u.IsActive = 1
             GROUP BY u.Id
             ORDER BY ClosedCount DESC, AssignedCount DESC, u.Id ASC
             LIMIT ?3",
        )
        .map_err(from_rusqlite)?;

    let candidates = stmt
        .query_map(
            rusqlite::params![
                TicketStatus::Closed.code(),
                user_type::SUPPORT_EMPLOYEE,
                limit as i64
            ],
            |row| {
                Ok(AssignCandidate {
                    employee_id: row.get(0)?,
                    employee_name: row.get(1)?,
                    assigned_count: row.get(2)?,
                    closed_count: row.get(3)?,
                })
            },
        )
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    Ok(candidates)
}
