//! Demo dataset for a freshly initialized database
//!
//! Small, deterministic and self-consistent: enough for every reporting view
//! to return rows and for the advisor ranking to have a clear order.

use rusqlite::{params, Connection};

use crate::errors::{from_rusqlite, Result};
use crate::tickets::user_type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemoSummary {
    pub users: usize,
    pub products: usize,
    pub tickets: usize,
    pub comments: usize,
}

// (full name, email, user name, type, active)
const USERS: [(&str, &str, &str, i64, bool); 7] = [
    ("Maya Haddad", "maya@example.com", "maya", user_type::SUPPORT_MANAGER, true),
    ("Dana Saleh", "dana@example.com", "dana", user_type::SUPPORT_EMPLOYEE, true),
    ("Omar Khalil", "omar@example.com", "omar", user_type::SUPPORT_EMPLOYEE, true),
    ("Lina Aziz", "lina@example.com", "lina", user_type::SUPPORT_EMPLOYEE, true),
    ("Sami Nasser", "sami@example.com", "sami", user_type::SUPPORT_EMPLOYEE, false),
    ("Acme Corp", "it@acme.example", "acme", user_type::EXTERNAL_CLIENT, true),
    ("Globex", "help@globex.example", "globex", user_type::EXTERNAL_CLIENT, true),
];

// (name, code, description, active)
const PRODUCTS: [(&str, &str, &str, bool); 3] = [
    ("PrintHub", "PH-01", "Managed printing", true),
    ("MailGate", "MG-02", "Email gateway", true),
    ("LegacyCRM", "LC-00", "Retired CRM", false),
];

// (title, status, client user name, assignee user name, product code, created at)
const TICKETS: [(&str, i64, &str, Option<&str>, &str, &str); 8] = [
    ("Printer offline on floor 3", 0, "acme", None, "PH-01", "2024-05-01 08:00:00"),
    ("Cannot send attachments", 1, "acme", Some("dana"), "MG-02", "2024-05-02 09:15:00"),
    ("Spam filter too strict", 2, "globex", Some("omar"), "MG-02", "2024-05-03 10:30:00"),
    ("Toner reorder", 3, "globex", Some("dana"), "PH-01", "2024-05-04 11:45:00"),
    ("Mailbox quota", 4, "acme", Some("dana"), "MG-02", "2024-05-05 13:00:00"),
    ("Queue stuck", 4, "globex", Some("dana"), "PH-01", "2024-05-06 14:20:00"),
    ("Bounce loop", 4, "acme", Some("omar"), "MG-02", "2024-05-07 15:40:00"),
    ("CRM export", 4, "globex", Some("sami"), "LC-00", "2024-05-08 16:05:00"),
];

// (ticket index, author user name, text, created at)
const COMMENTS: [(usize, &str, &str, &str); 4] = [
    (0, "acme", "Printer shows a paper jam light", "2024-05-01 08:05:00"),
    (0, "maya", "Checking with facilities", "2024-05-01 09:00:00"),
    (1, "dana", "Reproduced with files over 10 MB", "2024-05-02 10:00:00"),
    (2, "omar", "Waiting for a sample message", "2024-05-03 11:00:00"),
];

/// Insert the demo dataset in one transaction
///
/// Fails on a database that already holds any of the demo users.
pub fn seed_demo(conn: &mut Connection) -> Result<DemoSummary> {
    let tx = conn.transaction().map_err(from_rusqlite)?;

    for (full_name, email, user_name, kind, active) in USERS {
        tx.execute(
            "INSERT INTO Users (FullName, Email, UserName, UserType, IsActive, CreatedAt)
             VALUES (?1, ?2, ?3, ?4, ?5, '2024-04-01 00:00:00')",
            params![full_name, email, user_name, kind, active],
        )
        .map_err(from_rusqlite)?;
    }

    for (name, code, description, active) in PRODUCTS {
        tx.execute(
            "INSERT INTO Products (Name, Code, Description, IsActive, CreatedAt)
             VALUES (?1, ?2, ?3, ?4, '2024-04-01 00:00:00')",
            params![name, code, description, active],
        )
        .map_err(from_rusqlite)?;
    }

    let mut ticket_ids = Vec::with_capacity(TICKETS.len());
    for (title, status, client, assignee, product, created_at) in TICKETS {
        tx.execute(
            "INSERT INTO Tickets (Title, Description, Status, ClientId, AssignedEmployeeId, ProductId, CreatedAt)
             VALUES (?1, ?1, ?2,
                     (SELECT Id FROM Users WHERE UserName = ?3),
                     (SELECT Id FROM Users WHERE UserName = ?4),
                     (SELECT Id FROM Products WHERE Code = ?5),
                     ?6)",
            params![title, status, client, assignee, product, created_at],
        )
        .map_err(from_rusqlite)?;
        ticket_ids.push(tx.last_insert_rowid());
    }

    for (ticket_index, author, text, created_at) in COMMENTS {
        tx.execute(
            "INSERT INTO TicketComments (TicketId, AuthorId, CommentText, CreatedAt)
             VALUES (?1, (SELECT Id FROM Users WHERE UserName = ?2), ?3, ?4)",
            params![ticket_ids[ticket_index], author, text, created_at],
        )
        .map_err(from_rusqlite)?;
    }

    tx.commit().map_err(from_rusqlite)?;

    Ok(DemoSummary {
        users: USERS.len(),
        products: PRODUCTS.len(),
        tickets: TICKETS.len(),
        comments: COMMENTS.len(),
    })
}
