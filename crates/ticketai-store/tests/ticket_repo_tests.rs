mod common;

use common::{demo_db, empty_db};
use rusqlite::params;
use ticketai_core::TicketStatus;
use ticketai_store::tickets::{load_ticket, top_employees, DEFAULT_CANDIDATE_LIMIT};

#[test]
fn test_load_ticket_with_comments() {
    let conn = demo_db();

    let ticket = load_ticket(&conn, 1).unwrap().expect("ticket 1 exists");
    assert_eq!(ticket.title, "Printer offline on floor 3");
    assert_eq!(ticket.status, TicketStatus::New);
    assert_eq!(ticket.product_name.as_deref(), Some("PrintHub"));
    assert_eq!(ticket.comments.len(), 2);
    assert_eq!(ticket.comments[0].text, "Printer shows a paper jam light");
}

#[test]
fn test_missing_ticket_is_none() {
    let conn = demo_db();
    assert!(load_ticket(&conn, 999).unwrap().is_none());
}

#[test]
fn test_closed_ticket_status() {
    let conn = demo_db();
    let ticket = load_ticket(&conn, 5).unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::Closed);
    assert!(ticket.comments.is_empty());
}

#[test]
fn test_ranking_closed_then_assigned() {
    let conn = demo_db();
    let ranked = top_employees(&conn, DEFAULT_CANDIDATE_LIMIT).unwrap();

    let names: Vec<&str> = ranked.iter().map(|c| c.employee_name.as_str()).collect();
    // Sami is inactive; Lina has no tickets yet.
    assert_eq!(names, vec!["Dana Saleh", "Omar Khalil", "Lina Aziz"]);
    assert_eq!((ranked[0].closed_count, ranked[0].assigned_count), (2, 4));
    assert_eq!((ranked[1].closed_count, ranked[1].assigned_count), (1, 2));
    assert_eq!((ranked[2].closed_count, ranked[2].assigned_count), (0, 0));
}

#[test]
fn test_ranking_respects_limit_and_id_tie_break() {
    let conn = empty_db();
    for i in 0..10 {
        conn.execute(
            "INSERT INTO Users (FullName, Email, UserName, UserType) VALUES (?1, ?2, ?3, 1)",
            params![format!("Emp {i}"), format!("e{i}@x.test"), format!("e{i}")],
        )
        .unwrap();
    }

    let ranked = top_employees(&conn, DEFAULT_CANDIDATE_LIMIT).unwrap();
    assert_eq!(ranked.len(), 8);
    let ids: Vec<i64> = ranked.iter().map(|c| c.employee_id).collect();
    assert_eq!(ids, (1..=8).collect::<Vec<i64>>());
}

#[test]
fn test_name_falls_back_to_user_name() {
    let conn = empty_db();
    conn.execute(
        "INSERT INTO Users (FullName, Email, UserName, UserType) VALUES ('', 'a@x.test', 'agent7', 1)",
        [],
    )
    .unwrap();

    let ranked = top_employees(&conn, 8).unwrap();
    assert_eq!(ranked[0].employee_name, "agent7");
}
