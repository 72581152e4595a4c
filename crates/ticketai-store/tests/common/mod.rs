use std::sync::Arc;

use rusqlite::Connection;
use ticketai_core::{PlanValidator, QueryPlan, ValidatedPlan, ViewRegistry};
use ticketai_store::{demo, migrations};

pub const TICKETS: &str = "vw_Tickets_AI_Report";
pub const USERS: &str = "vw_Users_AI_Safe";
pub const PRODUCTS: &str = "vw_Products_AI_Safe";

/// In-memory database with migrations applied and no rows
#[allow(dead_code)]
pub fn empty_db() -> Connection {
    let mut conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    migrations::apply_migrations(&mut conn).expect("migrations");
    conn
}

/// In-memory database with migrations and the demo dataset
#[allow(dead_code)]
pub fn demo_db() -> Connection {
    let mut conn = empty_db();
    demo::seed_demo(&mut conn).expect("demo seed");
    conn
}

#[allow(dead_code)]
pub fn registry(top: u32) -> Arc<ViewRegistry> {
    Arc::new(ViewRegistry::new([TICKETS, USERS, PRODUCTS], top, "main").unwrap())
}

#[allow(dead_code)]
pub fn validated(registry: &Arc<ViewRegistry>, view: &str, fragment: &str) -> ValidatedPlan {
    PlanValidator::new(registry.clone())
        .validate(&QueryPlan::new(view, fragment))
        .expect("plan should validate")
}
