//! TicketAI Store - SQLite persistence for the query pipelines
//!
//! Provides:
//! - Connection helpers (read-write for setup, read-only for reporting)
//! - Embedded migrations: ticketing tables and the AI-safe reporting views
//! - The bounded view executor, the only place model-driven SQL runs
//! - The ticket repository feeding the assignment advisor
//! - A small demo dataset

pub mod db;
pub mod demo;
pub mod errors;
pub mod migrations;
pub mod tickets;
pub mod views;

// Re-export key types
pub use errors::Result;
pub use views::{execute_plan, ExecutionResult, ReportRows, RowShape};
