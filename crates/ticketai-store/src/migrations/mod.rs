//! Migration framework
//!
//! Provides:
//! - Migration runner with checksums
//! - Idempotent application
//! - Embedded SQL migrations (tables, then the reporting views)

mod checksums;
mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
