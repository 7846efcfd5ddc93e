//! Shared helpers for backend integration tests that need PostgreSQL.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! the embedded cluster bootstrap and skip policy live here rather than being
//! copied into each suite.

pub mod cluster_skip;
pub mod embedded_postgres;

pub use cluster_skip::{SetupFailure, handle_cluster_setup_failure};
pub use embedded_postgres::provision_linkup_database;

/// Render a `postgres` error with enough detail to be useful in CI logs.
///
/// `postgres::Error`'s `Display` collapses server errors to `db error`, which
/// hides the SQLSTATE and message.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }
    summary
}
