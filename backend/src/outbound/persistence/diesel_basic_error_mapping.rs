//! Shared translation of pool and Diesel failures into port errors.

use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure through the port's connection constructor.
pub fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map a Diesel failure onto query or connection constructors.
///
/// Constraint violations keep their constraint name so callers can tell a
/// broken invariant apart from a generic failure in the logs.
pub fn map_basic_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(String) -> E,
    C: Fn(String) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection closed".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            query("transaction serialization failure".to_owned())
        }
        DieselError::DatabaseError(kind, info) => match info.constraint_name() {
            Some(constraint) => query(format!("constraint {constraint} violated ({kind:?})")),
            None => query("database error".to_owned()),
        },
        DieselError::RollbackTransaction => query("transaction rolled back".to_owned()),
        _ => query("database error".to_owned()),
    }
}
