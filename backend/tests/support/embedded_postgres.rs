//! Provisions throwaway databases carrying the linkup schema.
//!
//! Each test gets its own database on the shared embedded cluster. The
//! migration SQL is applied through `postgres` directly so the extension
//! step can be told apart from the rest of the schema.

use pg_embedded_setup_unpriv::TemporaryDatabase;
use postgres::{Client, NoTls};
use uuid::Uuid;

use super::cluster_skip::SetupFailure;
use super::format_postgres_error;

const POSTGIS_SQL: &str = "CREATE EXTENSION IF NOT EXISTS postgis";
const LINKUP_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_linkups/up.sql");

/// Create a fresh database with PostGIS enabled and the linkup tables in place.
pub fn provision_linkup_database() -> Result<TemporaryDatabase, SetupFailure> {
    let cluster = pg_embedded_setup_unpriv::test_support::shared_cluster_handle()
        .map_err(|err| SetupFailure::Cluster(format!("{err:?}")))?;
    let name = format!("linkup_{}", Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name.as_str())
        .map_err(|err| SetupFailure::Cluster(format!("{err:?}")))?;

    let mut client = Client::connect(database.url(), NoTls)
        .map_err(|err| SetupFailure::Cluster(format_postgres_error(&err)))?;
    client
        .batch_execute(POSTGIS_SQL)
        .map_err(|err| SetupFailure::Extension(format_postgres_error(&err)))?;
    client
        .batch_execute(LINKUP_SCHEMA_SQL)
        .map_err(|err| SetupFailure::Schema(format_postgres_error(&err)))?;

    Ok(database)
}
