//! SQL schema definitions and migrations.
//!
//! Every collection gets a table of the same shape: the document ID, the
//! indexed columns copied out of the record, and the JSON body. The schema is
//! portable between SQLite and Postgres.
//!
//! # Migration System
//!
//! Migrations are code-based functions rather than SQL files so dialect
//! differences can be handled in Rust.
//!
//! ## Adding a New Migration
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add the migration to the match statement in `run_migration`

use crate::Result;
use crate::backend::Collection;
use crate::backend::errors::BackendError;

use super::SqlxBackend;

/// Current schema version.
///
/// Increment this when making schema changes that require migration.
pub const SCHEMA_VERSION: i64 = 1;

/// Schema version tracking table.
/// BIGINT (64-bit) used for portability between SQLite and PostgreSQL.
const CREATE_VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version BIGINT PRIMARY KEY
)";

/// `CREATE TABLE` statement for one collection.
pub fn create_table(collection: Collection) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY NOT NULL,
            unique_key TEXT,
            owner_id TEXT,
            tag TEXT,
            created_at BIGINT NOT NULL,
            expires_at BIGINT,
            body TEXT NOT NULL
        )",
        table = collection.name()
    )
}

/// Index statements for one collection.
///
/// NULL unique keys are allowed any number of times by both dialects.
pub fn create_indexes(collection: Collection) -> Vec<String> {
    let table = collection.name();
    vec![
        format!("CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_unique_key ON {table}(unique_key)"),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_owner_tag ON {table}(owner_id, tag, created_at)"
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_expires ON {table}(expires_at)"),
    ]
}

fn schema_error(context: &str, statement: &str, e: sqlx::Error) -> BackendError {
    BackendError::SqlxError {
        reason: format!("{context}: {e} - SQL: {statement}"),
        source: Some(e),
    }
}

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and runs migrations if the
/// stored schema version is older than [`SCHEMA_VERSION`].
pub async fn initialize(backend: &SqlxBackend) -> Result<()> {
    let pool = backend.pool();

    sqlx::query(CREATE_VERSION_TABLE)
        .execute(pool)
        .await
        .map_err(|e| schema_error("Schema creation failed", CREATE_VERSION_TABLE, e))?;

    for collection in Collection::ALL {
        let statement = create_table(collection);
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| schema_error("Schema creation failed", &statement, e))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .map_err(|e| BackendError::SqlxError {
            reason: format!("Failed to check schema version: {e}"),
            source: Some(e),
        })?;

    if row.is_none() {
        sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
            .bind(SCHEMA_VERSION)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Failed to initialize schema version: {e}"),
                source: Some(e),
            })?;
    } else if let Some((current_version,)) = row
        && current_version < SCHEMA_VERSION
    {
        migrate(backend, current_version, SCHEMA_VERSION).await?;
    }

    for collection in Collection::ALL {
        for statement in create_indexes(collection) {
            sqlx::query(&statement)
                .execute(pool)
                .await
                .map_err(|e| schema_error("Index creation failed", &statement, e))?;
        }
    }

    Ok(())
}

/// Run migrations sequentially from one schema version to another.
async fn migrate(backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    for (current, next) in migration_steps(from, to) {
        tracing::info!(from = current, to = next, "Running migration");

        run_migration(backend, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(backend.pool())
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Failed to update schema version to {next}: {e}"),
                source: Some(e),
            })?;
    }

    Ok(())
}

/// The single-version steps leading from `from` up to `to`.
fn migration_steps(from: i64, to: i64) -> impl Iterator<Item = (i64, i64)> {
    (from..to).map(|version| (version, version + 1))
}

/// Dispatch a single migration step.
async fn run_migration(_backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    // Version 1 is the initial schema; there is nothing to migrate yet.
    Err(BackendError::SqlxError {
        reason: format!("No migration defined from schema version {from} to {to}"),
        source: None,
    }
    .into())
}
