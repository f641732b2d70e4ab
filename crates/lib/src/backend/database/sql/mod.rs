//! SQL-based backend implementations for Dossier storage.
//!
//! This module provides SQL database backends that implement the
//! [`BackendImpl`] trait, storing each collection in its own table.
//!
//! ## Available Backends
//!
//! - **SQLite** (feature: `sqlite`): Embedded database
//! - **PostgreSQL** (feature: `postgres`): PostgreSQL database
//!
//! ## Architecture
//!
//! The SQL backend uses sqlx with `AnyPool` for multi-database support. Most
//! statements are written in the subset of SQL both dialects accept. The
//! dialect switches are connection setup and the JSON counter update.
//!
//! See the [`schema`] module for tables, indexes and migrations.

mod storage;

/// Schema definition and migration system.
pub mod schema;

use std::any::Any;
#[cfg(feature = "postgres")]
use std::time::Duration;

use async_trait::async_trait;
use sqlx::AnyPool;
#[cfg(feature = "postgres")]
use sqlx::Executor;
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{BackendImpl, Collection, Document};

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Converts sqlx errors to `BackendError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to BackendError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Database backend kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

/// SQL-based backend implementing `BackendImpl` using sqlx.
///
/// Supports both SQLite and PostgreSQL through sqlx's `AnyPool`. The pool
/// handles connection pooling and thread safety.
pub struct SqlxBackend {
    pool: AnyPool,
    kind: DbKind,
}

impl std::fmt::Debug for SqlxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxBackend")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl SqlxBackend {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database kind.
    pub fn kind(&self) -> DbKind {
        self.kind
    }
}

// SQLite-specific implementations
#[cfg(feature = "sqlite")]
impl SqlxBackend {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect to a SQLite database using a connection URL.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // An in-memory SQLite database is destroyed when its last connection
        // closes, so keep one connection alive for the pool's lifetime.
        let pool = if is_in_memory {
            AnyPoolOptions::new()
                .max_connections(5)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        } else {
            AnyPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        };

        if is_in_memory {
            sqlx::query("PRAGMA busy_timeout = 5000;")
                .execute(&pool)
                .await
                .sql_context("Failed to configure SQLite")?;
        } else {
            sqlx::query(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;
        }

        let backend = Self {
            pool,
            kind: DbKind::Sqlite,
        };

        schema::initialize(&backend).await?;

        Ok(backend)
    }

    /// Create an in-memory SQLite database.
    ///
    /// The database exists only for the lifetime of this backend instance.
    pub async fn sqlite_in_memory() -> Result<Self> {
        // Shared cache so every pooled connection sees the same database; the
        // unique name keeps separate instances (and tests) apart.
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }
}

// PostgreSQL-specific implementations
#[cfg(feature = "postgres")]
impl SqlxBackend {
    /// Connect to a PostgreSQL database using a connection URL.
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        Self::connect_postgres_with_schema(url, None).await
    }

    /// Connect to a PostgreSQL database with test isolation.
    ///
    /// Creates a unique schema for this backend instance, so parallel tests
    /// don't see each other's rows.
    pub async fn connect_postgres_isolated(url: &str) -> Result<Self> {
        let unique_id = uuid::Uuid::new_v4().simple().to_string();
        let schema_name = format!("test_{unique_id}");
        Self::connect_postgres_with_schema(url, Some(schema_name)).await
    }

    async fn connect_postgres_with_schema(url: &str, schema_name: Option<String>) -> Result<Self> {
        sqlx::any::install_default_drivers();

        if let Some(ref schema) = schema_name {
            let temp_pool = AnyPoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await
                .sql_context("Failed to connect to PostgreSQL")?;

            let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {schema}");
            sqlx::query(&create_schema)
                .execute(&temp_pool)
                .await
                .sql_context(&format!("Failed to create schema {schema}"))?;

            temp_pool.close().await;
        }

        let schema_for_hook = schema_name.clone();
        let mut pool_options = AnyPoolOptions::new();
        if schema_name.is_some() {
            pool_options = pool_options
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(30));
        } else {
            pool_options = pool_options.max_connections(5);
        }

        let pool = pool_options
            .after_connect(move |conn, _meta| {
                let schema = schema_for_hook.clone();
                Box::pin(async move {
                    if let Some(ref s) = schema {
                        let set_path = format!("SET search_path TO {s}");
                        conn.execute(set_path.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        let backend = Self {
            pool,
            kind: DbKind::Postgres,
        };

        schema::initialize(&backend).await?;

        Ok(backend)
    }
}

#[async_trait]
impl BackendImpl for SqlxBackend {
    async fn insert(&self, collection: Collection, document: Document) -> Result<()> {
        storage::insert(self, collection, document).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        storage::get(self, collection, id).await
    }

    async fn find_by_unique_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<Document>> {
        storage::find_by_unique_key(self, collection, key).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        storage::list(self, collection).await
    }

    async fn list_by_owner(
        &self,
        collection: Collection,
        owner_id: &str,
        tag: Option<&str>,
    ) -> Result<Vec<Document>> {
        storage::list_by_owner(self, collection, owner_id, tag).await
    }

    async fn replace(&self, collection: Collection, document: Document) -> Result<()> {
        storage::replace(self, collection, document).await
    }

    async fn increment_counter(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
    ) -> Result<Option<Document>> {
        storage::increment_counter(self, collection, key, field).await
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<Document> {
        storage::remove(self, collection, id).await
    }

    async fn remove_by_owner(
        &self,
        collection: Collection,
        owner_id: &str,
    ) -> Result<Vec<Document>> {
        storage::remove_by_owner(self, collection, owner_id).await
    }

    async fn remove_expired(
        &self,
        collection: Collection,
        now_millis: i64,
    ) -> Result<Vec<Document>> {
        storage::remove_expired(self, collection, now_millis).await
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        storage::count(self, collection).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(feature = "sqlite")]
/// Convenience type alias for SQLite backend using sqlx.
pub type Sqlite = SqlxBackend;

#[cfg(feature = "postgres")]
/// Convenience type alias for PostgreSQL backend using sqlx.
pub type Postgres = SqlxBackend;
