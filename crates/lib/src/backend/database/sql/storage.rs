//! Document storage operations for SQL backends.
//!
//! Each collection maps to a table of the same name. Every statement here is
//! shared between SQLite and PostgreSQL except the counter update, which edits
//! the JSON body with each dialect's own functions.

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{Collection, Document};

use super::{DbKind, SqlxBackend, SqlxResultExt};

/// Column list shared by every SELECT, in [`DocumentRow`] order.
const COLUMNS: &str = "id, unique_key, owner_id, tag, created_at, expires_at, body";

/// Ordering shared by every listing: newest first, then by ID.
const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

type DocumentRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
    Option<i64>,
    String,
);

fn into_document(row: DocumentRow) -> Document {
    let (id, unique_key, owner_id, tag, created_at, expires_at, body) = row;
    Document {
        id,
        unique_key,
        owner_id,
        tag,
        created_at,
        expires_at,
        body,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn duplicate(collection: Collection, key: &str) -> crate::Error {
    BackendError::DuplicateKey {
        collection,
        key: key.to_string(),
    }
    .into()
}

/// Insert a new document.
pub async fn insert(backend: &SqlxBackend, collection: Collection, document: Document) -> Result<()> {
    let table = collection.name();
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    // Checked up front so the error names the conflicting key rather than the
    // index.
    let taken: Option<(String,)> = sqlx::query_as(&format!(
        "SELECT id FROM {table} WHERE id = $1 OR unique_key = $2"
    ))
    .bind(&document.id)
    .bind(&document.unique_key)
    .fetch_optional(&mut *tx)
    .await
    .sql_context("Failed to check for duplicates")?;

    if taken.is_some() {
        let key = document.unique_key.as_deref().unwrap_or(&document.id);
        return Err(duplicate(collection, key));
    }

    let result = sqlx::query(&format!(
        "INSERT INTO {table} ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
    ))
    .bind(&document.id)
    .bind(&document.unique_key)
    .bind(&document.owner_id)
    .bind(&document.tag)
    .bind(document.created_at)
    .bind(document.expires_at)
    .bind(&document.body)
    .execute(&mut *tx)
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            let key = document.unique_key.as_deref().unwrap_or(&document.id);
            return Err(duplicate(collection, key));
        }
        Err(e) => return Err(e).sql_context("Failed to insert document"),
    }

    tx.commit().await.sql_context("Failed to commit transaction")
}

/// Get a document by ID.
pub async fn get(backend: &SqlxBackend, collection: Collection, id: &str) -> Result<Option<Document>> {
    let table = collection.name();
    let row: Option<DocumentRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM {table} WHERE id = $1"))
            .bind(id)
            .fetch_optional(backend.pool())
            .await
            .sql_context("Failed to get document")?;
    Ok(row.map(into_document))
}

/// Get the document holding a unique key.
pub async fn find_by_unique_key(
    backend: &SqlxBackend,
    collection: Collection,
    key: &str,
) -> Result<Option<Document>> {
    let table = collection.name();
    let row: Option<DocumentRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM {table} WHERE unique_key = $1"
    ))
    .bind(key)
    .fetch_optional(backend.pool())
    .await
    .sql_context("Failed to look up unique key")?;
    Ok(row.map(into_document))
}

/// List every document in a collection.
pub async fn list(backend: &SqlxBackend, collection: Collection) -> Result<Vec<Document>> {
    let table = collection.name();
    let rows: Vec<DocumentRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM {table} {NEWEST_FIRST}"))
            .fetch_all(backend.pool())
            .await
            .sql_context("Failed to list documents")?;
    Ok(rows.into_iter().map(into_document).collect())
}

/// List the documents of one owner, optionally with a given tag.
pub async fn list_by_owner(
    backend: &SqlxBackend,
    collection: Collection,
    owner_id: &str,
    tag: Option<&str>,
) -> Result<Vec<Document>> {
    let table = collection.name();
    let rows: Vec<DocumentRow> = match tag {
        Some(tag) => sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM {table} WHERE owner_id = $1 AND tag = $2 {NEWEST_FIRST}"
        ))
        .bind(owner_id)
        .bind(tag)
        .fetch_all(backend.pool())
        .await,
        None => sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM {table} WHERE owner_id = $1 {NEWEST_FIRST}"
        ))
        .bind(owner_id)
        .fetch_all(backend.pool())
        .await,
    }
    .sql_context("Failed to list documents by owner")?;
    Ok(rows.into_iter().map(into_document).collect())
}

/// Overwrite an existing document.
pub async fn replace(
    backend: &SqlxBackend,
    collection: Collection,
    document: Document,
) -> Result<()> {
    let table = collection.name();
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    if let Some(key) = &document.unique_key {
        let holder: Option<(String,)> =
            sqlx::query_as(&format!("SELECT id FROM {table} WHERE unique_key = $1"))
                .bind(key)
                .fetch_optional(&mut *tx)
                .await
                .sql_context("Failed to check for duplicates")?;
        if holder.is_some_and(|(id,)| id != document.id) {
            return Err(duplicate(collection, key));
        }
    }

    let result = sqlx::query(&format!(
        "UPDATE {table} SET unique_key = $1, owner_id = $2, tag = $3, created_at = $4,
            expires_at = $5, body = $6
         WHERE id = $7"
    ))
    .bind(&document.unique_key)
    .bind(&document.owner_id)
    .bind(&document.tag)
    .bind(document.created_at)
    .bind(document.expires_at)
    .bind(&document.body)
    .bind(&document.id)
    .execute(&mut *tx)
    .await;

    let result = match result {
        Ok(result) => result,
        Err(e) if is_unique_violation(&e) => {
            let key = document.unique_key.as_deref().unwrap_or(&document.id);
            return Err(duplicate(collection, key));
        }
        Err(e) => return Err(e).sql_context("Failed to update document"),
    };

    if result.rows_affected() == 0 {
        return Err(BackendError::DocumentNotFound {
            collection,
            id: document.id,
        }
        .into());
    }

    tx.commit().await.sql_context("Failed to commit transaction")
}

/// Add one to a body field in a single UPDATE.
///
/// The row lock taken by the UPDATE serializes concurrent increments, so no
/// transaction is opened around it.
pub async fn increment_counter(
    backend: &SqlxBackend,
    collection: Collection,
    key: &str,
    field: &str,
) -> Result<Option<Document>> {
    let table = collection.name();
    let statement = match backend.kind() {
        DbKind::Sqlite => format!(
            "UPDATE {table}
             SET body = json_set(body, '$.' || $2,
                                 COALESCE(json_extract(body, '$.' || $2), 0) + 1)
             WHERE unique_key = $1
             RETURNING {COLUMNS}"
        ),
        DbKind::Postgres => format!(
            "UPDATE {table}
             SET body = jsonb_set(body::jsonb, ARRAY[$2::text],
                                  to_jsonb(COALESCE((body::jsonb ->> $2::text)::bigint, 0) + 1))::text
             WHERE unique_key = $1
             RETURNING {COLUMNS}"
        ),
    };

    let row: Option<DocumentRow> = sqlx::query_as(&statement)
        .bind(key)
        .bind(field)
        .fetch_optional(backend.pool())
        .await
        .sql_context("Failed to increment counter")?;
    Ok(row.map(into_document))
}

/// Remove a document by ID and return it.
pub async fn remove(backend: &SqlxBackend, collection: Collection, id: &str) -> Result<Document> {
    let table = collection.name();
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let row: Option<DocumentRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM {table} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .sql_context("Failed to get document")?;

    let Some(row) = row else {
        return Err(BackendError::DocumentNotFound {
            collection,
            id: id.to_string(),
        }
        .into());
    };

    sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete document")?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(into_document(row))
}

/// Remove every document owned by `owner_id`.
pub async fn remove_by_owner(
    backend: &SqlxBackend,
    collection: Collection,
    owner_id: &str,
) -> Result<Vec<Document>> {
    let table = collection.name();
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM {table} WHERE owner_id = $1 {NEWEST_FIRST}"
    ))
    .bind(owner_id)
    .fetch_all(&mut *tx)
    .await
    .sql_context("Failed to list documents by owner")?;

    sqlx::query(&format!("DELETE FROM {table} WHERE owner_id = $1"))
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete documents by owner")?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(rows.into_iter().map(into_document).collect())
}

/// Remove every document that expired at or before `now_millis`.
pub async fn remove_expired(
    backend: &SqlxBackend,
    collection: Collection,
    now_millis: i64,
) -> Result<Vec<Document>> {
    let table = collection.name();
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM {table}
         WHERE expires_at IS NOT NULL AND expires_at <= $1 {NEWEST_FIRST}"
    ))
    .bind(now_millis)
    .fetch_all(&mut *tx)
    .await
    .sql_context("Failed to list expired documents")?;

    sqlx::query(&format!(
        "DELETE FROM {table} WHERE expires_at IS NOT NULL AND expires_at <= $1"
    ))
    .bind(now_millis)
    .execute(&mut *tx)
    .await
    .sql_context("Failed to delete expired documents")?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(rows.into_iter().map(into_document).collect())
}

/// Number of documents in a collection.
pub async fn count(backend: &SqlxBackend, collection: Collection) -> Result<usize> {
    let table = collection.name();
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(backend.pool())
        .await
        .sql_context("Failed to count documents")?;
    Ok(usize::try_from(count).unwrap_or(0))
}
