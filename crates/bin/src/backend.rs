//! Backend creation and utility functions.

use std::path::PathBuf;
use std::sync::Arc;

use dossier::backend::{
    BackendImpl,
    database::{DbKind, InMemory, Postgres, Sqlite, SqlxBackend},
};

use crate::cli::{Backend, BackendConfig};

pub const SQLITE_FILE: &str = "dossier.db";
pub const JSON_FILE: &str = "dossier.json";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

/// Human-readable description of the configured backend
pub fn backend_label(config: &BackendConfig) -> String {
    match config.backend {
        Backend::Sqlite => {
            let dir = config.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            format!("sqlite ({})", dir.join(SQLITE_FILE).display())
        }
        Backend::Postgres => match &config.postgres_url {
            Some(url) => format!("postgres ({})", redact_postgres_url(url)),
            None => "postgres".to_string(),
        },
        Backend::Inmemory => {
            let dir = config.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            format!("inmemory ({})", dir.join(JSON_FILE).display())
        }
    }
}

/// Name of the storage engine behind a running backend
pub fn backend_kind(backend: &dyn BackendImpl) -> &'static str {
    if let Some(sqlx) = backend.as_any().downcast_ref::<SqlxBackend>() {
        match sqlx.kind() {
            DbKind::Sqlite => "sqlite",
            DbKind::Postgres => "postgres",
        }
    } else if backend.as_any().is::<InMemory>() {
        "inmemory"
    } else {
        "unknown"
    }
}

/// Resolve the data directory, creating it if needed.
pub async fn data_dir(config: &BackendConfig) -> std::io::Result<PathBuf> {
    let data_dir = config
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    tokio::fs::create_dir_all(&data_dir).await?;
    Ok(data_dir)
}

/// Create the appropriate backend based on configuration
pub async fn create_backend(
    config: &BackendConfig,
) -> Result<Arc<dyn BackendImpl>, Box<dyn std::error::Error>> {
    let data_dir = data_dir(config).await?;

    match config.backend {
        Backend::Sqlite => {
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!("Using SQLite backend at {}", db_path.display());
            Ok(Arc::new(Sqlite::open_sqlite(&db_path).await?))
        }
        Backend::Postgres => {
            let url = config
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or DOSSIER_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL backend at {}", display_url);

            match Postgres::connect_postgres(url).await {
                Ok(backend) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Arc::new(backend))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {}: {}", display_url, e).into())
                }
            }
        }
        Backend::Inmemory => {
            let json_path = data_dir.join(JSON_FILE);
            tracing::info!(
                "Using in-memory backend with persistence at {}",
                json_path.display()
            );
            match InMemory::load_from_file(&json_path).await {
                Ok(backend) => {
                    tracing::info!("Loaded existing data from {}", json_path.display());
                    Ok(Arc::new(backend))
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {e}. Starting empty", json_path.display());
                    Ok(Arc::new(InMemory::new()))
                }
            }
        }
    }
}
