//! Serve command - runs the Dossier HTTP API.

use std::{sync::Arc, time::Duration};

use tokio::signal::unix::{SignalKind, signal};

use dossier::{
    AdminSeed, Dossier,
    auth::TokenConfig,
    backend::{BackendImpl, database::InMemory},
    objstore::LocalDirectory,
};

use crate::api::{self, AppState};
use crate::backend::{JSON_FILE, create_backend, data_dir};
use crate::cli::{ServeArgs, TokenArgs};

/// How often expired uploads are purged.
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

const ADMIN_NAME: &str = "Administrator";

fn token_config(args: &TokenArgs) -> TokenConfig {
    let config = match &args.jwt_secret {
        Some(secret) => TokenConfig::new(secret.clone()),
        None => {
            tracing::warn!("No JWT secret configured; tokens will not survive a restart");
            TokenConfig::random()
        }
    };
    config
        .with_issuer(args.jwt_issuer.clone())
        .with_audience(args.jwt_audience.clone())
        .with_expiration_seconds(args.token_ttl)
}

/// Run the Dossier server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let data_dir = data_dir(&args.backend_config).await?;

    let files_dir = data_dir.join("files");
    tokio::fs::create_dir_all(&files_dir).await?;
    let files = Arc::new(LocalDirectory::new(files_dir, args.public_url.clone()));
    let mut builder = Dossier::builder(Arc::clone(&backend))
        .token_config(token_config(&args.tokens))
        .primary_store(files.clone());
    if let Some(mirror_dir) = &args.mirror_dir {
        tracing::info!("Mirroring uploads to {}", mirror_dir.display());
        let mirror_url = format!("file://{}", mirror_dir.display());
        builder = builder.mirror_store(Arc::new(LocalDirectory::new(
            mirror_dir.clone(),
            mirror_url,
        )));
    }
    let dossier = builder.build()?;

    if let (Some(email), Some(password)) = (&args.admin_email, &args.admin_password) {
        let seed = AdminSeed {
            name: ADMIN_NAME.to_string(),
            email: email.clone(),
            password: password.clone(),
        };
        if dossier.ensure_admin(seed).await?.is_none() {
            tracing::info!("Admin account already present");
        }
    }

    let purge_task = tokio::spawn(purge_expired(dossier.clone()));

    let app_state = AppState {
        dossier: dossier.clone(),
        backend: Arc::clone(&backend),
        files,
    };
    let app = api::router(app_state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    println!("Dossier server listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    for (method, path, description) in api::ENDPOINTS {
        println!("  {method:<6} {path:<34} - {description}");
    }
    println!();
    println!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge_task.abort();
    save_in_memory(backend.as_ref(), &data_dir.join(JSON_FILE)).await;

    println!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Failed to install signal handlers: {e}");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
        _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
    }
}

async fn purge_expired(dossier: Dossier) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match dossier.purge_expired_files().await {
            Ok(purged) if !purged.is_empty() => {
                tracing::info!(count = purged.len(), "Purged expired files");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Expired file purge failed: {e}"),
        }
    }
}

/// Persist the in-memory backend. Other backends are durable already.
async fn save_in_memory(backend: &dyn BackendImpl, path: &std::path::Path) {
    let Some(in_memory) = backend.as_any().downcast_ref::<InMemory>() else {
        return;
    };
    match in_memory.save_to_file(path).await {
        Ok(_) => {
            tracing::info!("Database saved to {}", path.display());
            println!("\nDatabase saved successfully");
        }
        Err(e) => {
            tracing::error!("Failed to save database: {e:?}");
            eprintln!("Failed to save database: {e:?}");
        }
    }
}
