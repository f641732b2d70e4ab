use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use dossier::{
    Dossier, FixedClock, Result,
    account::{AccountView, NewAccount},
    auth::TokenConfig,
    backend::{BackendError, BackendImpl, Collection, Document, database::InMemory},
    objstore::InMemoryObjects,
};

// ==========================
// CORE TEST FACTORIES
// ==========================
// Single point of change for backend matrix testing via TEST_BACKEND.

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
/// - "postgres": PostgreSQL in a fresh schema (requires `postgres` feature
///   and TEST_POSTGRES_URL)
///
/// # Example
/// ```bash
/// TEST_BACKEND=sqlite cargo test --features sqlite
/// ```
pub async fn test_backend() -> Arc<dyn BackendImpl> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use dossier::backend::database::Sqlite;
                Arc::new(
                    Sqlite::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite backend"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use dossier::backend::database::Postgres;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/dossier_test".to_string());
                Arc::new(
                    Postgres::connect_postgres_isolated(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => Arc::new(InMemory::new()),
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite, postgres")
        }
    }
}

/// Everything a service test needs to poke at.
pub struct TestContext {
    pub dossier: Dossier,
    pub clock: Arc<FixedClock>,
    pub primary: Arc<InMemoryObjects>,
    pub mirror: Option<Arc<InMemoryObjects>>,
}

pub const TEST_SECRET: &str = "integration-test-secret";

/// A service over the test backend with a [`FixedClock`] and an in-memory
/// primary object store.
pub async fn test_context() -> TestContext {
    build_context(test_backend().await, false)
}

/// Like [`test_context`], with an in-memory mirror store.
pub async fn test_context_with_mirror() -> TestContext {
    build_context(test_backend().await, true)
}

pub fn build_context(backend: Arc<dyn BackendImpl>, with_mirror: bool) -> TestContext {
    let clock = Arc::new(FixedClock::default());
    let primary = Arc::new(InMemoryObjects::new("primary"));
    let mirror = with_mirror.then(|| Arc::new(InMemoryObjects::new("mirror")));

    let mut builder = Dossier::builder(backend)
        .clock(clock.clone())
        .token_config(TokenConfig::new(TEST_SECRET))
        .primary_store(primary.clone());
    if let Some(mirror) = &mirror {
        builder = builder.mirror_store(mirror.clone());
    }
    let dossier = builder.build().expect("Failed to build test service");

    TestContext {
        dossier,
        clock,
        primary,
        mirror,
    }
}

/// Create an account through the service, with its profile and settings.
pub async fn create_account(dossier: &Dossier, name: &str, email: &str) -> AccountView {
    dossier
        .create_account(NewAccount::new(name, email, "password123"))
        .await
        .expect("Failed to create account")
}

// ==========================
// FAULT INJECTION
// ==========================

/// Wraps a backend and fails every removal from one collection.
pub struct FlakyBackend {
    inner: Arc<dyn BackendImpl>,
    fail_remove_in: Collection,
}

impl FlakyBackend {
    pub fn new(inner: Arc<dyn BackendImpl>, fail_remove_in: Collection) -> Self {
        Self {
            inner,
            fail_remove_in,
        }
    }

    fn injected(&self) -> dossier::Error {
        BackendError::FileIo {
            source: std::io::Error::other(format!(
                "injected failure removing from {}",
                self.fail_remove_in
            )),
        }
        .into()
    }
}

#[async_trait]
impl BackendImpl for FlakyBackend {
    async fn insert(&self, collection: Collection, document: Document) -> Result<()> {
        self.inner.insert(collection, document).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn find_by_unique_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<Document>> {
        self.inner.find_by_unique_key(collection, key).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        self.inner.list(collection).await
    }

    async fn list_by_owner(
        &self,
        collection: Collection,
        owner_id: &str,
        tag: Option<&str>,
    ) -> Result<Vec<Document>> {
        self.inner.list_by_owner(collection, owner_id, tag).await
    }

    async fn replace(&self, collection: Collection, document: Document) -> Result<()> {
        self.inner.replace(collection, document).await
    }

    async fn increment_counter(
        &self,
        collection: Collection,
        key: &str,
        field: &str,
    ) -> Result<Option<Document>> {
        self.inner.increment_counter(collection, key, field).await
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<Document> {
        if collection == self.fail_remove_in {
            return Err(self.injected());
        }
        self.inner.remove(collection, id).await
    }

    async fn remove_by_owner(
        &self,
        collection: Collection,
        owner_id: &str,
    ) -> Result<Vec<Document>> {
        if collection == self.fail_remove_in {
            return Err(self.injected());
        }
        self.inner.remove_by_owner(collection, owner_id).await
    }

    async fn remove_expired(
        &self,
        collection: Collection,
        now_millis: i64,
    ) -> Result<Vec<Document>> {
        self.inner.remove_expired(collection, now_millis).await
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        self.inner.count(collection).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
