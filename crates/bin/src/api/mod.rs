//! HTTP API over a [`Dossier`] handle.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path as UrlPath, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dossier::{
    CompleteUserView, Dossier, Session, UploadRequest, UserStats,
    account::{AccountRole, AccountStatus, AccountView, NewAccount},
    backend::BackendImpl,
    files::{FileCategory, FileRecord},
    objstore::LocalDirectory,
    profile::{Profile, ProfileUpdate},
    service::CascadeReport,
    settings::{ExportFormat, UserSettings},
};

mod auth;
mod error;

pub use auth::{AdminUser, AuthUser};
pub use error::ApiError;

use crate::backend::backend_kind;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

type ApiResult<T> = Result<T, ApiError>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dossier: Dossier,
    pub backend: Arc<dyn BackendImpl>,
    /// The primary object store, served under `/files`.
    pub files: Arc<LocalDirectory>,
}

/// Every mounted route as `(method, path, description)`, in router syntax.
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Health check"),
    ("POST", "/api/accounts", "Register an account"),
    ("POST", "/api/login", "Exchange credentials for a token"),
    ("GET", "/api/me", "Complete user view"),
    ("PATCH", "/api/me/profile", "Update profile"),
    ("PUT", "/api/me/settings", "Change one setting"),
    ("GET", "/api/me/files", "List uploads"),
    ("POST", "/api/me/files", "Upload a file (?name=..&category=..&public=..)"),
    ("GET", "/api/me/export", "Download a data export (?format=json|csv)"),
    ("GET", "/api/admin/stats", "Totals (admin)"),
    ("GET", "/api/admin/accounts", "List accounts (admin)"),
    ("POST", "/api/admin/accounts", "Create account with role and status (admin)"),
    ("DELETE", "/api/admin/accounts/{id}", "Delete account and its data (admin)"),
    ("PUT", "/api/admin/accounts/{id}/status", "Activate or deactivate (admin)"),
    ("PUT", "/api/admin/accounts/{id}/role", "Change role (admin)"),
    ("GET", "/files/{*key}", "Stored file contents (public or own)"),
];

/// Build the router with every route mounted.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/accounts", post(handle_register))
        .route("/api/login", post(handle_login))
        .route("/api/me", get(handle_me))
        .route("/api/me/profile", patch(handle_update_profile))
        .route("/api/me/settings", put(handle_update_setting))
        .route(
            "/api/me/files",
            get(handle_list_files)
                .post(handle_upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/me/export", get(handle_export))
        .route("/api/admin/stats", get(handle_admin_stats))
        .route(
            "/api/admin/accounts",
            get(handle_admin_accounts).post(handle_admin_create),
        )
        .route("/api/admin/accounts/{id}", delete(handle_admin_delete))
        .route("/api/admin/accounts/{id}/status", put(handle_admin_status))
        .route("/api/admin/accounts/{id}/role", put(handle_admin_role))
        .route("/files/{*key}", get(handle_stored_file))
        .with_state(state)
}

// ============================================================================
// Health
// ============================================================================

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
}

/// Handler for GET /health
async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        backend: backend_kind(state.backend.as_ref()),
    })
}

// ============================================================================
// Accounts and sessions
// ============================================================================

/// Handler for POST /api/accounts
async fn handle_register(
    State(state): State<AppState>,
    Json(input): Json<NewAccount>,
) -> ApiResult<(StatusCode, Json<AccountView>)> {
    let account = state.dossier.create_account(input).await?;
    tracing::info!(account_id = %account.id, "Registered account");
    Ok((StatusCode::CREATED, Json(account)))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Handler for POST /api/login
async fn handle_login(
    State(state): State<AppState>,
    Json(login): Json<LoginRequest>,
) -> ApiResult<Json<Session>> {
    let session = state
        .dossier
        .authenticate(&login.email, &login.password)
        .await?;
    Ok(Json(session))
}

// ============================================================================
// The caller's own data
// ============================================================================

/// Handler for GET /api/me
async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CompleteUserView>> {
    let view = state
        .dossier
        .get_complete_user_view(user.account_id())
        .await?;
    Ok(Json(view))
}

/// Handler for PATCH /api/me/profile
async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Profile>> {
    let profile = state
        .dossier
        .update_profile(user.account_id(), update)
        .await?;
    Ok(Json(profile))
}

#[derive(Deserialize)]
struct SettingChange {
    path: String,
    value: Value,
}

/// Handler for PUT /api/me/settings
async fn handle_update_setting(
    State(state): State<AppState>,
    user: AuthUser,
    Json(change): Json<SettingChange>,
) -> ApiResult<Json<UserSettings>> {
    let settings = state
        .dossier
        .update_setting(
            user.account_id(),
            &change.path,
            change.value,
            user.account_id(),
        )
        .await?;
    Ok(Json(settings))
}

#[derive(Deserialize)]
struct ListFilesQuery {
    category: Option<FileCategory>,
}

/// Handler for GET /api/me/files
async fn handle_list_files(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListFilesQuery>,
) -> ApiResult<Json<Vec<FileRecord>>> {
    let files = state
        .dossier
        .list_files(user.account_id(), query.category)
        .await?;
    Ok(Json(files))
}

#[derive(Deserialize)]
struct UploadQuery {
    name: String,
    #[serde(default)]
    category: FileCategory,
    #[serde(default)]
    public: bool,
}

/// Handler for POST /api/me/files
///
/// The body is the raw file content; the name and category come from the
/// query string and the MIME type from `Content-Type`.
async fn handle_upload(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<FileRecord>)> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Upload body is empty".to_string()));
    }
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream");

    let mut request = UploadRequest::new(user.account_id(), query.name, mime_type, body.to_vec())
        .with_category(query.category);
    request.is_public = query.public;

    let record = state.dossier.upload_file(request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Deserialize)]
struct ExportQuery {
    #[serde(default)]
    format: ExportFormat,
}

/// Handler for GET /api/me/export
async fn handle_export(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let export = state
        .dossier
        .export_snapshot(user.account_id(), query.format)
        .await?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}

// ============================================================================
// Administration
// ============================================================================

/// Handler for GET /api/admin/stats
async fn handle_admin_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<UserStats>> {
    Ok(Json(state.dossier.user_stats().await?))
}

/// Handler for GET /api/admin/accounts
async fn handle_admin_accounts(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<AccountView>>> {
    Ok(Json(state.dossier.list_accounts().await?))
}

/// Body of POST /api/admin/accounts
#[derive(Deserialize)]
struct AdminNewAccount {
    #[serde(flatten)]
    account: NewAccount,
    #[serde(default)]
    role: AccountRole,
    #[serde(default)]
    status: AccountStatus,
}

/// Handler for POST /api/admin/accounts
async fn handle_admin_create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(input): Json<AdminNewAccount>,
) -> ApiResult<(StatusCode, Json<AccountView>)> {
    let account = state
        .dossier
        .create_account_as_admin(input.account, input.role, input.status)
        .await?;
    tracing::info!(
        account_id = %account.id,
        role = account.role.as_str(),
        created_by = %admin.sub,
        "Created account"
    );
    Ok((StatusCode::CREATED, Json(account)))
}

/// Handler for DELETE /api/admin/accounts/{id}
async fn handle_admin_delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    UrlPath(id): UrlPath<String>,
) -> ApiResult<Json<CascadeReport>> {
    if admin.sub == id {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }
    let report = state.dossier.delete_account_cascade(&id).await?;
    tracing::info!(account_id = %id, deleted_by = %admin.sub, "Deleted account");
    Ok(Json(report))
}

#[derive(Deserialize)]
struct StatusChange {
    status: AccountStatus,
}

/// Handler for PUT /api/admin/accounts/{id}/status
async fn handle_admin_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    UrlPath(id): UrlPath<String>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Json<AccountView>> {
    Ok(Json(
        state.dossier.set_account_status(&id, change.status).await?,
    ))
}

#[derive(Deserialize)]
struct RoleChange {
    role: AccountRole,
}

/// Handler for PUT /api/admin/accounts/{id}/role
async fn handle_admin_role(
    State(state): State<AppState>,
    _admin: AdminUser,
    UrlPath(id): UrlPath<String>,
    Json(change): Json<RoleChange>,
) -> ApiResult<Json<AccountView>> {
    Ok(Json(state.dossier.set_account_role(&id, change.role).await?))
}

// ============================================================================
// Stored files
// ============================================================================

/// Handler for GET /files/{*key}
///
/// Public files are served to anyone. Other files need a token for the owner
/// or an account on the file's access list; everyone else gets a 404.
async fn handle_stored_file(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    UrlPath(key): UrlPath<String>,
) -> ApiResult<Response> {
    let record = state
        .dossier
        .readable_file(&key, viewer.as_ref().map(AuthUser::account_id))
        .await?;
    let bytes = state.files.read(&key).await?;
    Ok(([(header::CONTENT_TYPE, record.mime_type)], bytes).into_response())
}
