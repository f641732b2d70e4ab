use std::sync::Arc;

use dossier::account::NewAccount;
use dossier::backend::{BackendImpl, Collection};
use dossier::files::FileCategory;
use dossier::service::{CascadeStep, ServiceError};
use dossier::settings::ExportFormat;
use dossier::{Error, UploadRequest};
use serde_json::{Value, json};

use super::helpers::*;

async fn upload(ctx: &TestContext, owner: &str, name: &str) -> dossier::files::FileRecord {
    ctx.dossier
        .upload_file(
            UploadRequest::new(owner, name, "application/pdf", name.as_bytes().to_vec())
                .with_category(FileCategory::Document),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_complete_view_scores_populated_fields() {
    let ctx = test_context().await;
    let account = ctx
        .dossier
        .create_account(NewAccount::new("Ann", "ann@x.com", "password123").with_phone("555"))
        .await
        .unwrap();

    let view = ctx
        .dossier
        .get_complete_user_view(&account.id)
        .await
        .unwrap();
    assert_eq!(view.account.id, account.id);
    assert_eq!(view.profile.account_id, account.id);
    assert_eq!(view.settings.account_id, account.id);
    assert!(view.files.is_empty());
    assert_eq!(view.file_stats.total_files, 0);
    // name, email, phone: 3 of 8
    assert_eq!(view.overall_completeness, 38);
}

#[tokio::test]
async fn test_complete_view_reflects_settings_and_files() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    ctx.dossier
        .update_setting(&account.id, "general.timezone", json!("Asia/Tokyo"), "ann")
        .await
        .unwrap();
    let first = upload(&ctx, &account.id, "a.pdf").await;
    let second = upload(&ctx, &account.id, "b.pdf").await;

    let view = ctx
        .dossier
        .get_complete_user_view(&account.id)
        .await
        .unwrap();
    // name, email, timezone: 3 of 8
    assert_eq!(view.overall_completeness, 38);
    let ids: Vec<_> = view.files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    assert_eq!(view.file_stats.total_files, 2);
}

#[tokio::test]
async fn test_complete_view_for_unknown_account_creates_nothing() {
    let ctx = test_context().await;
    let err = ctx
        .dossier
        .get_complete_user_view("missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(ctx.dossier.profiles().count().await.unwrap(), 0);
    assert_eq!(ctx.dossier.settings().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_complete_view_fills_in_missing_profile_and_settings() {
    let ctx = test_context().await;
    // Created through the store directly, so no profile or settings exist.
    let account = ctx
        .dossier
        .accounts()
        .create(NewAccount::new("Ann", "ann@x.com", "password123"))
        .await
        .unwrap();

    let view = ctx
        .dossier
        .get_complete_user_view(&account.id)
        .await
        .unwrap();
    assert_eq!(view.profile.account_id, account.id);
    assert_eq!(ctx.dossier.profiles().count().await.unwrap(), 1);
    assert_eq!(ctx.dossier.settings().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_cascade_removes_everything() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    let other = create_account(&ctx.dossier, "Bob", "bob@x.com").await;
    let first = upload(&ctx, &account.id, "a.pdf").await;
    upload(&ctx, &account.id, "b.pdf").await;
    let kept = upload(&ctx, &other.id, "c.pdf").await;

    let report = ctx
        .dossier
        .delete_account_cascade(&account.id)
        .await
        .unwrap();
    assert!(report.account_deleted);
    assert!(report.profile_deleted);
    assert!(report.settings_deleted);
    assert_eq!(report.files_deleted, 2);
    assert_eq!(report.objects_deleted, 2);

    assert!(
        ctx.dossier
            .accounts()
            .find_by_id(&account.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        ctx.dossier
            .profiles()
            .get(&account.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        ctx.dossier
            .settings()
            .get(&account.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(ctx.dossier.list_files(&account.id, None).await.unwrap().is_empty());
    assert!(ctx.primary.read(&first.storage_path).await.is_none());

    // Other accounts are untouched.
    assert!(ctx.dossier.get_complete_user_view(&other.id).await.is_ok());
    assert!(ctx.primary.read(&kept.storage_path).await.is_some());
}

#[tokio::test]
async fn test_cascade_continues_after_a_failed_step() {
    let inner = test_backend().await;
    let flaky: Arc<dyn BackendImpl> = Arc::new(FlakyBackend::new(inner, Collection::Accounts));
    let ctx = build_context(flaky, false);
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    upload(&ctx, &account.id, "a.pdf").await;
    upload(&ctx, &account.id, "b.pdf").await;

    let err = ctx
        .dossier
        .delete_account_cascade(&account.id)
        .await
        .unwrap_err();
    assert!(err.is_cascade_failure());

    let Error::Service(ServiceError::PartialCascadeFailure {
        failures, report, ..
    }) = err
    else {
        panic!("expected a partial cascade failure");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].step, CascadeStep::Account);
    assert!(!report.account_deleted);
    assert!(report.profile_deleted);
    assert!(report.settings_deleted);
    assert_eq!(report.files_deleted, 2);

    // The remaining steps still ran.
    assert!(ctx.dossier.list_files(&account.id, None).await.unwrap().is_empty());
    assert!(
        ctx.dossier
            .profiles()
            .get(&account.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        ctx.dossier
            .settings()
            .get(&account.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
    // The failed step left its record in place.
    assert!(ctx.dossier.accounts().find_by_id(&account.id).await.is_ok());
}

#[tokio::test]
async fn test_cascade_reports_unreachable_object_store() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    upload(&ctx, &account.id, "a.pdf").await;
    ctx.primary.set_available(false);

    let err = ctx
        .dossier
        .delete_account_cascade(&account.id)
        .await
        .unwrap_err();
    let Error::Service(ServiceError::PartialCascadeFailure {
        failures, report, ..
    }) = err
    else {
        panic!("expected a partial cascade failure");
    };
    assert!(failures.iter().all(|f| f.step == CascadeStep::StoredObjects));
    assert!(report.account_deleted);
    assert_eq!(report.files_deleted, 1);
    assert_eq!(report.objects_deleted, 0);
}

#[tokio::test]
async fn test_cascade_on_unknown_account_is_not_found() {
    let ctx = test_context().await;
    let err = ctx
        .dossier
        .delete_account_cascade("missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_cascade_failure());
}

#[tokio::test]
async fn test_cascade_tolerates_missing_profile_and_settings() {
    let ctx = test_context().await;
    let account = ctx
        .dossier
        .accounts()
        .create(NewAccount::new("Ann", "ann@x.com", "password123"))
        .await
        .unwrap();

    let report = ctx
        .dossier
        .delete_account_cascade(&account.id)
        .await
        .unwrap();
    assert!(report.account_deleted);
    assert!(!report.profile_deleted);
    assert!(!report.settings_deleted);
    assert_eq!(report.files_deleted, 0);
}

#[tokio::test]
async fn test_json_export_wraps_the_view() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    upload(&ctx, &account.id, "a.pdf").await;

    let export = ctx
        .dossier
        .export_snapshot(&account.id, ExportFormat::Json)
        .await
        .unwrap();
    assert_eq!(export.content_type, "application/json");
    assert_eq!(export.filename, format!("user-data-{}.json", account.id));
    assert!(export.body.contains('\n'));
    assert!(!export.body.contains("passwordHash"));
    assert!(!export.body.contains("$argon2"));

    let parsed: Value = serde_json::from_str(&export.body).unwrap();
    assert_eq!(parsed["accountId"], json!(account.id));
    assert_eq!(parsed["format"], json!("json"));
    assert_eq!(parsed["data"]["account"]["email"], json!("ann@x.com"));
    assert_eq!(parsed["data"]["files"].as_array().unwrap().len(), 1);
    assert!(parsed["exportDate"].is_string());
}

#[tokio::test]
async fn test_csv_export_flattens_fields() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann \"Annie\"", "ann@x.com").await;

    let export = ctx
        .dossier
        .export_snapshot(&account.id, ExportFormat::Csv)
        .await
        .unwrap();
    assert_eq!(export.content_type, "text/csv");

    let mut lines = export.body.lines();
    assert_eq!(lines.next(), Some("Field,Value"));
    let body = export.body.as_str();
    assert!(body.contains(r#""data.account.email","ann@x.com""#));
    assert!(body.contains(r#""data.account.name","Ann ""Annie""""#));
    assert!(body.contains(r#""data.settings.appearance.theme","light""#));
    assert!(body.contains(r#""data.files","[]""#));
    assert!(body.contains(r#""data.profile.bio","""#));
    assert!(!body.contains("passwordHash"));
}

#[tokio::test]
async fn test_xml_export_is_unsupported() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    let err = ctx
        .dossier
        .export_snapshot(&account.id, ExportFormat::Xml)
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(err.module(), "service");
}

#[tokio::test]
async fn test_user_stats_counts_every_collection() {
    let ctx = test_context().await;
    let ann = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    create_account(&ctx.dossier, "Bob", "bob@x.com").await;
    upload(&ctx, &ann.id, "a.pdf").await;

    let stats = ctx.dossier.user_stats().await.unwrap();
    assert_eq!(stats.accounts.total, 2);
    assert_eq!(stats.accounts.active, 2);
    assert_eq!(stats.total_profiles, 2);
    assert_eq!(stats.total_settings, 2);
    assert_eq!(stats.total_files, 1);

    let listed = ctx.dossier.list_accounts().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].email, "bob@x.com");
}

/// Callers outside the crate must keep a catch-all arm when matching on
/// [`Error`].
fn error_source(err: &Error) -> &'static str {
    match err {
        Error::Backend(_) => "storage",
        Error::Service(_) => "service",
        _ => "other",
    }
}

#[tokio::test]
async fn test_errors_match_with_catch_all() {
    let ctx = test_context().await;
    let err = ctx.dossier.get_account("missing").await.unwrap_err();
    assert_eq!(error_source(&err), "other");
    assert_eq!(err.module(), "account");

    let err = ctx
        .dossier
        .delete_account_cascade("missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
