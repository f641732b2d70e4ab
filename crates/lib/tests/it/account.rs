use dossier::account::{AccountRole, AccountStatus, NewAccount};
use dossier::service::AdminSeed;

use super::helpers::*;

#[tokio::test]
async fn test_find_by_email_returns_created_fields() {
    let ctx = test_context().await;
    let accounts = ctx.dossier.accounts();
    let created = accounts
        .create(NewAccount::new("Ann", "ann@x.com", "secret").with_phone("555"))
        .await
        .unwrap();

    let found = accounts.find_by_email("ann@x.com").await.unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.name, "Ann");
    assert_eq!(found.email, "ann@x.com");
    assert_eq!(found.phone_number.as_deref(), Some("555"));
    assert_eq!(found.role, AccountRole::User);
    assert_eq!(found.status, AccountStatus::Active);
    assert_eq!(found.created_at, created.created_at);
    assert!(found.last_login_at.is_none());

    // The plaintext is never stored.
    assert_ne!(found.password_hash, "secret");
    assert!(accounts.verify_password(&found, "secret").unwrap());
    assert!(!accounts.verify_password(&found, "Secret").unwrap());
}

#[tokio::test]
async fn test_email_lookup_is_case_insensitive() {
    let ctx = test_context().await;
    let created = ctx
        .dossier
        .accounts()
        .create(NewAccount::new("Ann", "  Ann@X.com ", "secret"))
        .await
        .unwrap();
    assert_eq!(created.email, "ann@x.com");

    let found = ctx.dossier.accounts().find_by_email("ANN@x.COM").await.unwrap();
    assert_eq!(found.id, created.id);
}

#[tokio::test]
async fn test_duplicate_email_adds_only_one_account() {
    let ctx = test_context().await;
    let accounts = ctx.dossier.accounts();
    accounts
        .create(NewAccount::new("Ann", "ann@x.com", "secret"))
        .await
        .unwrap();

    let err = accounts
        .create(NewAccount::new("Other Ann", "ANN@x.com", "secret"))
        .await
        .unwrap_err();
    assert!(err.is_duplicate());
    assert_eq!(err.module(), "account");
    assert_eq!(accounts.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_validates_input() {
    let ctx = test_context().await;
    let accounts = ctx.dossier.accounts();

    for input in [
        NewAccount::new("  ", "ann@x.com", "secret"),
        NewAccount::new("Ann", "not-an-email", "secret"),
        NewAccount::new("Ann", "ann@x.com", "pw"),
    ] {
        let err = accounts.create(input).await.unwrap_err();
        assert!(err.is_validation_error(), "{err}");
    }
    assert_eq!(accounts.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let ctx = test_context().await;
    assert!(
        ctx.dossier
            .accounts()
            .find_by_id("missing")
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        ctx.dossier
            .accounts()
            .find_by_email("nobody@x.com")
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn test_status_and_role_updates_bump_updated_at() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;

    let inactive = ctx
        .dossier
        .set_account_status(&account.id, AccountStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(inactive.status, AccountStatus::Inactive);
    assert!(inactive.updated_at > account.updated_at);

    let admin = ctx
        .dossier
        .set_account_role(&account.id, AccountRole::Admin)
        .await
        .unwrap();
    assert_eq!(admin.role, AccountRole::Admin);

    let stats = ctx.dossier.accounts().stats().await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.inactive, 1);
    assert_eq!(stats.admins, 1);
}

#[tokio::test]
async fn test_authenticate_issues_token_and_records_login() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;

    let session = ctx
        .dossier
        .authenticate("Ann@X.com", "password123")
        .await
        .unwrap();
    assert_eq!(session.account.id, account.id);
    assert!(session.account.last_login_at.is_some());

    let claims = ctx.dossier.verify_token(&session.token).unwrap();
    assert_eq!(claims.sub, account.id);
    assert_eq!(claims.email, "ann@x.com");
    assert!(!claims.is_admin());
}

#[tokio::test]
async fn test_wrong_password_does_not_record_login() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;

    let err = ctx
        .dossier
        .authenticate("ann@x.com", "wrong-password")
        .await
        .unwrap_err();
    assert!(err.is_authentication_error());

    let err = ctx
        .dossier
        .authenticate("nobody@x.com", "password123")
        .await
        .unwrap_err();
    assert!(err.is_authentication_error());
    assert!(!err.is_not_found());

    let stored = ctx.dossier.accounts().find_by_id(&account.id).await.unwrap();
    assert!(stored.last_login_at.is_none());
}

#[tokio::test]
async fn test_inactive_account_cannot_log_in() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    ctx.dossier
        .set_account_status(&account.id, AccountStatus::Inactive)
        .await
        .unwrap();

    let err = ctx
        .dossier
        .authenticate("ann@x.com", "password123")
        .await
        .unwrap_err();
    assert!(err.is_authentication_error());
    assert!(matches!(
        err,
        dossier::Error::Account(dossier::account::AccountError::AccountInactive { .. })
    ));
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let ctx = test_context().await;
    create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    let session = ctx
        .dossier
        .authenticate("ann@x.com", "password123")
        .await
        .unwrap();

    let mut tampered = session.token.clone();
    tampered.push('x');
    assert!(
        ctx.dossier
            .verify_token(&tampered)
            .unwrap_err()
            .is_authentication_error()
    );
}

#[tokio::test]
async fn test_ensure_admin_runs_once() {
    let ctx = test_context().await;
    let seed = AdminSeed {
        name: "Admin".to_string(),
        email: "admin@x.com".to_string(),
        password: "admin-pass".to_string(),
    };

    let created = ctx.dossier.ensure_admin(seed.clone()).await.unwrap().unwrap();
    assert_eq!(created.role, AccountRole::Admin);
    assert!(ctx.dossier.ensure_admin(seed).await.unwrap().is_none());

    // The admin gets a profile and settings like any other account.
    let view = ctx.dossier.get_complete_user_view(&created.id).await.unwrap();
    assert_eq!(view.account.role, AccountRole::Admin);
    assert_eq!(ctx.dossier.accounts().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_ensure_admin_promotes_existing_account() {
    let ctx = test_context().await;
    let existing = create_account(&ctx.dossier, "Ann", "ann@x.com").await;

    let promoted = ctx
        .dossier
        .ensure_admin(AdminSeed {
            name: "Admin".to_string(),
            email: "ann@x.com".to_string(),
            password: "ignored".to_string(),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(promoted.id, existing.id);
    assert_eq!(promoted.role, AccountRole::Admin);
    assert_eq!(ctx.dossier.accounts().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_admin_created_account_takes_role_and_status() {
    let ctx = test_context().await;
    let created = ctx
        .dossier
        .create_account_as_admin(
            NewAccount::new("Moe", "moe@x.com", "password123"),
            AccountRole::Admin,
            AccountStatus::Inactive,
        )
        .await
        .unwrap();
    assert_eq!(created.role, AccountRole::Admin);
    assert_eq!(created.status, AccountStatus::Inactive);

    let stored = ctx.dossier.get_account(&created.id).await.unwrap();
    assert_eq!(stored.role, AccountRole::Admin);
    assert_eq!(stored.status, AccountStatus::Inactive);
    ctx.dossier.profiles().get(&created.id).await.unwrap();
    ctx.dossier.settings().get(&created.id).await.unwrap();

    let err = ctx
        .dossier
        .authenticate("moe@x.com", "password123")
        .await
        .unwrap_err();
    assert!(err.is_authentication_error());

    let err = ctx
        .dossier
        .create_account_as_admin(
            NewAccount::new("Bad", "not-an-email", "password123"),
            AccountRole::User,
            AccountStatus::Active,
        )
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(ctx.dossier.accounts().count().await.unwrap(), 1);
}
