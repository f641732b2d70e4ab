use dossier::settings::{DateFormat, Theme};
use serde_json::json;

use super::helpers::*;

#[tokio::test]
async fn test_new_account_gets_default_settings() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;

    let settings = ctx.dossier.settings().get(&account.id).await.unwrap();
    assert_eq!(settings.account_id, account.id);
    assert_eq!(settings.preferences.general.timezone, "UTC");
    assert_eq!(settings.preferences.appearance.theme, Theme::Light);
    assert!(settings.change_history.is_empty());
    assert!(!settings.has_custom_timezone());
}

#[tokio::test]
async fn test_update_theme_appends_one_history_entry() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    let before = ctx.dossier.settings().get(&account.id).await.unwrap();

    let updated = ctx
        .dossier
        .update_setting(&account.id, "appearance.theme", json!("dark"), &account.id)
        .await
        .unwrap();

    assert_eq!(updated.preferences.appearance.theme, Theme::Dark);
    assert_eq!(
        updated.change_history.len(),
        before.change_history.len() + 1
    );
    let entry = updated.change_history.last().unwrap();
    assert_eq!(entry.setting_path, "appearance.theme");
    assert_eq!(entry.old_value, json!("light"));
    assert_eq!(entry.new_value, json!("dark"));
    assert_eq!(entry.changed_by, account.id);
    assert!(updated.updated_at > before.updated_at);

    // Persisted, not just returned.
    let stored = ctx
        .dossier
        .settings()
        .get_setting(&account.id, "appearance.theme")
        .await
        .unwrap();
    assert_eq!(stored, json!("dark"));
}

#[tokio::test]
async fn test_custom_setting_is_stored_with_history() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;

    let updated = ctx
        .dossier
        .update_setting(
            &account.id,
            "customSettings.favouriteColour",
            json!("teal"),
            &account.id,
        )
        .await
        .unwrap();
    assert_eq!(
        updated.preferences.custom_settings.get("favouriteColour"),
        Some(&json!("teal"))
    );
    let entry = updated.change_history.last().unwrap();
    assert_eq!(entry.setting_path, "customSettings.favouriteColour");
    assert!(entry.old_value.is_null());
    assert_eq!(entry.new_value, json!("teal"));

    let settings = ctx.dossier.settings();
    assert_eq!(
        settings
            .get_setting(&account.id, "customSettings.favouriteColour")
            .await
            .unwrap(),
        json!("teal")
    );
    assert!(
        settings
            .get_setting(&account.id, "customSettings.unset")
            .await
            .unwrap()
            .is_null()
    );

    let err = settings
        .get_setting(&account.id, "customSettings")
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn test_history_accumulates_in_order() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;

    for (path, value) in [
        ("general.dateFormat", json!("dd/MM/yyyy")),
        ("general.timezone", json!("Europe/Lisbon")),
        ("notifications.email.types.marketing", json!(true)),
    ] {
        ctx.dossier
            .update_setting(&account.id, path, value, "admin")
            .await
            .unwrap();
    }

    let history = ctx.dossier.settings().history(&account.id).await.unwrap();
    let paths: Vec<_> = history.iter().map(|e| e.setting_path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "general.dateFormat",
            "general.timezone",
            "notifications.email.types.marketing"
        ]
    );
    assert!(history.windows(2).all(|w| w[0].changed_at < w[1].changed_at));

    let settings = ctx.dossier.settings().get(&account.id).await.unwrap();
    assert_eq!(settings.preferences.general.date_format, DateFormat::DayMonthYear);
    assert!(settings.has_custom_timezone());
}

#[tokio::test]
async fn test_invalid_updates_leave_history_unchanged() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;

    let bad = [
        ("appearance.colour", json!("dark")),
        ("appearance", json!({"theme": "dark"})),
        ("appearance.theme", json!("neon")),
        ("security.sessionTimeoutHours", json!(0)),
        ("communication.autoReplyMessage", json!("x".repeat(201))),
        ("", json!(1)),
    ];
    for (path, value) in bad {
        let err = ctx
            .dossier
            .update_setting(&account.id, path, value, "tester")
            .await
            .unwrap_err();
        assert!(err.is_validation_error(), "{path}: {err}");
    }

    let settings = ctx.dossier.settings().get(&account.id).await.unwrap();
    assert!(settings.change_history.is_empty());
    assert_eq!(settings.preferences.appearance.theme, Theme::Light);
}

#[tokio::test]
async fn test_update_before_defaults_is_not_found() {
    let ctx = test_context().await;
    let err = ctx
        .dossier
        .update_setting("no-such-account", "appearance.theme", json!("dark"), "tester")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.module(), "settings");
    assert_eq!(ctx.dossier.settings().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_or_create_defaults_is_idempotent() {
    let ctx = test_context().await;
    let settings = ctx.dossier.settings();
    let first = settings.get_or_create_defaults("acct-1").await.unwrap();
    let second = settings.get_or_create_defaults("acct-1").await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(settings.count().await.unwrap(), 1);
}
