use std::sync::Arc;

use dossier::backend::{BackendImpl, Collection, Document, database::InMemory};

use super::helpers::*;

fn document(id: &str, owner: &str, created_at: i64) -> Document {
    Document {
        id: id.to_string(),
        unique_key: None,
        owner_id: Some(owner.to_string()),
        tag: None,
        created_at,
        expires_at: None,
        body: format!(r#"{{"id":"{id}"}}"#),
    }
}

#[tokio::test]
async fn test_insert_get_and_count() {
    let backend = test_backend().await;
    backend
        .insert(Collection::Files, document("f1", "a1", 10))
        .await
        .unwrap();

    let fetched = backend.get(Collection::Files, "f1").await.unwrap();
    assert_eq!(fetched, Some(document("f1", "a1", 10)));
    assert_eq!(backend.get(Collection::Files, "missing").await.unwrap(), None);

    // Collections are independent.
    assert_eq!(backend.get(Collection::Profiles, "f1").await.unwrap(), None);
    assert_eq!(backend.count(Collection::Files).await.unwrap(), 1);
    assert_eq!(backend.count(Collection::Accounts).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_id_and_unique_key_are_rejected() {
    let backend = test_backend().await;
    let mut first = document("a1", "a1", 1);
    first.unique_key = Some("ann@x.com".to_string());
    backend.insert(Collection::Accounts, first).await.unwrap();

    let err = backend
        .insert(Collection::Accounts, document("a1", "a1", 2))
        .await
        .unwrap_err();
    assert!(err.is_duplicate());
    assert_eq!(err.module(), "backend");

    let mut second = document("a2", "a2", 2);
    second.unique_key = Some("ann@x.com".to_string());
    let err = backend
        .insert(Collection::Accounts, second)
        .await
        .unwrap_err();
    assert!(err.is_duplicate());
    assert_eq!(backend.count(Collection::Accounts).await.unwrap(), 1);

    let found = backend
        .find_by_unique_key(Collection::Accounts, "ann@x.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, "a1");
}

#[tokio::test]
async fn test_listing_is_newest_first_and_filters_by_owner_and_tag() {
    let backend = test_backend().await;
    let mut older = document("f1", "a1", 100);
    older.tag = Some("document".to_string());
    let mut newer = document("f2", "a1", 200);
    newer.tag = Some("image".to_string());
    backend.insert(Collection::Files, older).await.unwrap();
    backend.insert(Collection::Files, newer).await.unwrap();
    backend
        .insert(Collection::Files, document("f3", "a2", 300))
        .await
        .unwrap();

    let ids = |docs: Vec<Document>| docs.into_iter().map(|d| d.id).collect::<Vec<_>>();

    let all = backend
        .list_by_owner(Collection::Files, "a1", None)
        .await
        .unwrap();
    assert_eq!(ids(all), vec!["f2", "f1"]);

    let images = backend
        .list_by_owner(Collection::Files, "a1", Some("image"))
        .await
        .unwrap();
    assert_eq!(ids(images), vec!["f2"]);

    let everything = backend.list(Collection::Files).await.unwrap();
    assert_eq!(ids(everything), vec!["f3", "f2", "f1"]);
}

#[tokio::test]
async fn test_replace_requires_existing_document() {
    let backend = test_backend().await;
    let err = backend
        .replace(Collection::Profiles, document("p1", "a1", 1))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    backend
        .insert(Collection::Profiles, document("p1", "a1", 1))
        .await
        .unwrap();
    let mut changed = document("p1", "a1", 1);
    changed.body = r#"{"id":"p1","bio":"hi"}"#.to_string();
    backend
        .replace(Collection::Profiles, changed.clone())
        .await
        .unwrap();
    assert_eq!(
        backend.get(Collection::Profiles, "p1").await.unwrap(),
        Some(changed)
    );
}

#[tokio::test]
async fn test_remove_variants() {
    let backend = test_backend().await;
    for (id, owner, at) in [("f1", "a1", 1), ("f2", "a1", 2), ("f3", "a2", 3)] {
        backend
            .insert(Collection::Files, document(id, owner, at))
            .await
            .unwrap();
    }

    let removed = backend.remove(Collection::Files, "f3").await.unwrap();
    assert_eq!(removed.id, "f3");
    assert!(
        backend
            .remove(Collection::Files, "f3")
            .await
            .unwrap_err()
            .is_not_found()
    );

    let removed = backend
        .remove_by_owner(Collection::Files, "a1")
        .await
        .unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(backend.count(Collection::Files).await.unwrap(), 0);
}

#[tokio::test]
async fn test_remove_expired_only_takes_elapsed_documents() {
    let backend = test_backend().await;
    let mut expired = document("f1", "a1", 1);
    expired.expires_at = Some(1_000);
    let mut exactly_now = document("f2", "a1", 2);
    exactly_now.expires_at = Some(2_000);
    let mut later = document("f3", "a1", 3);
    later.expires_at = Some(3_000);
    for doc in [expired, exactly_now, later, document("f4", "a1", 4)] {
        backend.insert(Collection::Files, doc).await.unwrap();
    }

    let mut removed: Vec<String> = backend
        .remove_expired(Collection::Files, 2_000)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    removed.sort();
    assert_eq!(removed, vec!["f1", "f2"]);
    assert_eq!(backend.count(Collection::Files).await.unwrap(), 2);
}

#[tokio::test]
async fn test_in_memory_save_and_load_preserves_service_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dossier.json");

    let backend = Arc::new(InMemory::new());
    let ctx = build_context(backend.clone(), false);
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    backend.save_to_file(&path).await.unwrap();

    let loaded = Arc::new(InMemory::load_from_file(&path).await.unwrap());
    let reloaded = build_context(loaded.clone(), false);
    let view = reloaded
        .dossier
        .get_complete_user_view(&account.id)
        .await
        .unwrap();
    assert_eq!(view.account.email, "ann@x.com");
    assert_eq!(
        loaded.all_ids(Collection::Settings).await,
        backend.all_ids(Collection::Settings).await
    );

    // The unique index is rebuilt on load.
    let err = reloaded
        .dossier
        .create_account(dossier::account::NewAccount::new("Ann", "ANN@x.com", "pw1234"))
        .await
        .unwrap_err();
    assert!(err.is_duplicate());
}

#[tokio::test]
async fn test_increment_counter_edits_the_body_field() {
    let backend = test_backend().await;
    let mut doc = document("p1", "a1", 1);
    doc.unique_key = Some("a1".to_string());
    doc.body = r#"{"id":"p1","bio":"hi"}"#.to_string();
    backend.insert(Collection::Profiles, doc).await.unwrap();

    // A missing field starts from zero.
    backend
        .increment_counter(Collection::Profiles, "a1", "viewCount")
        .await
        .unwrap();
    let updated = backend
        .increment_counter(Collection::Profiles, "a1", "viewCount")
        .await
        .unwrap()
        .expect("document holds the key");

    let body: serde_json::Value = serde_json::from_str(&updated.body).unwrap();
    assert_eq!(body["viewCount"], 2);
    assert_eq!(body["bio"], "hi");
    assert_eq!(updated.id, "p1");
    assert_eq!(updated.unique_key.as_deref(), Some("a1"));

    let stored = backend.get(Collection::Profiles, "p1").await.unwrap().unwrap();
    let body: serde_json::Value = serde_json::from_str(&stored.body).unwrap();
    assert_eq!(body["viewCount"], 2);

    assert_eq!(
        backend
            .increment_counter(Collection::Profiles, "nobody", "viewCount")
            .await
            .unwrap(),
        None
    );
}
