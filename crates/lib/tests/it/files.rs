use chrono::Duration;
use dossier::UploadRequest;
use dossier::files::{
    AccessGrant, FileCategory, FileDescriptor, FileVersion, Permission, StorageBackend,
};

use super::helpers::*;

fn descriptor(owner: &str, name: &str) -> FileDescriptor {
    FileDescriptor::new(owner, name, "application/pdf", 1_024, format!("{owner}/{name}"))
}

#[tokio::test]
async fn test_save_starts_at_version_one() {
    let ctx = test_context().await;
    let record = ctx
        .dossier
        .files()
        .save(descriptor("a1", "cv.pdf").with_category(FileCategory::Document))
        .await
        .unwrap();

    assert_eq!(record.version, 1);
    assert!(record.previous_versions.is_empty());
    assert_eq!(record.download_count, 0);
    assert_eq!(record.original_name, "cv.pdf");
    assert_eq!(record.storage_backend, StorageBackend::Local);

    let fetched = ctx.dossier.files().get(&record.id).await.unwrap();
    assert_eq!(fetched.id, record.id);
    assert_eq!(fetched.category, FileCategory::Document);
}

#[tokio::test]
async fn test_save_rejects_missing_fields() {
    let ctx = test_context().await;
    let err = ctx
        .dossier
        .files()
        .save(FileDescriptor::new("a1", "", "text/plain", 1, "a1/x"))
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(ctx.dossier.files().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_new_versions_archive_previous_location() {
    let ctx = test_context().await;
    let files = ctx.dossier.files();
    let record = files.save(descriptor("a1", "cv.pdf")).await.unwrap();

    let mut latest = record.clone();
    for n in 1..=4u32 {
        latest = files
            .create_new_version(
                &record.id,
                FileVersion {
                    filename: format!("cv-v{}.pdf", n + 1),
                    storage_path: format!("a1/cv-v{}.pdf", n + 1),
                    size_bytes: 2_048,
                },
            )
            .await
            .unwrap();
        assert_eq!(latest.previous_versions.len(), n as usize);
        assert_eq!(latest.version, record.version + n);
    }

    assert_eq!(latest.filename, "cv-v5.pdf");
    assert_eq!(latest.previous_versions[0].filename, "cv.pdf");
    assert_eq!(latest.previous_versions[0].storage_path, "a1/cv.pdf");
    assert_eq!(latest.previous_versions[3].filename, "cv-v4.pdf");

    let missing = files
        .create_new_version(
            "missing",
            FileVersion {
                filename: "x".to_string(),
                storage_path: "x".to_string(),
                size_bytes: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn test_record_download_counts_and_stamps() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    let record = ctx
        .dossier
        .upload_file(UploadRequest::new(&account.id, "notes.txt", "text/plain", "hello"))
        .await
        .unwrap();
    assert!(record.last_accessed_at.is_none());

    let mut last_access = None;
    for _ in 0..3 {
        let updated = ctx.dossier.record_download(&record.id).await.unwrap();
        assert!(updated.last_accessed_at > last_access);
        last_access = updated.last_accessed_at;
    }

    let stored = ctx.dossier.files().get(&record.id).await.unwrap();
    assert_eq!(stored.download_count, 3);
    assert_eq!(stored.last_accessed_at, last_access);
}

#[tokio::test]
async fn test_list_by_owner_filters_and_orders() {
    let ctx = test_context().await;
    let files = ctx.dossier.files();
    let first = files
        .save(descriptor("a1", "one.pdf").with_category(FileCategory::Document))
        .await
        .unwrap();
    let second = files
        .save(descriptor("a1", "two.png").with_category(FileCategory::Image))
        .await
        .unwrap();
    let third = files
        .save(descriptor("a1", "three.pdf").with_category(FileCategory::Document))
        .await
        .unwrap();
    files.save(descriptor("a2", "other.pdf")).await.unwrap();

    let all: Vec<_> = ctx
        .dossier
        .list_files("a1", None)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(all, vec![third.id.clone(), second.id, first.id.clone()]);

    let documents: Vec<_> = ctx
        .dossier
        .list_files("a1", Some(FileCategory::Document))
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(documents, vec![third.id, first.id]);

    let stats = files.stats_by_owner("a1").await.unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.total_size_bytes, 3 * 1_024);
    let counts: Vec<_> = stats
        .by_category
        .iter()
        .map(|c| (c.category, c.count))
        .collect();
    assert_eq!(
        counts,
        vec![(FileCategory::Document, 2), (FileCategory::Image, 1)]
    );
}

#[tokio::test]
async fn test_delete_expired_removes_only_elapsed_records() {
    let ctx = test_context().await;
    let files = ctx.dossier.files();
    let now = ctx.dossier.clock().now();

    let soon = files
        .save(descriptor("a1", "soon.pdf").with_expiry(now + Duration::hours(1)))
        .await
        .unwrap();
    let later = files
        .save(descriptor("a1", "later.pdf").with_expiry(now + Duration::days(2)))
        .await
        .unwrap();
    let forever = files.save(descriptor("a1", "keep.pdf")).await.unwrap();

    assert!(files.delete_expired().await.unwrap().is_empty());

    ctx.clock.advance(Duration::hours(2).num_milliseconds());
    let removed = files.delete_expired().await.unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].id, soon.id);

    assert!(files.get(&soon.id).await.unwrap_err().is_not_found());
    assert!(files.get(&later.id).await.is_ok());
    assert!(files.get(&forever.id).await.is_ok());
}

#[tokio::test]
async fn test_purge_expired_files_deletes_contents() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    let expires = ctx.dossier.clock().now() + Duration::minutes(5);
    let record = ctx
        .dossier
        .upload_file(
            UploadRequest::new(&account.id, "tmp.txt", "text/plain", "temporary")
                .with_category(FileCategory::Other)
                .with_expiry(expires),
        )
        .await
        .unwrap();
    assert!(ctx.primary.read(&record.storage_path).await.is_some());

    ctx.clock.advance(Duration::minutes(10).num_milliseconds());
    let purged = ctx.dossier.purge_expired_files().await.unwrap();
    assert_eq!(purged.len(), 1);
    assert!(ctx.primary.read(&record.storage_path).await.is_none());
}

#[tokio::test]
async fn test_upload_without_mirror_is_local() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;

    let record = ctx
        .dossier
        .upload_file(
            UploadRequest::new(&account.id, "Report.PDF", "application/pdf", vec![1, 2, 3])
                .with_category(FileCategory::Document)
                .with_tags(["q3"]),
        )
        .await
        .unwrap();

    assert_eq!(record.storage_backend, StorageBackend::Local);
    assert_eq!(record.size_bytes, 3);
    assert_eq!(record.original_name, "Report.PDF");
    assert!(record.filename.ends_with(".pdf"));
    assert!(record.storage_path.starts_with(&format!("{}/document/", account.id)));
    assert_eq!(record.tags, vec!["q3".to_string()]);
    assert_eq!(
        record.public_url.as_deref(),
        Some(format!("mem://primary/{}", record.storage_path).as_str())
    );
    assert_eq!(
        ctx.primary.read(&record.storage_path).await,
        Some(vec![1, 2, 3])
    );
}

#[tokio::test]
async fn test_upload_with_working_mirror_is_remote() {
    let ctx = test_context_with_mirror().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;

    let record = ctx
        .dossier
        .upload_file(UploadRequest::new(&account.id, "a.txt", "text/plain", "abc"))
        .await
        .unwrap();

    assert_eq!(record.storage_backend, StorageBackend::RemoteObjectStore);
    assert_eq!(
        record.public_url.as_deref(),
        Some(format!("mem://mirror/{}", record.storage_path).as_str())
    );
    let mirror = ctx.mirror.as_ref().unwrap();
    assert_eq!(
        mirror.read(&record.storage_path).await,
        Some(b"abc".to_vec())
    );
}

#[tokio::test]
async fn test_upload_with_failing_mirror_falls_back_to_local() {
    let ctx = test_context_with_mirror().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    let mirror = ctx.mirror.as_ref().unwrap();
    mirror.set_available(false);

    let record = ctx
        .dossier
        .upload_file(UploadRequest::new(&account.id, "a.txt", "text/plain", "abc"))
        .await
        .unwrap();

    assert_eq!(record.storage_backend, StorageBackend::Local);
    assert_eq!(
        record.public_url.as_deref(),
        Some(format!("mem://primary/{}", record.storage_path).as_str())
    );
    assert!(mirror.is_empty().await);
    assert!(ctx.primary.read(&record.storage_path).await.is_some());
}

#[tokio::test]
async fn test_upload_fails_when_primary_is_down() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    ctx.primary.set_available(false);

    let err = ctx
        .dossier
        .upload_file(UploadRequest::new(&account.id, "a.txt", "text/plain", "abc"))
        .await
        .unwrap_err();
    assert!(err.is_storage_backend_error());
    assert_eq!(ctx.dossier.files().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_for_unknown_owner_writes_nothing() {
    let ctx = test_context().await;
    let err = ctx
        .dossier
        .upload_file(UploadRequest::new("missing", "a.txt", "text/plain", "abc"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(ctx.primary.is_empty().await);
}

#[tokio::test]
async fn test_new_profile_picture_retires_the_old_one() {
    let ctx = test_context().await;
    let account = create_account(&ctx.dossier, "Ann", "ann@x.com").await;
    let upload = |name: &str| {
        UploadRequest::new(&account.id, name, "image/png", vec![0u8; 16])
            .with_category(FileCategory::ProfilePicture)
    };

    let first = ctx.dossier.upload_file(upload("me.png")).await.unwrap();
    let profile = ctx.dossier.profiles().get(&account.id).await.unwrap();
    let picture = profile.profile_picture.unwrap();
    assert_eq!(picture.file_id.as_deref(), Some(first.id.as_str()));
    assert_eq!(Some(picture.url), first.public_url);

    let second = ctx.dossier.upload_file(upload("me2.png")).await.unwrap();
    let profile = ctx.dossier.profiles().get(&account.id).await.unwrap();
    assert_eq!(
        profile.profile_picture.unwrap().file_id.as_deref(),
        Some(second.id.as_str())
    );

    assert!(
        ctx.dossier
            .files()
            .get(&first.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(ctx.primary.read(&first.storage_path).await.is_none());
    assert!(ctx.primary.read(&second.storage_path).await.is_some());
}

#[tokio::test]
async fn test_readable_file_honours_visibility() {
    let ctx = test_context().await;
    let files = ctx.dossier.files();

    let mut public = descriptor("a1", "avatar.png");
    public.is_public = true;
    files.save(public).await.unwrap();

    let mut shared = descriptor("a1", "cv.pdf");
    shared.access_list = vec![AccessGrant {
        principal_id: "b2".to_string(),
        permission: Permission::Download,
    }];
    let shared = files.save(shared).await.unwrap();

    let record = ctx.dossier.readable_file("a1/avatar.png", None).await.unwrap();
    assert!(record.is_public);

    let err = ctx.dossier.readable_file("a1/cv.pdf", None).await.unwrap_err();
    assert!(err.is_not_found());
    let err = ctx
        .dossier
        .readable_file("a1/cv.pdf", Some("c3"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    for viewer in ["a1", "b2"] {
        let record = ctx
            .dossier
            .readable_file("a1/cv.pdf", Some(viewer))
            .await
            .unwrap();
        assert_eq!(record.id, shared.id);
    }

    for unknown in ["a1/missing.pdf", "no-owner-segment"] {
        let err = ctx
            .dossier
            .readable_file(unknown, Some("a1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
