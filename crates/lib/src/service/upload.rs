//! Upload pipeline: store the bytes, mirror them, record the metadata.
//!
//! 1. Write to the primary object store. Failure here fails the upload.
//! 2. If a mirror is configured, copy the bytes there. On success the record
//!    is marked `remote-object-store` with the mirror URL; on failure the
//!    error is logged and the record stays `local` with the primary URL.
//! 3. Save the file record.
//! 4. For profile pictures and cover photos, point the profile at the new
//!    file and retire the file it replaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Dossier;
use crate::Result;
use crate::files::{
    FileCategory, FileDescriptor, FileRecord, ImageMetadata, StorageBackend,
};
use crate::profile::{MediaRef, MediaSlot};

/// An upload as received from a caller.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub owner_id: String,
    pub original_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    #[serde(default)]
    pub category: FileCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub image_metadata: Option<ImageMetadata>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("owner_id", &self.owner_id)
            .field("original_name", &self.original_name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl UploadRequest {
    pub fn new(
        owner_id: impl Into<String>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
            category: FileCategory::Other,
            tags: Vec::new(),
            is_public: false,
            encoding: None,
            image_metadata: None,
            expires_at: None,
        }
    }

    pub fn with_category(mut self, category: FileCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Keep the extension and a filesystem-safe stem of the client's file name.
fn stored_filename(file_key: &str, original_name: &str) -> String {
    let extension = std::path::Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|e| !e.is_empty());
    match extension {
        Some(extension) => format!("{file_key}.{extension}"),
        None => file_key.to_string(),
    }
}

impl Dossier {
    /// Store an uploaded file and record its metadata.
    ///
    /// Only a primary store failure or a metadata failure is returned; a
    /// mirror failure downgrades the record to `local` instead.
    pub async fn upload_file(&self, request: UploadRequest) -> Result<FileRecord> {
        // Fail before writing any bytes if the owner does not exist.
        self.accounts().find_by_id(&request.owner_id).await?;

        let filename = stored_filename(&uuid::Uuid::new_v4().simple().to_string(), &request.original_name);
        let key = format!("{}/{}/{filename}", request.owner_id, request.category);

        let primary = self
            .primary_store()
            .put(&request.bytes, &key, &request.mime_type)
            .await?;
        debug!(key, store = self.primary_store().name(), "Wrote upload to primary store");

        let (storage_backend, public_url) = match self.mirror_store() {
            Some(mirror) => match mirror.put(&request.bytes, &key, &request.mime_type).await {
                Ok(mirrored) => (StorageBackend::RemoteObjectStore, mirrored.url),
                Err(e) => {
                    warn!(
                        key,
                        store = mirror.name(),
                        error = %e,
                        "Mirror upload failed; keeping local copy as authoritative"
                    );
                    (StorageBackend::Local, primary.url.clone())
                }
            },
            None => (StorageBackend::Local, primary.url.clone()),
        };

        let descriptor = FileDescriptor {
            filename,
            original_name: request.original_name,
            mime_type: request.mime_type,
            size_bytes: request.bytes.len() as u64,
            encoding: request.encoding,
            storage_backend,
            storage_path: key.clone(),
            public_url: Some(public_url),
            category: request.category,
            tags: request.tags,
            owner_id: request.owner_id,
            is_public: request.is_public,
            access_list: Vec::new(),
            image_metadata: request.image_metadata,
            processing_status: Default::default(),
            expires_at: request.expires_at,
        };

        let record = match self.files().save(descriptor).await {
            Ok(record) => record,
            Err(e) => {
                if let Err(cleanup) = self.primary_store().delete(&key).await {
                    warn!(key, error = %cleanup, "Failed to remove orphaned upload");
                }
                return Err(e);
            }
        };

        let slot = match record.category {
            FileCategory::ProfilePicture => Some(MediaSlot::ProfilePicture),
            FileCategory::CoverPhoto => Some(MediaSlot::CoverPhoto),
            _ => None,
        };
        if let Some(slot) = slot {
            let media = MediaRef {
                file_id: Some(record.id.clone()),
                url: record.public_url.clone().unwrap_or_default(),
                uploaded_at: record.created_at,
            };
            let replaced = self
                .profiles()
                .set_media(&record.owner_id, slot, media)
                .await?;
            if let Some(stale) = replaced.stale_file_id {
                self.retire_file(&stale).await;
            }
        }

        info!(
            file_id = %record.id,
            owner_id = %record.owner_id,
            backend = ?record.storage_backend,
            "Upload complete"
        );
        Ok(record)
    }

    /// Remove a file record that is no longer referenced, and its contents.
    /// Failures are logged and otherwise ignored.
    pub(crate) async fn retire_file(&self, file_id: &str) {
        match self.files().retire(file_id).await {
            Ok(Some(record)) => {
                if let Err(e) = self.delete_stored_objects(&record).await {
                    warn!(file_id, error = %e, "Failed to delete retired file contents");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(file_id, error = %e, "Failed to retire stale file"),
        }
    }

    /// Delete a record's bytes from every store that holds them. Returns how
    /// many objects were removed.
    pub(crate) async fn delete_stored_objects(&self, record: &FileRecord) -> Result<usize> {
        let mut removed = 0;
        if self.primary_store().delete(&record.storage_path).await? {
            removed += 1;
        }
        if record.storage_backend == StorageBackend::RemoteObjectStore
            && let Some(mirror) = self.mirror_store()
            && mirror.delete(&record.storage_path).await?
        {
            removed += 1;
        }
        Ok(removed)
    }
}
