//! The file record store.

use std::sync::Arc;

use tracing::{debug, info};

use super::errors::FileError;
use super::types::{
    ArchivedVersion, FileCategory, FileDescriptor, FileRecord, FileStats, FileVersion,
};
use crate::Result;
use crate::backend::Backend;
use crate::clock::Clock;

/// File metadata, many records per owner.
#[derive(Debug, Clone)]
pub struct FileStore {
    backend: Backend,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    pub fn new(backend: Backend, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Persist a new record at version 1.
    pub async fn save(&self, descriptor: FileDescriptor) -> Result<FileRecord> {
        require("filename", &descriptor.filename)?;
        require("mimeType", &descriptor.mime_type)?;
        require("storagePath", &descriptor.storage_path)?;
        require("ownerId", &descriptor.owner_id)?;

        let now = self.clock.now();
        let original_name = if descriptor.original_name.trim().is_empty() {
            descriptor.filename.clone()
        } else {
            descriptor.original_name
        };
        let record = FileRecord {
            id: uuid::Uuid::new_v4().to_string(),
            filename: descriptor.filename,
            original_name,
            mime_type: descriptor.mime_type,
            size_bytes: descriptor.size_bytes,
            encoding: descriptor.encoding,
            storage_backend: descriptor.storage_backend,
            storage_path: descriptor.storage_path,
            public_url: descriptor.public_url,
            category: descriptor.category,
            tags: descriptor.tags,
            owner_id: descriptor.owner_id,
            is_public: descriptor.is_public,
            access_list: descriptor.access_list,
            image_metadata: descriptor.image_metadata,
            processing_status: descriptor.processing_status,
            download_count: 0,
            last_accessed_at: None,
            version: 1,
            previous_versions: Vec::new(),
            expires_at: descriptor.expires_at,
            created_at: now,
            updated_at: now,
        };

        self.backend.insert(&record).await?;
        info!(
            file_id = %record.id,
            owner_id = %record.owner_id,
            category = %record.category,
            size = record.size_bytes,
            "Saved file record"
        );
        Ok(record)
    }

    pub async fn get(&self, file_id: &str) -> Result<FileRecord> {
        self.backend.get::<FileRecord>(file_id).await?.ok_or_else(|| {
            FileError::NotFound {
                file_id: file_id.to_string(),
            }
            .into()
        })
    }

    /// Archive the current filename and path, then switch to `next`.
    pub async fn create_new_version(&self, file_id: &str, next: FileVersion) -> Result<FileRecord> {
        require("filename", &next.filename)?;
        require("storagePath", &next.storage_path)?;

        let mut record = self.get(file_id).await?;
        let now = self.clock.now();
        record.previous_versions.push(ArchivedVersion {
            filename: std::mem::replace(&mut record.filename, next.filename),
            storage_path: std::mem::replace(&mut record.storage_path, next.storage_path),
            archived_at: now,
        });
        record.size_bytes = next.size_bytes;
        record.version += 1;
        record.updated_at = now;

        self.backend.replace(&record).await?;
        debug!(file_id, version = record.version, "Created new file version");
        Ok(record)
    }

    /// Count a download and stamp the access time.
    pub async fn record_download(&self, file_id: &str) -> Result<FileRecord> {
        let mut record = self.get(file_id).await?;
        let now = self.clock.now();
        record.download_count += 1;
        record.last_accessed_at = Some(now);
        record.updated_at = now;
        self.backend.replace(&record).await?;
        Ok(record)
    }

    /// The owner's files, newest first, optionally limited to one category.
    pub async fn list_by_owner(
        &self,
        owner_id: &str,
        category: Option<FileCategory>,
    ) -> Result<Vec<FileRecord>> {
        self.backend
            .list_by_owner::<FileRecord>(owner_id, category.as_ref().map(FileCategory::as_str))
            .await
    }

    /// The owner's record stored under `storage_path`, if any.
    pub async fn find_by_storage_path(
        &self,
        owner_id: &str,
        storage_path: &str,
    ) -> Result<Option<FileRecord>> {
        Ok(self
            .list_by_owner(owner_id, None)
            .await?
            .into_iter()
            .find(|record| record.storage_path == storage_path))
    }

    pub async fn stats_by_owner(&self, owner_id: &str) -> Result<FileStats> {
        let records = self.list_by_owner(owner_id, None).await?;
        Ok(FileStats::from_records(&records))
    }

    /// Remove every record whose expiry has passed and return them.
    pub async fn delete_expired(&self) -> Result<Vec<FileRecord>> {
        let now = self.clock.now_millis();
        let removed = self.backend.remove_expired::<FileRecord>(now).await?;
        if !removed.is_empty() {
            info!(count = removed.len(), "Removed expired file records");
        }
        Ok(removed)
    }

    /// Remove a record and return it.
    pub async fn delete(&self, file_id: &str) -> Result<FileRecord> {
        match self.backend.remove::<FileRecord>(file_id).await {
            Ok(record) => Ok(record),
            Err(e) if e.is_not_found() => Err(FileError::NotFound {
                file_id: file_id.to_string(),
            }
            .into()),
            Err(e) => Err(e),
        }
    }

    /// Deletion path for files that are no longer referenced, such as a
    /// replaced profile picture. A record that is already gone is not an
    /// error.
    pub async fn retire(&self, file_id: &str) -> Result<Option<FileRecord>> {
        match self.delete(file_id).await {
            Ok(record) => {
                debug!(file_id, "Retired stale file record");
                Ok(Some(record))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove every record owned by `owner_id` and return them.
    pub async fn delete_by_owner(&self, owner_id: &str) -> Result<Vec<FileRecord>> {
        self.backend.remove_by_owner::<FileRecord>(owner_id).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.backend.count::<FileRecord>().await
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(FileError::validation(field, "must not be empty").into())
    } else {
        Ok(())
    }
}
