//! File records and their inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{Collection, Record};

/// Where the authoritative copy of a file's bytes lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    #[default]
    Local,
    RemoteObjectStore,
    InlineBinary,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum FileCategory {
    ProfilePicture,
    CoverPhoto,
    Document,
    Image,
    Video,
    Audio,
    #[default]
    Other,
}

impl FileCategory {
    pub const ALL: [FileCategory; 7] = [
        FileCategory::ProfilePicture,
        FileCategory::CoverPhoto,
        FileCategory::Document,
        FileCategory::Image,
        FileCategory::Video,
        FileCategory::Audio,
        FileCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::ProfilePicture => "profile-picture",
            FileCategory::CoverPhoto => "cover-photo",
            FileCategory::Document => "document",
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Other => "other",
        }
    }

    /// Categories whose upload replaces a profile media slot.
    pub fn is_profile_media(&self) -> bool {
        matches!(self, FileCategory::ProfilePicture | FileCategory::CoverPhoto)
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FileCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown file category '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    View,
    Download,
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub principal_id: String,
    #[serde(default)]
    pub permission: Permission,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub has_alpha: Option<bool>,
    pub color_space: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    #[default]
    Completed,
    Failed,
}

/// A superseded version of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedVersion {
    pub filename: String,
    pub storage_path: String,
    pub archived_at: DateTime<Utc>,
}

/// Metadata for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub storage_backend: StorageBackend,
    pub storage_path: String,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub category: FileCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner_id: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub access_list: Vec<AccessGrant>,
    #[serde(default)]
    pub image_metadata: Option<ImageMetadata>,
    #[serde(default)]
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub version: u32,
    #[serde(default)]
    pub previous_versions: Vec<ArchivedVersion>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Whether `viewer` may fetch the stored contents. Anonymous callers only
    /// see public files.
    pub fn is_readable_by(&self, viewer: Option<&str>) -> bool {
        if self.is_public {
            return true;
        }
        let Some(viewer) = viewer else {
            return false;
        };
        self.owner_id == viewer
            || self
                .access_list
                .iter()
                .any(|grant| grant.principal_id == viewer)
    }
}

impl Record for FileRecord {
    const COLLECTION: Collection = Collection::Files;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.owner_id)
    }

    fn tag(&self) -> Option<&str> {
        Some(self.category.as_str())
    }

    fn expires_at_millis(&self) -> Option<i64> {
        self.expires_at.map(|at| at.timestamp_millis())
    }
}

/// Input to [`FileStore::save`](super::FileStore::save).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub storage_backend: StorageBackend,
    pub storage_path: String,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub category: FileCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner_id: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub access_list: Vec<AccessGrant>,
    #[serde(default)]
    pub image_metadata: Option<ImageMetadata>,
    #[serde(default)]
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl FileDescriptor {
    /// A descriptor with defaults for everything but the required fields.
    pub fn new(
        owner_id: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
        storage_path: impl Into<String>,
    ) -> Self {
        let filename = filename.into();
        Self {
            original_name: filename.clone(),
            filename,
            mime_type: mime_type.into(),
            size_bytes,
            encoding: None,
            storage_backend: StorageBackend::Local,
            storage_path: storage_path.into(),
            public_url: None,
            category: FileCategory::Other,
            tags: Vec::new(),
            owner_id: owner_id.into(),
            is_public: false,
            access_list: Vec::new(),
            image_metadata: None,
            processing_status: ProcessingStatus::Completed,
            expires_at: None,
        }
    }

    pub fn with_category(mut self, category: FileCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = name.into();
        self
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.storage_backend = backend;
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

/// Replacement content for [`FileStore::create_new_version`](super::FileStore::create_new_version).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileVersion {
    pub filename: String,
    pub storage_path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: FileCategory,
    pub count: usize,
    pub total_size_bytes: u64,
}

/// Per-owner storage usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub total_files: usize,
    pub total_size_bytes: u64,
    /// Sorted by category name.
    pub by_category: Vec<CategoryStats>,
}

impl FileStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a FileRecord>) -> Self {
        let mut by_name: std::collections::BTreeMap<&'static str, CategoryStats> =
            std::collections::BTreeMap::new();
        let mut stats = FileStats::default();

        for record in records {
            stats.total_files += 1;
            stats.total_size_bytes += record.size_bytes;
            let entry = by_name
                .entry(record.category.as_str())
                .or_insert_with(|| CategoryStats {
                    category: record.category,
                    count: 0,
                    total_size_bytes: 0,
                });
            entry.count += 1;
            entry.total_size_bytes += record.size_bytes;
        }

        stats.by_category = by_name.into_values().collect();
        stats
    }
}
