//! File record store.
//!
//! Records describe uploaded assets: where the bytes live, who owns them and
//! how they have been versioned. Records are indexed by owner and category and
//! by expiry, so temporary uploads can be swept with
//! [`FileStore::delete_expired`].

mod errors;
mod store;
mod types;

pub use errors::FileError;
pub use store::FileStore;
pub use types::{
    AccessGrant, ArchivedVersion, CategoryStats, FileCategory, FileDescriptor, FileRecord,
    FileStats, FileVersion, ImageMetadata, Permission, ProcessingStatus, StorageBackend,
};
