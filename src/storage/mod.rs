//! File storage: the seam the delivery handler persists through.
//!
//! Filename collision handling, quota accounting input, and persistence all
//! live behind [`FileStorage`]; the handler only decides *what* to store.

pub mod filesystem;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Coordinate of a storage area: (context, component, file area, item).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileAreaKey {
    /// Owning security context.
    pub context_id: u64,
    /// Subsystem the area belongs to (e.g. `"user"`).
    pub component: String,
    /// Area name within the component (e.g. `"private"`).
    pub file_area: String,
    /// Item discriminator; private areas use a single item `0`.
    pub item_id: u64,
}

impl FileAreaKey {
    /// The private file area of the user behind `context_id`.
    pub fn user_private(context_id: u64) -> Self {
        Self {
            context_id,
            component: "user".to_string(),
            file_area: "private".to_string(),
            item_id: 0,
        }
    }

    /// Relative directory of this area under a storage root:
    /// `{context}/{component}/{file_area}/{item}`.
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(self.context_id.to_string())
            .join(&self.component)
            .join(&self.file_area)
            .join(self.item_id.to_string())
    }
}

/// A file record prepared for persistence.
#[derive(Debug, Clone)]
pub struct NewStoredFile {
    /// Target area.
    pub area: FileAreaKey,
    /// Directory path within the area. `"/"` for the area root.
    pub file_path: String,
    /// Final filename. Callers resolve collisions first via
    /// [`FileStorage::unused_filename`].
    pub filename: String,
    /// Author recorded on the file.
    pub author: String,
    /// License recorded on the file.
    pub license: String,
    /// Owning user id.
    pub user_id: u64,
}

/// A persisted file, as recorded in the area manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFileRecord {
    pub area: FileAreaKey,
    pub file_path: String,
    pub filename: String,
    pub author: String,
    pub license: String,
    pub user_id: u64,
    /// Hex-encoded SHA-256 of the content.
    pub content_hash: String,
    /// Content size in bytes.
    pub size: u64,
    /// When the file was stored.
    pub created_at: DateTime<Utc>,
}

/// Storage backend seam.
///
/// Implementations must guarantee that [`create_file`](Self::create_file)
/// never overwrites an existing file, and that
/// [`area_bytes_used`](Self::area_bytes_used) reflects every completed
/// `create_file` immediately.
pub trait FileStorage {
    /// Return a filename not currently present at `(area, file_path)`.
    ///
    /// The requested name is returned as-is when free; otherwise a numeric
    /// suffix is appended before the extension (`report.pdf` →
    /// `report_1.pdf`).
    fn unused_filename(&self, area: &FileAreaKey, file_path: &str, requested: &str)
        -> Result<String>;

    /// Persist `content` under the record's coordinates.
    fn create_file(&self, file: &NewStoredFile, content: &[u8]) -> Result<StoredFileRecord>;

    /// Total bytes currently stored in the area.
    fn area_bytes_used(&self, area: &FileAreaKey) -> Result<u64>;

    /// All files recorded in the area.
    fn list_area(&self, area: &FileAreaKey) -> Result<Vec<StoredFileRecord>>;
}
