//! Filesystem storage backend.
//!
//! Files live at `{root}/{context}/{component}/{file_area}/{item}{path}{name}`
//! with a JSON manifest per area recording the stored-file rows. Writes are
//! atomic (temp file + rename). Re-delivery of a byte-identical file under an
//! already-stored name returns the existing record instead of a second copy.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{DepotError, Result};

use super::{FileAreaKey, FileStorage, NewStoredFile, StoredFileRecord};

/// Manifest filename inside each area directory. Sanitized filenames never
/// start with a dot, so the manifest cannot collide with stored files.
const MANIFEST_NAME: &str = ".manifest.json";

/// Maximum filename length after sanitization.
const MAX_FILENAME_LEN: usize = 150;

/// Filesystem-backed [`FileStorage`].
#[derive(Debug, Clone)]
pub struct FsFileStorage {
    root: PathBuf,
}

impl FsFileStorage {
    /// Create a backend rooted at the given directory.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn area_dir(&self, area: &FileAreaKey) -> PathBuf {
        self.root.join(area.relative_dir())
    }

    fn manifest_path(&self, area: &FileAreaKey) -> PathBuf {
        self.area_dir(area).join(MANIFEST_NAME)
    }

    /// Disk location of a file within an area. `file_path` is the
    /// area-relative directory (`"/"` for the area root).
    fn disk_path(&self, area: &FileAreaKey, file_path: &str, filename: &str) -> PathBuf {
        let mut dir = self.area_dir(area);
        for part in file_path.split('/').filter(|p| !p.is_empty()) {
            dir = dir.join(part);
        }
        dir.join(filename)
    }

    fn load_manifest(&self, area: &FileAreaKey) -> Result<Vec<StoredFileRecord>> {
        let path = self.manifest_path(area);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents =
            std::fs::read_to_string(&path).map_err(|e| DepotError::io(&path, e))?;
        serde_json::from_str(&contents).map_err(|e| DepotError::Manifest {
            path,
            reason: e.to_string(),
        })
    }

    fn save_manifest(&self, area: &FileAreaKey, records: &[StoredFileRecord]) -> Result<()> {
        let path = self.manifest_path(area);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DepotError::io(parent, e))?;
        }
        let contents = serde_json::to_string_pretty(records).map_err(|e| DepotError::Manifest {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(|e| DepotError::io(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| DepotError::io(&path, e))?;
        Ok(())
    }

    /// Whether a name is taken at `(area, file_path)`, in the manifest or
    /// on disk (untracked files still block the name).
    fn name_taken(
        &self,
        records: &[StoredFileRecord],
        area: &FileAreaKey,
        file_path: &str,
        filename: &str,
    ) -> bool {
        records
            .iter()
            .any(|r| r.file_path == file_path && r.filename == filename)
            || self.disk_path(area, file_path, filename).exists()
    }
}

impl FileStorage for FsFileStorage {
    fn unused_filename(
        &self,
        area: &FileAreaKey,
        file_path: &str,
        requested: &str,
    ) -> Result<String> {
        let name = sanitize_filename(requested)?;
        let records = self.load_manifest(area)?;

        if !self.name_taken(&records, area, file_path, &name) {
            return Ok(name);
        }

        let (stem, ext) = split_extension(&name);
        for i in 1..1000 {
            let candidate = if ext.is_empty() {
                format!("{stem}_{i}")
            } else {
                format!("{stem}_{i}.{ext}")
            };
            if !self.name_taken(&records, area, file_path, &candidate) {
                return Ok(candidate);
            }
        }

        // Fallback — very unlikely
        Ok(if ext.is_empty() {
            format!("{stem}_dup")
        } else {
            format!("{stem}_dup.{ext}")
        })
    }

    fn create_file(&self, file: &NewStoredFile, content: &[u8]) -> Result<StoredFileRecord> {
        let content_hash = format!("{:x}", Sha256::digest(content));
        let mut records = self.load_manifest(&file.area)?;

        if let Some(existing) = records
            .iter()
            .find(|r| r.file_path == file.file_path && r.filename == file.filename)
        {
            if existing.content_hash == content_hash {
                debug!(
                    filename = %file.filename,
                    hash = %content_hash,
                    "identical file already stored, reusing record"
                );
                return Ok(existing.clone());
            }
            return Err(DepotError::FileExists(file.filename.clone()));
        }

        let path = self.disk_path(&file.area, &file.file_path, &file.filename);
        if path.exists() {
            warn!(path = %path.display(), "untracked file blocks this name");
            return Err(DepotError::FileExists(file.filename.clone()));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DepotError::io(parent, e))?;
        }

        // Atomic write: hidden temp file + rename. Sanitized names never
        // start with a dot, so the temp name cannot clash with a stored file.
        let tmp = path.with_file_name(format!(".{}.tmp", file.filename));
        std::fs::write(&tmp, content).map_err(|e| DepotError::io(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| DepotError::io(&path, e))?;

        debug!(
            path = %path.display(),
            size = content.len(),
            hash = %content_hash,
            "file written"
        );

        let record = StoredFileRecord {
            area: file.area.clone(),
            file_path: file.file_path.clone(),
            filename: file.filename.clone(),
            author: file.author.clone(),
            license: file.license.clone(),
            user_id: file.user_id,
            content_hash,
            size: content.len() as u64,
            created_at: chrono::Utc::now(),
        };
        records.push(record.clone());
        self.save_manifest(&file.area, &records)?;

        Ok(record)
    }

    fn area_bytes_used(&self, area: &FileAreaKey) -> Result<u64> {
        Ok(self.load_manifest(area)?.iter().map(|r| r.size).sum())
    }

    fn list_area(&self, area: &FileAreaKey) -> Result<Vec<StoredFileRecord>> {
        self.load_manifest(area)
    }
}

/// Sanitize a requested filename for storage.
///
/// Path separators and other unsafe characters become `_`; the result is
/// truncated to [`MAX_FILENAME_LEN`] characters and never starts with a dot.
fn sanitize_filename(requested: &str) -> Result<String> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(DepotError::InvalidFilename(requested.to_string()));
    }

    let mut sanitized: String = trimmed
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '@' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_LEN)
        .collect();

    if sanitized.chars().all(|c| c == '.' || c == '_') {
        return Err(DepotError::InvalidFilename(requested.to_string()));
    }
    if sanitized.starts_with('.') {
        sanitized.insert(0, '_');
    }
    Ok(sanitized)
}

/// Split `name` into `(stem, extension)` at the last dot.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos + 1..]),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_file(area: &FileAreaKey, filename: &str) -> NewStoredFile {
        NewStoredFile {
            area: area.clone(),
            file_path: "/".to_string(),
            filename: filename.to_string(),
            author: "Test User".to_string(),
            license: "all-rights-reserved".to_string(),
            user_id: 1,
        }
    }

    #[test]
    fn test_create_and_list() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FsFileStorage::new(tmp.path());
        let area = FileAreaKey::user_private(1);

        let record = storage
            .create_file(&new_file(&area, "report.pdf"), b"content")
            .unwrap();
        assert_eq!(record.size, 7);
        assert_eq!(record.filename, "report.pdf");

        let listed = storage.list_area(&area).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], record);

        let on_disk = tmp.path().join("1/user/private/0/report.pdf");
        assert_eq!(std::fs::read(on_disk).unwrap(), b"content");
    }

    #[test]
    fn test_unused_filename_appends_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FsFileStorage::new(tmp.path());
        let area = FileAreaKey::user_private(1);

        assert_eq!(
            storage.unused_filename(&area, "/", "report.pdf").unwrap(),
            "report.pdf"
        );
        storage
            .create_file(&new_file(&area, "report.pdf"), b"one")
            .unwrap();
        assert_eq!(
            storage.unused_filename(&area, "/", "report.pdf").unwrap(),
            "report_1.pdf"
        );
        storage
            .create_file(&new_file(&area, "report_1.pdf"), b"two")
            .unwrap();
        assert_eq!(
            storage.unused_filename(&area, "/", "report.pdf").unwrap(),
            "report_2.pdf"
        );
    }

    #[test]
    fn test_identical_content_reuses_record() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FsFileStorage::new(tmp.path());
        let area = FileAreaKey::user_private(1);

        let first = storage
            .create_file(&new_file(&area, "notes.txt"), b"same bytes")
            .unwrap();
        let second = storage
            .create_file(&new_file(&area, "notes.txt"), b"same bytes")
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(storage.list_area(&area).unwrap().len(), 1);
        assert_eq!(storage.area_bytes_used(&area).unwrap(), 10);
    }

    #[test]
    fn test_different_content_same_name_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FsFileStorage::new(tmp.path());
        let area = FileAreaKey::user_private(1);

        storage
            .create_file(&new_file(&area, "notes.txt"), b"one")
            .unwrap();
        let err = storage
            .create_file(&new_file(&area, "notes.txt"), b"two")
            .unwrap_err();
        assert!(matches!(err, DepotError::FileExists(name) if name == "notes.txt"));
    }

    #[test]
    fn test_area_bytes_used_accumulates() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FsFileStorage::new(tmp.path());
        let area = FileAreaKey::user_private(2);

        assert_eq!(storage.area_bytes_used(&area).unwrap(), 0);
        storage
            .create_file(&new_file(&area, "a.bin"), &[0u8; 100])
            .unwrap();
        storage
            .create_file(&new_file(&area, "b.bin"), &[0u8; 50])
            .unwrap();
        assert_eq!(storage.area_bytes_used(&area).unwrap(), 150);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").unwrap(),
            "_.._.._etc_passwd"
        );
        assert_eq!(sanitize_filename("hello world.txt").unwrap(), "hello_world.txt");
        assert_eq!(sanitize_filename(".hidden").unwrap(), "_.hidden");
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("   ").is_err());
        assert!(sanitize_filename("..").is_err());
    }

    #[test]
    fn test_corrupt_manifest_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FsFileStorage::new(tmp.path());
        let area = FileAreaKey::user_private(1);

        let dir = tmp.path().join("1/user/private/0");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_NAME), b"not json").unwrap();

        let err = storage.list_area(&area).unwrap_err();
        assert!(matches!(err, DepotError::Manifest { .. }));
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("report.pdf"), ("report", "pdf"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", "gz"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension("_.hidden"), ("_", "hidden"));
    }
}
