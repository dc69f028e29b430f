//! Byte store trait definitions.
//!
//! A [`FileStore`] is the raw backing storage beneath the sandbox facade.
//! It receives normalized absolute virtual paths; containment and
//! permission checks happen in [`crate::VirtualFs`] before delegation.

use async_trait::async_trait;
use std::path::Path;
use std::time::SystemTime;

use crate::error::Result;

/// Async byte store trait.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Read a file's contents.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write contents to a file (create or overwrite).
    async fn write(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// Append contents to a file, creating it if absent.
    async fn append(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// Create a directory.
    async fn mkdir(&self, path: &Path, recursive: bool) -> Result<()>;

    /// Remove a file or directory.
    async fn remove(&self, path: &Path, recursive: bool) -> Result<()>;

    /// Get file metadata.
    async fn stat(&self, path: &Path) -> Result<Metadata>;

    /// Read directory entries.
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> Result<bool>;
}

/// File metadata.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// File type
    pub file_type: FileType,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

/// File type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Regular file
    File,
    /// Directory
    Directory,
}

impl FileType {
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// Directory entry.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Entry name (not full path)
    pub name: String,
    /// Entry metadata
    pub metadata: Metadata,
}
