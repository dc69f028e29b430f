//! In-memory byte store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

use super::store::{DirEntry, FileStore, FileType, Metadata};
use crate::error::Result;

/// In-memory byte store backed by a `HashMap`.
///
/// Paths are normalized absolute virtual paths; the root directory exists
/// from construction.
pub struct MemoryStore {
    entries: RwLock<HashMap<PathBuf, Entry>>,
}

#[derive(Debug, Clone)]
enum Entry {
    File { content: Vec<u8>, modified: SystemTime },
    Directory,
}

impl Entry {
    fn metadata(&self) -> Metadata {
        match self {
            Entry::File { content, modified } => Metadata {
                file_type: FileType::File,
                size: content.len() as u64,
                modified: *modified,
            },
            Entry::Directory => Metadata {
                file_type: FileType::Directory,
                size: 0,
                modified: SystemTime::UNIX_EPOCH,
            },
        }
    }
}

fn not_found() -> crate::error::Error {
    IoError::new(ErrorKind::NotFound, "no such file or directory").into()
}

fn is_a_directory() -> crate::error::Error {
    IoError::other("is a directory").into()
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new store containing only the root directory.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::from("/"), Entry::Directory);
        Self {
            entries: RwLock::new(entries),
        }
    }

    fn lock_err() -> crate::error::Error {
        IoError::other("store lock poisoned").into()
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let entries = self.entries.read().map_err(|_| Self::lock_err())?;
        match entries.get(path) {
            Some(Entry::File { content, .. }) => Ok(content.clone()),
            Some(Entry::Directory) => Err(is_a_directory()),
            None => Err(not_found()),
        }
    }

    async fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;

        if matches!(entries.get(path), Some(Entry::Directory)) {
            return Err(is_a_directory());
        }
        if let Some(parent) = path.parent() {
            if !entries.contains_key(parent) {
                return Err(
                    IoError::new(ErrorKind::NotFound, "parent directory not found").into(),
                );
            }
            if matches!(entries.get(parent), Some(Entry::File { .. })) {
                return Err(IoError::other("parent is not a directory").into());
            }
        }

        entries.insert(
            path.to_path_buf(),
            Entry::File {
                content: content.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn append(&self, path: &Path, content: &[u8]) -> Result<()> {
        {
            let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;
            match entries.get_mut(path) {
                Some(Entry::File {
                    content: existing,
                    modified,
                }) => {
                    existing.extend_from_slice(content);
                    *modified = SystemTime::now();
                    return Ok(());
                }
                Some(Entry::Directory) => return Err(is_a_directory()),
                None => {}
            }
        }
        self.write(path, content).await
    }

    async fn mkdir(&self, path: &Path, recursive: bool) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;

        match entries.get(path) {
            Some(Entry::Directory) => {
                return if recursive {
                    Ok(())
                } else {
                    Err(IoError::new(ErrorKind::AlreadyExists, "directory exists").into())
                };
            }
            Some(Entry::File { .. }) => {
                return Err(IoError::new(ErrorKind::AlreadyExists, "file exists").into());
            }
            None => {}
        }

        if recursive {
            let mut current = PathBuf::from("/");
            for component in path.components().skip(1) {
                current.push(component);
                match entries.get(&current) {
                    Some(Entry::Directory) => {}
                    Some(Entry::File { .. }) => {
                        return Err(IoError::new(ErrorKind::AlreadyExists, "file exists").into());
                    }
                    None => {
                        entries.insert(current.clone(), Entry::Directory);
                    }
                }
            }
        } else {
            if let Some(parent) = path.parent() {
                if !entries.contains_key(parent) {
                    return Err(
                        IoError::new(ErrorKind::NotFound, "parent directory not found").into(),
                    );
                }
            }
            entries.insert(path.to_path_buf(), Entry::Directory);
        }
        Ok(())
    }

    async fn remove(&self, path: &Path, recursive: bool) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;

        match entries.get(path) {
            Some(Entry::Directory) => {
                if recursive {
                    let to_remove: Vec<PathBuf> = entries
                        .keys()
                        .filter(|p| p.starts_with(path))
                        .cloned()
                        .collect();
                    for p in to_remove {
                        entries.remove(&p);
                    }
                } else {
                    let has_children = entries
                        .keys()
                        .any(|p| p != path && p.parent() == Some(path));
                    if has_children {
                        return Err(IoError::other("directory not empty").into());
                    }
                    entries.remove(path);
                }
            }
            Some(Entry::File { .. }) => {
                entries.remove(path);
            }
            None => return Err(not_found()),
        }
        Ok(())
    }

    async fn stat(&self, path: &Path) -> Result<Metadata> {
        let entries = self.entries.read().map_err(|_| Self::lock_err())?;
        entries.get(path).map(Entry::metadata).ok_or_else(not_found)
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entries = self.entries.read().map_err(|_| Self::lock_err())?;

        match entries.get(path) {
            Some(Entry::Directory) => {
                let mut result: Vec<DirEntry> = entries
                    .iter()
                    .filter(|(p, _)| p.parent() == Some(path) && *p != path)
                    .map(|(p, entry)| DirEntry {
                        name: p
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        metadata: entry.metadata(),
                    })
                    .collect();
                result.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(result)
            }
            Some(Entry::File { .. }) => Err(IoError::other("not a directory").into()),
            None => Err(not_found()),
        }
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let entries = self.entries.read().map_err(|_| Self::lock_err())?;
        Ok(entries.contains_key(path))
    }
}
