//! In-memory storage implementation using `DashMap`.
//!
//! Data is lost on process restart. Useful for tests and throwaway
//! databases; share one instance behind an `Arc` to open the same tree from
//! several `Database` handles.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use dashmap::DashMap;

use super::{FileStat, Storage};
use crate::Result;

#[derive(Debug, Clone)]
enum Entry {
    Dir,
    File {
        contents: Vec<u8>,
        modified: SystemTime,
    },
}

/// In-memory hierarchical store keyed by path.
///
/// Entries carry no permissions, so imported files are never read-only and
/// [`DatabaseConfig::read_only_files`](crate::DatabaseConfig::read_only_files)
/// has no effect on this medium.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use hards::storage::MemoryStorage;
/// use hards::{Database, HasDatasets};
///
/// # fn main() -> hards::Result<()> {
/// let storage = Arc::new(MemoryStorage::new());
/// let db = Database::builder().storage(storage.clone()).create("/db")?;
/// db.create_dataset("exp1")?;
///
/// // A second handle over the same medium sees the dataset
/// let reopened = Database::builder().storage(storage).open("/db")?;
/// assert_eq!(reopened.children(), vec!["exp1".to_string()]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<PathBuf, Entry>,
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} already exists", path.display()),
    )
}

fn not_a_directory(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        format!("{} is not a directory", path.display()),
    )
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries (directories and files).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn parent_is_dir(&self, path: &Path) -> bool {
        match path.parent() {
            None => true,
            Some(parent) if parent.as_os_str().is_empty() => true,
            Some(parent) => self.is_dir(parent),
        }
    }

    fn put_file(&self, path: &Path, contents: Vec<u8>, modified: SystemTime) -> Result<()> {
        if !self.parent_is_dir(path) {
            return Err(not_found(path.parent().unwrap_or(path)).into());
        }
        if self.is_dir(path) {
            return Err(already_exists(path).into());
        }
        self.entries
            .insert(path.to_path_buf(), Entry::File { contents, modified });
        Ok(())
    }

    fn list(&self, path: &Path, dirs_only: bool) -> Result<Vec<String>> {
        if !self.is_dir(path) {
            return Err(not_a_directory(path).into());
        }
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().parent() == Some(path))
            .filter(|entry| !dirs_only || matches!(entry.value(), Entry::Dir))
            .filter_map(|entry| {
                entry
                    .key()
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries.get(path).as_deref(), Some(Entry::Dir))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.entries.get(path).as_deref(), Some(Entry::File { .. }))
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        if self.exists(path) {
            return Err(already_exists(path).into());
        }
        if !self.parent_is_dir(path) {
            return Err(not_found(path.parent().unwrap_or(path)).into());
        }
        self.entries.insert(path.to_path_buf(), Entry::Dir);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut missing: Vec<&Path> = path
            .ancestors()
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .take_while(|ancestor| !self.is_dir(ancestor))
            .collect();
        missing.reverse();

        for dir in missing {
            if self.is_file(dir) {
                return Err(not_a_directory(dir).into());
            }
            self.entries.insert(dir.to_path_buf(), Entry::Dir);
        }
        Ok(())
    }

    fn list_dirs(&self, path: &Path) -> Result<Vec<String>> {
        self.list(path, true)
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<String>> {
        self.list(path, false)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        match self.entries.get(path).as_deref() {
            Some(Entry::File { contents, .. }) => Ok(contents.clone()),
            _ => Err(not_found(path).into()),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.put_file(path, contents.to_vec(), SystemTime::now())
    }

    fn import_file(&self, source: &Path, dest: &Path, _read_only: bool) -> Result<()> {
        let contents = std::fs::read(source)?;
        let modified = std::fs::metadata(source)?
            .modified()
            .unwrap_or_else(|_| SystemTime::now());
        self.put_file(dest, contents, modified)
    }

    fn stat(&self, path: &Path) -> Result<FileStat> {
        match self.entries.get(path).as_deref() {
            Some(Entry::File { contents, modified }) => Ok(FileStat {
                size_bytes: contents.len() as u64,
                modified: Some(*modified),
            }),
            _ => Err(not_found(path).into()),
        }
    }
}
