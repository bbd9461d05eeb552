//! Persistent medium behind a database.
//!
//! Nodes never touch the medium directly; they go through the [`Storage`]
//! trait, which exposes the handful of hierarchical-file-store primitives the
//! tree needs: create, read, write, list and copy-in.
//!
//! Two backends ship with the crate:
//!
//! - [`FsStorage`] - the local filesystem (the default)
//! - [`MemoryStorage`] - a `DashMap`-backed store, lost on process exit
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use hards::storage::{MemoryStorage, Storage};
//!
//! # fn main() -> hards::Result<()> {
//! let storage = MemoryStorage::new();
//! storage.create_dir_all(Path::new("/db/children"))?;
//! storage.write(Path::new("/db/data.json"), b"{}")?;
//!
//! assert!(storage.is_dir(Path::new("/db")));
//! assert_eq!(storage.list_dirs(Path::new("/db"))?, vec!["children".to_string()]);
//! # Ok(())
//! # }
//! ```

mod fs;
mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::Result;

/// Size and modification time of a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Length of the file in bytes
    pub size_bytes: u64,
    /// Last modification time, if the medium records one
    pub modified: Option<SystemTime>,
}

/// Hierarchical file store primitives used by the tree.
///
/// Implementations are expected to fail immediately rather than block, and
/// provide no transactions: a sequence of calls that fails partway leaves the
/// earlier calls applied.
pub trait Storage: fmt::Debug + Send + Sync {
    /// True if anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// True if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// True if `path` is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Create a single directory. The parent must already exist.
    ///
    /// # Errors
    ///
    /// Fails if `path` already exists or its parent is missing.
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Create a directory and any missing ancestors.
    ///
    /// # Errors
    ///
    /// Fails if a non-directory is in the way.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Names of the directories directly under `path`, sorted.
    ///
    /// # Errors
    ///
    /// Fails if `path` is not a directory.
    fn list_dirs(&self, path: &Path) -> Result<Vec<String>>;

    /// Names of every entry directly under `path`, sorted.
    ///
    /// # Errors
    ///
    /// Fails if `path` is not a directory.
    fn list_entries(&self, path: &Path) -> Result<Vec<String>>;

    /// Read a whole file.
    ///
    /// # Errors
    ///
    /// Fails if `path` is not a readable file.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace a whole file, creating it if needed.
    ///
    /// # Errors
    ///
    /// Fails if the parent directory is missing or `path` is a directory.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Copy a file from the local filesystem into the medium at `dest`.
    ///
    /// Overwrites whatever file is already at `dest`. The source modification
    /// time is preserved where the medium supports it; with `read_only` the
    /// copy is protected against in-place modification where the medium
    /// supports it.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be read or `dest` cannot be written.
    fn import_file(&self, source: &Path, dest: &Path, read_only: bool) -> Result<()>;

    /// Size and modification time of the file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if `path` is not a file.
    fn stat(&self, path: &Path) -> Result<FileStat>;

    /// Host filesystem path of `path`, when the medium is the local filesystem.
    fn local_path(&self, _path: &Path) -> Option<PathBuf> {
        None
    }
}
