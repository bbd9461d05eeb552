//! Managed files attached to datasets and datapoints.
//!
//! Files are copied into the node's `files` area and are treated as
//! read-only from then on. A file is "modified" by adding a new source under
//! the same name, which overwrites the managed copy.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::NameKind;
use crate::layout::{require_dir, Context, FILES_DIRECTORY_NAME};
use crate::name::{is_lookup_name, is_reserved, validate};
use crate::storage::Storage;
use crate::{Error, Result};

/// Capability of nodes that manage files.
pub trait HasFiles {
    /// Names (including extensions) of the files known to this instance.
    fn files(&self) -> Vec<String>;

    /// True if this instance knows a file called `name`.
    fn has_file(&self, name: &str) -> bool;

    /// Handle to the managed file called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DoesNotExist`] if no such file is stored.
    fn get_file(&self, name: &str) -> Result<ManagedFile>;

    /// Copy `source` into this node.
    ///
    /// With `name` the copy is stored under that (validated) name; without it
    /// the source's own file name is used as is, without validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] for an explicit name with invalid
    /// characters, [`Error::AlreadyExists`] for an explicit name of `.`, `..`
    /// or the empty string, and [`Error::DoesNotExist`] if `source` is missing
    /// or is not a regular file.
    fn add_file(&self, source: &Path, name: Option<&str>) -> Result<()>;
}

/// Read-only handle to one managed file.
#[derive(Debug, Clone)]
pub struct ManagedFile {
    storage: Arc<dyn Storage>,
    path: PathBuf,
    name: String,
}

impl ManagedFile {
    /// File name, including extension.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location of the copy within the storage medium.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Host filesystem path of the copy, when stored on the local filesystem.
    ///
    /// The file must not be modified in place.
    #[must_use]
    pub fn local_path(&self) -> Option<PathBuf> {
        self.storage.local_path(&self.path)
    }

    /// Read the whole file.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot read the copy.
    pub fn read(&self) -> Result<Vec<u8>> {
        self.storage.read(&self.path)
    }

    /// Read the whole file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy cannot be read or is not valid UTF-8.
    pub fn read_to_string(&self) -> Result<String> {
        String::from_utf8(self.read()?).map_err(|e| {
            Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    /// Size and modification time of the copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot stat the copy.
    pub fn record(&self) -> Result<FileRecord> {
        let stat = self.storage.stat(&self.path)?;
        Ok(FileRecord {
            name: self.name.clone(),
            size_bytes: stat.size_bytes,
            modified_at: stat.modified.map(DateTime::<Utc>::from),
        })
    }
}

/// Snapshot of a managed file's attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    name: String,
    size_bytes: u64,
    modified_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// File name, including extension.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the copy in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Modification time, carried over from the source where supported.
    #[must_use]
    pub const fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_at
    }
}

/// The `files` area of one node instance.
#[derive(Debug)]
pub(crate) struct FileStore {
    location: PathBuf,
    files: RefCell<Vec<String>>,
}

impl FileStore {
    pub(crate) fn initialise(ctx: &Context, node_location: &Path) -> Result<()> {
        ctx.storage
            .create_dir(&node_location.join(FILES_DIRECTORY_NAME))
    }

    pub(crate) fn load(ctx: &Context, node_location: &Path, node: &'static str) -> Result<Self> {
        let location = require_dir(ctx, node_location, FILES_DIRECTORY_NAME, node)?;
        let files = ctx.storage.list_entries(&location)?;
        Ok(Self {
            location,
            files: RefCell::new(files),
        })
    }

    pub(crate) fn files(&self) -> Vec<String> {
        self.files.borrow().clone()
    }

    pub(crate) fn has_file(&self, name: &str) -> bool {
        self.files.borrow().iter().any(|f| f == name)
    }

    pub(crate) fn get_file(&self, ctx: &Context, name: &str) -> Result<ManagedFile> {
        let path = self.location.join(name);
        if !is_lookup_name(name) || !ctx.storage.is_file(&path) {
            return Err(Error::DoesNotExist(format!(
                "Object does not manage a file {name}"
            )));
        }
        Ok(ManagedFile {
            storage: Arc::clone(&ctx.storage),
            path,
            name: name.to_string(),
        })
    }

    pub(crate) fn add_file(&self, ctx: &Context, source: &Path, name: Option<&str>) -> Result<()> {
        if let Some(name) = name {
            validate(name, NameKind::File)?;
            if is_reserved(name) {
                return Err(Error::AlreadyExists(format!(
                    "{name} names an existing directory, not a file"
                )));
            }
        }

        let missing = || {
            Error::DoesNotExist(format!(
                "File at location {} does not exist (it could exist but not be a file)",
                source.display()
            ))
        };
        if !source.is_file() {
            return Err(missing());
        }

        // an implicit name comes straight from the source and is not validated
        let new_name = match name {
            Some(name) => name.to_string(),
            None => source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(missing)?,
        };

        let destination = self.location.join(&new_name);
        if ctx.storage.is_file(&destination) {
            warn!(file = %new_name, location = %self.location.display(), "overwriting managed file");
        }
        ctx.storage
            .import_file(source, &destination, ctx.config.read_only_files)?;
        info!(file = %new_name, source = %source.display(), "added managed file");

        let mut files = self.files.borrow_mut();
        if !files.contains(&new_name) {
            files.push(new_name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::storage::MemoryStorage;

    fn setup() -> (Context, FileStore) {
        let storage = MemoryStorage::new();
        storage.create_dir_all(Path::new("/node")).unwrap();
        let ctx = Context {
            storage: Arc::new(storage),
            config: DatabaseConfig::default(),
        };
        FileStore::initialise(&ctx, Path::new("/node")).unwrap();
        let store = FileStore::load(&ctx, Path::new("/node"), "Datapoint").unwrap();
        (ctx, store)
    }

    #[test]
    fn test_add_and_read_file() {
        let (ctx, store) = setup();
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("example_file.dat");
        std::fs::write(&source, b"file data!\n").unwrap();

        store.add_file(&ctx, &source, None).unwrap();

        assert_eq!(store.files(), vec!["example_file.dat"]);
        assert!(store.has_file("example_file.dat"));
        let file = store.get_file(&ctx, "example_file.dat").unwrap();
        assert_eq!(file.read_to_string().unwrap(), "file data!\n");
        assert_eq!(file.record().unwrap().size_bytes(), 11);
    }

    #[test]
    fn test_implicit_name_is_not_validated() {
        let (ctx, store) = setup();
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("odd name (1).txt");
        std::fs::write(&source, b"x").unwrap();

        store.add_file(&ctx, &source, None).unwrap();
        assert!(store.has_file("odd name (1).txt"));

        let err = store.add_file(&ctx, &source, Some("odd name.txt")).unwrap_err();
        assert!(err.is_invalid_name());
    }

    #[test]
    fn test_directory_source_does_not_exist() {
        let (ctx, store) = setup();
        let dir = tempfile::tempdir().unwrap();

        let err = store.add_file(&ctx, dir.path(), None).unwrap_err();
        assert!(err.is_does_not_exist());
        let err = store
            .add_file(&ctx, &dir.path().join("missing.dat"), Some("x.dat"))
            .unwrap_err();
        assert!(err.is_does_not_exist());
        assert!(store.files().is_empty());
    }

    #[test]
    fn test_get_missing_file() {
        let (ctx, store) = setup();
        assert!(store.get_file(&ctx, "nope.txt").unwrap_err().is_does_not_exist());
        assert!(store.get_file(&ctx, "..").unwrap_err().is_does_not_exist());
    }
}
