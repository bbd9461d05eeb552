//! Database configuration and builder.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{FsStorage, Storage};
use crate::{Database, Result};

/// Settings shared by every node of an opened database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Protect managed file copies against in-place modification where the
    /// medium supports it.
    pub read_only_files: bool,
    /// Pretty-print metadata documents.
    pub pretty_metadata: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            read_only_files: true,
            pretty_metadata: false,
        }
    }
}

/// Database builder
///
/// ```rust
/// use std::sync::Arc;
/// use hards::storage::MemoryStorage;
/// use hards::Database;
///
/// # fn main() -> hards::Result<()> {
/// let db = Database::builder()
///     .storage(Arc::new(MemoryStorage::new()))
///     .pretty_metadata(true)
///     .create("/scratch/db")?;
/// assert!(db.config().pretty_metadata);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    storage: Option<Arc<dyn Storage>>,
    config: DatabaseConfig,
}

impl DatabaseBuilder {
    /// Set the storage medium (defaults to the local filesystem).
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub const fn config(mut self, config: DatabaseConfig) -> Self {
        self.config = config;
        self
    }

    /// Mark managed file copies read-only
    #[must_use]
    pub const fn read_only_files(mut self, read_only: bool) -> Self {
        self.config.read_only_files = read_only;
        self
    }

    /// Pretty-print metadata documents
    #[must_use]
    pub const fn pretty_metadata(mut self, pretty: bool) -> Self {
        self.config.pretty_metadata = pretty;
        self
    }

    fn into_parts(self) -> (Arc<dyn Storage>, DatabaseConfig) {
        let storage = self.storage.unwrap_or_else(|| Arc::new(FsStorage::new()));
        (storage, self.config)
    }

    /// Create a new database at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`](crate::Error::AlreadyExists) if
    /// something already exists at `location`, or a storage error.
    pub fn create(self, location: impl AsRef<Path>) -> Result<Database> {
        let (storage, config) = self.into_parts();
        Database::create_with(storage, config, location.as_ref())
    }

    /// Open an existing database at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`](crate::Error::Structural) if `location`
    /// does not hold a database.
    pub fn open(self, location: impl AsRef<Path>) -> Result<Database> {
        let (storage, config) = self.into_parts();
        Database::open_with(storage, config, location.as_ref())
    }
}
