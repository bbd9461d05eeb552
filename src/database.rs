//! The root of the tree.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use tracing::info;

use crate::children::{self, HasDatasets};
use crate::config::{DatabaseBuilder, DatabaseConfig};
use crate::layout::{node_name, ChildIndex, Context, CHILDREN_DIRECTORY_NAME};
use crate::node::{Parent, TreeNode};
use crate::storage::Storage;
use crate::{Dataset, Error, Result};

const NODE: &str = "Database";

/// Root node: owns top-level datasets, carries no metadata and no files.
///
/// A `Database` is a cheap-to-clone handle; clones share the same in-memory
/// snapshot of the child list.
///
/// ```rust
/// use hards::{Database, HasData, HasDatasets, TreeNode};
/// use serde_json::json;
///
/// # fn main() -> hards::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let db = Database::create(dir.path().join("db"))?;
///
/// let exp = db.create_dataset("exp1")?;
/// exp.add_data([("learning_rate", json!(0.01))])?;
///
/// let run = exp.create_dataset("run1")?;
/// assert_eq!(run.fullname(), "exp1/run1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    inner: Rc<DatabaseInner>,
}

#[derive(Debug)]
struct DatabaseInner {
    ctx: Rc<Context>,
    location: PathBuf,
    name: String,
    children: ChildIndex,
}

impl Database {
    /// Create a new database builder
    #[must_use]
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// Create a database on the local filesystem with default settings.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] if `location` already exists.
    pub fn create(location: impl AsRef<Path>) -> Result<Self> {
        Self::builder().create(location)
    }

    /// Open an existing database on the local filesystem with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] if `location` has no `children` area.
    pub fn open(location: impl AsRef<Path>) -> Result<Self> {
        Self::builder().open(location)
    }

    pub(crate) fn create_with(
        storage: Arc<dyn Storage>,
        config: DatabaseConfig,
        location: &Path,
    ) -> Result<Self> {
        if storage.exists(location) {
            return Err(Error::AlreadyExists(format!(
                "Database location {} already exists",
                location.display()
            )));
        }

        storage.create_dir_all(location)?;
        storage.create_dir(&location.join(CHILDREN_DIRECTORY_NAME))?;
        info!(location = %location.display(), "created database");

        Self::open_with(storage, config, location)
    }

    pub(crate) fn open_with(
        storage: Arc<dyn Storage>,
        config: DatabaseConfig,
        location: &Path,
    ) -> Result<Self> {
        let ctx = Rc::new(Context { storage, config });
        Self::load(ctx, location.to_path_buf())
    }

    fn load(ctx: Rc<Context>, location: PathBuf) -> Result<Self> {
        let children = ChildIndex::load(&ctx, &location, CHILDREN_DIRECTORY_NAME, NODE)?;
        Ok(Self {
            inner: Rc::new(DatabaseInner {
                name: node_name(&location),
                ctx,
                location,
                children,
            }),
        })
    }

    /// A fresh snapshot of this database, sharing its storage and settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] if the `children` area has gone missing.
    pub fn reload(&self) -> Result<Self> {
        Self::load(Rc::clone(&self.inner.ctx), self.inner.location.clone())
    }

    /// Settings this database was opened with.
    #[must_use]
    pub fn config(&self) -> DatabaseConfig {
        self.inner.ctx.config
    }

    /// The storage medium behind this database.
    #[must_use]
    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.inner.ctx.storage)
    }

    /// True if both handles point at the same live instance.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl TreeNode for Database {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn parent(&self) -> Option<Parent> {
        None
    }

    fn location(&self) -> &Path {
        &self.inner.location
    }

    fn is_database(&self) -> bool {
        true
    }

    fn database(&self) -> Database {
        self.clone()
    }
}

impl HasDatasets for Database {
    fn children(&self) -> Vec<String> {
        self.inner.children.names()
    }

    fn has_dataset(&self, name: &str) -> bool {
        self.inner.children.contains(name)
    }

    fn get_dataset(&self, name: &str) -> Result<Dataset> {
        children::get_dataset(&self.inner.ctx, &self.inner.children, self.as_parent(), name)
    }

    fn create_dataset(&self, name: &str) -> Result<Dataset> {
        children::create_dataset(&self.inner.ctx, &self.inner.children, self.as_parent(), name)
    }

    fn as_parent(&self) -> Parent {
        Parent::Database(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn memory_db() -> Database {
        Database::builder()
            .storage(Arc::new(MemoryStorage::new()))
            .create("/test_db")
            .unwrap()
    }

    #[test]
    fn test_database_identity() {
        let db = memory_db();
        assert_eq!(db.name(), "test_db");
        assert!(db.is_database());
        assert!(db.parent().is_none());
        assert!(Database::ptr_eq(&db.database(), &db));
        assert!(db.path_to_database().is_empty());
        assert_eq!(db.fullname(), "");
        assert!(db.children().is_empty());
    }

    #[test]
    fn test_create_twice_fails() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        Database::builder().storage(Arc::clone(&storage)).create("/db").unwrap();
        let err = Database::builder().storage(storage).create("/db").unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_open_without_children_is_structural() {
        let storage = Arc::new(MemoryStorage::new());
        storage.create_dir_all(Path::new("/not_a_db")).unwrap();
        let err = Database::builder().storage(storage).open("/not_a_db").unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_get_missing_dataset() {
        let db = memory_db();
        assert!(db.get_dataset("nope").unwrap_err().is_does_not_exist());
        assert!(db.get_dataset("..").unwrap_err().is_does_not_exist());
        assert!(db.get_dataset("").unwrap_err().is_does_not_exist());
    }

    #[test]
    fn test_reload_sees_other_handles_datasets() {
        let db = memory_db();
        let other = db.reload().unwrap();
        other.create_dataset("late").unwrap();

        assert!(!db.has_dataset("late"));
        // lookups go to storage, not the cached list
        assert!(db.get_dataset("late").is_ok());
        assert!(db.reload().unwrap().has_dataset("late"));
    }
}
