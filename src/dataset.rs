//! Datasets: interior nodes carrying metadata, files, child datasets and
//! datapoints.
//!
//! ## Snapshots and staleness
//!
//! Every instance is a snapshot of storage taken when it was loaded. Two
//! instances of the same dataset can diverge: a datapoint created through one
//! is invisible to the other's cached list until that other is reloaded.
//! [`Dataset::collect_datapoints`] with `reload = true` re-resolves the whole
//! ancestor chain from the database before collecting, which is enough for
//! single-threaded, synchronous use where every mutation has been persisted
//! before the next read. Nothing protects against concurrent writers.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info};

use crate::children::{self, HasDatasets};
use crate::data::{DataStore, HasData, Metadata};
use crate::error::NameKind;
use crate::files::{FileStore, HasFiles, ManagedFile};
use crate::layout::{
    node_name, ChildIndex, Context, CHILDREN_DIRECTORY_NAME, DATAPOINTS_DIRECTORY_NAME,
};
use crate::name::{is_lookup_name, is_reserved, validate};
use crate::node::{Parent, TreeNode};
use crate::{Datapoint, Error, Result};

const NODE: &str = "Dataset";

/// A dataset handle. Clones share the same in-memory snapshot.
#[derive(Debug, Clone)]
pub struct Dataset {
    inner: Rc<DatasetInner>,
}

#[derive(Debug)]
struct DatasetInner {
    ctx: Rc<Context>,
    location: PathBuf,
    name: String,
    parent: Parent,
    data: DataStore,
    files: FileStore,
    children: ChildIndex,
    datapoints: ChildIndex,
}

impl Dataset {
    pub(crate) fn load(ctx: Rc<Context>, location: PathBuf, parent: Parent) -> Result<Self> {
        let files = FileStore::load(&ctx, &location, NODE)?;
        let data = DataStore::load(&ctx, &location, NODE)?;
        let children = ChildIndex::load(&ctx, &location, CHILDREN_DIRECTORY_NAME, NODE)?;
        let datapoints = ChildIndex::load(&ctx, &location, DATAPOINTS_DIRECTORY_NAME, NODE)?;
        debug!(location = %location.display(), "loaded dataset");

        Ok(Self {
            inner: Rc::new(DatasetInner {
                name: node_name(&location),
                ctx,
                location,
                parent,
                data,
                files,
                children,
                datapoints,
            }),
        })
    }

    /// Lay out an empty dataset at `location`. Not atomic: a failure partway
    /// leaves the areas created so far in place.
    pub(crate) fn materialize(ctx: &Context, location: &Path) -> Result<()> {
        ctx.storage.create_dir(location)?;
        ctx.storage
            .create_dir(&location.join(CHILDREN_DIRECTORY_NAME))?;
        ctx.storage
            .create_dir(&location.join(DATAPOINTS_DIRECTORY_NAME))?;
        FileStore::initialise(ctx, location)?;
        DataStore::initialise(ctx, location)
    }

    pub(crate) fn parent_handle(&self) -> Parent {
        self.inner.parent.clone()
    }

    /// True if both handles point at the same live instance.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Names of the datapoints known to this instance.
    #[must_use]
    pub fn datapoints(&self) -> Vec<String> {
        self.inner.datapoints.names()
    }

    /// True if this instance knows a datapoint called `name`.
    #[must_use]
    pub fn has_datapoint(&self, name: &str) -> bool {
        self.inner.datapoints.contains(name)
    }

    /// Load the datapoint called `name` fresh from storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DoesNotExist`] if the datapoint is not stored.
    pub fn get_datapoint(&self, name: &str) -> Result<Datapoint> {
        let location = self.inner.datapoints.child_location(name);
        if !is_lookup_name(name) || !self.inner.ctx.storage.is_dir(&location) {
            return Err(Error::DoesNotExist(format!(
                "Dataset does not contain datapoint {name}"
            )));
        }
        Datapoint::load(Rc::clone(&self.inner.ctx), location, self.clone())
    }

    /// Create a datapoint in this dataset and return a live instance of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] or [`Error::AlreadyExists`] before
    /// anything is written.
    pub fn create_datapoint(&self, name: &str) -> Result<Datapoint> {
        validate(name, NameKind::Datapoint)?;

        let ctx = &self.inner.ctx;
        let location = self.inner.datapoints.child_location(name);
        if is_reserved(name) || ctx.storage.exists(&location) {
            return Err(Error::AlreadyExists(format!("Datapoint {name} already exists")));
        }

        Datapoint::materialize(ctx, &location)?;
        self.inner.datapoints.register(name);

        let datapoint = Datapoint::load(Rc::clone(ctx), location, self.clone())?;
        info!(datapoint = %datapoint.fullname(), "created datapoint");
        Ok(datapoint)
    }

    /// Collect this dataset's datapoints, optionally followed by those of
    /// every ancestor dataset.
    ///
    /// Ordering is leaf to root: this dataset's own datapoints first, then its
    /// parent's, and so on up to (excluding) the database. Datapoints are
    /// concatenated, never merged by name.
    ///
    /// With `reload` the dataset is first re-resolved from the database by its
    /// [`fullname`](TreeNode::fullname), so the collection reflects storage
    /// rather than the cached lists of this instance and its ancestors.
    /// Without it the cached lists are used as they are.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DoesNotExist`] if the dataset (on reload) or a listed
    /// datapoint can no longer be found.
    pub fn collect_datapoints(
        &self,
        include_ancestors: bool,
        reload: bool,
    ) -> Result<Vec<Datapoint>> {
        if reload {
            return self.reload()?.collect_datapoints(include_ancestors, false);
        }

        let mut datapoints = self.own_datapoints()?;
        if include_ancestors {
            let mut parent = self.inner.parent.clone();
            while let Parent::Dataset(dataset) = parent {
                datapoints.extend(dataset.own_datapoints()?);
                parent = dataset.parent_handle();
            }
        }
        Ok(datapoints)
    }

    /// This dataset's datapoints plus every ancestor's, reloaded from storage.
    ///
    /// # Errors
    ///
    /// See [`collect_datapoints`](Self::collect_datapoints).
    pub fn inherited_datapoints(&self) -> Result<Vec<Datapoint>> {
        self.collect_datapoints(true, true)
    }

    fn own_datapoints(&self) -> Result<Vec<Datapoint>> {
        self.inner
            .datapoints
            .names()
            .iter()
            .map(|name| self.get_datapoint(name))
            .collect()
    }

    /// A fresh instance of this dataset, re-resolved from the database along
    /// with its whole ancestor chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DoesNotExist`] if the dataset can no longer be
    /// resolved by its full name.
    pub fn reload(&self) -> Result<Self> {
        let fullname = self.fullname();
        debug!(dataset = %fullname, "reloading dataset from database");
        self.database().resolve_dataset(&fullname)
    }
}

impl TreeNode for Dataset {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn parent(&self) -> Option<Parent> {
        Some(self.parent_handle())
    }

    fn location(&self) -> &Path {
        &self.inner.location
    }
}

impl HasDatasets for Dataset {
    fn children(&self) -> Vec<String> {
        self.inner.children.names()
    }

    fn has_dataset(&self, name: &str) -> bool {
        self.inner.children.contains(name)
    }

    fn get_dataset(&self, name: &str) -> Result<Self> {
        children::get_dataset(&self.inner.ctx, &self.inner.children, self.as_parent(), name)
    }

    fn create_dataset(&self, name: &str) -> Result<Self> {
        children::create_dataset(&self.inner.ctx, &self.inner.children, self.as_parent(), name)
    }

    fn as_parent(&self) -> Parent {
        Parent::Dataset(self.clone())
    }
}

impl HasData for Dataset {
    fn data(&self) -> Metadata {
        self.inner.data.data()
    }

    fn add_data<I, K>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.inner.data.merge(&self.inner.ctx, entries)
    }
}

impl HasFiles for Dataset {
    fn files(&self) -> Vec<String> {
        self.inner.files.files()
    }

    fn has_file(&self, name: &str) -> bool {
        self.inner.files.has_file(name)
    }

    fn get_file(&self, name: &str) -> Result<ManagedFile> {
        self.inner.files.get_file(&self.inner.ctx, name)
    }

    fn add_file(&self, source: &Path, name: Option<&str>) -> Result<()> {
        self.inner.files.add_file(&self.inner.ctx, source, name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::Database;

    fn memory_dataset() -> (Database, Dataset) {
        let db = Database::builder()
            .storage(Arc::new(MemoryStorage::new()))
            .create("/test_db")
            .unwrap();
        let dataset = db.create_dataset("test_dataset").unwrap();
        (db, dataset)
    }

    #[test]
    fn test_created_correctly() {
        let (db, dataset) = memory_dataset();
        let storage = db.storage();
        let location = Path::new("/test_db/children/test_dataset");

        assert_eq!(dataset.location(), location);
        assert!(storage.is_dir(&location.join("children")));
        assert!(storage.is_dir(&location.join("datapoints")));
        assert!(storage.is_dir(&location.join("files")));
        assert_eq!(storage.read(&location.join("data.json")).unwrap(), b"{}");

        assert!(dataset.parent().unwrap().ptr_eq(&Parent::Database(db.clone())));
        assert!(db.has_dataset("test_dataset"));
        assert!(dataset.children().is_empty());
        assert!(dataset.datapoints().is_empty());
        assert!(dataset.files().is_empty());
        assert!(dataset.data().is_empty());
        assert!(!dataset.has_dataset("random_dataset"));
        assert!(!dataset.has_datapoint("random_datapoint"));
    }

    #[test]
    fn test_create_existing_datapoint_fails_cleanly() {
        let (_db, dataset) = memory_dataset();
        let datapoint = dataset.create_datapoint("p1").unwrap();
        datapoint.add_data([("kept", json!(true))]).unwrap();

        let err = dataset.create_datapoint("p1").unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(dataset.datapoints(), vec!["p1"]);
        assert_eq!(dataset.get_datapoint("p1").unwrap().data()["kept"], json!(true));
    }

    #[test]
    fn test_invalid_datapoint_name_writes_nothing() {
        let (db, dataset) = memory_dataset();
        let area = Path::new("/test_db/children/test_dataset/datapoints");
        let before = db.storage().list_entries(area).unwrap();

        let err = dataset.create_datapoint("d&tapoint").unwrap_err();
        assert!(err.is_invalid_name());

        assert_eq!(db.storage().list_entries(area).unwrap(), before);
    }

    #[test]
    fn test_missing_datapoints_area_is_structural() {
        let (db, _dataset) = memory_dataset();
        let storage = db.storage();
        let location = Path::new("/test_db/children/broken");
        storage.create_dir(location).unwrap();
        storage.create_dir(&location.join("children")).unwrap();
        storage.create_dir(&location.join("files")).unwrap();
        storage.write(&location.join("data.json"), b"{}").unwrap();

        let err = db.get_dataset("broken").unwrap_err();
        match err {
            Error::Structural { missing, node, .. } => {
                assert_eq!(missing, "datapoints");
                assert_eq!(node, "Dataset");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_reload_returns_new_instance() {
        let (_db, dataset) = memory_dataset();
        let reloaded = dataset.reload().unwrap();
        assert!(!Dataset::ptr_eq(&dataset, &reloaded));
        assert_eq!(reloaded.location(), dataset.location());
    }
}
