//! Datapoints: leaf records carrying metadata and files.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::children::HasDatasets;
use crate::data::{DataStore, HasData, Metadata};
use crate::files::{FileStore, HasFiles, ManagedFile};
use crate::layout::{node_name, Context};
use crate::node::{Parent, TreeNode};
use crate::{Dataset, Result};

const NODE: &str = "Datapoint";

/// A datapoint handle. Clones share the same in-memory snapshot.
#[derive(Debug, Clone)]
pub struct Datapoint {
    inner: Rc<DatapointInner>,
}

#[derive(Debug)]
struct DatapointInner {
    ctx: Rc<Context>,
    location: PathBuf,
    name: String,
    parent: Dataset,
    data: DataStore,
    files: FileStore,
}

impl Datapoint {
    pub(crate) fn load(ctx: Rc<Context>, location: PathBuf, parent: Dataset) -> Result<Self> {
        let files = FileStore::load(&ctx, &location, NODE)?;
        let data = DataStore::load(&ctx, &location, NODE)?;
        debug!(location = %location.display(), "loaded datapoint");

        Ok(Self {
            inner: Rc::new(DatapointInner {
                name: node_name(&location),
                ctx,
                location,
                parent,
                data,
                files,
            }),
        })
    }

    pub(crate) fn materialize(ctx: &Context, location: &Path) -> Result<()> {
        ctx.storage.create_dir(location)?;
        FileStore::initialise(ctx, location)?;
        DataStore::initialise(ctx, location)
    }

    /// The dataset this datapoint belongs to.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.inner.parent
    }

    /// True if both handles point at the same live instance.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// A fresh instance of this datapoint, re-resolved from the database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DoesNotExist`](crate::Error::DoesNotExist) if the
    /// datapoint can no longer be resolved by its full name.
    pub fn reload(&self) -> Result<Self> {
        self.database().resolve_datapoint(&self.fullname())
    }
}

impl TreeNode for Datapoint {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn parent(&self) -> Option<Parent> {
        Some(Parent::Dataset(self.inner.parent.clone()))
    }

    fn location(&self) -> &Path {
        &self.inner.location
    }
}

impl HasData for Datapoint {
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

impl HasFiles for Datapoint {
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
