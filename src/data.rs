//! Key-value metadata attached to datasets and datapoints.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::layout::{require_file, Context, DATA_FILE_NAME};
use crate::Result;

/// A node's metadata: string keys to arbitrary JSON values.
pub type Metadata = Map<String, Value>;

/// Capability of nodes that carry a metadata mapping.
pub trait HasData {
    /// The metadata as loaded at construction, plus this instance's own
    /// writes.
    fn data(&self) -> Metadata;

    /// Look up a single metadata value.
    fn get_data(&self, key: &str) -> Option<Value> {
        self.data().get(key).cloned()
    }

    /// Shallow-merge `entries` into the metadata and persist the result.
    ///
    /// Keys in `entries` overwrite (or insert) whole values; keys not named
    /// are left untouched. The full document is rewritten on every call.
    /// Only this instance's in-memory copy is updated; other live instances
    /// of the same node keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized or written.
    fn add_data<I, K>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>;
}

/// The persisted metadata document of one node instance.
#[derive(Debug)]
pub(crate) struct DataStore {
    path: PathBuf,
    data: RefCell<Metadata>,
}

impl DataStore {
    /// Write an empty document for a node being created.
    pub(crate) fn initialise(ctx: &Context, node_location: &Path) -> Result<()> {
        ctx.storage
            .write(&node_location.join(DATA_FILE_NAME), b"{}")
    }

    pub(crate) fn load(ctx: &Context, node_location: &Path, node: &'static str) -> Result<Self> {
        let path = require_file(ctx, node_location, DATA_FILE_NAME, node)?;
        let data: Metadata = serde_json::from_slice(&ctx.storage.read(&path)?)?;
        Ok(Self {
            path,
            data: RefCell::new(data),
        })
    }

    pub(crate) fn data(&self) -> Metadata {
        self.data.borrow().clone()
    }

    pub(crate) fn merge<I, K>(&self, ctx: &Context, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut merged = self.data();
        for (key, value) in entries {
            merged.insert(key.into(), value);
        }

        let document = if ctx.config.pretty_metadata {
            serde_json::to_vec_pretty(&merged)?
        } else {
            serde_json::to_vec(&merged)?
        };
        ctx.storage.write(&self.path, &document)?;
        debug!(path = %self.path.display(), keys = merged.len(), "wrote metadata");

        *self.data.borrow_mut() = merged;
        Ok(())
    }
}
