//! Persisted layout of the tree.
//!
//! ```text
//! <database>/
//!   children/
//!     <dataset>/
//!       children/          nested datasets
//!       datapoints/
//!         <datapoint>/
//!           files/
//!           data.json
//!       files/
//!       data.json
//! ```

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::DatabaseConfig;
use crate::storage::Storage;
use crate::{Error, Result};

pub(crate) const CHILDREN_DIRECTORY_NAME: &str = "children";
pub(crate) const DATAPOINTS_DIRECTORY_NAME: &str = "datapoints";
pub(crate) const FILES_DIRECTORY_NAME: &str = "files";
pub(crate) const DATA_FILE_NAME: &str = "data.json";

/// Storage medium and settings shared by every node of one opened database.
#[derive(Debug)]
pub(crate) struct Context {
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) config: DatabaseConfig,
}

/// Fail with [`Error::Structural`] unless `location/missing` is a directory.
pub(crate) fn require_dir(
    ctx: &Context,
    location: &Path,
    missing: &'static str,
    node: &'static str,
) -> Result<PathBuf> {
    let path = location.join(missing);
    if !ctx.storage.is_dir(&path) {
        return Err(Error::Structural {
            location: location.to_path_buf(),
            missing,
            entry: "directory",
            node,
        });
    }
    Ok(path)
}

/// Fail with [`Error::Structural`] unless `location/missing` is a file.
pub(crate) fn require_file(
    ctx: &Context,
    location: &Path,
    missing: &'static str,
    node: &'static str,
) -> Result<PathBuf> {
    let path = location.join(missing);
    if !ctx.storage.is_file(&path) {
        return Err(Error::Structural {
            location: location.to_path_buf(),
            missing,
            entry: "file",
            node,
        });
    }
    Ok(path)
}

/// Final path component of a node location.
pub(crate) fn node_name(location: &Path) -> String {
    location
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Names of the sub-directories of one storage area, as of load time.
///
/// Used for both the dataset children and the datapoints of a node. The list
/// is read once and only ever appended to by this instance's own creation
/// calls; mutations made through other instances stay invisible until the
/// node is reloaded.
#[derive(Debug)]
pub(crate) struct ChildIndex {
    location: PathBuf,
    names: RefCell<Vec<String>>,
}

impl ChildIndex {
    pub(crate) fn load(
        ctx: &Context,
        node_location: &Path,
        area: &'static str,
        node: &'static str,
    ) -> Result<Self> {
        let location = require_dir(ctx, node_location, area, node)?;
        let names = ctx.storage.list_dirs(&location)?;
        debug!(location = %location.display(), count = names.len(), "loaded child index");
        Ok(Self {
            location,
            names: RefCell::new(names),
        })
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.names.borrow().clone()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.names.borrow().iter().any(|n| n == name)
    }

    pub(crate) fn register(&self, name: &str) {
        if !self.contains(name) {
            self.names.borrow_mut().push(name.to_string());
        }
    }

    /// Location a child called `name` lives at, whether or not it exists.
    pub(crate) fn child_location(&self, name: &str) -> PathBuf {
        self.location.join(name)
    }
}
