//! Child datasets: lookup, creation and path resolution.

use std::rc::Rc;

use tracing::{debug, info};

use crate::error::NameKind;
use crate::layout::{ChildIndex, Context};
use crate::name::{is_lookup_name, is_reserved, validate};
use crate::node::{Parent, TreeNode};
use crate::{Datapoint, Dataset, Error, Result};

/// Capability of nodes that hold child datasets (the database and datasets).
pub trait HasDatasets: TreeNode {
    /// Names of the child datasets known to this instance.
    ///
    /// Loaded once when the instance is constructed and extended only by this
    /// instance's own [`create_dataset`](Self::create_dataset) calls.
    fn children(&self) -> Vec<String>;

    /// True if this instance knows a child dataset called `name`.
    fn has_dataset(&self, name: &str) -> bool;

    /// Load the child dataset called `name` fresh from storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DoesNotExist`] if no such dataset is stored.
    fn get_dataset(&self, name: &str) -> Result<Dataset>;

    /// Create a child dataset and return a live instance of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] or [`Error::AlreadyExists`] without
    /// touching storage; storage errors while materialising may leave a
    /// partially created dataset behind.
    fn create_dataset(&self, name: &str) -> Result<Dataset>;

    /// This node as the parent of its children.
    fn as_parent(&self) -> Parent;

    /// Follow a `/`-separated path of datasets down from this node.
    ///
    /// Leading, trailing and repeated slashes are ignored. Every step loads
    /// the next dataset fresh from storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DoesNotExist`] at the first segment that cannot be
    /// resolved, or if the path has no segments.
    fn resolve_dataset(&self, path: &str) -> Result<Dataset> {
        let segments = split_path(path);
        descend(self, &segments, path)
    }

    /// Follow a path whose last segment names a datapoint.
    ///
    /// All but the last segment are resolved as datasets; the last is looked
    /// up among the final dataset's datapoints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DoesNotExist`] if any dataset or the datapoint is
    /// missing.
    fn resolve_datapoint(&self, path: &str) -> Result<Datapoint> {
        let segments = split_path(path);
        let Some((datapoint, datasets)) = segments.split_last() else {
            return Err(Error::DoesNotExist(format!("Empty datapoint path {path:?}")));
        };

        if datasets.is_empty() {
            return match self.as_parent() {
                Parent::Dataset(dataset) => dataset.get_datapoint(datapoint),
                Parent::Database(_) => Err(Error::DoesNotExist(format!(
                    "Database does not contain datapoint {datapoint}"
                ))),
            };
        }
        descend(self, datasets, path)?.get_datapoint(datapoint)
    }
}

/// Split a `/`-delimited path, dropping empty segments.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

fn descend<T: HasDatasets + ?Sized>(start: &T, segments: &[&str], path: &str) -> Result<Dataset> {
    let Some((first, rest)) = segments.split_first() else {
        return Err(Error::DoesNotExist(format!("Empty dataset path {path:?}")));
    };
    debug!(path, from = %start.location().display(), "resolving dataset path");

    let mut dataset = start.get_dataset(first)?;
    for segment in rest {
        dataset = dataset.get_dataset(segment)?;
    }
    Ok(dataset)
}

/// Load the child dataset `name` of the node owning `index`.
pub(crate) fn get_dataset(
    ctx: &Rc<Context>,
    index: &ChildIndex,
    parent: Parent,
    name: &str,
) -> Result<Dataset> {
    let location = index.child_location(name);
    if !is_lookup_name(name) || !ctx.storage.is_dir(&location) {
        return Err(Error::DoesNotExist(format!(
            "{} does not contain dataset {name}",
            parent_kind(&parent)
        )));
    }
    Dataset::load(Rc::clone(ctx), location, parent)
}

/// Creation protocol for datasets: validate, check for a collision,
/// materialise storage, register in the parent's index, return a live node.
pub(crate) fn create_dataset(
    ctx: &Rc<Context>,
    index: &ChildIndex,
    parent: Parent,
    name: &str,
) -> Result<Dataset> {
    validate(name, NameKind::Dataset)?;

    let location = index.child_location(name);
    if is_reserved(name) || ctx.storage.exists(&location) {
        return Err(Error::AlreadyExists(format!("Dataset {name} already exists")));
    }

    Dataset::materialize(ctx, &location)?;
    index.register(name);

    let dataset = Dataset::load(Rc::clone(ctx), location, parent)?;
    info!(dataset = %dataset.fullname(), "created dataset");
    Ok(dataset)
}

const fn parent_kind(parent: &Parent) -> &'static str {
    match parent {
        Parent::Database(_) => "Database",
        Parent::Dataset(_) => "Dataset",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_tolerates_extra_slashes() {
        assert_eq!(split_path("a/b/c"), vec!["a", "b", "c"]);
        assert_eq!(split_path("/a//b/"), vec!["a", "b"]);
        assert_eq!(split_path("test_dataset//"), vec!["test_dataset"]);
        assert!(split_path("///").is_empty());
        assert!(split_path("").is_empty());
    }
}
