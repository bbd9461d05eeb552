//! Identity and navigation shared by every node of the tree.

use std::path::Path;

use crate::{Database, Dataset};

/// A node of the tree: the database, a dataset or a datapoint.
///
/// Navigation works purely on the parent links of already-loaded instances
/// and never re-reads storage.
pub trait TreeNode {
    /// The node's name (the database's is the last component of its location).
    fn name(&self) -> &str;

    /// The node's parent; `None` only for the database.
    fn parent(&self) -> Option<Parent>;

    /// Storage location of the node.
    fn location(&self) -> &Path;

    /// True only for the database.
    fn is_database(&self) -> bool {
        false
    }

    /// The database at the root of this node's parent chain.
    ///
    /// Every parent chain ends at a database by construction, so this cannot
    /// fail.
    ///
    /// # Panics
    ///
    /// Panics if an implementor without a parent does not override this
    /// method.
    fn database(&self) -> Database {
        let mut parent = match self.parent() {
            Some(parent) => parent,
            None => unreachable!("only the database has no parent and it overrides database()"),
        };
        loop {
            match parent {
                Parent::Database(db) => return db,
                Parent::Dataset(dataset) => parent = dataset.parent_handle(),
            }
        }
    }

    /// Names from just below the database down to this node.
    fn path_to_database(&self) -> Vec<String> {
        if self.is_database() {
            return Vec::new();
        }
        let mut names = vec![self.name().to_string()];
        let mut parent = self.parent();
        while let Some(Parent::Dataset(dataset)) = parent {
            names.push(dataset.name().to_string());
            parent = dataset.parent();
        }
        names.reverse();
        names
    }

    /// The slash-joined path from the database; resolving it from the database
    /// yields a fresh instance of this node.
    fn fullname(&self) -> String {
        self.path_to_database().join("/")
    }
}

/// The parent of a dataset: the database or another dataset.
#[derive(Debug, Clone)]
pub enum Parent {
    /// Top-level dataset
    Database(Database),
    /// Nested dataset or datapoint
    Dataset(Dataset),
}

impl Parent {
    /// The dataset, if the parent is not the database.
    #[must_use]
    pub const fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Self::Database(_) => None,
            Self::Dataset(dataset) => Some(dataset),
        }
    }

    /// True if both handles point at the same live instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Database(a), Self::Database(b)) => Database::ptr_eq(a, b),
            (Self::Dataset(a), Self::Dataset(b)) => Dataset::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl TreeNode for Parent {
    fn name(&self) -> &str {
        match self {
            Self::Database(db) => db.name(),
            Self::Dataset(dataset) => dataset.name(),
        }
    }

    fn parent(&self) -> Option<Parent> {
        match self {
            Self::Database(_) => None,
            Self::Dataset(dataset) => dataset.parent(),
        }
    }

    fn location(&self) -> &Path {
        match self {
            Self::Database(db) => db.location(),
            Self::Dataset(dataset) => dataset.location(),
        }
    }

    fn is_database(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    fn database(&self) -> Database {
        match self {
            Self::Database(db) => db.clone(),
            Self::Dataset(dataset) => dataset.database(),
        }
    }
}
