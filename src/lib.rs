//! # HARDS: Hierarchical ARBitrary Data Storage
//!
//! A tree of named containers rooted at a [`Database`]:
//!
//! - A [`Dataset`] has exactly one parent (the database or another dataset),
//!   any number of child datasets, key-value metadata, managed files and
//!   datapoints.
//! - A [`Datapoint`] is a leaf carrying metadata and files.
//!
//! A dataset's datapoints are extended by its ancestors' datapoints: shared
//! baseline records are created once on a parent and picked up by every child
//! through [`Dataset::collect_datapoints`]. Inheritance concatenates, it
//! never overrides.
//!
//! ## Snapshot semantics
//!
//! Node instances are point-in-time snapshots of the storage medium. Child,
//! datapoint and file lists are read once at load and extended only by the
//! instance's own writes. Use [`Dataset::reload`] (or `reload = true` on
//! collection) to re-resolve from the database. There is no locking: the
//! crate is meant for single-threaded, synchronous use.
//!
//! ## Example Usage
//!
//! ```rust
//! use hards::{Database, HasDatasets, TreeNode};
//!
//! # fn main() -> hards::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let db = Database::create(dir.path().join("db"))?;
//!
//! let exp1 = db.create_dataset("exp1")?;
//! let run1 = exp1.create_dataset("run1")?;
//! exp1.create_datapoint("p1")?;
//! run1.create_datapoint("p2")?;
//!
//! let names: Vec<String> = run1
//!     .inherited_datapoints()?
//!     .iter()
//!     .map(|p| p.name().to_string())
//!     .collect();
//! assert_eq!(names, ["p2", "p1"]);
//!
//! let again = db.resolve_datapoint("exp1/run1/p2")?;
//! assert_eq!(again.fullname(), "exp1/run1/p2");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod children;
pub mod config;
mod data;
mod database;
mod datapoint;
mod dataset;
pub mod error;
mod files;
mod layout;
pub mod name;
mod node;
pub mod storage;

pub use children::HasDatasets;
pub use config::{DatabaseBuilder, DatabaseConfig};
pub use data::{HasData, Metadata};
pub use database::Database;
pub use datapoint::Datapoint;
pub use dataset::Dataset;
pub use error::{Error, NameKind, Result};
pub use files::{FileRecord, HasFiles, ManagedFile};
pub use node::{Parent, TreeNode};
