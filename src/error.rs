//! Error types for HARDS
//!
//! Every failure is raised synchronously at the call that detects it. Nothing
//! in the crate retries, and multi-step creation is never rolled back.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// What a validated name was going to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// A dataset name
    Dataset,
    /// A datapoint name
    Datapoint,
    /// An explicitly supplied managed file name
    File,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Dataset => "Dataset",
            Self::Datapoint => "Datapoint",
            Self::File => "File",
        };
        f.write_str(kind)
    }
}

/// HARDS error types
#[derive(Error, Debug)]
pub enum Error {
    /// A dataset, datapoint or file was requested that does not exist.
    ///
    /// Also raised when the source handed to `add_file` is missing or is not a
    /// regular file.
    #[error("Does not exist: {0}")]
    DoesNotExist(String),

    /// Creation collided with an existing sibling of the same name.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A name contains characters outside `[A-Za-z0-9._-]`.
    #[error("{kind} name {name:?} is invalid: {}", describe_invalid(.invalid))]
    InvalidName {
        /// What the name was for
        kind: NameKind,
        /// The rejected name
        name: String,
        /// Exactly the offending characters
        invalid: BTreeSet<char>,
    },

    /// The persisted layout of a node is missing a required sub-area.
    ///
    /// Signals corruption of the medium, tampering outside the API, or debris
    /// left by an earlier creation that failed partway.
    #[error("{location} does not contain a '{missing}' {entry} which is required for it to be a '{node}'")]
    Structural {
        /// Location of the malformed node
        location: PathBuf,
        /// The missing sub-area
        missing: &'static str,
        /// `directory` or `file`
        entry: &'static str,
        /// The node kind being loaded
        node: &'static str,
    },

    /// A metadata document could not be (de)serialized.
    #[error("Metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error from the storage medium
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_invalid(invalid: &BTreeSet<char>) -> String {
    let chars: Vec<String> = invalid.iter().map(|c| format!("{c:?}")).collect();
    format!("contains invalid characters {{{}}}", chars.join(", "))
}

impl Error {
    /// True for [`Error::DoesNotExist`].
    #[must_use]
    pub const fn is_does_not_exist(&self) -> bool {
        matches!(self, Self::DoesNotExist(_))
    }

    /// True for [`Error::AlreadyExists`].
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// True for [`Error::InvalidName`].
    #[must_use]
    pub const fn is_invalid_name(&self) -> bool {
        matches!(self, Self::InvalidName { .. })
    }

    /// True for [`Error::Structural`].
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }
}
