//! Name validation for datasets, datapoints and explicitly named files.

use std::collections::BTreeSet;

use crate::error::NameKind;
use crate::{Error, Result};

/// Characters allowed in names besides ASCII letters and digits.
pub const EXTRA_NAME_CHARACTERS: [char; 3] = ['.', '_', '-'];

/// Names that pass the character check but alias an existing storage area.
const RESERVED_NAMES: [&str; 3] = ["", ".", ".."];

/// True if `c` may appear in a name.
#[must_use]
pub fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || EXTRA_NAME_CHARACTERS.contains(&c)
}

/// Return the set of characters in `name` that are not allowed.
#[must_use]
pub fn invalid_characters(name: &str) -> BTreeSet<char> {
    name.chars().filter(|c| !is_valid_name_char(*c)).collect()
}

/// Check a candidate name before anything is written.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] carrying exactly the offending characters.
/// Names such as `..` pass here; creating a node under one fails later as a
/// collision with the area it aliases.
pub fn validate(name: &str, kind: NameKind) -> Result<()> {
    let invalid = invalid_characters(name);
    if invalid.is_empty() {
        return Ok(());
    }

    Err(Error::InvalidName {
        kind,
        name: name.to_string(),
        invalid,
    })
}

/// True if `name` refers to the containing area itself or its parent.
pub(crate) fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// True if `name` could be the name of a stored node.
///
/// Lookups use this to refuse names like `..` that would escape the node's
/// storage area.
pub(crate) fn is_lookup_name(name: &str) -> bool {
    !is_reserved(name) && !name.contains('/')
}
