//! Local filesystem storage.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{FileStat, Storage};
use crate::Result;

/// Storage backed directly by the local filesystem.
///
/// Managed file copies are made read-only (`0o400` on Unix) when requested.
/// Imports are staged next to the destination and renamed over it, so
/// re-adding a file is always an overwrite and a failed import leaves the
/// previous copy in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl FsStorage {
    /// Create a filesystem storage handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn list(path: &Path, dirs_only: bool) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            // follows symlinks, like a directory glob would
            if dirs_only && !entry.path().is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!(?name, dir = %path.display(), "skipping non UTF-8 entry"),
            }
        }
        names.sort();
        Ok(names)
    }
}

fn set_read_only(path: &Path) -> Result<()> {
    #[cfg(unix)]
    let perms = {
        use std::os::unix::fs::PermissionsExt;
        fs::Permissions::from_mode(0o400)
    };
    #[cfg(not(unix))]
    let perms = {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_readonly(true);
        perms
    };
    fs::set_permissions(path, perms)?;
    Ok(())
}

/// Hidden sibling of `dest` that an import is copied into before the rename.
fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.importing"))
}

/// Copy `source` to `staging` with the source mtime and the requested mode.
fn stage_copy(source: &Path, staging: &Path, read_only: bool) -> Result<()> {
    if staging.is_file() {
        make_writable(staging)?;
        fs::remove_file(staging)?;
    }

    // the copy inherits the source permissions
    fs::copy(source, staging)?;
    make_writable(staging)?;

    if let Ok(modified) = fs::metadata(source)?.modified() {
        File::options().write(true).open(staging)?.set_modified(modified)?;
    }

    if read_only {
        set_read_only(staging)?;
    }
    Ok(())
}

fn discard(staging: &Path) {
    if staging.is_file() {
        let removed =
            make_writable(staging).and_then(|()| fs::remove_file(staging).map_err(Into::into));
        if let Err(err) = removed {
            warn!(path = %staging.display(), %err, "could not remove staged import");
        }
    }
}

fn make_writable(path: &Path) -> Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    if !perms.readonly() {
        return Ok(());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(perms.mode() | 0o200);
    }
    #[cfg(not(unix))]
    #[allow(clippy::permissions_set_readonly_false)]
    perms.set_readonly(false);
    fs::set_permissions(path, perms)?;
    Ok(())
}

impl Storage for FsStorage {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir(path)?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn list_dirs(&self, path: &Path) -> Result<Vec<String>> {
        Self::list(path, true)
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<String>> {
        Self::list(path, false)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents)?;
        Ok(())
    }

    fn import_file(&self, source: &Path, dest: &Path, read_only: bool) -> Result<()> {
        let staging = staging_path(dest);
        if let Err(err) = stage_copy(source, &staging, read_only) {
            discard(&staging);
            return Err(err);
        }

        // rename replaces a read-only file on Unix but not elsewhere
        #[cfg(not(unix))]
        if dest.is_file() {
            make_writable(dest)?;
        }
        if let Err(err) = fs::rename(&staging, dest) {
            discard(&staging);
            return Err(err.into());
        }

        debug!(source = %source.display(), dest = %dest.display(), read_only, "copied file");
        Ok(())
    }

    fn stat(&self, path: &Path) -> Result<FileStat> {
        let metadata = fs::metadata(path)?;
        Ok(FileStat {
            size_bytes: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }

    fn local_path(&self, path: &Path) -> Option<PathBuf> {
        Some(path.to_path_buf())
    }
}
