//! Writer: replaces the artifact with the bundle.
//!
//! The bundle goes to a temporary file in the destination's directory, is
//! synced, takes over the destination's permission bits and is then renamed
//! over it. Until the rename the original file is untouched.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{BundleError, BundleResult};

/// Write `contents` to `path`, keeping the permission bits of the file
/// being replaced.
///
/// A new file gets mode `0644` on unix.
pub fn write_bundle(path: &Path, contents: &[u8]) -> BundleResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let permissions = match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(BundleError::io(path, e)),
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| BundleError::io(dir, e))?;
    staged
        .write_all(contents)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| BundleError::io(staged.path(), e))?;

    match permissions {
        Some(permissions) => staged.as_file().set_permissions(permissions),
        None => set_new_file_mode(staged.as_file()),
    }
    .map_err(|e| BundleError::io(path, e))?;

    debug!(path = %path.display(), bytes = contents.len(), "replacing artifact");
    staged
        .persist(path)
        .map_err(|e| BundleError::io(path, e.error))?;
    Ok(())
}

#[cfg(unix)]
fn set_new_file_mode(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_new_file_mode(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
