//! Filesystem helpers shared by the record store and the registry
//!
//! Every persisted file goes through [`write_atomic`]: readers observe either
//! the previous contents or the new contents, never a partial write.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Create `dir` (and parents) if missing, restricted to the owner (0700).
pub fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}

/// Sibling temp path used while replacing `path`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("keyvault"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Create `path` for writing, readable by the owner only from the start.
///
/// Fails if anything (including a symlink) already exists at `path`.
fn create_private(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

/// Flush the directory entry of a completed rename.
fn sync_parent(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        File::open(parent)?.sync_all()?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Atomically replace `path` with `contents`.
///
/// Writes a sibling `.tmp` file created with 0600 permissions, flushes it to
/// disk, renames it over the target and flushes the directory. A stale temp
/// file or symlink is removed first, never written through. On failure the
/// temp file is removed and the previous file is left untouched.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    match fs::remove_file(&tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let result = (|| {
        let mut file = create_private(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, path)?;
        sync_parent(path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
