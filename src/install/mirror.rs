// ABOUTME: Filesystem replacement of the live directory from a content root.
// ABOUTME: Excluded names are never deleted from, nor copied into, the live directory.

use std::fs;
use std::io;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::InstallError;
use crate::types::{ExcludePattern, is_excluded};

/// Make `live` match `source`, keeping excluded top-level entries.
///
/// Source entries are written over their live counterparts first. Live
/// entries the source lacks are removed only once every copy succeeded, so
/// a failed copy leaves the previous files behind.
pub fn mirror(source: &Path, live: &Path, exclude: &[ExcludePattern]) -> Result<(), InstallError> {
    fs::create_dir_all(live).map_err(copy_error(live))?;
    copy_over(source, live, exclude)?;
    remove_stale(source, live, exclude)
}

/// Empty `live` completely, hidden entries included, then copy `source` into it.
pub fn clear_and_copy(
    source: &Path,
    live: &Path,
    exclude: &[ExcludePattern],
) -> Result<(), InstallError> {
    fs::create_dir_all(live).map_err(copy_error(live))?;

    for entry in WalkDir::new(live).min_depth(1).max_depth(1) {
        let entry = entry.map_err(walk_error(live))?;
        remove_entry(entry.path()).map_err(copy_error(entry.path()))?;
    }

    copy_over(source, live, exclude)
}

/// Excludes apply to top-level names only.
fn kept(entry: &DirEntry, exclude: &[ExcludePattern]) -> bool {
    entry.depth() != 1 || !is_excluded(exclude, &entry.file_name().to_string_lossy())
}

/// Copy every non-excluded entry of `source` onto `dest`, replacing whatever
/// occupies each destination path.
fn copy_over(source: &Path, dest: &Path, exclude: &[ExcludePattern]) -> Result<(), InstallError> {
    let walker = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| kept(e, exclude));

    for entry in walker {
        let entry = entry.map_err(walk_error(source))?;
        let from = entry.path();
        let to = dest.join(relative(source, from)?);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            clear_path(&to, |_| false).map_err(copy_error(&to))?;
            copy_symlink(from, &to).map_err(copy_error(from))?;
        } else if file_type.is_dir() {
            clear_path(&to, |meta| meta.is_dir()).map_err(copy_error(&to))?;
            fs::create_dir_all(&to).map_err(copy_error(&to))?;
        } else {
            clear_path(&to, |meta| meta.is_file()).map_err(copy_error(&to))?;
            fs::copy(from, &to).map_err(copy_error(from))?;
        }
    }

    Ok(())
}

/// Remove entries of `live` with no counterpart in `source`, at any depth.
fn remove_stale(source: &Path, live: &Path, exclude: &[ExcludePattern]) -> Result<(), InstallError> {
    let mut walker = WalkDir::new(live)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| kept(e, exclude));

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(walk_error(live))?;
        let counterpart = source.join(relative(live, entry.path())?);
        if counterpart.symlink_metadata().is_ok() {
            continue;
        }

        remove_entry(entry.path()).map_err(copy_error(entry.path()))?;
        tracing::debug!("Removed stale entry {}", entry.path().display());
        if entry.file_type().is_dir() {
            walker.skip_current_dir();
        }
    }

    Ok(())
}

/// Remove whatever sits at `path` unless `keep` accepts it. Symlinks are
/// never kept, so nothing is written through one.
fn clear_path(path: &Path, keep: impl Fn(&fs::Metadata) -> bool) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if !meta.file_type().is_symlink() && keep(&meta) => Ok(()),
        Ok(_) => remove_entry(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn relative<'a>(root: &Path, path: &'a Path) -> Result<&'a Path, InstallError> {
    path.strip_prefix(root).map_err(|e| InstallError::Copy {
        path: path.to_path_buf(),
        source: io::Error::other(e),
    })
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    let target = fs::read_link(from)?;
    std::os::unix::fs::symlink(target, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to).map(|_| ())
}

fn remove_entry(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn copy_error(path: &Path) -> impl FnOnce(io::Error) -> InstallError {
    let path = path.to_path_buf();
    move |source| InstallError::Copy { path, source }
}

fn walk_error(root: &Path) -> impl FnOnce(walkdir::Error) -> InstallError {
    let root = root.to_path_buf();
    move |e| InstallError::Copy {
        path: e.path().map(Path::to_path_buf).unwrap_or(root),
        source: e.into(),
    }
}
