// ABOUTME: Unpacks validated gzip tarballs and resolves the release content root.
// ABOUTME: A single wrapping directory (as in forge-generated tarballs) becomes the root.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to extract {}: {detail}", .archive.display())]
    Failed { archive: PathBuf, detail: String },

    #[error("cannot resolve content root in {}: archive produced no entries", .0.display())]
    AmbiguousRoot(PathBuf),
}

/// Unpack `archive` into `destination` and return the content root.
pub fn extract(archive: &Path, destination: &Path) -> Result<PathBuf, ExtractError> {
    unpack(archive, destination)?;
    let root = resolve_content_root(destination)?;
    tracing::info!("Content root: {}", root.display());
    Ok(root)
}

/// Unpack `archive` into `destination` without resolving a content root.
pub fn unpack(archive: &Path, destination: &Path) -> Result<(), ExtractError> {
    let failed = |detail: String| ExtractError::Failed {
        archive: archive.to_path_buf(),
        detail,
    };

    fs::create_dir_all(destination).map_err(|e| failed(e.to_string()))?;

    let file = File::open(archive).map_err(|e| failed(e.to_string()))?;
    let mut tarball = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tarball.set_preserve_permissions(true);
    tarball.set_overwrite(true);
    tarball
        .unpack(destination)
        .map_err(|e| failed(e.to_string()))?;

    tracing::debug!("Unpacked {} into {}", archive.display(), destination.display());
    Ok(())
}

/// The sole top-level directory if there is exactly one entry and it is a directory,
/// otherwise `dir` itself.
pub fn resolve_content_root(dir: &Path) -> Result<PathBuf, ExtractError> {
    let entries = fs::read_dir(dir)
        .and_then(|entries| entries.collect::<Result<Vec<_>, _>>())
        .map_err(|e| ExtractError::Failed {
            archive: dir.to_path_buf(),
            detail: e.to_string(),
        })?;

    match entries.as_slice() {
        [] => Err(ExtractError::AmbiguousRoot(dir.to_path_buf())),
        [only] if only.file_type().map(|t| t.is_dir()).unwrap_or(false) => Ok(only.path()),
        _ => Ok(dir.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_directory_becomes_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("repo-abc123")).unwrap();

        let root = resolve_content_root(dir.path()).unwrap();
        assert_eq!(root, dir.path().join("repo-abc123"));
    }

    #[test]
    fn single_file_keeps_destination_as_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.js"), "x").unwrap();

        let root = resolve_content_root(dir.path()).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn empty_destination_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_content_root(dir.path()),
            Err(ExtractError::AmbiguousRoot(_))
        ));
    }
}
