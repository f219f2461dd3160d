//! Batch Processing Module
//!
//! File discovery for batch conversion: walks a root directory (optionally
//! recursively) and yields every regular file whose extension matches.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Directory '{}' does not exist.", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Failed to resolve directory '{}': {source}", path.display())]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Collects files under `dir` whose extension (case-insensitive) is one of `extensions`.
///
/// Non-recursive mode only lists the immediate entries of `dir`. Returned paths are
/// absolute; their order follows filesystem enumeration and is not guaranteed.
pub fn collect_files(
    dir: &Path,
    extensions: &[&str],
    recursive: bool,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::DirectoryNotFound(dir.to_path_buf()));
    }

    let root = std::path::absolute(dir).map_err(|source| DiscoveryError::Resolve {
        path: dir.to_path_buf(),
        source,
    })?;

    let walker = if recursive {
        WalkDir::new(&root).follow_links(true)
    } else {
        WalkDir::new(&root).max_depth(1)
    };

    let files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| crate::common_utils::has_extension(e.path(), extensions))
        .map(|e| e.into_path())
        .collect();

    debug!(
        root = %root.display(),
        recursive,
        count = files.len(),
        "File discovery finished"
    );

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let err = collect_files(&missing, &["heic"], false).unwrap_err();
        assert!(matches!(err, DiscoveryError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_non_recursive_filters_extensions() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("a.heic"));
        touch(&temp.path().join("b.HEIF"));
        touch(&temp.path().join("c.txt"));
        touch(&temp.path().join("sub/d.heic"));

        let files = collect_files(temp.path(), &["heic", "heif"], false).unwrap();
        assert_eq!(names(&files), vec!["a.heic", "b.HEIF"]);
        assert!(files.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_recursive_visits_subtree() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("a.heic"));
        touch(&temp.path().join("sub/d.heic"));
        touch(&temp.path().join("sub/deeper/e.heif"));
        touch(&temp.path().join("sub/deeper/f.png"));

        let files = collect_files(temp.path(), &["heic", "heif"], true).unwrap();
        assert_eq!(names(&files), vec!["a.heic", "d.heic", "e.heif"]);
    }

    #[test]
    fn test_directory_named_like_image_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("album.heic")).unwrap();
        let files = collect_files(temp.path(), &["heic"], true).unwrap();
        assert!(files.is_empty());
    }
}
