//! Guards for destructive operations.
//!
//! Deleting originals is only allowed below a directory that is neither a
//! system location nor a bare home directory.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

const PROTECTED_ROOTS: &[&str] = &[
    "/", "/System", "/Library", "/Applications", "/Users", "/private", "/usr", "/bin", "/sbin",
    "/etc", "/var", "/opt", "/tmp", "/home", "/root", "/boot", "/dev", "/proc", "/sys",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnsafeTarget {
    #[error("Refusing to delete originals in protected system directory '{}'", .0.display())]
    SystemDirectory(PathBuf),

    #[error(
        "Refusing to delete originals directly in home directory '{}', choose a subdirectory",
        .0.display()
    )]
    HomeDirectory(PathBuf),
}

fn is_protected_root(path: &Path) -> bool {
    let text = path.to_string_lossy();
    let text = match text.trim_end_matches('/') {
        "" => "/",
        t => t,
    };
    PROTECTED_ROOTS.contains(&text)
}

/// `/home/<user>` or `/Users/<user>` itself.
fn is_home_directory(path: &Path) -> bool {
    let parts: Vec<Component<'_>> = path.components().collect();
    matches!(
        parts.as_slice(),
        [Component::RootDir, Component::Normal(base), Component::Normal(_)]
            if *base == "home" || *base == "Users"
    )
}

/// Rejects `path` when deleting files directly inside it would be reckless.
/// Both the given and the canonical form are checked, so `/usr/./` and
/// symlinks into system directories are caught too.
pub fn check_dangerous_directory(path: &Path) -> Result<(), UnsafeTarget> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

    for candidate in [path, canonical.as_path()] {
        if is_protected_root(candidate) {
            return Err(UnsafeTarget::SystemDirectory(candidate.to_path_buf()));
        }
        if is_home_directory(candidate) {
            return Err(UnsafeTarget::HomeDirectory(candidate.to_path_buf()));
        }
    }
    Ok(())
}
