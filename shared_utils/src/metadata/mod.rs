//! Metadata Preservation Module
//!
//! File-system level carry-over from a source file onto its converted output:
//! access/modification timestamps and (on unix) permission bits. Timestamps must
//! be applied after the destination is fully written, since any later write
//! bumps the modification time again.

use std::io;
use std::path::Path;

/// Copies the last-access and last-modification times of `src` onto `dst`.
pub fn copy_file_timestamps(src: &Path, dst: &Path) -> io::Result<()> {
    let m = std::fs::metadata(src)?;
    let atime = filetime::FileTime::from_last_access_time(&m);
    let mtime = filetime::FileTime::from_last_modification_time(&m);
    filetime::set_file_times(dst, atime, mtime)
}

/// Copies permission bits of `src` onto `dst`. Failures are logged, never returned.
pub fn copy_permissions(src: &Path, dst: &Path) {
    let Ok(metadata) = std::fs::metadata(src) else {
        return;
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        if let Err(e) = std::fs::set_permissions(dst, std::fs::Permissions::from_mode(mode)) {
            tracing::warn!(path = %dst.display(), error = %e, "Failed to copy permissions");
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = std::fs::set_permissions(dst, metadata.permissions()) {
            tracing::warn!(path = %dst.display(), error = %e, "Failed to copy permissions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_copy_file_timestamps() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.heic");
        let dst = temp.path().join("dst.jpg");
        fs::write(&src, b"src").unwrap();
        fs::write(&dst, b"dst").unwrap();

        let atime = FileTime::from_unix_time(1_500_000_000, 0);
        let mtime = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_times(&src, atime, mtime).unwrap();

        copy_file_timestamps(&src, &dst).unwrap();

        let meta = fs::metadata(&dst).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), mtime);
        assert_eq!(FileTime::from_last_access_time(&meta), atime);
    }

    #[test]
    fn test_copy_file_timestamps_missing_source() {
        let temp = TempDir::new().unwrap();
        let dst = temp.path().join("dst.jpg");
        fs::write(&dst, b"dst").unwrap();
        assert!(copy_file_timestamps(&temp.path().join("gone.heic"), &dst).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.heic");
        let dst = temp.path().join("dst.jpg");
        fs::write(&src, b"src").unwrap();
        fs::write(&dst, b"dst").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o640)).unwrap();

        copy_permissions(&src, &dst);

        let mode = fs::metadata(&dst).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
