//! Renames JPEGs after their EXIF capture time.
//!
//! `IMG_1234.JPG` taken at `2023:07:14 18:02:33` becomes
//! `Date_2023-07-14__Time_18.02.33.jpg`. The date is read with `exiftool`.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{info, warn};

pub const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const FILE_NAME_FORMAT: &str = "Date_%Y-%m-%d__Time_%H.%M.%S";

#[derive(Error, Debug)]
pub enum RenameError {
    #[error("Directory '{}' does not exist.", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("exiftool not found in PATH")]
    ExifToolNotFound,

    #[error("Failed to run exiftool: {0}")]
    ExifTool(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameSkip {
    NoDate,
    InvalidDate(String),
    TargetExists(PathBuf),
    RenameFailed(String),
}

#[derive(Debug, Default)]
pub struct RenameReport {
    pub renamed: Vec<(PathBuf, PathBuf)>,
    pub skipped: Vec<(PathBuf, RenameSkip)>,
}

static EXIFTOOL_AVAILABLE: OnceLock<bool> = OnceLock::new();

fn is_exiftool_available() -> bool {
    *EXIFTOOL_AVAILABLE.get_or_init(|| which::which("exiftool").is_ok())
}

/// New file name for a capture time in EXIF notation; the extension is lower-cased.
pub fn capture_date_file_name(date_taken: &str, extension: &str) -> Result<String, chrono::ParseError> {
    let taken = NaiveDateTime::parse_from_str(date_taken.trim(), EXIF_DATE_FORMAT)?;
    Ok(format!(
        "{}.{}",
        taken.format(FILE_NAME_FORMAT),
        extension.to_lowercase()
    ))
}

fn read_date_time_original(path: &Path) -> Result<Option<String>, RenameError> {
    let output = Command::new("exiftool")
        .arg("-s3")
        .arg("-EXIF:DateTimeOriginal")
        .arg(path)
        .output()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string))
}

/// Renames every `.jpg`/`.jpeg` directly inside `dir`. Files without a usable
/// date are skipped; an existing file is never overwritten.
pub fn rename_by_capture_date(dir: &Path) -> Result<RenameReport, RenameError> {
    if !dir.is_dir() {
        return Err(RenameError::DirectoryNotFound(dir.to_path_buf()));
    }
    if !is_exiftool_available() {
        return Err(RenameError::ExifToolNotFound);
    }

    let mut files = shared_utils::collect_files(dir, JPEG_EXTENSIONS, false)
        .map_err(|_| RenameError::DirectoryNotFound(dir.to_path_buf()))?;
    files.sort();

    let mut report = RenameReport::default();
    for path in files {
        let extension = shared_utils::common_utils::get_extension_lowercase(&path);
        let Some(date_taken) = read_date_time_original(&path)? else {
            info!(file = %path.display(), "No EXIF date found, skipped");
            report.skipped.push((path, RenameSkip::NoDate));
            continue;
        };

        let new_name = match capture_date_file_name(&date_taken, &extension) {
            Ok(name) => name,
            Err(_) => {
                info!(file = %path.display(), date = %date_taken, "Invalid date format, skipped");
                report.skipped.push((path, RenameSkip::InvalidDate(date_taken)));
                continue;
            }
        };

        let target = path.with_file_name(&new_name);
        if target == path {
            continue;
        }
        if target.exists() {
            warn!(file = %path.display(), target = %target.display(), "Target name taken, skipped");
            report.skipped.push((path, RenameSkip::TargetExists(target)));
            continue;
        }

        match std::fs::rename(&path, &target) {
            Ok(()) => {
                info!(date = %date_taken, from = %path.display(), to = %new_name, "Renamed");
                report.renamed.push((path, target));
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Rename failed");
                report.skipped.push((path, RenameSkip::RenameFailed(e.to_string())));
            }
        }
    }

    Ok(report)
}
