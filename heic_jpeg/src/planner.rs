//! Task planning: maps discovered sources onto destination paths.
//!
//! The output directory is never wiped. A source whose destination already
//! exists is skipped, which makes re-runs incremental. Two sources that map to
//! the same destination in one run (`IMG_1.heic` and `IMG_1.heif`) are resolved
//! in favour of the first in path order so no two workers ever write the same file.

use crate::error::BatchError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const OUTPUT_EXTENSION: &str = "jpg";

/// One source/destination pair. The destination's parent directory exists
/// once planning has returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DestinationExists,
    DuplicateDestination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct Plan {
    pub tasks: Vec<ConversionTask>,
    pub skipped: Vec<SkippedSource>,
}

/// Destination path for `source`.
///
/// Non-recursive: `output_root/<stem>.jpg`. Recursive: the path relative to
/// `source_root` is mirrored under `output_root` with its extension replaced.
pub fn destination_for(
    source: &Path,
    source_root: &Path,
    output_root: &Path,
    recursive: bool,
) -> PathBuf {
    if recursive {
        let rel = shared_utils::common_utils::compute_relative_path(source, source_root);
        if rel.is_relative() {
            return output_root.join(rel).with_extension(OUTPUT_EXTENSION);
        }
    }
    let stem = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "output".into());
    let mut name = stem;
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    output_root.join(name)
}

/// Builds the task list and creates every destination directory.
///
/// `sources` are planned in sorted order so duplicate resolution is stable.
pub fn plan_tasks(
    mut sources: Vec<PathBuf>,
    source_root: &Path,
    output_root: &Path,
    recursive: bool,
) -> Result<Plan, BatchError> {
    sources.sort();

    let mut plan = Plan::default();
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    for source in sources {
        let destination = destination_for(&source, source_root, output_root, recursive);

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BatchError::OutputDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let reason = if claimed.contains(&destination) {
            Some(SkipReason::DuplicateDestination)
        } else if destination.exists() {
            Some(SkipReason::DestinationExists)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                debug!(
                    source = %source.display(),
                    destination = %destination.display(),
                    ?reason,
                    "Skipping source"
                );
                plan.skipped.push(SkippedSource {
                    source,
                    destination,
                    reason,
                });
            }
            None => {
                claimed.insert(destination.clone());
                plan.tasks.push(ConversionTask {
                    source,
                    destination,
                });
            }
        }
    }

    Ok(plan)
}
