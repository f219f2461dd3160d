//! Shared utilities for the heic-jpeg converter
//!
//! Helpers that are not specific to one image format:
//! - File discovery for batch runs
//! - Timestamp / permission carry-over
//! - Safety checks (dangerous directory detection)
//! - Progress bar and summary reporting
//! - Logging setup

pub mod batch;
pub mod common_utils;
pub mod logging;
pub mod metadata;
pub mod progress;
pub mod report;
pub mod safety;

pub use batch::{collect_files, DiscoveryError};
pub use metadata::{copy_file_timestamps, copy_permissions};
pub use progress::{format_duration, BatchProgressBar};
pub use report::{print_summary_report, render_summary_report, SummaryReport};
pub use safety::{check_dangerous_directory, UnsafeTarget};
