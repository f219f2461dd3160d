//! Batch conversion of HEIC/HEIF (and other raster formats) to JPEG.
//!
//! Pipeline: discovery → planning → bounded worker pool → aggregated
//! [`BatchResult`]. EXIF blocks and file timestamps are carried over, outputs
//! are written atomically, and re-runs skip files that were already converted.
//!
//! ```no_run
//! use heic_jpeg::{run_batch_with, BatchConfiguration, CancellationToken, ProgressUpdate};
//!
//! let config = BatchConfiguration::new("/photos/iphone").with_workers(8);
//! let result = run_batch_with(
//!     &config,
//!     &|u: &ProgressUpdate| println!("[{}%] {}", u.percent, u.current_file),
//!     &CancellationToken::new(),
//! );
//! println!("{} converted, {} failed", result.files_converted, result.files_failed);
//! ```

pub mod config;
pub mod error;
pub mod exif;
pub mod formats;
pub mod orchestrator;
pub mod planner;
pub mod progress;
pub mod rename;
pub mod result;
pub mod worker;

pub use config::{BatchConfiguration, ResizeDimensions, DEFAULT_OUTPUT_SUBDIR};
pub use error::{BatchError, ConfigError, ConvertError};
pub use formats::{ensure_decoders_registered, SourceFormat};
pub use orchestrator::{run_batch, run_batch_with};
pub use planner::{ConversionTask, Plan, SkipReason};
pub use progress::{CancellationToken, NoProgress, ProgressObserver, ProgressUpdate};
pub use rename::{rename_by_capture_date, RenameReport};
pub use result::{BatchResult, BatchStatus, ConversionOutcome, OutcomeStatus};
