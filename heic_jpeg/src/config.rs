//! Batch configuration.

use crate::error::ConfigError;
use crate::formats::SourceFormat;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Subfolder of the source directory used when no output directory is given.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "ConvertedFiles";
pub const DEFAULT_QUALITY: u8 = 90;
pub const DEFAULT_WORKERS: usize = 4;

/// Exact output size in pixels. Aspect ratio of the source is not preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDimensions {
    pub width: u32,
    pub height: u32,
}

impl FromStr for ResizeDimensions {
    type Err = ConfigError;

    /// Parses `WIDTHxHEIGHT`, e.g. `1920x1080` (the `x` may be upper case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidResize(s.to_string());
        let lower = s.trim().to_lowercase();
        let (w, h) = lower.split_once('x').ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for ResizeDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfiguration {
    pub source_directory: PathBuf,
    pub output_directory: Option<PathBuf>,
    pub quality: u8,
    pub worker_count: usize,
    pub recursive: bool,
    pub resize: Option<ResizeDimensions>,
    pub delete_originals: bool,
    pub source_format: SourceFormat,
}

impl BatchConfiguration {
    pub fn new(source_directory: impl Into<PathBuf>) -> Self {
        Self {
            source_directory: source_directory.into(),
            output_directory: None,
            quality: DEFAULT_QUALITY,
            worker_count: DEFAULT_WORKERS,
            recursive: false,
            resize: None,
            delete_originals: false,
            source_format: SourceFormat::default(),
        }
    }

    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(dir.into());
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_resize(mut self, resize: Option<ResizeDimensions>) -> Self {
        self.resize = resize;
        self
    }

    pub fn with_delete_originals(mut self, delete: bool) -> Self {
        self.delete_originals = delete;
        self
    }

    pub fn with_source_format(mut self, format: SourceFormat) -> Self {
        self.source_format = format;
        self
    }

    /// Output root: the configured directory, or `<source>/ConvertedFiles`.
    pub fn resolved_output_directory(&self) -> PathBuf {
        self.output_directory
            .clone()
            .unwrap_or_else(|| self.source_directory.join(DEFAULT_OUTPUT_SUBDIR))
    }

    /// Field-level checks. Existence of the source directory is checked by the
    /// orchestrator so it can be reported as `DirectoryNotFound`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::InvalidQuality(self.quality));
        }
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.delete_originals {
            shared_utils::check_dangerous_directory(&self.source_directory)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BatchConfiguration::new("/photos");
        assert_eq!(config.quality, 90);
        assert_eq!(config.worker_count, 4);
        assert!(!config.recursive);
        assert!(!config.delete_originals);
        assert_eq!(config.source_format, SourceFormat::Heif);
        assert_eq!(
            config.resolved_output_directory(),
            PathBuf::from("/photos/ConvertedFiles")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_output_directory() {
        let config = BatchConfiguration::new("/photos").with_output_directory("/export");
        assert_eq!(config.resolved_output_directory(), PathBuf::from("/export"));
    }

    #[test]
    fn test_validate_quality_bounds() {
        let base = BatchConfiguration::new("/photos");
        assert_eq!(
            base.clone().with_quality(0).validate(),
            Err(ConfigError::InvalidQuality(0))
        );
        assert_eq!(
            base.clone().with_quality(101).validate(),
            Err(ConfigError::InvalidQuality(101))
        );
        assert!(base.clone().with_quality(1).validate().is_ok());
        assert!(base.with_quality(100).validate().is_ok());
    }

    #[test]
    fn test_validate_workers() {
        let config = BatchConfiguration::new("/photos").with_workers(0);
        assert_eq!(config.validate(), Err(ConfigError::NoWorkers));
        assert!(BatchConfiguration::new("/photos")
            .with_workers(500)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_delete_originals_in_system_dir_rejected() {
        let config = BatchConfiguration::new("/usr").with_delete_originals(true);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsafeDeleteTarget(_))
        ));
    }

    #[test]
    fn test_parse_resize() {
        assert_eq!(
            "1920x1080".parse::<ResizeDimensions>().unwrap(),
            ResizeDimensions { width: 1920, height: 1080 }
        );
        assert_eq!(
            " 640X480 ".parse::<ResizeDimensions>().unwrap(),
            ResizeDimensions { width: 640, height: 480 }
        );
        for bad in ["", "1920", "x1080", "1920x", "axb", "0x100", "100x0", "-5x10", "1x2x3"] {
            assert!(bad.parse::<ResizeDimensions>().is_err(), "accepted {:?}", bad);
        }
    }
}
