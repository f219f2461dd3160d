//! Source formats and their decoders.
//!
//! HEIF/HEIC goes through libheif (`heif` feature); the remaining formats are
//! decoded by the `image` crate. Either way the result is a [`DecodedSource`]
//! carrying the pixels plus the raw EXIF (TIFF) block when the file has one.

use crate::error::{ConfigError, ConvertError, Result};
use crate::exif;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Once;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceFormat {
    #[default]
    Heif,
    Png,
    Tiff,
    Webp,
    Bmp,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 5] = [
        SourceFormat::Heif,
        SourceFormat::Png,
        SourceFormat::Tiff,
        SourceFormat::Webp,
        SourceFormat::Bmp,
    ];

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            SourceFormat::Heif => &["heic", "heif", "hif"],
            SourceFormat::Png => &["png"],
            SourceFormat::Tiff => &["tif", "tiff"],
            SourceFormat::Webp => &["webp"],
            SourceFormat::Bmp => &["bmp"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Heif => "heif",
            SourceFormat::Png => "png",
            SourceFormat::Tiff => "tiff",
            SourceFormat::Webp => "webp",
            SourceFormat::Bmp => "bmp",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        SourceFormat::ALL
            .into_iter()
            .find(|f| f.name() == lower || f.extensions().contains(&lower.as_str()))
            .ok_or_else(|| ConfigError::UnknownFormat(s.to_string()))
    }
}

pub struct DecodedSource {
    pub image: DynamicImage,
    /// Raw TIFF-structured EXIF payload, without any container prefix.
    pub exif: Option<Vec<u8>>,
}

static DECODERS: Once = Once::new();

/// One-time, process-wide decoder setup. Safe to call from any number of
/// threads or batches; only the first call does any work.
pub fn ensure_decoders_registered() {
    DECODERS.call_once(|| {
        #[cfg(feature = "heif")]
        {
            // Keep libheif initialised for the whole process so per-file
            // handles don't reload its plugins each time.
            std::mem::forget(libheif_rs::LibHeif::new());
        }
        tracing::debug!(
            heif = cfg!(feature = "heif"),
            "Image decoders registered"
        );
    });
}

pub fn decode_source(path: &Path, format: SourceFormat) -> Result<DecodedSource> {
    if !path.is_file() {
        return Err(ConvertError::UnreadableSource {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }
    match format {
        SourceFormat::Heif => decode_heif(path),
        _ => decode_with_image(path),
    }
}

fn decode_with_image(path: &Path) -> Result<DecodedSource> {
    let unreadable = |reason: String| ConvertError::UnreadableSource {
        path: path.to_path_buf(),
        reason,
    };

    let mut decoder = ImageReader::open(path)
        .map_err(|e| unreadable(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| unreadable(e.to_string()))?
        .into_decoder()
        .map_err(|e| unreadable(e.to_string()))?;

    let exif = match decoder.exif_metadata() {
        Ok(block) => block.and_then(|raw| exif::normalize_tiff_block(&raw)),
        Err(e) => {
            tracing::debug!(source = %path.display(), error = %e, "No readable EXIF block");
            None
        }
    };

    let image = DynamicImage::from_decoder(decoder).map_err(|e| ConvertError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(DecodedSource { image, exif })
}

#[cfg(feature = "heif")]
fn decode_heif(path: &Path) -> Result<DecodedSource> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    ensure_decoders_registered();
    let lib_heif = LibHeif::new();

    let ctx = HeifContext::read_from_file(path.to_string_lossy().as_ref()).map_err(|e| {
        ConvertError::UnreadableSource {
            path: path.to_path_buf(),
            reason: format!("Failed to read HEIF container: {}", e),
        }
    })?;

    let decode_err = |reason: String| ConvertError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let handle = ctx
        .primary_image_handle()
        .map_err(|e| decode_err(format!("Failed to get primary image: {}", e)))?;

    let exif = handle
        .metadata_block_ids(b"Exif".into())
        .into_iter()
        .find_map(|id| handle.metadata(id).ok())
        .and_then(|raw| exif::tiff_from_heif_exif(&raw));

    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| decode_err(format!("Failed to decode HEIF: {}", e)))?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| decode_err("No interleaved RGB plane".to_string()))?;

    let width = plane.width;
    let height = plane.height;
    let row_bytes = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        let row = row
            .get(..row_bytes)
            .ok_or_else(|| decode_err("Truncated RGB plane".to_string()))?;
        pixels.extend_from_slice(row);
    }

    let image = image::RgbImage::from_raw(width, height, pixels)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| decode_err("Plane size does not match image dimensions".to_string()))?;

    Ok(DecodedSource { image, exif })
}

#[cfg(not(feature = "heif"))]
fn decode_heif(path: &Path) -> Result<DecodedSource> {
    Err(ConvertError::UnreadableSource {
        path: path.to_path_buf(),
        reason: "HEIF support not compiled in (enable the `heif` feature)".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_format() {
        assert_eq!("heic".parse::<SourceFormat>().unwrap(), SourceFormat::Heif);
        assert_eq!("HEIF".parse::<SourceFormat>().unwrap(), SourceFormat::Heif);
        assert_eq!("tif".parse::<SourceFormat>().unwrap(), SourceFormat::Tiff);
        assert_eq!("png".parse::<SourceFormat>().unwrap(), SourceFormat::Png);
        assert!("gif".parse::<SourceFormat>().is_err());
    }

    #[test]
    fn test_heif_extensions() {
        let exts = SourceFormat::Heif.extensions();
        assert!(exts.contains(&"heic"));
        assert!(exts.contains(&"heif"));
    }

    #[test]
    fn test_decode_missing_file_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let err = decode_source(&temp.path().join("gone.png"), SourceFormat::Png)
            .err()
            .unwrap();
        assert!(matches!(err, ConvertError::UnreadableSource { .. }));
    }

    #[test]
    fn test_decode_garbage_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fake.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(decode_source(&path, SourceFormat::Png).is_err());
    }

    #[test]
    fn test_decode_png() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("small.png");
        image::RgbImage::from_pixel(8, 4, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let decoded = decode_source(&path, SourceFormat::Png).unwrap();
        assert_eq!(decoded.image.width(), 8);
        assert_eq!(decoded.image.height(), 4);
        assert!(decoded.exif.is_none());
    }

    #[test]
    fn test_ensure_decoders_registered_is_idempotent() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(ensure_decoders_registered))
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        ensure_decoders_registered();
    }
}
