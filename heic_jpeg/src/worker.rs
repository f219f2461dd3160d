//! Single-file conversion: decode, optional resize, JPEG encode with EXIF,
//! atomic write, timestamp carry-over.
//!
//! Errors never leave this module as errors: [`convert_single_file`] turns
//! every failure, including a panic, into a failed [`ConversionOutcome`].

use crate::config::ResizeDimensions;
use crate::error::{ConvertError, Result};
use crate::exif;
use crate::formats::{decode_source, SourceFormat};
use crate::planner::ConversionTask;
use crate::result::ConversionOutcome;
use image::imageops::FilterType;
use image::DynamicImage;
use jpeg_encoder::{ColorType, Encoder};
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Per-batch encoding parameters shared by every task.
#[derive(Debug, Clone, Copy)]
pub struct EncodeSettings {
    pub quality: u8,
    pub resize: Option<ResizeDimensions>,
    pub source_format: SourceFormat,
}

pub fn convert_single_file(task: &ConversionTask, settings: EncodeSettings) -> ConversionOutcome {
    let start = Instant::now();
    let result = catch_unwind(AssertUnwindSafe(|| transcode(task, settings)))
        .unwrap_or_else(|payload| Err(ConvertError::Panicked(panic_message(payload.as_ref()))));
    let elapsed = start.elapsed();

    match result {
        Ok(()) => {
            debug!(
                source = %task.source.display(),
                destination = %task.destination.display(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Converted"
            );
            ConversionOutcome::converted(task.source.clone(), elapsed)
        }
        Err(e) => {
            warn!(source = %task.source.display(), error = %e, "Conversion failed");
            ConversionOutcome::failed(task.source.clone(), e.to_string(), elapsed)
        }
    }
}

fn transcode(task: &ConversionTask, settings: EncodeSettings) -> Result<()> {
    let decoded = decode_source(&task.source, settings.source_format)?;

    let image = match settings.resize {
        Some(dims) => resize_exact(&decoded.image, dims),
        None => decoded.image,
    };

    let app1 = decoded.exif.as_deref().and_then(|tiff| {
        let payload = exif::app1_payload(tiff);
        if payload.is_none() {
            warn!(
                source = %task.source.display(),
                exif_bytes = tiff.len(),
                "EXIF block too large for a single APP1 segment, dropped"
            );
        }
        payload
    });
    let jpeg = encode_jpeg(&image, settings.quality, app1.as_deref())?;

    write_atomically(&task.destination, &jpeg)?;
    carry_file_metadata(&task.source, &task.destination)
}

/// Stretches to exactly `dims`; aspect ratio is intentionally not preserved.
pub fn resize_exact(image: &DynamicImage, dims: ResizeDimensions) -> DynamicImage {
    image.resize_exact(dims.width, dims.height, FilterType::Lanczos3)
}

/// Baseline JPEG of `image` at `quality` (1-100) with Huffman tables optimized
/// for this image. Alpha is discarded. `app1` is written unchanged as the APP1
/// segment.
pub fn encode_jpeg(image: &DynamicImage, quality: u8, app1: Option<&[u8]>) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let too_large = || ConvertError::DimensionsTooLarge {
        width: rgb.width(),
        height: rgb.height(),
    };
    let width = u16::try_from(rgb.width()).map_err(|_| too_large())?;
    let height = u16::try_from(rgb.height()).map_err(|_| too_large())?;

    let mut buf = Vec::new();
    let mut encoder = Encoder::new(&mut buf, quality);
    encoder.set_optimized_huffman_tables(true);
    if let Some(payload) = app1 {
        encoder.add_app_segment(exif::EXIF_APP_SEGMENT, payload)?;
    }
    encoder.encode(rgb.as_raw(), width, height, ColorType::Rgb)?;
    Ok(buf)
}

/// Copies permissions and timestamps of `source` onto the freshly written
/// `destination`. When the timestamps cannot be applied the destination is
/// removed again, so a failed task never leaves an output that a later run
/// would skip.
fn carry_file_metadata(source: &Path, destination: &Path) -> Result<()> {
    shared_utils::copy_permissions(source, destination);
    let Err(err) = shared_utils::copy_file_timestamps(source, destination) else {
        return Ok(());
    };
    if let Err(e) = std::fs::remove_file(destination) {
        warn!(path = %destination.display(), error = %e, "Failed to remove incomplete output");
    }
    Err(ConvertError::Timestamps {
        path: destination.to_path_buf(),
        source: err,
    })
}

/// Writes through a temp file in the destination directory and renames it into
/// place, so an interrupted task never leaves a truncated JPEG behind. Refuses
/// to replace a destination that appeared after planning.
fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| ConvertError::Write {
        path: destination.to_path_buf(),
        source,
    };
    let dir = destination.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix(".heic-jpeg-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist_noclobber(destination)
        .map_err(|e| write_err(e.error))?;
    Ok(())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
