//! Batch conversion of legacy JPEG photos to PNG.

use crate::catalog::scan::has_extension;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Composite transparent pixels onto white instead of keeping alpha.
    pub flatten_alpha: bool,
    pub keep_originals: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub converted: usize,
    pub failed: usize,
    /// Converted files whose JPEG original could not be deleted.
    pub removal_failures: usize,
    pub png_total: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("image directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to convert {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Converts every JPEG directly inside `dir` to a PNG next to it.
///
/// Failures on individual files are counted and logged; only a missing
/// directory aborts the run.
pub fn convert_directory(
    dir: &Path,
    options: ConvertOptions,
) -> Result<ConversionSummary, ConvertError> {
    if !dir.is_dir() {
        return Err(ConvertError::DirectoryNotFound(dir.to_path_buf()));
    }

    let jpegs = list_files(dir, JPEG_EXTENSIONS);
    info!(dir = %dir.display(), count = jpegs.len(), "converting JPEG files to PNG");

    let mut summary = ConversionSummary::default();
    for source in jpegs {
        let target = source.with_extension("png");
        if let Err(err) = convert_to_png(&source, &target, options.flatten_alpha) {
            warn!(error = %err, "conversion failed");
            summary.failed += 1;
            continue;
        }
        summary.converted += 1;
        info!(from = %source.display(), to = %target.display(), "converted");

        if options.keep_originals {
            continue;
        }
        if let Err(err) = fs::remove_file(&source) {
            warn!(path = %source.display(), error = %err, "converted but failed to remove original");
            summary.removal_failures += 1;
        }
    }

    summary.png_total = list_files(dir, &["png"]).len();
    info!(
        converted = summary.converted,
        failed = summary.failed,
        png_total = summary.png_total,
        "conversion complete"
    );
    Ok(summary)
}

/// Decodes `source` and writes it to `target` as PNG.
pub fn convert_to_png(source: &Path, target: &Path, flatten_alpha: bool) -> Result<(), ConvertError> {
    let image = ImageReader::open(source)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| ConvertError::Io {
            path: source.to_path_buf(),
            source: err,
        })?
        .decode()
        .map_err(|err| ConvertError::Image {
            path: source.to_path_buf(),
            source: err,
        })?;

    let has_alpha = image.color().has_alpha();
    let output = if has_alpha && flatten_alpha {
        DynamicImage::ImageRgb8(flatten_onto_white(&image))
    } else if has_alpha {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };

    output
        .save_with_format(target, ImageFormat::Png)
        .map_err(|err| ConvertError::Image {
            path: target.to_path_buf(),
            source: err,
        })
}

fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let blend = |channel: u8| ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8;
        flattened.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }

    flattened
}

fn list_files(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| has_extension(name, extensions))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}
