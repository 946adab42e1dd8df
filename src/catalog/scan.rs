use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Lists photo filenames directly inside `dir`, sorted by name.
///
/// A missing directory yields an empty listing.
pub fn scan_photo_dir(dir: &Path) -> Vec<String> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "photo directory not found");
        return Vec::new();
    }

    let mut filenames = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(filename) = entry.file_name().to_str() else {
            warn!(path = %entry.path().display(), "skipping photo with non UTF-8 name");
            continue;
        };

        if has_extension(filename, PHOTO_EXTENSIONS) {
            filenames.push(filename.to_string());
        }
    }

    filenames.sort();
    filenames
}

/// Case-insensitive extension check.
pub fn has_extension(filename: &str, extensions: &[&str]) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}
