use std::path::{Path, PathBuf};

use crate::error::{MaskError, Result};

/// Extensions accepted as input images, compared case-insensitively
pub const VALID_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VALID_EXTENSIONS.iter().any(|valid| ext.eq_ignore_ascii_case(valid)))
        .unwrap_or(false)
}

/// List the supported images directly inside `dir`, sorted by file name.
pub fn collect_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(MaskError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_supported_image(&path) {
            images.push(path);
        }
    }

    if images.is_empty() {
        return Err(MaskError::NoImagesFound {
            path: dir.to_path_buf(),
        });
    }

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}
