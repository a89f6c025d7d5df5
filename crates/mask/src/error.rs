use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaskError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("No supported images found in {}", path.display())]
    NoImagesFound { path: PathBuf },

    #[error("A non-empty prompt is required")]
    EmptyPrompt,

    #[error("Mask #{index} has unexpected shape {shape:?}: {reason}")]
    InvalidMaskShape {
        index: usize,
        shape: Vec<usize>,
        reason: String,
    },

    #[error("Segmentation backend error: {0}")]
    Segmentation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MaskError>;
