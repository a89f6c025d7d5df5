use image::RgbImage;
use crate::{error::Result, types::SegmentationResult};

/// Trait for prompt-driven segmentation backends
pub trait SegmentationPort: Send + Sync {
    /// Segment everything in `image` matching the text `prompt`
    fn infer(&self, image: &RgbImage, prompt: &str) -> Result<SegmentationResult>;
}

impl<T: SegmentationPort + ?Sized> SegmentationPort for &T {
    fn infer(&self, image: &RgbImage, prompt: &str) -> Result<SegmentationResult> {
        (**self).infer(image, prompt)
    }
}

impl<T: SegmentationPort + ?Sized> SegmentationPort for Box<T> {
    fn infer(&self, image: &RgbImage, prompt: &str) -> Result<SegmentationResult> {
        (**self).infer(image, prompt)
    }
}
