use std::path::PathBuf;

use crate::{
    error::{MaskError, Result},
    io::OutputLayout,
    pipeline::BatchRunner,
    traits::SegmentationPort,
};

pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Builder for configuring a [`BatchRunner`] with a fluent API
pub struct BatchRunnerBuilder<S: SegmentationPort> {
    segmenter: S,
    prompt: Option<String>,
    results_dir: PathBuf,
    save_individual_masks: bool,
}

impl<S: SegmentationPort> BatchRunnerBuilder<S> {
    pub fn new(segmenter: S) -> Self {
        Self {
            segmenter,
            prompt: None,
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            save_individual_masks: false,
        }
    }

    /// Text prompt sent with every image
    pub fn prompt<T: Into<String>>(mut self, prompt: T) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn results_dir<P: Into<PathBuf>>(mut self, results_dir: P) -> Self {
        self.results_dir = results_dir.into();
        self
    }

    /// Also export every kept mask as a grayscale PNG
    pub fn save_individual_masks(mut self, enabled: bool) -> Self {
        self.save_individual_masks = enabled;
        self
    }

    /// Build the runner. Fails when the prompt is missing or blank.
    pub fn build(self) -> Result<BatchRunner<S>> {
        let prompt = self
            .prompt
            .map(|prompt| prompt.trim().to_string())
            .filter(|prompt| !prompt.is_empty())
            .ok_or(MaskError::EmptyPrompt)?;

        Ok(BatchRunner::new(
            self.segmenter,
            prompt,
            OutputLayout::new(self.results_dir),
            self.save_individual_masks,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SegmentationResult;
    use image::RgbImage;

    struct NoopSegmenter;

    impl SegmentationPort for NoopSegmenter {
        fn infer(&self, _image: &RgbImage, _prompt: &str) -> Result<SegmentationResult> {
            Ok(SegmentationResult::default())
        }
    }

    #[test]
    fn test_blank_prompt_is_rejected() {
        assert!(matches!(
            BatchRunnerBuilder::new(NoopSegmenter).prompt("  \n\t").build(),
            Err(MaskError::EmptyPrompt)
        ));
        assert!(matches!(
            BatchRunnerBuilder::new(NoopSegmenter).build(),
            Err(MaskError::EmptyPrompt)
        ));
    }

    #[test]
    fn test_defaults() {
        let runner = BatchRunnerBuilder::new(NoopSegmenter)
            .prompt("  dog ")
            .build()
            .unwrap();
        assert_eq!(runner.prompt(), "dog");
        assert_eq!(runner.layout().results_dir(), std::path::Path::new(DEFAULT_RESULTS_DIR));
    }
}
