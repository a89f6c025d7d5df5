pub mod builder;

use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::{
    algorithms::{composite_masks, render_masks, validate_masks, ValidMask},
    error::Result,
    io::{collect_images, OutputArtifact, OutputLayout},
    traits::SegmentationPort,
};

/// Lifecycle of a single batch item. Skips keep the last stage reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemStage {
    Pending,
    Loaded,
    Inferred,
    Composited,
    Done,
}

/// How processing of one image ended
#[derive(Debug, Clone, PartialEq, Serialize, IntoStaticStr)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemOutcome {
    Done {
        mask_count: usize,
        scores: Vec<f32>,
        rejected_masks: usize,
        artifacts: Vec<OutputArtifact>,
    },
    SkippedLoadFailure {
        reason: String,
    },
    SkippedInferenceFailure {
        reason: String,
    },
    SkippedNoMasks {
        scores: Vec<f32>,
    },
    SkippedNoValidMasks {
        mask_count: usize,
        scores: Vec<f32>,
    },
    SkippedWriteFailure {
        reason: String,
        artifacts: Vec<OutputArtifact>,
    },
}

impl ItemOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    pub fn artifacts(&self) -> &[OutputArtifact] {
        match self {
            Self::Done { artifacts, .. } | Self::SkippedWriteFailure { artifacts, .. } => artifacts,
            _ => &[],
        }
    }
}

/// Per-image record kept in the batch report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    /// Source file, `None` for images handed over in memory
    pub path: Option<PathBuf>,
    pub stem: String,
    pub stage: ItemStage,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.outcome.is_done()).count()
    }

    pub fn skipped(&self) -> usize {
        self.len() - self.succeeded()
    }
}

/// One image travelling through the runner
struct BatchItem {
    path: Option<PathBuf>,
    stem: String,
    stage: ItemStage,
}

impl BatchItem {
    fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Self {
            path: Some(path.to_path_buf()),
            stem,
            stage: ItemStage::Pending,
        }
    }

    fn in_memory(stem: &str) -> Self {
        Self {
            path: None,
            stem: stem.to_string(),
            stage: ItemStage::Pending,
        }
    }

    fn advance(&mut self, stage: ItemStage) {
        debug!("{}: {} -> {}", self, self.stage, stage);
        self.stage = stage;
    }

    fn finish(self, outcome: ItemOutcome) -> ItemReport {
        ItemReport {
            path: self.path,
            stem: self.stem,
            stage: self.stage,
            outcome,
        }
    }
}

impl fmt::Display for BatchItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}", path.display()),
            None => write!(f, "{}", self.stem),
        }
    }
}

/// Runs segmentation and compositing over images one at a time.
///
/// Every item is isolated: a failure is recorded in its [`ItemReport`] and the
/// runner moves on to the next image.
pub struct BatchRunner<S: SegmentationPort> {
    segmenter: S,
    prompt: String,
    layout: OutputLayout,
    save_individual_masks: bool,
}

impl<S: SegmentationPort> BatchRunner<S> {
    /// Create a new runner builder around a segmentation backend
    pub fn builder(segmenter: S) -> builder::BatchRunnerBuilder<S> {
        builder::BatchRunnerBuilder::new(segmenter)
    }

    pub(crate) fn new(
        segmenter: S,
        prompt: String,
        layout: OutputLayout,
        save_individual_masks: bool,
    ) -> Self {
        Self {
            segmenter,
            prompt,
            layout,
            save_individual_masks,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Collect the images in `dir` and process them.
    ///
    /// Only collection errors are returned; per-image failures end up in the report.
    pub fn run_directory<P: AsRef<Path>>(&self, dir: P) -> Result<BatchReport> {
        let dir = dir.as_ref();
        let image_paths = collect_images(dir)?;
        info!(
            "Processing {} image(s) from {} with prompt '{}'.",
            image_paths.len(),
            dir.display(),
            self.prompt
        );
        Ok(self.run(&image_paths))
    }

    /// Process every path in order. Never fails as a whole.
    pub fn run(&self, image_paths: &[PathBuf]) -> BatchReport {
        let items = image_paths
            .iter()
            .map(|path| self.process_path(path))
            .collect();
        BatchReport { items }
    }

    pub fn process_path(&self, path: &Path) -> ItemReport {
        let mut item = BatchItem::from_path(path);
        info!("Processing {}...", item);

        let image = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(err) => {
                warn!("Failed to load image {}: {}", item, err);
                return item.finish(ItemOutcome::SkippedLoadFailure {
                    reason: err.to_string(),
                });
            }
        };
        item.advance(ItemStage::Loaded);

        let outcome = self.process_loaded(&mut item, &image);
        item.finish(outcome)
    }

    /// Process an image that is already decoded, e.g. one fetched over the network.
    pub fn process_image(&self, image: &RgbImage, stem: &str) -> ItemReport {
        let mut item = BatchItem::in_memory(stem);
        info!("Processing {}...", item);
        item.advance(ItemStage::Loaded);

        let outcome = self.process_loaded(&mut item, image);
        item.finish(outcome)
    }

    fn process_loaded(&self, item: &mut BatchItem, image: &RgbImage) -> ItemOutcome {
        let result = match self.segmenter.infer(image, &self.prompt) {
            Ok(result) => result,
            Err(err) => {
                warn!("Segmentation failed for {}: {}", item, err);
                return ItemOutcome::SkippedInferenceFailure {
                    reason: err.to_string(),
                };
            }
        };
        item.advance(ItemStage::Inferred);

        let mask_count = result.masks.len();
        info!("Found {} mask(s). Scores: {:?}", mask_count, result.scores);

        if mask_count == 0 {
            info!("No masks found to visualize.");
            return ItemOutcome::SkippedNoMasks {
                scores: result.scores,
            };
        }

        let validated = validate_masks(&result.masks, Some(image.dimensions()));
        if validated.is_empty() {
            warn!("None of the {} mask(s) for {} could be used", mask_count, item);
            return ItemOutcome::SkippedNoValidMasks {
                mask_count,
                scores: result.scores,
            };
        }

        let visualization = composite_masks(image, &validated.kept);
        item.advance(ItemStage::Composited);

        let mut artifacts = Vec::new();
        if let Err(err) = self.write_artifacts(&item.stem, &visualization, &validated.kept, &mut artifacts) {
            warn!("Failed to write outputs for {}: {}", item, err);
            return ItemOutcome::SkippedWriteFailure {
                reason: err.to_string(),
                artifacts,
            };
        }
        item.advance(ItemStage::Done);

        info!(
            "Saved visualization (covering {} mask(s)) for {}",
            validated.kept.len(),
            item
        );

        ItemOutcome::Done {
            mask_count,
            scores: result.scores,
            rejected_masks: validated.rejected.len(),
            artifacts,
        }
    }

    fn write_artifacts(
        &self,
        stem: &str,
        visualization: &RgbImage,
        kept: &[ValidMask],
        artifacts: &mut Vec<OutputArtifact>,
    ) -> Result<()> {
        artifacts.push(self.layout.save_visualization(stem, visualization)?);

        if self.save_individual_masks {
            for mask in render_masks(kept) {
                artifacts.push(self.layout.save_mask(stem, &mask)?);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MaskError;
    use crate::types::{RawMask, SegmentationResult};
    use image::Rgb;

    struct FixedSegmenter(SegmentationResult);

    impl SegmentationPort for FixedSegmenter {
        fn infer(&self, _image: &RgbImage, _prompt: &str) -> Result<SegmentationResult> {
            Ok(self.0.clone())
        }
    }

    struct FailingSegmenter;

    impl SegmentationPort for FailingSegmenter {
        fn infer(&self, _image: &RgbImage, _prompt: &str) -> Result<SegmentationResult> {
            Err(MaskError::Segmentation("worker crashed".to_string()))
        }
    }

    fn image() -> RgbImage {
        RgbImage::from_pixel(4, 3, Rgb([40, 80, 120]))
    }

    #[test]
    fn test_stage_display_names() {
        assert_eq!(ItemStage::Pending.to_string(), "pending");
        assert_eq!(ItemStage::Composited.to_string(), "composited");
    }

    #[test]
    fn test_no_masks_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::builder(FixedSegmenter(SegmentationResult::default()))
            .prompt("cat")
            .results_dir(dir.path())
            .build()
            .unwrap();

        let report = runner.process_image(&image(), "empty");
        assert_eq!(report.stage, ItemStage::Inferred);
        assert!(matches!(report.outcome, ItemOutcome::SkippedNoMasks { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_only_invalid_masks_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let result = SegmentationResult::new(
            vec![RawMask::from_floats(vec![2, 2, 2], vec![1.0; 8])],
            vec![0.4],
        );
        let runner = BatchRunner::builder(FixedSegmenter(result))
            .prompt("cat")
            .results_dir(dir.path())
            .build()
            .unwrap();

        let report = runner.process_image(&image(), "bad");
        assert_eq!(
            report.outcome,
            ItemOutcome::SkippedNoValidMasks {
                mask_count: 1,
                scores: vec![0.4]
            }
        );
        assert!(!runner.layout().visualization_path("bad").exists());
    }

    #[test]
    fn test_inference_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::builder(FailingSegmenter)
            .prompt("cat")
            .results_dir(dir.path())
            .build()
            .unwrap();

        let report = runner.process_image(&image(), "x");
        assert_eq!(report.stage, ItemStage::Loaded);
        match report.outcome {
            ItemOutcome::SkippedInferenceFailure { reason } => assert!(reason.contains("worker crashed")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_done_reports_scores_and_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let result = SegmentationResult::new(
            vec![
                RawMask::from_fn(4, 3, |x, _| x < 2),
                RawMask::from_fn(5, 5, |_, _| true),
                RawMask::from_fn(4, 3, |x, _| x >= 2),
            ],
            vec![0.9, 0.5, 0.7],
        );
        let runner = BatchRunner::builder(FixedSegmenter(result))
            .prompt("cat")
            .results_dir(dir.path())
            .save_individual_masks(true)
            .build()
            .unwrap();

        let report = runner.process_image(&image(), "pet");
        assert_eq!(report.stage, ItemStage::Done);
        let ItemOutcome::Done {
            mask_count,
            scores,
            rejected_masks,
            artifacts,
        } = report.outcome
        else {
            panic!("expected a finished item");
        };
        assert_eq!(mask_count, 3);
        assert_eq!(scores, vec![0.9, 0.5, 0.7]);
        assert_eq!(rejected_masks, 1);

        let names: Vec<String> = artifacts
            .iter()
            .map(|a| a.path().file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["pet_result.jpg", "pet_mask_01.png", "pet_mask_03.png"]);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = SegmentationResult::new(vec![RawMask::from_fn(4, 3, |_, _| true)], vec![]);
        let runner = BatchRunner::builder(FixedSegmenter(result))
            .prompt("cat")
            .results_dir(&blocker)
            .build()
            .unwrap();

        let report = runner.process_image(&image(), "x");
        assert_eq!(report.stage, ItemStage::Composited);
        assert!(matches!(report.outcome, ItemOutcome::SkippedWriteFailure { .. }));
    }
}
