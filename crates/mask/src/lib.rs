//! # Mask Compositing Library
//!
//! Turns per-image segmentation masks into reviewable artifacts: a colored,
//! alpha-blended visualization per image and, optionally, one binary PNG per
//! mask. A batch runner drives any [`SegmentationPort`] over a directory of
//! images and isolates failures per image.
//!
//! ## Core Features
//!
//! - **Port-based backends**: implement [`SegmentationPort`] for any model runtime
//! - **Deterministic colors**: fixed cyclic palette keyed by mask index
//! - **Shape validation**: masks are squeezed to 2-D; unusable ones are skipped, never fatal
//! - **Batch isolation**: every image gets its own [`ItemReport`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mask::{BatchRunner, Result, SegmentationPort, SegmentationResult, RawMask};
//! use image::RgbImage;
//!
//! struct Everything;
//!
//! impl SegmentationPort for Everything {
//!     fn infer(&self, image: &RgbImage, _prompt: &str) -> Result<SegmentationResult> {
//!         let (w, h) = image.dimensions();
//!         Ok(SegmentationResult::new(vec![RawMask::from_fn(w, h, |_, _| true)], vec![1.0]))
//!     }
//! }
//!
//! let runner = BatchRunner::builder(Everything)
//!     .prompt("truck")
//!     .results_dir("results")
//!     .save_individual_masks(true)
//!     .build()?;
//!
//! let report = runner.run_directory("image")?;
//! println!("{} of {} images processed", report.succeeded(), report.len());
//! # Ok::<(), mask::MaskError>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod palette;
pub mod algorithms;
pub mod pipeline;
pub mod io;

// Re-exports for convenience
pub use error::{MaskError, Result};
pub use types::{Mask, MaskData, RawMask, SegmentationResult};
pub use traits::*;
pub use palette::{color_for, palette_size, MASK_PALETTE};
pub use algorithms::*;
pub use pipeline::{
    builder::BatchRunnerBuilder, BatchReport, BatchRunner, ItemOutcome, ItemReport, ItemStage,
};
pub use io::*;
