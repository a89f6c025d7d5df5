use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::Serialize;
use tracing::info;

use crate::{algorithms::IndividualMask, error::Result};

/// A file written for one processed image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputArtifact {
    Visualization { path: PathBuf },
    IndividualMask { number: usize, path: PathBuf },
}

impl OutputArtifact {
    pub fn path(&self) -> &Path {
        match self {
            Self::Visualization { path } | Self::IndividualMask { path, .. } => path,
        }
    }
}

/// File naming and writing under a results directory
#[derive(Debug, Clone)]
pub struct OutputLayout {
    results_dir: PathBuf,
}

impl OutputLayout {
    pub fn new<P: Into<PathBuf>>(results_dir: P) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// `{results_dir}/{stem}_result.jpg`
    pub fn visualization_path(&self, stem: &str) -> PathBuf {
        self.results_dir.join(format!("{}_result.jpg", stem))
    }

    /// `{results_dir}/{stem}_mask_{NN}.png`; numbers past 99 simply widen.
    pub fn mask_path(&self, stem: &str, number: usize) -> PathBuf {
        self.results_dir.join(format!("{}_mask_{:02}.png", stem, number))
    }

    pub fn save_visualization(&self, stem: &str, image: &RgbImage) -> Result<OutputArtifact> {
        std::fs::create_dir_all(&self.results_dir)?;
        let path = self.visualization_path(stem);
        image.save(&path)?;
        info!("Saved visualization to {}", path.display());
        Ok(OutputArtifact::Visualization { path })
    }

    pub fn save_mask(&self, stem: &str, mask: &IndividualMask) -> Result<OutputArtifact> {
        std::fs::create_dir_all(&self.results_dir)?;
        let path = self.mask_path(stem, mask.number);
        mask.image.save(&path)?;
        info!("Saved mask #{} to {}", mask.number, path.display());
        Ok(OutputArtifact::IndividualMask {
            number: mask.number,
            path,
        })
    }
}
