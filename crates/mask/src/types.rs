use image::{GrayImage, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{MaskError, Result};

/// Cell values of a mask as produced by a segmentation backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum MaskData {
    Bool(Vec<bool>),
    Float(Vec<f32>),
}

impl MaskData {
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(values) => values.len(),
            Self::Float(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership of a single cell: `true` for booleans, `> 0` for floats.
    fn is_member(&self, offset: usize) -> bool {
        match self {
            Self::Bool(values) => values[offset],
            Self::Float(values) => values[offset] > 0.0,
        }
    }
}

/// A mask exactly as returned by the backend: a row-major n-dimensional grid
/// that may still carry singleton batch/channel axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawMask {
    pub shape: Vec<usize>,
    pub data: MaskData,
}

impl RawMask {
    pub fn new(shape: Vec<usize>, data: MaskData) -> Self {
        Self { shape, data }
    }

    pub fn from_bools(height: usize, width: usize, values: Vec<bool>) -> Self {
        Self::new(vec![height, width], MaskData::Bool(values))
    }

    pub fn from_floats(shape: Vec<usize>, values: Vec<f32>) -> Self {
        Self::new(shape, MaskData::Float(values))
    }

    /// Build a boolean H×W mask from a per-pixel predicate.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut values = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self::from_bools(height as usize, width as usize, values)
    }

    /// Shape with leading and trailing singleton axes removed, never below rank 2.
    pub fn squeezed_shape(&self) -> Vec<usize> {
        let mut dims: &[usize] = &self.shape;
        while dims.len() > 2 && dims[0] == 1 {
            dims = &dims[1..];
        }
        while dims.len() > 2 && dims[dims.len() - 1] == 1 {
            dims = &dims[..dims.len() - 1];
        }
        dims.to_vec()
    }

    /// Squeeze and normalize to a boolean 2-D mask.
    ///
    /// `index` is only used to label the error.
    pub fn to_mask(&self, index: usize) -> Result<Mask> {
        let invalid = |reason: String| MaskError::InvalidMaskShape {
            index,
            shape: self.shape.clone(),
            reason,
        };

        let squeezed = self.squeezed_shape();
        if squeezed.len() != 2 {
            return Err(invalid(format!(
                "expected 2 dimensions after squeezing, got {}",
                squeezed.len()
            )));
        }

        let (height, width) = (squeezed[0], squeezed[1]);
        let expected = height
            .checked_mul(width)
            .ok_or_else(|| invalid("dimensions overflow".to_string()))?;
        if self.data.len() != expected {
            return Err(invalid(format!(
                "{} values do not fill a {}x{} grid",
                self.data.len(),
                height,
                width
            )));
        }

        let width = u32::try_from(width).map_err(|_| invalid("width too large".to_string()))?;
        let height = u32::try_from(height).map_err(|_| invalid("height too large".to_string()))?;

        Ok(Mask {
            width,
            height,
            bits: (0..expected).map(|i| self.data.is_member(i)).collect(),
        })
    }
}

/// A validated two-dimensional boolean mask, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.bits[y as usize * self.width as usize + x as usize]
    }

    /// Number of member pixels
    pub fn area(&self) -> usize {
        self.bits.iter().filter(|&&bit| bit).count()
    }

    /// Single-channel rendering: members are 255, background 0.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.contains(x, y) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }
}

/// Output of one `infer` call: masks plus their confidences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentationResult {
    pub masks: Vec<RawMask>,
    /// Best-effort, one per mask when the backend provides them.
    #[serde(default)]
    pub scores: Vec<f32>,
}

impl SegmentationResult {
    pub fn new(masks: Vec<RawMask>, scores: Vec<f32>) -> Self {
        Self { masks, scores }
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}
