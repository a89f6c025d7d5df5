use tracing::warn;

use crate::{
    error::MaskError,
    types::{Mask, RawMask},
};

/// A mask that passed shape validation, tagged with its original 0-based
/// position in the mask set.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMask {
    pub index: usize,
    pub mask: Mask,
}

/// Result of squeezing and checking a whole mask set
#[derive(Debug, Default)]
pub struct ValidatedMasks {
    pub kept: Vec<ValidMask>,
    pub rejected: Vec<MaskError>,
}

impl ValidatedMasks {
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

/// Squeeze every mask to 2-D and drop the ones that cannot be used.
///
/// When `frame` is given as `(width, height)`, masks of any other size are
/// rejected too. Rejections never shift the index of later masks.
pub fn validate_masks(masks: &[RawMask], frame: Option<(u32, u32)>) -> ValidatedMasks {
    let mut validated = ValidatedMasks::default();

    for (index, raw) in masks.iter().enumerate() {
        let checked = raw.to_mask(index).and_then(|mask| match frame {
            Some((width, height)) if mask.dimensions() != (width, height) => {
                Err(MaskError::InvalidMaskShape {
                    index,
                    shape: raw.shape.clone(),
                    reason: format!(
                        "mask is {}x{} but image is {}x{}",
                        mask.width(),
                        mask.height(),
                        width,
                        height
                    ),
                })
            }
            _ => Ok(mask),
        });

        match checked {
            Ok(mask) => validated.kept.push(ValidMask { index, mask }),
            Err(err) => {
                warn!("Skipping mask: {}", err);
                validated.rejected.push(err);
            }
        }
    }

    validated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_keep_original_indices() {
        let masks = vec![
            RawMask::from_fn(2, 2, |_, _| true),
            RawMask::from_floats(vec![2, 2, 2], vec![1.0; 8]),
            RawMask::from_fn(2, 2, |x, _| x == 0),
        ];

        let validated = validate_masks(&masks, Some((2, 2)));
        let indices: Vec<usize> = validated.kept.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(validated.rejected.len(), 1);
    }

    #[test]
    fn test_frame_mismatch_is_rejected() {
        let masks = vec![RawMask::from_fn(3, 2, |_, _| true)];
        let validated = validate_masks(&masks, Some((2, 3)));
        assert!(validated.is_empty());
        assert!(matches!(
            validated.rejected[0],
            MaskError::InvalidMaskShape { index: 0, .. }
        ));

        let unchecked = validate_masks(&masks, None);
        assert_eq!(unchecked.kept.len(), 1);
    }
}
