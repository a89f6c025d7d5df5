use image::{GrayImage, Rgb, RgbImage};

use crate::{
    algorithms::validation::{validate_masks, ValidMask},
    palette::color_for,
    types::RawMask,
};

/// Weight of the colored overlay in the final blend
pub const OVERLAY_ALPHA: f32 = 0.5;

/// A single exported mask with its 1-based number in the original mask set
#[derive(Debug, Clone, PartialEq)]
pub struct IndividualMask {
    pub number: usize,
    pub image: GrayImage,
}

/// Overlay every usable mask on a copy of `image` and blend it with the original.
///
/// Masks that are not 2-D after squeezing, or not the size of the image, are
/// skipped. Colors follow each mask's original index.
pub fn build_visualization(image: &RgbImage, masks: &[RawMask]) -> RgbImage {
    let validated = validate_masks(masks, Some(image.dimensions()));
    composite_masks(image, &validated.kept)
}

/// Binary single-channel image for every usable mask, numbered from 1 by
/// original position.
pub fn build_individual_masks(masks: &[RawMask]) -> Vec<IndividualMask> {
    let validated = validate_masks(masks, None);
    render_masks(&validated.kept)
}

/// Blend already-validated masks onto `image`.
///
/// Later masks overwrite earlier ones where they overlap.
pub fn composite_masks(image: &RgbImage, masks: &[ValidMask]) -> RgbImage {
    let mut overlay = image.clone();

    for valid in masks {
        let color = color_for(valid.index);
        for (x, y, pixel) in overlay.enumerate_pixels_mut() {
            if valid.mask.contains(x, y) {
                *pixel = color;
            }
        }
    }

    imageproc::map::map_colors2(image, &overlay, |base, over| {
        Rgb(blend_colors(base.0, over.0, OVERLAY_ALPHA))
    })
}

pub fn render_masks(masks: &[ValidMask]) -> Vec<IndividualMask> {
    masks
        .iter()
        .map(|valid| IndividualMask {
            number: valid.index + 1,
            image: valid.mask.to_gray_image(),
        })
        .collect()
}

/// Blend two colors with alpha, rounding to the nearest channel value
pub fn blend_colors(base: [u8; 3], overlay: [u8; 3], alpha: f32) -> [u8; 3] {
    let alpha = alpha.clamp(0.0, 1.0);
    let inv_alpha = 1.0 - alpha;
    let mix = |b: u8, o: u8| (b as f32 * inv_alpha + o as f32 * alpha).round().clamp(0.0, 255.0) as u8;

    [
        mix(base[0], overlay[0]),
        mix(base[1], overlay[1]),
        mix(base[2], overlay[2]),
    ]
}
