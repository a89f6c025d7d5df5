//! Fixed, cyclic mask colors.

use image::Rgb;

/// Overlay colors, assigned by mask index modulo the palette length.
pub const MASK_PALETTE: [Rgb<u8>; 6] = [
    Rgb([255, 0, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 128, 255]),
    Rgb([255, 255, 0]),
    Rgb([255, 0, 255]),
    Rgb([0, 255, 255]),
];

pub fn palette_size() -> usize {
    MASK_PALETTE.len()
}

/// Color for the mask at `index` (0-based original position in its mask set).
pub fn color_for(index: usize) -> Rgb<u8> {
    MASK_PALETTE[index % MASK_PALETTE.len()]
}
