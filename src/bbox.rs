//! Tight bounding box of the non-transparent pixels in an RGBA raster.
//!
//! Collision tests use this box instead of the full bitmap so the bean bounces
//! off its visible outline rather than its transparent padding.

use crate::error::{Error, Result};

/// Pixel offsets from the image origin. `right` and `bottom` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Centre of the box, relative to the image origin.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.left + self.right) as f64 / 2.0,
            (self.top + self.bottom) as f64 / 2.0,
        )
    }
}

/// Borrowed RGBA8 raster, row-major.
struct Raster<'a> {
    data: &'a [u8],
    width: usize,
}

impl Raster<'_> {
    #[inline]
    fn alpha(&self, x: usize, y: usize) -> u8 {
        self.data[4 * (y * self.width + x) + 3]
    }

    fn row_is_empty(&self, y: usize) -> bool {
        (0..self.width).all(|x| self.alpha(x, y) == 0)
    }

    fn column_is_empty(&self, x: usize, top: usize, bottom: usize) -> bool {
        (top..=bottom).all(|y| self.alpha(x, y) == 0)
    }
}

/// Scan `pixels` (RGBA8, `width * height * 4` bytes) for the smallest rectangle
/// containing every pixel with non-zero alpha. `Ok(None)` means fully transparent.
pub fn compute_bounding_box(
    pixels: &[u8],
    width: u32,
    height: u32,
) -> Result<Option<BoundingBox>> {
    // An unrepresentable length can never be satisfied.
    let needed = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4));
    let expected = needed.unwrap_or(usize::MAX);
    if needed.is_none() || pixels.len() < expected {
        return Err(Error::PixelBuffer {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }
    if width == 0 || height == 0 {
        return Ok(None);
    }

    let raster = Raster {
        data: pixels,
        width: width as usize,
    };
    let h = height as usize;
    let w = width as usize;

    let Some(top) = (0..h).find(|&y| !raster.row_is_empty(y)) else {
        return Ok(None);
    };
    // A non-empty row exists, so both scans below terminate inside the image.
    let bottom = (top..h).rev().find(|&y| !raster.row_is_empty(y)).unwrap_or(top);
    let left = (0..w)
        .find(|&x| !raster.column_is_empty(x, top, bottom))
        .unwrap_or(0);
    let right = (left..w)
        .rev()
        .find(|&x| !raster.column_is_empty(x, top, bottom))
        .unwrap_or(left);

    Ok(Some(BoundingBox {
        left: left as u32,
        top: top as u32,
        right: right as u32 + 1,
        bottom: bottom as u32 + 1,
    }))
}
