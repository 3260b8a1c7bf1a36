//! Pixel sampling and the visited-pixel overlay.
//!
//! [`Raster`] owns tightly packed RGB bytes and answers colour queries
//! for any coordinate: samples outside the image yield
//! [`Color::OUTSIDE`] instead of failing, which lets boundary checks
//! treat the image frame like any other colour change.
//!
//! [`VisitedMap`] is a one-bit-per-pixel overlay recording which pixels
//! the trace has already accounted for.

use bitvec::vec::BitVec;
use image::RgbImage;

use crate::types::{Color, Dimensions, Point, TraceError};

/// Bytes per pixel in the packed RGB buffer.
pub const BYTES_PER_PIXEL: usize = 3;

/// Read-only RGB raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Wrap a packed RGB buffer of `width * height * 3` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::EmptyRaster`] if either dimension is zero and
    /// [`TraceError::SizeMismatch`] if the buffer length is wrong.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, TraceError> {
        if width == 0 || height == 0 {
            return Err(TraceError::EmptyRaster);
        }
        let width = width as usize;
        let height = height as usize;
        let stride = width
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or(TraceError::SizeMismatch {
                expected: usize::MAX,
                actual: data.len(),
            })?;
        let expected = stride.checked_mul(height).ok_or(TraceError::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;
        if data.len() != expected {
            return Err(TraceError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Take ownership of a decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::EmptyRaster`] for a zero-sized image.
    pub fn from_image(image: RgbImage) -> Result<Self, TraceError> {
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, image.into_raw())
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Dimensions in pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn dimensions(&self) -> Dimensions {
        // Both dimensions came from `u32` values in `from_raw`.
        Dimensions {
            width: self.width as u32,
            height: self.height as u32,
        }
    }

    /// Colour at pixel `(x, y)`, or [`Color::OUTSIDE`] out of bounds.
    #[must_use]
    pub fn color(&self, x: i32, y: i32) -> Color {
        let Some(offset) = self.offset(x, y) else {
            return Color::OUTSIDE;
        };
        match self.data.get(offset..offset + BYTES_PER_PIXEL) {
            Some(&[r, g, b]) => Color::from_rgb(r, g, b),
            _ => Color::OUTSIDE,
        }
    }

    /// Colour at pixel `p`.
    #[must_use]
    pub fn color_at(&self, p: Point) -> Color {
        self.color(p.x, p.y)
    }

    /// Whether any two 4-adjacent pixels differ in colour.
    #[must_use]
    pub fn has_transitions(&self) -> bool {
        let rows: Vec<&[u8]> = self.data.chunks_exact(self.stride).collect();
        let horizontal = rows.iter().any(|row| {
            row.chunks_exact(BYTES_PER_PIXEL)
                .zip(row.chunks_exact(BYTES_PER_PIXEL).skip(1))
                .any(|(a, b)| a != b)
        });
        horizontal || rows.windows(2).any(|pair| pair[0] != pair[1])
    }

    /// Byte offset of pixel `(x, y)`, or `None` out of bounds.
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.stride + x * BYTES_PER_PIXEL)
    }
}

/// One bit per pixel: set once the pixel has been accounted for.
///
/// A pixel is accounted for when a boundary walk crosses its western
/// edge, when it lies on the image perimeter, or when the island sweep
/// passes over it.
#[derive(Debug, Clone)]
pub struct VisitedMap {
    width: usize,
    height: usize,
    bits: BitVec,
}

impl VisitedMap {
    /// All-clear overlay for a `width x height` raster.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: BitVec::repeat(false, width * height),
        }
    }

    /// Mark pixel `(x, y)`. Idempotent; out-of-bounds coordinates are
    /// ignored.
    pub fn mark(&mut self, x: i32, y: i32) {
        if let Some(index) = self.index(x, y) {
            self.bits.set(index, true);
        }
    }

    /// Whether pixel `(x, y)` has been marked. Out-of-bounds pixels
    /// count as visited.
    #[must_use]
    pub fn is_visited(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .is_none_or(|index| self.bits.get(index).is_some_and(|bit| *bit))
    }

    /// Number of marked pixels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Whether every pixel has been marked.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.bits.all()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn two_tone() -> Raster {
        // 3x2: left column red, rest blue.
        let img = RgbImage::from_fn(3, 2, |x, _| {
            if x == 0 {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        });
        Raster::from_image(img).unwrap()
    }

    #[test]
    fn samples_packed_colors() {
        let raster = two_tone();
        assert_eq!(raster.color(0, 1), Color::from_rgb(255, 0, 0));
        assert_eq!(raster.color(2, 0), Color::from_rgb(0, 0, 255));
        assert_eq!(raster.width(), 3);
        assert_eq!(raster.height(), 2);
    }

    #[test]
    fn out_of_bounds_is_outside() {
        let raster = two_tone();
        assert_eq!(raster.color(-1, 0), Color::OUTSIDE);
        assert_eq!(raster.color(0, -1), Color::OUTSIDE);
        assert_eq!(raster.color(3, 0), Color::OUTSIDE);
        assert_eq!(raster.color(0, 2), Color::OUTSIDE);
        assert_eq!(raster.color(i32::MIN, i32::MAX), Color::OUTSIDE);
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        let result = Raster::from_raw(2, 2, vec![0; 11]);
        assert!(matches!(
            result,
            Err(TraceError::SizeMismatch {
                expected: 12,
                actual: 11
            })
        ));
    }

    #[test]
    fn from_raw_rejects_zero_dimensions() {
        assert!(matches!(
            Raster::from_raw(0, 4, Vec::new()),
            Err(TraceError::EmptyRaster)
        ));
    }

    #[test]
    fn transitions_detected_in_both_axes() {
        assert!(two_tone().has_transitions());

        let solid = Raster::from_raw(2, 2, vec![7; 12]).unwrap();
        assert!(!solid.has_transitions());

        // Rows differ but each row is uniform.
        let mut data = vec![0; 12];
        data[6..].fill(9);
        let striped = Raster::from_raw(2, 2, data).unwrap();
        assert!(striped.has_transitions());
    }

    #[test]
    fn visited_marking_is_idempotent() {
        let mut visited = VisitedMap::new(3, 2);
        assert!(!visited.is_visited(1, 1));
        visited.mark(1, 1);
        visited.mark(1, 1);
        assert!(visited.is_visited(1, 1));
        assert_eq!(visited.count(), 1);
    }

    #[test]
    fn visited_ignores_out_of_bounds() {
        let mut visited = VisitedMap::new(2, 2);
        visited.mark(-1, 0);
        visited.mark(2, 0);
        assert_eq!(visited.count(), 0);
        assert!(visited.is_visited(5, 5));
    }

    #[test]
    fn visited_complete_once_all_marked() {
        let mut visited = VisitedMap::new(2, 1);
        visited.mark(0, 0);
        assert!(!visited.is_complete());
        visited.mark(1, 0);
        assert!(visited.is_complete());
    }
}
