//! Pixel-area normalization.

use ecoserv_core::{Error, Result};

/// Square metres in one hectare
pub const SQUARE_METRES_PER_HECTARE: f64 = 10_000.0;

/// `(sum / (pixel_count × pixel_area)) × 10 000`, or 0 when there are no pixels.
pub fn normalized_per_hectare(sum: f64, pixel_count: usize, pixel_area: f64) -> f64 {
    let covered = pixel_count as f64 * pixel_area;
    if pixel_count == 0 || covered <= 0.0 {
        0.0
    } else {
        sum / covered * SQUARE_METRES_PER_HECTARE
    }
}

/// Converts per-unit-area coefficients into per-pixel totals and pixel-count
/// aggregates into per-area figures, for one pixel resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaNormalizer {
    resolution: f64,
}

impl AreaNormalizer {
    /// `resolution` is the pixel side in metres.
    pub fn new(resolution: f64) -> Result<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "pixel_resolution",
                value: resolution.to_string(),
                reason: "must be a positive number of metres".into(),
            });
        }
        Ok(Self { resolution })
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Area of one pixel in square metres
    pub fn pixel_area(&self) -> f64 {
        self.resolution * self.resolution
    }

    /// Area covered by `pixel_count` pixels in square metres
    pub fn covered_area(&self, pixel_count: usize) -> f64 {
        pixel_count as f64 * self.pixel_area()
    }

    /// `sum` spread over `pixel_count` pixels, per square metre
    pub fn per_square_metre(&self, sum: f64, pixel_count: usize) -> f64 {
        normalized_per_hectare(sum, pixel_count, self.pixel_area()) / SQUARE_METRES_PER_HECTARE
    }

    /// `sum` spread over `pixel_count` pixels, per hectare
    pub fn per_hectare(&self, sum: f64, pixel_count: usize) -> f64 {
        normalized_per_hectare(sum, pixel_count, self.pixel_area())
    }
}
