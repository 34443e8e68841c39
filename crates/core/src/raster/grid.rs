//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// Tolerance used when comparing the geotransforms of two rasters
const GRID_TOLERANCE: f64 = 1e-6;

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a 2D grid with associated
/// geographic metadata (transform and CRS). Land-use maps are
/// `Raster<i32>`; every derived map is `Raster<f64>` created through
/// [`Raster::with_same_meta`] or [`Raster::map`] so that grid, transform
/// and projection travel with the data.
///
/// # Example
///
/// ```ignore
/// use ecoserv_core::Raster;
///
/// let codes: Raster<i32> = Raster::from_vec(vec![7, 9, 0, 7], 2, 2)?;
/// let area: Raster<f64> = codes.map(|c| if c > 0 { 4.0 } else { 0.0 });
/// assert_eq!(area.sum(), 12.0);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// Coordinate reference system
    crs: Option<CRS>,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from existing data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a zeroed raster with the same metadata but a different data type
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    /// Apply `f` to every cell, keeping grid, transform and CRS.
    pub fn map<U, F>(&self, f: F) -> Raster<U>
    where
        U: RasterElement,
        F: Fn(T) -> U,
    {
        Raster {
            data: self.data.mapv(f),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Verify that `other` lies on the same grid: identical shape, matching
    /// geotransform and, when both carry one, an equivalent CRS.
    pub fn check_same_grid<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        let (er, ec) = self.shape();
        let (ar, ac) = other.shape();
        if (er, ec) != (ar, ac) {
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
        if !self.transform.approx_eq(other.transform(), GRID_TOLERANCE) {
            return Err(Error::GridMismatch(format!(
                "origin ({}, {}) size {} vs origin ({}, {}) size {}",
                self.transform.origin_x,
                self.transform.origin_y,
                self.transform.pixel_width,
                other.transform().origin_x,
                other.transform().origin_y,
                other.transform().pixel_width,
            )));
        }
        if let (Some(a), Some(b)) = (self.crs(), other.crs()) {
            if !a.is_equivalent(b) {
                return Err(Error::CrsMismatch(a.identifier(), b.identifier()));
            }
        }
        Ok(())
    }

    /// Sum of all valid cells as f64
    pub fn sum(&self) -> f64 {
        self.data
            .iter()
            .filter(|v| !self.is_nodata(**v))
            .filter_map(|v| v.to_f64())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<i32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_from_vec_wrong_length() {
        let result: Result<Raster<i32>> = Raster::from_vec(vec![1, 2, 3], 2, 2);
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn test_map_keeps_metadata() {
        let mut codes: Raster<i32> = Raster::from_vec(vec![7, 9, 0, 7], 2, 2).unwrap();
        codes.set_transform(GeoTransform::new(10.0, 20.0, 2.0, -2.0));
        codes.set_crs(Some(CRS::from_epsg(32632)));

        let values: Raster<f64> = codes.map(|c| c as f64 * 0.5);
        assert_eq!(values.transform(), codes.transform());
        assert_eq!(values.crs().and_then(|c| c.epsg()), Some(32632));
        assert_eq!(values.get(0, 1).unwrap(), 4.5);
    }

    #[test]
    fn test_sum_skips_nan() {
        let raster: Raster<f64> = Raster::from_vec(vec![1.0, f64::NAN, 2.5, 0.5], 2, 2).unwrap();
        assert_eq!(raster.sum(), 4.0);
    }

    #[test]
    fn test_check_same_grid() {
        let a: Raster<f64> = Raster::new(3, 3);
        let b: Raster<i32> = Raster::new(3, 3);
        assert!(a.check_same_grid(&b).is_ok());

        let c: Raster<f64> = Raster::new(3, 4);
        assert!(matches!(a.check_same_grid(&c), Err(Error::SizeMismatch { .. })));

        let mut d: Raster<f64> = Raster::new(3, 3);
        d.set_transform(GeoTransform::new(100.0, 0.0, 1.0, -1.0));
        assert!(matches!(a.check_same_grid(&d), Err(Error::GridMismatch(_))));

        let mut e = a.clone();
        e.set_crs(Some(CRS::from_epsg(32632)));
        let mut f = a.clone();
        f.set_crs(Some(CRS::from_epsg(3003)));
        assert!(matches!(e.check_same_grid(&f), Err(Error::CrsMismatch(_, _))));
    }
}
