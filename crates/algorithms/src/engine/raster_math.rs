//! Cell-by-cell arithmetic on value rasters.
//!
//! NaN in any input cell yields NaN in the output cell.

use crate::maybe_rayon::*;
use ecoserv_core::raster::Raster;
use ecoserv_core::{Error, Result};
use ndarray::Array2;

/// Apply `f` to every cell.
pub fn map_cells<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, slot) in row_data.iter_mut().enumerate() {
                let val = unsafe { raster.get_unchecked(row, col) };
                if !val.is_nan() {
                    *slot = f(val);
                }
            }
            row_data
        })
        .collect();

    build(raster, data)
}

/// Combine two rasters on the same grid with `f(a, b)`.
pub fn combine<F>(a: &Raster<f64>, b: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    a.check_same_grid(b)?;
    let (rows, cols) = a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, slot) in row_data.iter_mut().enumerate() {
                let va = unsafe { a.get_unchecked(row, col) };
                let vb = unsafe { b.get_unchecked(row, col) };
                if !(va.is_nan() || vb.is_nan()) {
                    *slot = f(va, vb);
                }
            }
            row_data
        })
        .collect();

    build(a, data)
}

/// Elementwise sum of any number of rasters on one grid.
pub fn sum_rasters(rasters: &[&Raster<f64>]) -> Result<Raster<f64>> {
    let (first, rest) = rasters
        .split_first()
        .ok_or_else(|| Error::Other("no rasters to sum".into()))?;

    let mut total = map_cells(first, |v| v)?;
    for raster in rest {
        total = combine(&total, raster, |a, b| a + b)?;
    }
    Ok(total)
}

fn build(template: &Raster<f64>, data: Vec<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = template.shape();
    let mut output = template.with_same_meta::<f64>(rows, cols);
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoserv_core::GeoTransform;

    fn make_band(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(5, 5, value);
        r.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        r
    }

    #[test]
    fn test_map_cells_scale() {
        let result = map_cells(&make_band(300.0), |v| v / 1000.0 * 4.0).unwrap();
        assert!((result.get(2, 2).unwrap() - 1.2).abs() < 1e-10);
    }

    #[test]
    fn test_combine_preserves_nan() {
        let a = make_band(1.0);
        let mut b = make_band(2.0);
        b.set(1, 1, f64::NAN).unwrap();
        let result = combine(&a, &b, |x, y| y - x).unwrap();
        assert!(result.get(1, 1).unwrap().is_nan());
        assert!((result.get(0, 0).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_combine_rejects_other_grid() {
        let a = make_band(1.0);
        let b: Raster<f64> = Raster::filled(4, 5, 1.0);
        assert!(matches!(combine(&a, &b, |x, y| x + y), Err(Error::SizeMismatch { .. })));
    }

    #[test]
    fn test_sum_rasters() {
        let a = make_band(1.0);
        let b = make_band(2.5);
        let c = make_band(-0.5);
        let total = sum_rasters(&[&a, &b, &c]).unwrap();
        assert!((total.sum() - 75.0).abs() < 1e-10);
        assert!(sum_rasters(&[]).is_err());
    }
}
