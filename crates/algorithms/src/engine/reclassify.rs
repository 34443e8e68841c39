//! Land-use raster reclassification
//!
//! Turns a raster of land-use codes into a value raster by substituting a
//! coefficient for every code. Each distinct code is resolved once; the
//! per-cell pass is then a plain map lookup. Codes the table does not know
//! (and no-data cells) become 0.

use super::code_table::{CodeSet, CodeTable, LandUseCode};
use crate::maybe_rayon::*;
use ecoserv_core::raster::Raster;
use ndarray::Array2;
use ecoserv_core::{Error, RasterElement, Result};
use std::collections::BTreeMap;

/// Replace negative codes with 0.
///
/// Legacy land-use maps mark unclassified cells with negative fill values;
/// after cleaning they fall through every table as unknown code 0.
pub fn clean_negative(codes: &Raster<LandUseCode>) -> Raster<LandUseCode> {
    let mut cleaned = codes.map(|c| c.clamp_negative());
    cleaned.set_nodata(codes.nodata().filter(|nd| *nd >= 0));
    cleaned
}

/// Number of cells per code, no-data cells excluded.
pub fn code_histogram(codes: &Raster<LandUseCode>) -> BTreeMap<LandUseCode, usize> {
    let mut histogram = BTreeMap::new();
    for &code in codes.data().iter() {
        if codes.is_nodata(code) {
            continue;
        }
        *histogram.entry(code).or_insert(0) += 1;
    }
    histogram
}

/// Distinct codes present in the raster, ascending.
pub fn unique_codes(codes: &Raster<LandUseCode>) -> Vec<LandUseCode> {
    code_histogram(codes).into_keys().collect()
}

/// Reclassify with a per-code function.
///
/// `f` is called once per distinct code; `None` means "not in the table"
/// and yields 0 for every cell of that code.
///
/// # Example
/// ```ignore
/// // retained rainfall per code from a curve-number table
/// let retained = reclassify_with(&codes, |code| {
///     curve_numbers.get(code).map(|cn| runoff(cn, rainfall))
/// })?;
/// ```
pub fn reclassify_with<F>(codes: &Raster<LandUseCode>, f: F) -> Result<Raster<f64>>
where
    F: Fn(LandUseCode) -> Option<f64>,
{
    let resolved: BTreeMap<LandUseCode, f64> = unique_codes(codes)
        .into_iter()
        .filter_map(|code| f(code).map(|v| (code, v)))
        .collect();

    fill_from_lookup(codes, &resolved)
}

/// Reclassify against a coefficient table, multiplying by `scale` in the
/// same pass (usually the pixel area).
pub fn reclassify(
    codes: &Raster<LandUseCode>,
    table: &CodeTable<f64>,
    scale: f64,
) -> Result<Raster<f64>> {
    reclassify_with(codes, |code| table.get(code).map(|v| v * scale))
}

/// 1.0 where the code belongs to `set`, 0.0 elsewhere.
pub fn eligibility_mask(codes: &Raster<LandUseCode>, set: &CodeSet) -> Result<Raster<f64>> {
    reclassify_with(codes, |code| set.contains(code).then_some(1.0))
}

/// Number of cells whose code the table recognizes (zero-valued entries count).
pub fn count_recognized<V: Copy>(codes: &Raster<LandUseCode>, table: &CodeTable<V>) -> usize {
    code_histogram(codes)
        .into_iter()
        .filter(|(code, _)| table.contains(*code))
        .map(|(_, n)| n)
        .sum()
}

/// Number of cells whose code belongs to `set`.
pub fn count_in_set(codes: &Raster<LandUseCode>, set: &CodeSet) -> usize {
    code_histogram(codes)
        .into_iter()
        .filter(|(code, _)| set.contains(*code))
        .map(|(_, n)| n)
        .sum()
}

fn fill_from_lookup(
    codes: &Raster<LandUseCode>,
    resolved: &BTreeMap<LandUseCode, f64>,
) -> Result<Raster<f64>> {
    let (rows, cols) = codes.shape();
    let nodata = codes.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0.0; cols];
            for (col, slot) in row_data.iter_mut().enumerate() {
                let code = unsafe { codes.get_unchecked(row, col) };
                if nodata == Some(code) {
                    continue;
                }
                if let Some(&value) = resolved.get(&code) {
                    *slot = value;
                }
            }
            row_data
        })
        .collect();

    let mut output = codes.with_same_meta::<f64>(rows, cols);
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}
