//! Present / future scenario pairs and their deltas.

use super::area::AreaNormalizer;
use super::raster_math::combine;
use ecoserv_core::raster::{Raster, RasterElement};
use ecoserv_core::Result;
use serde::Serialize;
use std::fmt;

/// Which of the two compared land-use states a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scenario {
    /// Current state ("stato di fatto")
    Present,
    /// Project state ("stato di progetto")
    Future,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::Present, Scenario::Future];

    /// Suffix used in output file names
    pub fn file_label(&self) -> &'static str {
        match self {
            Scenario::Present => "presente",
            Scenario::Future => "futuro",
        }
    }

    /// Wording used in report lines
    pub fn report_label(&self) -> &'static str {
        match self {
            Scenario::Present => "Stato attuale",
            Scenario::Future => "Stato di progetto",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_label())
    }
}

/// Two rasters on the same grid, one per scenario.
#[derive(Debug, Clone)]
pub struct ScenarioPair<T: RasterElement = f64> {
    present: Raster<T>,
    future: Raster<T>,
}

impl<T: RasterElement> ScenarioPair<T> {
    /// Pair two rasters, rejecting mismatched shape, transform or CRS.
    pub fn new(present: Raster<T>, future: Raster<T>) -> Result<Self> {
        present.check_same_grid(&future)?;
        Ok(Self { present, future })
    }

    pub fn present(&self) -> &Raster<T> {
        &self.present
    }

    pub fn future(&self) -> &Raster<T> {
        &self.future
    }

    pub fn get(&self, scenario: Scenario) -> &Raster<T> {
        match scenario {
            Scenario::Present => &self.present,
            Scenario::Future => &self.future,
        }
    }

    /// Derive a new pair by running `f` on each scenario.
    pub fn try_map<U, F>(&self, f: F) -> Result<ScenarioPair<U>>
    where
        U: RasterElement,
        F: Fn(Scenario, &Raster<T>) -> Result<Raster<U>>,
    {
        ScenarioPair::new(
            f(Scenario::Present, &self.present)?,
            f(Scenario::Future, &self.future)?,
        )
    }

    pub fn into_parts(self) -> (Raster<T>, Raster<T>) {
        (self.present, self.future)
    }
}

impl ScenarioPair<f64> {
    /// `future − present`, cell by cell.
    pub fn delta(&self) -> Result<Raster<f64>> {
        combine(&self.present, &self.future, |present, future| future - present)
    }

    /// Aggregate both scenarios and their delta.
    ///
    /// `valid` gives the number of recognized pixels per scenario; the delta
    /// is normalized by the present count.
    pub fn compare(&self, valid: ValidPixels, normalizer: &AreaNormalizer) -> Result<ScenarioComparison> {
        let delta = self.delta()?;
        Ok(ScenarioComparison {
            present: AnalysisResult::new(self.present.clone(), valid.present, normalizer),
            future: AnalysisResult::new(self.future.clone(), valid.future, normalizer),
            delta: AnalysisResult::new(delta, valid.present, normalizer),
        })
    }

    /// [`compare`](Self::compare) with every cell of the grid counted as valid.
    pub fn compare_all_cells(&self, normalizer: &AreaNormalizer) -> Result<ScenarioComparison> {
        let cells = self.present.len();
        self.compare(ValidPixels::new(cells, cells), normalizer)
    }
}

/// Recognized-pixel counts of the two scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ValidPixels {
    pub present: usize,
    pub future: usize,
}

impl ValidPixels {
    pub fn new(present: usize, future: usize) -> Self {
        Self { present, future }
    }
}

/// Scalar summary of one value raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregates {
    /// Sum over all cells
    pub sum: f64,
    /// Cells whose source code was recognized
    pub valid_pixels: usize,
    /// `sum / valid_pixels`, 0 without valid pixels
    pub mean: f64,
    /// `sum` per hectare of valid pixels, 0 without valid pixels
    pub per_hectare: f64,
}

impl Aggregates {
    pub fn new(sum: f64, valid_pixels: usize, normalizer: &AreaNormalizer) -> Self {
        let mean = if valid_pixels == 0 {
            0.0
        } else {
            sum / valid_pixels as f64
        };
        Self {
            sum,
            valid_pixels,
            mean,
            per_hectare: normalizer.per_hectare(sum, valid_pixels),
        }
    }
}

/// A derived raster together with its aggregates
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub raster: Raster<f64>,
    pub aggregates: Aggregates,
}

impl AnalysisResult {
    pub fn new(raster: Raster<f64>, valid_pixels: usize, normalizer: &AreaNormalizer) -> Self {
        let aggregates = Aggregates::new(raster.sum(), valid_pixels, normalizer);
        Self { raster, aggregates }
    }
}

/// Present, future and delta results of one quantity
#[derive(Debug, Clone)]
pub struct ScenarioComparison {
    pub present: AnalysisResult,
    pub future: AnalysisResult,
    pub delta: AnalysisResult,
}

impl ScenarioComparison {
    pub fn get(&self, scenario: Scenario) -> &AnalysisResult {
        match scenario {
            Scenario::Present => &self.present,
            Scenario::Future => &self.future,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoserv_core::{Error, GeoTransform};

    fn make_band(values: Vec<f64>) -> Raster<f64> {
        let mut r = Raster::from_vec(values, 2, 3).unwrap();
        r.set_transform(GeoTransform::new(0.0, 5.0, 2.0, -2.0));
        r
    }

    #[test]
    fn test_delta_is_future_minus_present() {
        let present = make_band(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let future = make_band(vec![1.5, 2.0, 0.0, 10.0, -5.0, 6.25]);
        let pair = ScenarioPair::new(present.clone(), future.clone()).unwrap();
        let delta = pair.delta().unwrap();
        for ((d, p), f) in delta.data().iter().zip(present.data()).zip(future.data()) {
            assert!((d - (f - p)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_pair_rejects_other_grid() {
        let present = make_band(vec![0.0; 6]);
        let mut future = make_band(vec![0.0; 6]);
        future.set_transform(GeoTransform::new(10.0, 5.0, 2.0, -2.0));
        assert!(matches!(ScenarioPair::new(present, future), Err(Error::GridMismatch(_))));
    }

    #[test]
    fn test_compare_aggregates() {
        let n = AreaNormalizer::new(2.0).unwrap();
        let pair = ScenarioPair::new(
            make_band(vec![4.0, 4.0, 0.0, 0.0, 0.0, 0.0]),
            make_band(vec![8.0, 8.0, 8.0, 0.0, 0.0, 0.0]),
        )
        .unwrap();
        let cmp = pair.compare(ValidPixels::new(2, 3), &n).unwrap();

        assert_eq!(cmp.present.aggregates.sum, 8.0);
        assert_eq!(cmp.present.aggregates.mean, 4.0);
        assert!((cmp.present.aggregates.per_hectare - 10_000.0).abs() < 1e-9);
        assert_eq!(cmp.future.aggregates.valid_pixels, 3);
        assert_eq!(cmp.delta.aggregates.sum, 16.0);
        assert_eq!(cmp.delta.aggregates.valid_pixels, 2);
    }

    #[test]
    fn test_compare_without_valid_pixels() {
        let n = AreaNormalizer::new(2.0).unwrap();
        let pair = ScenarioPair::new(make_band(vec![1.0; 6]), make_band(vec![2.0; 6])).unwrap();
        let cmp = pair.compare(ValidPixels::default(), &n).unwrap();
        assert_eq!(cmp.delta.aggregates.mean, 0.0);
        assert_eq!(cmp.delta.aggregates.per_hectare, 0.0);
        assert_eq!(cmp.delta.aggregates.sum, 6.0);
    }

    #[test]
    fn test_try_map_codes_to_values() {
        let codes = ScenarioPair::new(
            Raster::<i32>::from_vec(vec![7, 9, 0, 7], 2, 2).unwrap(),
            Raster::<i32>::from_vec(vec![9, 9, 9, 9], 2, 2).unwrap(),
        )
        .unwrap();
        let values = codes
            .try_map(|_, r| Ok(r.map(|c| c as f64)))
            .unwrap();
        assert_eq!(values.future().sum(), 36.0);
        assert_eq!(values.delta().unwrap().sum(), 13.0);
    }
}
