//! Sum of the euro deltas of the individual services.

use super::{EcosystemService, IntoServiceOutput, NamedRaster, NamedReport, ServiceOutput};
use crate::engine::{sum_rasters, AnalysisResult, AreaNormalizer};
use crate::report::{Report, Section};
use chrono::NaiveDateTime;
use ecoserv_core::raster::Raster;
use ecoserv_core::{Algorithm, Error, Result};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct TotalParams {
    pub pixel_resolution: f64,
}

impl Default for TotalParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TotalResult {
    /// Summed delta, normalized over every cell of the grid
    pub total: AnalysisResult,
}

/// Total ecosystem-service value algorithm
#[derive(Debug, Clone, Default)]
pub struct TotalValue;

impl Algorithm for TotalValue {
    type Input = Vec<Raster<f64>>;
    type Output = TotalResult;
    type Params = TotalParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "TotalValue"
    }

    fn description(&self) -> &'static str {
        "Elementwise sum of euro delta rasters"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let deltas: Vec<&Raster<f64>> = input.iter().collect();
        total_value(&deltas, &params)
    }
}

/// Sum `deltas` cell by cell; all of them must share one grid.
pub fn total_value(deltas: &[&Raster<f64>], params: &TotalParams) -> Result<TotalResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let sum = sum_rasters(deltas)?;
    let cells = sum.len();
    let total = AnalysisResult::new(sum, cells, &normalizer);

    debug!(inputs = deltas.len(), cells, "delta rasters summed");
    info!(
        total = total.aggregates.sum,
        per_hectare = total.aggregates.per_hectare,
        "total ecosystem-service value"
    );
    Ok(TotalResult { total })
}

impl IntoServiceOutput for TotalResult {
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput {
        let service = EcosystemService::Total;
        let aggregates = self.total.aggregates;
        let report = Report::new("Sommario dell'analisi dei servizi ecosistemici", generated).section(
            Section::new("Differenze tra stato di progetto e stato attuale")
                .value("Differenza di valore totale (€)", aggregates.sum)
                .value("Differenza per unità di superficie (€/ha)", aggregates.per_hectare),
        );

        ServiceOutput {
            rasters: vec![NamedRaster::new(service.delta_file_name(), self.total.raster)],
            report: Some(NamedReport {
                file_name: service.report_file_name(),
                report,
            }),
            message: "Completed".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ecoserv_core::GeoTransform;

    fn make_band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, 20.0, 2.0, -2.0));
        r
    }

    #[test]
    fn test_five_zeros_and_one_ones() {
        let mut rasters: Vec<Raster<f64>> = (0..5).map(|_| make_band(10, 10, 0.0)).collect();
        rasters.push(make_band(10, 10, 1.0));
        let refs: Vec<&Raster<f64>> = rasters.iter().collect();

        let result = total_value(&refs, &TotalParams::default()).unwrap();
        assert_relative_eq!(result.total.aggregates.sum, 100.0, epsilon = 1e-12);
        assert_relative_eq!(result.total.aggregates.mean, 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            result.total.aggregates.per_hectare,
            100.0 / (100.0 * 4.0) * 10_000.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_mismatched_grids() {
        let a = make_band(10, 10, 1.0);
        let b = make_band(5, 10, 1.0);
        assert!(total_value(&[&a, &b], &TotalParams::default()).is_err());
    }

    #[test]
    fn test_no_inputs() {
        assert!(total_value(&[], &TotalParams::default()).is_err());
    }

    #[test]
    fn test_algorithm_and_outputs() {
        let result = TotalValue
            .execute(
                vec![make_band(2, 2, 1.5), make_band(2, 2, -0.5)],
                TotalParams::default(),
            )
            .unwrap();
        let when = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let output = result.into_output(when);

        assert_eq!(output.rasters[0].file_name, "SE_10_totale_delta_euro.tiff");
        assert_eq!(output.rasters[0].raster.get(1, 1).unwrap(), 1.0);
        let named = output.report.unwrap();
        assert_eq!(named.file_name, "SE_totale.txt");
        assert_eq!(named.report.lookup("Differenza di valore totale (€)"), Some(4.0));
    }
}
