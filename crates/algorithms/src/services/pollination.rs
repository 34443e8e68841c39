//! Pollination value, `value[c] · A` euro per cell and year.

use super::{
    delta_section, prepare_codes, scenario_section, EcosystemService, IntoServiceOutput,
    NamedRaster, NamedReport, ServiceOutput, Years,
};
use crate::engine::{
    reclassify, AreaNormalizer, LandUseCode, Scenario, ScenarioComparison, ScenarioPair,
};
use crate::reference::coefficients::pollination_value;
use crate::report::Report;
use chrono::NaiveDateTime;
use ecoserv_core::{Algorithm, Error, Result};
use tracing::info;

#[derive(Debug, Clone)]
pub struct PollinationParams {
    pub pixel_resolution: f64,
    pub years: Years,
}

impl Default for PollinationParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            years: Years::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollinationResult {
    pub years: Years,
    /// Euro per scenario and difference
    pub comparison: ScenarioComparison,
}

/// Pollination algorithm
#[derive(Debug, Clone, Default)]
pub struct Pollination;

impl Algorithm for Pollination {
    type Input = ScenarioPair<LandUseCode>;
    type Output = PollinationResult;
    type Params = PollinationParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Pollination"
    }

    fn description(&self) -> &'static str {
        "Pollination value of two land-use maps and its difference"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        pollination(&input, &params)
    }
}

pub fn pollination(codes: &ScenarioPair<LandUseCode>, params: &PollinationParams) -> Result<PollinationResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let codes = prepare_codes(codes.present(), codes.future())?;
    let table = pollination_value();

    let values = codes.try_map(|_, c| reclassify(c, &table, normalizer.pixel_area()))?;
    let comparison = values.compare_all_cells(&normalizer)?;

    info!(delta = comparison.delta.aggregates.sum, "pollination valued");
    Ok(PollinationResult {
        years: params.years,
        comparison,
    })
}

impl IntoServiceOutput for PollinationResult {
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput {
        let service = EcosystemService::Pollination;
        let mut report = Report::new("Report dell'analisi dell'impollinazione", generated);
        for scenario in Scenario::ALL {
            report = report.section(scenario_section(scenario, &self.years).value(
                format!("Impollinazione {} (€)", scenario.report_label()),
                self.comparison.get(scenario).aggregates.sum,
            ));
        }
        report = report.section(delta_section(&self.years).whole(
            "Variazione valore totale dell'impollinazione (€)",
            self.comparison.delta.aggregates.sum,
        ));

        ServiceOutput {
            rasters: vec![NamedRaster::new(
                service.delta_file_name(),
                self.comparison.delta.raster,
            )],
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
    use ecoserv_core::raster::Raster;
    use ecoserv_core::GeoTransform;

    fn make_codes(values: Vec<LandUseCode>) -> Raster<LandUseCode> {
        let mut r = Raster::from_vec(values, 2, 2).unwrap();
        r.set_transform(GeoTransform::new(0.0, 4.0, 2.0, -2.0));
        r
    }

    #[test]
    fn test_pollination_delta() {
        let codes = ScenarioPair::new(make_codes(vec![4, 7, 0, 3]), make_codes(vec![37, 7, 58, 3])).unwrap();
        let result = pollination(&codes, &PollinationParams::default()).unwrap();

        assert_relative_eq!(
            result.comparison.present.aggregates.sum,
            (0.0161 + 0.0187) * 4.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            result.comparison.delta.raster.get(0, 0).unwrap(),
            (0.02 - 0.0161) * 4.0,
            epsilon = 1e-12
        );
        assert_eq!(result.comparison.delta.raster.get(0, 1).unwrap(), 0.0);
        assert_relative_eq!(
            result.comparison.delta.aggregates.sum,
            (0.02 - 0.0161 + 0.0196) * 4.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_outputs() {
        let codes = ScenarioPair::new(make_codes(vec![4; 4]), make_codes(vec![0; 4])).unwrap();
        let when = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let output = pollination(&codes, &PollinationParams::default())
            .unwrap()
            .into_output(when);

        assert_eq!(output.rasters.len(), 1);
        assert_eq!(output.rasters[0].file_name, "SE_09_impollinazione_delta_euro.tiff");
        let named = output.report.unwrap();
        assert_eq!(named.file_name, "SE_impollinazione.txt");
        assert_relative_eq!(
            named.report.lookup("Impollinazione Stato attuale (€)").unwrap(),
            4.0 * 0.0161 * 4.0,
            epsilon = 1e-12
        );
        assert!(named
            .report
            .to_string()
            .contains("Variazione valore totale dell'impollinazione (€): 0"));
    }
}
