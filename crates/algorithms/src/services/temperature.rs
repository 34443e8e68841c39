//! Temperature regulation by heat mitigation.

use super::{
    comparison_rasters, delta_section, prepare_codes, scenario_section, EcosystemService,
    IntoServiceOutput, NamedReport, ServiceOutput, Years,
};
use crate::engine::{
    count_recognized, map_cells, reclassify, AreaNormalizer, LandUseCode, Scenario,
    ScenarioComparison, ScenarioPair, ValidPixels,
};
use crate::reference::coefficients::heat_mitigation;
use crate::report::Report;
use chrono::NaiveDateTime;
use ecoserv_core::raster::Raster;
use ecoserv_core::{Algorithm, Error, Result};
use tracing::info;

#[derive(Debug, Clone)]
pub struct TemperatureParams {
    pub pixel_resolution: f64,
    pub years: Years,
    /// € per unit of heat mitigation and square metre
    pub unit_value: f64,
    /// Share of the unit value attributed to the service
    pub value_share: f64,
}

impl Default for TemperatureParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            years: Years::default(),
            unit_value: 1.6,
            value_share: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemperatureResult {
    pub years: Years,
    /// Heat mitigation `HM[c] × A` per scenario and difference
    pub comparison: ScenarioComparison,
    pub euro_per_unit: f64,
    pub value_delta: Raster<f64>,
}

/// Temperature regulation algorithm
#[derive(Debug, Clone, Default)]
pub struct TemperatureRegulation;

impl Algorithm for TemperatureRegulation {
    type Input = ScenarioPair<LandUseCode>;
    type Output = TemperatureResult;
    type Params = TemperatureParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "TemperatureRegulation"
    }

    fn description(&self) -> &'static str {
        "Heat mitigation of two land-use maps and the value of their difference"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        temperature_regulation(&input, &params)
    }
}

/// Heat mitigation `HM[c] × A`, valued at `HM × A × unit_value × value_share`.
pub fn temperature_regulation(
    codes: &ScenarioPair<LandUseCode>,
    params: &TemperatureParams,
) -> Result<TemperatureResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let codes = prepare_codes(codes.present(), codes.future())?;
    let table = heat_mitigation();

    let mitigation = codes.try_map(|_, c| reclassify(c, &table, normalizer.pixel_area()))?;
    let valid = ValidPixels::new(
        count_recognized(codes.present(), &table),
        count_recognized(codes.future(), &table),
    );
    let comparison = mitigation.compare(valid, &normalizer)?;

    let euro_per_unit = params.unit_value * params.value_share;
    let value_delta = map_cells(&comparison.delta.raster, |d| d * euro_per_unit)?;

    info!(delta = value_delta.sum(), "temperature regulation valued");
    Ok(TemperatureResult {
        years: params.years,
        comparison,
        euro_per_unit,
        value_delta,
    })
}

impl IntoServiceOutput for TemperatureResult {
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput {
        let service = EcosystemService::TemperatureRegulation;
        let mut report = Report::new(
            "Sommario dell'analisi della regolazione della temperatura",
            generated,
        );
        for scenario in Scenario::ALL {
            let sum = self.comparison.get(scenario).aggregates.sum;
            report = report.section(
                scenario_section(scenario, &self.years)
                    .value(
                        format!("Regolazione della temperatura {}", scenario.report_label()),
                        sum,
                    )
                    .value(
                        "Valore totale della regolazione della temperatura (€)",
                        sum * self.euro_per_unit,
                    ),
            );
        }
        report = report.section(
            delta_section(&self.years)
                .value(
                    "Differenza di regolazione della temperatura",
                    self.comparison.delta.aggregates.sum,
                )
                .whole(
                    "Differenza in termini economici del SE di regolazione della temperatura (stato di progetto – stato attuale) (€)",
                    self.value_delta.sum(),
                ),
        );

        ServiceOutput {
            rasters: comparison_rasters(
                service,
                "regolazione_temperatura",
                None,
                &self.comparison,
                self.value_delta,
            ),
            report: Some(NamedReport {
                file_name: service.report_file_name(),
                report,
            }),
            message: "Completed".into(),
        }
    }
}
