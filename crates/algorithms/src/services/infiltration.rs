//! Rainfall infiltration and its economic value
//!
//! Infiltration is what remains of a design rainfall after surface runoff
//! and canopy interception:
//!
//! ```text
//! I = rain − R[c] − Sv
//! ```
//!
//! Canopy interception follows the storage model
//! `Sv = Smax · (1 − exp(−ν · rain / Smax))`.

use super::{
    delta_section, scenario_section, EcosystemService, IntoServiceOutput, NamedRaster,
    NamedReport, ServiceOutput, Years,
};
use crate::engine::{
    clean_negative, map_cells, reclassify_with, AreaNormalizer, CanopyMode, LandUseCode,
    Scenario, ScenarioComparison, ScenarioPair,
};
use crate::reference::coefficients::{leaf_area_index, runoff_mm};
use crate::report::Report;
use chrono::NaiveDateTime;
use ecoserv_core::raster::Raster;
use ecoserv_core::{Algorithm, Error, Result};
use tracing::{debug, info};

/// Canopy interception (mm) of a canopy with leaf area index `lai` and
/// extent `n` under `rainfall` mm.
///
/// `n` is a number of trees in species mode and a pixel area in land-use
/// mode.
pub fn canopy_interception(lai: f64, n: f64, rainfall: f64) -> f64 {
    let load = lai * n;
    let max_storage = 0.935 + 0.498 * load - 0.00575 * load;
    if max_storage <= 0.0 {
        return 0.0;
    }
    let nu = 0.046 * load;
    max_storage * (1.0 - (-nu * rainfall / max_storage).exp())
}

/// Parameters for infiltration
#[derive(Debug, Clone)]
pub struct InfiltrationParams {
    /// Design rainfall, mm
    pub rainfall: f64,
    pub pixel_resolution: f64,
    pub scenario: Scenario,
    pub canopy: CanopyMode,
}

impl Default for InfiltrationParams {
    fn default() -> Self {
        Self {
            rainfall: 55.32,
            pixel_resolution: 2.0,
            scenario: Scenario::Present,
            canopy: CanopyMode::LandUse,
        }
    }
}

/// Infiltration of one land-use map
#[derive(Debug, Clone)]
pub struct InfiltrationResult {
    pub scenario: Scenario,
    /// Infiltrated depth, mm
    pub infiltration: Raster<f64>,
    /// Interception of the tree census, applied to every cell (species mode only)
    pub species_interception: Option<f64>,
}

/// Infiltration algorithm
#[derive(Debug, Clone, Default)]
pub struct Infiltration;

impl Algorithm for Infiltration {
    type Input = Raster<LandUseCode>;
    type Output = InfiltrationResult;
    type Params = InfiltrationParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Infiltration"
    }

    fn description(&self) -> &'static str {
        "Rainfall left after runoff and canopy interception on a land-use map"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        infiltration(&input, &params)
    }
}

/// Compute infiltration for every cell.
///
/// In species mode the interception of all trees is summed once and
/// subtracted from every cell. In land-use mode each class intercepts with
/// its own leaf area index over one pixel. Classes without runoff data
/// count as zero runoff.
pub fn infiltration(codes: &Raster<LandUseCode>, params: &InfiltrationParams) -> Result<InfiltrationResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let area = normalizer.pixel_area();
    let rain = params.rainfall;
    let codes = clean_negative(codes);
    let runoff = runoff_mm();

    let species_interception = match &params.canopy {
        CanopyMode::Species(selection) => Some(
            selection
                .active()
                .map(|s| canopy_interception(s.coefficients().leaf_area_index, f64::from(s.count), rain))
                .sum::<f64>(),
        ),
        CanopyMode::LandUse => None,
    };

    let lai = leaf_area_index();
    let raster = reclassify_with(&codes, |code| {
        let intercepted = match species_interception {
            Some(sv) => sv,
            None => lai
                .get(code)
                .map(|l| canopy_interception(l, area, rain))
                .unwrap_or(0.0),
        };
        Some(rain - runoff.value_or_zero(code) - intercepted)
    })?;

    debug!(?species_interception, sum = raster.sum(), "infiltration totals");
    info!(scenario = %params.scenario, "infiltration computed");

    Ok(InfiltrationResult {
        scenario: params.scenario,
        infiltration: raster,
        species_interception,
    })
}

impl IntoServiceOutput for InfiltrationResult {
    fn into_output(self, _generated: NaiveDateTime) -> ServiceOutput {
        let file_name = EcosystemService::Infiltration.scenario_file_name(
            "infiltrazione",
            self.scenario,
            Some("mm"),
        );
        ServiceOutput {
            rasters: vec![NamedRaster::new(file_name, self.infiltration)],
            report: None,
            message: "Completed".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InfiltrationValueParams {
    pub pixel_resolution: f64,
    pub years: Years,
    /// € per cubic metre of water
    pub value_per_cubic_metre: f64,
}

impl Default for InfiltrationValueParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            years: Years::default(),
            value_per_cubic_metre: 300.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InfiltrationValueResult {
    pub years: Years,
    /// Infiltrated depth (mm) per scenario and difference
    pub comparison: ScenarioComparison,
    pub pixel_area: f64,
    pub present_value: f64,
    pub future_value: f64,
    pub value_delta: Raster<f64>,
}

impl InfiltrationValueResult {
    /// Water volume (m³) of a depth sum in mm
    fn volume(&self, depth_sum: f64) -> f64 {
        depth_sum / 1000.0 * self.pixel_area
    }
}

/// Infiltration value algorithm
#[derive(Debug, Clone, Default)]
pub struct InfiltrationValue;

impl Algorithm for InfiltrationValue {
    type Input = ScenarioPair<f64>;
    type Output = InfiltrationValueResult;
    type Params = InfiltrationValueParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "InfiltrationValue"
    }

    fn description(&self) -> &'static str {
        "Economic value of the infiltration difference between two scenarios"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        infiltration_value(&input, &params)
    }
}

/// Value two infiltration rasters at `value × (mm / 1000) × A` per cell.
pub fn infiltration_value(
    depths: &ScenarioPair<f64>,
    params: &InfiltrationValueParams,
) -> Result<InfiltrationValueResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let area = normalizer.pixel_area();
    let value = params.value_per_cubic_metre;

    let values = depths.try_map(|_, mm| map_cells(mm, |d| value * (d / 1000.0) * area))?;
    let comparison = depths.compare_all_cells(&normalizer)?;
    let value_delta = values.delta()?;

    info!(delta = value_delta.sum(), "infiltration valued");
    Ok(InfiltrationValueResult {
        years: params.years,
        comparison,
        pixel_area: area,
        present_value: values.present().sum(),
        future_value: values.future().sum(),
        value_delta,
    })
}

impl IntoServiceOutput for InfiltrationValueResult {
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput {
        let service = EcosystemService::Infiltration;
        let mut report = Report::new("Sommario dell'analisi dell'infiltrazione", generated);
        for scenario in Scenario::ALL {
            let depth = self.comparison.get(scenario).aggregates.sum;
            let (state, value) = match scenario {
                Scenario::Present => ("stato attuale", self.present_value),
                Scenario::Future => ("stato di progetto", self.future_value),
            };
            report = report.section(
                scenario_section(scenario, &self.years)
                    .value(format!("Infiltrazione {} (mm)", state), depth)
                    .value(
                        format!(
                            "Infiltrazione sulla superficie totale - {} (mc)",
                            scenario.report_label()
                        ),
                        self.volume(depth),
                    )
                    .value("Valore totale dell'infiltrazione (€/anno)", value),
            );
        }
        let delta = self.comparison.delta.aggregates.sum;
        report = report.section(
            delta_section(&self.years)
                .value("Differenza della infiltrazione (mm)", delta)
                .value(
                    "Differenza della infiltrazione sulla superficie totale (mc)",
                    self.volume(delta),
                )
                .whole(
                    "Differenza in termini economici del SE di infiltrazione (stato di progetto – stato attuale) (€)",
                    self.value_delta.sum(),
                ),
        );

        ServiceOutput {
            rasters: vec![NamedRaster::new(service.delta_file_name(), self.value_delta)],
            report: Some(NamedReport {
                file_name: service.report_file_name(),
                report,
            }),
            message: "Completed".into(),
        }
    }
}
