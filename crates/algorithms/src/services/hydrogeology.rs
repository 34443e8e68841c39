//! Hydrogeological protection with the SCS curve-number method.
//!
//! For each land-use class the curve number of the chosen hydrologic soil
//! group gives the potential retention and the runoff of a design storm.
//! The service is the rainfall the ground retains, `P_n − P_e`, valued as
//! water at a fixed price per cubic metre.

use super::{
    comparison_rasters, delta_section, prepare_codes, scenario_section, CodeInventory,
    EcosystemService, IntoServiceOutput, NamedReport, ServiceOutput, Years,
};
use crate::engine::{
    map_cells, reclassify_with, AreaNormalizer, LandUseCode, Scenario, ScenarioComparison,
    ScenarioPair,
};
use crate::reference::coefficients::curve_numbers;
use crate::report::Report;
use chrono::NaiveDateTime;
use ecoserv_core::raster::Raster;
use ecoserv_core::{Algorithm, Error, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Hydrologic soil group of the study area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum HydrologicGroup {
    #[default]
    A,
    B,
    C,
    D,
}

impl HydrologicGroup {
    /// Column of the curve-number table
    pub fn index(&self) -> usize {
        match self {
            HydrologicGroup::A => 0,
            HydrologicGroup::B => 1,
            HydrologicGroup::C => 2,
            HydrologicGroup::D => 3,
        }
    }
}

/// Curve-number terms of one storm on one class, mm
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunoffTerms {
    /// Potential maximum retention `S`
    pub retention: f64,
    /// Initial abstraction `IA = S / 10`
    pub initial_abstraction: f64,
    /// Net rainfall `P_n = P − IA`
    pub net_rainfall: f64,
    /// Effective runoff `P_e = P_n² / (P_n + S)`
    pub runoff: f64,
}

impl RunoffTerms {
    /// Rainfall kept by the ground, `P_n − P_e`
    pub fn retained(&self) -> f64 {
        self.net_rainfall - self.runoff
    }
}

/// Evaluate the curve-number method for one curve number.
///
/// Returns `None` for a curve number of 0 (class absent from the group).
pub fn curve_number_runoff(curve_number: f64, rainfall: f64) -> Option<RunoffTerms> {
    if curve_number <= 0.0 || !curve_number.is_finite() {
        return None;
    }
    let retention = 25400.0 / curve_number - 254.0;
    let initial_abstraction = retention / 10.0;
    // P_n is not clamped when IA exceeds the rainfall.
    let net_rainfall = rainfall - initial_abstraction;
    let denominator = net_rainfall + retention;
    let runoff = if denominator == 0.0 {
        0.0
    } else {
        net_rainfall * net_rainfall / denominator
    };
    Some(RunoffTerms {
        retention,
        initial_abstraction,
        net_rainfall,
        runoff,
    })
}

#[derive(Debug, Clone)]
pub struct HydrogeologyParams {
    pub pixel_resolution: f64,
    pub years: Years,
    /// Design rainfall, mm
    pub rainfall: f64,
    pub group: HydrologicGroup,
    /// € per cubic metre of retained water
    pub value_per_cubic_metre: f64,
}

impl Default for HydrogeologyParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            years: Years::default(),
            rainfall: 55.32,
            group: HydrologicGroup::A,
            value_per_cubic_metre: 300.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HydrogeologyResult {
    pub years: Years,
    /// Retained depth (mm) per scenario and difference
    pub comparison: ScenarioComparison,
    pub codes: CodeInventory,
    pub pixel_area: f64,
    pub present_value: f64,
    pub future_value: f64,
    pub value_delta: Raster<f64>,
}

impl HydrogeologyResult {
    fn volume(&self, depth_sum: f64) -> f64 {
        depth_sum / 1000.0 * self.pixel_area
    }
}

/// Hydrogeological protection algorithm
#[derive(Debug, Clone, Default)]
pub struct HydrogeologicalProtection;

impl Algorithm for HydrogeologicalProtection {
    type Input = ScenarioPair<LandUseCode>;
    type Output = HydrogeologyResult;
    type Params = HydrogeologyParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "HydrogeologicalProtection"
    }

    fn description(&self) -> &'static str {
        "Storm water retained by two land-use maps (SCS curve number) and its value"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        hydrogeological_protection(&input, &params)
    }
}

/// Retained rainfall per cell, valued at `value × (retained / 1000) × A`.
pub fn hydrogeological_protection(
    codes: &ScenarioPair<LandUseCode>,
    params: &HydrogeologyParams,
) -> Result<HydrogeologyResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let area = normalizer.pixel_area();
    let codes = prepare_codes(codes.present(), codes.future())?;
    let table = curve_numbers();
    let group = params.group.index();
    let rainfall = params.rainfall;

    let retained = codes.try_map(|_, c| {
        reclassify_with(c, |code| {
            table
                .get(code)
                .and_then(|cn| curve_number_runoff(cn[group], rainfall))
                .map(|terms| terms.retained())
        })
    })?;
    let value = params.value_per_cubic_metre;
    let values = retained.try_map(|_, mm| map_cells(mm, |d| value * (d / 1000.0) * area))?;
    let comparison = retained.compare_all_cells(&normalizer)?;
    let value_delta = values.delta()?;

    debug!(group = ?params.group, rainfall, "curve-number retention computed");
    info!(delta = value_delta.sum(), "hydrogeological protection valued");

    Ok(HydrogeologyResult {
        years: params.years,
        comparison,
        codes: CodeInventory::of(&codes),
        pixel_area: area,
        present_value: values.present().sum(),
        future_value: values.future().sum(),
        value_delta,
    })
}

impl IntoServiceOutput for HydrogeologyResult {
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput {
        let service = EcosystemService::HydrogeologicalProtection;
        let mut report = Report::new(
            "Sommario dell'analisi della protezione idrogeologica",
            generated,
        );
        for scenario in Scenario::ALL {
            let depth = self.comparison.get(scenario).aggregates.sum;
            let (state, value) = match scenario {
                Scenario::Present => ("stato attuale", self.present_value),
                Scenario::Future => ("stato di progetto", self.future_value),
            };
            report = report.section(
                scenario_section(scenario, &self.years)
                    .value(format!("Protezione idrogeologica {} (mm)", state), depth)
                    .value(
                        format!(
                            "Protezione idrogeologica sulla superficie totale - {} (mc)",
                            scenario.report_label()
                        ),
                        self.volume(depth),
                    )
                    .value("Valore totale della protezione idrogeologica (€/anno)", value)
                    .blank()
                    .codes("Elenco LuCode area in esame", self.codes.get(scenario)),
            );
        }
        let delta = self.comparison.delta.aggregates.sum;
        report = report.section(
            delta_section(&self.years)
                .value("Differenza della protezione idrogeologica (mm)", delta)
                .value(
                    "Differenza della protezione idrogeologica sulla superficie totale (mc)",
                    self.volume(delta),
                )
                .whole(
                    "Differenza in termini economici del SE di protezione idrogeologica (stato di progetto – stato attuale) (€)",
                    self.value_delta.sum(),
                ),
        );

        ServiceOutput {
            rasters: comparison_rasters(
                service,
                "protezione_idrogeologica",
                Some("mm"),
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
