//! Carbon stock and the economic value of carbon sequestration
//!
//! The stock is soil carbon plus above-ground carbon. Above-ground carbon
//! comes either from an explicit tree census spread over tree-eligible
//! cells, or from average coefficients per land-use class.
//!
//! Sequestration compares two stock rasters and discounts the yearly gain
//! over the years between the scenarios.

use super::{
    delta_section, scenario_section, EcosystemService, IntoServiceOutput, NamedRaster,
    NamedReport, ServiceOutput, Years,
};
use crate::engine::{
    clean_negative, combine, count_in_set, distribute_over_eligible, map_cells, reclassify,
    AreaNormalizer, CanopyMode, LandUseCode, Scenario, ScenarioComparison, ScenarioPair,
};
use crate::reference::coefficients::{above_ground_carbon, soil_carbon};
use crate::reference::tree_codes;
use crate::report::Report;
use chrono::NaiveDateTime;
use ecoserv_core::raster::Raster;
use ecoserv_core::{Algorithm, Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Outcome of the tree-density check of a carbon-stock run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CarbonAdvisory {
    Completed,
    /// Trees were given but no cell has a tree-eligible code
    TreesOnUnsupportedLandUse,
    /// No cell has a tree-eligible code
    NoTreeLandUse,
    /// More trees than one per square metre of eligible area
    TreeDensityExceeded,
}

impl CarbonAdvisory {
    fn assess(canopy: &CanopyMode, eligible: usize, normalizer: &AreaNormalizer) -> Self {
        if eligible == 0 {
            if canopy.is_species() {
                CarbonAdvisory::TreesOnUnsupportedLandUse
            } else {
                CarbonAdvisory::NoTreeLandUse
            }
        } else if canopy.total_trees() as f64 / normalizer.covered_area(eligible) > 1.0 {
            CarbonAdvisory::TreeDensityExceeded
        } else {
            CarbonAdvisory::Completed
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CarbonAdvisory::Completed)
    }

    pub fn message(&self) -> &'static str {
        match self {
            CarbonAdvisory::Completed => "Completed",
            CarbonAdvisory::TreesOnUnsupportedLandUse => {
                "Trees were assigned to land-use codes that cannot host them"
            }
            CarbonAdvisory::NoTreeLandUse => "No land-use code in the map accepts trees",
            CarbonAdvisory::TreeDensityExceeded => {
                "The number of trees exceeds what the eligible area can hold"
            }
        }
    }
}

impl fmt::Display for CarbonAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Parameters for the carbon stock
#[derive(Debug, Clone)]
pub struct CarbonStockParams {
    /// Pixel side in metres
    pub pixel_resolution: f64,
    /// Scenario the map describes, used for naming the output
    pub scenario: Scenario,
    pub canopy: CanopyMode,
}

impl Default for CarbonStockParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            scenario: Scenario::Present,
            canopy: CanopyMode::LandUse,
        }
    }
}

/// Carbon stock of one land-use map
#[derive(Debug, Clone)]
pub struct CarbonStockResult {
    pub scenario: Scenario,
    /// Soil plus above-ground carbon, t per cell
    pub total: Raster<f64>,
    pub soil: Raster<f64>,
    pub above_ground: Raster<f64>,
    /// Cells with a tree-eligible code
    pub eligible_pixels: usize,
    pub advisory: CarbonAdvisory,
}

/// Carbon stock algorithm
#[derive(Debug, Clone, Default)]
pub struct CarbonStock;

impl Algorithm for CarbonStock {
    type Input = Raster<LandUseCode>;
    type Output = CarbonStockResult;
    type Params = CarbonStockParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CarbonStock"
    }

    fn description(&self) -> &'static str {
        "Soil and above-ground carbon stored in each cell of a land-use map"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        carbon_stock(&input, &params)
    }
}

/// Compute the carbon stock of a land-use map.
///
/// Soil carbon is `c_soil[code] × A`. Above-ground carbon is
/// `c_above[code] × A` in land-use mode; in species mode the yearly
/// sequestration of all trees (`Σ rate × count`) is spread evenly over the
/// tree-eligible cells.
pub fn carbon_stock(codes: &Raster<LandUseCode>, params: &CarbonStockParams) -> Result<CarbonStockResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let area = normalizer.pixel_area();
    let codes = clean_negative(codes);
    let trees = tree_codes();

    let soil = reclassify(&codes, &soil_carbon(), area)?;
    let (above_ground, eligible_pixels) = match &params.canopy {
        CanopyMode::Species(selection) => {
            let total = selection.weighted_sum(|c| c.carbon_rate);
            distribute_over_eligible(&codes, &trees, total)?
        }
        CanopyMode::LandUse => (
            reclassify(&codes, &above_ground_carbon(), area)?,
            count_in_set(&codes, &trees),
        ),
    };
    let total = combine(&soil, &above_ground, |s, a| s + a)?;

    let advisory = CarbonAdvisory::assess(&params.canopy, eligible_pixels, &normalizer);
    if advisory.is_completed() {
        info!(scenario = %params.scenario, total = total.sum(), "carbon stock computed");
    } else {
        warn!(scenario = %params.scenario, eligible_pixels, "{}", advisory);
    }
    debug!(soil = soil.sum(), above_ground = above_ground.sum(), "carbon stock components");

    Ok(CarbonStockResult {
        scenario: params.scenario,
        total,
        soil,
        above_ground,
        eligible_pixels,
        advisory,
    })
}

impl IntoServiceOutput for CarbonStockResult {
    fn into_output(self, _generated: NaiveDateTime) -> ServiceOutput {
        let file_name = format!("01_carbonio_{}_ton.tiff", self.scenario.file_label());
        ServiceOutput {
            rasters: vec![NamedRaster::new(file_name, self.total)],
            report: None,
            message: self.advisory.message().to_string(),
        }
    }
}

/// Discount coefficient `Σ_{y=0}^{span-1} 1 / ((1 + r)^y (1 + c)^y)`.
///
/// `discount_rate` and `capitalization_rate` are percentages.
pub fn discount_coefficient(span: u32, discount_rate: f64, capitalization_rate: f64) -> f64 {
    let r = 1.0 + discount_rate / 100.0;
    let c = 1.0 + capitalization_rate / 100.0;
    (0..span)
        .map(|y| {
            let y = y as i32;
            1.0 / (r.powi(y) * c.powi(y))
        })
        .sum()
}

/// Parameters for the carbon sequestration value
#[derive(Debug, Clone)]
pub struct CarbonSequestrationParams {
    pub pixel_resolution: f64,
    pub years: Years,
    /// € per tonne of carbon
    pub price_per_tonne: f64,
    /// Discount rate, %
    pub discount_rate: f64,
    /// Capitalization rate, %
    pub capitalization_rate: f64,
}

impl Default for CarbonSequestrationParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            years: Years::default(),
            price_per_tonne: 81.84,
            discount_rate: 0.0,
            capitalization_rate: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CarbonSequestrationResult {
    pub years: Years,
    /// Carbon stocks and their difference, per hectare over the whole grid
    pub comparison: ScenarioComparison,
    /// Euro value of the yearly stock difference
    pub value_delta: Raster<f64>,
    pub coefficient: f64,
    /// Euro value of each scenario's stock
    pub present_value: f64,
    pub future_value: f64,
}

/// Carbon sequestration value algorithm
#[derive(Debug, Clone, Default)]
pub struct CarbonSequestration;

impl Algorithm for CarbonSequestration {
    type Input = ScenarioPair<f64>;
    type Output = CarbonSequestrationResult;
    type Params = CarbonSequestrationParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CarbonSequestration"
    }

    fn description(&self) -> &'static str {
        "Economic value of the carbon stock difference between two scenarios"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        carbon_sequestration(&input, &params)
    }
}

/// Value the difference between two carbon-stock rasters.
///
/// Each cell of the delta raster is `price × (future − present) / span × coefficient`.
pub fn carbon_sequestration(
    stocks: &ScenarioPair<f64>,
    params: &CarbonSequestrationParams,
) -> Result<CarbonSequestrationResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let years = params.years.span()?;
    let coefficient = discount_coefficient(years, params.discount_rate, params.capitalization_rate);
    let span = f64::from(years);
    let price = params.price_per_tonne;

    let comparison = stocks.compare_all_cells(&normalizer)?;
    let value_delta = map_cells(&comparison.delta.raster, |d| price * d / span * coefficient)?;
    let value_of = |sum: f64| sum * price * coefficient / span;

    let result = CarbonSequestrationResult {
        years: params.years,
        present_value: value_of(comparison.present.aggregates.sum),
        future_value: value_of(comparison.future.aggregates.sum),
        value_delta,
        coefficient,
        comparison,
    };
    info!(
        coefficient,
        delta = result.value_delta.sum(),
        "carbon sequestration valued"
    );
    Ok(result)
}

impl IntoServiceOutput for CarbonSequestrationResult {
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput {
        let service = EcosystemService::CarbonSequestration;
        let mut report = Report::new("Sommario dell'analisi del sequestro di carbonio", generated);
        for scenario in Scenario::ALL {
            let stock = &self.comparison.get(scenario).aggregates;
            let value = match scenario {
                Scenario::Present => self.present_value,
                Scenario::Future => self.future_value,
            };
            let label = scenario.report_label();
            report = report.section(
                scenario_section(scenario, &self.years)
                    .value(format!("Sequestro carbonio {} (ton Corg)", label), stock.sum)
                    .value(
                        format!(
                            "Valore medio del carbonio sequestrato per unità di superficie - {} (ton Corg/ha)",
                            label
                        ),
                        stock.per_hectare,
                    )
                    .value("Valore totale del sequestro di carbonio (€)", value),
            );
        }
        let delta = &self.comparison.delta.aggregates;
        report = report.section(
            delta_section(&self.years)
                .value("Differenza di sequestro carbonio (ton Corg)", delta.sum)
                .value(
                    "Differenza carbonio sequestrato per unità di superficie (ton Corg/ha)",
                    delta.per_hectare,
                )
                .whole(
                    "Differenza in termini economici del SE di sequestro di carbonio (stato di progetto – stato attuale) (€)",
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
