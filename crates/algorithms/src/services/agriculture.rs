//! Agricultural production and its market value
//!
//! Production is `P[c] · A` tonnes per cell. Prices per tonne come from a
//! user-supplied list (see [`crate::reference::load_price_table`]); every
//! productive class present in a map must have a price.

use super::{
    comparison_rasters, delta_section, prepare_codes, scenario_section, CodeInventory,
    EcosystemService, IntoServiceOutput, NamedReport, ServiceOutput, Years,
};
use crate::engine::{
    count_recognized, reclassify, reclassify_with, unique_codes, AreaNormalizer, CodeTable,
    LandUseCode, Scenario, ScenarioComparison, ScenarioPair, ValidPixels,
};
use crate::reference::coefficients::agricultural_production;
use crate::report::Report;
use chrono::NaiveDateTime;
use ecoserv_core::raster::Raster;
use ecoserv_core::{Algorithm, Error, Result};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct AgricultureParams {
    pub pixel_resolution: f64,
    pub years: Years,
    /// € per tonne by land-use code
    pub prices: CodeTable,
}

impl Default for AgricultureParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            years: Years::default(),
            prices: CodeTable::new("agricultural_price"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgricultureResult {
    pub years: Years,
    /// Production (t) per scenario and difference, per m² over legend cells
    pub comparison: ScenarioComparison,
    pub codes: CodeInventory,
    pub pixel_area: f64,
    pub present_value: f64,
    pub future_value: f64,
    pub value_delta: Raster<f64>,
}

/// Agricultural production algorithm
#[derive(Debug, Clone, Default)]
pub struct AgriculturalProduction;

impl Algorithm for AgriculturalProduction {
    type Input = ScenarioPair<LandUseCode>;
    type Output = AgricultureResult;
    type Params = AgricultureParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "AgriculturalProduction"
    }

    fn description(&self) -> &'static str {
        "Crop production of two land-use maps and the market value of their difference"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        agricultural_production_value(&input, &params)
    }
}

/// Fail on the first productive code of `codes` without a price.
fn check_prices(codes: &Raster<LandUseCode>, production: &CodeTable, prices: &CodeTable) -> Result<()> {
    match unique_codes(codes)
        .into_iter()
        .find(|&code| production.value_or_zero(code) != 0.0 && !prices.contains(code))
    {
        Some(code) => Err(Error::MissingCoefficient {
            table: prices.name(),
            code,
        }),
        None => Ok(()),
    }
}

/// Production `P[c] · A` and value `price[c] · P[c] · A` of both scenarios.
pub fn agricultural_production_value(
    codes: &ScenarioPair<LandUseCode>,
    params: &AgricultureParams,
) -> Result<AgricultureResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let area = normalizer.pixel_area();
    let codes = prepare_codes(codes.present(), codes.future())?;
    let production = agricultural_production();
    let prices = &params.prices;

    check_prices(codes.present(), &production, prices)?;
    check_prices(codes.future(), &production, prices)?;

    let tonnes = codes.try_map(|_, c| reclassify(c, &production, area))?;
    let values = codes.try_map(|_, c| {
        reclassify_with(c, |code| {
            let price = prices.get(code)?;
            production.get(code).map(|p| price * p * area)
        })
    })?;

    let valid = ValidPixels::new(
        count_recognized(codes.present(), &production),
        count_recognized(codes.future(), &production),
    );
    let comparison = tonnes.compare(valid, &normalizer)?;
    let value_delta = values.delta()?;

    debug!(priced_codes = prices.len(), "agricultural prices");
    info!(delta = value_delta.sum(), "agricultural production valued");

    Ok(AgricultureResult {
        years: params.years,
        comparison,
        codes: CodeInventory::of(&codes),
        pixel_area: area,
        present_value: values.present().sum(),
        future_value: values.future().sum(),
        value_delta,
    })
}

impl IntoServiceOutput for AgricultureResult {
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput {
        let service = EcosystemService::AgriculturalProduction;
        let per_square_metre = |sum: f64, pixels: usize| {
            if pixels == 0 {
                0.0
            } else {
                sum / (pixels as f64 * self.pixel_area)
            }
        };

        let mut report = Report::new("Sommario dell'analisi della produzione agricola", generated);
        for scenario in Scenario::ALL {
            let tonnes = &self.comparison.get(scenario).aggregates;
            let (state, value) = match scenario {
                Scenario::Present => ("stato attuale", self.present_value),
                Scenario::Future => ("stato di progetto", self.future_value),
            };
            report = report.section(
                scenario_section(scenario, &self.years)
                    .value(format!("Produzione agricola {} (ton/anno)", state), tonnes.sum)
                    .value(
                        format!(
                            "Produzione agricola per unità di superficie - {} (ton/mq * anno)",
                            scenario.report_label()
                        ),
                        per_square_metre(tonnes.sum, tonnes.valid_pixels),
                    )
                    .value("Valore totale della produzione agricola (€/anno)", value)
                    .blank()
                    .codes("Elenco LuCode area in esame", self.codes.get(scenario)),
            );
        }
        let delta = &self.comparison.delta.aggregates;
        report = report.section(
            delta_section(&self.years)
                .value("Differenza della produzione agricola (ton/anno)", delta.sum)
                .value(
                    "Differenza della produzione agricola per unità di superficie (ton/mq * anno)",
                    per_square_metre(delta.sum, delta.valid_pixels),
                )
                .whole(
                    "Differenza in termini economici del SE di produzione agricola (stato di progetto – stato attuale) (€)",
                    self.value_delta.sum(),
                ),
        );

        ServiceOutput {
            rasters: comparison_rasters(
                service,
                "produzione_agricola",
                Some("ton"),
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
