//! Air pollutant removal by vegetation and its economic value
//!
//! Removal is computed for ozone, PM10 and NO2 on one land-use map. Ozone
//! and PM10 follow the canopy mode; NO2 always uses the per-class
//! deposition model `α + β·wind`.

use super::{
    delta_section, scenario_section, EcosystemService, IntoServiceOutput, NamedRaster,
    NamedReport, ServiceOutput, Years,
};
use crate::engine::{
    clean_negative, combine, count_in_set, distribute_over_eligible, reclassify,
    reclassify_with, sum_rasters, AreaNormalizer, CanopyMode, LandUseCode, Scenario,
    ScenarioComparison, ScenarioPair,
};
use crate::reference::coefficients::{
    growing_season_seconds, leaf_area_index, no2_deposition, ozone_removal,
};
use crate::reference::tree_codes;
use crate::report::Report;
use chrono::NaiveDateTime;
use ecoserv_core::raster::Raster;
use ecoserv_core::{Algorithm, Error, Result};
use serde::Serialize;
use tracing::{debug, info};

/// PM10 dry deposition velocity, m/s
pub const DRY_DEPOSITION_VELOCITY: f64 = 0.064;

/// Fraction of the deposited PM10 that stays on the leaves
const PM10_RETENTION: f64 = 0.5;

/// Grams per kilogram
const GRAMS_PER_KG: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Pollutant {
    Ozone,
    Pm10,
    No2,
}

impl Pollutant {
    pub const ALL: [Pollutant; 3] = [Pollutant::Ozone, Pollutant::Pm10, Pollutant::No2];

    /// Name used in file names
    pub fn file_label(&self) -> &'static str {
        match self {
            Pollutant::Ozone => "ozono",
            Pollutant::Pm10 => "pm10",
            Pollutant::No2 => "no2",
        }
    }

    /// Name used in reports
    pub fn report_label(&self) -> &'static str {
        match self {
            Pollutant::Ozone => "ozono",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
        }
    }

    /// `02_rimozione_<pollutant>_<scenario>_kg.tiff`
    pub fn removal_file_name(&self, scenario: Scenario) -> String {
        EcosystemService::PollutantRemoval.scenario_file_name(
            &format!("rimozione_{}", self.file_label()),
            scenario,
            Some("kg"),
        )
    }
}

/// Parameters for pollutant removal
#[derive(Debug, Clone)]
pub struct PollutantRemovalParams {
    pub pixel_resolution: f64,
    pub scenario: Scenario,
    /// Mean NO2 concentration, µg/m³
    pub no2_concentration: f64,
    /// Mean PM10 concentration, µg/m³
    pub pm10_concentration: f64,
    /// Mean wind speed, m/s
    pub wind_speed: f64,
    pub canopy: CanopyMode,
}

impl Default for PollutantRemovalParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            scenario: Scenario::Present,
            no2_concentration: 43.72,
            pm10_concentration: 30.0,
            wind_speed: 1.4,
            canopy: CanopyMode::LandUse,
        }
    }
}

/// Removal rasters of one land-use map
#[derive(Debug, Clone)]
pub struct PollutantRemovalResult {
    pub scenario: Scenario,
    pub ozone: Raster<f64>,
    pub pm10: Raster<f64>,
    pub no2: Raster<f64>,
    /// Cells with a tree-eligible code
    pub eligible_pixels: usize,
}

impl PollutantRemovalResult {
    pub fn get(&self, pollutant: Pollutant) -> &Raster<f64> {
        match pollutant {
            Pollutant::Ozone => &self.ozone,
            Pollutant::Pm10 => &self.pm10,
            Pollutant::No2 => &self.no2,
        }
    }
}

/// Pollutant removal algorithm
#[derive(Debug, Clone, Default)]
pub struct PollutantRemoval;

impl Algorithm for PollutantRemoval {
    type Input = Raster<LandUseCode>;
    type Output = PollutantRemovalResult;
    type Params = PollutantRemovalParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "PollutantRemoval"
    }

    fn description(&self) -> &'static str {
        "Ozone, PM10 and NO2 removed by the vegetation of a land-use map"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        pollutant_removal(&input, &params)
    }
}

/// Compute ozone, PM10 and NO2 removal.
///
/// Species mode:
/// ```text
/// ozone = Σ(ozone_rate × n) / 1e7 / E
/// pm10  = C_pm10 × vd × Σ(days × LAI × n) / E
/// ```
/// on the E tree-eligible cells. Land-use mode:
/// ```text
/// ozone = ozone[c] × A / 1e6 × 1000
/// pm10  = C_pm10 × vd × season[c] × LAI[c] × A × 0.5 / 1e12 × 1000
/// ```
/// NO2 in both modes is `(α[c] + β[c] × wind) × C_no2 × 0.365 / 1e4 × 1000`.
pub fn pollutant_removal(
    codes: &Raster<LandUseCode>,
    params: &PollutantRemovalParams,
) -> Result<PollutantRemovalResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let area = normalizer.pixel_area();
    let codes = clean_negative(codes);
    let trees = tree_codes();
    let deposition = DRY_DEPOSITION_VELOCITY * params.pm10_concentration;

    let (ozone, pm10, eligible_pixels) = match &params.canopy {
        CanopyMode::Species(selection) => {
            let ozone_total = selection.weighted_sum(|c| c.ozone_rate) / 1.0e7;
            let pm10_total =
                deposition * selection.weighted_sum(|c| c.growing_season_days * c.leaf_area_index);
            let (ozone, eligible) = distribute_over_eligible(&codes, &trees, ozone_total)?;
            let (pm10, _) = distribute_over_eligible(&codes, &trees, pm10_total)?;
            (ozone, pm10, eligible)
        }
        CanopyMode::LandUse => {
            let ozone = reclassify(&codes, &ozone_removal(), area / 1.0e6 * GRAMS_PER_KG)?;
            let capture = growing_season_seconds()
                .zip_with(&leaf_area_index(), "pm10_capture", |season, lai| season * lai);
            let pm10 = reclassify(
                &codes,
                &capture,
                deposition * area * PM10_RETENTION / 1.0e12 * GRAMS_PER_KG,
            )?;
            (ozone, pm10, count_in_set(&codes, &trees))
        }
    };

    let no2_table = no2_deposition();
    let no2_scale = params.no2_concentration * 0.365 / 1.0e4 * GRAMS_PER_KG;
    let wind = params.wind_speed;
    let no2 = reclassify_with(&codes, |code| {
        no2_table
            .get(code)
            .map(|d| (d.alpha + d.beta * wind) * no2_scale)
    })?;

    debug!(
        ozone = ozone.sum(),
        pm10 = pm10.sum(),
        no2 = no2.sum(),
        "pollutant removal totals"
    );
    info!(scenario = %params.scenario, eligible_pixels, "pollutant removal computed");

    Ok(PollutantRemovalResult {
        scenario: params.scenario,
        ozone,
        pm10,
        no2,
        eligible_pixels,
    })
}

impl IntoServiceOutput for PollutantRemovalResult {
    fn into_output(self, _generated: NaiveDateTime) -> ServiceOutput {
        let scenario = self.scenario;
        ServiceOutput {
            rasters: vec![
                NamedRaster::new(Pollutant::Ozone.removal_file_name(scenario), self.ozone),
                NamedRaster::new(Pollutant::Pm10.removal_file_name(scenario), self.pm10),
                NamedRaster::new(Pollutant::No2.removal_file_name(scenario), self.no2),
            ],
            report: None,
            message: "Completed".into(),
        }
    }
}

/// Removal rasters of both scenarios, one pair per pollutant
#[derive(Debug, Clone)]
pub struct PollutantPairs {
    pub ozone: ScenarioPair<f64>,
    pub pm10: ScenarioPair<f64>,
    pub no2: ScenarioPair<f64>,
}

impl PollutantPairs {
    /// Pair the three pollutants, rejecting rasters on different grids.
    pub fn new(
        ozone: ScenarioPair<f64>,
        pm10: ScenarioPair<f64>,
        no2: ScenarioPair<f64>,
    ) -> Result<Self> {
        ozone.present().check_same_grid(pm10.present())?;
        ozone.present().check_same_grid(no2.present())?;
        Ok(Self { ozone, pm10, no2 })
    }

    pub fn get(&self, pollutant: Pollutant) -> &ScenarioPair<f64> {
        match pollutant {
            Pollutant::Ozone => &self.ozone,
            Pollutant::Pm10 => &self.pm10,
            Pollutant::No2 => &self.no2,
        }
    }
}

/// Social cost of each pollutant, € per tonne
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PollutantPrices {
    pub ozone: f64,
    pub pm10: f64,
    pub no2: f64,
}

impl PollutantPrices {
    pub fn get(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Ozone => self.ozone,
            Pollutant::Pm10 => self.pm10,
            Pollutant::No2 => self.no2,
        }
    }
}

impl Default for PollutantPrices {
    fn default() -> Self {
        Self {
            ozone: 14658.11,
            pm10: 17132.56,
            no2: 77641.89,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollutantValueParams {
    pub pixel_resolution: f64,
    pub years: Years,
    pub prices: PollutantPrices,
}

impl Default for PollutantValueParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            years: Years::default(),
            prices: PollutantPrices::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollutantValueResult {
    pub years: Years,
    /// Removal totals per scenario, `[ozone, pm10, no2]`
    pub removal: [(Pollutant, f64, f64); 3],
    /// Summed removal of the three pollutants
    pub comparison: ScenarioComparison,
    pub present_value: f64,
    pub future_value: f64,
    /// `Σ (future − present) × price` per cell
    pub value_delta: Raster<f64>,
}

/// Pollutant removal value algorithm
#[derive(Debug, Clone, Default)]
pub struct PollutantValue;

impl Algorithm for PollutantValue {
    type Input = PollutantPairs;
    type Output = PollutantValueResult;
    type Params = PollutantValueParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "PollutantValue"
    }

    fn description(&self) -> &'static str {
        "Economic value of the pollutant removal difference between two scenarios"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        pollutant_value(&input, &params)
    }
}

/// Value the removal difference of the three pollutants.
pub fn pollutant_value(
    pairs: &PollutantPairs,
    params: &PollutantValueParams,
) -> Result<PollutantValueResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let prices = params.prices;

    let combined = pairs.ozone.try_map(|scenario, _| {
        let rasters: Vec<&Raster<f64>> = Pollutant::ALL
            .iter()
            .map(|&p| pairs.get(p).get(scenario))
            .collect();
        sum_rasters(&rasters)
    })?;
    let comparison = combined.compare_all_cells(&normalizer)?;

    let mut value_deltas = Vec::with_capacity(Pollutant::ALL.len());
    let mut present_value = 0.0;
    let mut future_value = 0.0;
    for pollutant in Pollutant::ALL {
        let pair = pairs.get(pollutant);
        let price = prices.get(pollutant);
        present_value += pair.present().sum() * price;
        future_value += pair.future().sum() * price;
        value_deltas.push(combine(pair.present(), pair.future(), |p, f| (f - p) * price)?);
    }
    let value_delta = sum_rasters(&value_deltas.iter().collect::<Vec<_>>())?;

    let removal = Pollutant::ALL.map(|p| {
        let pair = pairs.get(p);
        (p, pair.present().sum(), pair.future().sum())
    });

    info!(delta = value_delta.sum(), "pollutant removal valued");
    Ok(PollutantValueResult {
        years: params.years,
        removal,
        comparison,
        present_value,
        future_value,
        value_delta,
    })
}

impl IntoServiceOutput for PollutantValueResult {
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput {
        let service = EcosystemService::PollutantRemoval;
        let mut report = Report::new("Sommario dell'analisi della rimozione inquinanti", generated);
        for scenario in Scenario::ALL {
            let mut section = scenario_section(scenario, &self.years);
            // NO2 first, then PM10, then ozone
            for (pollutant, present, future) in self.removal.iter().rev() {
                let removed = match scenario {
                    Scenario::Present => present,
                    Scenario::Future => future,
                };
                section = section.value(
                    format!(
                        "Rimozione {} {} (ton)",
                        pollutant.report_label(),
                        scenario.report_label()
                    ),
                    *removed,
                );
            }
            let value = match scenario {
                Scenario::Present => self.present_value,
                Scenario::Future => self.future_value,
            };
            report = report.section(section.value("Valore totale della rimozione inquinanti (€)", value));
        }
        let delta = &self.comparison.delta.aggregates;
        report = report.section(
            delta_section(&self.years)
                .value("Differenza della rimozione inquinanti (ton)", delta.sum)
                .value(
                    "Differenza sequestro inquinanti per unità di superficie (ton/ha)",
                    delta.per_hectare,
                )
                .whole(
                    "Differenza in termini economici del SE Rimozione inquinanti (stato di progetto – stato attuale) (€)",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{SpeciesRecord, SpeciesSelection};
    use crate::reference::Species;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ecoserv_core::GeoTransform;

    fn make_codes(values: Vec<LandUseCode>) -> Raster<LandUseCode> {
        let mut r = Raster::from_vec(values, 2, 2).unwrap();
        r.set_transform(GeoTransform::new(0.0, 4.0, 2.0, -2.0));
        r
    }

    fn make_band(values: Vec<f64>) -> Raster<f64> {
        let mut r = Raster::from_vec(values, 2, 2).unwrap();
        r.set_transform(GeoTransform::new(0.0, 4.0, 2.0, -2.0));
        r
    }

    fn when() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap()
    }

    #[test]
    fn test_land_use_ozone_and_pm10() {
        let codes = make_codes(vec![21, 0, 0, 0]);
        let result = pollutant_removal(&codes, &PollutantRemovalParams::default()).unwrap();

        assert_relative_eq!(
            result.ozone.get(0, 0).unwrap(),
            18.87 * 4.0 / 1.0e6 * 1000.0,
            epsilon = 1e-12
        );
        let pm10 = 30.0 * 0.064 * 18_489_600.0 * 0.88 * 4.0 * 0.5 / 1.0e12 * 1000.0;
        assert_relative_eq!(result.pm10.get(0, 0).unwrap(), pm10, epsilon = 1e-12);
        assert_eq!(result.ozone.get(1, 1).unwrap(), 0.0);
        assert_eq!(result.eligible_pixels, 1);
    }

    #[test]
    fn test_no2_has_no_area_factor() {
        let codes = make_codes(vec![21, 21, 21, 21]);
        let small = pollutant_removal(&codes, &PollutantRemovalParams::default()).unwrap();
        let large = pollutant_removal(
            &codes,
            &PollutantRemovalParams {
                pixel_resolution: 10.0,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(small.no2.data(), large.no2.data());

        let beta = no2_deposition().get(21).unwrap().beta;
        let expected = beta * 1.4 * 43.72 * 0.365 / 1.0e4 * 1000.0;
        assert_relative_eq!(small.no2.get(0, 0).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_species_mode() {
        let codes = make_codes(vec![7, 9, 0, 3]);
        let params = PollutantRemovalParams {
            canopy: SpeciesSelection::new(vec![SpeciesRecord::new(Species::Lime, 2)])
                .unwrap()
                .into_mode(),
            ..Default::default()
        };
        let result = pollutant_removal(&codes, &params).unwrap();

        let ozone_share = 122.20 * 2.0 / 1.0e7 / 2.0;
        let pm10_share = 30.0 * 0.064 * 215.0 * 6.41 * 2.0 / 2.0;
        assert_relative_eq!(result.ozone.get(0, 0).unwrap(), ozone_share, epsilon = 1e-12);
        assert_relative_eq!(result.pm10.get(0, 1).unwrap(), pm10_share, epsilon = 1e-9);
        assert_eq!(result.ozone.get(1, 1).unwrap(), 0.0);
        assert_eq!(result.eligible_pixels, 2);
    }

    #[test]
    fn test_removal_file_names() {
        let codes = make_codes(vec![7, 9, 0, 7]);
        let output = pollutant_removal(&codes, &PollutantRemovalParams::default())
            .unwrap()
            .into_output(when());
        let names: Vec<_> = output.rasters.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "02_rimozione_ozono_presente_kg.tiff",
                "02_rimozione_pm10_presente_kg.tiff",
                "02_rimozione_no2_presente_kg.tiff",
            ]
        );
    }

    #[test]
    fn test_value_of_removal_difference() {
        let zero = || make_band(vec![0.0; 4]);
        let pairs = PollutantPairs::new(
            ScenarioPair::new(zero(), make_band(vec![1.0, 0.0, 0.0, 0.0])).unwrap(),
            ScenarioPair::new(zero(), zero()).unwrap(),
            ScenarioPair::new(make_band(vec![0.0, 1.0, 0.0, 0.0]), zero()).unwrap(),
        )
        .unwrap();
        let result = pollutant_value(&pairs, &PollutantValueParams::default()).unwrap();

        assert_relative_eq!(result.value_delta.get(0, 0).unwrap(), 14658.11, epsilon = 1e-9);
        assert_relative_eq!(result.value_delta.get(0, 1).unwrap(), -77641.89, epsilon = 1e-9);
        assert_relative_eq!(result.present_value, 77641.89, epsilon = 1e-9);
        assert_relative_eq!(result.future_value, 14658.11, epsilon = 1e-9);
        assert_eq!(result.comparison.delta.aggregates.sum, 0.0);

        let output = result.into_output(when());
        assert_eq!(output.rasters[0].file_name, "SE_02_rimozione_inquinanti_delta_euro.tiff");
        let report = output.report.unwrap().report;
        assert_eq!(report.lookup("Rimozione NO2 Stato attuale (ton)"), Some(1.0));
        assert_eq!(report.lookup("Rimozione ozono Stato di progetto (ton)"), Some(1.0));
    }

    #[test]
    fn test_pairs_reject_other_grid() {
        let zero = || make_band(vec![0.0; 4]);
        let mut shifted = zero();
        shifted.set_transform(GeoTransform::new(100.0, 4.0, 2.0, -2.0));
        let result = PollutantPairs::new(
            ScenarioPair::new(zero(), zero()).unwrap(),
            ScenarioPair::new(shifted.clone(), shifted).unwrap(),
            ScenarioPair::new(zero(), zero()).unwrap(),
        );
        assert!(result.is_err());
    }
}
