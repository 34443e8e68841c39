//! Biodiversity from habitat quality and proximity to disturbances
//!
//! Habitat quality `Q = H[c] · penalty(Σ proximity)`, where each of ten
//! disturbance sources contributes 0, 1, 5 or 10 depending on its distance
//! from the area. The service value is `V[c] · Q · A`.

use super::{
    delta_section, prepare_codes, scenario_section, EcosystemService, IntoServiceOutput,
    NamedRaster, NamedReport, ServiceOutput, Years,
};
use crate::engine::{
    combine, reclassify, AreaNormalizer, LandUseCode, Scenario, ScenarioComparison,
    ScenarioPair,
};
use crate::reference::coefficients::{biodiversity_value, habitat_score};
use crate::report::Report;
use chrono::NaiveDateTime;
use ecoserv_core::{Algorithm, Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Quality multiplier by summed proximity, the last entry for 10 and above
const PENALTY: [f64; 11] = [1.0, 0.8, 0.75, 0.7, 0.6, 0.5, 0.45, 0.4, 0.3, 0.2, 0.1];

/// Sources of disturbance around the area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Disturbance {
    ResidentialBuildings,
    IndustrialBuildings,
    OtherBuildings,
    PedestrianRoads,
    CycleRoads,
    VehicularRoads,
    SecondaryRoads,
    EquippedArea,
    TransformationArea,
    Landfill,
}

const RESIDENTIAL_RANGES: [&str; 4] = [
    "assenti o oltre i 400 m",
    "tra i 200 e i 400 m",
    "tra i 100 e i 200 m",
    "entro i 100 m",
];
const INDUSTRIAL_RANGES: [&str; 4] = [
    "assenti o oltre i 500m",
    "tra i 250 e i 500 m",
    "tra i 100 e i 250 m",
    "entro i 100 m",
];
const ROAD_RANGES: [&str; 4] = [
    "assenti o oltre i 1000m",
    "tra i 500 e i 1000 m",
    "tra i 250 e i 500 m",
    "entro i 250 m",
];

impl Disturbance {
    pub const ALL: [Disturbance; 10] = [
        Disturbance::ResidentialBuildings,
        Disturbance::IndustrialBuildings,
        Disturbance::OtherBuildings,
        Disturbance::PedestrianRoads,
        Disturbance::CycleRoads,
        Disturbance::VehicularRoads,
        Disturbance::SecondaryRoads,
        Disturbance::EquippedArea,
        Disturbance::TransformationArea,
        Disturbance::Landfill,
    ];

    pub fn report_label(&self) -> &'static str {
        match self {
            Disturbance::ResidentialBuildings => "Edifici residenziali",
            Disturbance::IndustrialBuildings => "Edifici industriali",
            Disturbance::OtherBuildings => "Edifici altri",
            Disturbance::PedestrianRoads => "Viabilita pedonale",
            Disturbance::CycleRoads => "Viabilita ciclo",
            Disturbance::VehicularRoads => "Viabilita veicolare",
            Disturbance::SecondaryRoads => "Viabilita secondaria",
            Disturbance::EquippedArea => "Attrezzata",
            Disturbance::TransformationArea => "Trasformazione",
            Disturbance::Landfill => "Discarica",
        }
    }

    /// Distance ranges of the four proximity levels, farthest first
    pub fn ranges(&self) -> &'static [&'static str; 4] {
        match self {
            Disturbance::ResidentialBuildings
            | Disturbance::EquippedArea
            | Disturbance::TransformationArea => &RESIDENTIAL_RANGES,
            Disturbance::IndustrialBuildings | Disturbance::Landfill => &INDUSTRIAL_RANGES,
            Disturbance::OtherBuildings => &[
                "assenti o oltre i 500 m",
                "tra i 200 e i 400 m",
                "tra i 100 e i 200 m",
                "entro i 100 m",
            ],
            Disturbance::PedestrianRoads | Disturbance::VehicularRoads | Disturbance::SecondaryRoads => {
                &ROAD_RANGES
            }
            Disturbance::CycleRoads => &[
                "assenti o oltre i 200 m",
                "tra i 100 e i 200 m",
                "tra i 50 e i 100 m",
                "entro i 50 m",
            ],
        }
    }

    /// Distance range described by `level` for this disturbance
    pub fn describe(&self, level: ProximityLevel) -> &'static str {
        self.ranges()[level.index()]
    }
}

/// How close a disturbance is, farthest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ProximityLevel {
    #[default]
    Absent,
    Distant,
    Near,
    Adjacent,
}

impl ProximityLevel {
    pub const ALL: [ProximityLevel; 4] = [
        ProximityLevel::Absent,
        ProximityLevel::Distant,
        ProximityLevel::Near,
        ProximityLevel::Adjacent,
    ];

    pub fn index(&self) -> usize {
        match self {
            ProximityLevel::Absent => 0,
            ProximityLevel::Distant => 1,
            ProximityLevel::Near => 2,
            ProximityLevel::Adjacent => 3,
        }
    }

    pub fn weight(&self) -> u32 {
        match self {
            ProximityLevel::Absent => 0,
            ProximityLevel::Distant => 1,
            ProximityLevel::Near => 5,
            ProximityLevel::Adjacent => 10,
        }
    }
}

/// Proximity of every disturbance in one scenario; unset means absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisturbanceProfile {
    levels: BTreeMap<Disturbance, ProximityLevel>,
}

impl DisturbanceProfile {
    pub fn with(mut self, disturbance: Disturbance, level: ProximityLevel) -> Self {
        self.set(disturbance, level);
        self
    }

    pub fn set(&mut self, disturbance: Disturbance, level: ProximityLevel) {
        self.levels.insert(disturbance, level);
    }

    pub fn get(&self, disturbance: Disturbance) -> ProximityLevel {
        self.levels.get(&disturbance).copied().unwrap_or_default()
    }

    /// Sum of the proximity weights
    pub fn pressure(&self) -> u32 {
        Disturbance::ALL.iter().map(|&d| self.get(d).weight()).sum()
    }

    /// Habitat quality multiplier for this profile
    pub fn penalty(&self) -> f64 {
        penalty(self.pressure())
    }
}

/// Quality multiplier for a summed proximity weight.
pub fn penalty(pressure: u32) -> f64 {
    PENALTY[(pressure as usize).min(PENALTY.len() - 1)]
}

#[derive(Debug, Clone)]
pub struct BiodiversityParams {
    pub pixel_resolution: f64,
    pub years: Years,
    pub present: DisturbanceProfile,
    pub future: DisturbanceProfile,
}

impl Default for BiodiversityParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            years: Years::default(),
            present: DisturbanceProfile::default(),
            future: DisturbanceProfile::default(),
        }
    }
}

impl BiodiversityParams {
    pub fn profile(&self, scenario: Scenario) -> &DisturbanceProfile {
        match scenario {
            Scenario::Present => &self.present,
            Scenario::Future => &self.future,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BiodiversityResult {
    pub years: Years,
    pub present: DisturbanceProfile,
    pub future: DisturbanceProfile,
    /// Habitat quality, 0–1
    pub quality: ScenarioPair<f64>,
    /// Euro value per scenario and difference
    pub comparison: ScenarioComparison,
}

impl BiodiversityResult {
    /// Mean quality over every cell of the grid
    pub fn mean_quality(&self, scenario: Scenario) -> f64 {
        let q = self.quality.get(scenario);
        if q.is_empty() {
            0.0
        } else {
            q.sum() / q.len() as f64
        }
    }

    fn profile(&self, scenario: Scenario) -> &DisturbanceProfile {
        match scenario {
            Scenario::Present => &self.present,
            Scenario::Future => &self.future,
        }
    }
}

/// Biodiversity algorithm
#[derive(Debug, Clone, Default)]
pub struct Biodiversity;

impl Algorithm for Biodiversity {
    type Input = ScenarioPair<LandUseCode>;
    type Output = BiodiversityResult;
    type Params = BiodiversityParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Biodiversity"
    }

    fn description(&self) -> &'static str {
        "Habitat quality of two land-use maps under nearby disturbances and its value"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        biodiversity(&input, &params)
    }
}

/// Habitat quality and biodiversity value of both scenarios.
pub fn biodiversity(codes: &ScenarioPair<LandUseCode>, params: &BiodiversityParams) -> Result<BiodiversityResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let area = normalizer.pixel_area();
    let codes = prepare_codes(codes.present(), codes.future())?;
    let habitat = habitat_score();
    let unit_value = biodiversity_value();

    let quality = codes.try_map(|scenario, c| {
        let penalty = params.profile(scenario).penalty();
        debug!(%scenario, pressure = params.profile(scenario).pressure(), penalty, "disturbance penalty");
        reclassify(c, &habitat, penalty)
    })?;
    let value = codes.try_map(|scenario, c| {
        let per_area = reclassify(c, &unit_value, area)?;
        combine(&per_area, quality.get(scenario), |v, q| v * q)
    })?;
    let comparison = value.compare_all_cells(&normalizer)?;

    info!(delta = comparison.delta.aggregates.sum, "biodiversity valued");
    Ok(BiodiversityResult {
        years: params.years,
        present: params.present.clone(),
        future: params.future.clone(),
        quality,
        comparison,
    })
}

impl IntoServiceOutput for BiodiversityResult {
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput {
        let service = EcosystemService::Biodiversity;
        let mut report = Report::new("Sommario dell'analisi della biodiversità", generated);
        for scenario in Scenario::ALL {
            let profile = self.profile(scenario);
            let mut section = scenario_section(scenario, &self.years);
            for disturbance in Disturbance::ALL {
                section = section.text(
                    disturbance.report_label(),
                    disturbance.describe(profile.get(disturbance)),
                );
            }
            let state = match scenario {
                Scenario::Present => "stato attuale",
                Scenario::Future => "stato di progetto",
            };
            report = report.section(
                section
                    .blank()
                    .value(
                        format!("Valore della biodiversità nello {} (0-1)", state),
                        self.mean_quality(scenario),
                    )
                    .value(
                        "Valore totale della biodiversità (€)",
                        self.comparison.get(scenario).aggregates.sum,
                    ),
            );
        }
        report = report.section(
            delta_section(&self.years)
                .value(
                    "Differenza di valore della biodiversità",
                    self.mean_quality(Scenario::Future) - self.mean_quality(Scenario::Present),
                )
                .whole(
                    "Differenza in termini economici del SE di biodiversità (stato di progetto – stato attuale) (€)",
                    self.comparison.delta.aggregates.sum,
                ),
        );

        let (q_present, q_future) = self.quality.into_parts();
        let rasters = vec![
            NamedRaster::new(
                service.scenario_file_name("biodiversita", Scenario::Present, Some("Q")),
                q_present,
            ),
            NamedRaster::new(
                service.scenario_file_name("biodiversita", Scenario::Future, Some("Q")),
                q_future,
            ),
            NamedRaster::new(service.delta_file_name(), self.comparison.delta.raster),
        ];

        ServiceOutput {
            rasters,
            report: Some(NamedReport {
                file_name: service.report_file_name(),
                report,
            }),
            message: "Completed".into(),
        }
    }
}
