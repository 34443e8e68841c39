//! Social (recreational) benefits of green areas
//!
//! The recreation opportunity spectrum index (ROS) of a scenario blends the
//! suitability of the land-use classes present in the map with contextual
//! features declared by the user:
//!
//! ```text
//! PR    = (Σ score[c] + natural / 2.95 + green / 1.7) / 3
//! AF    = (access / 2.3 + amenities / 3.6) / 2
//! ROS   = 0.3 · PR + 0.7 · AF
//! value = A · ROS · value[c]
//! ```
//!
//! `Σ score[c]` and `access` run over the distinct classes of the map.

use super::{
    comparison_rasters, delta_section, prepare_codes, scenario_section, EcosystemService,
    IntoServiceOutput, NamedRaster, NamedReport, ServiceOutput, Years,
};
use crate::engine::{
    count_recognized, reclassify_with, unique_codes, AreaNormalizer, CodeTable, LandUseCode,
    Scenario, ScenarioComparison, ScenarioPair, ValidPixels,
};
use crate::reference::coefficients::{social_score, social_value};
use crate::report::Report;
use chrono::NaiveDateTime;
use ecoserv_core::{Algorithm, Error, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Natural features in or near the area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum NaturalAspect {
    /// Panoramic viewpoint
    Belvedere,
    /// Primary watercourse within 200 m
    PrimaryWatercourse,
    /// Natura 2000 site or protected area
    ProtectedArea,
    /// Secondary watercourse within 200 m
    SecondaryWatercourse,
    MonumentalTree,
}

impl NaturalAspect {
    pub const ALL: [NaturalAspect; 5] = [
        NaturalAspect::Belvedere,
        NaturalAspect::PrimaryWatercourse,
        NaturalAspect::ProtectedArea,
        NaturalAspect::SecondaryWatercourse,
        NaturalAspect::MonumentalTree,
    ];

    pub fn score(&self) -> f64 {
        match self {
            NaturalAspect::Belvedere => 0.9,
            NaturalAspect::PrimaryWatercourse => 0.8,
            NaturalAspect::ProtectedArea => 0.8,
            NaturalAspect::SecondaryWatercourse => 0.65,
            NaturalAspect::MonumentalTree => 0.7,
        }
    }
}

/// Urban parks and gardens in the area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum UrbanGreen {
    /// Park larger than 2 ha
    LargePark,
    /// Park between 0.5 and 2 ha
    MediumPark,
    /// Park smaller than 0.5 ha
    SmallPark,
    HistoricGarden,
}

impl UrbanGreen {
    pub const ALL: [UrbanGreen; 4] = [
        UrbanGreen::LargePark,
        UrbanGreen::MediumPark,
        UrbanGreen::SmallPark,
        UrbanGreen::HistoricGarden,
    ];

    pub fn score(&self) -> f64 {
        match self {
            UrbanGreen::LargePark => 1.0,
            UrbanGreen::MediumPark => 0.9,
            UrbanGreen::SmallPark => 0.8,
            UrbanGreen::HistoricGarden => 0.7,
        }
    }
}

/// Facilities within 100 m
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Amenity {
    PlayArea,
    SportsCourt,
    DogArea,
    Kiosk,
    Toilets,
    Fountain,
}

impl Amenity {
    pub const ALL: [Amenity; 6] = [
        Amenity::PlayArea,
        Amenity::SportsCourt,
        Amenity::DogArea,
        Amenity::Kiosk,
        Amenity::Toilets,
        Amenity::Fountain,
    ];

    pub fn score(&self) -> f64 {
        match self {
            Amenity::PlayArea => 0.9,
            Amenity::SportsCourt => 0.8,
            Amenity::DogArea => 0.7,
            Amenity::Kiosk => 0.5,
            Amenity::Toilets => 0.4,
            Amenity::Fountain => 0.7,
        }
    }
}

const NATURAL_MAX: f64 = 2.95;
const GREEN_MAX: f64 = 1.7;
const ACCESS_MAX: f64 = 2.3;
const AMENITY_MAX: f64 = 3.6;

/// Accessibility score of the classes giving access to the area (roads, paths)
pub fn accessibility_score() -> CodeTable {
    CodeTable::from_pairs("accessibility", &[(3, 0.7), (11, 0.9), (13, 0.7)])
}

/// Contextual features of one scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocialContext {
    pub natural: BTreeSet<NaturalAspect>,
    pub green: BTreeSet<UrbanGreen>,
    pub amenities: BTreeSet<Amenity>,
}

impl SocialContext {
    /// Natural aspects normalized to 0–1
    pub fn natural_norm(&self) -> f64 {
        self.natural.iter().map(|n| n.score()).sum::<f64>() / NATURAL_MAX
    }

    pub fn green_norm(&self) -> f64 {
        self.green.iter().map(|g| g.score()).sum::<f64>() / GREEN_MAX
    }

    pub fn amenity_norm(&self) -> f64 {
        self.amenities.iter().map(|a| a.score()).sum::<f64>() / AMENITY_MAX
    }
}

/// ROS index of a set of distinct land-use codes in a given context.
pub fn ros_index(codes: &[LandUseCode], context: &SocialContext) -> f64 {
    let scores = social_score();
    let access = accessibility_score();
    let code_score: f64 = codes.iter().filter_map(|&c| scores.get(c)).sum();
    let access_norm = codes.iter().filter_map(|&c| access.get(c)).sum::<f64>() / ACCESS_MAX;

    let pr = (code_score + context.natural_norm() + context.green_norm()) / 3.0;
    let access_fruition = (access_norm + context.amenity_norm()) / 2.0;
    0.3 * pr + 0.7 * access_fruition
}

#[derive(Debug, Clone)]
pub struct SocialParams {
    pub pixel_resolution: f64,
    pub years: Years,
    pub present: SocialContext,
    pub future: SocialContext,
}

impl Default for SocialParams {
    fn default() -> Self {
        Self {
            pixel_resolution: 2.0,
            years: Years::default(),
            present: SocialContext::default(),
            future: SocialContext::default(),
        }
    }
}

impl SocialParams {
    pub fn context(&self, scenario: Scenario) -> &SocialContext {
        match scenario {
            Scenario::Present => &self.present,
            Scenario::Future => &self.future,
        }
    }
}

/// Per-scenario ROS figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RosSummary {
    /// Index of the scenario
    pub index: f64,
    /// Mean of the ROS raster over cells with a valued code
    pub mean: f64,
}

#[derive(Debug, Clone)]
pub struct SocialResult {
    pub years: Years,
    /// ROS rasters, set on cells whose class has a suitability score
    pub ros: ScenarioPair<f64>,
    pub ros_present: RosSummary,
    pub ros_future: RosSummary,
    /// Euro value per scenario and difference, per hectare over valued cells
    pub comparison: ScenarioComparison,
}

impl SocialResult {
    pub fn ros_summary(&self, scenario: Scenario) -> RosSummary {
        match scenario {
            Scenario::Present => self.ros_present,
            Scenario::Future => self.ros_future,
        }
    }
}

/// Social benefits algorithm
#[derive(Debug, Clone, Default)]
pub struct SocialBenefits;

impl Algorithm for SocialBenefits {
    type Input = ScenarioPair<LandUseCode>;
    type Output = SocialResult;
    type Params = SocialParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "SocialBenefits"
    }

    fn description(&self) -> &'static str {
        "Recreational value of two land-use maps from the ROS index"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        social_benefits(&input, &params)
    }
}

/// Compute ROS and the social value of both scenarios.
///
/// The euro delta is per cell, `value_future − value_present`.
pub fn social_benefits(codes: &ScenarioPair<LandUseCode>, params: &SocialParams) -> Result<SocialResult> {
    let normalizer = AreaNormalizer::new(params.pixel_resolution)?;
    let area = normalizer.pixel_area();
    let codes = prepare_codes(codes.present(), codes.future())?;
    let scores = social_score();
    let values = social_value();

    let index = |scenario: Scenario| ros_index(&unique_codes(codes.get(scenario)), params.context(scenario));
    let ros = codes.try_map(|scenario, c| {
        let ros = index(scenario);
        reclassify_with(c, |code| scores.contains(code).then_some(ros))
    })?;
    let value = codes.try_map(|scenario, c| {
        let ros = index(scenario);
        reclassify_with(c, |code| values.get(code).map(|v| area * ros * v))
    })?;

    let valid = ValidPixels::new(
        count_recognized(codes.present(), &values),
        count_recognized(codes.future(), &values),
    );
    let comparison = value.compare(valid, &normalizer)?;

    let summary = |scenario: Scenario, pixels: usize| RosSummary {
        index: index(scenario),
        mean: if pixels == 0 {
            0.0
        } else {
            ros.get(scenario).sum() / pixels as f64
        },
    };
    let ros_present = summary(Scenario::Present, valid.present);
    let ros_future = summary(Scenario::Future, valid.future);

    debug!(present = ros_present.index, future = ros_future.index, "ROS index");
    info!(delta = comparison.delta.aggregates.sum, "social benefits valued");

    Ok(SocialResult {
        years: params.years,
        ros,
        ros_present,
        ros_future,
        comparison,
    })
}

impl IntoServiceOutput for SocialResult {
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput {
        let service = EcosystemService::SocialBenefits;
        let mut report = Report::new("Sommario dell'analisi dei benefici sociali", generated);
        for scenario in Scenario::ALL {
            let ros = self.ros_summary(scenario);
            let value = &self.comparison.get(scenario).aggregates;
            let label = scenario.report_label();
            report = report.section(
                scenario_section(scenario, &self.years)
                    .value(format!("Valore ROS - {}", label), ros.index)
                    .value(format!("Valore ROS medio - {}", label), ros.mean)
                    .value(
                        format!(
                            "Valore medio dei benefici sociali per unità di superficie - {} (€/ha)",
                            label
                        ),
                        value.per_hectare,
                    )
                    .value("Valore totale dei benefici sociali (€)", value.sum),
            );
        }
        let delta = &self.comparison.delta.aggregates;
        report = report.section(
            delta_section(&self.years)
                .value(
                    "Differenza dei benefici sociali per unità di superficie (€/ha)",
                    delta.per_hectare,
                )
                .whole(
                    "Differenza in termini economici dei benefici sociali (stato di progetto – stato attuale) (€)",
                    delta.sum,
                ),
        );

        let (ros_present, ros_future) = self.ros.into_parts();
        let mut rasters = comparison_rasters(
            service,
            "benefici_sociali",
            Some("euro"),
            &self.comparison,
            self.comparison.delta.raster.clone(),
        );
        rasters.push(NamedRaster::new(
            service.scenario_file_name("benefici_sociali", Scenario::Present, Some("ROS")),
            ros_present,
        ));
        rasters.push(NamedRaster::new(
            service.scenario_file_name("benefici_sociali", Scenario::Future, Some("ROS")),
            ros_future,
        ));

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
