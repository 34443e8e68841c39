//! Ecosystem-service calculators.
//!
//! Three calculators run on a single land-use map and produce physical
//! quantities (carbon stock, pollutant removal, infiltration). The `SE`
//! calculators compare a present and a future map, value the difference in
//! euro and produce a report. `total` sums the euro deltas of the others.
//!
//! Nothing here touches the file system: every calculator returns a result
//! that converts into a [`ServiceOutput`] (named rasters plus an optional
//! report) for the caller to persist.

pub mod agriculture;
pub mod biodiversity;
pub mod carbon;
pub mod hydrogeology;
pub mod infiltration;
pub mod pollination;
pub mod pollutants;
pub mod social;
pub mod temperature;
pub mod total;

use crate::engine::{LandUseCode, Scenario, ScenarioComparison, ScenarioPair};
use crate::engine::{clean_negative, unique_codes};
use crate::report::{Report, Section};
use chrono::NaiveDateTime;
use ecoserv_core::raster::Raster;
use ecoserv_core::{Error, Result};
use serde::Serialize;

/// The services, numbered as in the municipal methodology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EcosystemService {
    CarbonSequestration,
    PollutantRemoval,
    TemperatureRegulation,
    HydrogeologicalProtection,
    Infiltration,
    SocialBenefits,
    Biodiversity,
    AgriculturalProduction,
    Pollination,
    Total,
}

impl EcosystemService {
    pub const ALL: [EcosystemService; 10] = [
        EcosystemService::CarbonSequestration,
        EcosystemService::PollutantRemoval,
        EcosystemService::TemperatureRegulation,
        EcosystemService::HydrogeologicalProtection,
        EcosystemService::Infiltration,
        EcosystemService::SocialBenefits,
        EcosystemService::Biodiversity,
        EcosystemService::AgriculturalProduction,
        EcosystemService::Pollination,
        EcosystemService::Total,
    ];

    pub fn number(&self) -> u8 {
        match self {
            EcosystemService::CarbonSequestration => 1,
            EcosystemService::PollutantRemoval => 2,
            EcosystemService::TemperatureRegulation => 3,
            EcosystemService::HydrogeologicalProtection => 4,
            EcosystemService::Infiltration => 5,
            EcosystemService::SocialBenefits => 6,
            EcosystemService::Biodiversity => 7,
            EcosystemService::AgriculturalProduction => 8,
            EcosystemService::Pollination => 9,
            EcosystemService::Total => 10,
        }
    }

    /// ASCII identifier used in file names
    pub fn slug(&self) -> &'static str {
        match self {
            EcosystemService::CarbonSequestration => "sequestro_carbonio",
            EcosystemService::PollutantRemoval => "rimozione_inquinanti",
            EcosystemService::TemperatureRegulation => "regolazione_temperatura",
            EcosystemService::HydrogeologicalProtection => "protezione_idrogeologica",
            EcosystemService::Infiltration => "infiltrazione",
            EcosystemService::SocialBenefits => "benefici_sociali",
            EcosystemService::Biodiversity => "biodiversita",
            EcosystemService::AgriculturalProduction => "produzione_agricola",
            EcosystemService::Pollination => "impollinazione",
            EcosystemService::Total => "totale",
        }
    }

    /// `SE_<nn>_<service>_delta_euro.tiff`
    pub fn delta_file_name(&self) -> String {
        format!("SE_{:02}_{}_delta_euro.tiff", self.number(), self.slug())
    }

    /// `SE_<service>.txt`
    pub fn report_file_name(&self) -> String {
        format!("SE_{}.txt", self.slug())
    }

    /// `<nn>_<description>_<scenario>[_<unit>].tiff`
    pub fn scenario_file_name(&self, description: &str, scenario: Scenario, unit: Option<&str>) -> String {
        match unit {
            Some(unit) => format!(
                "{:02}_{}_{}_{}.tiff",
                self.number(),
                description,
                scenario.file_label(),
                unit
            ),
            None => format!("{:02}_{}_{}.tiff", self.number(), description, scenario.file_label()),
        }
    }
}

/// Calendar years of the two scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Years {
    pub present: i32,
    pub future: i32,
}

impl Years {
    pub fn new(present: i32, future: i32) -> Self {
        Self { present, future }
    }

    /// Number of years between the scenarios; must be positive.
    pub fn span(&self) -> Result<u32> {
        self.future
            .checked_sub(self.present)
            .and_then(|span| u32::try_from(span).ok())
            .filter(|span| *span > 0)
            .ok_or_else(|| Error::InvalidParameter {
                name: "years",
                value: format!("{}-{}", self.present, self.future),
                reason: "the project year must follow the current year".into(),
            })
    }

    pub fn get(&self, scenario: Scenario) -> i32 {
        match scenario {
            Scenario::Present => self.present,
            Scenario::Future => self.future,
        }
    }
}

impl Default for Years {
    fn default() -> Self {
        Self::new(2021, 2030)
    }
}

/// A raster and the file name it should be stored under
#[derive(Debug, Clone)]
pub struct NamedRaster {
    pub file_name: String,
    pub raster: Raster<f64>,
}

impl NamedRaster {
    pub fn new(file_name: impl Into<String>, raster: Raster<f64>) -> Self {
        Self {
            file_name: file_name.into(),
            raster,
        }
    }
}

/// A report and the file name it should be stored under
#[derive(Debug, Clone)]
pub struct NamedReport {
    pub file_name: String,
    pub report: Report,
}

/// Everything a calculator produces, ready to be persisted.
#[derive(Debug, Clone)]
pub struct ServiceOutput {
    pub rasters: Vec<NamedRaster>,
    pub report: Option<NamedReport>,
    /// Completion or advisory message for the user
    pub message: String,
}

/// Conversion of a calculator result into persistable outputs.
pub trait IntoServiceOutput {
    /// `generated` stamps the report, if there is one.
    fn into_output(self, generated: NaiveDateTime) -> ServiceOutput;
}

/// Clean both land-use maps and pair them on one grid.
pub fn prepare_codes(present: &Raster<LandUseCode>, future: &Raster<LandUseCode>) -> Result<ScenarioPair<LandUseCode>> {
    ScenarioPair::new(clean_negative(present), clean_negative(future))
}

/// Distinct codes per scenario, for the input summary of reports
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CodeInventory {
    pub present: Vec<LandUseCode>,
    pub future: Vec<LandUseCode>,
}

impl CodeInventory {
    pub fn of(codes: &ScenarioPair<LandUseCode>) -> Self {
        Self {
            present: unique_codes(codes.present()),
            future: unique_codes(codes.future()),
        }
    }

    pub fn get(&self, scenario: Scenario) -> &[LandUseCode] {
        match scenario {
            Scenario::Present => &self.present,
            Scenario::Future => &self.future,
        }
    }
}

/// Heading of a scenario section
pub(crate) fn scenario_heading(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::Present => "Analisi stato di fatto",
        Scenario::Future => "Analisi stato di progetto",
    }
}

/// Scenario section opened with its year line
pub(crate) fn scenario_section(scenario: Scenario, years: &Years) -> Section {
    let label = match scenario {
        Scenario::Present => "Anno corrente",
        Scenario::Future => "Anno progetto",
    };
    Section::new(scenario_heading(scenario)).text(label, years.get(scenario))
}

/// Differences section opened with the year range
pub(crate) fn delta_section(years: &Years) -> Section {
    Section::new("Differenze tra stato di progetto e stato attuale")
        .text("Anno progetto", format!("{} - {}", years.present, years.future))
}

/// The two scenario rasters and the euro delta of a comparison, named.
pub(crate) fn comparison_rasters(
    service: EcosystemService,
    description: &str,
    unit: Option<&str>,
    comparison: &ScenarioComparison,
    value_delta: Raster<f64>,
) -> Vec<NamedRaster> {
    let mut rasters: Vec<NamedRaster> = Scenario::ALL
        .iter()
        .map(|&s| {
            NamedRaster::new(
                service.scenario_file_name(description, s, unit),
                comparison.get(s).raster.clone(),
            )
        })
        .collect();
    rasters.push(NamedRaster::new(service.delta_file_name(), value_delta));
    rasters
}
