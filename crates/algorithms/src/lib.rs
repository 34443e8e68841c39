//! # ecoserv algorithms
//!
//! Land-use reclassification engine and urban ecosystem-service calculators.
//!
//! ## Modules
//!
//! - **engine**: code tables, reclassification, present/future pairs, area normalization
//! - **reference**: species catalog, per-code coefficient tables, agricultural prices
//! - **services**: carbon, pollutants, temperature, hydrogeology, infiltration,
//!   social benefits, biodiversity, agriculture, pollination, total
//! - **report**: plain-text analysis reports

pub mod engine;
pub mod reference;
pub mod report;
pub mod services;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::engine::{
        reclassify, reclassify_with, AreaNormalizer, CanopyMode, CodeSet, CodeTable,
        LandUseCode, Scenario, ScenarioComparison, ScenarioPair, SpeciesRecord,
        SpeciesSelection,
    };
    pub use crate::reference::{load_price_table, Species};
    pub use crate::report::{Report, Section};
    pub use crate::services::{
        agriculture::{agricultural_production_value, AgriculturalProduction, AgricultureParams},
        biodiversity::{biodiversity, Biodiversity, BiodiversityParams, Disturbance, ProximityLevel},
        carbon::{
            carbon_sequestration, carbon_stock, CarbonSequestration, CarbonSequestrationParams,
            CarbonStock, CarbonStockParams,
        },
        hydrogeology::{
            hydrogeological_protection, HydrogeologicalProtection, HydrogeologyParams,
            HydrologicGroup,
        },
        infiltration::{
            infiltration, infiltration_value, Infiltration, InfiltrationParams, InfiltrationValue,
            InfiltrationValueParams,
        },
        pollination::{pollination, Pollination, PollinationParams},
        pollutants::{
            pollutant_removal, pollutant_value, Pollutant, PollutantPairs, PollutantRemoval,
            PollutantRemovalParams, PollutantValue, PollutantValueParams,
        },
        social::{social_benefits, Amenity, NaturalAspect, SocialBenefits, SocialParams, UrbanGreen},
        temperature::{temperature_regulation, TemperatureParams, TemperatureRegulation},
        total::{total_value, TotalParams, TotalValue},
        EcosystemService, IntoServiceOutput, ServiceOutput, Years,
    };
    pub use ecoserv_core::prelude::*;
}
