//! Reclassification and scenario engine shared by every service.
//!
//! - `code_table`: land-use code → coefficient tables
//! - `reclassify`: code raster → value raster
//! - `scenario`: present/future pairs, deltas, aggregates
//! - `area`: pixel-area and per-hectare normalization
//! - `species`: tree selections and the species / land-use strategy
//! - `raster_math`: cell-by-cell arithmetic on value rasters

mod area;
mod code_table;
mod raster_math;
mod reclassify;
mod scenario;
mod species;

pub use area::{normalized_per_hectare, AreaNormalizer, SQUARE_METRES_PER_HECTARE};
pub use code_table::{CodeSet, CodeTable, LandUseCode};
pub use raster_math::{combine, map_cells, sum_rasters};
pub use reclassify::{
    clean_negative, code_histogram, count_in_set, count_recognized, eligibility_mask,
    reclassify, reclassify_with, unique_codes,
};
pub use scenario::{
    Aggregates, AnalysisResult, Scenario, ScenarioComparison, ScenarioPair, ValidPixels,
};
pub use species::{
    distribute_over_eligible, per_pixel_share, CanopyMode, SpeciesRecord, SpeciesSelection,
    MAX_SPECIES_SLOTS,
};
