//! # ecoserv core
//!
//! Core types, traits and I/O shared by the ecosystem-service calculators.
//!
//! This crate provides:
//! - `Raster<T>`: generic georeferenced grid, used both for land-use code
//!   maps (`Raster<i32>`) and derived value maps (`Raster<f64>`)
//! - `GeoTransform`: affine transformation for georeferencing
//! - `CRS`: coordinate reference system carried from inputs to outputs
//! - the `Algorithm` trait implemented by every calculator
//! - native GeoTIFF reading and writing

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Core trait for all calculators.
///
/// A calculator is a pure function from an input (one or two rasters) and a
/// parameter set to an output value. Nothing is written to disk here.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
