//! Species selection and the species / land-use canopy strategy.

use super::code_table::{CodeSet, LandUseCode};
use super::reclassify::{count_in_set, eligibility_mask};
use super::raster_math::map_cells;
use crate::reference::{Species, SpeciesCoefficients};
use ecoserv_core::raster::Raster;
use ecoserv_core::{Error, Result};
use serde::Serialize;

/// Maximum number of species in one scenario
pub const MAX_SPECIES_SLOTS: usize = 5;

/// A catalog species with its number of trees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeciesRecord {
    pub species: Species,
    pub count: u32,
}

impl SpeciesRecord {
    pub fn new(species: Species, count: u32) -> Self {
        Self { species, count }
    }

    pub fn coefficients(&self) -> SpeciesCoefficients {
        self.species.coefficients()
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }
}

/// Up to five species slots. Slots with a count of 0 are inactive.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SpeciesSelection {
    slots: Vec<SpeciesRecord>,
}

impl SpeciesSelection {
    pub fn new(slots: Vec<SpeciesRecord>) -> Result<Self> {
        if slots.len() > MAX_SPECIES_SLOTS {
            return Err(Error::InvalidParameter {
                name: "species",
                value: slots.len().to_string(),
                reason: format!("at most {} species per scenario", MAX_SPECIES_SLOTS),
            });
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[SpeciesRecord] {
        &self.slots
    }

    /// Slots that actually contribute trees
    pub fn active(&self) -> impl Iterator<Item = &SpeciesRecord> {
        self.slots.iter().filter(|s| s.is_active())
    }

    pub fn total_trees(&self) -> u64 {
        self.active().map(|s| u64::from(s.count)).sum()
    }

    /// `Σ f(coefficients) × count` over the active slots
    pub fn weighted_sum<F>(&self, f: F) -> f64
    where
        F: Fn(&SpeciesCoefficients) -> f64,
    {
        self.active()
            .map(|s| f(&s.coefficients()) * f64::from(s.count))
            .sum()
    }

    /// Species mode as soon as one slot holds trees, land-use mode otherwise.
    pub fn into_mode(self) -> CanopyMode {
        if self.active().next().is_some() {
            CanopyMode::Species(self)
        } else {
            CanopyMode::LandUse
        }
    }
}

/// How canopy-dependent services obtain their coefficients.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum CanopyMode {
    /// Explicit trees, spread uniformly over tree-eligible cells
    Species(SpeciesSelection),
    /// Average coefficients per land-use code
    #[default]
    LandUse,
}

impl CanopyMode {
    pub fn is_species(&self) -> bool {
        matches!(self, CanopyMode::Species(_))
    }

    pub fn total_trees(&self) -> u64 {
        match self {
            CanopyMode::Species(selection) => selection.total_trees(),
            CanopyMode::LandUse => 0,
        }
    }
}

/// `total / eligible`, or 0 when no cell is eligible.
pub fn per_pixel_share(total: f64, eligible: usize) -> f64 {
    if eligible == 0 {
        0.0
    } else {
        total / eligible as f64
    }
}

/// Spread `total` evenly over the cells whose code is in `eligible_codes`.
///
/// Returns the value raster and the number of eligible cells.
pub fn distribute_over_eligible(
    codes: &Raster<LandUseCode>,
    eligible_codes: &CodeSet,
    total: f64,
) -> Result<(Raster<f64>, usize)> {
    let eligible = count_in_set(codes, eligible_codes);
    let share = per_pixel_share(total, eligible);
    let mask = eligibility_mask(codes, eligible_codes)?;
    Ok((map_cells(&mask, |m| m * share)?, eligible))
}
