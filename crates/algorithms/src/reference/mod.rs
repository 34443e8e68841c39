//! Reference data: species catalog, per-code coefficient tables and the
//! agricultural price list loader.

pub mod coefficients;
mod prices;
mod species;

pub use coefficients::{tree_codes, No2Deposition, LAND_USE_CODES, TREE_CODES};
pub use prices::{load_price_table, read_price_table};
pub use species::{Species, SpeciesCoefficients};
