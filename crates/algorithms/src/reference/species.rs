//! Tree species catalog.

use serde::Serialize;

/// Per-tree coefficients of a catalog species
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeciesCoefficients {
    /// Carbon sequestered per tree and year (t)
    pub carbon_rate: f64,
    /// Ozone removed per tree and year (g)
    pub ozone_rate: f64,
    /// Leaf area index
    pub leaf_area_index: f64,
    /// Length of the growing season (days)
    pub growing_season_days: f64,
}

/// The fifteen species available for tree-based scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Species {
    Fir,
    MapleSecondSize,
    MapleThirdSize,
    Hackberry,
    Hornbeam,
    Cedar,
    OrnamentalCherry,
    Ash,
    HorseChestnut,
    Elm,
    Pine,
    Poplar,
    PlaneTree,
    Oak,
    Lime,
}

impl Species {
    pub const ALL: [Species; 15] = [
        Species::Fir,
        Species::MapleSecondSize,
        Species::MapleThirdSize,
        Species::Hackberry,
        Species::Hornbeam,
        Species::Cedar,
        Species::OrnamentalCherry,
        Species::Ash,
        Species::HorseChestnut,
        Species::Elm,
        Species::Pine,
        Species::Poplar,
        Species::PlaneTree,
        Species::Oak,
        Species::Lime,
    ];

    /// Catalog name as used in the municipal tree register
    pub fn local_name(&self) -> &'static str {
        match self {
            Species::Fir => "Abete",
            Species::MapleSecondSize => "Acero seconda grandezza",
            Species::MapleThirdSize => "Acero terza grandezza",
            Species::Hackberry => "Bagolaro",
            Species::Hornbeam => "Carpino",
            Species::Cedar => "Cedro",
            Species::OrnamentalCherry => "Ciliegio da fiore",
            Species::Ash => "Frassino",
            Species::HorseChestnut => "Ippocastano",
            Species::Elm => "Olmo",
            Species::Pine => "Pino",
            Species::Poplar => "Pioppo",
            Species::PlaneTree => "Platano",
            Species::Oak => "Quercia",
            Species::Lime => "Tiglio",
        }
    }

    pub fn coefficients(&self) -> SpeciesCoefficients {
        let (carbon_rate, ozone_rate, leaf_area_index, growing_season_days) = match self {
            Species::Fir => (0.18, 131.01, 7.73, 365.0),
            Species::MapleSecondSize => (0.41, 89.10, 5.41, 215.0),
            Species::MapleThirdSize => (0.34, 82.33, 4.48, 215.0),
            Species::Hackberry => (0.75, 207.25, 7.52, 215.0),
            Species::Hornbeam => (0.38, 56.98, 4.71, 215.0),
            Species::Cedar => (0.39, 206.24, 8.25, 365.0),
            Species::OrnamentalCherry => (0.2, 23.76, 3.9, 265.0),
            Species::Ash => (0.35, 100.70, 4.54, 215.0),
            Species::HorseChestnut => (0.44, 115.94, 6.13, 215.0),
            Species::Elm => (0.48, 116.61, 6.66, 215.0),
            Species::Pine => (0.31, 90.25, 5.24, 365.0),
            Species::Poplar => (0.67, 85.20, 4.61, 215.0),
            Species::PlaneTree => (0.7, 209.79, 6.38, 215.0),
            Species::Oak => (0.44, 89.54, 0.44, 215.0),
            Species::Lime => (0.28, 122.20, 6.41, 215.0),
        };
        SpeciesCoefficients {
            carbon_rate,
            ozone_rate,
            leaf_area_index,
            growing_season_days,
        }
    }
}
