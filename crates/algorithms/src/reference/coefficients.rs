//! Per land-use code coefficient tables of the municipal legend (codes 1–87).
//!
//! Tables that cover the whole legend list every code, zero included, so that
//! "recognized pixel" counts see the full legend. Sparse tables are filled
//! with zeros over the legend for the same reason.

use crate::engine::{CodeSet, CodeTable, LandUseCode};
use std::ops::RangeInclusive;

/// Codes of the land-use legend
pub const LAND_USE_CODES: RangeInclusive<LandUseCode> = 1..=87;

/// Land-use classes able to host trees
pub const TREE_CODES: &[LandUseCode] = &[
    7, 9, 17, 19, 21, 23, 26, 29, 32, 38, 43, 44, 46, 48, 53, 57, 62, 69, 70, 74, 82, 83, 84, 85,
    86, 87,
];

pub fn tree_codes() -> CodeSet {
    CodeSet::from_codes(TREE_CODES)
}

fn legend(name: &'static str, groups: &[(&[LandUseCode], f64)]) -> CodeTable {
    CodeTable::from_groups(name, groups).fill_missing(LAND_USE_CODES, 0.0)
}

const FOREST_CODES: &[LandUseCode] = &[82, 83, 84, 85, 86, 87];

// Carbon

/// Soil organic carbon, t per m² and year
pub fn soil_carbon() -> CodeTable {
    legend(
        "soil_carbon",
        &[
            (
                &[
                    1, 2, 4, 5, 6, 7, 9, 19, 21, 22, 23, 24, 26, 29, 30, 32, 33, 34, 37, 38, 39,
                    40, 41, 42, 43, 44, 48, 49, 53, 54, 57, 58, 59, 64, 65, 73, 74, 75, 76, 79,
                ],
                0.0056,
            ),
            (&[61, 62, 63, 68, 69, 70], 0.00679),
            (FOREST_CODES, 0.0061),
        ],
    )
}

/// Above-ground carbon without an explicit tree census, t per m² and year
pub fn above_ground_carbon() -> CodeTable {
    legend(
        "above_ground_carbon",
        &[
            (&[7], 0.000047),
            (&[9], 0.001439),
            (&[17], 0.000535),
            (&[19, 32, 44], 0.003),
            (&[21, 38], 0.005),
            (&[23], 0.00029),
            (&[26], 0.000073),
            (&[29], 0.00003),
            (&[43], 0.0106),
            (&[46, 48], 0.000756),
            (&[53], 0.0003),
            (&[57, 62, 69, 74], 0.00001),
            (&[82, 87], 0.006),
            (&[83, 84], 0.02),
            (&[85], 0.0218),
            (&[86], 0.016),
        ],
    )
}

// Canopy and pollutants

const SHRUB_CODES: &[LandUseCode] = &[19, 23, 26, 29, 32, 38, 53, 62, 69, 70, 74];

/// Ozone removal without a tree census, g per m² and year
pub fn ozone_removal() -> CodeTable {
    legend(
        "ozone_removal",
        &[
            (&[7], 4.27),
            (&[9], 1.42),
            (&[17], 7.24),
            (&[21], 18.87),
            (&[43, 44], 24.12),
            (&[46, 48], 9.33),
            (&[57], 0.03),
            (SHRUB_CODES, 0.55),
            (FOREST_CODES, 18.87),
        ],
    )
}

/// Length of the leaf-on season, seconds
pub fn growing_season_seconds() -> CodeTable {
    legend(
        "growing_season",
        &[(
            &[
                7, 9, 17, 19, 21, 23, 26, 29, 32, 38, 43, 44, 46, 48, 53, 57, 62, 69, 74, 82, 83,
                84, 85, 86, 87,
            ],
            18_489_600.0,
        )],
    )
}

/// Mean leaf area index per land-use class
pub fn leaf_area_index() -> CodeTable {
    legend(
        "leaf_area_index",
        &[
            (&[7], 0.21),
            (&[9], 0.08),
            (&[17], 0.39),
            (&[21], 0.88),
            (&[43, 44], 1.22),
            (&[46, 48], 0.53),
            (SHRUB_CODES, 0.02),
            (FOREST_CODES, 0.88),
        ],
    )
}

/// Linear NO2 deposition model `α + β·wind`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct No2Deposition {
    pub alpha: f64,
    pub beta: f64,
}

/// NO2 deposition coefficients. α is zero for every class of the legend.
pub fn no2_deposition() -> CodeTable<No2Deposition> {
    legend(
        "no2_beta",
        &[
            (
                &[
                    1, 2, 4, 5, 6, 10, 12, 14, 16, 22, 24, 27, 30, 33, 34, 37, 39, 40, 41, 42, 49,
                    58, 59, 61, 63, 64, 65, 68, 70, 71, 73, 75, 76, 79,
                ],
                0.0006,
            ),
            (&[9], 0.00015),
            (
                &[
                    7, 17, 19, 21, 23, 26, 29, 32, 38, 43, 44, 46, 48, 53, 57, 62, 69, 74, 82, 83,
                    84, 85, 86, 87,
                ],
                0.0015,
            ),
        ],
    )
    .map_values("no2_deposition", |beta| No2Deposition { alpha: 0.0, beta })
}

// Water

/// Surface runoff per land-use class, mm
pub fn runoff_mm() -> CodeTable {
    CodeTable::from_dense(
        "runoff",
        1,
        &[
            27.60400151, 27.65534109, 27.83315114, 18.55834169, 19.51634168, 10.21394173,
            36.28438303, 48.82785829, 15.97138114, 14.51422075, 48.72852875, 28.895582,
            48.51622416, 27.37849683, 49.36813124, 27.96605852, 14.11070066, 48.66588942,
            36.22383741, 41.17580981, 15.40753778, 15.48867479, 29.70774627, 29.42066395,
            48.13092135, 17.76264172, 18.11290607, 1.64163875, 19.36504103, 20.1104968,
            0.30421411, 25.66532488, 26.12120455, 20.76559967, 34.38456041, 22.09414157,
            14.95357739, 32.49942893, 32.05539278, 26.35653383, 27.56389486, 24.82414581,
            33.12276817, 49.44629515, 0.14467594, 49.36724941, 49.02557087, 33.66124269,
            33.64659491, 49.19989099, 48.84244489, 48.15353889, 33.81907603, 33.28475863,
            48.5761149, 47.62077389, 19.94862889, 21.64782865, 27.17783869, 47.79304172,
            9.67848073, 12.39895263, 11.01411266, 22.11736761, 18.29311943, 44.99975679,
            49.1108194, 8.11029308, 9.2286522, 11.40581743, 32.50563592, 49.19309454,
            28.18575417, 28.25313891, 23.66870937, 28.21083467, 48.10130333, 0.12401461,
            33.2333038, 34.07063753, 34.0654219, 13.07725357, 10.47765199, 11.55907612,
            14.80240343, 14.46532371, 15.27980652,
        ],
    )
}

const CN_URBAN: [f64; 4] = [98.0, 98.0, 98.0, 98.0];
const CN_WATER: [f64; 4] = [100.0, 100.0, 100.0, 100.0];
const CN_ARABLE: [f64; 4] = [64.0, 76.0, 84.0, 88.0];
const CN_MEADOW: [f64; 4] = [43.0, 65.0, 76.0, 82.0];
const CN_GARDEN: [f64; 4] = [72.0, 82.0, 87.0, 89.0];
const CN_ORCHARD: [f64; 4] = [57.0, 70.0, 78.0, 82.0];
const CN_WOODLAND: [f64; 4] = [35.0, 56.0, 70.0, 77.0];
const CN_GRASS: [f64; 4] = [60.0, 72.0, 81.0, 84.0];
const CN_PAVED_GREEN: [f64; 4] = [77.0, 85.0, 90.0, 92.0];

/// SCS curve numbers per hydrologic soil group `[A, B, C, D]`.
///
/// A curve number of 0 marks a group the class does not occur on.
pub fn curve_numbers() -> CodeTable<[f64; 4]> {
    CodeTable::from_dense(
        "curve_number",
        1,
        &[
            CN_ARABLE,
            CN_ARABLE,
            [71.0, 81.0, 87.0, 90.0],
            CN_ORCHARD,
            CN_ORCHARD,
            [30.0, 58.0, 70.0, 77.0],
            [83.0, 89.0, 92.0, 93.0],
            CN_URBAN,
            CN_MEADOW,
            CN_MEADOW,
            // 11
            CN_URBAN,
            CN_GARDEN,
            CN_URBAN,
            CN_GARDEN,
            CN_URBAN,
            CN_GARDEN,
            CN_MEADOW,
            CN_URBAN,
            [77.0, 86.0, 91.0, 94.0],
            CN_URBAN,
            // 21
            [43.0, 61.0, 76.0, 82.0],
            [43.0, 61.0, 76.0, 82.0],
            [74.0, 84.0, 88.0, 90.0],
            [74.0, 84.0, 88.0, 90.0],
            CN_URBAN,
            [49.0, 69.0, 79.0, 84.0],
            [49.0, 69.0, 79.0, 84.0],
            CN_WATER,
            CN_GRASS,
            CN_GRASS,
            // 31
            CN_WATER,
            [68.0, 79.0, 86.0, 89.0],
            [68.0, 79.0, 86.0, 89.0],
            [50.0, 70.0, 80.0, 85.0],
            [81.0, 88.0, 91.0, 93.0],
            [60.0, 74.0, 83.0, 87.0],
            CN_ORCHARD,
            [73.0, 83.0, 88.0, 91.0],
            [73.0, 83.0, 88.0, 91.0],
            CN_ARABLE,
            // 41
            CN_ARABLE,
            CN_ARABLE,
            CN_PAVED_GREEN,
            CN_URBAN,
            CN_WATER,
            CN_URBAN,
            CN_URBAN,
            CN_PAVED_GREEN,
            CN_PAVED_GREEN,
            CN_URBAN,
            // 51
            CN_URBAN,
            CN_URBAN,
            CN_PAVED_GREEN,
            CN_PAVED_GREEN,
            CN_URBAN,
            CN_URBAN,
            [0.0, 72.0, 81.0, 84.0],
            [0.0, 72.0, 81.0, 84.0],
            CN_ARABLE,
            CN_URBAN,
            // 61
            CN_WOODLAND,
            CN_WOODLAND,
            CN_WOODLAND,
            CN_GRASS,
            CN_GRASS,
            CN_URBAN,
            CN_URBAN,
            [30.0, 58.0, 70.0, 77.0],
            CN_WOODLAND,
            CN_WOODLAND,
            // 71
            CN_PAVED_GREEN,
            CN_URBAN,
            CN_ARABLE,
            CN_ARABLE,
            CN_ARABLE,
            CN_ARABLE,
            CN_URBAN,
            CN_WATER,
            [77.0, 86.0, 91.0, 94.0],
            [92.0, 92.0, 92.0, 92.0],
            // 81
            [92.0, 92.0, 92.0, 92.0],
            [40.0, 63.0, 75.0, 81.0],
            [36.0, 60.0, 73.0, 79.0],
            [36.0, 60.0, 73.0, 79.0],
            [45.0, 66.0, 77.0, 83.0],
            [45.0, 66.0, 77.0, 83.0],
            [36.0, 60.0, 73.0, 79.0],
        ],
    )
}

// Climate

/// Heat mitigation index per land-use class
pub fn heat_mitigation() -> CodeTable {
    CodeTable::from_dense(
        "heat_mitigation",
        1,
        &[
            4.62718336, 3.83420036, 0.4823722, 4.42937216, 4.93675407, 4.15857601, 3.03540913,
            0.86425104, 2.82585889, 1.91524496, 0.67386976, 1.85691874, 0.57390328, 2.44235093,
            0.78460174, 2.25657445, 2.00661297, 1.11856046, 2.96848245, 0.51584438, 3.66727253,
            2.15298825, 2.79566511, 3.28726693, 1.11711756, 2.74429667, 2.11703174, 3.31600525,
            4.1666852, 4.14721283, 2.22970933, 0.8684379, 0.95477925, 3.57055523, 0.21495761,
            0.38677367, 5.20694318, 3.81729612, 3.3219752, 4.45037633, 4.73611724, 4.30607209,
            2.13796834, 1.81924634, 2.48564168, 1.07186001, 0.53461912, 1.95442937, 1.11875979,
            1.1334159, 0.91150442, 1.95317116, 3.5382051, 3.30428226, 1.92616705, 0.39094275,
            2.41044505, 3.20739734, 4.38517119, 0.64614399, 4.16470902, 4.29626227, 4.28313385,
            4.45815007, 3.35787101, 1.57321618, 1.99595624, 3.06093165, 4.0867662, 4.37100281,
            2.09081137, 0.84961896, 4.6212141, 4.92998582, 3.88542519, 5.09573919, 2.57326408,
            2.31943221, 2.1070807, 4.42278093, 3.59365177, 4.43509066, 5.37128195, 5.01703229,
            5.24431647, 5.16957513, 4.71936258,
        ],
    )
}

// Provisioning

/// Pollination value, € per m² and year
pub fn pollination_value() -> CodeTable {
    legend(
        "pollination_value",
        &[
            (
                &[4, 6, 12, 14, 16, 24, 27, 30, 33, 34, 39, 61, 63, 64, 68, 70, 71, 79],
                0.0161,
            ),
            (
                &[
                    7, 9, 10, 17, 19, 21, 22, 23, 26, 29, 32, 38, 43, 44, 46, 48, 49, 53, 57, 62,
                    69, 74, 82, 83, 84, 85, 86, 87,
                ],
                0.0187,
            ),
            (&[37], 0.02),
            (&[58], 0.0196),
        ],
    )
}

/// Agricultural production, t per m² and year
pub fn agricultural_production() -> CodeTable {
    legend(
        "agricultural_production",
        &[
            (&[2, 29, 30, 74, 75], 0.001053),
            (&[4, 5], 0.003),
            (&[6], 0.002154),
            (&[37], 0.00245),
            (&[40], 0.00055),
            (&[41], 0.0012),
            (&[42], 0.004465),
            (&[57, 58, 81], 0.002318),
            (&[59], 0.00051),
            (&[64], 0.0025),
            (&[65], 0.000273),
            (&[68, 69, 70], 0.0011),
            (&[73], 0.000246),
            (&[76], 0.0007),
        ],
    )
}

// Cultural and habitat

/// Recreational suitability score per land-use class (0–1)
pub fn social_score() -> CodeTable {
    CodeTable::from_dense(
        "social_score",
        1,
        &[
            0.4, 0.4, 0.1, 0.1, 0.4, 0.4, 0.1, 0.0, 0.2, 0.2, //
            0.2, 0.2, 0.2, 0.2, 0.1, 0.1, 0.3, 0.2, 0.3, 0.0, //
            0.9, 0.8, 0.7, 0.5, 0.2, 0.6, 0.5, 0.6, 0.5, 0.4, //
            0.9, 0.0, 0.0, 0.1, 0.0, 0.0, 0.4, 0.6, 0.5, 0.4, //
            0.4, 0.4, 0.3, 0.2, 0.7, 0.0, 0.0, 0.1, 0.1, 0.0, //
            0.0, 0.0, 0.2, 0.1, 0.0, 0.1, 0.4, 0.3, 0.4, 0.0, //
            0.7, 0.8, 0.7, 0.4, 0.4, 0.0, 0.0, 0.6, 0.8, 0.6, //
            0.1, 0.0, 0.4, 0.4, 0.4, 0.4, 0.0, 0.8, 0.4, 0.0, //
            0.0, 0.8, 0.9, 0.9, 0.75, 0.6, 0.9,
        ],
    )
}

/// Cultural service value, € per m² and year
pub fn social_value() -> CodeTable {
    legend(
        "social_value",
        &[
            (
                &[
                    1, 2, 4, 5, 6, 7, 19, 29, 30, 37, 38, 39, 40, 41, 42, 43, 44, 57, 58, 59, 61,
                    62, 63, 64, 65, 68, 69, 70, 73, 74, 75, 76, 79,
                ],
                1.44,
            ),
            (&[9, 10, 17, 21, 22, 23, 24, 26, 27], 2.36),
            (FOREST_CODES, 1.49),
        ],
    )
}

/// Habitat quality score per land-use class (0–1)
pub fn habitat_score() -> CodeTable {
    CodeTable::from_dense(
        "habitat_score",
        1,
        &[
            0.4, 0.4, 0.0, 0.5, 0.5, 0.5, 0.1, 0.0, 0.15, 0.05, //
            0.0, 0.05, 0.0, 0.05, 0.0, 0.05, 0.15, 0.0, 0.1, 0.0, //
            1.0, 0.85, 0.6, 0.25, 0.0, 0.15, 0.1, 0.0, 0.5, 0.4, //
            1.0, 0.0, 0.0, 0.1, 0.0, 0.0, 0.5, 0.75, 0.5, 0.4, //
            0.4, 0.4, 0.5, 0.3, 0.5, 0.15, 0.0, 0.35, 0.1, 0.0, //
            0.0, 0.0, 0.15, 0.05, 0.0, 0.0, 0.45, 0.4, 0.4, 0.0, //
            0.45, 0.65, 0.55, 0.4, 0.4, 0.0, 0.0, 0.5, 0.65, 0.55, //
            0.05, 0.0, 0.4, 0.5, 0.4, 0.4, 0.0, 0.7, 0.55, 0.0, //
            0.0, 0.9, 1.0, 1.0, 0.75, 0.6, 1.0,
        ],
    )
}

/// Biodiversity value, € per m² and year
pub fn biodiversity_value() -> CodeTable {
    legend(
        "biodiversity_value",
        &[
            (
                &[
                    1, 2, 4, 5, 6, 29, 30, 37, 39, 40, 41, 42, 57, 58, 59, 61, 62, 63, 64, 65, 68,
                    69, 73, 74, 75, 76, 79,
                ],
                0.16,
            ),
            (&[9, 10, 17, 21, 22], 0.23),
            (&[7, 19, 23, 26, 32, 43, 44, 46, 48, 53, 71], 0.03),
            (&[12, 14, 16, 24, 27, 33, 34, 49, 54], 0.01),
            (&[81, 82, 83, 84, 85, 86, 87], 0.91),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_tables_cover_the_legend() {
        assert_eq!(runoff_mm().len(), 87);
        assert_eq!(heat_mitigation().len(), 87);
        assert_eq!(curve_numbers().len(), 87);
        assert_eq!(social_score().len(), 87);
        assert_eq!(habitat_score().len(), 87);
    }

    #[test]
    fn sparse_tables_are_filled_over_the_legend() {
        for table in [
            soil_carbon(),
            above_ground_carbon(),
            ozone_removal(),
            growing_season_seconds(),
            leaf_area_index(),
            pollination_value(),
            agricultural_production(),
            social_value(),
            biodiversity_value(),
        ] {
            assert_eq!(table.len(), 87, "{}", table.name());
            assert_eq!(table.get(0), None);
        }
        assert_eq!(no2_deposition().len(), 87);
    }

    #[test]
    fn spot_check_values() {
        assert_eq!(soil_carbon().get(7), Some(0.0056));
        assert_eq!(soil_carbon().get(70), Some(0.00679));
        assert_eq!(above_ground_carbon().get(9), Some(0.001439));
        assert_eq!(above_ground_carbon().get(85), Some(0.0218));
        assert_eq!(curve_numbers().get(1), Some([64.0, 76.0, 84.0, 88.0]));
        assert_eq!(curve_numbers().get(57), Some([0.0, 72.0, 81.0, 84.0]));
        assert_eq!(curve_numbers().get(87), Some([36.0, 60.0, 73.0, 79.0]));
        assert_eq!(runoff_mm().get(45), Some(0.14467594));
        assert_eq!(heat_mitigation().get(87), Some(4.71936258));
        assert_eq!(social_score().get(85), Some(0.75));
        assert_eq!(habitat_score().get(21), Some(1.0));
        assert_eq!(no2_deposition().get(9).map(|d| d.beta), Some(0.00015));
        assert_eq!(no2_deposition().get(3).map(|d| d.beta), Some(0.0));
        assert_eq!(growing_season_seconds().get(70), Some(0.0));
        assert_eq!(leaf_area_index().get(70), Some(0.02));
    }

    #[test]
    fn tree_codes_are_in_the_legend() {
        assert!(TREE_CODES.iter().all(|c| LAND_USE_CODES.contains(c)));
        assert!(tree_codes().contains(70));
    }
}
