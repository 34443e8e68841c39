//! Coordinate Reference System handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference system attached to a raster.
///
/// Only what GeoTIFF keys can carry is kept: an EPSG code, a WKT string,
/// or both. The engine never reprojects; the CRS is copied from the input
/// maps to every output map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    wkt: Option<String>,
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
        }
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Whether the EPSG code falls in the geographic (lat/lon) range.
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, Some(4000..=4999))
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // Textual comparison only
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a.trim() == b.trim();
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let head: String = wkt.chars().take(50).collect();
            return format!("WKT:{}", head);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(32632);
        assert_eq!(crs.epsg(), Some(32632));
        assert_eq!(crs.identifier(), "EPSG:32632");
        assert!(!crs.is_geographic());
        assert!(CRS::from_epsg(4326).is_geographic());
    }

    #[test]
    fn test_crs_equivalence() {
        assert!(CRS::from_epsg(3003).is_equivalent(&CRS::from_epsg(3003)));
        assert!(!CRS::from_epsg(3003).is_equivalent(&CRS::from_epsg(32632)));
        assert!(!CRS::from_epsg(3003).is_equivalent(&CRS::from_wkt("PROJCS[...]")));
    }

    #[test]
    fn test_identifier_truncates_wkt_on_char_boundary() {
        let wkt = "PROJCS[\"Monte Mario / Italy zone 1\",GEOGCS[\"Monte Mario\",DATUM[\"Monte_Mario\"]]]";
        let id = CRS::from_wkt(wkt).identifier();
        assert!(id.starts_with("WKT:PROJCS"));
        assert_eq!(id.chars().count(), 54);
    }
}
