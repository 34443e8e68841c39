//! Agricultural price list loader.
//!
//! The price list is a `;`-separated file with at least the columns
//! `Lucode` and `Produzione agricola €_ton`. Numbers may use a decimal comma.

use crate::engine::{CodeTable, LandUseCode};
use ecoserv_core::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Lucode")]
    lucode: String,
    #[serde(rename = "Produzione agricola €_ton")]
    price: String,
}

fn parse_number(field: &str) -> Option<f64> {
    field.trim().replace(',', ".").parse().ok()
}

fn parse_code(field: &str) -> Option<LandUseCode> {
    let value = parse_number(field)?;
    (value.fract() == 0.0 && value >= f64::from(LandUseCode::MIN) && value <= f64::from(LandUseCode::MAX))
        .then_some(value as LandUseCode)
}

/// Read a price list (€ per tonne by land-use code) from any reader.
pub fn read_price_table<R: Read>(reader: R) -> Result<CodeTable> {
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut pairs = Vec::new();
    for (index, row) in csv.deserialize::<PriceRow>().enumerate() {
        // header is line 1
        let line = index + 2;
        let row = row.map_err(|e| Error::Csv(format!("line {}: {}", line, e)))?;
        let code = parse_code(&row.lucode)
            .ok_or_else(|| Error::Csv(format!("line {}: invalid land-use code '{}'", line, row.lucode)))?;
        let price = parse_number(&row.price)
            .ok_or_else(|| Error::Csv(format!("line {}: invalid price '{}'", line, row.price)))?;
        pairs.push((code, price));
    }

    Ok(CodeTable::from_pairs("agricultural_price", &pairs))
}

/// Load a price list from a file.
pub fn load_price_table<P: AsRef<Path>>(path: P) -> Result<CodeTable> {
    let file = File::open(path.as_ref())?;
    read_price_table(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_semicolon_file_with_decimal_comma() {
        let data = "Lucode;Descrizione;Produzione agricola €_ton\n\
                    4;Seminativi;250,5\n\
                    42;Orti;1200\n\
                    57.0;Frutteti; 800.25 \n";
        let table = read_price_table(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(4), Some(250.5));
        assert_eq!(table.get(42), Some(1200.0));
        assert_eq!(table.get(57), Some(800.25));
        assert_eq!(table.get(5), None);
    }

    #[test]
    fn rejects_bad_price() {
        let data = "Lucode;Produzione agricola €_ton\n4;n.d.\n";
        let err = read_price_table(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn rejects_missing_column() {
        let data = "Lucode;Prezzo\n4;10\n";
        assert!(matches!(read_price_table(data.as_bytes()), Err(Error::Csv(_))));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prezzi.csv");
        std::fs::write(&path, "Lucode;Produzione agricola €_ton\n2;300\n").unwrap();
        assert_eq!(load_price_table(&path).unwrap().get(2), Some(300.0));
    }
}
