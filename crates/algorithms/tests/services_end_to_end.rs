//! End-to-end runs of the calculators through GeoTIFF files.
//!
//! Every test writes its land-use maps to a temporary directory, reads them
//! back, runs one or more calculators and stores their outputs the way the
//! command line does, then checks the stored rasters and reports.

use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime};
use ecoserv_algorithms::engine::{LandUseCode, Scenario, ScenarioPair};
use ecoserv_algorithms::reference::load_price_table;
use ecoserv_algorithms::services::agriculture::{agricultural_production_value, AgricultureParams};
use ecoserv_algorithms::services::carbon::{
    carbon_sequestration, carbon_stock, discount_coefficient, CarbonSequestrationParams,
    CarbonStockParams,
};
use ecoserv_algorithms::services::hydrogeology::{
    curve_number_runoff, hydrogeological_protection, HydrogeologyParams,
};
use ecoserv_algorithms::services::infiltration::{
    infiltration, infiltration_value, InfiltrationParams, InfiltrationValueParams,
};
use ecoserv_algorithms::services::total::{total_value, TotalParams};
use ecoserv_algorithms::services::{IntoServiceOutput, ServiceOutput};
use ecoserv_algorithms::reference::coefficients::{
    biodiversity_value, habitat_score, heat_mitigation, pollination_value, social_value,
};
use ecoserv_algorithms::services::biodiversity::{
    biodiversity, penalty, BiodiversityParams, Disturbance, DisturbanceProfile, ProximityLevel,
};
use ecoserv_algorithms::services::pollination::{pollination, PollinationParams};
use ecoserv_algorithms::services::pollutants::{
    pollutant_removal, pollutant_value, Pollutant, PollutantPairs, PollutantPrices,
    PollutantRemovalParams, PollutantValueParams,
};
use ecoserv_algorithms::services::social::{
    ros_index, social_benefits, SocialContext, SocialParams, UrbanGreen,
};
use ecoserv_algorithms::services::temperature::{temperature_regulation, TemperatureParams};
use ecoserv_core::io::{read_geotiff, write_geotiff};
use ecoserv_core::{GeoTransform, Raster, CRS};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn when() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

const NODATA: LandUseCode = 255;

fn grid() -> GeoTransform {
    GeoTransform::new(396_000.0, 4_990_000.0, 2.0, -2.0)
}

fn land_use(values: Vec<LandUseCode>, rows: usize, cols: usize) -> Raster<LandUseCode> {
    let mut r = Raster::from_vec(values, rows, cols).unwrap();
    r.set_transform(grid());
    r.set_crs(Some(CRS::from_epsg(32632)));
    r.set_nodata(Some(NODATA));
    r
}

/// Stored outputs sit on the grid and projection of the land-use maps.
fn assert_on_input_grid(stored: &Raster<f64>) {
    assert_eq!(stored.transform(), &grid());
    assert_eq!(stored.crs().and_then(|c| c.epsg()), Some(32632));
    assert_eq!(stored.transform().pixel_area(), 4.0);
}

fn read_code_pair(present: &Path, future: &Path) -> ScenarioPair<LandUseCode> {
    let present: Raster<LandUseCode> = read_geotiff(present).unwrap();
    let future: Raster<LandUseCode> = read_geotiff(future).unwrap();
    assert_eq!(present.nodata(), Some(NODATA));
    assert_eq!(future.crs(), Some(&CRS::from_epsg(32632)));
    ScenarioPair::new(present, future).unwrap()
}

fn read_stored(dir: &Path, name: &str) -> Raster<f64> {
    let stored: Raster<f64> = read_geotiff(dir.join(name)).unwrap();
    assert_on_input_grid(&stored);
    stored
}

fn truncated(value: f64) -> String {
    format!("{}", value.trunc() as i64)
}

fn write_codes(dir: &Path, name: &str, raster: &Raster<LandUseCode>) -> PathBuf {
    let path = dir.join(name);
    write_geotiff(raster, &path, None).unwrap();
    path
}

/// Store outputs the way the command line does; returns the written paths.
fn persist(output: &ServiceOutput, dir: &Path) -> Vec<PathBuf> {
    let mut written = Vec::new();
    for named in &output.rasters {
        let path = dir.join(&named.file_name);
        write_geotiff(&named.raster, &path, None).unwrap();
        written.push(path);
    }
    if let Some(named) = &output.report {
        let path = dir.join(&named.file_name);
        fs::write(&path, named.report.to_string()).unwrap();
        written.push(path);
    }
    written
}

#[test]
fn carbon_stock_then_sequestration() {
    let tmp = TempDir::new().unwrap();
    let present_path = write_codes(tmp.path(), "present.tif", &land_use(vec![7, 9, 0, 7], 2, 2));
    let future_path = write_codes(tmp.path(), "future.tif", &land_use(vec![7, 7, 7, 7], 2, 2));

    let mut stock_paths = Vec::new();
    for (scenario, path) in [(Scenario::Present, &present_path), (Scenario::Future, &future_path)] {
        let codes: Raster<LandUseCode> = read_geotiff(path).unwrap();
        let params = CarbonStockParams {
            scenario,
            ..Default::default()
        };
        let output = carbon_stock(&codes, &params).unwrap().into_output(when());
        assert_eq!(output.message, "Completed");
        stock_paths.extend(persist(&output, tmp.path()));
    }
    assert!(tmp.path().join("01_carbonio_presente_ton.tiff").exists());
    assert!(tmp.path().join("01_carbonio_futuro_ton.tiff").exists());

    let present: Raster<f64> = read_geotiff(&stock_paths[0]).unwrap();
    let future: Raster<f64> = read_geotiff(&stock_paths[1]).unwrap();
    assert_on_input_grid(&present);
    assert_on_input_grid(&future);
    let c7 = 4.0 * (0.0056 + 0.000047);
    let c9 = 4.0 * (0.0056 + 0.001439);
    assert_relative_eq!(present.get(0, 0).unwrap(), c7, epsilon = 1e-12);
    assert_relative_eq!(present.get(0, 1).unwrap(), c9, epsilon = 1e-12);
    assert_eq!(present.get(1, 0).unwrap(), 0.0);

    let stocks = ScenarioPair::new(present, future).unwrap();
    let result = carbon_sequestration(&stocks, &CarbonSequestrationParams::default()).unwrap();
    let coefficient = discount_coefficient(9, 0.0, 3.0);
    assert_relative_eq!(
        result.value_delta.get(0, 1).unwrap(),
        81.84 * (c7 - c9) / 9.0 * coefficient,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        result.value_delta.get(1, 0).unwrap(),
        81.84 * c7 / 9.0 * coefficient,
        epsilon = 1e-9
    );

    let written = persist(&result.into_output(when()), tmp.path());
    let report = fs::read_to_string(tmp.path().join("SE_sequestro_carbonio.txt")).unwrap();
    assert!(written.iter().any(|p| p.ends_with("SE_01_sequestro_carbonio_delta_euro.tiff")));
    assert!(report.starts_with("Sommario dell'analisi del sequestro di carbonio\nData: 2024-03-01-12:00:00"));
}

#[test]
fn hydrogeological_protection_from_files() {
    let tmp = TempDir::new().unwrap();
    let table = ecoserv_algorithms::reference::coefficients::curve_numbers();
    let code = table
        .iter()
        .find(|(_, groups)| groups[0] == 64.0)
        .map(|(code, _)| code)
        .unwrap();

    let present_path = write_codes(tmp.path(), "present.tif", &land_use(vec![0; 6], 2, 3));
    let future_path = write_codes(tmp.path(), "future.tif", &land_use(vec![code; 6], 2, 3));
    let codes = read_code_pair(&present_path, &future_path);

    let result = hydrogeological_protection(&codes, &HydrogeologyParams::default()).unwrap();
    let retained = curve_number_runoff(64.0, 55.32).unwrap().retained();
    assert_relative_eq!(result.comparison.delta.aggregates.sum, 6.0 * retained, epsilon = 1e-9);

    persist(&result.into_output(when()), tmp.path());
    let stored = read_stored(tmp.path(), "04_protezione_idrogeologica_futuro_mm.tiff");
    assert_relative_eq!(stored.get(1, 2).unwrap(), retained, epsilon = 1e-9);
    assert_eq!(stored.nodata(), None);

    let delta = read_stored(tmp.path(), "SE_04_protezione_idrogeologica_delta_euro.tiff");
    assert_relative_eq!(
        delta.get(0, 0).unwrap(),
        300.0 * retained / 1000.0 * 4.0,
        epsilon = 1e-9
    );
}

#[test]
fn infiltration_then_value() {
    let tmp = TempDir::new().unwrap();
    let present_path = write_codes(tmp.path(), "present.tif", &land_use(vec![1, 1, 1, 1], 2, 2));
    let future_path = write_codes(tmp.path(), "future.tif", &land_use(vec![1, 1, 82, 82], 2, 2));

    for (scenario, path) in [(Scenario::Present, &present_path), (Scenario::Future, &future_path)] {
        let codes: Raster<LandUseCode> = read_geotiff(path).unwrap();
        let params = InfiltrationParams {
            scenario,
            ..Default::default()
        };
        persist(&infiltration(&codes, &params).unwrap().into_output(when()), tmp.path());
    }

    let depths = ScenarioPair::new(
        read_stored(tmp.path(), "05_infiltrazione_presente_mm.tiff"),
        read_stored(tmp.path(), "05_infiltrazione_futuro_mm.tiff"),
    )
    .unwrap();
    let result = infiltration_value(&depths, &InfiltrationValueParams::default()).unwrap();
    assert_on_input_grid(&result.value_delta);

    // unchanged cells carry no value difference
    assert_eq!(result.value_delta.get(0, 0).unwrap(), 0.0);
    let expected = 300.0 * (depths.future().get(1, 0).unwrap() - depths.present().get(1, 0).unwrap())
        / 1000.0
        * 4.0;
    assert_relative_eq!(result.value_delta.get(1, 0).unwrap(), expected, epsilon = 1e-9);
}

#[test]
fn agriculture_with_price_list_file() {
    let tmp = TempDir::new().unwrap();
    let prices = tmp.path().join("prezzi.csv");
    fs::write(&prices, "Lucode;Descrizione;Produzione agricola €_ton\n4;Seminativi;200\n6;Risaie;300,5\n").unwrap();

    let codes = ScenarioPair::new(
        land_use(vec![4, 4, 1, 1], 2, 2),
        land_use(vec![6, 6, 1, 1], 2, 2),
    )
    .unwrap();
    let params = AgricultureParams {
        prices: load_price_table(&prices).unwrap(),
        ..Default::default()
    };
    let result = agricultural_production_value(&codes, &params).unwrap();
    assert_relative_eq!(
        result.value_delta.sum(),
        2.0 * (300.5 * 0.002154 - 200.0 * 0.003) * 4.0,
        epsilon = 1e-9
    );

    persist(&result.into_output(when()), tmp.path());
    let report = fs::read_to_string(tmp.path().join("SE_produzione_agricola.txt")).unwrap();
    assert!(report.contains("Elenco LuCode area in esame: [1 4]"));
    assert!(report.contains("Elenco LuCode area in esame: [1 6]"));
}

#[test]
fn total_of_stored_deltas() {
    let tmp = TempDir::new().unwrap();
    let mut paths = Vec::new();
    for i in 0..6 {
        let value = if i == 5 { 1.0 } else { 0.0 };
        let mut r = Raster::filled(10, 10, value);
        r.set_transform(GeoTransform::new(0.0, 20.0, 2.0, -2.0));
        let path = tmp.path().join(format!("delta_{}.tif", i));
        write_geotiff(&r, &path, None).unwrap();
        paths.push(path);
    }

    let deltas: Vec<Raster<f64>> = paths.iter().map(|p| read_geotiff(p).unwrap()).collect();
    let refs: Vec<&Raster<f64>> = deltas.iter().collect();
    let result = total_value(&refs, &TotalParams::default()).unwrap();
    assert_relative_eq!(result.total.aggregates.sum, 100.0, epsilon = 1e-12);
    assert_relative_eq!(result.total.aggregates.mean, 100.0 / 100.0, epsilon = 1e-12);
    assert_relative_eq!(
        result.total.aggregates.per_hectare,
        100.0 / (100.0 * 4.0) * 10_000.0,
        epsilon = 1e-9
    );

    persist(&result.into_output(when()), tmp.path());
    let report = fs::read_to_string(tmp.path().join("SE_totale.txt")).unwrap();
    assert!(report.contains("Differenza di valore totale (€): 100.000000"));
    assert!(report.contains("Differenza per unità di superficie (€/ha): 2500.000000"));
}

#[test]
fn pollutant_removal_then_value() {
    let tmp = TempDir::new().unwrap();
    let present_path = write_codes(tmp.path(), "present.tif", &land_use(vec![7, 9, 0, 7], 2, 2));
    let future_path = write_codes(tmp.path(), "future.tif", &land_use(vec![21, 21, 7, NODATA], 2, 2));

    for (scenario, path) in [(Scenario::Present, &present_path), (Scenario::Future, &future_path)] {
        let codes: Raster<LandUseCode> = read_geotiff(path).unwrap();
        let params = PollutantRemovalParams {
            scenario,
            ..Default::default()
        };
        let output = pollutant_removal(&codes, &params).unwrap().into_output(when());
        assert!(output.report.is_none());
        persist(&output, tmp.path());
    }

    let pair = |pollutant: Pollutant| {
        ScenarioPair::new(
            read_stored(tmp.path(), &pollutant.removal_file_name(Scenario::Present)),
            read_stored(tmp.path(), &pollutant.removal_file_name(Scenario::Future)),
        )
        .unwrap()
    };
    assert!(tmp.path().join("02_rimozione_ozono_presente_kg.tiff").exists());
    let pairs = PollutantPairs::new(pair(Pollutant::Ozone), pair(Pollutant::Pm10), pair(Pollutant::No2)).unwrap();

    // the nodata cell of the future map removes nothing
    for pollutant in Pollutant::ALL {
        assert_eq!(pairs.get(pollutant).future().get(1, 1).unwrap(), 0.0);
    }

    let result = pollutant_value(&pairs, &PollutantValueParams::default()).unwrap();
    let prices = PollutantPrices::default();
    let expected: f64 = Pollutant::ALL
        .iter()
        .map(|&p| {
            let pair = pairs.get(p);
            (pair.future().get(0, 0).unwrap() - pair.present().get(0, 0).unwrap()) * prices.get(p)
        })
        .sum();
    assert!(expected != 0.0);
    let value_sum = result.value_delta.sum();

    persist(&result.into_output(when()), tmp.path());
    let delta = read_stored(tmp.path(), "SE_02_rimozione_inquinanti_delta_euro.tiff");
    assert_relative_eq!(delta.get(0, 0).unwrap(), expected, epsilon = 1e-9);

    let report = fs::read_to_string(tmp.path().join("SE_rimozione_inquinanti.txt")).unwrap();
    assert!(report.starts_with("Sommario dell'analisi della rimozione inquinanti\n"));
    assert!(report.contains("Rimozione NO2 Stato attuale (ton): "));
    assert!(report.contains("Rimozione ozono Stato di progetto (ton): "));
    assert!(report.contains(&format!(
        "Differenza in termini economici del SE Rimozione inquinanti (stato di progetto – stato attuale) (€): {}\n",
        truncated(value_sum)
    )));
}

#[test]
fn temperature_regulation_from_files() {
    let tmp = TempDir::new().unwrap();
    let present_path = write_codes(tmp.path(), "present.tif", &land_use(vec![1, 2, 3, 4, 5, 6], 2, 3));
    let future_path = write_codes(tmp.path(), "future.tif", &land_use(vec![87, 87, 3, 0, 5, NODATA], 2, 3));
    let codes = read_code_pair(&present_path, &future_path);

    let result = temperature_regulation(&codes, &TemperatureParams::default()).unwrap();
    let value_sum = result.value_delta.sum();
    persist(&result.into_output(when()), tmp.path());

    let table = heat_mitigation();
    let hm = |code: LandUseCode| table.get(code).unwrap() * 4.0;
    let present = read_stored(tmp.path(), "03_regolazione_temperatura_presente.tiff");
    let future = read_stored(tmp.path(), "03_regolazione_temperatura_futuro.tiff");
    assert_relative_eq!(present.get(0, 0).unwrap(), hm(1), epsilon = 1e-9);
    assert_relative_eq!(future.get(0, 0).unwrap(), hm(87), epsilon = 1e-9);
    assert_eq!(future.get(1, 0).unwrap(), 0.0);
    assert_eq!(future.get(1, 2).unwrap(), 0.0);

    let delta = read_stored(tmp.path(), "SE_03_regolazione_temperatura_delta_euro.tiff");
    assert_relative_eq!(delta.get(0, 1).unwrap(), (hm(87) - hm(2)) * 1.6 * 0.1, epsilon = 1e-9);
    assert_eq!(delta.get(0, 2).unwrap(), 0.0);
    assert_relative_eq!(delta.get(1, 2).unwrap(), -hm(6) * 0.16, epsilon = 1e-9);

    let report = fs::read_to_string(tmp.path().join("SE_regolazione_temperatura.txt")).unwrap();
    assert!(report.contains("Anno corrente: 2021"));
    assert!(report.contains(&format!(
        "Regolazione della temperatura Stato attuale: {:.6}",
        present.sum()
    )));
    assert!(report.contains(&format!(
        "(stato di progetto – stato attuale) (€): {}",
        truncated(value_sum)
    )));
}

#[test]
fn social_benefits_from_files() {
    let tmp = TempDir::new().unwrap();
    let present_path = write_codes(tmp.path(), "present.tif", &land_use(vec![21, 21, 0, 3], 2, 2));
    let future_path = write_codes(tmp.path(), "future.tif", &land_use(vec![21, 9, 11, 3], 2, 2));
    let codes = read_code_pair(&present_path, &future_path);

    let params = SocialParams {
        future: SocialContext {
            green: [UrbanGreen::LargePark].into_iter().collect(),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = social_benefits(&codes, &params).unwrap();
    let delta_sum = result.comparison.delta.aggregates.sum;
    persist(&result.into_output(when()), tmp.path());

    let ros_present = ros_index(&[0, 3, 21], &SocialContext::default());
    let ros_future = ros_index(&[3, 9, 11, 21], &params.future);
    let ros = read_stored(tmp.path(), "06_benefici_sociali_futuro_ROS.tiff");
    assert_relative_eq!(ros.get(0, 1).unwrap(), ros_future, epsilon = 1e-9);

    let values = social_value();
    let present = read_stored(tmp.path(), "06_benefici_sociali_presente_euro.tiff");
    let future = read_stored(tmp.path(), "06_benefici_sociali_futuro_euro.tiff");
    assert_relative_eq!(
        present.get(0, 0).unwrap(),
        4.0 * ros_present * values.get(21).unwrap(),
        epsilon = 1e-9
    );
    assert_relative_eq!(
        future.get(0, 1).unwrap(),
        4.0 * ros_future * values.get(9).unwrap(),
        epsilon = 1e-9
    );

    let delta = read_stored(tmp.path(), "SE_06_benefici_sociali_delta_euro.tiff");
    for row in 0..2 {
        for col in 0..2 {
            assert_relative_eq!(
                delta.get(row, col).unwrap(),
                future.get(row, col).unwrap() - present.get(row, col).unwrap(),
                epsilon = 1e-9
            );
        }
    }

    let report = fs::read_to_string(tmp.path().join("SE_benefici_sociali.txt")).unwrap();
    assert!(report.contains(&format!("Valore ROS - Stato attuale: {:.6}", ros_present)));
    assert!(report.contains(&format!("Valore ROS - Stato di progetto: {:.6}", ros_future)));
    assert!(report.contains(&format!(
        "Differenza in termini economici dei benefici sociali (stato di progetto – stato attuale) (€): {}",
        truncated(delta_sum)
    )));
}

#[test]
fn biodiversity_from_files() {
    let tmp = TempDir::new().unwrap();
    let present_path = write_codes(tmp.path(), "present.tif", &land_use(vec![82, 82, 1, 0], 2, 2));
    let future_path = write_codes(tmp.path(), "future.tif", &land_use(vec![82, 12, 1, 0], 2, 2));
    let codes = read_code_pair(&present_path, &future_path);

    let params = BiodiversityParams {
        future: DisturbanceProfile::default()
            .with(Disturbance::VehicularRoads, ProximityLevel::Near)
            .with(Disturbance::Landfill, ProximityLevel::Distant),
        ..Default::default()
    };
    let result = biodiversity(&codes, &params).unwrap();
    let delta_sum = result.comparison.delta.aggregates.sum;
    persist(&result.into_output(when()), tmp.path());

    let habitat = habitat_score();
    let unit_value = biodiversity_value();
    let future_penalty = params.future.penalty();
    assert_relative_eq!(future_penalty, penalty(6), epsilon = 1e-12);
    let q_present = read_stored(tmp.path(), "07_biodiversita_presente_Q.tiff");
    let q_future = read_stored(tmp.path(), "07_biodiversita_futuro_Q.tiff");
    assert_relative_eq!(q_present.get(0, 0).unwrap(), habitat.get(82).unwrap(), epsilon = 1e-12);
    assert_relative_eq!(
        q_future.get(0, 0).unwrap(),
        habitat.get(82).unwrap() * future_penalty,
        epsilon = 1e-12
    );
    assert_eq!(q_future.get(1, 1).unwrap(), 0.0);

    let value = |code: LandUseCode, q: f64| unit_value.get(code).unwrap() * q * 4.0;
    let delta = read_stored(tmp.path(), "SE_07_biodiversita_delta_euro.tiff");
    assert_relative_eq!(
        delta.get(0, 1).unwrap(),
        value(12, q_future.get(0, 1).unwrap()) - value(82, q_present.get(0, 1).unwrap()),
        epsilon = 1e-9
    );
    assert_relative_eq!(delta.sum(), delta_sum, epsilon = 1e-9);

    let report = fs::read_to_string(tmp.path().join("SE_biodiversita.txt")).unwrap();
    assert!(report.contains("Valore della biodiversità nello stato attuale (0-1): "));
    assert!(report.contains(&format!(
        "(stato di progetto – stato attuale) (€): {}",
        truncated(delta_sum)
    )));
}

#[test]
fn pollination_from_files() {
    let tmp = TempDir::new().unwrap();
    let present_path = write_codes(tmp.path(), "present.tif", &land_use(vec![4, 4, 7, 0], 2, 2));
    let future_path = write_codes(tmp.path(), "future.tif", &land_use(vec![7, 4, 0, 0], 2, 2));
    let codes = read_code_pair(&present_path, &future_path);

    let output = pollination(&codes, &PollinationParams::default())
        .unwrap()
        .into_output(when());
    assert_eq!(output.rasters.len(), 1);
    persist(&output, tmp.path());

    let table = pollination_value();
    let v = |code: LandUseCode| table.get(code).unwrap() * 4.0;
    let delta = read_stored(tmp.path(), "SE_09_impollinazione_delta_euro.tiff");
    assert_relative_eq!(delta.get(0, 0).unwrap(), v(7) - v(4), epsilon = 1e-12);
    assert_eq!(delta.get(0, 1).unwrap(), 0.0);
    assert_relative_eq!(delta.get(1, 0).unwrap(), -v(7), epsilon = 1e-12);

    let report = fs::read_to_string(tmp.path().join("SE_impollinazione.txt")).unwrap();
    assert!(report.starts_with("Report dell'analisi dell'impollinazione\nData: 2024-03-01-12:00:00"));
    assert!(report.contains(&format!("Impollinazione Stato attuale (€): {:.6}", 2.0 * v(4) + v(7))));
    assert!(report.contains("Variazione valore totale dell'impollinazione (€): 0\n"));
}
