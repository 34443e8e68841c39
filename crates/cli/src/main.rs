//! ecoserv CLI - urban ecosystem-service valuation of land-use maps

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ecoserv_algorithms::engine::{
    code_histogram, CanopyMode, LandUseCode, Scenario, ScenarioPair, SpeciesRecord,
    SpeciesSelection,
};
use ecoserv_algorithms::reference::{load_price_table, Species};
use ecoserv_algorithms::services::agriculture::{agricultural_production_value, AgricultureParams};
use ecoserv_algorithms::services::biodiversity::{
    biodiversity, BiodiversityParams, Disturbance, DisturbanceProfile, ProximityLevel,
};
use ecoserv_algorithms::services::carbon::{
    carbon_sequestration, carbon_stock, CarbonSequestrationParams, CarbonStockParams,
};
use ecoserv_algorithms::services::hydrogeology::{
    hydrogeological_protection, HydrogeologyParams, HydrologicGroup,
};
use ecoserv_algorithms::services::infiltration::{
    infiltration, infiltration_value, InfiltrationParams, InfiltrationValueParams,
};
use ecoserv_algorithms::services::pollination::{pollination, PollinationParams};
use ecoserv_algorithms::services::pollutants::{
    pollutant_removal, pollutant_value, PollutantPairs, PollutantPrices, PollutantRemovalParams,
    PollutantValueParams,
};
use ecoserv_algorithms::services::social::{
    social_benefits, Amenity, NaturalAspect, SocialContext, SocialParams, UrbanGreen,
};
use ecoserv_algorithms::services::temperature::{temperature_regulation, TemperatureParams};
use ecoserv_algorithms::services::total::{total_value, TotalParams};
use ecoserv_algorithms::services::{IntoServiceOutput, ServiceOutput, Years};
use ecoserv_core::io::{read_geotiff, write_geotiff, GeoTiffOptions};
use ecoserv_core::Raster;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ecoserv")]
#[command(author, version, about = "Urban ecosystem-service valuation of land-use maps", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a land-use raster
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Soil and above-ground carbon stock of one land-use map
    CarbonStock {
        #[command(flatten)]
        map: SingleMapArgs,
        #[command(flatten)]
        trees: SpeciesArgs,
    },
    /// Ozone, PM10 and NO2 removed by the vegetation of one land-use map
    PollutantRemoval {
        #[command(flatten)]
        map: SingleMapArgs,
        #[command(flatten)]
        trees: SpeciesArgs,
        /// Mean NO2 concentration (µg/m³)
        #[arg(long, default_value = "43.72")]
        no2: f64,
        /// Mean PM10 concentration (µg/m³)
        #[arg(long, default_value = "30")]
        pm10: f64,
        /// Mean wind speed (m/s)
        #[arg(long, default_value = "1.4")]
        wind_speed: f64,
    },
    /// Rainfall infiltration of one land-use map
    Infiltration {
        #[command(flatten)]
        map: SingleMapArgs,
        #[command(flatten)]
        trees: SpeciesArgs,
        /// Design rainfall (mm)
        #[arg(long, default_value = "55.32")]
        rainfall: f64,
    },
    /// Economic valuation of a present / project scenario pair
    Se {
        #[command(subcommand)]
        service: SeCommands,
    },
}

#[derive(Subcommand)]
enum SeCommands {
    /// Carbon sequestration from two carbon-stock rasters
    Carbon {
        #[command(flatten)]
        pair: PairArgs,
        /// Price of carbon (€/t)
        #[arg(long, default_value = "81.84")]
        price: f64,
        /// Discount rate (%)
        #[arg(long, default_value = "0")]
        discount_rate: f64,
        /// Capitalization rate (%)
        #[arg(long, default_value = "3")]
        capitalization_rate: f64,
    },
    /// Pollutant removal from six removal rasters
    Pollutants {
        /// Present ozone removal raster
        #[arg(long)]
        present_ozone: PathBuf,
        /// Present PM10 removal raster
        #[arg(long)]
        present_pm10: PathBuf,
        /// Present NO2 removal raster
        #[arg(long)]
        present_no2: PathBuf,
        /// Project ozone removal raster
        #[arg(long)]
        future_ozone: PathBuf,
        /// Project PM10 removal raster
        #[arg(long)]
        future_pm10: PathBuf,
        /// Project NO2 removal raster
        #[arg(long)]
        future_no2: PathBuf,
        #[command(flatten)]
        common: CommonArgs,
        /// Social cost of ozone (€/t)
        #[arg(long, default_value = "14658.11")]
        ozone_price: f64,
        /// Social cost of PM10 (€/t)
        #[arg(long, default_value = "17132.56")]
        pm10_price: f64,
        /// Social cost of NO2 (€/t)
        #[arg(long, default_value = "77641.89")]
        no2_price: f64,
    },
    /// Temperature regulation from two land-use maps
    Temperature {
        #[command(flatten)]
        pair: PairArgs,
        /// Value of one unit of heat mitigation (€/m²)
        #[arg(long, default_value = "1.6")]
        unit_value: f64,
        /// Share of the unit value attributed to the service
        #[arg(long, default_value = "0.1")]
        value_share: f64,
    },
    /// Hydrogeological protection (SCS curve number) from two land-use maps
    Hydro {
        #[command(flatten)]
        pair: PairArgs,
        /// Hydrologic soil group
        #[arg(long, value_enum, default_value = "a")]
        group: GroupArg,
        /// Design rainfall (mm)
        #[arg(long, default_value = "55.32")]
        rainfall: f64,
        /// Value of retained water (€/m³)
        #[arg(long, default_value = "300")]
        value: f64,
    },
    /// Infiltration value from two infiltration rasters
    Infiltration {
        #[command(flatten)]
        pair: PairArgs,
        /// Value of infiltrated water (€/m³)
        #[arg(long, default_value = "300")]
        value: f64,
    },
    /// Social benefits (ROS index) from two land-use maps
    Social {
        #[command(flatten)]
        pair: PairArgs,
        /// Present natural aspects
        #[arg(long, value_enum, value_delimiter = ',')]
        present_natural: Vec<NaturalAspect>,
        /// Project natural aspects
        #[arg(long, value_enum, value_delimiter = ',')]
        future_natural: Vec<NaturalAspect>,
        /// Present urban green
        #[arg(long, value_enum, value_delimiter = ',')]
        present_green: Vec<UrbanGreen>,
        /// Project urban green
        #[arg(long, value_enum, value_delimiter = ',')]
        future_green: Vec<UrbanGreen>,
        /// Present amenities within 100 m
        #[arg(long, value_enum, value_delimiter = ',')]
        present_amenities: Vec<Amenity>,
        /// Project amenities within 100 m
        #[arg(long, value_enum, value_delimiter = ',')]
        future_amenities: Vec<Amenity>,
    },
    /// Biodiversity (habitat quality) from two land-use maps
    Biodiversity {
        #[command(flatten)]
        pair: PairArgs,
        /// Present disturbance as 'source=level', e.g. vehicular-roads=near
        /// (levels: absent, distant, near, adjacent)
        #[arg(long = "present-disturbance", value_parser = parse_disturbance)]
        present_disturbances: Vec<DisturbanceArg>,
        /// Project disturbance as 'source=level'
        #[arg(long = "future-disturbance", value_parser = parse_disturbance)]
        future_disturbances: Vec<DisturbanceArg>,
    },
    /// Agricultural production from two land-use maps and a price list
    Agriculture {
        #[command(flatten)]
        pair: PairArgs,
        /// ';'-separated price list with 'Lucode' and 'Produzione agricola €_ton' columns
        #[arg(long)]
        prices: PathBuf,
    },
    /// Pollination from two land-use maps
    Pollination {
        #[command(flatten)]
        pair: PairArgs,
    },
    /// Sum of euro delta rasters
    Total {
        /// Delta rasters on one grid
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Pixel side (m)
        #[arg(short, long, default_value = "2")]
        resolution: f64,
    },
}

#[derive(Args)]
struct SingleMapArgs {
    /// Land-use raster
    input: PathBuf,
    /// Output directory
    #[arg(short, long)]
    output_dir: PathBuf,
    /// Scenario the map describes
    #[arg(short, long, value_enum, default_value = "present")]
    scenario: ScenarioArg,
    /// Pixel side (m)
    #[arg(short, long, default_value = "2")]
    resolution: f64,
}

#[derive(Args)]
struct SpeciesArgs {
    /// Tree census as 'species=count', up to five (e.g. plane-tree=40)
    #[arg(long = "species", value_parser = parse_species)]
    species: Vec<SpeciesRecord>,
}

/// One `source=level` disturbance entry
#[derive(Debug, Clone, Copy)]
struct DisturbanceArg {
    source: Disturbance,
    level: ProximityLevel,
}

#[derive(Args)]
struct CommonArgs {
    /// Output directory
    #[arg(short, long)]
    output_dir: PathBuf,
    /// Pixel side (m)
    #[arg(short, long, default_value = "2")]
    resolution: f64,
    /// Year of the present scenario
    #[arg(long, default_value = "2021")]
    present_year: i32,
    /// Year of the project scenario
    #[arg(long, default_value = "2030")]
    future_year: i32,
}

impl CommonArgs {
    fn years(&self) -> Years {
        Years::new(self.present_year, self.future_year)
    }
}

#[derive(Args)]
struct PairArgs {
    /// Present-scenario raster
    present: PathBuf,
    /// Project-scenario raster
    future: PathBuf,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScenarioArg {
    Present,
    Future,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Present => Scenario::Present,
            ScenarioArg::Future => Scenario::Future,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupArg {
    A,
    B,
    C,
    D,
}

impl From<GroupArg> for HydrologicGroup {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::A => HydrologicGroup::A,
            GroupArg::B => HydrologicGroup::B,
            GroupArg::C => HydrologicGroup::C,
            GroupArg::D => HydrologicGroup::D,
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_codes(path: &Path) -> Result<Raster<LandUseCode>> {
    let pb = spinner("Reading land-use map...");
    let raster: Raster<LandUseCode> = read_geotiff(path)
        .with_context(|| format!("Failed to read land-use map {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_values(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> =
        read_geotiff(path).with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    Ok(raster)
}

fn read_code_pair(pair: &PairArgs) -> Result<ScenarioPair<LandUseCode>> {
    let present = read_codes(&pair.present)?;
    let future = read_codes(&pair.future)?;
    ScenarioPair::new(present, future).context("Scenario maps are not on the same grid")
}

fn read_value_pair(present: &Path, future: &Path) -> Result<ScenarioPair<f64>> {
    ScenarioPair::new(read_values(present)?, read_values(future)?)
        .context("Scenario rasters are not on the same grid")
}

/// Write every raster and the report of `output` into `dir`.
fn persist(output: ServiceOutput, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let pb = spinner("Writing outputs...");
    for named in &output.rasters {
        let path = dir.join(&named.file_name);
        write_geotiff(&named.raster, &path, Some(GeoTiffOptions::default()))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("wrote {}", path.display());
    }
    if let Some(named) = &output.report {
        let path = dir.join(&named.file_name);
        fs::write(&path, named.report.to_string())
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        debug!("wrote {}", path.display());
    }
    pb.finish_and_clear();

    for named in &output.rasters {
        println!("  {}", named.file_name);
    }
    if let Some(named) = &output.report {
        println!("  {}", named.file_name);
    }
    println!("{}", output.message);
    Ok(())
}

fn done(name: &str, dir: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, dir.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn split_assignment<'a>(s: &'a str, what: &str) -> std::result::Result<(&'a str, &'a str), String> {
    s.split_once('=')
        .map(|(name, value)| (name.trim(), value.trim()))
        .ok_or_else(|| format!("{} must be 'name=value', got: {}", what, s))
}

fn parse_species(s: &str) -> std::result::Result<SpeciesRecord, String> {
    let (name, count) = split_assignment(s, "Species")?;
    let species = Species::from_str(name, true)?;
    let count: u32 = count
        .parse()
        .map_err(|e| format!("Invalid tree count '{}': {}", count, e))?;
    Ok(SpeciesRecord::new(species, count))
}

fn parse_disturbance(s: &str) -> std::result::Result<DisturbanceArg, String> {
    let (source, level) = split_assignment(s, "Disturbance")?;
    Ok(DisturbanceArg {
        source: Disturbance::from_str(source, true)?,
        level: ProximityLevel::from_str(level, true)?,
    })
}

fn canopy(trees: &SpeciesArgs) -> Result<CanopyMode> {
    let selection = SpeciesSelection::new(trees.species.clone())?;
    Ok(selection.into_mode())
}

fn context(natural: &[NaturalAspect], green: &[UrbanGreen], amenities: &[Amenity]) -> SocialContext {
    SocialContext {
        natural: natural.iter().copied().collect(),
        green: green.iter().copied().collect(),
        amenities: amenities.iter().copied().collect(),
    }
}

fn profile(entries: &[DisturbanceArg]) -> DisturbanceProfile {
    entries
        .iter()
        .fold(DisturbanceProfile::default(), |acc, entry| {
            acc.with(entry.source, entry.level)
        })
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_codes(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!("Pixel area: {} m²", raster.transform().pixel_area());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nLand-use codes:");
            for (code, count) in code_histogram(&raster) {
                println!(
                    "  {:>4}: {} ({:.1}%)",
                    code,
                    count,
                    100.0 * count as f64 / raster.len() as f64
                );
            }
        }

        // ── Per-scenario calculators ─────────────────────────────────
        Commands::CarbonStock { map, trees } => {
            let params = CarbonStockParams {
                pixel_resolution: map.resolution,
                scenario: map.scenario.into(),
                canopy: canopy(&trees)?,
            };
            let codes = read_codes(&map.input)?;
            let start = Instant::now();
            let result = carbon_stock(&codes, &params).context("Failed to compute carbon stock")?;
            let elapsed = start.elapsed();
            if !result.advisory.is_completed() {
                warn!("{}", result.advisory);
            }
            persist(result.into_output(now()), &map.output_dir)?;
            done("Carbon stock", &map.output_dir, elapsed);
        }

        Commands::PollutantRemoval {
            map,
            trees,
            no2,
            pm10,
            wind_speed,
        } => {
            let params = PollutantRemovalParams {
                pixel_resolution: map.resolution,
                scenario: map.scenario.into(),
                no2_concentration: no2,
                pm10_concentration: pm10,
                wind_speed,
                canopy: canopy(&trees)?,
            };
            let codes = read_codes(&map.input)?;
            let start = Instant::now();
            let result =
                pollutant_removal(&codes, &params).context("Failed to compute pollutant removal")?;
            let elapsed = start.elapsed();
            persist(result.into_output(now()), &map.output_dir)?;
            done("Pollutant removal", &map.output_dir, elapsed);
        }

        Commands::Infiltration {
            map,
            trees,
            rainfall,
        } => {
            let params = InfiltrationParams {
                rainfall,
                pixel_resolution: map.resolution,
                scenario: map.scenario.into(),
                canopy: canopy(&trees)?,
            };
            let codes = read_codes(&map.input)?;
            let start = Instant::now();
            let result = infiltration(&codes, &params).context("Failed to compute infiltration")?;
            let elapsed = start.elapsed();
            persist(result.into_output(now()), &map.output_dir)?;
            done("Infiltration", &map.output_dir, elapsed);
        }

        // ── Economic valuation ───────────────────────────────────────
        Commands::Se { service } => match service {
            SeCommands::Carbon {
                pair,
                price,
                discount_rate,
                capitalization_rate,
            } => {
                let params = CarbonSequestrationParams {
                    pixel_resolution: pair.common.resolution,
                    years: pair.common.years(),
                    price_per_tonne: price,
                    discount_rate,
                    capitalization_rate,
                };
                let stocks = read_value_pair(&pair.present, &pair.future)?;
                let start = Instant::now();
                let result = carbon_sequestration(&stocks, &params)
                    .context("Failed to value carbon sequestration")?;
                let elapsed = start.elapsed();
                persist(result.into_output(now()), &pair.common.output_dir)?;
                done("Carbon sequestration", &pair.common.output_dir, elapsed);
            }

            SeCommands::Pollutants {
                present_ozone,
                present_pm10,
                present_no2,
                future_ozone,
                future_pm10,
                future_no2,
                common,
                ozone_price,
                pm10_price,
                no2_price,
            } => {
                let params = PollutantValueParams {
                    pixel_resolution: common.resolution,
                    years: common.years(),
                    prices: PollutantPrices {
                        ozone: ozone_price,
                        pm10: pm10_price,
                        no2: no2_price,
                    },
                };
                let pairs = PollutantPairs::new(
                    read_value_pair(&present_ozone, &future_ozone)?,
                    read_value_pair(&present_pm10, &future_pm10)?,
                    read_value_pair(&present_no2, &future_no2)?,
                )
                .context("Pollutant rasters are not on the same grid")?;
                let start = Instant::now();
                let result =
                    pollutant_value(&pairs, &params).context("Failed to value pollutant removal")?;
                let elapsed = start.elapsed();
                persist(result.into_output(now()), &common.output_dir)?;
                done("Pollutant removal value", &common.output_dir, elapsed);
            }

            SeCommands::Temperature {
                pair,
                unit_value,
                value_share,
            } => {
                let params = TemperatureParams {
                    pixel_resolution: pair.common.resolution,
                    years: pair.common.years(),
                    unit_value,
                    value_share,
                };
                let codes = read_code_pair(&pair)?;
                let start = Instant::now();
                let result = temperature_regulation(&codes, &params)
                    .context("Failed to value temperature regulation")?;
                let elapsed = start.elapsed();
                persist(result.into_output(now()), &pair.common.output_dir)?;
                done("Temperature regulation", &pair.common.output_dir, elapsed);
            }

            SeCommands::Hydro {
                pair,
                group,
                rainfall,
                value,
            } => {
                let params = HydrogeologyParams {
                    pixel_resolution: pair.common.resolution,
                    years: pair.common.years(),
                    rainfall,
                    group: group.into(),
                    value_per_cubic_metre: value,
                };
                let codes = read_code_pair(&pair)?;
                let start = Instant::now();
                let result = hydrogeological_protection(&codes, &params)
                    .context("Failed to value hydrogeological protection")?;
                let elapsed = start.elapsed();
                persist(result.into_output(now()), &pair.common.output_dir)?;
                done("Hydrogeological protection", &pair.common.output_dir, elapsed);
            }

            SeCommands::Infiltration { pair, value } => {
                let params = InfiltrationValueParams {
                    pixel_resolution: pair.common.resolution,
                    years: pair.common.years(),
                    value_per_cubic_metre: value,
                };
                let depths = read_value_pair(&pair.present, &pair.future)?;
                let start = Instant::now();
                let result =
                    infiltration_value(&depths, &params).context("Failed to value infiltration")?;
                let elapsed = start.elapsed();
                persist(result.into_output(now()), &pair.common.output_dir)?;
                done("Infiltration value", &pair.common.output_dir, elapsed);
            }

            SeCommands::Social {
                pair,
                present_natural,
                future_natural,
                present_green,
                future_green,
                present_amenities,
                future_amenities,
            } => {
                let params = SocialParams {
                    pixel_resolution: pair.common.resolution,
                    years: pair.common.years(),
                    present: context(&present_natural, &present_green, &present_amenities),
                    future: context(&future_natural, &future_green, &future_amenities),
                };
                let codes = read_code_pair(&pair)?;
                let start = Instant::now();
                let result =
                    social_benefits(&codes, &params).context("Failed to value social benefits")?;
                let elapsed = start.elapsed();
                persist(result.into_output(now()), &pair.common.output_dir)?;
                done("Social benefits", &pair.common.output_dir, elapsed);
            }

            SeCommands::Biodiversity {
                pair,
                present_disturbances,
                future_disturbances,
            } => {
                let params = BiodiversityParams {
                    pixel_resolution: pair.common.resolution,
                    years: pair.common.years(),
                    present: profile(&present_disturbances),
                    future: profile(&future_disturbances),
                };
                let codes = read_code_pair(&pair)?;
                let start = Instant::now();
                let result = biodiversity(&codes, &params).context("Failed to value biodiversity")?;
                let elapsed = start.elapsed();
                persist(result.into_output(now()), &pair.common.output_dir)?;
                done("Biodiversity", &pair.common.output_dir, elapsed);
            }

            SeCommands::Agriculture { pair, prices } => {
                let params = AgricultureParams {
                    pixel_resolution: pair.common.resolution,
                    years: pair.common.years(),
                    prices: load_price_table(&prices)
                        .with_context(|| format!("Failed to read price list {}", prices.display()))?,
                };
                let codes = read_code_pair(&pair)?;
                let start = Instant::now();
                let result = agricultural_production_value(&codes, &params)
                    .context("Failed to value agricultural production")?;
                let elapsed = start.elapsed();
                persist(result.into_output(now()), &pair.common.output_dir)?;
                done("Agricultural production", &pair.common.output_dir, elapsed);
            }

            SeCommands::Pollination { pair } => {
                let params = PollinationParams {
                    pixel_resolution: pair.common.resolution,
                    years: pair.common.years(),
                };
                let codes = read_code_pair(&pair)?;
                let start = Instant::now();
                let result = pollination(&codes, &params).context("Failed to value pollination")?;
                let elapsed = start.elapsed();
                persist(result.into_output(now()), &pair.common.output_dir)?;
                done("Pollination", &pair.common.output_dir, elapsed);
            }

            SeCommands::Total {
                inputs,
                output_dir,
                resolution,
            } => {
                let deltas = inputs
                    .iter()
                    .map(|path| read_values(path))
                    .collect::<Result<Vec<_>>>()?;
                let refs: Vec<&Raster<f64>> = deltas.iter().collect();
                let params = TotalParams {
                    pixel_resolution: resolution,
                };
                let start = Instant::now();
                let result = total_value(&refs, &params).context("Failed to sum delta rasters")?;
                let elapsed = start.elapsed();
                persist(result.into_output(now()), &output_dir)?;
                done("Total value", &output_dir, elapsed);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn parses_species_census() {
        let cli = parse(&[
            "ecoserv", "carbon-stock", "map.tif", "-o", "out", "--species", "plane-tree=4",
            "--species", "Oak = 0",
        ]);
        let Commands::CarbonStock { trees, .. } = cli.command else {
            panic!("expected carbon-stock");
        };
        assert_eq!(trees.species[0], SpeciesRecord::new(Species::PlaneTree, 4));
        match canopy(&trees).unwrap() {
            CanopyMode::Species(selection) => assert_eq!(selection.total_trees(), 4),
            CanopyMode::LandUse => panic!("expected species mode"),
        }
        let empty = SpeciesArgs { species: vec![] };
        assert!(matches!(canopy(&empty).unwrap(), CanopyMode::LandUse));
    }

    #[test]
    fn rejects_unknown_choices() {
        assert!(parse_species("baobab=3").is_err());
        assert!(parse_species("oak=many").is_err());
        assert!(parse_disturbance("landfill").is_err());
        assert!(parse_disturbance("landfill=nearby").is_err());
        assert!(Cli::try_parse_from([
            "ecoserv", "se", "social", "a.tif", "b.tif", "-o", "out", "--present-green", "jungle",
        ])
        .is_err());
    }

    #[test]
    fn parses_disturbance_profile() {
        let cli = parse(&[
            "ecoserv",
            "se",
            "biodiversity",
            "a.tif",
            "b.tif",
            "-o",
            "out",
            "--future-disturbance",
            "vehicular-roads=near",
            "--future-disturbance",
            "landfill=adjacent",
        ]);
        let Commands::Se {
            service: SeCommands::Biodiversity {
                present_disturbances,
                future_disturbances,
                ..
            },
        } = cli.command
        else {
            panic!("expected se biodiversity");
        };
        assert_eq!(profile(&present_disturbances).pressure(), 0);
        assert_eq!(profile(&future_disturbances).pressure(), 15);
    }

    #[test]
    fn parses_social_features() {
        let cli = parse(&[
            "ecoserv",
            "se",
            "social",
            "a.tif",
            "b.tif",
            "-o",
            "out",
            "--future-natural",
            "belvedere,monumental-tree",
            "--future-amenities",
            "play-area",
        ]);
        let Commands::Se {
            service:
                SeCommands::Social {
                    future_natural,
                    future_green,
                    future_amenities,
                    ..
                },
        } = cli.command
        else {
            panic!("expected se social");
        };
        let future = context(&future_natural, &future_green, &future_amenities);
        assert_eq!(future.natural.len(), 2);
        assert!(future.natural.contains(&NaturalAspect::MonumentalTree));
        assert!(future.amenities.contains(&Amenity::PlayArea));
        assert!(future.green.is_empty());
    }

    #[test]
    fn cli_accepts_total() {
        let cli = parse(&["ecoserv", "se", "total", "a.tif", "b.tif", "-o", "out"]);
        assert!(matches!(
            cli.command,
            Commands::Se {
                service: SeCommands::Total { .. }
            }
        ));
    }
}
