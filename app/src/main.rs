use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;
use thiserror::Error;

use lidar_core::{EpsgCode, GeometryError, Polygon, SpatialTable, YearKey};
use lidar_fetcher::{ConfigError, FetchConfig, FetchError, FetchOrchestrator, InitError};
use lidar_parser::{parsers::wkt::parse_polygon_wkt, writers::csv::write_table_to_path, WktError};
use lidar_pipeline::ExportTarget;

#[derive(Parser, Debug)]
#[command(
    name = "LiDAR Fetcher",
    about = "A tool for fetching USGS 3DEP point cloud data for an area of interest",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    /// JSON config; command line flags take precedence over it.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "FILE")]
    catalog: Option<PathBuf>,

    #[arg(long, global = true, value_name = "FILE")]
    template: Option<PathBuf>,

    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    #[arg(long, global = true, value_name = "FILE")]
    pdal: Option<PathBuf>,

    /// Run the region pipelines concurrently.
    #[arg(long, global = true)]
    parallel: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct AreaArgs {
    /// Area of interest as a WKT polygon.
    #[arg(long, value_name = "WKT", required_unless_present = "bounds")]
    wkt: Option<String>,

    /// Area of interest as a rectangle.
    #[arg(
        long,
        num_args = 4,
        value_names = ["MINX", "MINY", "MAXX", "MAXY"],
        allow_hyphen_values = true,
        conflicts_with = "wkt"
    )]
    bounds: Option<Vec<f64>>,

    /// EPSG code of the area of interest.
    #[arg(short, long)]
    epsg: EpsgCode,

    /// EPSG code of the returned points; defaults to --epsg.
    #[arg(long)]
    output_epsg: Option<EpsgCode>,
}

impl AreaArgs {
    fn polygon(&self) -> Result<Polygon, AppError> {
        match (&self.wkt, &self.bounds) {
            (Some(wkt), _) => Ok(parse_polygon_wkt(wkt, self.epsg)?),
            (None, Some(bounds)) => match bounds.as_slice() {
                &[min_x, min_y, max_x, max_y] => {
                    Ok(Polygon::from_bounds(min_x, min_y, max_x, max_y, self.epsg)?)
                }
                _ => Err(AppError::MissingArea),
            },
            (None, None) => Err(AppError::MissingArea),
        }
    }

    fn output_epsg(&self) -> EpsgCode {
        self.output_epsg.unwrap_or(self.epsg)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every region covering the area and write one CSV per year.
    Fetch {
        #[command(flatten)]
        area: AreaArgs,

        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,
    },
    /// List the regions covering the area, unknown years first, then oldest to newest.
    Regions {
        #[command(flatten)]
        area: AreaArgs,
    },
    /// Write a single region to `<BASENAME>.laz` and `<BASENAME>.tif`.
    Export {
        #[command(flatten)]
        area: AreaArgs,

        #[arg(long, default_value = "IA_FullState")]
        region: String,

        #[arg(long, value_name = "BASENAME")]
        basename: PathBuf,
    },
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to initialize: {0}")]
    Init(#[from] InitError),
    #[error("invalid WKT: {0}")]
    Wkt(#[from] WktError),
    #[error("invalid area of interest: {0}")]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("either --wkt or --bounds is required")]
    MissingArea,
    #[error("failed to create {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("pipeline for region {0} failed")]
    ExportFailed(String),
}

impl Cli {
    fn fetch_config(&self) -> Result<FetchConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => FetchConfig::from_path(path)?,
            None => FetchConfig::default(),
        };
        if let Some(catalog) = &self.catalog {
            config.catalog_path = catalog.clone();
        }
        if let Some(template) = &self.template {
            config.template_path = template.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(pdal) = &self.pdal {
            config.pdal_path = pdal.clone();
        }
        config.parallel |= self.parallel;
        Ok(config)
    }
}

/// `{year}.csv`, or `{year}_{n}.csv` when several regions share a year.
fn table_file_names(year: YearKey, count: usize) -> Vec<String> {
    if count == 1 {
        return vec![format!("{year}.csv")];
    }
    (1..=count).map(|n| format!("{year}_{n}.csv")).collect()
}

fn write_tables(dir: &Path, year: YearKey, tables: &[SpatialTable]) -> Result<(), AppError> {
    for (name, table) in table_file_names(year, tables.len()).iter().zip(tables) {
        let path = dir.join(name);
        write_table_to_path(table, &path).map_err(|source| AppError::Write {
            path: path.clone(),
            source,
        })?;
        log::info!("wrote {} points to {:?}", table.len(), path);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = cli.fetch_config()?;
    log::info!("catalog: {:?}", config.catalog_path);
    log::info!("pipeline template: {:?}", config.template_path);
    log::info!("base url: {}", config.base_url);

    let orchestrator = FetchOrchestrator::from_config(&config)?;

    match cli.command {
        Command::Fetch { area, output } => {
            let polygon = area.polygon()?;
            log::info!("input EPSG: {}", area.epsg);
            log::info!("output EPSG: {}", area.output_epsg());
            log::info!("output folder: {:?}", output);

            let start = std::time::Instant::now();
            let collection = orchestrator.fetch_all(&polygon, area.output_epsg())?;
            if collection.is_empty() {
                log::warn!("no points were fetched");
                return Ok(());
            }

            std::fs::create_dir_all(&output).map_err(|source| AppError::CreateDir {
                path: output.clone(),
                source,
            })?;
            for (year, tables) in collection.iter() {
                write_tables(&output, year, tables)?;
            }
            log::info!("finish fetching in {:?}", start.elapsed());
        }
        Command::Regions { area } => {
            let polygon = area.polygon()?;
            for region in orchestrator.regions_for(&polygon)? {
                println!(
                    "{}\t{}\t{}",
                    region.filename,
                    region.year_key(),
                    region.bounds.to_bounds_string()
                );
            }
        }
        Command::Export {
            area,
            region,
            basename,
        } => {
            let polygon = area.polygon()?;
            let target = ExportTarget::new(basename);
            let summary = orchestrator
                .export_region(&polygon, area.output_epsg(), &region, &target)?
                .ok_or(AppError::ExportFailed(region))?;
            log::info!(
                "exported {} points from {} to {:?} and {:?}",
                summary.point_count,
                summary.region,
                summary.laz_path,
                summary.tif_path
            );
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
