use std::path::PathBuf;

use coordinate_transformer::PointTransformerProvider;
use lidar_core::{
    EpsgCode, Polygon, RegionCatalog, RegionEntry, ResultAssembler, SpatialExtent, SpatialTable,
    TransformProvider, YearKey,
};
use lidar_parser::parsers::{catalog::CsvCatalogParser, CatalogParser as _};
use lidar_pipeline::{
    ExportTarget, PdalEngine, PipelineBuilder, PipelineRunner, PipelineTemplate,
};
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};

use crate::{
    collection::ResultCollection,
    config::FetchConfig,
    error::{FetchError, InitError},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub region: String,
    pub point_count: usize,
    pub laz_path: PathBuf,
    pub tif_path: PathBuf,
}

/// Fetches point data for an area of interest from every catalog region that
/// covers it.
///
/// All collaborators are injected; the orchestrator itself holds no other
/// state and can be shared between threads.
pub struct FetchOrchestrator {
    catalog: RegionCatalog,
    builder: PipelineBuilder,
    runner: PipelineRunner,
    transforms: Box<dyn TransformProvider>,
    assembler: ResultAssembler,
    parallel: bool,
}

impl FetchOrchestrator {
    pub fn new(
        catalog: RegionCatalog,
        builder: PipelineBuilder,
        runner: PipelineRunner,
        transforms: Box<dyn TransformProvider>,
    ) -> Self {
        Self {
            catalog,
            builder,
            runner,
            transforms,
            assembler: ResultAssembler,
            parallel: false,
        }
    }

    /// Loads the catalog and the template named in `config` and wires up the
    /// PDAL engine and PROJ-backed transformers.
    pub fn from_config(config: &FetchConfig) -> Result<Self, InitError> {
        let catalog = CsvCatalogParser {
            filename: config.catalog_path.clone(),
            epsg: config.input_epsg,
        }
        .parse()?;
        let template = PipelineTemplate::from_path(&config.template_path)?;

        let builder = PipelineBuilder::new(template, config.base_url.clone());
        let runner = PipelineRunner::new(Box::new(PdalEngine::new(config.pdal_path.clone())));
        let transforms = PointTransformerProvider::new(config.proj_data_dir.clone());

        Ok(Self::new(catalog, builder, runner, Box::new(transforms)).with_parallel(config.parallel))
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    /// The polygon expressed in the catalog CRS.
    pub fn extent_for(&self, polygon: &Polygon) -> Result<SpatialExtent, FetchError> {
        Ok(SpatialExtent::from_polygon(
            polygon,
            self.catalog.epsg(),
            self.transforms.as_ref(),
        )?)
    }

    /// Catalog regions containing the polygon, unknown years first.
    pub fn regions_for(&self, polygon: &Polygon) -> Result<Vec<&RegionEntry>, FetchError> {
        let extent = self.extent_for(polygon)?;
        Ok(self.catalog.query(&extent))
    }

    /// Fetches every region containing `polygon` and groups the non-empty
    /// results by year. Points come back in `output_epsg`.
    ///
    /// Only an invalid polygon is an error. Regions that fail or yield no
    /// points are logged and left out; no match gives an empty collection.
    pub fn fetch_all(
        &self,
        polygon: &Polygon,
        output_epsg: EpsgCode,
    ) -> Result<ResultCollection, FetchError> {
        let extent = self.extent_for(polygon)?;
        let regions = self.catalog.query(&extent);

        let mut collection = ResultCollection::new();
        if regions.is_empty() {
            log::warn!(
                "no region contains the requested area {}",
                extent.bounds_string()
            );
            return Ok(collection);
        }
        log::info!(
            "fetching {} regions: {:?}",
            regions.len(),
            regions.iter().map(|r| &r.filename).collect::<Vec<_>>()
        );

        let start = std::time::Instant::now();
        let tables: Vec<(YearKey, Option<SpatialTable>)> = if self.parallel {
            regions
                .par_iter()
                .map(|region| {
                    (
                        region.year_key(),
                        self.fetch_one(region, &extent, output_epsg),
                    )
                })
                .collect()
        } else {
            regions
                .iter()
                .map(|region| {
                    (
                        region.year_key(),
                        self.fetch_one(region, &extent, output_epsg),
                    )
                })
                .collect()
        };

        for (year, table) in tables {
            if let Some(table) = table {
                collection.insert(year, table);
            }
        }

        log::info!(
            "fetched {} tables ({} points) from {} regions in {:?}",
            collection.table_count(),
            collection.point_count(),
            regions.len(),
            start.elapsed()
        );
        Ok(collection)
    }

    /// Fetches a single named region, whether or not it fully contains the polygon.
    pub fn fetch_region(
        &self,
        polygon: &Polygon,
        output_epsg: EpsgCode,
        filename: &str,
    ) -> Result<Option<SpatialTable>, FetchError> {
        let region = self.region(filename)?;
        let extent = self.extent_for(polygon)?;
        warn_if_not_contained(region, &extent);
        Ok(self.fetch_one(region, &extent, output_epsg))
    }

    /// Single-file export: runs one region's pipeline with both sinks pointed
    /// at `target`. `None` means the engine failed.
    pub fn export_region(
        &self,
        polygon: &Polygon,
        output_epsg: EpsgCode,
        filename: &str,
        target: &ExportTarget,
    ) -> Result<Option<ExportSummary>, FetchError> {
        let region = self.region(filename)?;
        let extent = self.extent_for(polygon)?;
        warn_if_not_contained(region, &extent);

        let pipeline = self
            .builder
            .build(region, &extent, output_epsg, Some(target))?;
        let Some(points) = self.runner.run(&pipeline) else {
            return Ok(None);
        };

        Ok(Some(ExportSummary {
            region: region.filename.clone(),
            point_count: points.len(),
            laz_path: target.laz_path(),
            tif_path: target.tif_path(),
        }))
    }

    fn region(&self, filename: &str) -> Result<&RegionEntry, FetchError> {
        self.catalog
            .get(filename)
            .ok_or_else(|| FetchError::UnknownRegion(filename.to_string()))
    }

    fn fetch_one(
        &self,
        region: &RegionEntry,
        extent: &SpatialExtent,
        output_epsg: EpsgCode,
    ) -> Option<SpatialTable> {
        let pipeline = match self.builder.build(region, extent, output_epsg, None) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                log::error!("failed to build pipeline for {}: {}", region.filename, e);
                return None;
            }
        };

        let points = self.runner.run(&pipeline)?;
        let table = self.assembler.assemble(&points, output_epsg);
        if table.is_empty() {
            log::info!("region {} has no points in the requested area", region.filename);
            return None;
        }
        Some(table)
    }
}

fn warn_if_not_contained(region: &RegionEntry, extent: &SpatialExtent) {
    if !region.bounds.contains(extent.bbox()) {
        log::warn!(
            "region {} does not fully contain {}",
            region.filename,
            extent.bounds_string()
        );
    }
}
