use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use lidar_core::{crs::epsg_srs, EpsgCode, RegionEntry, SpatialExtent};
use serde_json::Value;

use crate::{error::ConfigurationError, stage::StageRole, template::PipelineTemplate};

/// Public USGS 3DEP bucket holding one EPT dataset per region.
pub const DEFAULT_BASE_URL: &str = "https://s3-us-west-2.amazonaws.com/usgs-lidar-public";

/// Output basename for single-file export; `.laz` and `.tif` are appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub basename: PathBuf,
}

impl ExportTarget {
    pub fn new(basename: impl Into<PathBuf>) -> Self {
        Self {
            basename: basename.into(),
        }
    }

    pub fn laz_path(&self) -> PathBuf {
        self.with_suffix(".laz")
    }

    pub fn tif_path(&self) -> PathBuf {
        self.with_suffix(".tif")
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut path = OsString::from(self.basename.as_os_str());
        path.push(suffix);
        PathBuf::from(path)
    }
}

/// A template filled in for one region and extent, ready for an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineInstance {
    region: String,
    pipeline: PipelineTemplate,
}

impl PipelineInstance {
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn pipeline(&self) -> &PipelineTemplate {
        &self.pipeline
    }

    pub fn source_url(&self) -> Option<&str> {
        self.pipeline.source.filename.as_deref()
    }

    pub fn to_value(&self) -> Value {
        self.pipeline.to_value()
    }

    pub fn to_json_string(&self) -> String {
        self.to_value().to_string()
    }
}

pub struct PipelineBuilder {
    template: PipelineTemplate,
    base_url: String,
}

impl PipelineBuilder {
    pub fn new(template: PipelineTemplate, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            template,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn template(&self) -> &PipelineTemplate {
        &self.template
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn dataset_url(&self, region: &RegionEntry) -> String {
        format!("{}/{}/ept.json", self.base_url, region.filename)
    }

    /// Fills the source, clip and reprojection stages for `region`. With an
    /// export target both sinks are pointed at `{basename}.laz` and
    /// `{basename}.tif`; without one they are left out of the instance.
    ///
    /// The builder's template is cloned, never modified.
    pub fn build(
        &self,
        region: &RegionEntry,
        extent: &SpatialExtent,
        output_epsg: EpsgCode,
        export: Option<&ExportTarget>,
    ) -> Result<PipelineInstance, ConfigurationError> {
        let mut pipeline = self.template.clone();

        pipeline.source.filename = Some(self.dataset_url(region));
        pipeline.source.bounds = Some(extent.bounds_string());
        pipeline.clip.polygon = Some(extent.wkt());
        pipeline.reprojection.out_srs = Some(epsg_srs(output_epsg));

        let Some(target) = export else {
            pipeline.point_cloud_sink = None;
            pipeline.raster_sink = None;
            return Ok(self.instance(region, pipeline));
        };

        let laz = pipeline
            .point_cloud_sink
            .as_mut()
            .ok_or(ConfigurationError::MissingSink(StageRole::PointCloudSink))?;
        laz.filename = Some(path_string(&target.laz_path()));

        let tif = pipeline
            .raster_sink
            .as_mut()
            .ok_or(ConfigurationError::MissingSink(StageRole::RasterSink))?;
        tif.filename = Some(path_string(&target.tif_path()));

        Ok(self.instance(region, pipeline))
    }

    fn instance(&self, region: &RegionEntry, pipeline: PipelineTemplate) -> PipelineInstance {
        log::debug!(
            "built pipeline for {} ({} stages)",
            region.filename,
            pipeline.stage_count()
        );
        PipelineInstance {
            region: region.filename.clone(),
            pipeline,
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use lidar_core::{BoundingBox, Coord, Polygon};
    use serde_json::json;

    use super::*;
    use crate::template::tests::template_json;

    fn builder() -> PipelineBuilder {
        let template = PipelineTemplate::from_value(template_json()).unwrap();
        PipelineBuilder::new(template, format!("{DEFAULT_BASE_URL}/"))
    }

    fn region() -> RegionEntry {
        RegionEntry::new(
            "IA_FullState",
            BoundingBox::new(-10796577.0, 4902908.0, -10012834.0, 5410419.0).unwrap(),
            None,
        )
    }

    fn unit_extent() -> SpatialExtent {
        let ring = vec![
            Coord::new(0.0, 0.0),
            Coord::new(0.0, 1.0),
            Coord::new(1.0, 1.0),
            Coord::new(1.0, 0.0),
            Coord::new(0.0, 0.0),
        ];
        SpatialExtent::new(&Polygon::new(ring, 3857).unwrap()).unwrap()
    }

    #[test]
    fn writes_documented_fields_only() {
        let builder = builder();
        let instance = builder.build(&region(), &unit_extent(), 26915, None).unwrap();

        let mut expected = template_json();
        expected["pipeline"][0]["filename"] = json!(
            "https://s3-us-west-2.amazonaws.com/usgs-lidar-public/IA_FullState/ept.json"
        );
        expected["pipeline"][0]["bounds"] = json!("([0,1],[0,1])");
        expected["pipeline"][1]["polygon"] = json!("POLYGON((0 0, 0 1, 1 1, 1 0, 0 0))");
        expected["pipeline"][3]["out_srs"] = json!("EPSG:26915");
        expected["pipeline"].as_array_mut().unwrap().truncate(4);

        assert_eq!(instance.to_value(), expected);
        assert_eq!(instance.region(), "IA_FullState");
        assert_eq!(
            instance.source_url(),
            Some("https://s3-us-west-2.amazonaws.com/usgs-lidar-public/IA_FullState/ept.json")
        );
    }

    #[test]
    fn shared_template_is_not_modified() {
        let builder = builder();
        builder.build(&region(), &unit_extent(), 26915, None).unwrap();
        assert_eq!(builder.template().to_value(), template_json());
    }

    #[test]
    fn export_fills_both_sinks() {
        let builder = builder();
        let target = ExportTarget::new("../asset/farm");
        let instance = builder
            .build(&region(), &unit_extent(), 26915, Some(&target))
            .unwrap();

        let value = instance.to_value();
        assert_eq!(value["pipeline"][4]["filename"], json!("../asset/farm.laz"));
        assert_eq!(value["pipeline"][5]["filename"], json!("../asset/farm.tif"));
        assert_eq!(value["pipeline"][4]["compression"], json!("laszip"));
        assert_eq!(value["pipeline"][5]["gdaldriver"], json!("GTiff"));
    }

    #[test]
    fn export_without_sinks_is_a_configuration_error() {
        let mut value = template_json();
        value["pipeline"].as_array_mut().unwrap().truncate(4);
        let builder = PipelineBuilder::new(PipelineTemplate::from_value(value).unwrap(), "s3://b");

        let err = builder
            .build(
                &region(),
                &unit_extent(),
                26915,
                Some(&ExportTarget::new("farm")),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingSink(StageRole::PointCloudSink)
        ));

        // batch mode only needs the first four stages
        assert!(builder.build(&region(), &unit_extent(), 26915, None).is_ok());
    }

    #[test]
    fn batch_mode_leaves_out_file_sinks() {
        let mut value = template_json();
        value["pipeline"]
            .as_array_mut()
            .unwrap()
            .push(json!({"type": "filters.stats"}));
        let builder = PipelineBuilder::new(PipelineTemplate::from_value(value).unwrap(), "s3://b");

        let instance = builder.build(&region(), &unit_extent(), 26915, None).unwrap();
        let stages = instance.to_value()["pipeline"].as_array().unwrap().clone();
        let types: Vec<&str> = stages.iter().map(|s| s["type"].as_str().unwrap()).collect();
        assert_eq!(
            types,
            vec![
                "readers.ept",
                "filters.crop",
                "filters.range",
                "filters.reprojection",
                "filters.stats"
            ]
        );

        // the template still has both sinks for export
        assert!(builder.template().point_cloud_sink.is_some());
        assert!(builder.template().raster_sink.is_some());
    }

    #[test]
    fn export_target_keeps_dots_in_basename() {
        let target = ExportTarget::new("out/farm.v2");
        assert_eq!(target.laz_path(), PathBuf::from("out/farm.v2.laz"));
        assert_eq!(target.tif_path(), PathBuf::from("out/farm.v2.tif"));
    }
}
