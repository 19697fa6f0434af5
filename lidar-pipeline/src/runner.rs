use lidar_core::PointResult;

use crate::{builder::PipelineInstance, engine::PipelineEngine};

/// Runs pipelines one region at a time. A failing region is logged and
/// reported as `None`; the error never reaches the caller.
pub struct PipelineRunner {
    engine: Box<dyn PipelineEngine>,
}

impl PipelineRunner {
    pub fn new(engine: Box<dyn PipelineEngine>) -> Self {
        Self { engine }
    }

    pub fn run(&self, pipeline: &PipelineInstance) -> Option<PointResult> {
        let start = std::time::Instant::now();
        match self.engine.execute(pipeline) {
            Ok(points) => {
                log::info!(
                    "pipeline for {} executed successfully: {} points in {:?}",
                    pipeline.region(),
                    points.len(),
                    start.elapsed()
                );
                Some(points)
            }
            Err(e) => {
                log::error!(
                    "pipeline execution failed for {} ({}): {}",
                    pipeline.region(),
                    pipeline.source_url().unwrap_or("no source"),
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lidar_core::{BoundingBox, Polygon, RegionEntry, SpatialExtent};

    use super::*;
    use crate::{
        builder::PipelineBuilder, error::EngineError, template::tests::template_json,
        template::PipelineTemplate,
    };

    struct FixedEngine;

    impl PipelineEngine for FixedEngine {
        fn execute(&self, pipeline: &PipelineInstance) -> Result<PointResult, EngineError> {
            if pipeline.region() == "broken" {
                return Err(EngineError::Execution("readers.ept: unable to fetch".into()));
            }
            Ok(PointResult::new(vec![1.0], vec![2.0], vec![3.0]).unwrap())
        }
    }

    fn instance(region: &str) -> PipelineInstance {
        let builder = PipelineBuilder::new(
            PipelineTemplate::from_value(template_json()).unwrap(),
            "https://example.com",
        );
        let region = RegionEntry::new(region, BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap(), None);
        let polygon = Polygon::from_bounds(1.0, 1.0, 2.0, 2.0, 3857).unwrap();
        let extent = SpatialExtent::new(&polygon).unwrap();
        builder.build(&region, &extent, 3857, None).unwrap()
    }

    #[test]
    fn returns_points_on_success() {
        let runner = PipelineRunner::new(Box::new(FixedEngine));
        let points = runner.run(&instance("IA_FullState")).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn swallows_engine_errors() {
        let runner = PipelineRunner::new(Box::new(FixedEngine));
        assert!(runner.run(&instance("broken")).is_none());
    }
}
