use lidar_core::PointResult;

use crate::{builder::PipelineInstance, error::EngineError};

pub mod pdal;

/// External point-cloud engine: takes a pipeline, runs it to completion and
/// hands back the X/Y/Z arrays of the points that came out of it.
pub trait PipelineEngine: Send + Sync {
    fn execute(&self, pipeline: &PipelineInstance) -> Result<PointResult, EngineError>;
}
