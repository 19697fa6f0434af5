use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use lidar_core::PointResult;
use serde::Deserialize;
use serde_json::{json, Value};

use super::PipelineEngine;
use crate::{builder::PipelineInstance, error::EngineError};

const POINTS_FILE: &str = "points.csv";

/// Runs pipelines through the `pdal` command line tool.
///
/// A `writers.text` stage is appended to every pipeline so the surviving
/// points can be read back from a scratch CSV once the process exits.
#[derive(Debug, Clone)]
pub struct PdalEngine {
    pub executable: PathBuf,
    /// Decimal places written for X, Y and Z.
    pub precision: u32,
}

impl Default for PdalEngine {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("pdal"),
            precision: 8,
        }
    }
}

impl PdalEngine {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            ..Default::default()
        }
    }

    fn with_text_writer(&self, pipeline: &PipelineInstance, points_path: &Path) -> Value {
        let mut document = pipeline.to_value();
        if let Some(Value::Array(stages)) = document.get_mut("pipeline") {
            stages.push(json!({
                "type": "writers.text",
                "format": "csv",
                "order": "X,Y,Z",
                "keep_unspecified": false,
                "precision": self.precision,
                "filename": points_path.to_string_lossy(),
            }));
        }
        document
    }
}

impl PipelineEngine for PdalEngine {
    fn execute(&self, pipeline: &PipelineInstance) -> Result<PointResult, EngineError> {
        let scratch = tempfile::tempdir()?;
        let points_path = scratch.path().join(POINTS_FILE);
        let document = serde_json::to_vec(&self.with_text_writer(pipeline, &points_path))?;

        log::debug!(
            "running {:?} pipeline for {}",
            self.executable,
            pipeline.region()
        );
        let mut child = Command::new(&self.executable)
            .args(["pipeline", "--stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                executable: self.executable.clone(),
                source,
            })?;

        // stdin is closed when the handle drops, which lets pdal start reading
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&document),
            None => Ok(()),
        };
        // reap the child before reporting anything, a failed write included
        let output = child.wait_with_output()?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if let Err(source) = written {
            return Err(EngineError::Stdin {
                status: output.status.code(),
                stderr,
                source,
            });
        }
        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status.code(),
                stderr,
            });
        }

        if !points_path.exists() {
            log::debug!("pipeline for {} wrote no points", pipeline.region());
            return Ok(PointResult::empty());
        }
        read_points(&points_path)
    }
}

#[derive(Deserialize)]
struct PointRecord {
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "Z")]
    z: f64,
}

fn read_points(path: &Path) -> Result<PointResult, EngineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut points = PointResult::empty();
    for record in reader.deserialize() {
        let record: PointRecord = record?;
        points.push(record.x, record.y, record.z);
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use lidar_core::{BoundingBox, Polygon, RegionEntry, SpatialExtent};

    use super::*;
    use crate::{builder::PipelineBuilder, template::tests::template_json, PipelineTemplate};

    fn instance() -> PipelineInstance {
        let builder = PipelineBuilder::new(
            PipelineTemplate::from_value(template_json()).unwrap(),
            "https://example.com",
        );
        let region = RegionEntry::new(
            "IA_FullState",
            BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap(),
            Some(2019),
        );
        let polygon = Polygon::from_bounds(1.0, 1.0, 2.0, 2.0, 3857).unwrap();
        let extent = SpatialExtent::new(&polygon).unwrap();
        builder.build(&region, &extent, 26915, None).unwrap()
    }

    #[test]
    fn appends_text_writer_after_template_stages() {
        let engine = PdalEngine::default();
        let document = engine.with_text_writer(&instance(), Path::new("/tmp/x/points.csv"));

        let stages = document["pipeline"].as_array().unwrap();
        assert_eq!(stages.len(), 5);
        assert_eq!(stages[4]["type"], json!("writers.text"));
        assert_eq!(stages[4]["order"], json!("X,Y,Z"));
        assert_eq!(stages[4]["filename"], json!("/tmp/x/points.csv"));
        assert_eq!(stages[3]["out_srs"], json!("EPSG:26915"));
    }

    #[test]
    fn batch_document_has_no_file_sinks() {
        let document =
            PdalEngine::default().with_text_writer(&instance(), Path::new("/tmp/p.csv"));

        let writers: Vec<&str> = document["pipeline"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|stage| stage["type"].as_str())
            .filter(|kind| kind.starts_with("writers."))
            .collect();
        assert_eq!(writers, vec!["writers.text"]);
    }

    #[test]
    fn reads_text_writer_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(POINTS_FILE);
        std::fs::write(
            &path,
            "\"X\",\"Y\",\"Z\"\n446000.12345678,4615000.5,301.25\n446001.0,4615001.0,302.0\n",
        )
        .unwrap();

        let points = read_points(&path).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points.x()[0], 446000.12345678);
        assert_eq!(points.z(), &[301.25, 302.0]);
    }

    #[test]
    fn header_only_output_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(POINTS_FILE);
        std::fs::write(&path, "\"X\",\"Y\",\"Z\"\n").unwrap();
        assert!(read_points(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let engine = PdalEngine::new("/nonexistent/bin/pdal");
        let err = engine.execute(&instance()).unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failing_process_reports_exit_status() {
        // `false` exits without reading stdin, so the write may or may not fail
        let engine = PdalEngine::new("false");
        match engine.execute(&instance()).unwrap_err() {
            EngineError::Failed { status, .. } | EngineError::Stdin { status, .. } => {
                assert_eq!(status, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
