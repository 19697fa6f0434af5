use std::path::Path;

use serde_json::Value;

use crate::{
    error::{ConfigurationError, TemplateError},
    stage::{ClipStage, ReprojectionStage, SinkStage, SourceStage, StageOptions, StageRole},
};

/// A pipeline description with its stages addressed by role.
///
/// Positions 0 to 3 are mandatory, the two sinks are optional. Stages after
/// the raster sink and any top-level keys besides `pipeline` are carried
/// through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineTemplate {
    pub source: SourceStage,
    pub clip: ClipStage,
    pub pass_through: StageOptions,
    pub reprojection: ReprojectionStage,
    pub point_cloud_sink: Option<SinkStage>,
    pub raster_sink: Option<SinkStage>,
    pub trailing_stages: Vec<Value>,
    pub document: StageOptions,
}

impl PipelineTemplate {
    pub fn from_path(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let template = Self::from_json_str(&text)?;
        log::info!("loaded pipeline template {:?}", path);
        Ok(template)
    }

    pub fn from_json_str(text: &str) -> Result<Self, TemplateError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value)?)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigurationError> {
        let Value::Object(mut document) = value else {
            return Err(ConfigurationError::MissingPipeline);
        };
        let Some(Value::Array(stages)) = document.remove("pipeline") else {
            return Err(ConfigurationError::MissingPipeline);
        };
        if stages.len() < StageRole::REQUIRED {
            return Err(ConfigurationError::MissingStages {
                required: StageRole::REQUIRED,
                found: stages.len(),
            });
        }

        let mut stages = stages.into_iter();
        let mut positional = Vec::with_capacity(StageRole::ORDER.len());
        for position in 0..StageRole::ORDER.len() {
            match stages.next() {
                Some(Value::Object(options)) => positional.push(options),
                Some(_) => return Err(ConfigurationError::StageNotObject { position }),
                None => break,
            }
        }
        let trailing_stages: Vec<Value> = stages.collect();

        let mut positional = positional.into_iter();
        let mut next = || positional.next().unwrap_or_default();
        let source = SourceStage::from_options(next())?;
        let clip = ClipStage::from_options(next())?;
        let pass_through = next();
        let reprojection = ReprojectionStage::from_options(next())?;
        let point_cloud_sink = optional_sink(positional.next(), StageRole::PointCloudSink)?;
        let raster_sink = optional_sink(positional.next(), StageRole::RasterSink)?;

        Ok(Self {
            source,
            clip,
            pass_through,
            reprojection,
            point_cloud_sink,
            raster_sink,
            trailing_stages,
            document,
        })
    }

    pub fn stage_count(&self) -> usize {
        StageRole::REQUIRED
            + usize::from(self.point_cloud_sink.is_some())
            + usize::from(self.raster_sink.is_some())
            + self.trailing_stages.len()
    }

    pub fn to_value(&self) -> Value {
        let mut stages = vec![
            Value::Object(self.source.to_options()),
            Value::Object(self.clip.to_options()),
            Value::Object(self.pass_through.clone()),
            Value::Object(self.reprojection.to_options()),
        ];
        stages.extend(
            [&self.point_cloud_sink, &self.raster_sink]
                .into_iter()
                .flatten()
                .map(|sink| Value::Object(sink.to_options())),
        );
        stages.extend(self.trailing_stages.iter().cloned());

        let mut document = self.document.clone();
        document.insert("pipeline".to_string(), Value::Array(stages));
        Value::Object(document)
    }
}

fn optional_sink(
    options: Option<StageOptions>,
    role: StageRole,
) -> Result<Option<SinkStage>, ConfigurationError> {
    options
        .map(|options| SinkStage::from_options(role, options))
        .transpose()
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;

    pub(crate) fn template_json() -> Value {
        json!({
            "pipeline": [
                {
                    "type": "readers.ept",
                    "filename": "",
                    "bounds": "",
                    "tag": "readdata"
                },
                {
                    "type": "filters.crop",
                    "polygon": "",
                    "tag": "crop"
                },
                {
                    "type": "filters.range",
                    "limits": "Classification![7:7]"
                },
                {
                    "type": "filters.reprojection",
                    "in_srs": "EPSG:3857",
                    "out_srs": "",
                    "tag": "reproject"
                },
                {
                    "type": "writers.las",
                    "filename": "",
                    "compression": "laszip"
                },
                {
                    "type": "writers.gdal",
                    "filename": "",
                    "gdaldriver": "GTiff",
                    "output_type": "idw",
                    "resolution": 1.0
                }
            ]
        })
    }

    #[test]
    fn round_trips_the_document() {
        let template = PipelineTemplate::from_value(template_json()).unwrap();
        assert_eq!(template.stage_count(), 6);
        assert_eq!(template.to_value(), template_json());
    }

    #[test]
    fn keeps_extra_stages_and_keys() {
        let mut value = template_json();
        value["pipeline"]
            .as_array_mut()
            .unwrap()
            .push(json!({"type": "writers.null"}));
        value["comment"] = json!("usgs 3dep");

        let template = PipelineTemplate::from_value(value.clone()).unwrap();
        assert_eq!(template.trailing_stages, vec![json!({"type": "writers.null"})]);
        assert_eq!(template.to_value(), value);
    }

    #[test]
    fn four_stages_are_enough() {
        let mut value = template_json();
        value["pipeline"].as_array_mut().unwrap().truncate(4);

        let template = PipelineTemplate::from_value(value.clone()).unwrap();
        assert!(template.point_cloud_sink.is_none());
        assert!(template.raster_sink.is_none());
        assert_eq!(template.to_value(), value);
    }

    #[test]
    fn fewer_than_four_stages_is_a_configuration_error() {
        let mut value = template_json();
        value["pipeline"].as_array_mut().unwrap().truncate(3);

        let err = PipelineTemplate::from_value(value).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingStages {
                required: 4,
                found: 3
            }
        ));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(
            PipelineTemplate::from_value(json!([1, 2, 3])),
            Err(ConfigurationError::MissingPipeline)
        ));
        assert!(matches!(
            PipelineTemplate::from_value(json!({"stages": []})),
            Err(ConfigurationError::MissingPipeline)
        ));

        let mut value = template_json();
        value["pipeline"][1] = json!("input.las");
        assert!(matches!(
            PipelineTemplate::from_value(value),
            Err(ConfigurationError::StageNotObject { position: 1 })
        ));
    }

    #[test]
    fn reads_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, template_json().to_string()).unwrap();
        assert!(PipelineTemplate::from_path(&path).is_ok());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            PipelineTemplate::from_path(&path),
            Err(TemplateError::Json(_))
        ));
        assert!(matches!(
            PipelineTemplate::from_path(&dir.path().join("missing.json")),
            Err(TemplateError::Read { .. })
        ));
    }
}
