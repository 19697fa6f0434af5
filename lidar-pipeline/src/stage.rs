use serde_json::{Map, Value};

use crate::error::ConfigurationError;

/// Free-form options of a stage, `type` included.
pub type StageOptions = Map<String, Value>;

/// Fixed positional roles of a pipeline template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    Source,
    Clip,
    PassThrough,
    Reprojection,
    PointCloudSink,
    RasterSink,
}

impl StageRole {
    pub const ORDER: [StageRole; 6] = [
        StageRole::Source,
        StageRole::Clip,
        StageRole::PassThrough,
        StageRole::Reprojection,
        StageRole::PointCloudSink,
        StageRole::RasterSink,
    ];

    /// Roles that every template must provide.
    pub const REQUIRED: usize = 4;

    pub fn position(self) -> usize {
        match self {
            StageRole::Source => 0,
            StageRole::Clip => 1,
            StageRole::PassThrough => 2,
            StageRole::Reprojection => 3,
            StageRole::PointCloudSink => 4,
            StageRole::RasterSink => 5,
        }
    }
}

fn take_string(
    options: &mut StageOptions,
    role: StageRole,
    key: &'static str,
) -> Result<Option<String>, ConfigurationError> {
    match options.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(ConfigurationError::InvalidField { role, key }),
    }
}

fn with_string(mut options: StageOptions, key: &str, value: &Option<String>) -> StageOptions {
    if let Some(value) = value {
        options.insert(key.to_string(), Value::String(value.clone()));
    }
    options
}

/// Point source, e.g. `readers.ept`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceStage {
    pub filename: Option<String>,
    pub bounds: Option<String>,
    pub options: StageOptions,
}

impl SourceStage {
    pub fn from_options(mut options: StageOptions) -> Result<Self, ConfigurationError> {
        let filename = take_string(&mut options, StageRole::Source, "filename")?;
        let bounds = take_string(&mut options, StageRole::Source, "bounds")?;
        Ok(Self {
            filename,
            bounds,
            options,
        })
    }

    pub fn to_options(&self) -> StageOptions {
        let options = with_string(self.options.clone(), "filename", &self.filename);
        with_string(options, "bounds", &self.bounds)
    }
}

/// Polygon clip, e.g. `filters.crop`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClipStage {
    pub polygon: Option<String>,
    pub options: StageOptions,
}

impl ClipStage {
    pub fn from_options(mut options: StageOptions) -> Result<Self, ConfigurationError> {
        let polygon = take_string(&mut options, StageRole::Clip, "polygon")?;
        Ok(Self { polygon, options })
    }

    pub fn to_options(&self) -> StageOptions {
        with_string(self.options.clone(), "polygon", &self.polygon)
    }
}

/// `filters.reprojection`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReprojectionStage {
    pub out_srs: Option<String>,
    pub options: StageOptions,
}

impl ReprojectionStage {
    pub fn from_options(mut options: StageOptions) -> Result<Self, ConfigurationError> {
        let out_srs = take_string(&mut options, StageRole::Reprojection, "out_srs")?;
        Ok(Self { out_srs, options })
    }

    pub fn to_options(&self) -> StageOptions {
        with_string(self.options.clone(), "out_srs", &self.out_srs)
    }
}

/// File writer, `writers.las` or `writers.gdal`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SinkStage {
    pub filename: Option<String>,
    pub options: StageOptions,
}

impl SinkStage {
    pub fn from_options(
        role: StageRole,
        mut options: StageOptions,
    ) -> Result<Self, ConfigurationError> {
        let filename = take_string(&mut options, role, "filename")?;
        Ok(Self { filename, options })
    }

    pub fn to_options(&self) -> StageOptions {
        with_string(self.options.clone(), "filename", &self.filename)
    }
}
