use std::{io, path::PathBuf};

use thiserror::Error;

use crate::stage::StageRole;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("pipeline template must be a JSON object with a \"pipeline\" array")]
    MissingPipeline,
    #[error("pipeline template needs at least {required} stages, found {found}")]
    MissingStages { required: usize, found: usize },
    #[error("stage {position} is not a JSON object")]
    StageNotObject { position: usize },
    #[error("{role:?} stage field '{key}' must be a string")]
    InvalidField { role: StageRole, key: &'static str },
    #[error("export needs a {0:?} stage in the pipeline template")]
    MissingSink(StageRole),
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read pipeline template {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pipeline template is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start {executable:?}: {source}")]
    Spawn {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pipeline exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },
    #[error("failed to send pipeline to the engine ({source}), exit status {status:?}: {stderr}")]
    Stdin {
        status: Option<i32>,
        stderr: String,
        #[source]
        source: io::Error,
    },
    #[error("engine error: {0}")]
    Execution(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("failed to serialize pipeline: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read pipeline output: {0}")]
    Output(#[from] csv::Error),
}
