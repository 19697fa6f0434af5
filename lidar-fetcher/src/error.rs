use std::{io, path::PathBuf};

use lidar_core::GeometryError;
use lidar_parser::CatalogError;
use lidar_pipeline::{ConfigurationError, TemplateError};
use thiserror::Error;

/// Failures that happen before any region is processed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid area of interest: {0}")]
    Geometry(#[from] GeometryError),
    #[error("region '{0}' is not in the catalog")]
    UnknownRegion(String),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// The catalog or the template could not be loaded; nothing can be fetched.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
