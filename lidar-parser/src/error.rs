use std::path::PathBuf;

use lidar_core::GeometryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read region catalog {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("required column '{0}' is missing in the region catalog header")]
    MissingColumn(&'static str),
    #[error("line {line}: field '{field}' is empty")]
    EmptyField { line: u64, field: &'static str },
    #[error("line {line}: failed to parse '{field}' from {value:?}")]
    InvalidValue {
        line: u64,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: region '{filename}' has invalid bounds: {source}")]
    InvalidBounds {
        line: u64,
        filename: String,
        #[source]
        source: GeometryError,
    },
}

#[derive(Debug, Error)]
pub enum WktError {
    #[error("expected a POLYGON, got {0:?}")]
    NotAPolygon(String),
    #[error("malformed polygon text: {0}")]
    Syntax(&'static str),
    #[error("invalid coordinate {0:?}")]
    InvalidCoordinate(String),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
