use thiserror::Error;

use crate::{crs::EpsgCode, geometry::Coord};

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("polygon ring needs at least 4 coordinates, got {count}")]
    TooFewCoordinates { count: usize },
    #[error("polygon ring is not closed: first {first:?} != last {last:?}")]
    UnclosedRing { first: Coord, last: Coord },
    #[error("coordinate {index} is not finite")]
    NonFiniteCoordinate { index: usize },
    #[error("invalid bounds: min ({min_x}, {min_y}) exceeds max ({max_x}, {max_y})")]
    InvertedBounds {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },
    #[error("extent is degenerate (width {width}, height {height})")]
    DegenerateExtent { width: f64, height: f64 },
    #[error(transparent)]
    Transform(#[from] TransformError),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("no transformation available from EPSG:{input} to EPSG:{output}")]
    Unsupported { input: EpsgCode, output: EpsgCode },
    #[error("coordinate transformation failed ({context}): {code} {message}")]
    Backend {
        code: i32,
        message: String,
        context: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum PointResultError {
    #[error("point arrays differ in length (x: {x}, y: {y}, z: {z})")]
    LengthMismatch { x: usize, y: usize, z: usize },
}
