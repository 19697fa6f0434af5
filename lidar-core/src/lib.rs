pub mod catalog;
pub mod crs;
pub mod error;
pub mod geometry;
pub mod points;
pub mod region;
pub mod transform;

pub use catalog::RegionCatalog;
pub use crs::EpsgCode;
pub use error::{GeometryError, PointResultError, TransformError};
pub use geometry::{BoundingBox, Coord, Polygon, SpatialExtent};
pub use points::{ElevationRow, PointGeometry, PointResult, ResultAssembler, SpatialTable};
pub use region::{RegionEntry, YearKey};
pub use transform::{CoordinateTransform, IdentityTransform, TransformProvider};
