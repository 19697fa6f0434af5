use crate::{crs::EpsgCode, error::TransformError, geometry::Coord};

/// Converts coordinates between two fixed coordinate reference systems.
pub trait CoordinateTransform {
    fn transform_coords_in_place(&mut self, coords: &mut [Coord]) -> Result<(), TransformError>;
}

/// Hands out transformers for a pair of EPSG codes.
///
/// The actual geodesy lives behind this seam; callers only sequence the calls.
pub trait TransformProvider: Send + Sync {
    fn get_transformer(
        &self,
        input_epsg: EpsgCode,
        output_epsg: EpsgCode,
    ) -> Result<Box<dyn CoordinateTransform>, TransformError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl CoordinateTransform for IdentityTransform {
    fn transform_coords_in_place(&mut self, _coords: &mut [Coord]) -> Result<(), TransformError> {
        Ok(())
    }
}
