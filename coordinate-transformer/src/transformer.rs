use std::path::{Path, PathBuf};

use lidar_core::{Coord, CoordinateTransform, EpsgCode, TransformError, TransformProvider};
#[cfg(feature = "proj")]
use proj_sys_transformer::ProjTransformer;

pub enum PointTransformer {
    Identity,
    #[cfg(feature = "proj")]
    Proj(ProjTransformer),
}

impl PointTransformer {
    pub fn new(
        input_epsg: EpsgCode,
        output_epsg: EpsgCode,
        proj_data_dir: Option<&Path>,
    ) -> Result<Self, TransformError> {
        if input_epsg == output_epsg {
            return Ok(Self::Identity);
        }
        log::debug!("creating transformer EPSG:{input_epsg} -> EPSG:{output_epsg}");
        Self::new_proj(input_epsg, output_epsg, proj_data_dir)
    }

    #[cfg(feature = "proj")]
    fn new_proj(
        input_epsg: EpsgCode,
        output_epsg: EpsgCode,
        proj_data_dir: Option<&Path>,
    ) -> Result<Self, TransformError> {
        let proj = ProjTransformer::new_epsg(input_epsg, output_epsg, proj_data_dir)
            .map_err(crate::error::transform_error)?;
        Ok(Self::Proj(proj))
    }

    #[cfg(not(feature = "proj"))]
    fn new_proj(
        input_epsg: EpsgCode,
        output_epsg: EpsgCode,
        _proj_data_dir: Option<&Path>,
    ) -> Result<Self, TransformError> {
        log::error!("built without the `proj` feature, only identity transforms are available");
        Err(TransformError::Unsupported {
            input: input_epsg,
            output: output_epsg,
        })
    }
}

impl CoordinateTransform for PointTransformer {
    #[cfg_attr(not(feature = "proj"), allow(unused_variables))]
    fn transform_coords_in_place(&mut self, coords: &mut [Coord]) -> Result<(), TransformError> {
        match self {
            Self::Identity => Ok(()),
            #[cfg(feature = "proj")]
            Self::Proj(t) => t
                .transform_coords_in_place(coords)
                .map_err(crate::error::transform_error),
        }
    }
}

/// Creates a `PointTransformer` per EPSG pair, optionally pointing PROJ at a
/// local grid directory.
#[derive(Debug, Clone, Default)]
pub struct PointTransformerProvider {
    pub proj_data_dir: Option<PathBuf>,
}

impl PointTransformerProvider {
    pub fn new(proj_data_dir: Option<PathBuf>) -> Self {
        Self { proj_data_dir }
    }
}

impl TransformProvider for PointTransformerProvider {
    fn get_transformer(
        &self,
        input_epsg: EpsgCode,
        output_epsg: EpsgCode,
    ) -> Result<Box<dyn CoordinateTransform>, TransformError> {
        let transformer =
            PointTransformer::new(input_epsg, output_epsg, self.proj_data_dir.as_deref())?;
        Ok(Box::new(transformer))
    }
}
