use lidar_core::RegionCatalog;

use crate::error::CatalogError;

pub mod catalog;
pub mod wkt;

pub trait CatalogParser {
    fn parse(&self) -> Result<RegionCatalog, CatalogError>;
}
