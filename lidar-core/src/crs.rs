/// EPSG code type alias
pub type EpsgCode = u16;

/// WGS 84 / Pseudo-Mercator (EPSG:3857), the CRS of the USGS 3DEP EPT bounds
pub const EPSG_WEB_MERCATOR: EpsgCode = 3857;

/// WGS 84 Geographic 2D (EPSG:4326)
pub const EPSG_WGS84_GEOGRAPHIC_2D: EpsgCode = 4326;

pub fn epsg_srs(epsg: EpsgCode) -> String {
    format!("EPSG:{epsg}")
}
