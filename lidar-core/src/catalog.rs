use crate::{crs::EpsgCode, geometry::SpatialExtent, region::RegionEntry};

/// Read-only table of known remote regions, all bounds in one CRS.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    epsg: EpsgCode,
    entries: Vec<RegionEntry>,
}

impl RegionCatalog {
    pub fn new(epsg: EpsgCode, entries: Vec<RegionEntry>) -> Self {
        Self { epsg, entries }
    }

    pub fn epsg(&self) -> EpsgCode {
        self.epsg
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionEntry> {
        self.entries.iter()
    }

    pub fn get(&self, filename: &str) -> Option<&RegionEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }

    /// Regions whose bounds fully contain the extent's bounding box, ordered
    /// by acquisition year with unknown years first. Ties keep catalog order.
    ///
    /// A region that only partially overlaps the extent is not returned.
    pub fn query(&self, extent: &SpatialExtent) -> Vec<&RegionEntry> {
        if !self.same_crs(extent) {
            return Vec::new();
        }

        let bbox = extent.bbox();
        let mut regions: Vec<&RegionEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.bounds.contains(bbox))
            .collect();
        regions.sort_by_key(|entry| entry.year_key());

        log::debug!(
            "{} of {} regions contain {}",
            regions.len(),
            self.entries.len(),
            extent.bounds_string()
        );
        regions
    }

    /// Regions whose bounds touch the extent at all, in catalog order.
    pub fn intersecting(&self, extent: &SpatialExtent) -> Vec<&RegionEntry> {
        if !self.same_crs(extent) {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| entry.bounds.intersects(extent.bbox()))
            .collect()
    }

    fn same_crs(&self, extent: &SpatialExtent) -> bool {
        if extent.epsg() != self.epsg {
            log::warn!(
                "extent is in EPSG:{} but the region catalog uses EPSG:{}",
                extent.epsg(),
                self.epsg
            );
            return false;
        }
        true
    }
}
