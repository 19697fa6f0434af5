use serde::Serialize;

use crate::{crs::EpsgCode, error::PointResultError, geometry::BoundingBox, geometry::Coord};

/// Raw engine output: parallel X, Y and Z arrays of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointResult {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl PointResult {
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self, PointResultError> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(PointResultError::LengthMismatch {
                x: x.len(),
                y: y.len(),
                z: z.len(),
            });
        }
        Ok(Self { x, y, z })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, x: f64, y: f64, z: f64) {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((&x, &y), &z)| (x, y, z))
    }
}

impl FromIterator<(f64, f64, f64)> for PointResult {
    fn from_iter<I: IntoIterator<Item = (f64, f64, f64)>>(iter: I) -> Self {
        let mut points = PointResult::empty();
        for (x, y, z) in iter {
            points.push(x, y, z);
        }
        points
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointGeometry {
    pub x: f64,
    pub y: f64,
}

impl PointGeometry {
    pub fn to_wkt(&self) -> String {
        format!("POINT ({} {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationRow {
    pub elevation: f64,
    pub geometry: PointGeometry,
}

/// Elevation-per-point rows tagged with the CRS of their geometries.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialTable {
    pub rows: Vec<ElevationRow>,
    pub epsg: EpsgCode,
}

impl SpatialTable {
    pub fn new(epsg: EpsgCode) -> Self {
        Self {
            rows: Vec::new(),
            epsg,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElevationRow> {
        self.rows.iter()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let coords: Vec<Coord> = self
            .rows
            .iter()
            .map(|row| Coord::new(row.geometry.x, row.geometry.y))
            .collect();
        BoundingBox::from_coords(&coords)
    }

    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        let mut rows = self.rows.iter();
        let first = rows.next()?.elevation;
        Some(rows.fold((first, first), |(min, max), row| {
            (min.min(row.elevation), max.max(row.elevation))
        }))
    }
}

/// Turns engine output into a spatial table.
///
/// The CRS is assigned, not transformed: coordinates coming out of a pipeline
/// have already been reprojected by its reprojection stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAssembler;

impl ResultAssembler {
    pub fn assemble(&self, points: &PointResult, output_epsg: EpsgCode) -> SpatialTable {
        let rows = points
            .iter()
            .map(|(x, y, z)| ElevationRow {
                elevation: z,
                geometry: PointGeometry { x, y },
            })
            .collect();
        SpatialTable {
            rows,
            epsg: output_epsg,
        }
    }
}
