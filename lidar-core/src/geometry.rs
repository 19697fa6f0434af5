use serde::{Deserialize, Serialize};

use crate::{
    crs::EpsgCode,
    error::GeometryError,
    transform::{CoordinateTransform, TransformProvider},
};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A closed exterior ring tagged with the CRS its coordinates are expressed in.
///
/// The ring is validated on construction and never closed implicitly: the
/// clip stage of a pipeline receives exactly the coordinates given here.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<Coord>,
    epsg: EpsgCode,
}

impl Polygon {
    pub fn new(ring: Vec<Coord>, epsg: EpsgCode) -> Result<Self, GeometryError> {
        validate_ring(&ring)?;
        Ok(Self { ring, epsg })
    }

    /// Rectangle ring `(minx,miny) (minx,maxy) (maxx,maxy) (maxx,miny) (minx,miny)`.
    pub fn from_bounds(
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        epsg: EpsgCode,
    ) -> Result<Self, GeometryError> {
        BoundingBox::new(min_x, min_y, max_x, max_y)?;
        let ring = vec![
            Coord::new(min_x, min_y),
            Coord::new(min_x, max_y),
            Coord::new(max_x, max_y),
            Coord::new(max_x, min_y),
            Coord::new(min_x, min_y),
        ];
        Self::new(ring, epsg)
    }

    pub fn ring(&self) -> &[Coord] {
        &self.ring
    }

    pub fn epsg(&self) -> EpsgCode {
        self.epsg
    }

    pub fn bounding_box(&self) -> BoundingBox {
        // a validated ring is never empty
        BoundingBox::from_coords(&self.ring).unwrap_or_default()
    }

    /// Returns a copy of this polygon with every coordinate run through `transform`.
    pub fn reproject(
        &self,
        transform: &mut dyn CoordinateTransform,
        target_epsg: EpsgCode,
    ) -> Result<Self, GeometryError> {
        let mut ring = self.ring.clone();
        transform.transform_coords_in_place(&mut ring)?;
        Self::new(ring, target_epsg)
    }
}

fn validate_ring(ring: &[Coord]) -> Result<(), GeometryError> {
    if ring.len() < 4 {
        return Err(GeometryError::TooFewCoordinates { count: ring.len() });
    }
    if let Some(index) = ring
        .iter()
        .position(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(GeometryError::NonFiniteCoordinate { index });
    }
    let (first, last) = (ring[0], ring[ring.len() - 1]);
    if first != last {
        return Err(GeometryError::UnclosedRing { first, last });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawBoundingBox")]
pub struct BoundingBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

/// Unchecked bounds; deserialized boxes go through `BoundingBox::new`.
#[derive(Deserialize)]
struct RawBoundingBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl TryFrom<RawBoundingBox> for BoundingBox {
    type Error = GeometryError;

    fn try_from(raw: RawBoundingBox) -> Result<Self, Self::Error> {
        BoundingBox::new(raw.min_x, raw.min_y, raw.max_x, raw.max_y)
    }
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, GeometryError> {
        // written this way so NaN bounds are rejected too
        if !(min_x <= max_x && min_y <= max_y) {
            return Err(GeometryError::InvertedBounds {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    pub fn from_coords(coords: &[Coord]) -> Option<Self> {
        let first = coords.first()?;
        let mut bbox = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for c in &coords[1..] {
            bbox.min_x = bbox.min_x.min(c.x);
            bbox.min_y = bbox.min_y.min(c.y);
            bbox.max_x = bbox.max_x.max(c.x);
            bbox.max_y = bbox.max_y.max(c.y);
        }
        Some(bbox)
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// True when `other` lies entirely inside `self`, edges included.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.min_x
            && self.max_x >= other.max_x
            && self.min_y <= other.min_y
            && self.max_y >= other.max_y
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Bounds in the `([minx,maxx],[miny,maxy])` form read by EPT readers.
    pub fn to_bounds_string(&self) -> String {
        format!(
            "([{},{}],[{},{}])",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}

/// The area of interest as sent to remote datasets: a ring and its bounding
/// box, both in the datasets' input CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialExtent {
    ring: Vec<Coord>,
    bbox: BoundingBox,
    epsg: EpsgCode,
}

impl SpatialExtent {
    /// Builds an extent from a polygon already expressed in the target CRS.
    pub fn new(polygon: &Polygon) -> Result<Self, GeometryError> {
        let bbox = polygon.bounding_box();
        if bbox.is_degenerate() {
            return Err(GeometryError::DegenerateExtent {
                width: bbox.width(),
                height: bbox.height(),
            });
        }
        Ok(Self {
            ring: polygon.ring().to_vec(),
            bbox,
            epsg: polygon.epsg(),
        })
    }

    pub fn from_polygon(
        polygon: &Polygon,
        target_epsg: EpsgCode,
        provider: &dyn TransformProvider,
    ) -> Result<Self, GeometryError> {
        if polygon.epsg() == target_epsg {
            return Self::new(polygon);
        }
        let mut transformer = provider.get_transformer(polygon.epsg(), target_epsg)?;
        let projected = polygon.reproject(transformer.as_mut(), target_epsg)?;
        Self::new(&projected)
    }

    pub fn ring(&self) -> &[Coord] {
        &self.ring
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn epsg(&self) -> EpsgCode {
        self.epsg
    }

    pub fn bounds_string(&self) -> String {
        self.bbox.to_bounds_string()
    }

    /// `POLYGON((x1 y1, x2 y2, ..., xn yn))`
    pub fn wkt(&self) -> String {
        let coords = self
            .ring
            .iter()
            .map(|c| format!("{} {}", c.x, c.y))
            .collect::<Vec<_>>()
            .join(", ");
        format!("POLYGON(({coords}))")
    }
}
