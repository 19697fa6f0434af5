use lidar_core::{Coord, EpsgCode, Polygon};

use crate::error::WktError;

/// Parses `POLYGON((x1 y1, x2 y2, ...))` into a polygon in `epsg`.
///
/// Only the exterior ring is kept; interior rings are ignored with a warning.
/// A third ordinate on a coordinate is dropped.
pub fn parse_polygon_wkt(text: &str, epsg: EpsgCode) -> Result<Polygon, WktError> {
    let text = text.trim();
    let body = strip_keyword(text, "POLYGON")
        .ok_or_else(|| WktError::NotAPolygon(text.chars().take(32).collect()))?;

    let rings = body
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or(WktError::Syntax("polygon body must be enclosed in parentheses"))?
        .trim();

    let exterior = rings
        .strip_prefix('(')
        .ok_or(WktError::Syntax("ring must start with '('"))?;
    let end = exterior
        .find(')')
        .ok_or(WktError::Syntax("ring is not terminated by ')'"))?;

    let remainder = exterior[end + 1..].trim();
    if !remainder.is_empty() {
        if !remainder.starts_with(',') {
            return Err(WktError::Syntax("unexpected text after exterior ring"));
        }
        log::warn!("polygon has interior rings; only the exterior ring is used");
    }

    let ring = exterior[..end]
        .split(',')
        .map(parse_coord)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Polygon::new(ring, epsg)?)
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    if head.eq_ignore_ascii_case(keyword) {
        Some(&text[keyword.len()..])
    } else {
        None
    }
}

fn parse_coord(pair: &str) -> Result<Coord, WktError> {
    let invalid = || WktError::InvalidCoordinate(pair.trim().to_string());
    let mut ordinates = pair.split_whitespace().map(str::parse::<f64>);

    let x = ordinates.next().ok_or_else(invalid)?.map_err(|_| invalid())?;
    let y = ordinates.next().ok_or_else(invalid)?.map_err(|_| invalid())?;
    match ordinates.next() {
        None | Some(Ok(_)) => {}
        Some(Err(_)) => return Err(invalid()),
    }
    if ordinates.next().is_some() {
        return Err(invalid());
    }

    Ok(Coord::new(x, y))
}
