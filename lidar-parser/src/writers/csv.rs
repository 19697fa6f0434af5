use std::{io::Write, path::Path};

use lidar_core::SpatialTable;
use serde::Serialize;

#[derive(Serialize)]
struct TableRecord {
    elevation: f64,
    geometry: String,
}

/// Writes `elevation,geometry` rows with the geometry as WKT `POINT (x y)`.
pub fn write_table<W: Write>(table: &SpatialTable, writer: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in table.iter() {
        writer.serialize(TableRecord {
            elevation: row.elevation,
            geometry: row.geometry.to_wkt(),
        })?;
    }
    if table.is_empty() {
        writer.write_record(["elevation", "geometry"])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_table_to_path(table: &SpatialTable, path: &Path) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_table(table, std::io::BufWriter::new(file))
}
