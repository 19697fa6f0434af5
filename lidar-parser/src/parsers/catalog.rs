use std::{collections::HashMap, io::Read, path::PathBuf};

use csv::ReaderBuilder;
use lidar_core::{BoundingBox, EpsgCode, RegionCatalog, RegionEntry};

use super::CatalogParser;
use crate::error::CatalogError;

const REQUIRED_COLUMNS: [&str; 5] = ["filename", "xmin", "xmax", "ymin", "ymax"];
const YEAR_COLUMN: &str = "year";
const MISSING_VALUES: [&str; 4] = ["", "na", "nan", "undefined"];

/// Reads the region catalog CSV (`filename, xmin, xmax, ymin, ymax, year`).
///
/// Columns are matched by header name, so their order does not matter and
/// extra columns are ignored. Bounds are expected in `epsg`.
pub struct CsvCatalogParser {
    pub filename: PathBuf,
    pub epsg: EpsgCode,
}

impl CatalogParser for CsvCatalogParser {
    fn parse(&self) -> Result<RegionCatalog, CatalogError> {
        let start = std::time::Instant::now();
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.filename)
            .map_err(|source| CatalogError::Read {
                path: self.filename.clone(),
                source,
            })?;

        let catalog = parse_catalog(reader, self.epsg)?;
        log::info!(
            "loaded {} regions from {:?} in {:?}",
            catalog.len(),
            self.filename,
            start.elapsed()
        );
        Ok(catalog)
    }
}

/// Parses catalog rows from any reader, e.g. an in-memory buffer.
pub fn parse_catalog_from_reader<R: Read>(
    rdr: R,
    epsg: EpsgCode,
) -> Result<RegionCatalog, CatalogError> {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);
    parse_catalog(reader, epsg)
}

fn parse_catalog<R: Read>(
    mut reader: csv::Reader<R>,
    epsg: EpsgCode,
) -> Result<RegionCatalog, CatalogError> {
    let field_mapping = create_field_mapping(reader.headers()?)?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        entries.push(parse_entry(&record, &field_mapping, line)?);
    }

    Ok(RegionCatalog::new(epsg, entries))
}

fn normalize_header(header: &str) -> String {
    header.to_lowercase().replace(['_', '-', ' '], "")
}

fn create_field_mapping(
    headers: &csv::StringRecord,
) -> Result<HashMap<&'static str, usize>, CatalogError> {
    let mut mapping = HashMap::new();

    for (index, header) in headers.iter().enumerate() {
        let normalized_header = normalize_header(header);
        for name in REQUIRED_COLUMNS.iter().chain(&[YEAR_COLUMN]) {
            if normalized_header == *name {
                mapping.entry(*name).or_insert(index);
                break;
            }
        }
    }

    for name in REQUIRED_COLUMNS {
        if !mapping.contains_key(name) {
            return Err(CatalogError::MissingColumn(name));
        }
    }

    Ok(mapping)
}

fn get_field_value<'a>(
    record: &'a csv::StringRecord,
    field_mapping: &HashMap<&'static str, usize>,
    field_name: &str,
) -> Option<&'a str> {
    field_mapping
        .get(field_name)
        .and_then(|&index| record.get(index))
        .filter(|value| !MISSING_VALUES.contains(&value.to_lowercase().as_str()))
}

fn parse_required_f64(
    record: &csv::StringRecord,
    field_mapping: &HashMap<&'static str, usize>,
    field: &'static str,
    line: u64,
) -> Result<f64, CatalogError> {
    let value = get_field_value(record, field_mapping, field)
        .ok_or(CatalogError::EmptyField { line, field })?;
    value.parse().map_err(|_| CatalogError::InvalidValue {
        line,
        field,
        value: value.to_string(),
    })
}

/// Years may have been written as floats (`2019.0`) by tabular tools.
fn parse_year(
    record: &csv::StringRecord,
    field_mapping: &HashMap<&'static str, usize>,
    line: u64,
) -> Result<Option<u16>, CatalogError> {
    let Some(value) = get_field_value(record, field_mapping, YEAR_COLUMN) else {
        return Ok(None);
    };
    let invalid = || CatalogError::InvalidValue {
        line,
        field: YEAR_COLUMN,
        value: value.to_string(),
    };

    let year: f64 = value.parse().map_err(|_| invalid())?;
    if year.fract() != 0.0 || !(0.0..=f64::from(u16::MAX)).contains(&year) {
        return Err(invalid());
    }
    Ok(Some(year as u16))
}

fn parse_entry(
    record: &csv::StringRecord,
    field_mapping: &HashMap<&'static str, usize>,
    line: u64,
) -> Result<RegionEntry, CatalogError> {
    let filename = get_field_value(record, field_mapping, "filename")
        .ok_or(CatalogError::EmptyField {
            line,
            field: "filename",
        })?
        .to_string();

    let xmin = parse_required_f64(record, field_mapping, "xmin", line)?;
    let xmax = parse_required_f64(record, field_mapping, "xmax", line)?;
    let ymin = parse_required_f64(record, field_mapping, "ymin", line)?;
    let ymax = parse_required_f64(record, field_mapping, "ymax", line)?;

    let bounds = BoundingBox::new(xmin, ymin, xmax, ymax).map_err(|source| {
        CatalogError::InvalidBounds {
            line,
            filename: filename.clone(),
            source,
        }
    })?;
    let year = parse_year(record, field_mapping, line)?;

    Ok(RegionEntry {
        filename,
        bounds,
        year,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use lidar_core::YearKey;

    use super::*;

    const CATALOG: &str = "\
,filename,region,year,xmin,xmax,ymin,ymax,points
0,AK_BrooksCamp_2012,AK_BrooksCamp,2012.0,-17231000.0,-17205000.0,8084000.0,8108000.0,17000000
1,IA_FullState,IA_FullState,,-10796577.0,-10012834.0,4902908.0,5410419.0,166000000000
2,IA_Story_2008,IA_Story,2008,-10447000.0,-10397000.0,5134000.0,5184000.0,980000000
";

    #[test]
    fn parses_rows_by_header_name() {
        let catalog = parse_catalog_from_reader(CATALOG.as_bytes(), 3857).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.epsg(), 3857);

        let brooks = catalog.get("AK_BrooksCamp_2012").unwrap();
        assert_eq!(brooks.year, Some(2012));
        assert_eq!(brooks.bounds.min_x(), -17231000.0);
        assert_eq!(brooks.bounds.max_y(), 8108000.0);
    }

    #[test]
    fn missing_year_is_unknown() {
        let catalog = parse_catalog_from_reader(CATALOG.as_bytes(), 3857).unwrap();
        let iowa = catalog.get("IA_FullState").unwrap();
        assert_eq!(iowa.year, None);
        assert_eq!(iowa.year_key(), YearKey::Unknown);
    }

    #[test]
    fn na_year_is_unknown() {
        let csv = "filename,xmin,xmax,ymin,ymax,year\nA,0,1,0,1,NA\nB,0,1,0,1,undefined\n";
        let catalog = parse_catalog_from_reader(csv.as_bytes(), 3857).unwrap();
        assert!(catalog.iter().all(|e| e.year.is_none()));
    }

    #[test]
    fn year_column_is_optional() {
        let csv = "Filename,X_Min,X_Max,Y_Min,Y_Max\nA,0,1,0,1\n";
        let catalog = parse_catalog_from_reader(csv.as_bytes(), 3857).unwrap();
        assert_eq!(catalog.get("A").unwrap().year, None);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "filename,xmin,xmax,ymin\nA,0,1,0\n";
        let err = parse_catalog_from_reader(csv.as_bytes(), 3857).unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn("ymax")));
    }

    #[test]
    fn bad_values_are_reported_with_line() {
        let csv = "filename,xmin,xmax,ymin,ymax,year\nA,0,1,0,1,2010\nB,zero,1,0,1,2011\n";
        let err = parse_catalog_from_reader(csv.as_bytes(), 3857).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidValue {
                line: 3,
                field: "xmin",
                ..
            }
        ));

        let csv = "filename,xmin,xmax,ymin,ymax,year\nA,0,1,0,1,2010.5\n";
        let err = parse_catalog_from_reader(csv.as_bytes(), 3857).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidValue { field: "year", .. }));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let csv = "filename,xmin,xmax,ymin,ymax\nA,5,1,0,1\n";
        let err = parse_catalog_from_reader(csv.as_bytes(), 3857).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidBounds { .. }));
    }

    #[test]
    fn parses_catalog_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let parser = CsvCatalogParser {
            filename: file.path().to_path_buf(),
            epsg: 3857,
        };
        let catalog = parser.parse().unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn missing_file_is_an_error() {
        let parser = CsvCatalogParser {
            filename: PathBuf::from("/nonexistent/usgs_3dep_regions.csv"),
            epsg: 3857,
        };
        assert!(matches!(parser.parse(), Err(CatalogError::Read { .. })));
    }
}
