use std::fmt;

use crate::geometry::BoundingBox;

/// Acquisition year of a region; a missing or zero year is `Unknown`,
/// which orders before every known year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum YearKey {
    Unknown,
    Year(u16),
}

impl YearKey {
    pub fn from_year(year: Option<u16>) -> Self {
        match year {
            None | Some(0) => Self::Unknown,
            Some(year) => Self::Year(year),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for YearKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Year(year) => write!(f, "{year}"),
        }
    }
}

/// One remotely hosted dataset: its directory name under the base URL, its
/// coverage box in the catalog CRS and its acquisition year.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionEntry {
    pub filename: String,
    pub bounds: BoundingBox,
    pub year: Option<u16>,
}

impl RegionEntry {
    pub fn new(filename: impl Into<String>, bounds: BoundingBox, year: Option<u16>) -> Self {
        Self {
            filename: filename.into(),
            bounds,
            year,
        }
    }

    pub fn year_key(&self) -> YearKey {
        YearKey::from_year(self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_missing_years_are_unknown() {
        assert_eq!(YearKey::from_year(None), YearKey::Unknown);
        assert_eq!(YearKey::from_year(Some(0)), YearKey::Unknown);
        assert_eq!(YearKey::from_year(Some(2019)), YearKey::Year(2019));
        assert_eq!(YearKey::Unknown.to_string(), "unknown");
        assert_eq!(YearKey::Year(2019).to_string(), "2019");
    }

    #[test]
    fn unknown_sorts_first() {
        let mut keys = vec![YearKey::Year(2020), YearKey::Unknown, YearKey::Year(2015)];
        keys.sort();
        assert_eq!(
            keys,
            vec![YearKey::Unknown, YearKey::Year(2015), YearKey::Year(2020)]
        );
    }
}
