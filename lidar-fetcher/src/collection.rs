use std::collections::BTreeMap;

use lidar_core::{SpatialTable, YearKey};

/// Tables of one fetch, grouped by acquisition year in ascending order.
///
/// Regions sharing a year all keep their table, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultCollection {
    tables: BTreeMap<YearKey, Vec<SpatialTable>>,
}

impl ResultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, year: YearKey, table: SpatialTable) {
        self.tables.entry(year).or_default().push(table);
    }

    pub fn get(&self, year: YearKey) -> &[SpatialTable] {
        self.tables.get(&year).map(Vec::as_slice).unwrap_or_default()
    }

    /// The table processed last for `year`.
    pub fn latest(&self, year: YearKey) -> Option<&SpatialTable> {
        self.get(year).last()
    }

    pub fn years(&self) -> impl Iterator<Item = YearKey> + '_ {
        self.tables.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (YearKey, &[SpatialTable])> {
        self.tables
            .iter()
            .map(|(year, tables)| (*year, tables.as_slice()))
    }

    /// Number of distinct years.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn point_count(&self) -> usize {
        self.tables.values().flatten().map(SpatialTable::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use lidar_core::{PointResult, ResultAssembler};

    use super::*;

    fn table(z: f64) -> SpatialTable {
        let points = PointResult::new(vec![0.0], vec![0.0], vec![z]).unwrap();
        ResultAssembler.assemble(&points, 26915)
    }

    #[test]
    fn duplicate_years_keep_every_table() {
        let mut collection = ResultCollection::new();
        collection.insert(YearKey::Year(2019), table(1.0));
        collection.insert(YearKey::Unknown, table(2.0));
        collection.insert(YearKey::Year(2019), table(3.0));

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.table_count(), 3);
        assert_eq!(collection.point_count(), 3);
        assert_eq!(collection.get(YearKey::Year(2019)).len(), 2);
        assert_eq!(
            collection.latest(YearKey::Year(2019)).unwrap().rows[0].elevation,
            3.0
        );
        assert_eq!(
            collection.years().collect::<Vec<_>>(),
            vec![YearKey::Unknown, YearKey::Year(2019)]
        );
    }

    #[test]
    fn missing_year_is_empty() {
        let collection = ResultCollection::new();
        assert!(collection.get(YearKey::Year(2000)).is_empty());
        assert!(collection.latest(YearKey::Unknown).is_none());
        assert!(collection.is_empty());
    }
}
