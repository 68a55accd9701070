//! Mechanism for building a [`RecordStore`] from several data files

use super::{InvalidRecordError, RawObservation, RecordStore};
use crate::Region;
use std::collections::BTreeMap;

/// Accumulator for the rows of every data file
///
/// Data files are read concurrently and complete in an unpredictable order,
/// so their rows are kept per region and only concatenated, in region order,
/// by [`finish()`](Self::finish). This way, the resulting store does not
/// depend on I/O timings.
#[derive(Clone, Debug, Default)]
pub struct StoreBuilder {
    /// Rows from each data file, in file order
    files: BTreeMap<Region, Vec<RawObservation>>,
}
//
impl StoreBuilder {
    /// Set up the accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate the rows of a region's data file
    pub fn add_file(&mut self, region: Region, rows: Vec<RawObservation>) {
        log::debug!("Got {} rows from region {region}", rows.len());
        self.files.entry(region).or_default().extend(rows);
    }

    /// Number of rows collected so far
    pub fn num_rows(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Validate the collected rows and turn them into a store
    ///
    /// On failure, the index of the offending row is counted across all data
    /// files, in region order.
    pub fn finish(self) -> Result<RecordStore, InvalidRecordError> {
        let mut boundaries = Vec::with_capacity(self.files.len());
        let mut rows = Vec::with_capacity(self.num_rows());
        for (region, file_rows) in self.files {
            rows.extend(file_rows);
            boundaries.push((region, rows.len()));
        }
        RecordStore::load(rows).map_err(|error| {
            if let Some((region, end)) = boundaries.iter().find(|(_, end)| error.index < *end) {
                log::error!(
                    "Invalid row found in the data file of region {region}, {} rows before its end",
                    end - error.index
                );
            }
            error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{store::InvalidRecordCause, Gender};
    use pretty_assertions::assert_eq;

    fn raw(region: &str, name: &str, count: i64) -> RawObservation {
        RawObservation {
            region: Some(region.into()),
            gender: Some("F".into()),
            year: Some(2000),
            name: Some(name.into()),
            count: Some(count),
        }
    }

    #[test]
    fn files_are_merged_in_region_order() {
        let mut builder = StoreBuilder::new();
        builder.add_file("WA".into(), vec![raw("WA", "Ann", 3), raw("WA", "Eve", 1)]);
        builder.add_file("AK".into(), vec![raw("AK", "Ann", 2)]);
        assert_eq!(builder.num_rows(), 3);

        let store = builder.finish().unwrap();
        let rows = (store.observations().iter())
            .map(|o| (&*o.region, &*o.name, o.count))
            .collect::<Vec<_>>();
        assert_eq!(rows, [("AK", "Ann", 2), ("WA", "Ann", 3), ("WA", "Eve", 1)]);
        assert_eq!(store.genders(), &[Gender::Female]);
    }

    #[test]
    fn error_index_spans_files() {
        let mut builder = StoreBuilder::new();
        builder.add_file("WA".into(), vec![raw("WA", "Ann", 1), raw("WA", "Eve", -2)]);
        builder.add_file("AK".into(), vec![raw("AK", "Ann", 2)]);
        let error = builder.finish().unwrap_err();
        assert_eq!(error.index, 2);
        assert_eq!(error.cause, InvalidRecordCause::NegativeCount(-2));
    }

    #[test]
    fn empty_builder_gives_empty_store() {
        let store = StoreBuilder::new().finish().unwrap();
        assert!(store.observations().is_empty());
    }
}
