//! Names whose gender association changed over time
//!
//! A name's gender association on a given year is the proportion of the
//! babies given that name who were boys. It is only defined for names that
//! were given to both boys and girls on that year.

use crate::{
    aggregate::{self, GroupField, KeyValue},
    filter::{Filter, FilterResolver, Selectors},
    rank,
    store::RecordStore,
    Count, Gender, Year,
};
use serde::Serialize;
use std::collections::{hash_map, HashMap};

/// Male/female split of a name that was given to both genders
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenderSplit<'store> {
    pub name: &'store str,
    pub male_count: Count,
    pub female_count: Count,

    /// `male_count / (male_count + female_count)`
    pub proportion_male: f64,
}

/// Every [`GenderSplit`] under a filter, in order of first appearance
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenderSplits<'store>(pub Vec<GenderSplit<'store>>);

/// Change in a name's gender association between two years
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlipEntry<'store> {
    pub name: &'store str,
    pub proportion_male_from: f64,
    pub proportion_male_to: f64,

    /// `proportion_male_to - proportion_male_from`
    pub delta: f64,

    /// Absolute value of `delta`, which entries are ranked by
    pub abs_delta: f64,
}

/// Names whose gender association changed the most between two years
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NameFlips<'store> {
    /// Initial year, `None` if the dataset is empty
    pub from_year: Option<Year>,

    /// Final year, `None` if the dataset is empty
    pub to_year: Option<Year>,

    /// Names by decreasing absolute change
    pub entries: Vec<FlipEntry<'store>>,
}

/// Per-gender totals of a name, either of which may be missing
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct PairedTotals {
    female: Option<Count>,
    male: Option<Count>,
}
//
impl PairedTotals {
    /// Record the total of one gender
    fn set(&mut self, gender: Gender, total: Count) {
        match gender {
            Gender::Female => self.female = Some(total),
            Gender::Male => self.male = Some(total),
        }
    }

    /// (male, female) totals, if both genders were recorded
    fn pair(self) -> Option<(Count, Count)> {
        Some((self.male?, self.female?))
    }
}

/// Male/female split of every name that was given to both genders under a
/// filter
///
/// Names that were only given to one gender, or whose totals are all zero,
/// are left out.
pub fn gender_proportions<'store>(
    store: &'store RecordStore,
    filter: &Filter,
) -> GenderSplits<'store> {
    // Pair up the per-gender totals of each name
    let sums = aggregate::group_sum(store, filter, &[GroupField::Name, GroupField::Gender]);
    let mut names = Vec::<(&'store str, PairedTotals)>::new();
    let mut positions = HashMap::<&'store str, usize>::new();
    for (key, count) in sums.iter() {
        let [KeyValue::Name(name), KeyValue::Gender(gender)] = key else {
            continue;
        };
        let idx = match positions.entry(*name) {
            hash_map::Entry::Occupied(o) => *o.get(),
            hash_map::Entry::Vacant(v) => {
                names.push((*name, PairedTotals::default()));
                *v.insert(names.len() - 1)
            }
        };
        names[idx].1.set(*gender, count);
    }

    // Keep names with both genders
    let splits = (names.into_iter())
        .filter_map(|(name, totals)| {
            let Some((male_count, female_count)) = totals.pair() else {
                log::trace!("Dropped {name:?}, which was only given to one gender");
                return None;
            };
            let total = male_count + female_count;
            if total == 0 {
                log::trace!("Dropped {name:?}, which has no recorded birth");
                return None;
            }
            Some(GenderSplit {
                name,
                male_count,
                female_count,
                proportion_male: male_count as f64 / total as f64,
            })
        })
        .collect::<Vec<_>>();
    log::debug!("Found {} names that were given to both genders", splits.len());
    GenderSplits(splits)
}

/// Find the `n` names whose gender association changed the most between two
/// years, summed over every region
///
/// Missing or unknown years default to the earliest (`from`) and latest
/// (`to`) years of the dataset. Only names that were given to both genders
/// on both years are considered.
pub fn name_flip<'store>(
    store: &'store RecordStore,
    n: usize,
    from: Option<Year>,
    to: Option<Year>,
) -> NameFlips<'store> {
    let resolver = FilterResolver::new(store);
    let Some((from_year, to_year)) = resolver.boundary_years(from, to) else {
        log::warn!("Dataset is empty, no gender flip to report");
        return NameFlips::default();
    };
    let everything = resolver.resolve(&Selectors::default());
    let splits_from = gender_proportions(store, &everything.for_year(from_year));
    let proportions_to = (gender_proportions(store, &everything.for_year(to_year)).0)
        .into_iter()
        .map(|split| (split.name, split.proportion_male))
        .collect::<HashMap<_, _>>();

    // Inner join of both years, ranked by absolute change
    let mut entries = (splits_from.0.into_iter())
        .filter_map(|split| {
            let proportion_male_to = *proportions_to.get(split.name)?;
            let delta = proportion_male_to - split.proportion_male;
            Some(FlipEntry {
                name: split.name,
                proportion_male_from: split.proportion_male,
                proportion_male_to,
                delta,
                abs_delta: delta.abs(),
            })
        })
        .collect::<Vec<_>>();
    rank::sort_descending_by(&mut entries, |entry| entry.abs_delta);
    entries.truncate(n);
    NameFlips {
        from_year: Some(from_year),
        to_year: Some(to_year),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::store_from_rows;
    use pretty_assertions::assert_eq;

    fn store() -> RecordStore {
        store_from_rows(&[
            // Leslie flips from mostly male to mostly female
            ("WA", Gender::Male, 1950, "Leslie", 90),
            ("OR", Gender::Female, 1950, "Leslie", 10),
            ("WA", Gender::Male, 2000, "Leslie", 5),
            ("WA", Gender::Female, 2000, "Leslie", 95),
            // Jordan drifts a little
            ("WA", Gender::Male, 1950, "Jordan", 60),
            ("WA", Gender::Female, 1950, "Jordan", 40),
            ("OR", Gender::Male, 2000, "Jordan", 50),
            ("OR", Gender::Female, 2000, "Jordan", 50),
            // Kim is only female in 2000
            ("WA", Gender::Male, 1950, "Kim", 30),
            ("WA", Gender::Female, 1950, "Kim", 70),
            ("WA", Gender::Female, 2000, "Kim", 100),
            // Taylor only shows up in 2000
            ("WA", Gender::Male, 2000, "Taylor", 20),
            ("WA", Gender::Female, 2000, "Taylor", 80),
            // A middle year that is ignored by default
            ("WA", Gender::Male, 1975, "Leslie", 1),
            ("WA", Gender::Female, 1975, "Leslie", 1),
        ])
    }

    #[test]
    fn proportions_require_both_genders() {
        let store = store();
        let filter = FilterResolver::new(&store).resolve(&Selectors {
            year: Some(2000),
            ..Selectors::default()
        });
        let splits = gender_proportions(&store, &filter).0;
        let names = splits.iter().map(|s| s.name).collect::<Vec<_>>();
        assert_eq!(names, ["Leslie", "Jordan", "Taylor"]);
        assert_eq!(splits[0].male_count, 5);
        assert_eq!(splits[0].female_count, 95);
        assert_eq!(splits[0].proportion_male, 0.05);
    }

    #[test]
    fn flips_rank_by_absolute_change() {
        let store = store();
        let flips = name_flip(&store, 10, None, None);
        assert_eq!(flips.from_year, Some(1950));
        assert_eq!(flips.to_year, Some(2000));

        let names = flips.entries.iter().map(|e| e.name).collect::<Vec<_>>();
        assert_eq!(names, ["Leslie", "Jordan"]);
        let leslie = &flips.entries[0];
        assert_eq!(leslie.proportion_male_from, 0.9);
        assert_eq!(leslie.proportion_male_to, 0.05);
        assert!((leslie.delta + 0.85).abs() < 1e-9);
        assert_eq!(leslie.abs_delta, leslie.delta.abs());
        assert!(flips
            .entries
            .windows(2)
            .all(|w| w[0].abs_delta >= w[1].abs_delta));
    }

    #[test]
    fn flip_boundaries_can_be_overridden() {
        let store = store();
        let flips = name_flip(&store, 10, Some(1975), Some(2000));
        assert_eq!(flips.from_year, Some(1975));
        let names = flips.entries.iter().map(|e| e.name).collect::<Vec<_>>();
        assert_eq!(names, ["Leslie"]);
        assert!((flips.entries[0].delta + 0.45).abs() < 1e-9);

        let flips = name_flip(&store, 1, Some(1850), None);
        assert_eq!(flips.from_year, Some(1950));
        assert_eq!(flips.entries.len(), 1);
    }

    #[test]
    fn flip_on_empty_store() {
        let store = RecordStore::default();
        assert_eq!(name_flip(&store, 10, None, None), NameFlips::default());
    }
}
