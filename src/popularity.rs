//! Share of births carrying each name, and how it changes over time

use crate::{
    aggregate::{self, GroupField, KeyValue},
    filter::{Filter, FilterResolver, Selectors},
    rank,
    store::RecordStore,
    Count, Year,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use unicase::UniCase;

/// Percentage of the filtered births that were given a name
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShareEntry<'store> {
    pub name: &'store str,
    pub percent: f64,
}

/// Change in a name's share of births between two years
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeltaEntry<'store> {
    pub name: &'store str,

    /// Share on the initial year, 0 if the name was not given
    pub percent_from: f64,

    /// Share on the final year, 0 if the name was not given
    pub percent_to: f64,

    /// `percent_to - percent_from`
    pub delta: f64,
}

/// Names whose share of births changed the most between two years
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PopularityChange<'store> {
    /// Initial year, `None` if the dataset is empty
    pub from_year: Option<Year>,

    /// Final year, `None` if the dataset is empty
    pub to_year: Option<Year>,

    /// Names by decreasing delta
    pub gainers: Vec<DeltaEntry<'store>>,

    /// Names by increasing delta
    pub decliners: Vec<DeltaEntry<'store>>,
}

/// Share of the filtered births carried by each name, in order of first
/// appearance
pub fn shares<'store>(store: &'store RecordStore, filter: &Filter) -> Vec<ShareEntry<'store>> {
    let sums = aggregate::group_sum(store, filter, &[GroupField::Name]);
    let total = sums.total();
    sums.iter()
        .filter_map(|(key, count)| {
            let name = key.first().copied().and_then(KeyValue::as_name)?;
            Some(ShareEntry {
                name,
                percent: percent(count, total),
            })
        })
        .collect()
}

/// Compare the share of births carried by each name between two years
///
/// Missing or unknown years default to the earliest (`from`) and latest
/// (`to`) years of the dataset. Births are summed over the regions and
/// genders selected by `scope`, whose year selector is ignored.
pub fn change_of_popularity<'store>(
    store: &'store RecordStore,
    scope: &Selectors,
    from: Option<Year>,
    to: Option<Year>,
    top: usize,
) -> PopularityChange<'store> {
    let resolver = FilterResolver::new(store);
    let Some((from_year, to_year)) = resolver.boundary_years(from, to) else {
        log::warn!("Dataset is empty, no popularity change to report");
        return PopularityChange::default();
    };
    let scope = resolver.resolve(&Selectors {
        year: None,
        ..scope.clone()
    });

    // Outer join of the two years' shares, with 0 for missing names
    let mut joined = Vec::new();
    let mut positions = HashMap::new();
    for share in shares(store, &scope.for_year(from_year)) {
        positions.insert(share.name, joined.len());
        joined.push(DeltaEntry {
            name: share.name,
            percent_from: share.percent,
            percent_to: 0.0,
            delta: 0.0,
        });
    }
    for share in shares(store, &scope.for_year(to_year)) {
        match positions.get(share.name) {
            Some(&idx) => joined[idx].percent_to = share.percent,
            None => joined.push(DeltaEntry {
                name: share.name,
                percent_from: 0.0,
                percent_to: share.percent,
                delta: 0.0,
            }),
        }
    }
    for entry in &mut joined {
        entry.delta = entry.percent_to - entry.percent_from;
    }
    log::debug!(
        "Compared the shares of {} names between {from_year} and {to_year}",
        joined.len()
    );

    // Rank the joined entries, then take gainers and decliners from opposite
    // ends of the ranking
    rank::sort_descending_by(&mut joined, |entry| entry.delta);
    let mut decliners = joined[joined.len().saturating_sub(top)..].to_vec();
    rank::sort_ascending_by(&mut decliners, |entry| entry.delta);
    let mut gainers = joined;
    gainers.truncate(top);
    PopularityChange {
        from_year: Some(from_year),
        to_year: Some(to_year),
        gainers,
        decliners,
    }
}

/// Point of a [`ShareSeries`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SharePoint {
    pub year: Year,
    pub percent: f64,
}

/// Yearly share of births carrying a name
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShareSeries {
    /// Name, as requested by the user
    pub name: Box<str>,

    /// Region code, if the series is restricted to one region
    pub region: Option<Box<str>>,

    /// Gender code, if the series is restricted to one gender
    pub gender: Option<Box<str>>,

    /// One point per dataset year within the requested range
    pub points: Vec<SharePoint>,
}

/// Compute the yearly share of the births selected by `scope` that carry a
/// name, matched case-insensitively
///
/// Every dataset year within `[from, to]` gets a point, which is 0 when the
/// name was not given or no birth matches the scope. Missing bounds default
/// to the dataset's boundaries. The year selector of `scope` is ignored.
pub fn share_series(
    store: &RecordStore,
    name: &str,
    from: Option<Year>,
    to: Option<Year>,
    scope: &Selectors,
) -> ShareSeries {
    let resolver = FilterResolver::new(store);
    let filter = resolver.resolve(&Selectors {
        year: None,
        ..scope.clone()
    });
    let mut series = ShareSeries {
        name: name.into(),
        region: match (&scope.region, filter.regions()) {
            (Some(wanted), [region]) if wanted.trim().eq_ignore_ascii_case(region) => {
                Some(region.clone())
            }
            _ => None,
        },
        gender: match (&scope.gender, filter.genders()) {
            (Some(wanted), [gender]) if &**wanted == gender.code() => {
                Some(gender.code().into())
            }
            _ => None,
        },
        points: Vec::new(),
    };
    let (Some(first), Some(last)) = (
        from.or(store.min_year()),
        to.or(store.max_year()),
    ) else {
        return series;
    };

    // Total births and births with the requested name, per year
    let wanted = UniCase::new(name);
    let mut per_year = BTreeMap::<Year, (Count, Count)>::new();
    let sums = aggregate::group_sum(store, &filter, &[GroupField::Year, GroupField::Name]);
    for (key, count) in sums.iter() {
        let [KeyValue::Year(year), KeyValue::Name(given)] = key else {
            continue;
        };
        let (total, named) = per_year.entry(*year).or_default();
        *total += count;
        if UniCase::new(*given) == wanted {
            *named += count;
        }
    }

    series.points = (store.years().iter())
        .filter(|&&year| first <= year && year <= last)
        .map(|&year| {
            let (total, named) = per_year.get(&year).copied().unwrap_or_default();
            SharePoint {
                year,
                percent: percent(named, total),
            }
        })
        .collect();
    series
}

/// Percentage that a count represents within a total, 0 for an empty total
fn percent(count: Count, total: Count) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{store::tests::store_from_rows, Gender};
    use pretty_assertions::assert_eq;

    fn store() -> RecordStore {
        store_from_rows(&[
            ("WA", Gender::Female, 2014, "Ann", 10),
            ("WA", Gender::Male, 2014, "Bob", 5),
            ("WA", Gender::Female, 2015, "Ann", 8),
            ("WA", Gender::Male, 2015, "Cid", 6),
        ])
    }

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 0.05
    }

    #[test]
    fn shares_divide_by_year_total() {
        let store = store();
        let filter = FilterResolver::new(&store).resolve(&Selectors {
            year: Some(2014),
            ..Selectors::default()
        });
        let shares = shares(&store, &filter);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].name, "Ann");
        assert!(close(shares[0].percent, 66.7));
        assert!(close(shares[1].percent, 33.3));
    }

    #[test]
    fn popularity_change_outer_joins_years() {
        let store = store();
        let change = change_of_popularity(&store, &Selectors::default(), Some(2014), Some(2015), 3);
        assert_eq!(change.from_year, Some(2014));
        assert_eq!(change.to_year, Some(2015));

        let gainers = change.gainers.iter().map(|e| e.name).collect::<Vec<_>>();
        assert_eq!(gainers, ["Cid", "Ann", "Bob"]);
        let decliners = change.decliners.iter().map(|e| e.name).collect::<Vec<_>>();
        assert_eq!(decliners, ["Bob", "Ann", "Cid"]);

        let by_name = |name: &str| change.gainers.iter().find(|e| e.name == name).unwrap();
        let ann = by_name("Ann");
        assert!(close(ann.percent_from, 66.7) && close(ann.percent_to, 57.1));
        assert!(close(ann.delta, -9.5));
        let bob = by_name("Bob");
        assert!(close(bob.percent_from, 33.3) && bob.percent_to == 0.0);
        assert!(close(bob.delta, -33.3));
        let cid = by_name("Cid");
        assert!(cid.percent_from == 0.0 && close(cid.percent_to, 42.9));
        assert!(close(cid.delta, 42.9));
    }

    #[test]
    fn popularity_change_invariants() {
        let store = store();
        let change = change_of_popularity(&store, &Selectors::default(), None, None, 10);
        for entry in change.gainers.iter().chain(&change.decliners) {
            assert_eq!(entry.delta, entry.percent_to - entry.percent_from);
            assert!((0.0..=100.0).contains(&entry.percent_from));
            assert!((0.0..=100.0).contains(&entry.percent_to));
        }
        assert!(change.gainers.windows(2).all(|w| w[0].delta >= w[1].delta));
        assert!(change.decliners.windows(2).all(|w| w[0].delta <= w[1].delta));
    }

    #[test]
    fn popularity_change_truncates_and_defaults_years() {
        let store = store();
        let change = change_of_popularity(&store, &Selectors::default(), Some(1900), None, 1);
        assert_eq!(change.from_year, Some(2014));
        assert_eq!(change.to_year, Some(2015));
        assert_eq!(change.gainers.len(), 1);
        assert_eq!(change.gainers[0].name, "Cid");
        assert_eq!(change.decliners.len(), 1);
        assert_eq!(change.decliners[0].name, "Bob");
    }

    #[test]
    fn popularity_change_respects_scope() {
        let store = store();
        let scope = Selectors {
            gender: Some("F".into()),
            ..Selectors::default()
        };
        let change = change_of_popularity(&store, &scope, None, None, 10);
        assert_eq!(change.gainers.len(), 1);
        assert_eq!(change.gainers[0].name, "Ann");
        assert_eq!(change.gainers[0].delta, 0.0);
    }

    #[test]
    fn decliners_come_from_the_tail_of_the_ranking() {
        let store = store_from_rows(&[
            ("WA", Gender::Female, 2014, "Ann", 5),
            ("WA", Gender::Male, 2014, "Bob", 5),
            ("WA", Gender::Male, 2015, "Cid", 5),
            ("WA", Gender::Female, 2015, "Dan", 5),
        ]);
        let change = change_of_popularity(&store, &Selectors::default(), None, None, 1);
        assert_eq!(change.gainers[0].name, "Cid");
        assert_eq!(change.decliners.len(), 1);
        assert_eq!(change.decliners[0].name, "Bob");

        let change = change_of_popularity(&store, &Selectors::default(), None, None, 3);
        let decliners = change.decliners.iter().map(|e| e.name).collect::<Vec<_>>();
        assert_eq!(decliners, ["Ann", "Bob", "Dan"]);
    }

    #[test]
    fn popularity_change_on_empty_store() {
        let store = RecordStore::default();
        let change = change_of_popularity(&store, &Selectors::default(), None, None, 10);
        assert_eq!(change, PopularityChange::default());
    }

    #[test]
    fn share_series_covers_requested_years() {
        let store = store();
        let series = share_series(&store, "ann", None, None, &Selectors::default());
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].year, 2014);
        assert!(close(series.points[0].percent, 66.7));
        assert!(close(series.points[1].percent, 57.1));

        let series = share_series(&store, "Cid", Some(2015), Some(2015), &Selectors::default());
        assert_eq!(series.points.len(), 1);
        assert!(close(series.points[0].percent, 42.9));
    }

    #[test]
    fn share_series_within_gender() {
        let store = store();
        let scope = Selectors {
            gender: Some("M".into()),
            region: Some("wa".into()),
            ..Selectors::default()
        };
        let series = share_series(&store, "Bob", None, None, &scope);
        assert_eq!(series.region.as_deref(), Some("WA"));
        assert_eq!(series.gender.as_deref(), Some("M"));
        let percents = series.points.iter().map(|p| p.percent).collect::<Vec<_>>();
        assert_eq!(percents, [100.0, 0.0]);
    }

    #[test]
    fn share_series_only_reports_matching_selectors() {
        let store = store();
        let scope = Selectors {
            region: Some("XX".into()),
            gender: Some("Q".into()),
            ..Selectors::default()
        };
        let series = share_series(&store, "Ann", None, None, &scope);
        assert_eq!(series.region, None);
        assert_eq!(series.gender, None);
        assert_eq!(series.points.len(), 2);
    }
}
