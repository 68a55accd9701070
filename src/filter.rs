//! Resolution of user selectors into concrete observation filters
//!
//! Selectors that are absent, or that name a value which does not appear in
//! the dataset, widen to every known value instead of failing. Callers that
//! need strict validation must perform it before resolution.

use crate::{
    aggregate::{GroupField, KeyValue},
    store::{Observation, RecordStore},
    Gender, Region, Year,
};
use std::fmt::Debug;

/// User-facing observation selectors
///
/// `None` means "everything", and so do values that match nothing.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Selectors {
    /// Region code, case-insensitive
    pub region: Option<Box<str>>,

    /// Year of birth
    pub year: Option<Year>,

    /// Gender code, "M" or "F"
    pub gender: Option<Box<str>>,
}

/// Filterable observation dimension
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, clap::ValueEnum)]
pub enum Dimension {
    Region,
    Year,
    Gender,
}
//
impl Dimension {
    /// Values of this dimension that are accepted by a filter, in ascending
    /// order, borrowed from the store
    pub fn values<'store>(
        self,
        store: &'store RecordStore,
        filter: &Filter,
    ) -> Vec<KeyValue<'store>> {
        match self {
            Self::Region => (store.regions().iter())
                .filter(|region| filter.accepts_region(region))
                .map(|region| KeyValue::Region(&**region))
                .collect(),
            Self::Year => (store.years().iter())
                .filter(|year| filter.years.binary_search(year).is_ok())
                .map(|&year| KeyValue::Year(year))
                .collect(),
            Self::Gender => (store.genders().iter())
                .filter(|gender| filter.genders.contains(gender))
                .map(|&gender| KeyValue::Gender(gender))
                .collect(),
        }
    }
}
//
impl From<Dimension> for GroupField {
    fn from(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Region => Self::Region,
            Dimension::Year => Self::Year,
            Dimension::Gender => Self::Gender,
        }
    }
}

/// Concrete observation filter, with sorted sets of accepted values
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Filter {
    regions: Box<[Region]>,
    years: Box<[Year]>,
    genders: Box<[Gender]>,
}
//
impl Filter {
    /// Truth that an observation passes this filter
    pub fn matches(&self, observation: &Observation) -> bool {
        self.years.binary_search(&observation.year).is_ok()
            && self.genders.contains(&observation.gender)
            && self.accepts_region(&observation.region)
    }

    /// Accepted regions, in ascending order
    pub fn regions(&self) -> &[Region] {
        &self.regions[..]
    }

    /// Accepted years, in ascending order
    pub fn years(&self) -> &[Year] {
        &self.years[..]
    }

    /// Accepted genders, in ascending order
    pub fn genders(&self) -> &[Gender] {
        &self.genders[..]
    }

    /// Same filter, restricted to a single year
    pub fn for_year(&self, year: Year) -> Self {
        Self {
            years: Box::new([year]),
            ..self.clone()
        }
    }

    fn accepts_region(&self, region: &str) -> bool {
        (self.regions.binary_search_by(|accepted| (**accepted).cmp(region))).is_ok()
    }
}

/// Turns [`Selectors`] into [`Filter`]s based on the contents of a store
#[derive(Clone, Copy, Debug)]
pub struct FilterResolver<'store> {
    store: &'store RecordStore,
}
//
impl<'store> FilterResolver<'store> {
    /// Prepare to resolve selectors against a store
    pub fn new(store: &'store RecordStore) -> Self {
        Self { store }
    }

    /// Resolve every selector
    pub fn resolve(&self, selectors: &Selectors) -> Filter {
        Filter {
            regions: self.resolve_region(selectors.region.as_deref()),
            years: self.resolve_year(selectors.year),
            genders: self.resolve_gender(selectors.gender.as_deref()),
        }
    }

    /// Resolve a region selector, after trimming and upper-casing it
    pub fn resolve_region(&self, region: Option<&str>) -> Box<[Region]> {
        let region = region.map(|region| Region::from(region.trim().to_ascii_uppercase()));
        pick(self.store.regions(), region, "region")
    }

    /// Resolve a year selector
    pub fn resolve_year(&self, year: Option<Year>) -> Box<[Year]> {
        pick(self.store.years(), year, "year")
    }

    /// Resolve a gender selector
    pub fn resolve_gender(&self, gender: Option<&str>) -> Box<[Gender]> {
        let known = self.store.genders();
        match gender.map(|code| (code, Gender::from_code(code))) {
            Some((_, Some(gender))) => pick(known, Some(gender), "gender"),
            Some((code, None)) => {
                log::warn!("Unknown gender {code:?}, selecting all genders");
                known.into()
            }
            None => known.into(),
        }
    }

    /// Resolve the two boundary years of a comparison
    ///
    /// Unlike other year selectors, a missing or unknown boundary falls back
    /// to the earliest (for `from`) or latest (for `to`) year of the
    /// dataset. Returns `None` if the dataset is empty.
    pub fn boundary_years(&self, from: Option<Year>, to: Option<Year>) -> Option<(Year, Year)> {
        let years = self.store.years();
        let boundary = |year: Option<Year>, default: Year, what: &str| match year {
            Some(year) if years.binary_search(&year).is_ok() => year,
            Some(year) => {
                log::warn!("Year {year} is not in the dataset, using {default} as the {what} year");
                default
            }
            None => default,
        };
        let from = boundary(from, self.store.min_year()?, "initial");
        let to = boundary(to, self.store.max_year()?, "final");
        Some((from, to))
    }
}

/// Resolve a selector against a sorted set of known values
fn pick<T: Clone + Debug + Ord>(known: &[T], value: Option<T>, what: &str) -> Box<[T]> {
    match value {
        Some(value) if known.binary_search(&value).is_ok() => Box::new([value]),
        Some(value) => {
            log::warn!("Unknown {what} {value:?}, selecting all {what}s");
            known.into()
        }
        None => known.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::store_from_rows;
    use pretty_assertions::assert_eq;

    fn store() -> RecordStore {
        store_from_rows(&[
            ("WA", Gender::Male, 1993, "John", 120),
            ("WA", Gender::Female, 1993, "Mary", 95),
            ("OR", Gender::Male, 1994, "Paul", 80),
        ])
    }

    #[test]
    fn known_values_resolve_to_singletons() {
        let store = store();
        let filter = FilterResolver::new(&store).resolve(&Selectors {
            region: Some("WA".into()),
            year: Some(1994),
            gender: Some("F".into()),
        });
        let regions: [Region; 1] = ["WA".into()];
        assert_eq!(filter.regions(), &regions);
        assert_eq!(filter.years(), &[1994]);
        assert_eq!(filter.genders(), &[Gender::Female]);
    }

    #[test]
    fn unknown_values_widen_to_everything() {
        let store = store();
        let filter = FilterResolver::new(&store).resolve(&Selectors {
            region: Some("XX".into()),
            year: Some(1800),
            gender: Some("Q".into()),
        });
        assert_eq!(filter.regions(), store.regions());
        assert_eq!(filter.years(), store.years());
        assert_eq!(filter.genders(), store.genders());
        assert_eq!(filter, FilterResolver::new(&store).resolve(&Selectors::default()));
    }

    #[test]
    fn region_is_normalized() {
        let store = store();
        let resolver = FilterResolver::new(&store);
        let regions: [Region; 1] = ["OR".into()];
        assert_eq!(&*resolver.resolve_region(Some(" or ")), &regions);
    }

    #[test]
    fn gender_is_not_normalized() {
        let store = store();
        let resolver = FilterResolver::new(&store);
        assert_eq!(&*resolver.resolve_gender(Some("f")), store.genders());
    }

    #[test]
    fn matches_follows_resolved_sets() {
        let store = store();
        let filter = FilterResolver::new(&store).resolve(&Selectors {
            region: Some("WA".into()),
            ..Selectors::default()
        });
        let names = store
            .filter(&filter)
            .map(|observation| &*observation.name)
            .collect::<Vec<_>>();
        assert_eq!(names, ["John", "Mary"]);
        assert_eq!(store.filter(&filter.for_year(1994)).count(), 0);
    }

    #[test]
    fn boundary_years_fall_back_to_extremes() {
        let store = store();
        let resolver = FilterResolver::new(&store);
        assert_eq!(resolver.boundary_years(None, None), Some((1993, 1994)));
        assert_eq!(resolver.boundary_years(Some(1994), Some(1993)), Some((1994, 1993)));
        assert_eq!(resolver.boundary_years(Some(1700), Some(2100)), Some((1993, 1994)));
        let empty = RecordStore::default();
        assert_eq!(FilterResolver::new(&empty).boundary_years(None, None), None);
    }

    #[test]
    fn dimension_values_follow_filter() {
        let store = store();
        let filter = FilterResolver::new(&store).resolve(&Selectors {
            year: Some(1993),
            ..Selectors::default()
        });
        assert_eq!(
            Dimension::Region.values(&store, &filter),
            [KeyValue::Region("OR"), KeyValue::Region("WA")]
        );
        assert_eq!(Dimension::Year.values(&store, &filter), [KeyValue::Year(1993)]);
    }
}
