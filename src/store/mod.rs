//! In-memory collection of birth records
//!
//! - Rows are validated once, when the store is built, and never modified
//!   afterwards, so any number of queries can share a store.
//! - The sorted sets of regions, years and genders found in the data are
//!   computed once at load time, as filter resolution needs them constantly.

pub mod builder;
pub mod snapshot;

use crate::{filter::Filter, Count, Gender, Name, Region, Year};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};
use thiserror::Error;

/// Row from a data file, before validation
///
/// Every field is optional so that incomplete rows make it to validation,
/// where they are reported with a precise cause.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct RawObservation {
    pub region: Option<Box<str>>,
    pub gender: Option<Box<str>>,
    pub year: Option<Year>,
    pub name: Option<Name>,
    pub count: Option<i64>,
}

/// Number of births of a given gender, given a name, in a region and year
///
/// Several observations may share the same region, gender, year and name, in
/// which case their counts add up.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Observation {
    /// Two-letter region code, in upper case
    pub region: Region,

    /// Gender recorded at birth
    pub gender: Gender,

    /// Year of birth
    pub year: Year,

    /// Name given at birth
    pub name: Name,

    /// Number of births
    pub count: Count,
}
//
impl Observation {
    /// Check the invariants that the type system does not enforce
    fn validate(&self) -> Result<(), InvalidRecordCause> {
        if self.region.is_empty() {
            return Err(InvalidRecordCause::EmptyField(Field::Region));
        }
        if self.name.is_empty() {
            return Err(InvalidRecordCause::EmptyField(Field::Name));
        }
        Ok(())
    }
}
//
impl TryFrom<RawObservation> for Observation {
    type Error = InvalidRecordCause;

    fn try_from(raw: RawObservation) -> Result<Self, Self::Error> {
        fn required<T>(value: Option<T>, field: Field) -> Result<T, InvalidRecordCause> {
            value.ok_or(InvalidRecordCause::MissingField(field))
        }
        let RawObservation {
            region,
            gender,
            year,
            name,
            count,
        } = raw;

        let region = required(region, Field::Region)?;
        let gender = required(gender, Field::Gender)?;
        let gender = Gender::from_code(gender.trim())
            .ok_or_else(|| InvalidRecordCause::UnknownGender(gender.clone()))?;
        let year = required(year, Field::Year)?;
        let name = required(name, Field::Name)?;
        let count = required(count, Field::Count)?;
        let count = Count::try_from(count).map_err(|_| InvalidRecordCause::NegativeCount(count))?;

        let observation = Self {
            region: region.trim().to_ascii_uppercase().into(),
            gender,
            year,
            name: name.trim().into(),
            count,
        };
        observation.validate()?;
        Ok(observation)
    }
}

/// Observation field, as named in error messages
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Field {
    Region,
    Gender,
    Year,
    Name,
    Count,
}
//
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Region => "region",
            Self::Gender => "gender",
            Self::Year => "year",
            Self::Name => "name",
            Self::Count => "count",
        })
    }
}

/// Malformed observation, which aborts store construction
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid record #{index}: {cause}")]
pub struct InvalidRecordError {
    /// Position of the offending row in the input
    pub index: usize,

    /// What is wrong with it
    pub cause: InvalidRecordCause,
}

/// Reasons why an observation can be rejected
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum InvalidRecordCause {
    #[error("missing {0} field")]
    MissingField(Field),

    #[error("empty {0} field")]
    EmptyField(Field),

    #[error("negative count {0}")]
    NegativeCount(i64),

    #[error("unknown gender {0:?}")]
    UnknownGender(Box<str>),
}

/// Immutable snapshot of every observation, plus the sorted sets of values
/// taken by the filterable dimensions
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordStore {
    /// Observations, in load order
    observations: Box<[Observation]>,

    /// Distinct regions, sorted in ascending order
    regions: Box<[Region]>,

    /// Distinct years, sorted in ascending order
    years: Box<[Year]>,

    /// Distinct genders, sorted in ascending order
    genders: Box<[Gender]>,
}
//
impl RecordStore {
    /// Validate raw rows from the data files and build a store from them
    ///
    /// Fails on the first malformed row, in input order.
    pub fn load(raw: Vec<RawObservation>) -> Result<Self, InvalidRecordError> {
        let observations = (raw.into_par_iter().enumerate())
            .map(|(index, raw)| {
                Observation::try_from(raw).map_err(|cause| InvalidRecordError { index, cause })
            })
            .collect::<Vec<_>>();
        let observations = observations.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_valid(observations))
    }

    /// Build a store from typed observations, e.g. from a snapshot
    pub fn new(observations: Vec<Observation>) -> Result<Self, InvalidRecordError> {
        let first_invalid = (observations.par_iter().enumerate())
            .filter_map(|(index, observation)| {
                observation
                    .validate()
                    .err()
                    .map(|cause| InvalidRecordError { index, cause })
            })
            .min_by_key(|error| error.index);
        if let Some(error) = first_invalid {
            return Err(error);
        }
        Ok(Self::from_valid(observations))
    }

    /// Build a store from observations that are known to be valid
    fn from_valid(observations: Vec<Observation>) -> Self {
        let regions = (observations.par_iter())
            .map(|observation| &*observation.region)
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(Region::from)
            .collect::<Box<[_]>>();
        let years = (observations.par_iter())
            .map(|observation| observation.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Box<[_]>>();
        let genders = (observations.par_iter())
            .map(|observation| observation.gender)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Box<[_]>>();
        log::debug!(
            "Loaded {} observations covering {} regions, {} years and {} genders",
            observations.len(),
            regions.len(),
            years.len(),
            genders.len()
        );
        Self {
            observations: observations.into(),
            regions,
            years,
            genders,
        }
    }

    /// Every observation, in load order
    pub fn observations(&self) -> &[Observation] {
        &self.observations[..]
    }

    /// Distinct regions, in ascending order
    pub fn regions(&self) -> &[Region] {
        &self.regions[..]
    }

    /// Distinct years, in ascending order
    pub fn years(&self) -> &[Year] {
        &self.years[..]
    }

    /// Distinct genders, in ascending order
    pub fn genders(&self) -> &[Gender] {
        &self.genders[..]
    }

    /// Earliest year of the dataset, if it's not empty
    pub fn min_year(&self) -> Option<Year> {
        self.years.first().copied()
    }

    /// Latest year of the dataset, if it's not empty
    pub fn max_year(&self) -> Option<Year> {
        self.years.last().copied()
    }

    /// Iterate over the observations that match a filter, in load order
    pub fn filter<'store: 'f, 'f>(
        &'store self,
        filter: &'f Filter,
    ) -> impl Iterator<Item = &'store Observation> + 'f {
        (self.observations.iter()).filter(move |observation| filter.matches(observation))
    }

    /// Parallel version of [`filter()`](Self::filter), which does not
    /// preserve load order
    pub fn par_filter<'store: 'f, 'f>(
        &'store self,
        filter: &'f Filter,
    ) -> impl ParallelIterator<Item = &'store Observation> + 'f {
        (self.observations.par_iter()).filter(move |observation| filter.matches(observation))
    }
}
