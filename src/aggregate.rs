//! Grouped sums of birth counts

use crate::{
    filter::Filter,
    store::{Observation, RecordStore},
    Count, Gender, Year,
};
use rayon::prelude::*;
use serde::Serialize;
use std::{
    collections::{hash_map, HashMap},
    fmt,
};

/// Observation field that sums can be grouped by
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GroupField {
    Region,
    Gender,
    Year,
    Name,
}
//
impl GroupField {
    /// Value taken by this field in an observation
    pub fn value_of(self, observation: &Observation) -> KeyValue<'_> {
        match self {
            Self::Region => KeyValue::Region(&observation.region),
            Self::Gender => KeyValue::Gender(observation.gender),
            Self::Year => KeyValue::Year(observation.year),
            Self::Name => KeyValue::Name(&observation.name),
        }
    }
}

/// Value of a [`GroupField`], borrowed from the store
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(untagged)]
pub enum KeyValue<'store> {
    Region(&'store str),
    Gender(Gender),
    Year(Year),
    Name(&'store str),
}
//
impl<'store> KeyValue<'store> {
    /// Name held by this value, if it is a name
    pub fn as_name(self) -> Option<&'store str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }
}
//
impl fmt::Display for KeyValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Region(region) => f.write_str(region),
            Self::Gender(gender) => write!(f, "{gender}"),
            Self::Year(year) => write!(f, "{year}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Tuple of field values, in the order in which fields were requested
pub type GroupKey<'store> = Box<[KeyValue<'store>]>;

/// Summed counts per group, in order of first appearance in the store
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GroupSums<'store> {
    /// Position of each group in "sums"
    index: HashMap<GroupKey<'store>, usize>,

    /// Groups and their summed counts
    sums: Vec<(GroupKey<'store>, Count)>,
}
//
impl<'store> GroupSums<'store> {
    /// Add an observation's count to a group, creating it if needed
    fn add(&mut self, key: GroupKey<'store>, count: Count) {
        match self.index.entry(key) {
            hash_map::Entry::Occupied(o) => self.sums[*o.get()].1 += count,
            hash_map::Entry::Vacant(v) => {
                self.sums.push((v.key().clone(), count));
                v.insert(self.sums.len() - 1);
            }
        }
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.sums.len()
    }

    /// Truth that no observation was grouped
    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Summed count of a group, if it exists
    pub fn get(&self, key: &[KeyValue<'store>]) -> Option<Count> {
        self.index.get(key).map(|&idx| self.sums[idx].1)
    }

    /// Sum over every group
    pub fn total(&self) -> Count {
        self.sums.iter().map(|(_key, count)| count).sum()
    }

    /// Iterate over groups, in order of first appearance
    pub fn iter(&self) -> impl Iterator<Item = (&[KeyValue<'store>], Count)> + '_ {
        (self.sums.iter()).map(|(key, count)| (&key[..], *count))
    }

    /// Extract groups, in order of first appearance
    pub fn into_entries(self) -> Vec<(GroupKey<'store>, Count)> {
        self.sums
    }
}

/// Total count of the observations that match a filter
pub fn count(store: &RecordStore, filter: &Filter) -> Count {
    store
        .par_filter(filter)
        .map(|observation| observation.count)
        .sum()
}

/// Sum the counts of the observations that match a filter, grouped by the
/// values of some fields
///
/// With no field, everything goes in a single group whose key is empty, so
/// the sum over groups always equals [`count()`].
pub fn group_sum<'store>(
    store: &'store RecordStore,
    filter: &Filter,
    fields: &[GroupField],
) -> GroupSums<'store> {
    let mut sums = GroupSums::default();
    for observation in store.filter(filter) {
        let key = (fields.iter())
            .map(|field| field.value_of(observation))
            .collect::<GroupKey<'store>>();
        sums.add(key, observation.count);
    }
    log::debug!(
        "Grouped observations by {fields:?} into {} groups",
        sums.len()
    );
    sums
}
