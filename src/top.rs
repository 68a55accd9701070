//! Most popular names under a filter

use crate::{
    aggregate::{self, GroupField, GroupKey, KeyValue},
    filter::{Dimension, Filter},
    rank::{self, RankedEntry},
    store::RecordStore,
    Count, Gender,
};
use serde::Serialize;
use std::{
    collections::{hash_map, HashMap},
    iter,
};

/// Most popular names of each gender
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct GenderTop<'store> {
    pub female: Vec<RankedEntry<&'store str>>,
    pub male: Vec<RankedEntry<&'store str>>,
}

/// Pick the `k` most popular names of each gender
///
/// Names with equal counts are ranked in order of first appearance.
pub fn top_k_by_gender<'store>(
    store: &'store RecordStore,
    filter: &Filter,
    k: usize,
) -> GenderTop<'store> {
    let sums = aggregate::group_sum(store, filter, &[GroupField::Name, GroupField::Gender]);
    let names_of = |wanted: Gender| {
        sums.iter().filter_map(move |(key, count)| match key {
            [KeyValue::Name(name), KeyValue::Gender(gender)] if *gender == wanted => {
                Some((*name, count))
            }
            _ => None,
        })
    };
    GenderTop {
        female: rank::top_k(names_of(Gender::Female), k),
        male: rank::top_k(names_of(Gender::Male), k),
    }
}

/// Ranking of one group from [`top_k_per_group()`]
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroupTop<'store> {
    /// Value of the grouping dimension
    pub group: KeyValue<'store>,

    /// Exactly `k` ranking slots, `None` past the last matching entry
    pub slots: Vec<Option<RankedEntry<GroupKey<'store>>>>,
}

/// Rankings of every group from [`top_k_per_group()`]
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PerGroupTop<'store> {
    /// Fields that ranked keys are made of, in order
    pub fields: Vec<GroupField>,

    /// One ranking per group, in ascending group order
    pub groups: Vec<GroupTop<'store>>,
}

/// Pick the `k` most popular (name, `secondary`, year) entries within each
/// value of a dimension
///
/// Every value of the dimension that passes the filter gets a ranking, even
/// if fewer than `k` entries (or none at all) match it: missing slots are
/// filled with `None`.
pub fn top_k_per_group<'store>(
    store: &'store RecordStore,
    filter: &Filter,
    group: Dimension,
    k: usize,
    secondary: Option<GroupField>,
) -> PerGroupTop<'store> {
    // Group by dimension first, then by ranked fields
    let group_field = GroupField::from(group);
    let mut key_fields = vec![group_field];
    for field in iter::once(GroupField::Name)
        .chain(secondary)
        .chain(iter::once(GroupField::Year))
    {
        if !key_fields.contains(&field) {
            key_fields.push(field);
        }
    }
    let sums = aggregate::group_sum(store, filter, &key_fields);

    // Split the sums by group, preserving first-seen order within each group
    let mut per_group = HashMap::<KeyValue<'store>, Vec<(GroupKey<'store>, Count)>>::new();
    for (key, count) in sums.into_entries() {
        let Some((&group_value, ranked_key)) = key.split_first() else {
            continue;
        };
        let ranked = (ranked_key.into(), count);
        match per_group.entry(group_value) {
            hash_map::Entry::Occupied(o) => o.into_mut().push(ranked),
            hash_map::Entry::Vacant(v) => {
                v.insert(vec![ranked]);
            }
        }
    }

    // Rank each group of the dimension, filling in missing slots
    let groups = (group.values(store, filter).into_iter())
        .map(|group_value| {
            let entries = per_group.remove(&group_value).unwrap_or_default();
            let ranking = rank::top_k(entries, k);
            if ranking.len() < k {
                log::debug!(
                    "Only {} of {k} ranking slots could be filled for {group_field:?} {group_value}",
                    ranking.len()
                );
            }
            GroupTop {
                group: group_value,
                slots: (ranking.into_iter().map(Some))
                    .chain(iter::repeat(None))
                    .take(k)
                    .collect(),
            }
        })
        .collect();
    PerGroupTop {
        fields: key_fields[1..].to_vec(),
        groups,
    }
}
