//! Ranking utilities shared by the analytical queries

use crate::Count;
use serde::Serialize;
use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, VecDeque},
};

/// Entry of a ranking
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct RankedEntry<K> {
    /// 1-based position in the ranking
    pub rank: usize,

    /// What is being ranked
    pub key: K,

    /// Summed count that the ranking is based on
    pub count: Count,
}

/// Pick the `k` items with the largest counts, by decreasing count
///
/// Items with equal counts keep the order in which they were provided.
pub fn top_k<K>(items: impl IntoIterator<Item = (K, Count)>, k: usize) -> Vec<RankedEntry<K>> {
    // Find the top items using a min-heap, whose root is the worst candidate
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (position, (key, count)) in items.into_iter().enumerate() {
        heap.push(Reverse(Candidate {
            count,
            position,
            key,
        }));
        if heap.len() > k {
            heap.pop();
        }
    }

    // Collect the results in order of decreasing count. This requires an
    // order reversal since we used a min-heap.
    let mut result = VecDeque::with_capacity(heap.len());
    while let Some(Reverse(candidate)) = heap.pop() {
        result.push_front(candidate);
    }
    (result.into_iter().enumerate())
        .map(|(idx, candidate)| RankedEntry {
            rank: idx + 1,
            key: candidate.key,
            count: candidate.count,
        })
        .collect()
}

/// Candidate for a top-k ranking
///
/// Candidates compare by count, then by reverse input position, so that the
/// "greatest" candidate is the one that should be ranked first.
#[derive(Debug)]
struct Candidate<K> {
    count: Count,
    position: usize,
    key: K,
}
//
impl<K> Ord for Candidate<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.count.cmp(&other.count)).then_with(|| other.position.cmp(&self.position))
    }
}
//
impl<K> PartialOrd for Candidate<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
//
impl<K> PartialEq for Candidate<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
//
impl<K> Eq for Candidate<K> {}

/// Stable sort by decreasing value of a floating-point key
pub fn sort_descending_by<T>(items: &mut [T], key: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| key(b).total_cmp(&key(a)));
}

/// Stable sort by increasing value of a floating-point key
pub fn sort_ascending_by<T>(items: &mut [T], key: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| key(a).total_cmp(&key(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys<K: Clone>(ranking: &[RankedEntry<K>]) -> Vec<K> {
        ranking.iter().map(|entry| entry.key.clone()).collect()
    }

    #[test]
    fn top_k_sorts_by_decreasing_count() {
        let ranking = top_k([("a", 1), ("b", 5), ("c", 3), ("d", 4)], 3);
        assert_eq!(
            ranking,
            [
                RankedEntry { rank: 1, key: "b", count: 5 },
                RankedEntry { rank: 2, key: "d", count: 4 },
                RankedEntry { rank: 3, key: "c", count: 3 },
            ]
        );
    }

    #[test]
    fn top_k_keeps_input_order_on_ties() {
        let items = [("a", 2), ("b", 7), ("c", 2), ("d", 7), ("e", 2), ("f", 1)];
        assert_eq!(keys(&top_k(items, 6)), ["b", "d", "a", "c", "e", "f"]);
        assert_eq!(keys(&top_k(items, 3)), ["b", "d", "a"]);
        assert_eq!(keys(&top_k(items, 4)), ["b", "d", "a", "c"]);
    }

    #[test]
    fn top_k_handles_short_inputs() {
        assert_eq!(keys(&top_k([("a", 2)], 10)), ["a"]);
        assert!(top_k([("a", 2)], 0).is_empty());
        assert!(top_k(Vec::<(&str, Count)>::new(), 3).is_empty());
    }

    #[test]
    fn float_sorts_are_stable() {
        let mut items = [("a", 1.0), ("b", -2.0), ("c", 1.0), ("d", 3.5)];
        sort_descending_by(&mut items, |item| item.1);
        assert_eq!(items.map(|item| item.0), ["d", "a", "c", "b"]);
        sort_ascending_by(&mut items, |item| item.1);
        assert_eq!(items.map(|item| item.0), ["b", "a", "c", "d"]);
    }
}
