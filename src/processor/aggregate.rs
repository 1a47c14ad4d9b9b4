use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Running statistics for one key.
///
/// Values are scaled integers: a reading of `12.3` is stored as `123`, so
/// `sum` is exact no matter how many observations are folded in. `sum` is
/// widened to `i128` so it cannot overflow for any `i64` reading. The mean is
/// never stored; see [`Aggregate::mean_tenths`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    pub min: i64,
    pub max: i64,
    pub sum: i128,
    pub count: u64,
}

impl Aggregate {
    /// First observation of a key.
    pub fn new(value: i64) -> Self {
        Aggregate {
            min: value,
            max: value,
            sum: value as i128,
            count: 1,
        }
    }

    /// Folds one more observation in place.
    #[inline]
    pub fn observe(&mut self, value: i64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.sum += value as i128;
        self.count += 1;
    }

    /// Combine rule. Associative and commutative.
    #[inline]
    pub fn combine(self, other: Aggregate) -> Aggregate {
        Aggregate {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }

    /// Mean in tenths, rounded half away from zero.
    pub fn mean_tenths(&self) -> i64 {
        let count = self.count as i128;
        let rounded = (2 * self.sum.abs() + count) / (2 * count);
        if self.sum < 0 {
            -(rounded as i64)
        } else {
            rounded as i64
        }
    }
}

/// Key to aggregate. Keys borrow from the input buffer, so a map lives no
/// longer than the byte source it was scanned from.
pub type AggregateMap<'a> = FxHashMap<&'a [u8], Aggregate>;

/// Upsert: inserts a fresh aggregate or folds `value` into the existing one.
#[inline]
pub fn upsert<'a>(map: &mut AggregateMap<'a>, key: &'a [u8], value: i64) {
    match map.entry(key) {
        Entry::Occupied(entry) => entry.into_mut().observe(value),
        Entry::Vacant(entry) => {
            entry.insert(Aggregate::new(value));
        }
    }
}

/// Merges two maps, folding the smaller into the larger.
pub fn merge_pair<'a>(a: AggregateMap<'a>, b: AggregateMap<'a>) -> AggregateMap<'a> {
    let (mut into, from) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    for (key, agg) in from {
        match into.entry(key) {
            Entry::Occupied(entry) => {
                let merged = entry.get().combine(agg);
                *entry.into_mut() = merged;
            }
            Entry::Vacant(entry) => {
                entry.insert(agg);
            }
        }
    }

    into
}

/// Sequential fold over all local maps.
pub fn merge<'a, I>(maps: I) -> AggregateMap<'a>
where
    I: IntoIterator<Item = AggregateMap<'a>>,
{
    maps.into_iter().fold(AggregateMap::default(), merge_pair)
}

/// Parallel reduction tree over all local maps.
pub fn merge_tree(maps: Vec<AggregateMap<'_>>) -> AggregateMap<'_> {
    maps.into_par_iter().reduce(AggregateMap::default, merge_pair)
}
