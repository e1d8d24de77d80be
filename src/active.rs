use geo::GeoFloat;
use log::warn;
use std::{cmp::Ordering, collections::BTreeSet, ops::Bound};

use crate::{line_or_point::LineOrPoint, Tolerance};

/// Internal representation used in ordered sets.
///
/// Carries a copy of the segment geometry it was inserted with, so the
/// ordering of an entry never changes while it is in the set. Segments
/// whose geometry changes are removed and re-inserted.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Active<T: GeoFloat> {
    key: usize,
    geom: LineOrPoint<T>,
    tolerance: Tolerance<T>,
}

impl<T: GeoFloat> Active<T> {
    #[inline]
    pub(crate) fn new(key: usize, geom: LineOrPoint<T>, tolerance: Tolerance<T>) -> Self {
        Active { key, geom, tolerance }
    }
}

/// Partial equality based on key.
///
/// This is consistent with the `Ord` impl.
impl<T: GeoFloat> PartialEq for Active<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

/// Assert total equality.
impl<T: GeoFloat> Eq for Active<T> {}

impl<T: GeoFloat> PartialOrd for Active<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordering defined as per algorithm (within the entry's tolerance), with
/// the key as tie-break.
///
/// Requires the same pre-conditions as for [`LineOrPoint`]. Entries that
/// violate them (which only happens on numerically inconsistent input)
/// fall back to the order of their left end-points instead of panicking.
impl<T: GeoFloat> Ord for Active<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.key == other.key {
            return Ordering::Equal;
        }
        self.geom
            .cmp_within(&other.geom, &self.tolerance)
            .unwrap_or_else(|| self.geom.first().cmp(&other.geom.first()))
            .then_with(|| self.key.cmp(&other.key))
    }
}

/// Helper trait to insert, remove and get adjacent segments from ordered set.
pub(crate) trait Access {
    type Scalar: GeoFloat;
    fn prev_key(&self, key: usize, geom: LineOrPoint<Self::Scalar>) -> Option<usize>;
    fn next_key(&self, key: usize, geom: LineOrPoint<Self::Scalar>) -> Option<usize>;
    fn add_key(&mut self, key: usize, geom: LineOrPoint<Self::Scalar>);
    fn remove_key(&mut self, key: usize, geom: LineOrPoint<Self::Scalar>);
}

/// The active segments of a sweep, ordered with one tolerance.
#[derive(Debug, Clone)]
pub(crate) struct ActiveSet<T: GeoFloat> {
    entries: BTreeSet<Active<T>>,
    tolerance: Tolerance<T>,
}

impl<T: GeoFloat> ActiveSet<T> {
    pub(crate) fn new(tolerance: Tolerance<T>) -> Self {
        ActiveSet {
            entries: BTreeSet::new(),
            tolerance,
        }
    }

    #[inline]
    fn entry(&self, key: usize, geom: LineOrPoint<T>) -> Active<T> {
        Active::new(key, geom, self.tolerance)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T: GeoFloat> Access for ActiveSet<T> {
    type Scalar = T;

    #[inline]
    fn prev_key(&self, key: usize, geom: LineOrPoint<T>) -> Option<usize> {
        let aseg = self.entry(key, geom);
        self.entries
            .range((Bound::Unbounded, Bound::Excluded(aseg)))
            .next_back()
            .map(|s| s.key)
    }

    #[inline]
    fn next_key(&self, key: usize, geom: LineOrPoint<T>) -> Option<usize> {
        let aseg = self.entry(key, geom);
        self.entries
            .range((Bound::Excluded(aseg), Bound::Unbounded))
            .next()
            .map(|s| s.key)
    }

    #[inline]
    fn add_key(&mut self, key: usize, geom: LineOrPoint<T>) {
        let inserted = self.entries.insert(self.entry(key, geom));
        debug_assert!(inserted, "segment {} was already active", key);
    }

    fn remove_key(&mut self, key: usize, geom: LineOrPoint<T>) {
        let aseg = self.entry(key, geom);
        if !self.entries.remove(&aseg) {
            // The set could not locate the entry by ordering; this only
            // happens when rounding made the ordering inconsistent.
            warn!("active segment {key} not found by ordering; removing by key");
            self.entries.retain(|a| a.key != key);
        }
    }
}
