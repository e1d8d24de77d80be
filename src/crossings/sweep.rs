use geo::GeoFloat;
use smallvec::SmallVec;
use std::collections::BinaryHeap;

use crate::{
    active::{Access, ActiveSet},
    events::{Event, EventType, SweepPoint},
    line_or_point::LineOrPoint::{self, *},
    Crossable, Crossing, Error, Result, Tolerance,
};

use log::{debug, trace};
use slab::Slab;

/// A piece of an input [`Crossable`] generated during the sweep.
#[derive(Debug, Clone)]
struct Segment<C: Crossable> {
    geom: LineOrPoint<C::Scalar>,
    key: usize,
    crossable: C,
    first_segment: bool,
    is_active: bool,
    is_done: bool,
}

impl<C: Crossable> Segment<C> {
    /// Create and store a `Segment` with given `crossable`, and optional `geom`
    /// (or the default geom).
    fn new(storage: &mut Slab<Self>, crossable: C, geom: Option<LineOrPoint<C::Scalar>>) -> &mut Self {
        let first = geom.is_none();
        let geom = geom.unwrap_or_else(|| crossable.line().into());
        let entry = storage.vacant_entry();

        let segment = Segment {
            key: entry.key(),
            crossable,
            geom,
            first_segment: first,
            is_active: false,
            is_done: false,
        };
        entry.insert(segment)
    }

    fn left_event(&self) -> Event<C::Scalar> {
        Event {
            point: self.geom.first(),
            ty: EventType::LineLeft,
            segment_key: self.key,
        }
    }

    fn right_event(&self) -> Event<C::Scalar> {
        Event {
            point: self.geom.last(),
            ty: EventType::LineRight,
            segment_key: self.key,
        }
    }

    /// Split a line segment into pieces at points of intersection.
    ///
    /// `self` is shrunk to the left-most piece; the remaining pieces
    /// are returned. Cut points at (or outside) the end points are
    /// ignored, as are cuts behind the `sweep` point. A cut lying within
    /// tolerance of the interior but outside the ordered range of the
    /// segment (which happens for near-vertical segments) is moved onto
    /// the segment first.
    fn adjust_for_intersection(
        &mut self,
        intersection: LineOrPoint<C::Scalar>,
        tolerance: &Tolerance<C::Scalar>,
        sweep: SweepPoint<C::Scalar>,
    ) -> SplitSegments<C::Scalar> {
        use SplitSegments::*;

        let (p, q) = match self.geom {
            Point(_) => return Unchanged,
            Line(p, q) => (p, q),
        };
        let cut = |r: SweepPoint<C::Scalar>| -> Option<SweepPoint<C::Scalar>> {
            let r = if p < r && r < q {
                r
            } else {
                project_inside(p, q, r, tolerance)?
            };
            (r >= sweep).then(|| r)
        };
        let mut cuts: SmallVec<[SweepPoint<C::Scalar>; 2]> = match intersection {
            Point(r) => cut(r).into_iter().collect(),
            Line(r1, r2) => [r1, r2].iter().filter_map(|r| cut(*r)).collect(),
        };
        cuts.sort();
        cuts.dedup();

        match cuts[..] {
            [] => Unchanged,
            [r] => {
                self.geom = Line(p, r);
                SplitOnce { right: Line(r, q) }
            }
            [r1, r2, ..] => {
                self.geom = Line(p, r1);
                SplitTwice {
                    middle: Line(r1, r2),
                    right: Line(r2, q),
                }
            }
        }
    }
}

impl<C: Crossable + Clone> Segment<C> {
    /// Convert `self` into a `Crossing` to return to user.
    fn to_crossing(&self, at_left: bool) -> Crossing<C> {
        Crossing {
            crossable: self.crossable.clone(),
            line: self.geom.line(),
            first_segment: self.first_segment,
            at_left,
        }
    }
}

/// Sweep algorithm for detecting all crossings.
///
/// This is an internal data-structure that implements the
/// [Bentley-Ottman] sweep. Maintains a heap of end-points, and the
/// currently active segments. End-users should use one of the iterator
/// interfaces built around this sweep.
///
/// Crossing segments are never active together: as soon as two
/// neighbours are found to intersect, both are cut at the intersection
/// so their left pieces end there and the right pieces start there.
/// Other active segments passing within tolerance of a cut point are cut
/// there as well.
/// Storage keys are never re-used within a sweep, so an event whose
/// segment changed since it was pushed is recognised by its geometry.
///
/// [Bentley-Ottman]: //en.wikipedia.org/wiki/Bentley%E2%80%93Ottmann_algorithm
pub(crate) struct Sweep<C>
where
    C: Crossable + Clone,
{
    segments: Slab<Segment<C>>,
    events: BinaryHeap<Event<C::Scalar>>,
    active_segments: ActiveSet<C::Scalar>,
    tolerance: Tolerance<C::Scalar>,
    max_events: Option<usize>,
    processed: usize,
}

impl<C: Crossable + Clone> Sweep<C> {
    pub(crate) fn new<I: IntoIterator<Item = C>>(
        iter: I,
        tolerance: Tolerance<C::Scalar>,
        max_events: Option<usize>,
    ) -> Self {
        let iter = iter.into_iter();
        let size = {
            let (min_size, max_size) = iter.size_hint();
            max_size.unwrap_or(min_size)
        };

        let mut sweep = Sweep {
            segments: Slab::with_capacity(size),
            events: BinaryHeap::with_capacity(2 * size),
            active_segments: ActiveSet::new(tolerance),
            tolerance,
            max_events,
            processed: 0,
        };
        for cr in iter {
            sweep.create_segment(cr, None);
        }

        sweep
    }

    /// Create a segment, and add its events into the heap.
    ///
    /// Zero-length segments are dropped.
    fn create_segment(&mut self, crossable: C, geom: Option<LineOrPoint<C::Scalar>>) {
        let segment = Segment::new(&mut self.segments, crossable, geom);
        if !segment.geom.is_line() {
            trace!("ignoring zero-length segment: {:?}", segment.geom);
            segment.is_done = true;
            return;
        }
        let events = [segment.left_event(), segment.right_event()];
        self.events.extend(events);
    }

    /// Adjust the segment at `key` for a detected intersection, storing
    /// the extra pieces and re-positioning it in the active set if its
    /// geometry changed.
    ///
    /// Returns `true` if the segment was split.
    fn adjust_one_segment(
        &mut self,
        key: usize,
        intersection: LineOrPoint<C::Scalar>,
        sweep: SweepPoint<C::Scalar>,
    ) -> bool {
        let tolerance = self.tolerance;
        let segment = &mut self.segments[key];
        let old_geom = segment.geom;
        let split = segment.adjust_for_intersection(intersection, &tolerance, sweep);
        if let SplitSegments::Unchanged = split {
            return false;
        }
        debug!("split {:?} at {:?}: {:?}", old_geom, intersection, split);

        let new_geom = segment.geom;
        let is_active = segment.is_active;
        let crossable = segment.crossable.clone();
        self.events.push(segment.right_event());
        if is_active {
            self.active_segments.remove_key(key, old_geom);
            self.active_segments.add_key(key, new_geom);
        }

        match split {
            SplitSegments::Unchanged => {}
            SplitSegments::SplitOnce { right } => {
                self.create_segment(crossable, Some(right));
            }
            SplitSegments::SplitTwice { middle, right } => {
                self.create_segment(crossable.clone(), Some(middle));
                self.create_segment(crossable, Some(right));
            }
        }
        true
    }

    /// Split the active segments next to `from` that pass within
    /// tolerance of `point`, walking outwards in the active order until a
    /// segment misses it.
    ///
    /// Returns the keys of the segments that were split.
    fn split_nearby(
        &mut self,
        from: usize,
        point: SweepPoint<C::Scalar>,
        sweep: SweepPoint<C::Scalar>,
    ) -> SmallVec<[usize; 4]> {
        let mut visited: SmallVec<[usize; 4]> = SmallVec::new();
        let mut split = SmallVec::new();
        for forward in [false, true] {
            let mut current = from;
            loop {
                let geom = self.segments[current].geom;
                let adj_key = if forward {
                    self.active_segments.next_key(current, geom)
                } else {
                    self.active_segments.prev_key(current, geom)
                };
                let adj_key = match adj_key {
                    Some(k) if k != from && !visited.contains(&k) => k,
                    _ => break,
                };
                let adj_geom = self.segments[adj_key].geom;
                if !self
                    .tolerance
                    .on_segment(point.coord(), adj_geom.first().coord(), adj_geom.last().coord())
                {
                    break;
                }
                visited.push(adj_key);
                if self.adjust_one_segment(adj_key, Point(point), sweep) {
                    trace!("split passing segment {:?} at {:?}", adj_geom, point);
                    split.push(adj_key);
                }
                current = adj_key;
            }
        }
        split
    }

    /// Check event is valid, and return the segment associated with it.
    ///
    /// If a segment was adjusted, we may have spurious events for the
    /// right end point which are no longer valid. Returns `None` in
    /// this case.
    fn segment_for_event(&self, event: &Event<C::Scalar>) -> Option<&Segment<C>> {
        let segment = self.segments.get(event.segment_key)?;
        if segment.is_done {
            return None;
        }
        let valid = match event.ty {
            EventType::LineLeft => !segment.is_active && segment.geom.first() == event.point,
            EventType::LineRight => segment.is_active && segment.geom.last() == event.point,
        };
        valid.then(|| segment)
    }

    fn neighbours(&self, key: usize) -> (Option<usize>, Option<usize>) {
        let geom = self.segments[key].geom;
        (
            self.active_segments.prev_key(key, geom),
            self.active_segments.next_key(key, geom),
        )
    }

    /// Remove an active segment whose right end has been reached.
    fn retire<F: FnMut(Crossing<C>)>(&mut self, key: usize, cb: &mut F) {
        let segment = &mut self.segments[key];
        segment.is_active = false;
        segment.is_done = true;
        let geom = segment.geom;
        let crossing = segment.to_crossing(false);
        self.active_segments.remove_key(key, geom);
        cb(crossing);
    }

    /// Handle one event.
    ///
    /// Returns `true` if the event was not spurious.
    fn handle_event<F: FnMut(Crossing<C>)>(&mut self, event: Event<C::Scalar>, cb: &mut F) -> bool {
        if self.segment_for_event(&event).is_none() {
            trace!("skipping spurious event: {:?}", event);
            return false;
        }
        trace!("handling event: {:?}", event);
        let key = event.segment_key;

        match event.ty {
            EventType::LineLeft => {
                // Neighbours that get cut at this point end here; retire
                // them and look at the new neighbours.
                loop {
                    let (prev, next) = self.neighbours(key);
                    let mut retired = false;
                    for adj_key in prev.into_iter().chain(next) {
                        if !self.segments[adj_key].is_active {
                            continue;
                        }
                        let geom = self.segments[key].geom;
                        let adj_geom = self.segments[adj_key].geom;
                        let isec = match geom
                            .intersect_line(&adj_geom, &self.tolerance)
                            .and_then(|isec| ahead_of(isec, event.point))
                        {
                            Some(isec) => isec,
                            None => continue,
                        };
                        debug!(
                            "found intersection:\n\tsegment1: {:?}\n\tsegment2: {:?}\n\tintersection: {:?}",
                            geom, adj_geom, isec
                        );
                        self.adjust_one_segment(adj_key, isec, event.point);
                        self.adjust_one_segment(key, isec, event.point);

                        let mut touched: SmallVec<[usize; 4]> = SmallVec::new();
                        touched.push(adj_key);
                        if let Point(r) = isec {
                            touched.extend(self.split_nearby(adj_key, r, event.point));
                        }
                        for k in touched {
                            let segment = &self.segments[k];
                            if segment.is_active && segment.geom.last() == event.point {
                                self.retire(k, cb);
                                retired = true;
                            }
                        }
                    }
                    if !retired {
                        break;
                    }
                }

                let segment = &mut self.segments[key];
                segment.is_active = true;
                let geom = segment.geom;
                let crossing = segment.to_crossing(true);
                self.active_segments.add_key(key, geom);
                cb(crossing);
            }
            EventType::LineRight => {
                let (prev, next) = self.neighbours(key);
                self.retire(key, cb);

                if let (Some(prev_key), Some(next_key)) = (prev, next) {
                    let prev_geom = self.segments[prev_key].geom;
                    let next_geom = self.segments[next_key].geom;
                    if let Some(isec) = prev_geom
                        .intersect_line(&next_geom, &self.tolerance)
                        .and_then(|isec| ahead_of(isec, event.point))
                    {
                        debug!(
                            "found intersection after removal:\n\tsegment1: {:?}\n\tsegment2: {:?}\n\tintersection: {:?}",
                            prev_geom, next_geom, isec
                        );
                        self.adjust_one_segment(prev_key, isec, event.point);
                        self.adjust_one_segment(next_key, isec, event.point);
                        if let Point(r) = isec {
                            self.split_nearby(prev_key, r, event.point);
                        }
                    }
                }
            }
        }
        true
    }

    /// Process the next event in heap.
    ///
    /// Calls the callback unless the event is spurious. Fails once more
    /// than `max_events` events have been taken off the heap.
    pub(crate) fn next_event<F: FnMut(Crossing<C>)>(
        &mut self,
        mut cb: F,
    ) -> Result<Option<SweepPoint<C::Scalar>>> {
        let event = match self.events.pop() {
            Some(event) => event,
            None => return Ok(None),
        };
        self.processed += 1;
        if let Some(limit) = self.max_events {
            if self.processed > limit {
                return Err(Error::EventLimitExceeded { limit });
            }
        }
        self.handle_event(event, &mut cb);
        Ok(Some(event.point))
    }

    /// Peek and return the next point in the sweep.
    #[inline]
    pub(crate) fn peek_point(&self) -> Option<SweepPoint<C::Scalar>> {
        self.events.peek().map(|e| e.point)
    }
}

/// Restrict an overlap to the part not yet passed by the sweep.
///
/// Rounding may place a touching point marginally behind the current
/// sweep point. Points are kept as they are: each segment checks its
/// own cut against the sweep.
fn ahead_of<T: GeoFloat>(isec: LineOrPoint<T>, point: SweepPoint<T>) -> Option<LineOrPoint<T>> {
    match isec {
        Point(_) => Some(isec),
        Line(lo, hi) => {
            if lo >= point {
                Some(isec)
            } else if hi > point {
                Some(Line(point, hi))
            } else if hi == point {
                Some(Point(point))
            } else {
                None
            }
        }
    }
}

/// Move `r` onto the interior of the segment `p`-`q`, if it lies within
/// tolerance of the segment and away from both of its ends.
fn project_inside<T: GeoFloat>(
    p: SweepPoint<T>,
    q: SweepPoint<T>,
    r: SweepPoint<T>,
    tolerance: &Tolerance<T>,
) -> Option<SweepPoint<T>> {
    let (a, b, c) = (p.coord(), q.coord(), r.coord());
    if tolerance.near_eq(c, a) || tolerance.near_eq(c, b) || !tolerance.on_segment(c, a, b) {
        return None;
    }
    let d = b - a;
    let w = c - a;
    let t = (w.x * d.x + w.y * d.y) / (d.x * d.x + d.y * d.y);
    let projected: SweepPoint<T> = (a + d * t).into();
    (p < projected && projected < q).then(|| projected)
}

/// Stores the type of split and extra geometries from adjusting a
/// segment for intersection.
#[derive(Debug)]
enum SplitSegments<T: GeoFloat> {
    Unchanged,
    SplitOnce {
        right: LineOrPoint<T>,
    },
    SplitTwice {
        middle: LineOrPoint<T>,
        right: LineOrPoint<T>,
    },
}

#[cfg(test)]
mod tests {
    use geo::Line;

    use super::*;

    impl<T: GeoFloat> PartialEq for SplitSegments<T> {
        fn eq(&self, other: &Self) -> bool {
            match (self, other) {
                (Self::Unchanged, Self::Unchanged) => true,
                (Self::SplitOnce { right: l_right }, Self::SplitOnce { right: r_right }) => {
                    l_right.coords_equal(r_right)
                }
                (
                    Self::SplitTwice {
                        middle: l_middle,
                        right: l_right,
                    },
                    Self::SplitTwice {
                        middle: r_middle,
                        right: r_right,
                    },
                ) => l_middle.coords_equal(r_middle) && l_right.coords_equal(r_right),
                _ => false,
            }
        }
    }

    #[test]
    fn test_split() {
        let mut slab = Slab::new();
        let lines = vec![
            Line::from([(0., 0.), (10., 10.)]),
            [(10.0, 0.), (0., 10.)].into(),
            [(0., 0.), (0., 10.)].into(),
            [(0., 0.), (5., 5.)].into(),
            [(10., 10.), (5., 5.)].into(),
            [(2., 2.), (7., 7.)].into(),
        ];
        lines.into_iter().enumerate().for_each(|(i, l)| {
            assert_eq!(Segment::new(&mut slab, l, None).key, i);
        });
        let tolerance = Tolerance::default();

        struct TestCase {
            a: usize,
            b: usize,
            isec: Option<LineOrPoint<f64>>,
            split: SplitSegments<f64>,
        }

        let check = |t: &TestCase| {
            let isec = slab[t.a].geom.intersect_line(&slab[t.b].geom, &tolerance);
            match (isec, t.isec) {
                (None, None) => return,
                (Some(a), Some(b)) => assert!(a.coords_equal(&b), "{:?} != {:?}", a, b),
                (a, b) => panic!("{:?} != {:?}", a, b),
            }
            let mut copy_seg = slab[t.a].clone();
            let sweep = copy_seg.geom.first();
            let split = copy_seg.adjust_for_intersection(t.isec.unwrap(), &tolerance, sweep);
            assert_eq!(split, t.split);
        };

        let test_cases = vec![
            TestCase {
                a: 0,
                b: 0,
                isec: Some(slab[0].geom),
                split: SplitSegments::Unchanged,
            },
            TestCase {
                a: 0,
                b: 1,
                isec: Some(Point((5., 5.).into())),
                split: SplitSegments::SplitOnce {
                    right: Line((5., 5.).into(), (10., 10.).into()),
                },
            },
            TestCase {
                a: 0,
                b: 2,
                isec: Some(Point((0., 0.).into())),
                split: SplitSegments::Unchanged,
            },
            TestCase {
                a: 0,
                b: 3,
                isec: Some(Line((0., 0.).into(), (5., 5.).into())),
                split: SplitSegments::SplitOnce {
                    right: Line((5., 5.).into(), (10., 10.).into()),
                },
            },
            TestCase {
                a: 0,
                b: 4,
                isec: Some(Line((5., 5.).into(), (10., 10.).into())),
                split: SplitSegments::SplitOnce {
                    right: Line((5., 5.).into(), (10., 10.).into()),
                },
            },
            TestCase {
                a: 0,
                b: 5,
                isec: Some(Line((2., 2.).into(), (7., 7.).into())),
                split: SplitSegments::SplitTwice {
                    middle: Line((2., 2.).into(), (7., 7.).into()),
                    right: Line((7., 7.).into(), (10., 10.).into()),
                },
            },
        ];

        test_cases.iter().for_each(check);
    }

    #[test]
    fn test_ahead_of() {
        let pt: SweepPoint<f64> = (5., 0.).into();
        let behind = Line((3., 0.).into(), (4., 0.).into());
        assert!(ahead_of(behind, pt).is_none());

        let straddling = Line((4., 0.).into(), (6., 0.).into());
        assert!(ahead_of(straddling, pt)
            .unwrap()
            .coords_equal(&Line(pt, (6., 0.).into())));
    }

    #[test]
    fn test_split_near_vertical() {
        let mut slab = Slab::new();
        let key = Segment::new(&mut slab, Line::from([(3., 0.), (3., 5.)]), None).key;
        let tolerance = Tolerance::default();
        let sweep: SweepPoint<f64> = (3., 0.).into();

        // Just right of the segment, so ordered after its top end.
        let right_of = Point((3.000000000000001, 2.5).into());
        let split = slab[key]
            .clone()
            .adjust_for_intersection(right_of, &tolerance, sweep);
        assert_eq!(
            split,
            SplitSegments::SplitOnce {
                right: Line((3., 2.5).into(), (3., 5.).into()),
            }
        );

        // Just left of it, so ordered before its bottom end.
        let left_of = Point((2.9999999999999996, 1.).into());
        let split = slab[key]
            .clone()
            .adjust_for_intersection(left_of, &tolerance, sweep);
        assert_eq!(
            split,
            SplitSegments::SplitOnce {
                right: Line((3., 1.).into(), (3., 5.).into()),
            }
        );

        // Far away, or behind the sweep: no cut.
        let far = Point((3.5, 2.5).into());
        let mut copy = slab[key].clone();
        assert_eq!(
            copy.adjust_for_intersection(far, &tolerance, sweep),
            SplitSegments::Unchanged
        );
        let later: SweepPoint<f64> = (3., 3.).into();
        assert_eq!(
            copy.adjust_for_intersection(right_of, &tolerance, later),
            SplitSegments::Unchanged
        );
    }
}
