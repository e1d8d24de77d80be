//! Pairwise intersections of line strings and rings.
//!
//! Wraps [`CrossingsIter`] to report, for every sweep point, one entry
//! per pair of input segments that touch it.

use geo::{Coordinate, GeoFloat, Line, LineString, Polygon};
use itertools::Itertools;
use log::debug;
use smallvec::SmallVec;

use crate::{Crossable, CrossingsIter, Error, LineOrPoint, Result, Tolerance};

/// Identifies a segment of an input sequence: `index` is the position of
/// its start vertex after consecutive duplicates are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId {
    pub sequence: usize,
    pub index: usize,
}

/// One pairwise intersection event: segments `first < second` touch at
/// `coord`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentIntersection<T: GeoFloat> {
    pub coord: Coordinate<T>,
    pub first: SegmentId,
    pub second: SegmentId,
}

/// Segment of a prepared sequence, as handed to the sweep.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SequenceEdge<T: GeoFloat> {
    pub(crate) id: SegmentId,
    /// Number of segments in the sequence.
    len: usize,
    closed: bool,
    pub(crate) line: Line<T>,
}

impl<T: GeoFloat> Crossable for SequenceEdge<T> {
    type Scalar = T;

    fn line(&self) -> Line<T> {
        self.line
    }
}

impl<T: GeoFloat> SequenceEdge<T> {
    fn is_followed_by(&self, other: &Self) -> bool {
        self.id.sequence == other.id.sequence
            && (other.id.index == self.id.index + 1
                || (self.closed && self.id.index + 1 == self.len && other.id.index == 0))
    }

    /// Whether `pt` is the vertex joining `self` and `other` in their
    /// sequence.
    fn is_joint(&self, other: &Self, pt: Coordinate<T>, tolerance: &Tolerance<T>) -> bool {
        (self.is_followed_by(other) && tolerance.near_eq(self.line.end, pt))
            || (other.is_followed_by(self) && tolerance.near_eq(other.line.end, pt))
    }

    /// Whether `pt` lies strictly inside a collinear overlap of `self`
    /// and `other`, away from both of its ends.
    fn inside_overlap(&self, other: &Self, pt: Coordinate<T>, tolerance: &Tolerance<T>) -> bool {
        let overlap = LineOrPoint::from(self.line).intersect_line(&other.line.into(), tolerance);
        match overlap {
            Some(LineOrPoint::Line(lo, hi)) => {
                !tolerance.near_eq(lo.coord(), pt) && !tolerance.near_eq(hi.coord(), pt)
            }
            _ => false,
        }
    }
}

/// A validated, snapped and de-duplicated coordinate sequence.
#[derive(Debug, Clone)]
pub(crate) struct Sequence<T: GeoFloat> {
    pub(crate) coords: Vec<Coordinate<T>>,
    pub(crate) closed: bool,
}

impl<T: GeoFloat> Sequence<T> {
    pub(crate) fn edges(&self, sequence: usize) -> impl Iterator<Item = SequenceEdge<T>> + '_ {
        sequence_edges(&self.coords, sequence, self.closed)
    }
}

/// Segments of one coordinate sequence, numbered `sequence`.
pub(crate) fn sequence_edges<T: GeoFloat>(
    coords: &[Coordinate<T>],
    sequence: usize,
    closed: bool,
) -> impl Iterator<Item = SequenceEdge<T>> + '_ {
    let len = coords.len().saturating_sub(1);
    coords
        .iter()
        .tuple_windows()
        .enumerate()
        .map(move |(index, (start, end))| SequenceEdge {
            id: SegmentId { sequence, index },
            len,
            closed,
            line: Line::new(*start, *end),
        })
}

/// Check, snap (jointly) and de-duplicate input sequences.
///
/// Sequences with fewer than two distinct coordinates are kept, empty,
/// so that sequence numbers keep matching the input.
pub(crate) fn prepare<T: GeoFloat>(
    sequences: &[&[Coordinate<T>]],
    tolerance: &Tolerance<T>,
) -> Result<Vec<Sequence<T>>> {
    for (sequence, coords) in sequences.iter().enumerate() {
        if let Some(index) = coords
            .iter()
            .position(|c| !c.x.is_finite() || !c.y.is_finite())
        {
            return Err(Error::InvalidCoordinate { sequence, index });
        }
    }

    let mut flat: Vec<Coordinate<T>> = sequences.iter().flat_map(|s| s.iter().copied()).collect();
    tolerance.snap(&mut flat);

    let mut offset = 0;
    Ok(sequences
        .iter()
        .map(|s| {
            let mut coords = flat[offset..offset + s.len()].to_vec();
            offset += s.len();
            coords.dedup();
            if coords.len() < 2 {
                coords.clear();
            }
            let closed = coords.len() >= 3 && coords.first() == coords.last();
            Sequence { coords, closed }
        })
        .collect())
}

/// Computes pairwise intersections among line strings using a sweep.
///
/// ```rust
/// use geo::line_string;
/// use geo_overlay::Intersector;
///
/// let a = line_string![(x: 10., y: 10.), (x: 20., y: 20.)];
/// let b = line_string![(x: 15., y: 20.), (x: 15., y: 10.)];
/// let points = Intersector::default().intersections(&[a, b]).unwrap();
/// assert_eq!(points.len(), 1);
/// assert_eq!((points[0].x, points[0].y), (15., 15.));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Intersector<T: GeoFloat> {
    tolerance: Tolerance<T>,
    max_events: Option<usize>,
}

impl<T: GeoFloat> Default for Intersector<T> {
    fn default() -> Self {
        Intersector {
            tolerance: Tolerance::default(),
            max_events: None,
        }
    }
}

impl<T: GeoFloat> Intersector<T> {
    pub fn with_tolerance(mut self, tolerance: Tolerance<T>) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Fail with [`Error::EventLimitExceeded`] instead of processing more
    /// than `max_events` sweep events.
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = Some(max_events);
        self
    }

    #[inline]
    pub fn tolerance(&self) -> &Tolerance<T> {
        &self.tolerance
    }

    /// Ordered intersection coordinates among `sequences`.
    ///
    /// A coordinate is repeated once per pair of segments meeting there.
    /// Consecutive segments of a sequence are not reported at the vertex
    /// they share. Two segments overlapping along a stretch are reported
    /// at the two ends of the overlap only, not where other segments
    /// cross it. Sweep points within tolerance of each other are one
    /// point. Sequences with fewer than two distinct coordinates
    /// contribute nothing.
    pub fn intersections(&self, sequences: &[LineString<T>]) -> Result<Vec<Coordinate<T>>> {
        let sequences: Vec<_> = sequences.iter().map(|ls| &ls.0[..]).collect();
        Ok(self
            .segment_intersections(&sequences)?
            .into_iter()
            .map(|isec| isec.coord)
            .collect())
    }

    /// Self-intersections of a single line string or closed ring.
    pub fn line_string(&self, line_string: &LineString<T>) -> Result<Vec<Coordinate<T>>> {
        self.intersections(std::slice::from_ref(line_string))
    }

    /// Intersections among all rings of a polygon (shell first, then the
    /// holes in order).
    pub fn polygon(&self, polygon: &Polygon<T>) -> Result<Vec<Coordinate<T>>> {
        let rings: Vec<_> = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(|ring| &ring.0[..])
            .collect();
        Ok(self
            .segment_intersections(&rings)?
            .into_iter()
            .map(|isec| isec.coord)
            .collect())
    }

    /// Like [`intersections`](Self::intersections), also identifying
    /// the two segments of every event.
    ///
    /// Events are ordered by coordinate (`x`, then `y`) and then by the
    /// pair of segment ids.
    pub fn segment_intersections(
        &self,
        sequences: &[&[Coordinate<T>]],
    ) -> Result<Vec<SegmentIntersection<T>>> {
        let prepared = prepare(sequences, &self.tolerance)?;
        let edges = prepared
            .iter()
            .enumerate()
            .flat_map(|(idx, seq)| seq.edges(idx));
        self.sweep_edges(edges)
    }

    pub(crate) fn sweep_edges<I: IntoIterator<Item = SequenceEdge<T>>>(
        &self,
        edges: I,
    ) -> Result<Vec<SegmentIntersection<T>>> {
        let eps = self.tolerance.epsilon();
        let mut iter = CrossingsIter::new(edges, self.tolerance, self.max_events);
        let mut output = vec![];

        // Sweep points are visited in x order, so the clusters a point
        // may still join lie within `eps` of it in x.
        let mut pending: Vec<(Coordinate<T>, Touching<T>)> = vec![];
        while let Some(pt) = iter.try_next()? {
            let done = pending.iter().take_while(|(c, _)| c.x < pt.x - eps).count();
            for (c, touching) in pending.drain(..done) {
                self.report(c, touching, &mut output);
            }

            let edges = iter.intersections().iter().map(|c| c.crossable);
            match pending.iter_mut().find(|(c, _)| self.tolerance.near_eq(*c, pt)) {
                Some((_, touching)) => touching.extend(edges),
                None => pending.push((pt, edges.collect())),
            }
        }
        for (c, touching) in pending {
            self.report(c, touching, &mut output);
        }
        debug!("sweep found {} intersection events", output.len());
        Ok(output)
    }

    /// Report every pair among the segments touching `pt`.
    fn report(
        &self,
        pt: Coordinate<T>,
        mut touching: Touching<T>,
        output: &mut Vec<SegmentIntersection<T>>,
    ) {
        touching.sort_by_key(|e| e.id);
        touching.dedup_by_key(|e| e.id);

        for (a, b) in touching.iter().tuple_combinations() {
            if a.is_joint(b, pt, &self.tolerance) || a.inside_overlap(b, pt, &self.tolerance) {
                continue;
            }
            output.push(SegmentIntersection {
                coord: pt,
                first: a.id,
                second: b.id,
            });
        }
    }
}

type Touching<T> = SmallVec<[SequenceEdge<T>; 8]>;

/// Intersections among `sequences` with the default tolerance.
///
/// See [`Intersector::intersections`].
pub fn intersections<T: GeoFloat>(sequences: &[LineString<T>]) -> Result<Vec<Coordinate<T>>> {
    Intersector::default().intersections(sequences)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::{
        line_intersection::{line_intersection, LineIntersection},
        line_string, Rect,
    };
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::crossings::tests::init_log;
    use crate::random::*;

    #[test]
    fn test_simple_crossing() {
        init_log();
        let a = line_string![(x: 10., y: 10.), (x: 20., y: 20.)];
        let b = line_string![(x: 15., y: 20.), (x: 15., y: 10.)];
        assert_eq!(
            intersections(&[a, b]).unwrap(),
            vec![Coordinate { x: 15., y: 15. }]
        );
    }

    #[test]
    fn test_t_junction_multiplicity() {
        init_log();
        // Three segments meet at (5, 0): the vertical stem touches both
        // halves of the base, which in turn are consecutive.
        let base = line_string![(x: 0., y: 0.), (x: 5., y: 0.), (x: 10., y: 0.)];
        let stem = line_string![(x: 5., y: 0.), (x: 5., y: 5.)];
        let points = intersections(&[base, stem]).unwrap();
        assert_eq!(points, vec![Coordinate { x: 5., y: 0. }; 2]);

        // A stem through the interior of a single segment.
        let base = line_string![(x: 0., y: 0.), (x: 10., y: 0.)];
        let stem = line_string![(x: 5., y: -5.), (x: 5., y: 0.), (x: 5., y: 5.)];
        let isecs = Intersector::default()
            .segment_intersections(&[&base.0[..], &stem.0[..]])
            .unwrap();
        assert_eq!(isecs.len(), 2);
        assert!(isecs.iter().all(|i| i.first == SegmentId { sequence: 0, index: 0 }));
    }

    #[test]
    fn test_closed_ring() {
        init_log();
        let square = line_string![
            (x: 0., y: 0.), (x: 1., y: 0.), (x: 1., y: 1.), (x: 0., y: 1.), (x: 0., y: 0.)
        ];
        assert!(Intersector::default().line_string(&square).unwrap().is_empty());

        let bowtie = line_string![
            (x: 0., y: 0.), (x: 2., y: 2.), (x: 2., y: 0.), (x: 0., y: 2.), (x: 0., y: 0.)
        ];
        assert_eq!(
            Intersector::default().line_string(&bowtie).unwrap(),
            vec![Coordinate { x: 1., y: 1. }]
        );
    }

    #[test]
    fn test_overlap_and_degenerate() {
        init_log();
        let a = line_string![(x: 0., y: 0.), (x: 10., y: 0.)];
        let b = line_string![(x: 5., y: 0.), (x: 15., y: 0.)];
        assert_eq!(
            intersections(&[a.clone(), b]).unwrap(),
            vec![Coordinate { x: 5., y: 0. }, Coordinate { x: 10., y: 0. }]
        );

        let short = LineString(vec![Coordinate { x: 1., y: 1. }]);
        let repeated = line_string![(x: 3., y: 3.), (x: 3., y: 3.)];
        assert!(intersections(&[short, repeated, a]).unwrap().is_empty());
        assert!(intersections::<f64>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_coordinate() {
        let a = line_string![(x: 0., y: 0.), (x: 10., y: 0.)];
        let b = line_string![(x: 5., y: 0.), (x: f64::NAN, y: 1.)];
        assert_eq!(
            intersections(&[a, b]),
            Err(Error::InvalidCoordinate {
                sequence: 1,
                index: 1
            })
        );
    }

    #[test]
    fn test_event_limit() {
        let a = line_string![(x: 0., y: 0.), (x: 10., y: 10.)];
        let b = line_string![(x: 0., y: 10.), (x: 10., y: 0.)];
        assert_eq!(
            Intersector::default()
                .with_max_events(3)
                .intersections(&[a, b]),
            Err(Error::EventLimitExceeded { limit: 3 })
        );
    }

    #[test]
    fn test_random_vs_brute_force() {
        init_log();
        let mut rng = StdRng::seed_from_u64(42);
        let bbox: Rect<f64> = Rect::new([0., 0.], [1024., 1024.]);
        let lines: Vec<_> = (0..256)
            .map(|_| {
                let l = uniform_line_with_length(&mut rng, bbox, 128.);
                LineString(vec![l.start, l.end])
            })
            .collect();

        let first = intersections(&lines).unwrap();
        assert_eq!(first, intersections(&lines).unwrap());
        assert!(first
            .iter()
            .tuple_windows()
            .all(|(a, b)| (a.x, a.y) <= (b.x, b.y)));

        let mut brute = 0;
        for (i, l1) in lines.iter().enumerate() {
            for l2 in lines[i + 1..].iter() {
                let (l1, l2) = (Line::new(l1.0[0], l1.0[1]), Line::new(l2.0[0], l2.0[1]));
                if line_intersection(l1, l2).is_some() {
                    brute += 1;
                }
            }
        }
        assert_eq!(first.len(), brute);
    }

    /// Pairs among single-segment line strings, counting both ends of a
    /// collinear overlap.
    fn brute_force_count(lines: &[LineString<f64>]) -> usize {
        let mut count = 0;
        for (i, l1) in lines.iter().enumerate() {
            for l2 in lines[i + 1..].iter() {
                let (l1, l2) = (Line::new(l1.0[0], l1.0[1]), Line::new(l2.0[0], l2.0[1]));
                count += match line_intersection(l1, l2) {
                    None => 0,
                    Some(LineIntersection::SinglePoint { .. }) => 1,
                    Some(LineIntersection::Collinear { .. }) => 2,
                };
            }
        }
        count
    }

    #[test]
    fn test_crossing_near_third_segment() {
        init_log();
        // The first three meet at (3, 2.5); the crossing computed from
        // the split pieces lands a rounding error off the vertical line.
        let mut lines = vec![
            line_string![(x: 5., y: 1.), (x: 1., y: 4.)],
            line_string![(x: 1., y: 5.), (x: 5., y: 0.)],
            line_string![(x: 3., y: 0.), (x: 3., y: 5.)],
        ];
        assert_eq!(intersections(&lines).unwrap().len(), 3);

        lines.push(line_string![(x: 0., y: 4.), (x: 3., y: 4.)]);
        let points = intersections(&lines).unwrap();
        assert_eq!(points.len(), brute_force_count(&lines));
        assert_eq!(points.len(), 6);
        assert_eq!(points[0], Coordinate { x: 1., y: 4. });
        assert_relative_eq!(points[1].x, 1.8);
        for pt in &points[2..5] {
            assert_relative_eq!(pt.x, 3., epsilon = 1e-9);
            assert_relative_eq!(pt.y, 2.5, epsilon = 1e-9);
        }
        assert_eq!(points[5], Coordinate { x: 3., y: 4. });
    }

    #[test]
    fn test_overlap_crossed_inside() {
        init_log();
        let lines = [
            line_string![(x: 3., y: 2.), (x: 4., y: 3.)],
            line_string![(x: 3., y: 2.), (x: 5., y: 4.)],
            line_string![(x: 3., y: 3.), (x: 4., y: 2.)],
        ];
        let isecs = Intersector::default()
            .segment_intersections(&lines.iter().map(|l| &l.0[..]).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(isecs.len(), brute_force_count(&lines));

        let pair = |a, b| {
            isecs
                .iter()
                .filter(|i| i.first.sequence == a && i.second.sequence == b)
                .map(|i| (i.coord.x, i.coord.y))
                .collect::<Vec<_>>()
        };
        // The overlap is reported at its ends only.
        assert_eq!(pair(0, 1), vec![(3., 2.), (4., 3.)]);
        assert_eq!(pair(0, 2), vec![(3.5, 2.5)]);
        assert_eq!(pair(1, 2), vec![(3.5, 2.5)]);
    }

    #[test]
    fn test_integer_grid_vs_brute_force() {
        init_log();
        let mut rng = StdRng::seed_from_u64(11);
        for round in 0..300 {
            let lines: Vec<LineString<f64>> = (0..12)
                .map(|_| {
                    let mut coord = || Coordinate {
                        x: rng.gen_range(0..=6) as f64,
                        y: rng.gen_range(0..=6) as f64,
                    };
                    LineString(vec![coord(), coord()])
                })
                .filter(|ls| ls.0[0] != ls.0[1])
                .collect();
            let points = intersections(&lines).unwrap();
            assert_eq!(
                points.len(),
                brute_force_count(&lines),
                "round {}: {:?}",
                round,
                lines
            );
        }
    }

    #[test]
    fn test_polygon_rings() {
        init_log();
        let poly = Polygon::new(
            line_string![(x: 0., y: 0.), (x: 10., y: 0.), (x: 10., y: 10.), (x: 0., y: 10.), (x: 0., y: 0.)],
            vec![line_string![(x: 5., y: 5.), (x: 12., y: 5.), (x: 5., y: 7.), (x: 5., y: 5.)]],
        );
        let points = Intersector::default().polygon(&poly).unwrap();
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[0].x, 10.);
        assert_relative_eq!(points[0].y, 5.);
        assert_relative_eq!(points[1].x, 10.);
        assert_relative_eq!(points[1].y, 5. + 4. / 7.);
    }
}
