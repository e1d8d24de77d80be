use std::iter::FromIterator;

use geo::{Coordinate, GeoFloat, Line};
use log::error;

use crate::{Error, Result, Tolerance};

mod sweep;
use sweep::Sweep;

/// Interface for types that can be processed to detect crossings.
///
/// The geo-type [`Line`] implements this trait. Custom types carry
/// whatever identifies the segment to the caller (for instance the ring
/// and vertex it came from); they are handed back in every [`Crossing`].
pub trait Crossable: Sized {
    type Scalar: GeoFloat;

    /// The segment to sweep; its coordinates must be finite.
    /// Zero-length segments are ignored.
    fn line(&self) -> Line<Self::Scalar>;
}

impl<T: GeoFloat> Crossable for Line<T> {
    type Scalar = T;

    fn line(&self) -> Line<T> {
        *self
    }
}

impl<'a, C: Crossable> Crossable for &'a C {
    type Scalar = C::Scalar;

    fn line(&self) -> Line<Self::Scalar> {
        C::line(*self)
    }
}

/// A segment of a [`Crossable`].
///
/// This type is used to convey the part of the input geometry that is
/// incident on a given sweep point.
#[derive(Debug, Clone)]
pub struct Crossing<C: Crossable> {
    /// The input associated with this segment.
    pub crossable: C,

    /// The geometry of this segment.
    ///
    /// This is a part of the input `crossable` geometry. The parts
    /// are formed by splitting the input geometry as and when
    /// intersection points are witnessed. If this geometry ends at
    /// the intersection point (`at_left` is `false`), then it is
    /// guaranteed to not contain any intersection point.
    pub line: Line<C::Scalar>,

    /// Whether this part starts at the left end of the input segment.
    pub first_segment: bool,

    /// Flag that is `true` if the `line` starts at the sweep point.
    pub at_left: bool,
}

/// Iterator that yields all crossings.
///
/// Yields all end points and intersections of a set of line segments,
/// in lexicographic (`x`, then `y`) order. After each point, the parts
/// of the inputs incident on it are available from
/// [`intersections`](Self::intersections).
///
/// The implementation uses the [Bentley-Ottman] algorithm and runs in
/// time O((n + k) log(n)) time; this is faster than a brute-force
/// search for intersections across all pairs of input segments if k,
/// the number of intersections is small compared to n^2.
///
/// [Bentley-Ottman]: //en.wikipedia.org/wiki/Bentley%E2%80%93Ottmann_algorithm
pub struct CrossingsIter<C>
where
    C: Crossable + Clone,
{
    sweep: Sweep<C>,
    segments: Vec<Crossing<C>>,
    error: Option<Error>,
}

impl<C: Crossable + Clone> CrossingsIter<C> {
    /// Create an iterator over `iter`, using `tolerance` for all
    /// geometric decisions and stopping with
    /// [`Error::EventLimitExceeded`] after `max_events` events.
    pub fn new<I: IntoIterator<Item = C>>(
        iter: I,
        tolerance: Tolerance<C::Scalar>,
        max_events: Option<usize>,
    ) -> Self {
        let sweep = Sweep::new(iter, tolerance, max_events);
        let segments = Vec::with_capacity(8);
        CrossingsIter {
            sweep,
            segments,
            error: None,
        }
    }

    /// Returns the segments that intersect the last point yielded by
    /// the iterator.
    #[inline]
    pub fn intersections(&self) -> &[Crossing<C>] {
        &self.segments
    }

    /// The error that stopped the iteration, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Advance to the next sweep point that has incident segments.
    pub fn try_next(&mut self) -> Result<Option<Coordinate<C::Scalar>>> {
        let CrossingsIter {
            sweep, segments, ..
        } = self;
        loop {
            segments.clear();
            let point = match sweep.peek_point() {
                Some(pt) => pt,
                None => return Ok(None),
            };
            while sweep.peek_point() == Some(point) {
                sweep.next_event(|crossing| segments.push(crossing))?;
            }
            if !segments.is_empty() {
                return Ok(Some(point.coord()));
            }
        }
    }
}

impl<C: Crossable + Clone> FromIterator<C> for CrossingsIter<C> {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self::new(iter, Tolerance::default(), None)
    }
}

impl<C: Crossable + Clone> Iterator for CrossingsIter<C> {
    type Item = Coordinate<C::Scalar>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }
        match self.try_next() {
            Ok(pt) => pt,
            Err(e) => {
                error!("sweep stopped: {e}");
                self.error = Some(e);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn simple_iter() {
        init_log();
        let input = vec![
            Line::from([(1., 0.), (0., 1.)]),
            Line::from([(0., 0.), (1., 1.)]),
        ];
        let mut iter: CrossingsIter<_> = input.iter().collect();
        let mut points = vec![];
        while let Some(pt) = iter.next() {
            points.push((pt, iter.intersections().len()));
        }
        assert_eq!(
            points,
            vec![
                (Coordinate { x: 0., y: 0. }, 1),
                (Coordinate { x: 0., y: 1. }, 1),
                (Coordinate { x: 0.5, y: 0.5 }, 4),
                (Coordinate { x: 1., y: 0. }, 1),
                (Coordinate { x: 1., y: 1. }, 1),
            ]
        );
    }

    #[test]
    fn overlap_intersect() {
        init_log();

        let input = vec![
            Line::from([(0., 0.), (1., 1.)]),
            [(1., 0.), (0., 1.)].into(),
            [(0., 0.5), (1., 0.5)].into(),
            [(-1., 0.5), (0.5, 0.5)].into(),
        ];

        let mut iter: CrossingsIter<_> = input.iter().collect();
        let mut centre = None;
        while let Some(pt) = iter.next() {
            eprintln!("{:?} has {} segments", pt, iter.intersections().len());
            if pt == (Coordinate { x: 0.5, y: 0.5 }) {
                centre = Some(iter.intersections().to_vec());
            }
        }
        assert!(iter.error().is_none());

        // All four inputs meet at the centre.
        let centre = centre.unwrap();
        let mut touching: Vec<_> = centre
            .iter()
            .map(|c| input.iter().position(|l| std::ptr::eq(l, c.crossable)).unwrap())
            .collect();
        touching.sort_unstable();
        touching.dedup();
        assert_eq!(touching, vec![0, 1, 2, 3]);
    }

    #[test]
    fn event_limit() {
        let input = vec![
            Line::from([(0., 0.), (1., 1.)]),
            [(1., 0.), (0., 1.)].into(),
        ];
        let mut iter = CrossingsIter::new(input.iter(), Tolerance::default(), Some(1));
        assert!(iter.try_next().is_ok());
        assert_eq!(iter.try_next(), Err(Error::EventLimitExceeded { limit: 1 }));
        assert!(iter.next().is_none());
        assert_eq!(iter.error(), Some(&Error::EventLimitExceeded { limit: 1 }));
    }
}
