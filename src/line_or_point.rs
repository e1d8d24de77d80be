use std::cmp::Ordering;

use geo::{
    kernels::{Kernel, Orientation},
    Coordinate, GeoFloat, Line,
};
use smallvec::SmallVec;

use crate::{events::SweepPoint, Tolerance};

/// Either a line segment or a point.
///
/// The coordinates are ordered (see [`SweepPoint`]) and a line
/// segment must have distinct points (use the `Point` variant if the
/// coordinates are the equal).
#[derive(Debug, Clone, Copy)]
pub enum LineOrPoint<T: GeoFloat> {
    Point(SweepPoint<T>),
    Line(SweepPoint<T>, SweepPoint<T>),
}

/// Convert from a [`Line`] ensuring end point ordering.
impl<T: GeoFloat> From<Line<T>> for LineOrPoint<T> {
    fn from(l: Line<T>) -> Self {
        let start = l.start.into();
        let end = l.end.into();
        if start < end {
            LineOrPoint::Line(start, end)
        } else if start > end {
            LineOrPoint::Line(end, start)
        } else {
            LineOrPoint::Point(start)
        }
    }
}

/// Convert from a [`Coordinate`]
impl<T: GeoFloat> From<Coordinate<T>> for LineOrPoint<T> {
    fn from(c: Coordinate<T>) -> Self {
        LineOrPoint::Point(c.into())
    }
}

impl<T: GeoFloat> LineOrPoint<T> {
    /// Checks if the variant is a line.
    #[inline]
    pub fn is_line(&self) -> bool {
        matches!(self, LineOrPoint::Line(_, _))
    }

    /// Return a [`Line`] representing the geometry (degenerate for points).
    #[inline]
    pub fn line(&self) -> Line<T> {
        match self {
            LineOrPoint::Line(p, q) => Line::new(p.coord(), q.coord()),
            LineOrPoint::Point(p) => Line::new(p.coord(), p.coord()),
        }
    }

    /// Returns the lexicographic first coordinate of the geometry.
    #[inline]
    pub fn first(&self) -> SweepPoint<T> {
        *match self {
            LineOrPoint::Point(p) => p,
            LineOrPoint::Line(p, _) => p,
        }
    }

    /// Returns the lexicographic last coordinate of the geometry.
    #[inline]
    pub fn last(&self) -> SweepPoint<T> {
        *match self {
            LineOrPoint::Point(p) => p,
            LineOrPoint::Line(_, q) => q,
        }
    }

    /// Intersect a line with self and return a point, an overlapping
    /// segment or `None`.
    ///
    /// End points within tolerance of the other geometry are preferred
    /// over computed points, so that touching configurations resolve to
    /// existing coordinates. A computed crossing is snapped to nearby
    /// end points and clamped into the common range of both segments.
    pub fn intersect_line(&self, other: &Self, tolerance: &Tolerance<T>) -> Option<Self> {
        let (p1, q1) = (self.first(), self.last());
        let (p2, q2) = (other.first(), other.last());

        let eps = tolerance.epsilon();
        if q1.coord().x + eps < p2.coord().x || q2.coord().x + eps < p1.coord().x {
            return None;
        }
        let (min1, max1) = y_range(p1, q1);
        let (min2, max2) = y_range(p2, q2);
        if max1 + eps < min2 || max2 + eps < min1 {
            return None;
        }

        let mut contacts: SmallVec<[SweepPoint<T>; 4]> = SmallVec::new();
        for pt in [p1, q1] {
            if tolerance.on_segment(pt.coord(), p2.coord(), q2.coord()) {
                contacts.push(pt);
            }
        }
        for pt in [p2, q2] {
            if tolerance.on_segment(pt.coord(), p1.coord(), q1.coord()) {
                contacts.push(pt);
            }
        }
        contacts.sort();
        contacts.dedup();
        match contacts.len() {
            0 => {}
            1 => return Some(LineOrPoint::Point(contacts[0])),
            n => {
                let (lo, hi) = (contacts[0], contacts[n - 1]);
                return Some(if tolerance.near_eq(lo.coord(), hi.coord()) {
                    LineOrPoint::Point(lo)
                } else {
                    LineOrPoint::Line(lo, hi)
                });
            }
        }
        if !self.is_line() || !other.is_line() {
            return None;
        }

        // No end point touches the other segment: only a proper crossing
        // remains possible.
        let o1 = T::Ker::orient2d(p1.coord(), q1.coord(), p2.coord());
        let o2 = T::Ker::orient2d(p1.coord(), q1.coord(), q2.coord());
        let o3 = T::Ker::orient2d(p2.coord(), q2.coord(), p1.coord());
        let o4 = T::Ker::orient2d(p2.coord(), q2.coord(), q1.coord());
        if [o1, o2, o3, o4].contains(&Orientation::Collinear) || o1 == o2 || o3 == o4 {
            return None;
        }

        let d1 = q1.coord() - p1.coord();
        let d2 = q2.coord() - p2.coord();
        let denom = cross(d1, d2);
        if denom == T::zero() {
            return None;
        }
        let t = cross(p2.coord() - p1.coord(), d2) / denom;
        let computed = p1.coord() + d1 * t;
        if !computed.x.is_finite() || !computed.y.is_finite() {
            return None;
        }

        let lo = p1.max(p2);
        let hi = q1.min(q2);
        if lo > hi {
            return None;
        }
        let mut pt = [p1, q1, p2, q2]
            .iter()
            .copied()
            .find(|e| tolerance.near_eq(e.coord(), computed))
            .unwrap_or_else(|| computed.into());
        if pt < lo {
            pt = lo;
        } else if pt > hi {
            pt = hi;
        }
        Some(LineOrPoint::Point(pt))
    }

    #[cfg(test)]
    pub fn coords_equal(&self, other: &LineOrPoint<T>) -> bool {
        match (self, other) {
            (LineOrPoint::Point(p), LineOrPoint::Point(q)) => p == q,
            (LineOrPoint::Line(p1, q1), LineOrPoint::Line(p2, q2)) => p1 == p2 && q1 == q2,
            _ => false,
        }
    }
}

#[inline]
fn y_range<T: GeoFloat>(p: SweepPoint<T>, q: SweepPoint<T>) -> (T, T) {
    let (a, b) = (p.coord().y, q.coord().y);
    (a.min(b), a.max(b))
}

#[inline]
pub(crate) fn cross<T: GeoFloat>(a: Coordinate<T>, b: Coordinate<T>) -> T {
    a.x * b.y - a.y * b.x
}

/// Equality based on ordering defined for segments as per algorithm.
impl<T: GeoFloat> PartialEq for LineOrPoint<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

/// Ordering defined for segments as per algorithm.
///
/// Requires the following conditions:
///
/// 1. If comparing two lines, the both left ends must be strictly
/// smaller than both right ends.
///
/// 2. A point is treated as a infinitesimal small vertical segment
/// centered at its coordinates.
impl<T: GeoFloat> PartialOrd for LineOrPoint<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.cmp_within(other, &Tolerance::exact())
    }
}

impl<T: GeoFloat> LineOrPoint<T> {
    /// Ordering along the sweep line, as for `PartialOrd`, except that
    /// an end point within tolerance of the other segment counts as
    /// lying on it.
    ///
    /// Pieces cut at a computed crossing start a rounding error off the
    /// lines of the segments through it; this keeps them ordered by
    /// direction as if they started on them.
    pub(crate) fn cmp_within(&self, other: &Self, tolerance: &Tolerance<T>) -> Option<Ordering> {
        let near = |pt: SweepPoint<T>, a: SweepPoint<T>, b: SweepPoint<T>| {
            tolerance.epsilon() > T::zero() && tolerance.on_segment(pt.coord(), a.coord(), b.coord())
        };
        let side = |a: SweepPoint<T>, b: SweepPoint<T>, pt: SweepPoint<T>| {
            orientation_as_ordering(T::Ker::orient2d(a.coord(), b.coord(), pt.coord()))
        };
        match (self, other) {
            (LineOrPoint::Point(p), LineOrPoint::Point(q)) => {
                if p == q {
                    Some(Ordering::Equal)
                } else {
                    // Unequal points do not satisfy pre-condition and
                    // can't be ordered.
                    None
                }
            }
            (LineOrPoint::Point(_), LineOrPoint::Line(_, _)) => {
                other.cmp_within(self, tolerance).map(Ordering::reverse)
            }
            (LineOrPoint::Line(p, q), LineOrPoint::Point(r)) => {
                if r > q || p > r {
                    return None;
                }
                if near(*r, *p, *q) {
                    return Some(Ordering::Greater);
                }
                Some(side(*p, *q, *r).then(Ordering::Greater))
            }
            (LineOrPoint::Line(p1, q1), LineOrPoint::Line(p2, q2)) => {
                if p1 > p2 {
                    return other.cmp_within(self, tolerance).map(Ordering::reverse);
                }
                if p2 >= q1 {
                    return None;
                }

                // Assertion: p1 <= p2
                // Assertion: pi < q_j
                let start = if near(*p2, *p1, *q1) {
                    Ordering::Equal
                } else {
                    side(*p1, *q1, *p2)
                };
                Some(start.then_with(|| {
                    // The end reached first decides, so that swapping
                    // the operands gives the reverse order.
                    let overlapping = if q2 <= q1 {
                        near(*q2, *p1, *q1)
                    } else {
                        near(*q1, *p2, *q2)
                    };
                    if overlapping {
                        Ordering::Equal
                    } else {
                        side(*p1, *q1, *q2)
                    }
                }))
            }
        }
    }
}

/// Helper to convert orientation-2d into an ordering
#[inline]
fn orientation_as_ordering(orientation: Orientation) -> Ordering {
    match orientation {
        Orientation::CounterClockwise => Ordering::Less,
        Orientation::Clockwise => Ordering::Greater,
        Orientation::Collinear => Ordering::Equal,
    }
}
