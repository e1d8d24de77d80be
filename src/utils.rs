use geo::{coordinate_position::CoordPos, Coordinate, GeoFloat, LineString};
use itertools::Itertools;

use crate::Tolerance;

/// Shoelace area of a closed coordinate ring; positive for
/// counter-clockwise rings.
pub(crate) fn signed_area<T: GeoFloat>(ring: &[Coordinate<T>]) -> T {
    let origin = match ring.first() {
        Some(c) => *c,
        None => return T::zero(),
    };
    let twice = ring
        .iter()
        .tuple_windows()
        .fold(T::zero(), |acc, (a, b)| {
            let (a, b) = (*a - origin, *b - origin);
            acc + (a.x * b.y - a.y * b.x)
        });
    twice / (T::one() + T::one())
}

/// Copy a ring, appending the first coordinate if it is not closed.
pub(crate) fn closed_coords<T: GeoFloat>(ring: &LineString<T>) -> Vec<Coordinate<T>> {
    let mut coords = ring.0.clone();
    if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
        if first != last {
            coords.push(*first);
        }
    }
    coords
}

/// Even-odd test of `pt` against a closed ring. Points on the boundary
/// may go either way.
pub(crate) fn ring_contains<T: GeoFloat>(ring: &[Coordinate<T>], pt: Coordinate<T>) -> bool {
    ring.iter().tuple_windows().fold(false, |inside, (a, b)| {
        if (a.y > pt.y) != (b.y > pt.y) {
            let x = a.x + (pt.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if pt.x < x {
                return !inside;
            }
        }
        inside
    })
}

/// Position of `pt` relative to the region bounded by a closed ring.
pub(crate) fn ring_position<T: GeoFloat>(
    ring: &[Coordinate<T>],
    pt: Coordinate<T>,
    tolerance: &Tolerance<T>,
) -> CoordPos {
    if ring
        .iter()
        .tuple_windows()
        .any(|(a, b)| tolerance.on_segment(pt, *a, *b))
    {
        CoordPos::OnBoundary
    } else if ring_contains(ring, pt) {
        CoordPos::Inside
    } else {
        CoordPos::Outside
    }
}
