use geo::{coordinate_position::CoordPos, Coordinate, GeoFloat, LineString, Polygon};
use log::{debug, trace};

use crate::{
    utils::{ring_position, signed_area},
    Error, Result, Tolerance,
};

/// Split a closed walk at every repeated coordinate into simple closed
/// loops.
fn split_loops<T: GeoFloat>(ring: &[Coordinate<T>]) -> Vec<Vec<Coordinate<T>>> {
    let mut loops = vec![];
    let mut path: Vec<Coordinate<T>> = Vec::with_capacity(ring.len());
    for &c in ring {
        if path.last() == Some(&c) {
            continue;
        }
        match path.iter().position(|p| *p == c) {
            Some(start) => {
                let mut closed = path.split_off(start);
                closed.push(c);
                path.push(c);
                loops.push(closed);
            }
            None => path.push(c),
        }
    }
    loops
}

/// Whether two closed loops visit the same coordinates in the same
/// cyclic order.
fn same_loop<T: GeoFloat>(a: &[Coordinate<T>], b: &[Coordinate<T>]) -> bool {
    if a.len() != b.len() || a.len() < 2 {
        return false;
    }
    let (a, b) = (&a[1..], &b[1..]);
    match b.iter().position(|c| *c == a[0]) {
        Some(shift) => a
            .iter()
            .enumerate()
            .all(|(i, c)| *c == b[(i + shift) % b.len()]),
        None => false,
    }
}

struct Shell<T: GeoFloat> {
    coords: Vec<Coordinate<T>>,
    area: T,
    holes: Vec<LineString<T>>,
}

/// Points of `ring` used to locate it: its vertices, then the midpoints
/// of its edges.
fn sample_points<T: GeoFloat>(ring: &[Coordinate<T>]) -> impl Iterator<Item = Coordinate<T>> + '_ {
    let two = T::one() + T::one();
    ring.iter()
        .copied()
        .chain(ring.windows(2).map(move |w| (w[0] + w[1]) / two))
}

/// Turn traced rings into polygons.
///
/// Rings are split into simple loops and loops enclosing no area (or
/// repeating an earlier loop) are dropped. Counter-clockwise loops become
/// shells in the order they were traced; each clockwise loop becomes a
/// hole of the smallest shell strictly containing it.
pub(crate) fn assemble<T: GeoFloat>(
    rings: Vec<Vec<Coordinate<T>>>,
    tolerance: &Tolerance<T>,
) -> Result<Vec<Polygon<T>>> {
    let mut kept: Vec<(Vec<Coordinate<T>>, T)> = vec![];
    for coords in rings.iter().flat_map(|r| split_loops(r)) {
        let area = signed_area(&coords);
        if coords.len() < 4 || tolerance.is_zero_area(area) {
            trace!("dropping sliver {:?}", coords);
            continue;
        }
        if kept.iter().any(|(other, _)| same_loop(other, &coords)) {
            trace!("dropping repeated loop {:?}", coords);
            continue;
        }
        kept.push((coords, area));
    }

    let (shells, holes): (Vec<_>, Vec<_>) = kept
        .into_iter()
        .enumerate()
        .partition(|(_, (_, area))| *area > T::zero());
    let mut shells: Vec<Shell<T>> = shells
        .into_iter()
        .map(|(_, (coords, area))| Shell {
            coords,
            area,
            holes: vec![],
        })
        .collect();

    for (ring, (coords, _)) in holes {
        let sample = sample_points(&coords).find(|&pt| {
            shells
                .iter()
                .all(|s| ring_position(&s.coords, pt, tolerance) != CoordPos::OnBoundary)
        });
        let owner = sample.and_then(|pt| {
            shells
                .iter()
                .enumerate()
                .filter(|(_, s)| ring_position(&s.coords, pt, tolerance) == CoordPos::Inside)
                .min_by(|(_, a), (_, b)| a.area.partial_cmp(&b.area).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(idx, _)| idx)
        });
        match owner {
            Some(idx) => shells[idx].holes.push(LineString(coords)),
            None => return Err(Error::OrphanHole { ring }),
        }
    }

    debug!("assembled {} polygons", shells.len());
    Ok(shells
        .into_iter()
        .map(|s| Polygon::new(LineString(s.coords), s.holes))
        .collect())
}

#[cfg(test)]
mod tests {
    use geo::prelude::Area;

    use super::*;

    fn ring(pts: &[(f64, f64)]) -> Vec<Coordinate<f64>> {
        pts.iter().map(|&(x, y)| Coordinate { x, y }).collect()
    }

    #[test]
    fn test_split_loops() {
        // Two squares joined at (1, 1), walked as one ring.
        let walk = ring(&[
            (0., 0.),
            (1., 0.),
            (1., 1.),
            (2., 1.),
            (2., 2.),
            (1., 2.),
            (1., 1.),
            (0., 1.),
            (0., 0.),
        ]);
        let loops = split_loops(&walk);
        assert_eq!(
            loops,
            vec![
                ring(&[(1., 1.), (2., 1.), (2., 2.), (1., 2.), (1., 1.)]),
                ring(&[(0., 0.), (1., 0.), (1., 1.), (0., 1.), (0., 0.)]),
            ]
        );
        let polys = assemble(vec![walk], &Tolerance::default()).unwrap();
        assert_eq!(polys.len(), 2);
        assert!(polys.iter().all(|p| p.unsigned_area() == 1.));
    }

    #[test]
    fn test_holes() {
        let tol = Tolerance::default();
        let outer = ring(&[(0., 0.), (10., 0.), (10., 10.), (0., 10.), (0., 0.)]);
        let inner = ring(&[(4., 4.), (6., 4.), (6., 6.), (4., 6.), (4., 4.)]);
        let hole = ring(&[(1., 1.), (1., 9.), (9., 9.), (9., 1.), (1., 1.)]);
        let polys = assemble(vec![outer.clone(), hole.clone(), inner], &tol).unwrap();
        assert_eq!(polys.len(), 2);
        assert_eq!(polys[0].interiors().len(), 1);
        assert!(polys[1].interiors().is_empty());
        assert_eq!(polys[0].unsigned_area(), 100. - 64.);

        assert_eq!(assemble(vec![hole], &tol), Err(Error::OrphanHole { ring: 0 }));
    }

    #[test]
    fn test_drops_slivers_and_repeats() {
        let tol = Tolerance::default();
        let flat = ring(&[(0., 0.), (5., 0.), (10., 0.), (5., 0.), (0., 0.)]);
        let square = ring(&[(0., 0.), (1., 0.), (1., 1.), (0., 1.), (0., 0.)]);
        let rotated = ring(&[(1., 1.), (0., 1.), (0., 0.), (1., 0.), (1., 1.)]);
        let polys = assemble(vec![flat, square, rotated], &tol).unwrap();
        assert_eq!(polys.len(), 1);
    }
}
