//! Polygon validity checks run before clipping.

use geo::{coordinate_position::CoordPos, Coordinate, GeoFloat, LineString, Polygon};
use log::debug;

use crate::{
    error::Operand,
    intersections::{prepare, sequence_edges, Intersector},
    utils::{closed_coords, ring_position, signed_area},
    Error, Result, Tolerance,
};

/// Check a polygon and return it normalised: vertices within tolerance
/// merged, consecutive duplicates dropped, shell counter-clockwise and
/// holes clockwise.
///
/// Fails if a ring has fewer than three distinct coordinates or no area,
/// if any two rings (or two parts of one ring) meet, if a hole is not
/// inside the shell or if a hole lies inside another hole. Holes touching
/// the shell or each other at a single point are rejected too.
///
/// Ring numbers in errors count the shell as ring `0` and the holes from
/// `1`; hole numbers count the holes from `0`.
pub fn validate<T: GeoFloat>(polygon: &Polygon<T>, tolerance: &Tolerance<T>) -> Result<Polygon<T>> {
    let rings = polygon_rings(polygon);
    let refs: Vec<_> = rings.iter().map(|r| &r[..]).collect();
    let mut rings: Vec<_> = prepare(&refs, tolerance)?
        .into_iter()
        .map(|seq| seq.coords)
        .collect();
    let intersector = Intersector::default().with_tolerance(*tolerance);
    check_rings(&mut rings, Operand::First, &intersector)?;
    Ok(rings_to_polygon(rings))
}

/// Polygon validity with the default tolerance.
pub trait IsValid {
    fn is_valid(&self) -> bool;
}

impl<T: GeoFloat> IsValid for Polygon<T> {
    fn is_valid(&self) -> bool {
        validate(self, &Tolerance::default()).is_ok()
    }
}

/// Closed copies of the shell and holes of `polygon`.
pub(crate) fn polygon_rings<T: GeoFloat>(polygon: &Polygon<T>) -> Vec<Vec<Coordinate<T>>> {
    parts_rings(polygon.exterior(), polygon.interiors())
}

pub(crate) fn parts_rings<T: GeoFloat>(
    shell: &LineString<T>,
    holes: &[LineString<T>],
) -> Vec<Vec<Coordinate<T>>> {
    std::iter::once(shell)
        .chain(holes)
        .map(closed_coords)
        .collect()
}

pub(crate) fn rings_to_polygon<T: GeoFloat>(rings: Vec<Vec<Coordinate<T>>>) -> Polygon<T> {
    let mut rings = rings.into_iter().map(LineString);
    let shell = rings.next().unwrap_or_else(|| LineString(vec![]));
    Polygon::new(shell, rings.collect())
}

/// Validate and orient prepared (snapped, de-duplicated, closed) rings of
/// one polygon; ring `0` is the shell.
pub(crate) fn check_rings<T: GeoFloat>(
    rings: &mut [Vec<Coordinate<T>>],
    operand: Operand,
    intersector: &Intersector<T>,
) -> Result<()> {
    let tolerance = intersector.tolerance();
    if rings.is_empty() {
        return Err(Error::DegenerateRing { operand, ring: 0 });
    }
    for (ring, coords) in rings.iter_mut().enumerate() {
        let area = signed_area(coords);
        if coords.len() < 4 || tolerance.is_zero_area(area) {
            return Err(Error::DegenerateRing { operand, ring });
        }
        let is_shell = ring == 0;
        if (area > T::zero()) != is_shell {
            coords.reverse();
        }
    }

    let edges = rings
        .iter()
        .enumerate()
        .flat_map(|(idx, ring)| sequence_edges(ring, idx, true));
    if let Some(isec) = intersector.sweep_edges(edges)?.first() {
        debug!(
            "{} polygon: segments {:?} and {:?} meet at {:?}",
            operand, isec.first, isec.second, isec.coord
        );
        return Err(Error::SelfIntersection {
            operand,
            x: crate::tolerance::to_f64(isec.coord.x),
            y: crate::tolerance::to_f64(isec.coord.y),
        });
    }

    // Rings are disjoint now, so one vertex decides the nesting.
    let (shell, holes) = rings.split_first().ok_or(Error::DegenerateRing { operand, ring: 0 })?;
    for (hole, coords) in holes.iter().enumerate() {
        let sample = coords[0];
        if ring_position(shell, sample, tolerance) != CoordPos::Inside {
            return Err(Error::HoleOutsideShell { operand, hole });
        }
        if let Some(other) = holes
            .iter()
            .enumerate()
            .position(|(other, ring)| other != hole && ring_position(ring, sample, tolerance) == CoordPos::Inside)
        {
            return Err(Error::NestedHole {
                operand,
                hole,
                other,
            });
        }
    }
    Ok(())
}
