//! Overlay of two polygons with holes.
//!
//! Both boundaries are swept together and every point where they meet
//! becomes a node, spliced into a doubly-linked vertex arena per polygon
//! and cross-linked to its counterpart. Each boundary edge is then
//! located relative to the other polygon, and the rings of a region are
//! traced by walking the selected edges, turning leftmost at nodes.
//!
//! All rings follow one orientation convention: shells counter-clockwise
//! and holes clockwise, so the interior always lies to the left.
use geo::{Coordinate, GeoFloat, LineString, Polygon};
use log::debug;

mod assemble;
mod boundary;
mod classify;
mod traverse;
pub use traverse::OverlayKind;

use self::{
    assemble::assemble,
    boundary::{Boundary, Graph},
};
use crate::{
    error::Operand,
    intersections::{prepare, Intersector},
    validate::{check_rings, parts_rings},
    Result, Tolerance,
};

/// The three regions of the overlay of two polygons.
///
/// Polygons are listed in the order their shells were traced.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay<T: GeoFloat> {
    internal: Vec<Polygon<T>>,
    external_first: Vec<Polygon<T>>,
    external_second: Vec<Polygon<T>>,
}

impl<T: GeoFloat> Overlay<T> {
    /// The region inside both polygons.
    pub fn internal_polygons(&self) -> &[Polygon<T>] {
        &self.internal
    }

    /// The region inside the first polygon only.
    pub fn external_first_polygons(&self) -> &[Polygon<T>] {
        &self.external_first
    }

    /// The region inside the second polygon only.
    pub fn external_second_polygons(&self) -> &[Polygon<T>] {
        &self.external_second
    }
}

/// Computes overlays of pairs of polygons.
///
/// ```rust
/// use geo::polygon;
/// use geo_overlay::Clipper;
///
/// let a = polygon![(x: 0., y: 0.), (x: 10., y: 0.), (x: 10., y: 10.), (x: 0., y: 10.)];
/// let b = polygon![(x: 5., y: 5.), (x: 15., y: 5.), (x: 15., y: 15.), (x: 5., y: 15.)];
/// let overlay = Clipper::default().clip(&a, &b).unwrap();
/// assert_eq!(overlay.internal_polygons().len(), 1);
/// assert_eq!(overlay.external_first_polygons().len(), 1);
/// assert_eq!(overlay.external_second_polygons().len(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Clipper<T: GeoFloat> {
    tolerance: Tolerance<T>,
    max_events: Option<usize>,
    compute_external: bool,
}

impl<T: GeoFloat> Default for Clipper<T> {
    fn default() -> Self {
        Clipper {
            tolerance: Tolerance::default(),
            max_events: None,
            compute_external: true,
        }
    }
}

impl<T: GeoFloat> Clipper<T> {
    pub fn with_tolerance(mut self, tolerance: Tolerance<T>) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Bound every sweep run by the clipper to `max_events` events.
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = Some(max_events);
        self
    }

    /// Whether to trace the external regions; when `false` both external
    /// lists of the result are empty.
    pub fn compute_external(mut self, compute_external: bool) -> Self {
        self.compute_external = compute_external;
        self
    }

    #[inline]
    pub fn tolerance(&self) -> &Tolerance<T> {
        &self.tolerance
    }

    /// Overlay `first` with `second`.
    pub fn clip(&self, first: &Polygon<T>, second: &Polygon<T>) -> Result<Overlay<T>> {
        self.clip_parts(first.exterior(), first.interiors(), second.exterior(), second.interiors())
    }

    /// Overlay of two polygons given as shells and holes.
    ///
    /// Input rings may be open or closed and oriented either way. In
    /// [`Error::InvalidCoordinate`](crate::Error::InvalidCoordinate),
    /// sequences are numbered shell of `first`, its holes, then shell of
    /// `second` and its holes.
    pub fn clip_parts(
        &self,
        shell_first: &LineString<T>,
        holes_first: &[LineString<T>],
        shell_second: &LineString<T>,
        holes_second: &[LineString<T>],
    ) -> Result<Overlay<T>> {
        let graph = self.graph(
            parts_rings(shell_first, holes_first),
            parts_rings(shell_second, holes_second),
        )?;
        let region = |kind| assemble(graph.trace(kind)?, &self.tolerance);

        let internal = region(OverlayKind::Internal)?;
        let (external_first, external_second) = if self.compute_external {
            (region(OverlayKind::ExternalFirst)?, region(OverlayKind::ExternalSecond)?)
        } else {
            (vec![], vec![])
        };
        debug!(
            "overlay: {} internal, {} external first, {} external second polygons",
            internal.len(),
            external_first.len(),
            external_second.len()
        );
        Ok(Overlay {
            internal,
            external_first,
            external_second,
        })
    }

    /// A single region of the overlay of `first` and `second`.
    pub fn overlay(
        &self,
        first: &Polygon<T>,
        second: &Polygon<T>,
        kind: OverlayKind,
    ) -> Result<Vec<Polygon<T>>> {
        let graph = self.graph(
            parts_rings(first.exterior(), first.interiors()),
            parts_rings(second.exterior(), second.interiors()),
        )?;
        assemble(graph.trace(kind)?, &self.tolerance)
    }

    /// Overlay many independent pairs in parallel.
    #[cfg(feature = "parallel")]
    pub fn clip_all(&self, pairs: &[(Polygon<T>, Polygon<T>)]) -> Vec<Result<Overlay<T>>>
    where
        T: Send + Sync,
    {
        use rayon::prelude::*;
        pairs.par_iter().map(|(a, b)| self.clip(a, b)).collect()
    }

    fn intersector(&self) -> Intersector<T> {
        let intersector = Intersector::default().with_tolerance(self.tolerance);
        match self.max_events {
            Some(limit) => intersector.with_max_events(limit),
            None => intersector,
        }
    }

    /// Snap both polygons together, validate them and build the
    /// classified boundary graph.
    fn graph(
        &self,
        first: Vec<Vec<Coordinate<T>>>,
        second: Vec<Vec<Coordinate<T>>>,
    ) -> Result<Graph<T>> {
        let refs: Vec<&[Coordinate<T>]> = first.iter().chain(&second).map(|r| &r[..]).collect();
        let mut rings: Vec<Vec<Coordinate<T>>> = prepare(&refs, &self.tolerance)?
            .into_iter()
            .map(|seq| seq.coords)
            .collect();
        let mut second = rings.split_off(first.len());
        let mut first = rings;

        let intersector = self.intersector();
        check_rings(&mut first, Operand::First, &intersector)?;
        check_rings(&mut second, Operand::Second, &intersector)?;

        let mut graph = Graph::new(
            Boundary::new(Operand::First, first),
            Boundary::new(Operand::Second, second),
            self.tolerance,
            self.max_events,
        )?;
        graph.classify(&self.tolerance);
        Ok(graph)
    }
}

/// Overlay of `first` and `second` with the default settings.
///
/// See [`Clipper::clip`].
pub fn clip<T: GeoFloat>(first: &Polygon<T>, second: &Polygon<T>) -> Result<Overlay<T>> {
    Clipper::default().clip(first, second)
}
