use geo::{
    coordinate_position::CoordPos,
    kernels::{Kernel, Orientation},
    Coordinate, GeoFloat,
};
use log::{debug, warn};

use super::boundary::{Boundary, Graph};
use crate::Tolerance;

/// Location of a boundary edge relative to the other polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Inside,
    Outside,
    /// Coincides with an edge of the other boundary running the same way.
    SharedSame,
    /// Coincides with an edge of the other boundary running the other way.
    SharedOpposite,
}

/// What happens to a boundary at a node, relative to the other polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Entry,
    Exit,
    /// Touches the other boundary without changing sides.
    Bounce,
    /// Starts, ends or continues a shared run of edges.
    Shared,
}

impl Transition {
    fn between(incoming: Location, outgoing: Location) -> Self {
        use Location::*;
        match (incoming, outgoing) {
            (SharedSame | SharedOpposite, _) | (_, SharedSame | SharedOpposite) => Transition::Shared,
            (Outside, Inside) => Transition::Entry,
            (Inside, Outside) => Transition::Exit,
            _ => Transition::Bounce,
        }
    }
}

/// Location of the edge `o -> x` relative to a polygon whose boundary
/// passes `p -> o -> n` with the interior on its left.
fn wedge_location<T: GeoFloat>(
    o: Coordinate<T>,
    x: Coordinate<T>,
    n: Coordinate<T>,
    p: Coordinate<T>,
) -> Location {
    if x == n {
        return Location::SharedSame;
    }
    if x == p {
        return Location::SharedOpposite;
    }
    let convex = T::Ker::orient2d(o, n, p) == Orientation::CounterClockwise;
    let left_of_out = T::Ker::orient2d(o, n, x) == Orientation::CounterClockwise;
    let right_of_in = T::Ker::orient2d(o, p, x) == Orientation::Clockwise;
    let inside = if convex {
        left_of_out && right_of_in
    } else {
        left_of_out || right_of_in
    };
    if inside {
        Location::Inside
    } else {
        Location::Outside
    }
}

/// Locate a ring that never meets `other` from one of its points.
fn ring_location<T: GeoFloat>(
    boundary: &Boundary<T>,
    ring: usize,
    other: &Boundary<T>,
    tolerance: &Tolerance<T>,
) -> Location {
    let two = T::one() + T::one();
    let sample_points = boundary.ring_cycle(ring).flat_map(|v| {
        let (a, b) = (boundary.coord(v), boundary.coord(boundary.next(v)));
        [a, (a + b) / two]
    });
    for sample in sample_points {
        match other.position(sample, tolerance) {
            CoordPos::Inside => return Location::Inside,
            CoordPos::Outside => return Location::Outside,
            CoordPos::OnBoundary => {}
        }
    }
    warn!(
        "ring {} of the {} polygon lies on the other boundary; treating it as outside",
        ring, boundary.operand
    );
    Location::Outside
}

impl<T: GeoFloat> Graph<T> {
    /// Set the location of every edge and the transition at every node.
    pub(crate) fn classify(&mut self, tolerance: &Tolerance<T>) {
        for side in 0..2 {
            let [a, b] = &mut self.boundaries;
            let (this, other) = if side == 0 { (a, &*b) } else { (b, &*a) };

            for ring in 0..this.ring_count() {
                let cycle: Vec<usize> = this.ring_cycle(ring).collect();
                let first_node = match cycle.iter().position(|&v| this.vertices[v].link.is_some()) {
                    Some(pos) => pos,
                    None => {
                        let location = ring_location(this, ring, other, tolerance);
                        debug!(
                            "{} ring {} does not meet the other boundary: {:?}",
                            this.operand, ring, location
                        );
                        for v in cycle {
                            this.vertices[v].location = location;
                        }
                        continue;
                    }
                };

                // Locations only change at nodes.
                let mut location = Location::Outside;
                for &v in cycle[first_node..].iter().chain(&cycle[..first_node]) {
                    if let Some(w) = this.vertices[v].link {
                        location = wedge_location(
                            this.coord(v),
                            this.coord(this.next(v)),
                            other.coord(other.next(w)),
                            other.coord(other.prev(w)),
                        );
                    }
                    this.vertices[v].location = location;
                }

                for &v in cycle.iter() {
                    if this.vertices[v].link.is_none() {
                        continue;
                    }
                    let incoming = this.vertices[this.prev(v)].location;
                    let outgoing = this.vertices[v].location;
                    this.vertices[v].transition = Some(Transition::between(incoming, outgoing));
                }
            }
        }

        for b in &self.boundaries {
            let count = |t| b.vertices.iter().filter(|v| v.transition == Some(t)).count();
            debug!(
                "{} boundary at {} nodes: {} entries, {} exits, {} bounces, {} shared",
                b.operand,
                self.nodes,
                count(Transition::Entry),
                count(Transition::Exit),
                count(Transition::Bounce),
                count(Transition::Shared),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clip::boundary::Boundary, crossings::tests::init_log, error::Operand};

    fn coords(pts: &[(f64, f64)]) -> Vec<Coordinate<f64>> {
        pts.iter().map(|&(x, y)| Coordinate { x, y }).collect()
    }

    fn graph(a: &[(f64, f64)], b: &[(f64, f64)]) -> Graph<f64> {
        init_log();
        let tolerance = Tolerance::default();
        let mut graph = Graph::new(
            Boundary::new(Operand::First, vec![coords(a)]),
            Boundary::new(Operand::Second, vec![coords(b)]),
            tolerance,
            None,
        )
        .unwrap();
        graph.classify(&tolerance);
        graph
    }

    /// `(x, y, location)` for every edge of ring 0, in order.
    fn locations(graph: &Graph<f64>, side: usize) -> Vec<(f64, f64, Location)> {
        let b = &graph.boundaries[side];
        b.ring_cycle(0)
            .map(|v| (b.coord(v).x, b.coord(v).y, b.vertices[v].location))
            .collect()
    }

    #[test]
    fn test_wedge() {
        let c = |x, y| Coordinate { x, y };
        // Convex corner of a counter-clockwise square at the origin.
        let (o, n, p) = (c(0., 0.), c(1., 0.), c(0., 1.));
        assert_eq!(wedge_location(o, c(1., 1.), n, p), Location::Inside);
        assert_eq!(wedge_location(o, c(-1., 1.), n, p), Location::Outside);
        assert_eq!(wedge_location(o, n, n, p), Location::SharedSame);
        assert_eq!(wedge_location(o, p, n, p), Location::SharedOpposite);
        // Reflex corner: the same wedge seen from the other side.
        assert_eq!(wedge_location(o, c(1., 1.), p, n), Location::Outside);
        assert_eq!(wedge_location(o, c(-1., -1.), p, n), Location::Inside);
    }

    #[test]
    fn test_overlapping_squares() {
        use Location::*;
        let g = graph(
            &[(0., 0.), (10., 0.), (10., 10.), (0., 10.), (0., 0.)],
            &[(5., 5.), (15., 5.), (15., 15.), (5., 15.), (5., 5.)],
        );
        assert_eq!(
            locations(&g, 0),
            vec![
                (0., 0., Outside),
                (10., 0., Outside),
                (10., 5., Inside),
                (10., 10., Inside),
                (5., 10., Outside),
                (0., 10., Outside),
            ]
        );
        assert_eq!(
            locations(&g, 1),
            vec![
                (5., 5., Inside),
                (10., 5., Outside),
                (15., 5., Outside),
                (15., 15., Outside),
                (5., 15., Outside),
                (5., 10., Inside),
            ]
        );
        let a = &g.boundaries[0];
        let transitions: Vec<_> = a.cycle().filter_map(|v| a.vertices[v].transition).collect();
        assert_eq!(transitions, vec![Transition::Entry, Transition::Exit]);
    }

    #[test]
    fn test_shared_edges() {
        use Location::*;
        // Two squares sharing the edge x = 10 in opposite directions.
        let g = graph(
            &[(0., 0.), (10., 0.), (10., 10.), (0., 10.), (0., 0.)],
            &[(10., 0.), (20., 0.), (20., 10.), (10., 10.), (10., 0.)],
        );
        assert_eq!(g.boundaries[0].vertices[1].location, SharedOpposite);
        assert_eq!(g.boundaries[1].vertices[3].location, SharedOpposite);
        assert_eq!(g.boundaries[0].vertices[0].location, Outside);

        // A square inside another, sharing part of the bottom edge.
        let g = graph(
            &[(0., 0.), (10., 0.), (10., 10.), (0., 10.), (0., 0.)],
            &[(2., 0.), (4., 0.), (4., 2.), (2., 2.), (2., 0.)],
        );
        assert_eq!(
            locations(&g, 1),
            vec![
                (2., 0., SharedSame),
                (4., 0., Inside),
                (4., 2., Inside),
                (2., 2., Inside),
            ]
        );
    }
}
