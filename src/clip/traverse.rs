use geo::{Coordinate, GeoFloat};
use log::{debug, trace};
use smallvec::SmallVec;

use super::{boundary::Graph, classify::Location};
use crate::{tolerance::to_f64, Error, Result};

/// Which region of the overlay to trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Inside both polygons.
    Internal,
    /// Inside the first polygon only.
    ExternalFirst,
    /// Inside the second polygon only.
    ExternalSecond,
    /// Inside either polygon.
    Union,
}

impl OverlayKind {
    /// The boundary whose edges are traced first.
    fn primary(self) -> usize {
        match self {
            OverlayKind::ExternalSecond => 1,
            _ => 0,
        }
    }

    /// Whether an edge of boundary `side` at `location` bounds the
    /// region, and in which direction (`true` for forward) it is walked
    /// with the region on its left.
    fn select(self, side: usize, location: Location) -> Option<bool> {
        use Location::*;
        use OverlayKind::*;
        match (self, side, location) {
            (Internal, 0, Inside | SharedSame) => Some(true),
            (Internal, 1, Inside) => Some(true),
            (ExternalFirst, 0, Outside | SharedOpposite) => Some(true),
            (ExternalFirst, 1, Inside) => Some(false),
            (ExternalSecond, 0, Inside) => Some(false),
            (ExternalSecond, 1, Outside | SharedOpposite) => Some(true),
            (Union, 0, Outside | SharedSame) => Some(true),
            (Union, 1, Outside) => Some(true),
            _ => None,
        }
    }
}

/// A selected edge: the edge from `vertex` to its successor on boundary
/// `side`, walked forward or backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    side: usize,
    vertex: usize,
    forward: bool,
}

struct Tracer<'a, T: GeoFloat> {
    graph: &'a Graph<T>,
    selected: [Vec<Option<bool>>; 2],
    visited: [Vec<bool>; 2],
    limit: usize,
}

impl<'a, T: GeoFloat> Tracer<'a, T> {
    fn new(graph: &'a Graph<T>, kind: OverlayKind) -> Self {
        let selected = [0, 1].map(|side| {
            graph.boundaries[side]
                .vertices
                .iter()
                .map(|v| kind.select(side, v.location))
                .collect::<Vec<_>>()
        });
        let visited = [0, 1].map(|side| vec![false; graph.boundaries[side].vertices.len()]);
        let limit = selected.iter().flatten().filter(|s| s.is_some()).count();
        Tracer {
            graph,
            selected,
            visited,
            limit,
        }
    }

    fn from(&self, step: Step) -> (usize, usize) {
        let b = &self.graph.boundaries[step.side];
        if step.forward {
            (step.side, step.vertex)
        } else {
            (step.side, b.next(step.vertex))
        }
    }

    fn to(&self, step: Step) -> (usize, usize) {
        let b = &self.graph.boundaries[step.side];
        if step.forward {
            (step.side, b.next(step.vertex))
        } else {
            (step.side, step.vertex)
        }
    }

    fn coord(&self, (side, vertex): (usize, usize)) -> Coordinate<T> {
        self.graph.boundaries[side].coord(vertex)
    }

    /// The unvisited selected edge starting at `vertex` of `side`, if any.
    fn step_at(&self, side: usize, vertex: usize, forward: bool) -> Option<Step> {
        let b = &self.graph.boundaries[side];
        let edge = if forward { vertex } else { b.prev(vertex) };
        (self.selected[side][edge] == Some(forward) && !self.visited[side][edge]).then(|| Step {
            side,
            vertex: edge,
            forward,
        })
    }

    /// Pick the continuation after `arrived` among the selected edges
    /// leaving its end (on both boundaries when it is a node): the
    /// leftmost turn wins.
    fn next_step(&self, arrived: Step) -> Option<Step> {
        let (side, vertex) = self.to(arrived);
        let mut ends: SmallVec<[(usize, usize); 2]> = SmallVec::new();
        ends.push((side, vertex));
        if let Some(link) = self.graph.boundaries[side].vertices[vertex].link {
            ends.push((1 - side, link));
        }
        let candidates: SmallVec<[Step; 4]> = ends
            .iter()
            .flat_map(|&(side, vertex)| {
                [
                    self.step_at(side, vertex, true),
                    self.step_at(side, vertex, false),
                ]
            })
            .flatten()
            .collect();
        if candidates.len() <= 1 {
            return candidates.first().copied();
        }

        let here = self.coord((side, vertex));
        let incoming = here - self.coord(self.from(arrived));
        candidates
            .iter()
            .copied()
            .map(|step| {
                let outgoing = self.coord(self.to(step)) - here;
                (turn_angle(incoming, outgoing), step)
            })
            .fold(None, |best: Option<(T, Step)>, (angle, step)| match best {
                Some((best_angle, _)) if best_angle >= angle => best,
                _ => Some((angle, step)),
            })
            .map(|(_, step)| step)
    }

    /// Walk from `start` until the boundary returns to its first
    /// coordinate.
    fn walk(&mut self, start: Step) -> Result<Vec<Coordinate<T>>> {
        let origin = self.coord(self.from(start));
        let mut ring = vec![origin];
        let mut step = start;
        let mut steps = 0;
        loop {
            self.visited[step.side][step.vertex] = true;
            let end = self.coord(self.to(step));
            ring.push(end);
            steps += 1;
            if end == origin {
                return Ok(ring);
            }
            if steps > self.limit {
                break;
            }
            step = match self.next_step(step) {
                Some(next) => next,
                None => break,
            };
        }
        let at = ring[ring.len() - 1];
        Err(Error::TraversalIncomplete {
            x: to_f64(at.x),
            y: to_f64(at.y),
            steps,
        })
    }
}

/// Signed angle turned from `incoming` to `outgoing`; a reversal ranks
/// below every other turn.
fn turn_angle<T: GeoFloat>(incoming: Coordinate<T>, outgoing: Coordinate<T>) -> T {
    let cross = incoming.x * outgoing.y - incoming.y * outgoing.x;
    let dot = incoming.x * outgoing.x + incoming.y * outgoing.y;
    if cross == T::zero() && dot < T::zero() {
        return T::neg_infinity();
    }
    cross.atan2(dot)
}

impl<T: GeoFloat> Graph<T> {
    /// Trace the closed boundary rings of the `kind` region.
    ///
    /// Walks start, in ring order of the primary boundary, where a run of
    /// selected edges begins, then at any selected edge left over, first
    /// on the primary boundary and then on the other one.
    pub(crate) fn trace(&self, kind: OverlayKind) -> Result<Vec<Vec<Coordinate<T>>>> {
        let mut tracer = Tracer::new(self, kind);
        let primary = kind.primary();
        let secondary = 1 - primary;
        let boundary = &self.boundaries[primary];

        let run_starts = boundary.cycle().filter(|&v| {
            tracer.selected[primary][v] == Some(true)
                && tracer.selected[primary][boundary.prev(v)] != Some(true)
        });
        let mut starts: Vec<Step> = run_starts
            .map(|vertex| Step {
                side: primary,
                vertex,
                forward: true,
            })
            .collect();
        for side in [primary, secondary] {
            let b = &self.boundaries[side];
            starts.extend(b.cycle().filter_map(|vertex| {
                tracer.selected[side][vertex].map(|forward| Step {
                    side,
                    vertex,
                    forward,
                })
            }));
        }

        let mut rings = vec![];
        for start in starts {
            if tracer.visited[start.side][start.vertex] {
                continue;
            }
            let ring = tracer.walk(start)?;
            trace!("{:?} ring from {:?}: {:?}", kind, start, ring);
            rings.push(ring);
        }
        debug!("{:?}: traced {} rings", kind, rings.len());
        Ok(rings)
    }
}
