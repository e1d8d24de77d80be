use std::{cmp::Ordering, fmt};

use geo::{coordinate_position::CoordPos, Coordinate, GeoFloat, Line};
use log::{debug, trace};
use smallvec::SmallVec;

use super::classify::{Location, Transition};
use crate::{error::Operand, utils::ring_position, Crossable, CrossingsIter, Result, Tolerance};

/// Whether a vertex comes from the input or was spliced in at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Original,
    Inserted,
}

/// A vertex of the doubly-linked boundary of one polygon.
///
/// `location` describes the edge from this vertex to `next`.
#[derive(Debug, Clone)]
pub(crate) struct Vertex<T: GeoFloat> {
    pub(crate) coord: Coordinate<T>,
    pub(crate) next: usize,
    pub(crate) prev: usize,
    pub(crate) ring: usize,
    pub(crate) role: Role,
    /// Vertex of the other boundary at the same node.
    pub(crate) link: Option<usize>,
    pub(crate) location: Location,
    pub(crate) transition: Option<Transition>,
}

/// Arena of the rings of one polygon, linked by index.
///
/// The `n` vertices of ring `r` initially occupy the indices
/// `ring_starts[r]..ring_starts[r] + n`; vertices spliced in later are
/// appended.
#[derive(Debug, Clone)]
pub(crate) struct Boundary<T: GeoFloat> {
    pub(crate) operand: Operand,
    pub(crate) vertices: Vec<Vertex<T>>,
    ring_starts: Vec<usize>,
    /// Closed coordinates of the rings, for point location.
    rings: Vec<Vec<Coordinate<T>>>,
}

impl<T: GeoFloat> Boundary<T> {
    /// Build from validated rings: closed, shell first and oriented.
    pub(crate) fn new(operand: Operand, rings: Vec<Vec<Coordinate<T>>>) -> Self {
        let mut vertices = Vec::with_capacity(rings.iter().map(Vec::len).sum());
        let mut ring_starts = Vec::with_capacity(rings.len());
        for (ring, coords) in rings.iter().enumerate() {
            let start = vertices.len();
            let n = coords.len() - 1;
            ring_starts.push(start);
            vertices.extend(coords[..n].iter().enumerate().map(|(i, coord)| Vertex {
                coord: *coord,
                next: start + (i + 1) % n,
                prev: start + (i + n - 1) % n,
                ring,
                role: Role::Original,
                link: None,
                location: Location::Outside,
                transition: None,
            }));
        }
        Boundary {
            operand,
            vertices,
            ring_starts,
            rings,
        }
    }

    #[inline]
    pub(crate) fn coord(&self, idx: usize) -> Coordinate<T> {
        self.vertices[idx].coord
    }

    #[inline]
    pub(crate) fn next(&self, idx: usize) -> usize {
        self.vertices[idx].next
    }

    #[inline]
    pub(crate) fn prev(&self, idx: usize) -> usize {
        self.vertices[idx].prev
    }

    pub(crate) fn ring_count(&self) -> usize {
        self.ring_starts.len()
    }

    /// Vertices of `ring` in boundary order, from its first input vertex.
    pub(crate) fn ring_cycle(&self, ring: usize) -> impl Iterator<Item = usize> + '_ {
        let start = self.ring_starts[ring];
        std::iter::successors(Some(start), move |&v| {
            let next = self.vertices[v].next;
            (next != start).then(|| next)
        })
    }

    /// Vertices of all rings in boundary order.
    pub(crate) fn cycle(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.ring_count()).flat_map(move |ring| self.ring_cycle(ring))
    }

    /// Position of `pt` relative to the polygon (shell minus holes).
    pub(crate) fn position(&self, pt: Coordinate<T>, tolerance: &Tolerance<T>) -> CoordPos {
        let mut rings = self.rings.iter();
        let shell = match rings.next() {
            Some(shell) => shell,
            None => return CoordPos::Outside,
        };
        match ring_position(shell, pt, tolerance) {
            CoordPos::Inside => {}
            pos => return pos,
        }
        for hole in rings {
            match ring_position(hole, pt, tolerance) {
                CoordPos::Outside => {}
                CoordPos::Inside => return CoordPos::Outside,
                CoordPos::OnBoundary => return CoordPos::OnBoundary,
            }
        }
        CoordPos::Inside
    }

    /// Insert a vertex at `coord` right after `after`.
    fn splice_after(&mut self, after: usize, coord: Coordinate<T>) -> usize {
        let idx = self.vertices.len();
        let next = self.vertices[after].next;
        let ring = self.vertices[after].ring;
        self.vertices.push(Vertex {
            coord,
            next,
            prev: after,
            ring,
            role: Role::Inserted,
            link: None,
            location: Location::Outside,
            transition: None,
        });
        self.vertices[after].next = idx;
        self.vertices[next].prev = idx;
        idx
    }
}

/// An input edge, as handed to the sweep.
#[derive(Clone, Copy)]
struct Edge<T: GeoFloat> {
    operand: Operand,
    start: usize,
    end: usize,
    line: Line<T>,
}

impl<T: GeoFloat> fmt::Debug for Edge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field(
                "geom",
                &format!(
                    "({:?},{:?}) -> ({:?},{:?})",
                    self.line.start.x, self.line.start.y, self.line.end.x, self.line.end.y
                ),
            )
            .field("operand", &self.operand)
            .field("start", &self.start)
            .finish()
    }
}

impl<T: GeoFloat> Crossable for Edge<T> {
    type Scalar = T;

    fn line(&self) -> Line<T> {
        self.line
    }
}

/// How a boundary touches a node.
#[derive(Debug, Clone, Copy)]
enum Touch<T: GeoFloat> {
    /// At an existing vertex.
    Vertex(usize),
    /// In the interior of the input edge starting at `start`, at
    /// parameter `t`.
    Edge { start: usize, t: T },
}

impl<T: GeoFloat> Touch<T> {
    fn of(edge: &Edge<T>, pt: Coordinate<T>) -> Self {
        if pt == edge.line.start {
            Touch::Vertex(edge.start)
        } else if pt == edge.line.end {
            Touch::Vertex(edge.end)
        } else {
            let d = edge.line.delta();
            let w = pt - edge.line.start;
            let t = (w.x * d.x + w.y * d.y) / (d.x * d.x + d.y * d.y);
            Touch::Edge {
                start: edge.start,
                t,
            }
        }
    }
}

/// The boundaries of both polygons of an overlay, linked at the nodes
/// where they meet.
#[derive(Debug, Clone)]
pub(crate) struct Graph<T: GeoFloat> {
    pub(crate) boundaries: [Boundary<T>; 2],
    pub(crate) nodes: usize,
}

impl<T: GeoFloat> Graph<T> {
    /// Sweep all edges of both polygons together and splice the nodes
    /// into both boundaries.
    pub(crate) fn new(
        first: Boundary<T>,
        second: Boundary<T>,
        tolerance: Tolerance<T>,
        max_events: Option<usize>,
    ) -> Result<Self> {
        let mut boundaries = [first, second];

        let edges: Vec<Edge<T>> = boundaries
            .iter()
            .flat_map(|b| {
                b.vertices.iter().enumerate().map(move |(start, v)| Edge {
                    operand: b.operand,
                    start,
                    end: v.next,
                    line: Line::new(v.coord, b.vertices[v.next].coord),
                })
            })
            .collect();

        // Per node, how each boundary touches it.
        let mut nodes: Vec<(Coordinate<T>, [Touch<T>; 2])> = vec![];
        let mut iter = CrossingsIter::new(edges.iter(), tolerance, max_events);
        while let Some(pt) = iter.try_next()? {
            let mut touches: [SmallVec<[Touch<T>; 4]>; 2] = Default::default();
            for c in iter.intersections() {
                touches[operand_index(c.crossable.operand)].push(Touch::of(c.crossable, pt));
            }
            if touches.iter().any(|t| t.is_empty()) {
                continue;
            }
            let eps = tolerance.epsilon();
            if nodes
                .iter()
                .rev()
                .take_while(|(c, _)| c.x >= pt.x - eps)
                .any(|(c, _)| tolerance.near_eq(*c, pt))
            {
                trace!("node at {:?} coincides with an earlier node", pt);
                continue;
            }
            trace!("node at {:?}: {:?}", pt, touches);
            let pick = |ts: &SmallVec<[Touch<T>; 4]>| {
                ts.iter()
                    .copied()
                    .find(|t| matches!(t, Touch::Vertex(_)))
                    .unwrap_or(ts[0])
            };
            nodes.push((pt, [pick(&touches[0]), pick(&touches[1])]));
        }

        // Resolve every node to one vertex per boundary, splicing new
        // vertices into edges in parametric order.
        let mut node_vertices = vec![[0usize; 2]; nodes.len()];
        for (side, boundary) in boundaries.iter_mut().enumerate() {
            let mut splices: Vec<(usize, T, usize)> = vec![];
            for (node, (_, touch)) in nodes.iter().enumerate() {
                match touch[side] {
                    Touch::Vertex(v) => node_vertices[node][side] = v,
                    Touch::Edge { start, t } => splices.push((start, t, node)),
                }
            }
            splices.sort_by(|a, b| {
                a.0.cmp(&b.0)
                    .then_with(|| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            });

            let mut last: Option<(usize, usize)> = None;
            for (start, _, node) in splices {
                let after = match last {
                    Some((edge, vertex)) if edge == start => vertex,
                    _ => start,
                };
                let vertex = boundary.splice_after(after, nodes[node].0);
                node_vertices[node][side] = vertex;
                last = Some((start, vertex));
            }
        }

        for [a, b] in node_vertices.iter().copied() {
            boundaries[0].vertices[a].link = Some(b);
            boundaries[1].vertices[b].link = Some(a);
        }

        let inserted = boundaries
            .iter()
            .flat_map(|b| b.vertices.iter())
            .filter(|v| v.role == Role::Inserted)
            .count();
        debug!(
            "overlay graph: {} nodes, {} inserted vertices",
            nodes.len(),
            inserted
        );
        Ok(Graph {
            boundaries,
            nodes: nodes.len(),
        })
    }
}

#[inline]
pub(crate) fn operand_index(operand: Operand) -> usize {
    match operand {
        Operand::First => 0,
        Operand::Second => 1,
    }
}
