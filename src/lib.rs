//! Plane-sweep intersection detection and polygon overlay.
//!
//! 1. [Segment Intersections](#segment-intersections)
//! 1. [Polygon Overlay](#polygon-overlay)
//!
//! # Segment Intersections
//!
//! This is an implementation of the [Bentley-Ottman] algorithm to
//! efficiently compute all intersections of a collection of line
//! strings. [`Intersector`] reports one coordinate per pair of segments
//! meeting at a point, ordered by coordinate; it is essentially a drop-in
//! replacement to using [`line_intersection`] over all pairs, but is
//! typically more efficient.
//!
//! ```rust
//! use geo::line_string;
//! use geo_overlay::intersections;
//!
//! let input = vec![
//!     line_string![(x: 1., y: 0.), (x: 0., y: 1.)],
//!     line_string![(x: 0., y: 0.5), (x: 1., y: 0.5)],
//!     line_string![(x: 0., y: 0.), (x: 1., y: 1.)],
//! ];
//! // All pairs intersect, at (0.5, 0.5)
//! assert_eq!(intersections(&input).unwrap().len(), 3);
//! ```
//!
//! For lower level uses, [`CrossingsIter`] iterates over every sweep
//! point, while also providing the segments that start, end or pass
//! through the last yielded point. Any type implementing [`Crossable`]
//! may be swept.
//!
//! # Polygon Overlay
//!
//! [`Clipper`] overlays two polygons with holes and returns the regions
//! inside both, inside the first only and inside the second only. The
//! [`BooleanOp`] trait exposes the usual boolean operations on
//! [`Polygon`](geo::Polygon) on top of it.
//!
//! ```rust
//! use geo::{polygon, prelude::Area};
//! use geo_overlay::BooleanOp;
//!
//! let a = polygon![(x: 0., y: 0.), (x: 10., y: 0.), (x: 10., y: 10.), (x: 0., y: 10.)];
//! let b = polygon![(x: 5., y: 5.), (x: 15., y: 5.), (x: 15., y: 15.), (x: 5., y: 15.)];
//! assert_eq!(a.intersection(&b).unwrap().unsigned_area(), 25.);
//! assert_eq!(a.union(&b).unwrap().unsigned_area(), 175.);
//! ```
//!
//! Every approximate decision uses an explicit [`Tolerance`]. Invalid
//! input is reported through [`Error`] before any overlay is computed.
//!
//! [Bentley-Ottman]: //en.wikipedia.org/wiki/Bentley%E2%80%93Ottmann_algorithm
//! [`line_intersection`]: geo::algorithm::line_intersection::line_intersection
mod error;
pub use error::{Error, Operand, Result};

mod tolerance;
pub use tolerance::{Tolerance, DEFAULT_EPSILON};

mod events;
pub use events::SweepPoint;

mod line_or_point;
pub use line_or_point::LineOrPoint;

mod active;

pub mod crossings;
pub use crossings::{Crossable, Crossing, CrossingsIter};

mod intersections;
pub use intersections::{intersections, Intersector, SegmentId, SegmentIntersection};

mod validate;
pub use validate::{validate, IsValid};

pub mod clip;
pub use clip::{clip, Clipper, Overlay, OverlayKind};

pub mod bops;
pub use bops::{BooleanOp, OpType};

#[cfg(test)]
#[path = "../benches/utils/random.rs"]
mod random;

pub(crate) mod utils;
