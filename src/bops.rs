//! Boolean operations on polygons, on top of [`Clipper`].
use geo::{GeoFloat, MultiPolygon, Polygon};

use crate::{Clipper, OverlayKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpType {
    Intersection,
    Union,
    Difference,
    Xor,
}

/// Boolean operations between two polygons with the default tolerance.
///
/// Inputs are validated first; see [`validate`](crate::validate) for
/// what is rejected.
pub trait BooleanOp<T: GeoFloat, Rhs = Self> {
    fn boolean(&self, rhs: &Rhs, ty: OpType) -> Result<MultiPolygon<T>>;

    fn intersection(&self, rhs: &Rhs) -> Result<MultiPolygon<T>> {
        self.boolean(rhs, OpType::Intersection)
    }

    fn union(&self, rhs: &Rhs) -> Result<MultiPolygon<T>> {
        self.boolean(rhs, OpType::Union)
    }

    fn difference(&self, rhs: &Rhs) -> Result<MultiPolygon<T>> {
        self.boolean(rhs, OpType::Difference)
    }

    fn xor(&self, rhs: &Rhs) -> Result<MultiPolygon<T>> {
        self.boolean(rhs, OpType::Xor)
    }
}

impl<T: GeoFloat> BooleanOp<T> for Polygon<T> {
    fn boolean(&self, rhs: &Polygon<T>, ty: OpType) -> Result<MultiPolygon<T>> {
        let clipper = Clipper::default();
        let polygons = match ty {
            OpType::Intersection => clipper.overlay(self, rhs, OverlayKind::Internal)?,
            OpType::Union => clipper.overlay(self, rhs, OverlayKind::Union)?,
            OpType::Difference => clipper.overlay(self, rhs, OverlayKind::ExternalFirst)?,
            OpType::Xor => {
                let overlay = clipper.clip(self, rhs)?;
                overlay
                    .external_first_polygons()
                    .iter()
                    .chain(overlay.external_second_polygons())
                    .cloned()
                    .collect()
            }
        };
        Ok(MultiPolygon(polygons))
    }
}
