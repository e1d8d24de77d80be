use geo::{
    kernels::{Kernel, Orientation},
    Coordinate, GeoFloat,
};

use crate::{events::SweepPoint, Error, Result};

/// Epsilon used by [`Tolerance::default`].
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Tolerance used for every approximate geometric decision.
///
/// Two coordinates closer than `epsilon` are the same point, a
/// coordinate closer than `epsilon` to a segment lies on it, and a ring
/// whose area is at most `epsilon` is degenerate. Results of the sweep
/// and the overlay are sensitive to this value; it is passed explicitly
/// to every algorithm so that independent invocations may use different
/// tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance<T: GeoFloat> {
    epsilon: T,
}

impl<T: GeoFloat> Default for Tolerance<T> {
    fn default() -> Self {
        Tolerance {
            epsilon: T::from(DEFAULT_EPSILON).unwrap_or_else(T::epsilon),
        }
    }
}

impl<T: GeoFloat> Tolerance<T> {
    /// Create a tolerance, checking `epsilon` is finite and non-negative.
    pub fn new(epsilon: T) -> Result<Self> {
        if !epsilon.is_finite() || epsilon < T::zero() {
            return Err(Error::InvalidTolerance {
                value: to_f64(epsilon),
            });
        }
        Ok(Tolerance { epsilon })
    }

    /// Tolerance that only accepts exact matches.
    pub fn exact() -> Self {
        Tolerance { epsilon: T::zero() }
    }

    #[inline]
    pub fn epsilon(&self) -> T {
        self.epsilon
    }

    /// Whether two coordinates are within `epsilon` of each other.
    #[inline]
    pub fn near_eq(&self, a: Coordinate<T>, b: Coordinate<T>) -> bool {
        a == b || (a.x - b.x).hypot(a.y - b.y) <= self.epsilon
    }

    /// Whether `pt` lies on the closed segment `a`-`b`.
    pub fn on_segment(&self, pt: Coordinate<T>, a: Coordinate<T>, b: Coordinate<T>) -> bool {
        let in_box = pt.x >= a.x.min(b.x)
            && pt.x <= a.x.max(b.x)
            && pt.y >= a.y.min(b.y)
            && pt.y <= a.y.max(b.y);
        if in_box && T::Ker::orient2d(a, b, pt) == Orientation::Collinear {
            return true;
        }

        let d = b - a;
        let len2 = d.x * d.x + d.y * d.y;
        if len2 == T::zero() {
            return self.near_eq(pt, a);
        }
        let w = pt - a;
        let t = ((w.x * d.x + w.y * d.y) / len2).max(T::zero()).min(T::one());
        self.near_eq(a + d * t, pt)
    }

    /// Whether a (signed) ring area is too small to enclose anything.
    #[inline]
    pub fn is_zero_area(&self, area: T) -> bool {
        area.abs() <= self.epsilon
    }

    /// Merge coordinates within `epsilon` of each other onto a common
    /// representative (the lexicographically smallest of its cluster).
    ///
    /// All coordinates must be finite.
    pub(crate) fn snap(&self, coords: &mut [Coordinate<T>]) {
        if self.epsilon == T::zero() || coords.len() < 2 {
            return;
        }
        let mut order: Vec<usize> = (0..coords.len()).collect();
        order.sort_by(|&a, &b| SweepPoint::from(coords[a]).cmp(&SweepPoint::from(coords[b])));

        // Representatives are pushed in x order, so the candidates for a
        // coordinate form a suffix starting at `window`.
        let mut reps: Vec<Coordinate<T>> = Vec::new();
        let mut window = 0;
        for idx in order {
            let c = coords[idx];
            while window < reps.len() && reps[window].x < c.x - self.epsilon {
                window += 1;
            }
            match reps[window..].iter().find(|r| self.near_eq(**r, c)) {
                Some(rep) => coords[idx] = *rep,
                None => reps.push(c),
            }
        }
    }
}

/// Lossy conversion used when reporting coordinates in errors.
#[inline]
pub(crate) fn to_f64<T: GeoFloat>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
