use std::fmt::{self, Display};

use thiserror::Error;

/// Identifies one of the two polygons of an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operand {
    First,
    Second,
}

impl Operand {
    /// The other operand.
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Operand::First => Operand::Second,
            Operand::Second => Operand::First,
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operand::First => "first",
            Operand::Second => "second",
        })
    }
}

/// Errors reported by the sweep and overlay algorithms.
///
/// Invalid input is reported as soon as it is detected. The last three
/// variants indicate an inconsistency found while running the algorithm;
/// they usually mean the input was malformed in a way the validation could
/// not see, or that the tolerance is badly calibrated for the input scale.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("tolerance must be finite and non-negative, got {value}")]
    InvalidTolerance { value: f64 },

    #[error("coordinate {index} of sequence {sequence} is not finite")]
    InvalidCoordinate { sequence: usize, index: usize },

    #[error("ring {ring} of the {operand} polygon has fewer than 3 distinct coordinates or no area")]
    DegenerateRing { operand: Operand, ring: usize },

    #[error("the {operand} polygon is not simple: its boundary meets itself at ({x}, {y})")]
    SelfIntersection { operand: Operand, x: f64, y: f64 },

    #[error("hole {hole} of the {operand} polygon is not inside its shell")]
    HoleOutsideShell { operand: Operand, hole: usize },

    #[error("hole {hole} of the {operand} polygon lies inside hole {other}")]
    NestedHole {
        operand: Operand,
        hole: usize,
        other: usize,
    },

    #[error("sweep exceeded the limit of {limit} events")]
    EventLimitExceeded { limit: usize },

    #[error("boundary traversal could not continue at ({x}, {y}) after {steps} steps")]
    TraversalIncomplete { x: f64, y: f64, steps: usize },

    #[error("result ring {ring} is a hole without an enclosing shell")]
    OrphanHole { ring: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
