// src/error.rs

use std::fmt;
use thiserror::Error;

/// Which lane boundary a search or fit was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Errors produced by the lane tracking core. All of these are recoverable
/// at the driver level: a single bad frame must not abort video processing.
#[derive(Debug, Error)]
pub enum LaneError {
    /// A search collected zero pixels for one side. A quadratic fit over an
    /// empty point set is mathematically undefined, so the frame cannot
    /// produce a boundary for that side.
    #[error("no lane pixels attributed to the {side} boundary")]
    InsufficientLanePixels { side: Side },

    /// The leading coefficient is too close to zero for the curvature
    /// formula to be numerically stable (division by |2a|).
    #[error("degenerate fit: |a| = {a:.3e} below epsilon {epsilon:.1e}, curvature undefined")]
    DegenerateFit { a: f64, epsilon: f64 },

    /// The per-frame core was invoked before one-time camera calibration.
    #[error("camera calibration has not been loaded")]
    CalibrationUnavailable,

    /// The four perspective control points do not define an invertible
    /// homography (collinear or coincident points).
    #[error("perspective control points are degenerate")]
    InvalidPerspective,
}
