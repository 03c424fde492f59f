// src/curvature.rs
//
// World-space curvature radius and lane-center offset.
//
// Pixel-space coefficients cannot be remapped directly because the two axes
// scale by different meters-per-pixel factors; each boundary is re-fit on
// rescaled dense samples (see fitting::fit_world), then the standard
// osculating-circle radius for a quadratic is evaluated near the vehicle.

use crate::error::LaneError;
use crate::fitting::{self, LanePolynomial};
use tracing::debug;

/// Pixel-to-world conversion and curvature guards.
#[derive(Debug, Clone)]
pub struct WorldScale {
    /// Meters per pixel along the vertical (travel) axis.
    pub ym_per_pix: f64,
    /// Meters per pixel along the horizontal axis.
    pub xm_per_pix: f64,
    /// |a| below this is a degenerate (straight) fit for the radius formula.
    pub curvature_epsilon: f64,
    /// Radius reported for degenerate fits instead of ∞/NaN.
    pub max_radius_m: f64,
}

impl Default for WorldScale {
    fn default() -> Self {
        Self {
            ym_per_pix: 30.0 / 720.0,
            xm_per_pix: 3.7 / 700.0,
            curvature_epsilon: 1e-6,
            max_radius_m: 100_000.0,
        }
    }
}

/// Radius of the osculating circle of `x = a·y² + b·y + c` at `y_m`
/// (world units): R = (1 + (2ay + b)²)^1.5 / |2a|.
///
/// Fails with `DegenerateFit` when |a| is below epsilon; dividing there
/// would blow up toward ∞ for what is simply a straight boundary.
pub fn radius_at(poly: &LanePolynomial, y_m: f64, epsilon: f64) -> Result<f64, LaneError> {
    if poly.a.abs() < epsilon {
        return Err(LaneError::DegenerateFit {
            a: poly.a,
            epsilon,
        });
    }
    let slope = 2.0 * poly.a * y_m + poly.b;
    Ok((1.0 + slope * slope).powf(1.5) / (2.0 * poly.a).abs())
}

/// World-space curvature radius of a pixel-space boundary, evaluated at the
/// pixel row `y_eval` (converted to meters internally).
pub fn world_radius(
    poly: &LanePolynomial,
    frame_height: u32,
    y_eval: f64,
    scale: &WorldScale,
) -> Result<f64, LaneError> {
    let world = fitting::fit_world(poly, frame_height, scale.xm_per_pix, scale.ym_per_pix)
        .ok_or(LaneError::DegenerateFit {
            a: poly.a,
            epsilon: scale.curvature_epsilon,
        })?;
    radius_at(&world, y_eval * scale.ym_per_pix, scale.curvature_epsilon)
}

/// `world_radius` with the degenerate case clamped to `max_radius_m`, so a
/// straight road annotates as a very large radius rather than propagating
/// an error into the render path.
pub fn clamped_world_radius(
    poly: &LanePolynomial,
    frame_height: u32,
    y_eval: f64,
    scale: &WorldScale,
) -> f64 {
    match world_radius(poly, frame_height, y_eval, scale) {
        Ok(radius) => radius.min(scale.max_radius_m),
        Err(err) => {
            debug!("curvature clamped to {}m: {err}", scale.max_radius_m);
            scale.max_radius_m
        }
    }
}

/// Signed offset of the vehicle from the lane center, in meters. Computed
/// in pixel space at the row nearest the vehicle, then scaled. Positive
/// means the lane center lies right of the frame center.
pub fn center_offset_m(
    left: &LanePolynomial,
    right: &LanePolynomial,
    y_bottom: f64,
    frame_center_x: f64,
    xm_per_pix: f64,
) -> f64 {
    let lane_center = (left.eval(y_bottom) + right.eval(y_bottom)) / 2.0;
    (lane_center - frame_center_x) * xm_per_pix
}
