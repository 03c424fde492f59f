// src/validator.rs
//
// Plausibility guard over a frame's pair of fits. This is deliberately
// minimal: it catches the geometric impossibility of crossed/swapped lanes
// for a forward-facing single-lane tracker, and nothing else (no lane-width
// or parallelism checks).

use crate::fitting::LanePolynomial;

/// Evaluate both fits near the vehicle and decide whether the next frame
/// must re-search from a cold start.
///
/// Fires when the left base lands right of the frame midpoint or the right
/// base lands left of it, i.e. the boundaries have crossed or swapped sides.
pub fn needs_recalculation(
    left: &LanePolynomial,
    right: &LanePolynomial,
    y_eval: f64,
    midpoint: f64,
) -> bool {
    let left_base = left.eval(y_eval);
    let right_base = right.eval(y_eval);
    left_base > midpoint || right_base < midpoint
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(x: f64) -> LanePolynomial {
        LanePolynomial::new(0.0, 0.0, x)
    }

    #[test]
    fn test_left_base_past_midpoint_triggers() {
        assert!(needs_recalculation(
            &constant(700.0),
            &constant(900.0),
            700.0,
            640.0
        ));
    }

    #[test]
    fn test_right_base_before_midpoint_triggers() {
        assert!(needs_recalculation(
            &constant(300.0),
            &constant(600.0),
            700.0,
            640.0
        ));
    }

    #[test]
    fn test_plausible_fits_pass() {
        assert!(!needs_recalculation(
            &constant(600.0),
            &constant(700.0),
            700.0,
            640.0
        ));
    }

    #[test]
    fn test_evaluates_at_requested_row() {
        // Left boundary crosses the midpoint only near the bottom.
        let left = LanePolynomial::new(0.0, 1.0, 0.0); // x = y
        let right = constant(1000.0);
        assert!(needs_recalculation(&left, &right, 700.0, 640.0));
        assert!(!needs_recalculation(&left, &right, 300.0, 640.0));
    }
}
