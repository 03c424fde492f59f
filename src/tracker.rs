// src/tracker.rs
//
// Warm-start lane tracker and the cross-frame tracking state.
//
// With a previous frame's fits in hand there is no need for the windowed
// scan: every candidate pixel is attributed to a side if its x falls within
// a margin band around that side's previous polynomial, evaluated at the
// pixel's row. O(candidate pixels) per frame.

use crate::error::{LaneError, Side};
use crate::fitting::LanePolynomial;
use crate::locator::fit_side;
use crate::mask::BinaryMask;

/// The only state carried across frames. The two modes of the tracking
/// state machine are explicit: either no usable prior exists and the next
/// frame scans from scratch, or both boundaries have a prior fit. Tracking
/// one side warm and the other cold is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaneTrackState {
    Cold,
    Warm {
        left: LanePolynomial,
        right: LanePolynomial,
    },
}

impl LaneTrackState {
    pub fn is_warm(&self) -> bool {
        matches!(self, Self::Warm { .. })
    }
}

/// Search a margin band around the previous frame's fits and fit fresh
/// polynomials to whatever falls inside.
///
/// A pixel may in principle match both bands if they overlap; the bands are
/// attributed independently, so no precedence is needed (overlapping bands
/// do not occur in valid lane geometry). Fails with
/// `InsufficientLanePixels` when a band captures nothing.
pub fn track_lanes(
    mask: &BinaryMask,
    margin: f64,
    prev_left: &LanePolynomial,
    prev_right: &LanePolynomial,
) -> Result<(LanePolynomial, LanePolynomial), LaneError> {
    let mut left_cluster: Vec<(f64, f64)> = Vec::new();
    let mut right_cluster: Vec<(f64, f64)> = Vec::new();

    for (x, y) in mask.nonzero() {
        let xf = x as f64;
        let yf = y as f64;
        if (xf - prev_left.eval(yf)).abs() < margin {
            left_cluster.push((xf, yf));
        }
        if (xf - prev_right.eval(yf)).abs() < margin {
            right_cluster.push((xf, yf));
        }
    }

    let left = fit_side(&left_cluster, Side::Left)?;
    let right = fit_side(&right_cluster, Side::Right)?;
    Ok((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{locate_lanes, ColdStartParams};
    use approx::assert_relative_eq;

    fn band_mask(left_x: u32, right_x: u32) -> BinaryMask {
        BinaryMask::from_fn(1280, 720, |x, _| {
            x.abs_diff(left_x) <= 2 || x.abs_diff(right_x) <= 2
        })
    }

    #[test]
    fn test_warm_matches_cold_on_same_pixels() {
        let mask = band_mask(390, 890);
        let (cold_left, cold_right) = locate_lanes(&mask, &ColdStartParams::default()).unwrap();

        // Priors slightly off the true bands; the margin still captures them.
        let prev_left = LanePolynomial::new(0.0, 0.0, 395.0);
        let prev_right = LanePolynomial::new(0.0, 0.0, 885.0);
        let (warm_left, warm_right) = track_lanes(&mask, 25.0, &prev_left, &prev_right).unwrap();

        for y in (0..720).step_by(120) {
            let y = y as f64;
            assert_relative_eq!(warm_left.eval(y), cold_left.eval(y), epsilon = 1e-3);
            assert_relative_eq!(warm_right.eval(y), cold_right.eval(y), epsilon = 1e-3);
        }
    }

    #[test]
    fn test_band_attribution_respects_margin() {
        // A stray cluster 100px away from the left prior must not be
        // attributed to either side.
        let mask = BinaryMask::from_fn(1280, 720, |x, _| {
            x.abs_diff(390) <= 2 || x.abs_diff(890) <= 2 || x.abs_diff(250) <= 2
        });
        let prev_left = LanePolynomial::new(0.0, 0.0, 390.0);
        let prev_right = LanePolynomial::new(0.0, 0.0, 890.0);
        let (left, right) = track_lanes(&mask, 25.0, &prev_left, &prev_right).unwrap();
        assert_relative_eq!(left.eval(360.0), 390.0, epsilon = 1.0);
        assert_relative_eq!(right.eval(360.0), 890.0, epsilon = 1.0);
    }

    #[test]
    fn test_empty_band_fails() {
        let mask = band_mask(390, 890);
        // Prior far from any pixels.
        let prev_left = LanePolynomial::new(0.0, 0.0, 100.0);
        let prev_right = LanePolynomial::new(0.0, 0.0, 890.0);
        let err = track_lanes(&mask, 25.0, &prev_left, &prev_right).unwrap_err();
        assert!(matches!(
            err,
            LaneError::InsufficientLanePixels { side: Side::Left }
        ));
    }

    #[test]
    fn test_state_modes_are_exhaustive() {
        let state = LaneTrackState::Cold;
        assert!(!state.is_warm());
        let warm = LaneTrackState::Warm {
            left: LanePolynomial::new(0.0, 0.0, 390.0),
            right: LanePolynomial::new(0.0, 0.0, 890.0),
        };
        assert!(warm.is_warm());
    }
}
