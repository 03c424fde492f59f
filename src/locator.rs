// src/locator.rs
//
// Cold-start lane locator: sliding-window search over a binary mask with no
// prior frame information.
//
// A column histogram over the bottom quarter of the mask seeds one base
// x-position per half. The mask is then scanned bottom-up in equal-height
// bands; each side's window recenters on the mean x of its collected pixels
// whenever a band yields enough of them, otherwise the search continues
// straight up from the last good center. All collected pixels feed one
// quadratic fit per side.

use crate::error::{LaneError, Side};
use crate::fitting::{self, LanePolynomial};
use crate::mask::BinaryMask;
use tracing::debug;

/// Sliding-window search parameters.
#[derive(Debug, Clone)]
pub struct ColdStartParams {
    /// Half-width of each search window, in pixels.
    pub margin: u32,
    /// Number of equal-height horizontal bands.
    pub window_count: u32,
    /// Minimum pixels collected in a band before the window recenters.
    pub min_pixels_to_recenter: usize,
}

impl Default for ColdStartParams {
    fn default() -> Self {
        Self {
            margin: 50,
            window_count: 7,
            min_pixels_to_recenter: 20,
        }
    }
}

/// Locate both lane boundaries from scratch.
///
/// Fails with `InsufficientLanePixels` when a side accumulates zero pixels
/// across all bands (the fit would be undefined).
pub fn locate_lanes(
    mask: &BinaryMask,
    params: &ColdStartParams,
) -> Result<(LanePolynomial, LanePolynomial), LaneError> {
    let width = mask.width();
    let height = mask.height();
    let midpoint = width / 2;

    let histogram = bottom_quarter_histogram(mask);
    let left_base = argmax(&histogram[..midpoint as usize]) as i64;
    let right_base = argmax(&histogram[midpoint as usize..]) as i64 + midpoint as i64;

    debug!(
        left_base,
        right_base, "cold-start histogram bases (midpoint {})", midpoint
    );

    let window_height = height / params.window_count.max(1);
    let mut left_center = left_base;
    let mut right_center = right_base;
    let mut left_cluster: Vec<(f64, f64)> = Vec::new();
    let mut right_cluster: Vec<(f64, f64)> = Vec::new();

    for window in 0..params.window_count {
        let y_low = height - (window + 1) * window_height;
        let y_high = height - window * window_height;

        left_center = scan_band(
            mask,
            y_low,
            y_high,
            left_center,
            params.margin,
            params.min_pixels_to_recenter,
            &mut left_cluster,
        );
        right_center = scan_band(
            mask,
            y_low,
            y_high,
            right_center,
            params.margin,
            params.min_pixels_to_recenter,
            &mut right_cluster,
        );
    }

    debug!(
        left_pixels = left_cluster.len(),
        right_pixels = right_cluster.len(),
        "cold-start pixel accumulation complete"
    );

    let left = fit_side(&left_cluster, Side::Left)?;
    let right = fit_side(&right_cluster, Side::Right)?;
    Ok((left, right))
}

pub(crate) fn fit_side(cluster: &[(f64, f64)], side: Side) -> Result<LanePolynomial, LaneError> {
    fitting::fit_quadratic(cluster).ok_or(LaneError::InsufficientLanePixels { side })
}

/// Collect mask pixels inside one window band and return the (possibly
/// recentered) x-center for the next band up.
fn scan_band(
    mask: &BinaryMask,
    y_low: u32,
    y_high: u32,
    center: i64,
    margin: u32,
    min_pixels_to_recenter: usize,
    cluster: &mut Vec<(f64, f64)>,
) -> i64 {
    let x_low = (center - margin as i64).max(0) as u32;
    let x_high = ((center + margin as i64).max(0) as u32).min(mask.width());

    let mut collected = 0usize;
    let mut sum_x = 0.0f64;
    for y in y_low..y_high {
        for x in x_low..x_high {
            if mask.is_set(x, y) {
                cluster.push((x as f64, y as f64));
                sum_x += x as f64;
                collected += 1;
            }
        }
    }

    // An empty or sparse band keeps the previous center: the search
    // continues straight up instead of drifting on occluded markings.
    if collected >= min_pixels_to_recenter {
        (sum_x / collected as f64).round() as i64
    } else {
        center
    }
}

/// Column histogram of candidate pixels over the bottom quarter of the mask.
fn bottom_quarter_histogram(mask: &BinaryMask) -> Vec<u32> {
    let width = mask.width();
    let height = mask.height();
    let mut histogram = vec![0u32; width as usize];
    for y in (height * 3 / 4)..height {
        for x in 0..width {
            if mask.is_set(x, y) {
                histogram[x as usize] += 1;
            }
        }
    }
    histogram
}

/// Index of the first maximum, matching argmax-on-ties-takes-first.
fn argmax(values: &[u32]) -> usize {
    let mut best = 0usize;
    let mut best_val = 0u32;
    for (i, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two vertical bands, 5px wide, centered at the given columns.
    fn vertical_band_mask(width: u32, height: u32, left_x: u32, right_x: u32) -> BinaryMask {
        BinaryMask::from_fn(width, height, |x, y| {
            let _ = y;
            x.abs_diff(left_x) <= 2 || x.abs_diff(right_x) <= 2
        })
    }

    #[test]
    fn test_locates_straight_vertical_bands() {
        let mask = vertical_band_mask(1280, 720, 390, 890);
        let params = ColdStartParams::default();
        let (left, right) = locate_lanes(&mask, &params).unwrap();

        for y in (0..720).step_by(20) {
            let y = y as f64;
            assert!(
                (left.eval(y) - 390.0).abs() <= params.margin as f64,
                "left fit strayed at y={}: {}",
                y,
                left.eval(y)
            );
            assert!(
                (right.eval(y) - 890.0).abs() <= params.margin as f64,
                "right fit strayed at y={}: {}",
                y,
                right.eval(y)
            );
        }
    }

    #[test]
    fn test_follows_curved_band() {
        // Left boundary sweeps ~90px across the frame height; right stays
        // vertical. Window recentering must follow the sweep.
        let curve = |y: u32| 350.0 + 90.0 * (y as f64 / 719.0) * (y as f64 / 719.0);
        let mask = BinaryMask::from_fn(1280, 720, |x, y| {
            (x as f64 - curve(y)).abs() <= 2.0 || x.abs_diff(900) <= 2
        });
        let (left, _right) = locate_lanes(&mask, &ColdStartParams::default()).unwrap();
        for y in (0..720).step_by(60) {
            assert!(
                (left.eval(y as f64) - curve(y)).abs() <= 15.0,
                "curved left fit off at y={}: {} vs {}",
                y,
                left.eval(y as f64),
                curve(y)
            );
        }
    }

    #[test]
    fn test_empty_side_fails_with_insufficient_pixels() {
        // Only a right-half band present.
        let mask = BinaryMask::from_fn(1280, 720, |x, _| x.abs_diff(890) <= 2);
        let err = locate_lanes(&mask, &ColdStartParams::default()).unwrap_err();
        match err {
            LaneError::InsufficientLanePixels { side } => assert_eq!(side, Side::Left),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sparse_band_keeps_center() {
        // Band present only in the bottom half; search must continue
        // straight up without failing and the fit stays near the band.
        let mask = BinaryMask::from_fn(1280, 720, |x, y| {
            y >= 360 && (x.abs_diff(390) <= 2 || x.abs_diff(890) <= 2)
        });
        let (left, right) = locate_lanes(&mask, &ColdStartParams::default()).unwrap();
        assert!((left.eval(700.0) - 390.0).abs() <= 10.0);
        assert!((right.eval(700.0) - 890.0).abs() <= 10.0);
    }

    #[test]
    fn test_argmax_takes_first_of_ties() {
        assert_eq!(argmax(&[0, 3, 3, 1]), 1);
        assert_eq!(argmax(&[0, 0, 0]), 0);
    }
}
