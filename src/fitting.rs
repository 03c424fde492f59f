// src/fitting.rs
//
// Least-squares quadratic fitting for lane boundaries: x = a·y² + b·y + c,
// with image y as the independent variable (lanes are near-vertical in the
// bird's-eye view, so x(y) is single-valued where y(x) is not).
//
// y is normalized to [0, 1] internally for conditioning, then the
// coefficients are mapped back to raw pixel space, so callers only ever see
// pixel-space polynomials.

/// One lane boundary in pixel space: x = a·y² + b·y + c over the vertical
/// extent of the rectified frame. Immutable once fit; every frame produces
/// a fresh instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanePolynomial {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl LanePolynomial {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    #[inline]
    pub fn eval(&self, y: f64) -> f64 {
        self.a * y * y + self.b * y + self.c
    }
}

/// Fit a quadratic to a pixel cluster of (x, y) points by solving the 3×3
/// normal equations.
///
/// Returns None when the fit is undefined: an empty cluster, fewer than
/// three distinct rows, or a singular system.
pub fn fit_quadratic(cluster: &[(f64, f64)]) -> Option<LanePolynomial> {
    if cluster.len() < 3 {
        return None;
    }

    let y_min = cluster.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = cluster.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let y_range = y_max - y_min;
    if !(y_range > 0.0) {
        return None; // all points on one row
    }

    // Accumulate normal-equation sums over normalized t = (y - y_min)/range.
    let s0 = cluster.len() as f64;
    let mut s1 = 0.0f64;
    let mut s2 = 0.0f64;
    let mut s3 = 0.0f64;
    let mut s4 = 0.0f64;
    let mut sx0 = 0.0f64;
    let mut sx1 = 0.0f64;
    let mut sx2 = 0.0f64;

    for &(x, y) in cluster {
        let t = (y - y_min) / y_range;
        let t2 = t * t;
        s1 += t;
        s2 += t2;
        s3 += t2 * t;
        s4 += t2 * t2;
        sx0 += x;
        sx1 += x * t;
        sx2 += x * t2;
    }

    //   | s4 s3 s2 | | A |   | sx2 |
    //   | s3 s2 s1 | | B | = | sx1 |
    //   | s2 s1 s0 | | C |   | sx0 |
    let (na, nb, nc) = solve_3x3([s4, s3, s2, s3, s2, s1, s2, s1, s0], [sx2, sx1, sx0])?;

    // Map normalized-space coefficients back to raw pixel y.
    let s = y_range;
    let a = na / (s * s);
    let b = nb / s - 2.0 * na * y_min / (s * s);
    let c = na * (y_min / s) * (y_min / s) - nb * y_min / s + nc;

    if a.is_finite() && b.is_finite() && c.is_finite() {
        Some(LanePolynomial::new(a, b, c))
    } else {
        None
    }
}

/// Re-fit a pixel-space polynomial in world units.
///
/// The axes scale anisotropically (meters-per-pixel differs between x and y),
/// which is not a valid affine remap of the coefficients, so the curve is
/// densely sampled over the frame's vertical extent, each coordinate scaled
/// by its axis factor, and the quadratic re-fit on the scaled samples.
pub fn fit_world(
    poly: &LanePolynomial,
    frame_height: u32,
    xm_per_pix: f64,
    ym_per_pix: f64,
) -> Option<LanePolynomial> {
    let samples: Vec<(f64, f64)> = (0..frame_height)
        .map(|y| {
            let y = y as f64;
            (poly.eval(y) * xm_per_pix, y * ym_per_pix)
        })
        .collect();
    fit_quadratic(&samples)
}

/// Solve a 3×3 linear system Ax = b via Gaussian elimination with partial
/// pivoting. Matrix is row-major. Returns None if singular.
fn solve_3x3(mat: [f64; 9], rhs: [f64; 3]) -> Option<(f64, f64, f64)> {
    let mut m = [
        [mat[0], mat[1], mat[2], rhs[0]],
        [mat[3], mat[4], mat[5], rhs[1]],
        [mat[6], mat[7], mat[8], rhs[2]],
    ];

    for col in 0..3 {
        let mut max_val = m[col][col].abs();
        let mut max_row = col;
        for row in (col + 1)..3 {
            if m[row][col].abs() > max_val {
                max_val = m[row][col].abs();
                max_row = row;
            }
        }

        if max_val < 1e-12 {
            return None;
        }

        if max_row != col {
            m.swap(col, max_row);
        }

        for row in (col + 1)..3 {
            let factor = m[row][col] / m[col][col];
            for j in col..4 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    if m[2][2].abs() < 1e-12 {
        return None;
    }
    let c = m[2][3] / m[2][2];
    let b = (m[1][3] - m[1][2] * c) / m[1][1];
    let a = (m[0][3] - m[0][2] * c - m[0][1] * b) / m[0][0];

    if a.is_finite() && b.is_finite() && c.is_finite() {
        Some((a, b, c))
    } else {
        None
    }
}
