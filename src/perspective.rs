// src/perspective.rs
//
// Road-plane ↔ bird's-eye perspective mapping. Built once per run from four
// manually measured point correspondences (road trapezoid → rectangle) and
// treated as immutable configuration.

use crate::error::LaneError;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};

/// A mutually inverse pair of plane projections: forward maps the road
/// plane into the top-down view used for fitting, inverse maps rendered
/// overlays back into the camera view.
#[derive(Clone)]
pub struct PerspectiveTransform {
    forward: Projection,
    inverse: Projection,
}

impl PerspectiveTransform {
    /// Derive the homography pair from four point correspondences.
    ///
    /// Fails with `InvalidPerspective` when the points are collinear or
    /// coincident (no invertible projection exists).
    pub fn from_correspondences(
        source: [(f32, f32); 4],
        destination: [(f32, f32); 4],
    ) -> Result<Self, LaneError> {
        let forward = Projection::from_control_points(source, destination)
            .ok_or(LaneError::InvalidPerspective)?;
        let inverse = forward.invert();
        Ok(Self { forward, inverse })
    }

    /// Map a road-plane point into bird's-eye space.
    pub fn map_forward(&self, point: (f32, f32)) -> (f32, f32) {
        self.forward * point
    }

    /// Map a bird's-eye point back into the camera view.
    pub fn map_inverse(&self, point: (f32, f32)) -> (f32, f32) {
        self.inverse * point
    }

    /// Warp a rectified frame into the top-down view.
    pub fn warp_to_birds_eye(&self, frame: &RgbImage) -> RgbImage {
        warp(frame, &self.forward, Interpolation::Bilinear, Rgb([0, 0, 0]))
    }

    /// Warp a bird's-eye image (e.g. the filled lane polygon) back into the
    /// camera view.
    pub fn unwarp(&self, birds_eye: &RgbImage) -> RgbImage {
        warp(
            birds_eye,
            &self.inverse,
            Interpolation::Bilinear,
            Rgb([0, 0, 0]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// The measured road trapezoid and its target rectangle (center 640).
    fn road_transform() -> PerspectiveTransform {
        PerspectiveTransform::from_correspondences(
            [
                (260.041, 681.833),
                (1044.35, 681.833),
                (685.594, 450.61),
                (593.598, 450.61),
            ],
            [(390.0, 700.0), (890.0, 700.0), (890.0, 0.0), (390.0, 0.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_control_points_map_exactly() {
        let t = road_transform();
        let (x, y) = t.map_forward((260.041, 681.833));
        assert_relative_eq!(x, 390.0, epsilon = 0.1);
        assert_relative_eq!(y, 700.0, epsilon = 0.1);
    }

    #[test]
    fn test_round_trip_within_pixel_tolerance() {
        let t = road_transform();
        for &p in &[
            (100.0f32, 200.0f32),
            (640.0, 460.0),
            (900.0, 700.0),
            (390.0, 0.0),
        ] {
            let there = t.map_forward(p);
            let back = t.map_inverse(there);
            assert_relative_eq!(back.0, p.0, epsilon = 0.5);
            assert_relative_eq!(back.1, p.1, epsilon = 0.5);
        }
    }

    #[test]
    fn test_degenerate_points_rejected() {
        // All four source points collinear.
        let result = PerspectiveTransform::from_correspondences(
            [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)],
            [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
        );
        assert!(matches!(result, Err(LaneError::InvalidPerspective)));
    }

    #[test]
    fn test_identity_warp_preserves_pixels() {
        let identity = PerspectiveTransform::from_correspondences(
            [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)],
            [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)],
        )
        .unwrap();
        // 4x4 block rather than a single pixel: bilinear sampling under a
        // numerically-near-identity projection must reproduce its interior.
        let img = RgbImage::from_fn(32, 32, |x, y| {
            if (10..14).contains(&x) && (20..24).contains(&y) {
                Rgb([200, 40, 40])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let warped = identity.warp_to_birds_eye(&img);
        let center = warped.get_pixel(11, 21);
        assert!(center[0] > 150, "block interior lost: {center:?}");
    }
}
