// src/calibration.rs
//
// Camera intrinsics and lens-distortion correction.
//
// Computing the parameters is a one-time preprocessing step done by an
// external corner-detection tool; this module only defines the provider
// contract, the on-disk parameter form, and the per-frame undistortion
// remap that rectifies frames before warping.

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// External collaborator contract: a calibration image set plus the inner
/// corner pattern dimensions yield intrinsics once per run.
pub trait CalibrationProvider {
    fn calibrate(
        &self,
        images: &[RgbImage],
        pattern_size: (u32, u32),
    ) -> Result<CalibrationParameters>;
}

/// Camera intrinsic matrix plus Brown–Conrady distortion coefficients
/// (k1, k2, p1, p2, k3). Immutable process-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationParameters {
    pub camera_matrix: [[f64; 3]; 3],
    pub dist_coeffs: [f64; 5],
}

impl CalibrationParameters {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading calibration parameters from {}", path.display()))?;
        let params: Self = serde_yaml::from_str(&contents)?;
        Ok(params)
    }

    /// Parameters describing an ideal pinhole camera: undistortion becomes
    /// the identity. Useful for synthetic-frame tests.
    pub fn ideal() -> Self {
        Self {
            camera_matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            dist_coeffs: [0.0; 5],
        }
    }

    fn intrinsics(&self) -> Matrix3<f64> {
        Matrix3::from_row_slice(&[
            self.camera_matrix[0][0],
            self.camera_matrix[0][1],
            self.camera_matrix[0][2],
            self.camera_matrix[1][0],
            self.camera_matrix[1][1],
            self.camera_matrix[1][2],
            self.camera_matrix[2][0],
            self.camera_matrix[2][1],
            self.camera_matrix[2][2],
        ])
    }

    /// Remove lens distortion from a raw frame.
    ///
    /// For each output pixel, the undistorted normalized coordinates are
    /// pushed through the distortion model to find where that ray landed in
    /// the raw frame, which is then sampled bilinearly. Out-of-frame
    /// samples are black.
    pub fn undistort(&self, frame: &RgbImage) -> RgbImage {
        let k = self.intrinsics();
        let (fx, fy) = (k[(0, 0)], k[(1, 1)]);
        let (cx, cy) = (k[(0, 2)], k[(1, 2)]);
        let [k1, k2, p1, p2, k3] = self.dist_coeffs;

        let (width, height) = frame.dimensions();
        let mut out = RgbImage::new(width, height);

        for v in 0..height {
            for u in 0..width {
                let x = (u as f64 - cx) / fx;
                let y = (v as f64 - cy) / fy;
                let r2 = x * x + y * y;
                let radial = 1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2;
                let xd = x * radial + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
                let yd = y * radial + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;
                let src_u = fx * xd + cx;
                let src_v = fy * yd + cy;
                out.put_pixel(u, v, sample_bilinear(frame, src_u, src_v));
            }
        }
        out
    }
}

fn sample_bilinear(frame: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let (width, height) = frame.dimensions();
    if x < 0.0 || y < 0.0 || x > (width - 1) as f64 || y > (height - 1) as f64 {
        return Rgb([0, 0, 0]);
    }
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let dx = x - x0 as f64;
    let dy = y - y0 as f64;

    let p00 = frame.get_pixel(x0, y0);
    let p10 = frame.get_pixel(x1, y0);
    let p01 = frame.get_pixel(x0, y1);
    let p11 = frame.get_pixel(x1, y1);

    let mut channels = [0u8; 3];
    for i in 0..3 {
        let top = p00[i] as f64 * (1.0 - dx) + p10[i] as f64 * dx;
        let bottom = p01[i] as f64 * (1.0 - dx) + p11[i] as f64 * dx;
        channels[i] = (top * (1.0 - dy) + bottom * dy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ideal_camera_undistort_is_identity() {
        let params = CalibrationParameters::ideal();
        let mut frame = RgbImage::new(16, 16);
        frame.put_pixel(3, 7, Rgb([10, 200, 30]));
        frame.put_pixel(12, 2, Rgb([99, 1, 255]));
        let out = params.undistort(&frame);
        assert_eq!(out, frame);
    }

    #[test]
    fn test_barrel_distortion_moves_edge_pixels() {
        // Positive k1 pulls edge samples outward; the corner region of the
        // output must no longer equal the input corner.
        let params = CalibrationParameters {
            camera_matrix: [[100.0, 0.0, 32.0], [0.0, 100.0, 32.0], [0.0, 0.0, 1.0]],
            dist_coeffs: [0.4, 0.0, 0.0, 0.0, 0.0],
        };
        let frame = RgbImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let out = params.undistort(&frame);
        // The vertical black/white boundary at x=32 runs through the
        // principal point and stays put; a corner pixel shifts.
        assert_eq!(out.get_pixel(32, 32), frame.get_pixel(32, 32));
        assert_ne!(out, frame);
    }

    #[test]
    fn test_parameters_yaml_round_trip() {
        let params = CalibrationParameters {
            camera_matrix: [
                [1150.0, 0.0, 640.0],
                [0.0, 1150.0, 360.0],
                [0.0, 0.0, 1.0],
            ],
            dist_coeffs: [-0.24, 0.05, 0.0, 0.0, -0.01],
        };
        let yaml = serde_yaml::to_string(&params).unwrap();
        let back: CalibrationParameters = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.camera_matrix, params.camera_matrix);
        assert_eq!(back.dist_coeffs, params.dist_coeffs);
    }
}
