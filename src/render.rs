// src/render.rs
//
// Boundary renderer: fill the lane area between the two fits in bird's-eye
// space, unwarp it into the camera view, alpha-blend it over the rectified
// frame, and burn in the offset/curvature annotations.

use crate::fitting::LanePolynomial;
use crate::perspective::PerspectiveTransform;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_polygon_mut, draw_text_mut};
use imageproc::point::Point;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub mod colors {
    use image::Rgb;

    pub const LANE_FILL: Rgb<u8> = Rgb([0, 255, 0]);
    pub const ANNOTATION: Rgb<u8> = Rgb([255, 0, 0]);
}

/// Values burned into the frame.
#[derive(Debug, Clone, Copy)]
pub struct Annotations {
    /// Signed lane-center offset in meters.
    pub offset_m: f64,
    /// Mean curvature radius of the two boundaries in meters.
    pub radius_m: f64,
}

impl Annotations {
    pub fn from_measurements(offset_m: f64, left_radius_m: f64, right_radius_m: f64) -> Self {
        Self {
            offset_m,
            radius_m: (left_radius_m + right_radius_m) / 2.0,
        }
    }
}

pub struct BoundaryRenderer {
    overlay_alpha: f32,
    font: Option<FontVec>,
}

impl BoundaryRenderer {
    /// `font_path` is optional: without a font the overlay still renders,
    /// only the burned-in text is skipped.
    pub fn new(overlay_alpha: f32, font_path: Option<&Path>) -> Self {
        let font = font_path.and_then(|path| match fs::read(path) {
            Ok(bytes) => match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    info!("annotation font loaded from {}", path.display());
                    Some(font)
                }
                Err(err) => {
                    warn!("invalid annotation font {}: {err}", path.display());
                    None
                }
            },
            Err(err) => {
                warn!("annotation font {} unreadable: {err}", path.display());
                None
            }
        });
        if font.is_none() {
            info!("no annotation font; frames will carry the overlay only");
        }
        Self {
            overlay_alpha,
            font,
        }
    }

    /// Produce a copy of the rectified frame with the lane-area overlay and
    /// text annotations. The input frame is not mutated.
    pub fn render(
        &self,
        undistorted: &RgbImage,
        transform: &PerspectiveTransform,
        left: &LanePolynomial,
        right: &LanePolynomial,
        annotations: &Annotations,
    ) -> RgbImage {
        let (width, height) = undistorted.dimensions();

        // Fill the area between the curves in bird's-eye space.
        let mut birds_eye = RgbImage::new(width, height);
        let polygon = lane_polygon(left, right, width, height);
        if polygon.len() >= 3 {
            draw_polygon_mut(&mut birds_eye, &polygon, colors::LANE_FILL);
        }

        // Map the filled region back into the camera view and blend.
        let unwarped = transform.unwarp(&birds_eye);
        let mut result = undistorted.clone();
        blend_saturating(&mut result, &unwarped, self.overlay_alpha);

        if let Some(font) = &self.font {
            let scale = PxScale::from(32.0);
            let offset_cm = (annotations.offset_m * 100.0).round();
            let radius_km = annotations.radius_m / 1000.0;
            draw_text_mut(
                &mut result,
                colors::ANNOTATION,
                430,
                630,
                scale,
                font,
                &format!("distance from center: {offset_cm:.0}cm"),
            );
            draw_text_mut(
                &mut result,
                colors::ANNOTATION,
                430,
                670,
                scale,
                font,
                &format!("radius of curvature: {radius_km:.2}km"),
            );
        }
        result
    }
}

/// Closed lane-area polygon: left curve top→bottom, right curve bottom→top,
/// sampled at every row. Open path (last point differs from first), with
/// consecutive duplicates removed.
fn lane_polygon(
    left: &LanePolynomial,
    right: &LanePolynomial,
    width: u32,
    height: u32,
) -> Vec<Point<i32>> {
    // Keep wildly diverged fits representable in i32 pixel space.
    let clamp_x = |x: f64| -> i32 { x.clamp(-2.0 * width as f64, 3.0 * width as f64) as i32 };

    let mut points: Vec<Point<i32>> = Vec::with_capacity(2 * height as usize);
    let mut push = |p: Point<i32>| {
        if points.last() != Some(&p) {
            points.push(p);
        }
    };
    for y in 0..height {
        push(Point::new(clamp_x(left.eval(y as f64)), y as i32));
    }
    for y in (0..height).rev() {
        push(Point::new(clamp_x(right.eval(y as f64)), y as i32));
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn blend_saturating(base: &mut RgbImage, overlay: &RgbImage, alpha: f32) {
    for (base_px, overlay_px) in base.pixels_mut().zip(overlay.pixels()) {
        for i in 0..3 {
            let blended = base_px[i] as f32 + overlay_px[i] as f32 * alpha;
            base_px[i] = blended.min(255.0) as u8;
        }
    }
}
