// src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub calibration: CalibrationConfig,
    pub perspective: PerspectiveConfig,
    pub search: SearchConfig,
    pub world: WorldConfig,
    pub render: RenderConfig,
    pub video: VideoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// YAML file with the camera matrix and distortion coefficients
    /// produced by the external calibration step.
    pub params_path: String,
}

/// Four road-plane points (measured once on a straight-road frame) and the
/// rectangle they map to in bird's-eye space, in corresponding order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerspectiveConfig {
    pub source_points: [[f32; 2]; 4],
    pub dest_points: [[f32; 2]; 4],
}

impl PerspectiveConfig {
    pub fn source(&self) -> [(f32, f32); 4] {
        self.source_points.map(|p| (p[0], p[1]))
    }

    pub fn destination(&self) -> [(f32, f32); 4] {
        self.dest_points.map(|p| (p[0], p[1]))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub cold_margin: u32,
    pub warm_margin: f64,
    pub window_count: u32,
    pub min_pixels_to_recenter: usize,
    /// Row near the vehicle where fits are evaluated for validation and
    /// curvature.
    pub y_eval: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub ym_per_pix: f64,
    pub xm_per_pix: f64,
    pub curvature_epsilon: f64,
    pub max_radius_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub overlay_alpha: f32,
    /// TTF/OTF for burned-in annotations; without it frames carry the
    /// overlay only.
    pub font_path: Option<String>,
    pub smoothing_coefficient: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Directory of decoded frame images (video demux is outside the core).
    pub input_dir: String,
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}
