// src/main.rs

mod calibration;
mod config;
mod curvature;
mod error;
mod fitting;
mod locator;
mod mask;
mod perspective;
mod pipeline;
mod render;
mod smoothing;
mod threshold;
mod tracker;
mod types;
mod validator;

use anyhow::{Context, Result};
use calibration::CalibrationParameters;
use curvature::WorldScale;
use error::LaneError;
use image::RgbImage;
use locator::ColdStartParams;
use perspective::PerspectiveTransform;
use pipeline::{LanePipeline, SearchParams};
use render::BoundaryRenderer;
use std::path::{Path, PathBuf};
use threshold::ThresholdMaskProducer;
use tracing::{error, info, warn};
use tracker::LaneTrackState;
use walkdir::WalkDir;

#[derive(Default)]
struct RunStats {
    total_frames: usize,
    cold_searches: usize,
    dropped_frames: usize,
}

fn main() -> Result<()> {
    let config = types::Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.as_str())
        .init();

    info!("🛣️  Lane Detection Pipeline Starting");

    let calibration = CalibrationParameters::load(&config.calibration.params_path)?;
    info!(
        "✓ Calibration loaded from {}",
        config.calibration.params_path
    );

    let transform = PerspectiveTransform::from_correspondences(
        config.perspective.source(),
        config.perspective.destination(),
    )?;
    info!("✓ Perspective transform derived");

    let search = SearchParams {
        cold: ColdStartParams {
            margin: config.search.cold_margin,
            window_count: config.search.window_count,
            min_pixels_to_recenter: config.search.min_pixels_to_recenter,
        },
        warm_margin: config.search.warm_margin,
        y_eval: config.search.y_eval,
    };
    let scale = WorldScale {
        ym_per_pix: config.world.ym_per_pix,
        xm_per_pix: config.world.xm_per_pix,
        curvature_epsilon: config.world.curvature_epsilon,
        max_radius_m: config.world.max_radius_m,
    };
    let renderer = BoundaryRenderer::new(
        config.render.overlay_alpha,
        config.render.font_path.as_deref().map(Path::new),
    );

    let mut pipeline = LanePipeline::new(
        transform,
        ThresholdMaskProducer::default(),
        search,
        scale,
        renderer,
        config.render.smoothing_coefficient,
    );
    pipeline.set_calibration(calibration);

    let frames = find_frame_files(&config.video.input_dir)?;
    if frames.is_empty() {
        error!("No frame images found in {}", config.video.input_dir);
        return Ok(());
    }
    info!("Found {} frame(s) to process", frames.len());

    std::fs::create_dir_all(&config.video.output_dir)?;

    let mut state = LaneTrackState::Cold;
    let mut last_annotated: Option<RgbImage> = None;
    let mut stats = RunStats::default();

    for path in &frames {
        stats.total_frames += 1;
        if !state.is_warm() {
            stats.cold_searches += 1;
        }

        let frame = image::open(path)
            .with_context(|| format!("decoding frame {}", path.display()))?
            .to_rgb8();

        let annotated = match pipeline.process_frame(&frame, state) {
            Ok((annotated, next_state)) => {
                state = next_state;
                last_annotated = Some(annotated.clone());
                annotated
            }
            Err(err @ LaneError::InsufficientLanePixels { .. }) => {
                // Explicit driver policy: re-emit the previous frame's
                // render and hold the previous fit for the next frame.
                stats.dropped_frames += 1;
                warn!("{}: {err}; reusing previous render", path.display());
                match &last_annotated {
                    Some(previous) => previous.clone(),
                    None => frame,
                }
            }
            Err(err) => return Err(err.into()),
        };

        let out_path = output_path(&config.video.output_dir, path);
        annotated
            .save(&out_path)
            .with_context(|| format!("writing {}", out_path.display()))?;
    }

    info!("\n✓ Run complete");
    info!("  Total frames: {}", stats.total_frames);
    info!("  Cold-start searches: {}", stats.cold_searches);
    info!(
        "  Dropped frames (no usable lane pixels): {} ({:.1}%)",
        stats.dropped_frames,
        100.0 * stats.dropped_frames as f64 / stats.total_frames.max(1) as f64
    );

    Ok(())
}

fn find_frame_files(input_dir: &str) -> Result<Vec<PathBuf>> {
    let frame_extensions = ["png", "jpg", "jpeg", "bmp", "PNG", "JPG", "JPEG", "BMP"];

    let mut frames = Vec::new();
    for entry in WalkDir::new(input_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if let Some(ext) = path.extension() {
            if frame_extensions.contains(&ext.to_str().unwrap_or("")) {
                frames.push(path.to_path_buf());
            }
        }
    }

    // Frames are processed in name order; the tracker depends on it.
    frames.sort();
    Ok(frames)
}

fn output_path(output_dir: &str, input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame.png".to_string());
    Path::new(output_dir).join(name)
}
