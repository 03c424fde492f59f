// src/pipeline.rs
//
// Per-frame orchestration: rectify → warp → mask → search (warm when a
// valid prior exists, cold otherwise) → plausibility check → curvature and
// offset → render.
//
// Cross-frame state is explicit: `process_frame` takes the current
// `LaneTrackState` and returns the next one alongside the annotated frame.
// The pipeline itself only holds immutable configuration plus the
// annotation smoothers.

use crate::calibration::CalibrationParameters;
use crate::curvature::{self, WorldScale};
use crate::error::LaneError;
use crate::locator::{self, ColdStartParams};
use crate::mask::MaskProducer;
use crate::perspective::PerspectiveTransform;
use crate::render::{Annotations, BoundaryRenderer};
use crate::smoothing::SignalSmoother;
use crate::tracker::{self, LaneTrackState};
use crate::validator;
use image::RgbImage;
use tracing::{debug, warn};

/// Search configuration for both tracking modes.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub cold: ColdStartParams,
    /// Margin band half-width around the previous fits, in pixels.
    pub warm_margin: f64,
    /// Row near the vehicle where fits are evaluated for validation and
    /// curvature.
    pub y_eval: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            cold: ColdStartParams::default(),
            warm_margin: 25.0,
            y_eval: 700.0,
        }
    }
}

pub struct LanePipeline<M: MaskProducer> {
    calibration: Option<CalibrationParameters>,
    perspective: PerspectiveTransform,
    mask_producer: M,
    search: SearchParams,
    scale: WorldScale,
    renderer: BoundaryRenderer,
    radius_smoother: SignalSmoother,
    offset_smoother: SignalSmoother,
}

impl<M: MaskProducer> LanePipeline<M> {
    pub fn new(
        perspective: PerspectiveTransform,
        mask_producer: M,
        search: SearchParams,
        scale: WorldScale,
        renderer: BoundaryRenderer,
        smoothing_coefficient: f64,
    ) -> Self {
        Self {
            calibration: None,
            perspective,
            mask_producer,
            search,
            scale,
            renderer,
            radius_smoother: SignalSmoother::new(smoothing_coefficient),
            offset_smoother: SignalSmoother::new(smoothing_coefficient),
        }
    }

    /// Install the one-time calibration result. Until this is called,
    /// `process_frame` fails with `CalibrationUnavailable`.
    pub fn set_calibration(&mut self, calibration: CalibrationParameters) {
        self.calibration = Some(calibration);
    }

    /// Process one raw frame, returning the annotated frame and the state
    /// to carry into the next frame.
    ///
    /// Failure policy is explicit: a warm search that loses the lanes
    /// retries cold on the same mask; if the cold search also finds
    /// nothing, `InsufficientLanePixels` propagates and the caller decides
    /// what to show (the bundled driver re-emits the previous frame and
    /// holds the previous state).
    pub fn process_frame(
        &mut self,
        frame: &RgbImage,
        state: LaneTrackState,
    ) -> Result<(RgbImage, LaneTrackState), LaneError> {
        let calibration = self
            .calibration
            .as_ref()
            .ok_or(LaneError::CalibrationUnavailable)?;

        let undistorted = calibration.undistort(frame);
        let warped = self.perspective.warp_to_birds_eye(&undistorted);
        let mask = self.mask_producer.produce(&warped);

        let (left, right) = match state {
            LaneTrackState::Warm {
                left: prev_left,
                right: prev_right,
            } => match tracker::track_lanes(&mask, self.search.warm_margin, &prev_left, &prev_right)
            {
                Ok(fits) => fits,
                Err(err @ LaneError::InsufficientLanePixels { .. }) => {
                    debug!("warm search lost the lanes ({err}); retrying cold");
                    locator::locate_lanes(&mask, &self.search.cold)?
                }
                Err(err) => return Err(err),
            },
            LaneTrackState::Cold => {
                debug!("cold-start lane search");
                locator::locate_lanes(&mask, &self.search.cold)?
            }
        };

        let (width, height) = undistorted.dimensions();
        let midpoint = width as f64 / 2.0;
        let next_state = if validator::needs_recalculation(&left, &right, self.search.y_eval, midpoint)
        {
            warn!("implausible fit (crossed boundaries); next frame restarts cold");
            LaneTrackState::Cold
        } else {
            LaneTrackState::Warm { left, right }
        };

        let left_radius =
            curvature::clamped_world_radius(&left, height, self.search.y_eval, &self.scale);
        let right_radius =
            curvature::clamped_world_radius(&right, height, self.search.y_eval, &self.scale);
        let offset = curvature::center_offset_m(
            &left,
            &right,
            (height - 1) as f64,
            midpoint,
            self.scale.xm_per_pix,
        );

        let annotations = Annotations {
            offset_m: self.offset_smoother.update(offset),
            radius_m: self
                .radius_smoother
                .update((left_radius + right_radius) / 2.0),
        };
        debug!(
            "frame measurements: offset {:.2}m, radii ({:.0}m, {:.0}m)",
            offset, left_radius, right_radius
        );

        let annotated = self
            .renderer
            .render(&undistorted, &self.perspective, &left, &right, &annotations);
        Ok((annotated, next_state))
    }
}
