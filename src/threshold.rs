// src/threshold.rs
//
// Default mask producer for the driver: bright-marking threshold on the
// luma channel, OR'd with a horizontal-gradient band. The Sobel-x band
// picks up markings that are distinct from the road without being bright
// (worn paint, strong side contrast).
//
// This is one usable implementation of the MaskProducer seam, not part of
// the core contract — swap in anything that turns a warped frame into a
// candidate mask.

use crate::mask::{BinaryMask, MaskProducer};
use image::RgbImage;
use imageproc::gradients::horizontal_sobel;

#[derive(Debug, Clone)]
pub struct ThresholdMaskProducer {
    /// Inclusive band on the luma channel (0..=255).
    pub luma_band: (u8, u8),
    /// Inclusive band on the max-normalized |Sobel-x| response (0..=255).
    pub gradient_band: (u8, u8),
}

impl Default for ThresholdMaskProducer {
    fn default() -> Self {
        Self {
            luma_band: (210, 255),
            gradient_band: (20, 80),
        }
    }
}

impl MaskProducer for ThresholdMaskProducer {
    fn produce(&self, warped: &RgbImage) -> BinaryMask {
        let gray = image::imageops::grayscale(warped);
        let sobel = horizontal_sobel(&gray);

        // Normalize |Sobel-x| to 0..=255 against the frame maximum.
        let max_abs = sobel
            .pixels()
            .map(|p| (p[0] as i32).abs())
            .max()
            .unwrap_or(0)
            .max(1);

        let (width, height) = warped.dimensions();
        BinaryMask::from_fn(width, height, |x, y| {
            let luma = gray.get_pixel(x, y)[0];
            if self.luma_band.0 <= luma && luma <= self.luma_band.1 {
                return true;
            }
            let scaled = ((sobel.get_pixel(x, y)[0] as i32).abs() * 255 / max_abs) as u8;
            self.gradient_band.0 <= scaled && scaled <= self.gradient_band.1
        })
    }
}
