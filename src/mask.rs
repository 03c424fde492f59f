// src/mask.rs
//
// Binary lane-candidate mask and the capability trait for producing one.
//
// The mask producer is an external collaborator: the core never depends on
// how candidate pixels were isolated (color thresholds, gradients, a learned
// segmenter...). Tests inject synthetic masks through the same seam.

use image::RgbImage;

/// Single-channel candidate-pixel grid, same spatial dimensions as the
/// warped frame it was produced from. 255 = lane candidate, 0 = background.
#[derive(Debug, Clone)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize)],
        }
    }

    /// Build a mask from a per-pixel predicate. Used heavily by tests.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    mask.set(x, y);
                }
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32) {
        self.data[(y as usize) * (self.width as usize) + x as usize] = 255;
    }

    #[inline]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.data[(y as usize) * (self.width as usize) + x as usize] == 255
    }

    /// Iterate all candidate pixel coordinates in row-major order.
    pub fn nonzero(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width;
        self.data.iter().enumerate().filter_map(move |(i, &v)| {
            if v == 255 {
                let i = i as u32;
                Some((i % width, i / width))
            } else {
                None
            }
        })
    }

    /// Count of candidate pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v == 255).count()
    }
}

/// External collaborator contract: warped bird's-eye color frame in,
/// candidate mask out.
pub trait MaskProducer {
    fn produce(&self, warped: &RgbImage) -> BinaryMask;
}
