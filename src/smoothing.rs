// src/smoothing.rs

/// Exponential smoothing of a scalar across frames.
///
/// With no previous value the current sample passes through unchanged
/// (bootstrap case). The coefficient biases toward the new sample as it
/// approaches 1.
pub fn smooth(previous: Option<f64>, current: f64, coefficient: f64) -> f64 {
    match previous {
        None => current,
        Some(prev) => current * coefficient + prev * (1.0 - coefficient),
    }
}

/// Stateful wrapper around `smooth` for per-frame annotation values
/// (curvature radius, lane offset).
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    previous: Option<f64>,
    coefficient: f64,
}

impl SignalSmoother {
    pub fn new(coefficient: f64) -> Self {
        Self {
            previous: None,
            coefficient,
        }
    }

    /// Feed a new sample and return the smoothed value.
    pub fn update(&mut self, current: f64) -> f64 {
        let value = smooth(self.previous, current, self.coefficient);
        self.previous = Some(value);
        value
    }

    /// Forget history (e.g. when the input sequence changes).
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_bootstrap_passes_through() {
        assert_eq!(smooth(None, 5.0, 0.4), 5.0);
    }

    #[test]
    fn test_smooth_blends_toward_current() {
        // 0.4·5 + 0.6·10 = 7
        assert_eq!(smooth(Some(10.0), 5.0, 0.4), 7.0);
    }

    #[test]
    fn test_signal_smoother_carries_state() {
        let mut smoother = SignalSmoother::new(0.4);
        assert_eq!(smoother.update(10.0), 10.0);
        assert_eq!(smoother.update(5.0), 7.0);
        smoother.reset();
        assert_eq!(smoother.update(3.0), 3.0);
    }
}
