//! One-pole parameter smoothing
//!
//! `y += (target - y) * coefficient`, run once per sample. Used to glide the
//! delay time so a knob jump doesn't produce a read-head click.

/// Per-sample glide coefficient for the delay time
pub const DELAY_SMOOTHING_COEFFICIENT: f32 = 0.00007;

/// One-pole smoother
#[derive(Debug, Clone, Copy)]
pub struct OnePole {
    value: f32,
    coefficient: f32,
}

impl OnePole {
    pub fn new(initial: f32, coefficient: f32) -> Self {
        Self {
            value: initial,
            coefficient: coefficient.clamp(0.0, 1.0),
        }
    }

    /// Advance one sample towards `target` and return the new value
    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.value += (target - self.value) * self.coefficient;
        self.value
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_step() {
        let mut smoother = OnePole::new(0.0, 0.5);
        assert_eq!(smoother.process(1.0), 0.5);
        assert_eq!(smoother.process(1.0), 0.75);
    }

    #[test]
    fn test_delay_glide_is_slow_and_monotonic() {
        let mut smoother = OnePole::new(36000.0, DELAY_SMOOTHING_COEFFICIENT);
        let mut previous = smoother.value();
        for _ in 0..4800 {
            let value = smoother.process(12000.0);
            assert!(value <= previous, "glide must not overshoot");
            previous = value;
        }
        // 100ms in, still well away from the target
        assert!(previous > 20000.0, "value after 100ms = {}", previous);
        assert!(previous < 36000.0);
    }

    #[test]
    fn test_converges() {
        let mut smoother = OnePole::new(0.0, DELAY_SMOOTHING_COEFFICIENT);
        for _ in 0..480_000 {
            smoother.process(100.0);
        }
        // f32 resolution stalls the last few hundredths
        assert!((smoother.value() - 100.0).abs() < 0.1);
    }
}
