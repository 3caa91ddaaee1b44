//! Fractional mono delay line
//!
//! Fixed-capacity circular buffer with a linearly interpolated read head.
//! `read()` before `write()` in the same sample gives a delay of exactly
//! `delay` samples.

use crate::types::MAX_DELAY_SAMPLES;

pub struct DelayLine {
    buffer: Box<[f32]>,
    write_pos: usize,
    /// Whole part of the delay in samples
    delay_int: usize,
    /// Fractional part of the delay
    delay_frac: f32,
}

impl DelayLine {
    /// Delay line with the unit's maximum delay capacity
    pub fn new() -> Self {
        Self::with_capacity(MAX_DELAY_SAMPLES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            buffer: vec![0.0; capacity].into_boxed_slice(),
            write_pos: 0,
            delay_int: 1,
            delay_frac: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Current delay in (fractional) samples
    pub fn delay(&self) -> f32 {
        self.delay_int as f32 + self.delay_frac
    }

    /// Set the delay in samples, clamped to `[1, capacity - 1]`
    #[inline]
    pub fn set_delay(&mut self, samples: f32) {
        let max = (self.buffer.len() - 1) as f32;
        let samples = if samples.is_finite() {
            samples.clamp(1.0, max)
        } else {
            1.0
        };
        let whole = samples.floor();
        self.delay_int = whole as usize;
        self.delay_frac = samples - whole;
    }

    /// Interpolated sample `delay` writes ago
    #[inline]
    pub fn read(&self) -> f32 {
        let len = self.buffer.len();
        // delay_int <= len - 1, so neither index underflows
        let idx_a = (self.write_pos + len - self.delay_int) % len;
        let idx_b = (self.write_pos + 2 * len - self.delay_int - 1) % len;
        let a = self.buffer[idx_a];
        let b = self.buffer[idx_b];
        a + (b - a) * self.delay_frac
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}
