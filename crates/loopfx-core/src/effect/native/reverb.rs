//! Stereo reverb
//!
//! Freeverb-style network:
//! - Eight parallel comb filters per channel, each with a one-pole lowpass
//!   in its feedback path
//! - Four series allpass filters per channel for diffusion
//!
//! The feedback sets the decay; the lowpass corner is fixed at construction
//! (18kHz by default) and only darkens the tail.

use std::f32::consts::PI;

use crate::effect::StereoEffect;
use crate::types::StereoSample;

/// Comb filter delay line lengths (in samples at 44.1kHz)
/// These are prime-ish numbers to avoid resonances
const COMB_LENGTHS: [usize; 8] = [1557, 1617, 1491, 1422, 1277, 1356, 1188, 1116];

/// Allpass filter delay line lengths
const ALLPASS_LENGTHS: [usize; 4] = [225, 556, 441, 341];

/// Sample rate the delay lengths above were tuned for
const REFERENCE_RATE: f32 = 44100.0;

/// Stereo spread offset for the right channel (in samples at 44.1kHz)
const STEREO_SPREAD: usize = 23;

/// Allpass feedback coefficient
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Gain compensation for comb filter summing
const COMB_GAIN: f32 = 0.2;

struct CombFilter {
    buffer: Vec<f32>,
    pos: usize,
    filter_state: f32,
}

impl CombFilter {
    fn new(length: usize, rate_scale: f32) -> Self {
        let scaled_len = ((length as f32 * rate_scale) as usize).max(1);
        Self {
            buffer: vec![0.0; scaled_len],
            pos: 0,
            filter_state: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let output = self.buffer[self.pos];

        // One-pole lowpass in the feedback path
        self.filter_state = output * (1.0 - damp) + self.filter_state * damp;

        self.buffer[self.pos] = input + self.filter_state * feedback;
        self.pos += 1;
        if self.pos == self.buffer.len() {
            self.pos = 0;
        }

        output
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
    }
}

struct AllpassFilter {
    buffer: Vec<f32>,
    pos: usize,
}

impl AllpassFilter {
    fn new(length: usize, rate_scale: f32) -> Self {
        let scaled_len = ((length as f32 * rate_scale) as usize).max(1);
        Self {
            buffer: vec![0.0; scaled_len],
            pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.pos];
        let output = -input + buffered;
        self.buffer[self.pos] = input + buffered * ALLPASS_FEEDBACK;
        self.pos += 1;
        if self.pos == self.buffer.len() {
            self.pos = 0;
        }
        output
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
    }
}

/// Stereo reverb with feedback and a fixed lowpass corner
pub struct Reverb {
    combs_l: Vec<CombFilter>,
    combs_r: Vec<CombFilter>,
    allpass_l: Vec<AllpassFilter>,
    allpass_r: Vec<AllpassFilter>,
    sample_rate: f32,
    feedback: f32,
    lp_freq: f32,
    /// Lowpass pole derived from `lp_freq`
    damp: f32,
}

impl Reverb {
    /// Decay at power-on
    pub const DEFAULT_FEEDBACK: f32 = 0.85;
    /// Lowpass corner at power-on
    pub const DEFAULT_LP_FREQ: f32 = 18000.0;
    /// Feedback ceiling; keeps the tail decaying at DC
    pub const MAX_FEEDBACK: f32 = 0.98;

    /// Create a reverb for the given sample rate
    ///
    /// All delay memory is allocated here; processing never allocates.
    pub fn new(sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        let rate_scale = sample_rate / REFERENCE_RATE;

        let mut reverb = Self {
            combs_l: COMB_LENGTHS
                .iter()
                .map(|&len| CombFilter::new(len, rate_scale))
                .collect(),
            combs_r: COMB_LENGTHS
                .iter()
                .map(|&len| CombFilter::new(len + STEREO_SPREAD, rate_scale))
                .collect(),
            allpass_l: ALLPASS_LENGTHS
                .iter()
                .map(|&len| AllpassFilter::new(len, rate_scale))
                .collect(),
            allpass_r: ALLPASS_LENGTHS
                .iter()
                .map(|&len| AllpassFilter::new(len + STEREO_SPREAD, rate_scale))
                .collect(),
            sample_rate,
            feedback: Self::DEFAULT_FEEDBACK,
            lp_freq: Self::DEFAULT_LP_FREQ,
            damp: 0.0,
        };
        reverb.set_lp_freq(Self::DEFAULT_LP_FREQ);
        reverb
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn lp_freq(&self) -> f32 {
        self.lp_freq
    }

    /// Set the lowpass corner of the comb feedback paths
    pub fn set_lp_freq(&mut self, hz: f32) {
        let nyquist = self.sample_rate * 0.5;
        self.lp_freq = hz.clamp(20.0, nyquist * 0.98);
        self.damp = (-2.0 * PI * self.lp_freq / self.sample_rate).exp();
    }
}

impl StereoEffect for Reverb {
    fn process(&mut self, input: StereoSample) -> StereoSample {
        let mono = (input.left + input.right) * 0.5;
        let feedback = self.feedback;
        let damp = self.damp;

        let mut out_l = 0.0f32;
        let mut out_r = 0.0f32;
        for comb in &mut self.combs_l {
            out_l += comb.process(mono, feedback, damp);
        }
        for comb in &mut self.combs_r {
            out_r += comb.process(mono, feedback, damp);
        }
        out_l *= COMB_GAIN;
        out_r *= COMB_GAIN;

        for ap in &mut self.allpass_l {
            out_l = ap.process(out_l);
        }
        for ap in &mut self.allpass_r {
            out_r = ap.process(out_r);
        }

        StereoSample::new(out_l, out_r)
    }

    fn set_feedback(&mut self, feedback: f32) {
        if feedback.is_finite() {
            self.feedback = feedback.clamp(0.0, Self::MAX_FEEDBACK);
        }
    }

    fn reset(&mut self) {
        self.combs_l.iter_mut().for_each(CombFilter::reset);
        self.combs_r.iter_mut().for_each(CombFilter::reset);
        self.allpass_l.iter_mut().for_each(AllpassFilter::reset);
        self.allpass_r.iter_mut().for_each(AllpassFilter::reset);
    }

    fn name(&self) -> &str {
        "Reverb"
    }
}
