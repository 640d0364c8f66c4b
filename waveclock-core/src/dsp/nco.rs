//! Numerically controlled oscillator for channel frequency translation.

use std::f32::consts::{PI, TAU};

use num_complex::Complex32;

/// Phase-accumulator oscillator producing one complex sample per call.
#[derive(Debug, Clone)]
pub struct Nco {
    phase: f32,
    increment: f32,
}

impl Default for Nco {
    fn default() -> Self {
        Self::new()
    }
}

impl Nco {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            increment: 0.0,
        }
    }

    /// Tune to `freq` Hz at the given sample rate. Negative frequencies
    /// rotate clockwise, shifting a positive channel offset down to
    /// baseband when the input is multiplied by [`next_iq`](Self::next_iq).
    pub fn set_freq(&mut self, freq: f64, sample_rate: f64) {
        self.increment = (f64::from(TAU) * freq / sample_rate) as f32;
        self.phase = 0.0;
    }

    pub fn next_iq(&mut self) -> Complex32 {
        let iq = Complex32::new(self.phase.cos(), self.phase.sin());
        self.phase += self.increment;
        if self.phase > PI {
            self.phase -= TAU;
        } else if self.phase < -PI {
            self.phase += TAU;
        }
        iq
    }
}
