//! FM phase discriminator used by the TDF phase slicer.

use std::f32::consts::PI;

use num_complex::Complex32;

/// Conjugate-product discriminator: the angle between consecutive
/// samples, scaled so that the configured full deviation maps to ±1.
#[derive(Debug, Clone)]
pub struct PhaseDiscriminator {
    fm_scaling: f32,
    prev: Complex32,
}

impl PhaseDiscriminator {
    pub fn new(fm_scaling: f32) -> Self {
        Self {
            fm_scaling,
            prev: Complex32::new(0.0, 0.0),
        }
    }

    pub fn set_fm_scaling(&mut self, fm_scaling: f32) {
        self.fm_scaling = fm_scaling;
    }

    /// Phase delta between this sample and the previous one.
    pub fn phase_delta(&mut self, sample: Complex32) -> f32 {
        let d = sample * self.prev.conj();
        self.prev = sample;
        d.im.atan2(d.re) * self.fm_scaling / PI
    }

    pub fn reset(&mut self) {
        self.prev = Complex32::new(0.0, 0.0);
    }
}
