//! Polyphase rate converter between the channel rate and the canonical
//! internal rate.

use std::f64::consts::PI;

use num_complex::Complex32;

use crate::errors::DspError;

/// Number of fractional phases in the filter bank.
pub const PHASE_STEPS: usize = 16;
const TAPS_PER_PHASE: usize = 16;

/// Windowed-sinc polyphase filter driven by a distance accumulator.
///
/// The caller tracks `distance = input_rate / output_rate` and a running
/// `distance_remain`. With `distance < 1` the converter interpolates
/// (several outputs per input); with `distance >= 1` it decimates
/// (an output only when the accumulator crosses its boundary).
#[derive(Debug, Clone)]
pub struct Interpolator {
    taps: Vec<f32>,
    history: Vec<Complex32>,
    index: usize,
}

impl Interpolator {
    /// Design the anti-alias lowpass for the given input rate and cutoff.
    pub fn new(sample_rate: f64, cutoff: f64) -> Result<Self, DspError> {
        if !(cutoff > 0.0) || cutoff >= sample_rate / 2.0 {
            return Err(DspError::CutoffAboveNyquist {
                cutoff,
                sample_rate,
            });
        }

        let len = PHASE_STEPS * TAPS_PER_PHASE;
        let center = (len - 1) as f64 / 2.0;
        let fc = cutoff / sample_rate;

        // Blackman-windowed sinc prototype at the polyphase rate
        let mut proto = vec![0.0_f64; len];
        for (n, tap) in proto.iter_mut().enumerate() {
            let x = (n as f64 - center) / PHASE_STEPS as f64;
            let sinc = if x.abs() < 1e-9 {
                2.0 * fc
            } else {
                (2.0 * PI * fc * x).sin() / (PI * x)
            };
            let t = n as f64 / (len - 1) as f64;
            let window = 0.42 - 0.5 * (2.0 * PI * t).cos() + 0.08 * (4.0 * PI * t).cos();
            *tap = sinc * window;
        }

        // Normalize each phase to unit DC gain
        let mut taps = vec![0.0_f32; len];
        for phase in 0..PHASE_STEPS {
            let sum: f64 = (0..TAPS_PER_PHASE)
                .map(|k| proto[phase + k * PHASE_STEPS])
                .sum();
            if sum.abs() < 1e-12 {
                return Err(DspError::FilterDesignFailed {
                    reason: format!("phase {phase} has zero DC gain"),
                });
            }
            for k in 0..TAPS_PER_PHASE {
                taps[phase + k * PHASE_STEPS] = (proto[phase + k * PHASE_STEPS] / sum) as f32;
            }
        }

        Ok(Self {
            taps,
            history: vec![Complex32::new(0.0, 0.0); TAPS_PER_PHASE],
            index: 0,
        })
    }

    fn advance(&mut self, sample: Complex32) {
        self.history[self.index] = sample;
        self.index = (self.index + 1) % TAPS_PER_PHASE;
    }

    fn phase_output(&self, frac: f32) -> Complex32 {
        let phase = ((frac * PHASE_STEPS as f32) as usize).min(PHASE_STEPS - 1);
        let mut acc = Complex32::new(0.0, 0.0);
        for k in 0..TAPS_PER_PHASE {
            // k = 0 is the newest sample
            let h = self.taps[phase + k * PHASE_STEPS];
            let pos = (self.index + TAPS_PER_PHASE - 1 - k) % TAPS_PER_PHASE;
            acc += self.history[pos].scale(h);
        }
        acc
    }

    /// Interpolation step (`distance < 1`). Returns `true` when the input
    /// sample has been consumed; `false` with `result` holding the next
    /// output sample, after which the caller advances `distance_remain`.
    pub fn interpolate(
        &mut self,
        distance_remain: &mut f32,
        sample: Complex32,
        result: &mut Complex32,
    ) -> bool {
        if *distance_remain >= 1.0 {
            self.advance(sample);
            *distance_remain -= 1.0;
            true
        } else {
            *result = self.phase_output(*distance_remain);
            false
        }
    }

    /// Decimation step (`distance >= 1`). Consumes the input sample and
    /// returns `true` with `result` set when the accumulator crosses its
    /// boundary, after which the caller advances `distance_remain`.
    pub fn decimate(
        &mut self,
        distance_remain: &mut f32,
        sample: Complex32,
        result: &mut Complex32,
    ) -> bool {
        self.advance(sample);
        *distance_remain -= 1.0;
        if *distance_remain < 1.0 {
            *result = self.phase_output(distance_remain.clamp(0.0, 1.0));
            true
        } else {
            false
        }
    }
}
