//! Channel impairment simulation for IQ sample streams.

use num_complex::Complex32;
use rand::Rng;
use rand_distr::StandardNormal;

/// Add white Gaussian noise to both components of each sample.
pub fn apply_iq_noise<R: Rng>(samples: &[Complex32], noise_std: f32, rng: &mut R) -> Vec<Complex32> {
    samples
        .iter()
        .map(|sample| {
            let noise_i: f32 = rng.sample::<f32, _>(StandardNormal) * noise_std;
            let noise_q: f32 = rng.sample::<f32, _>(StandardNormal) * noise_std;
            sample + Complex32::new(noise_i, noise_q)
        })
        .collect()
}

/// Noise standard deviation for a target SNR against a unit-power signal.
pub fn snr_to_noise_std(snr_db: f32) -> f32 {
    let snr_linear = 10.0_f32.powf(snr_db / 10.0);
    (1.0 / snr_linear).sqrt()
}
