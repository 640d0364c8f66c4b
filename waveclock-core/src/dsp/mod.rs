//! DSP building blocks for the sample-rate-normalized pipeline.

pub mod interpolator;
pub mod moving_average;
pub mod nco;
pub mod phase_discriminator;

pub use interpolator::Interpolator;
pub use moving_average::MovingAverage;
pub use nco::Nco;
pub use phase_discriminator::PhaseDiscriminator;
