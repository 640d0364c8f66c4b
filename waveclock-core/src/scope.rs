//! Optional per-sample diagnostic tap.

use num_complex::Complex32;

/// Consumer for the scope tap. Two selected signals are packaged as the
/// real and imaginary parts of each pushed sample.
pub trait ScopeSink: Send {
    fn push(&mut self, sample: Complex32);
}

impl ScopeSink for Vec<Complex32> {
    fn push(&mut self, sample: Complex32) {
        Vec::push(self, sample);
    }
}
