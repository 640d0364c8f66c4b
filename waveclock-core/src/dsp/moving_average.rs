//! Single-pole IIR moving average.

/// One-pole lowpass with an equivalent window length, updated once per
/// sample without allocation.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    alpha: f32,
    value: f32,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        Self {
            alpha: 1.0 / window.max(1) as f32,
            value: 0.0,
        }
    }

    pub fn feed(&mut self, sample: f32) {
        self.value += self.alpha * (sample - self.value);
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn converges_to_constant_input() {
        let mut avg = MovingAverage::new(8);
        for _ in 0..200 {
            avg.feed(3.5);
        }
        assert_relative_eq!(avg.value(), 3.5, epsilon = 1e-4);
    }

    #[test]
    fn window_sets_response_time() {
        let mut fast = MovingAverage::new(4);
        let mut slow = MovingAverage::new(64);
        for _ in 0..10 {
            fast.feed(1.0);
            slow.feed(1.0);
        }
        assert!(fast.value() > slow.value());
    }

    #[test]
    fn reset_clears_state() {
        let mut avg = MovingAverage::new(4);
        avg.feed(1.0);
        avg.reset();
        assert_eq!(avg.value(), 0.0);
    }
}
