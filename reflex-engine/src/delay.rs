use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws the armed-wait duration for each trial.
#[derive(Debug, Clone)]
pub struct DelayGenerator<R: Rng> {
    rng: R,
}

impl DelayGenerator<StdRng> {
    /// Seeded generator for reproducible schedules, OS entropy otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl<R: Rng> DelayGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform draw in `[min, max)` seconds. Caller guarantees `0 < min < max`.
    pub fn next(&mut self, min: f64, max: f64) -> f64 {
        debug_assert!(0.0 < min && min < max);
        loop {
            let delay = self.rng.random_range(min..max);
            // Float rounding can land exactly on `max`.
            if delay < max {
                return delay;
            }
        }
    }
}
