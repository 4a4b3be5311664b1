//! Randomness behind the flaky and partial directives.
//!
//! The dispatcher takes a [`RandomSource`] so tests can pin the draws.

use rand::Rng;

/// Uniform draws used by the dispatcher.
pub trait RandomSource: Send + Sync + std::fmt::Debug {
    /// A value in `[0, 1)`.
    fn unit(&self) -> f64;

    /// A value in `[low, high]`. Returns `low` when the range is empty.
    fn between(&self, low: usize, high: usize) -> usize;
}

/// Draws from the thread-local generator on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn between(&self, low: usize, high: usize) -> usize {
        if low >= high {
            return low;
        }
        rand::thread_rng().gen_range(low..=high)
    }
}

/// Always returns the same draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRandom {
    pub unit: f64,
    /// Clamped into the requested range.
    pub pick: usize,
}

impl RandomSource for FixedRandom {
    fn unit(&self) -> f64 {
        self.unit
    }

    fn between(&self, low: usize, high: usize) -> usize {
        self.pick.max(low).min(high.max(low))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_random_stays_in_range() {
        let random = ThreadRandom;
        for _ in 0..1000 {
            let unit = random.unit();
            assert!((0.0..1.0).contains(&unit));
            let picked = random.between(1, 9);
            assert!((1..=9).contains(&picked));
        }
        assert_eq!(random.between(5, 5), 5);
        assert_eq!(random.between(5, 2), 5);
    }

    #[test]
    fn fixed_random_clamps() {
        let random = FixedRandom { unit: 0.25, pick: 40 };
        assert_eq!(random.unit(), 0.25);
        assert_eq!(random.between(1, 9), 9);
        assert_eq!(FixedRandom { unit: 0.0, pick: 0 }.between(1, 9), 1);
    }
}
