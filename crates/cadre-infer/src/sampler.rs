//! Seeded random sources used during a flush.
//!
//! Both samplers own a `ChaCha8Rng` seeded once at construction, so two
//! runners built with the same seed and fed the same tensors draw the
//! same values in the same order.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Draws one index from a row of unnormalised log-probabilities.
#[derive(Clone, Debug)]
pub struct Multinomial {
    rng: ChaCha8Rng,
}

impl Multinomial {
    /// A sampler seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Sample an index with probability proportional to `exp(logit)`.
    ///
    /// Returns `None` when `logits` is empty or does not form a
    /// distribution (no finite maximum, or a non-positive mass).
    pub fn sample(&mut self, logits: &[f32]) -> Option<usize> {
        let max = logits
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(f32::NEG_INFINITY, f32::max);
        if !max.is_finite() {
            return None;
        }
        let total: f64 = logits
            .iter()
            .map(|&l| f64::from(l - max).exp())
            .filter(|p| p.is_finite())
            .sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        let target = self.rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        let mut last = None;
        for (i, &l) in logits.iter().enumerate() {
            let p = f64::from(l - max).exp();
            if !p.is_finite() || p == 0.0 {
                continue;
            }
            cumulative += p;
            last = Some(i);
            if target < cumulative {
                return Some(i);
            }
        }
        // Rounding can leave `target` a hair above the final sum.
        last
    }
}

/// Standard-normal noise via the Box-Muller transform.
#[derive(Clone, Debug)]
pub struct RandomNormal {
    rng: ChaCha8Rng,
    mean: f64,
    stddev: f64,
    spare: Option<f64>,
}

impl RandomNormal {
    /// A generator of `N(mean, stddev²)` values seeded with `seed`.
    pub fn new(seed: u64, mean: f64, stddev: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            mean,
            stddev,
            spare: None,
        }
    }

    /// The next sample.
    pub fn next_value(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return self.mean + self.stddev * z;
        }
        let u1: f64 = self.rng.random::<f64>().max(1e-300);
        let u2: f64 = self.rng.random();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        self.spare = Some(r * theta.sin());
        self.mean + self.stddev * r * theta.cos()
    }

    /// Overwrite every element of `out` with a fresh sample.
    pub fn fill(&mut self, out: &mut [f32]) {
        for v in out {
            *v = self.next_value() as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_logit_always_wins() {
        let mut m = Multinomial::new(0);
        for _ in 0..100 {
            assert_eq!(m.sample(&[-100.0, 100.0, -100.0]), Some(1));
        }
    }

    #[test]
    fn degenerate_rows_are_rejected() {
        let mut m = Multinomial::new(0);
        assert_eq!(m.sample(&[]), None);
        assert_eq!(m.sample(&[f32::NAN, f32::NAN]), None);
        assert_eq!(m.sample(&[f32::NEG_INFINITY]), None);
    }

    #[test]
    fn neg_infinity_logits_are_never_drawn() {
        let mut m = Multinomial::new(7);
        for _ in 0..200 {
            let i = m.sample(&[f32::NEG_INFINITY, 0.0, f32::NEG_INFINITY, 0.0]).unwrap();
            assert!(i == 1 || i == 3);
        }
    }

    #[test]
    fn uniform_logits_cover_every_index() {
        let mut m = Multinomial::new(3);
        let mut seen = [false; 4];
        for _ in 0..400 {
            seen[m.sample(&[0.0; 4]).unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn random_normal_moments() {
        let mut n = RandomNormal::new(11, 0.0, 1.0);
        let samples: Vec<f64> = (0..20_000).map(|_| n.next_value()).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "var {var}");
    }

    #[test]
    fn random_normal_shift_and_scale() {
        let mut a = RandomNormal::new(5, 0.0, 1.0);
        let mut b = RandomNormal::new(5, 10.0, 2.0);
        for _ in 0..16 {
            let (x, y) = (a.next_value(), b.next_value());
            assert!((10.0 + 2.0 * x - y).abs() < 1e-9);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn same_seed_same_draws(
                seed in any::<u64>(),
                logits in prop::collection::vec(-5.0f32..5.0, 1..8),
            ) {
                let mut a = Multinomial::new(seed);
                let mut b = Multinomial::new(seed);
                for _ in 0..8 {
                    let x = a.sample(&logits);
                    prop_assert!(x.is_some());
                    prop_assert!(x.unwrap() < logits.len());
                    prop_assert_eq!(x, b.sample(&logits));
                }
            }

            #[test]
            fn fill_is_seed_deterministic(seed in any::<u64>(), len in 0usize..32) {
                let mut x = vec![0.0f32; len];
                let mut y = vec![0.0f32; len];
                RandomNormal::new(seed, 0.0, 1.0).fill(&mut x);
                RandomNormal::new(seed, 0.0, 1.0).fill(&mut y);
                prop_assert_eq!(x, y);
            }
        }
    }
}
