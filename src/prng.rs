//! Cryptographically secure randomness service.
//!
//! Every draw comes from the operating-system CSPRNG; there is no seeding
//! and no per-service state, so concurrent requests cannot correlate their
//! draws. Game implementations receive a handle to [`PrngService`] and the
//! same operations are exposed over HTTP.

use crate::errors::PrngError;
use rand::{seq::SliceRandom, CryptoRng, Rng, RngCore};
use rand_core::OsRng;
use serde::Deserialize;
use serde_json::Value;

/// Cryptographically secure source of uniform bytes and integers.
///
/// Thin `Copy` wrapper over [`OsRng`] so callers hold a source by value and
/// draws stay safe under concurrent use.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSource;

impl RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        OsRng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        OsRng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(dest)
    }
}

impl CryptoRng for RandomSource {}

/// Ordered sequence of (value, weight) pairs for weighted sampling.
///
/// Wire format is `[[value, weight], ...]`. Weights are non-negative
/// integers; a zero-weight entry is legal and simply unreachable.
#[derive(Debug, Clone, Deserialize)]
pub struct DistributionSpec(pub Vec<(Value, u64)>);

/// Range sampling, shuffling, and weighted-distribution sampling.
///
/// Stateless: all entropy comes from [`RandomSource`] at call time.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrngService {
    source: RandomSource,
}

impl PrngService {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` independent draws uniformly distributed over `[min, max)`.
    ///
    /// Bounds are validated before any draw: `min` must be non-negative and
    /// `max` strictly greater than `min`.
    pub fn range(&self, min: i64, max: i64, count: usize) -> Result<Vec<i64>, PrngError> {
        if min < 0 {
            return Err(PrngError::NegativeMinimum(min));
        }
        if max <= min {
            return Err(PrngError::EmptyRange { min, max });
        }

        let mut rng = self.source;
        Ok((0..count).map(|_| rng.gen_range(min..max)).collect())
    }

    /// Uniformly random permutation of `items` (Fisher-Yates over the CSPRNG).
    pub fn shuffle<T>(&self, mut items: Vec<T>) -> Vec<T> {
        let mut rng = self.source;
        items.shuffle(&mut rng);
        items
    }

    /// Draw one value from a weighted distribution by CDF inversion.
    ///
    /// Draws a uniform integer `r` in `[0, total)` and returns the first
    /// value whose running cumulative weight strictly exceeds `r`.
    pub fn weighted_sample(&self, distribution: &DistributionSpec) -> Result<Value, PrngError> {
        let pairs = &distribution.0;
        if pairs.is_empty() {
            return Err(PrngError::MalformedDistribution);
        }

        let total: u64 = pairs.iter().map(|(_, weight)| *weight).sum();
        if total == 0 {
            return Err(PrngError::ZeroTotalWeight);
        }

        let mut rng = self.source;
        let r = rng.gen_range(0..total);
        Ok(select_weighted(pairs, r).clone())
    }
}

/// CDF walk shared by `weighted_sample` and its tests. `r` must be in
/// `[0, total)`, which makes the final pair unconditionally reachable.
fn select_weighted(pairs: &[(Value, u64)], r: u64) -> &Value {
    let mut cumulative = 0u64;
    for (value, weight) in pairs {
        cumulative += weight;
        if cumulative > r {
            return value;
        }
    }
    // Unreachable for valid r; fall back to the last entry rather than panic.
    &pairs[pairs.len() - 1].0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn range_rejects_negative_minimum() {
        let prng = PrngService::new();
        assert!(matches!(
            prng.range(-1, 10, 1),
            Err(PrngError::NegativeMinimum(-1))
        ));
    }

    #[test]
    fn range_rejects_empty_interval() {
        let prng = PrngService::new();
        assert!(matches!(prng.range(5, 5, 1), Err(PrngError::EmptyRange { .. })));
        assert!(matches!(prng.range(5, 2, 1), Err(PrngError::EmptyRange { .. })));
    }

    #[test]
    fn range_draws_stay_inside_interval_and_cover_it() {
        let prng = PrngService::new();
        let draws = prng.range(0, 6, 6_000).unwrap();
        assert_eq!(draws.len(), 6_000);

        let mut seen = [false; 6];
        for d in draws {
            assert!((0..6).contains(&d));
            seen[d as usize] = true;
        }
        // 6000 draws over 6 values: each value is missing with probability
        // (5/6)^6000, effectively zero.
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn shuffle_preserves_multiset_and_length() {
        let prng = PrngService::new();
        let shuffled = prng.shuffle(vec![3, 1, 2, 2, 5]);
        let mut sorted = shuffled.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 2, 3, 5]);
    }

    #[test]
    fn shuffle_produces_all_permutations_roughly_uniformly() {
        let prng = PrngService::new();
        let mut counts: HashMap<Vec<i32>, usize> = HashMap::new();
        let trials = 6_000;

        for _ in 0..trials {
            *counts.entry(prng.shuffle(vec![1, 2, 3])).or_default() += 1;
        }

        assert_eq!(counts.len(), 6);
        // Expected 1000 each; 600..1400 is far outside plausible variance
        // for a biased-free shuffle yet tight enough to catch a broken one.
        for (perm, &count) in &counts {
            assert!(
                (600..1400).contains(&count),
                "permutation {:?} seen {} times",
                perm,
                count
            );
        }
    }

    #[test]
    fn weighted_sample_respects_relative_weights() {
        let prng = PrngService::new();
        let spec = DistributionSpec(vec![
            (json!("A"), 10),
            (json!("B"), 20),
            (json!("C"), 30),
        ]);

        let mut counts: HashMap<String, usize> = HashMap::new();
        let trials = 6_000;
        for _ in 0..trials {
            let v = prng.weighted_sample(&spec).unwrap();
            *counts.entry(v.as_str().unwrap().to_string()).or_default() += 1;
        }

        let a = counts.get("A").copied().unwrap_or(0);
        let b = counts.get("B").copied().unwrap_or(0);
        let c = counts.get("C").copied().unwrap_or(0);
        assert_eq!(a + b + c, trials);
        // Expected 1000/2000/3000 with generous bands.
        assert!((600..1400).contains(&a), "A seen {} times", a);
        assert!((1500..2500).contains(&b), "B seen {} times", b);
        assert!((2500..3500).contains(&c), "C seen {} times", c);
    }

    #[test]
    fn cdf_walk_breaks_ties_by_sequence_order() {
        let pairs = vec![(json!("A"), 10), (json!("B"), 20), (json!("C"), 30)];
        // Total 60; cumulative sums 10, 30, 60.
        assert_eq!(select_weighted(&pairs, 0), &json!("A"));
        assert_eq!(select_weighted(&pairs, 9), &json!("A"));
        assert_eq!(select_weighted(&pairs, 10), &json!("B"));
        assert_eq!(select_weighted(&pairs, 25), &json!("B"));
        assert_eq!(select_weighted(&pairs, 30), &json!("C"));
        assert_eq!(select_weighted(&pairs, 59), &json!("C"));
    }

    #[test]
    fn zero_weight_entries_are_legal_but_unreachable() {
        let prng = PrngService::new();
        let spec = DistributionSpec(vec![
            (json!("never"), 0),
            (json!("always"), 5),
        ]);

        for _ in 0..200 {
            assert_eq!(prng.weighted_sample(&spec).unwrap(), json!("always"));
        }
    }

    #[test]
    fn weighted_sample_rejects_zero_total_and_empty_input() {
        let prng = PrngService::new();

        let all_zero = DistributionSpec(vec![(json!("x"), 0), (json!("y"), 0)]);
        assert!(matches!(
            prng.weighted_sample(&all_zero),
            Err(PrngError::ZeroTotalWeight)
        ));

        let empty = DistributionSpec(vec![]);
        assert!(matches!(
            prng.weighted_sample(&empty),
            Err(PrngError::MalformedDistribution)
        ));
    }

    #[test]
    fn distribution_spec_deserializes_from_pair_array() {
        let spec: DistributionSpec = serde_json::from_str(r#"[["A", 10], ["B", 20]]"#).unwrap();
        assert_eq!(spec.0.len(), 2);
        assert_eq!(spec.0[1], (json!("B"), 20));

        // Negative weights are rejected at the type level.
        assert!(serde_json::from_str::<DistributionSpec>(r#"[["A", -1]]"#).is_err());
    }
}
