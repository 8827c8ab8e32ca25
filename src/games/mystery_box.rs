//! Mystery box (egg) with weighted reward tiers

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTier {
    pub min: u64,
    pub max: u64,
    /// Relative weight, in percent
    pub weight: u32,
}

pub const TIERS: [RewardTier; 5] = [
    RewardTier { min: 1, max: 5, weight: 40 },
    RewardTier { min: 5, max: 15, weight: 30 },
    RewardTier { min: 15, max: 30, weight: 20 },
    RewardTier { min: 30, max: 100, weight: 8 },
    RewardTier { min: 100, max: 500, weight: 2 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxOpening {
    pub tier: usize,
    pub reward: u64,
}

/// Pick a tier by cumulative weight, then a uniform amount in `min..=max`
pub fn open<R: Rng + ?Sized>(rng: &mut R) -> BoxOpening {
    let total: u32 = TIERS.iter().map(|t| t.weight).sum();
    let mut roll = rng.gen_range(0..total);

    let tier = TIERS
        .iter()
        .position(|t| {
            if roll < t.weight {
                true
            } else {
                roll -= t.weight;
                false
            }
        })
        .unwrap_or(TIERS.len() - 1);

    let range = TIERS[tier];
    BoxOpening {
        tier,
        reward: rng.gen_range(range.min..=range.max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_weights_sum_to_100() {
        assert_eq!(TIERS.iter().map(|t| t.weight).sum::<u32>(), 100);
    }

    #[test]
    fn test_rewards_stay_inside_tier() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5_000 {
            let opening = open(&mut rng);
            let tier = TIERS[opening.tier];
            assert!((tier.min..=tier.max).contains(&opening.reward));
        }
    }

    #[test]
    fn test_tier_frequencies_follow_weights() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut counts = [0u32; TIERS.len()];
        let n = 100_000;
        for _ in 0..n {
            counts[open(&mut rng).tier] += 1;
        }
        for (count, tier) in counts.iter().zip(TIERS.iter()) {
            let share = *count as f64 / n as f64 * 100.0;
            assert!((share - tier.weight as f64).abs() < 1.5, "tier share {}", share);
        }
    }
}
