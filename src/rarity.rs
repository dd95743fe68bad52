//! Rarity tiers, their static configuration, and the weighted tier draw.

use std::fmt;

use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};

use rand::seq::IndexedRandom;
use rand::{Rng, RngExt};

/// Desirability class of a generated item, ordered from least to most desirable.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum RarityTier {
    /// Most frequent tier
    #[sea_orm(string_value = "c")]
    Common,
    /// Second tier
    #[sea_orm(string_value = "u")]
    Uncommon,
    /// Middle tier
    #[sea_orm(string_value = "r")]
    Rare,
    /// Second rarest tier
    #[sea_orm(string_value = "e")]
    Epic,
    /// Rarest tier
    #[sea_orm(string_value = "l")]
    Legendary,
}

/// Static per-tier configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RarityConfig {
    /// Tier this entry configures
    pub tier: RarityTier,
    /// Selection probability; all five sum to 1.0
    pub probability: f64,
    /// Lower bound of the simulated ETH value
    pub min_value: f64,
    /// Upper bound of the simulated ETH value
    pub max_value: f64,
    /// How many visual effects an item of this tier may carry
    pub effect_counts: &'static [usize],
}

/// One entry per tier, in ascending desirability.
pub const RARITY_TABLE: [RarityConfig; 5] = [
    RarityConfig {
        tier: RarityTier::Common,
        probability: 0.60,
        min_value: 0.01,
        max_value: 0.05,
        effect_counts: &[0, 1],
    },
    RarityConfig {
        tier: RarityTier::Uncommon,
        probability: 0.25,
        min_value: 0.05,
        max_value: 0.15,
        effect_counts: &[1, 2],
    },
    RarityConfig {
        tier: RarityTier::Rare,
        probability: 0.10,
        min_value: 0.15,
        max_value: 0.5,
        effect_counts: &[2, 3],
    },
    RarityConfig {
        tier: RarityTier::Epic,
        probability: 0.04,
        min_value: 0.5,
        max_value: 2.0,
        effect_counts: &[3, 4],
    },
    RarityConfig {
        tier: RarityTier::Legendary,
        probability: 0.01,
        min_value: 2.0,
        max_value: 10.0,
        effect_counts: &[5],
    },
];

/// Thresholds are applied rarest first; anything left over is common.
const DRAW_ORDER: [RarityTier; 4] = [
    RarityTier::Legendary,
    RarityTier::Epic,
    RarityTier::Rare,
    RarityTier::Uncommon,
];

impl RarityTier {
    /// All tiers, ascending.
    pub const ALL: [RarityTier; 5] = [
        RarityTier::Common,
        RarityTier::Uncommon,
        RarityTier::Rare,
        RarityTier::Epic,
        RarityTier::Legendary,
    ];

    /// Static configuration for this tier.
    pub fn config(self) -> &'static RarityConfig {
        &RARITY_TABLE[self as usize]
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            RarityTier::Common => "Common",
            RarityTier::Uncommon => "Uncommon",
            RarityTier::Rare => "Rare",
            RarityTier::Epic => "Epic",
            RarityTier::Legendary => "Legendary",
        }
    }

    /// Parses the one-letter storage code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "c" => Some(RarityTier::Common),
            "u" => Some(RarityTier::Uncommon),
            "r" => Some(RarityTier::Rare),
            "e" => Some(RarityTier::Epic),
            "l" => Some(RarityTier::Legendary),
            _ => None,
        }
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of the rarity draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RarityRoll {
    /// Resolved tier
    pub tier: RarityTier,
    /// Simulated ETH value inside the tier's range
    pub value: f64,
}

/// Maps a uniform draw in `[0, 1)` onto a tier by cumulative probability,
/// rarest first.
pub fn tier_for_roll(roll: f64) -> RarityTier {
    let mut cumulative = 0.0;
    for tier in DRAW_ORDER {
        cumulative += tier.config().probability;
        if roll < cumulative {
            return tier;
        }
    }
    RarityTier::Common
}

/// Places a uniform draw in `[0, 1)` inside the tier's value range.
pub fn value_for_roll(tier: RarityTier, roll: f64) -> f64 {
    let config = tier.config();
    config.min_value + roll * (config.max_value - config.min_value)
}

/// Weighted tier draw.
pub fn resolve_tier<R: Rng + ?Sized>(rng: &mut R) -> RarityTier {
    tier_for_roll(rng.random::<f64>())
}

/// Uniform value inside the tier's `[min_value, max_value]` range.
pub fn roll_value<R: Rng + ?Sized>(tier: RarityTier, rng: &mut R) -> f64 {
    value_for_roll(tier, rng.random::<f64>())
}

/// Tier draw followed by a value draw.
pub fn resolve<R: Rng + ?Sized>(rng: &mut R) -> RarityRoll {
    let tier = resolve_tier(rng);
    let value = roll_value(tier, rng);
    RarityRoll { tier, value }
}

/// Number of effects for a tier, drawn from its allowed set and floored at one.
pub fn effect_count<R: Rng + ?Sized>(tier: RarityTier, rng: &mut R) -> usize {
    tier.config()
        .effect_counts
        .choose(rng)
        .copied()
        .unwrap_or(1)
        .max(1)
}

/// Largest effect count any tier can draw.
pub fn max_effect_count() -> usize {
    RARITY_TABLE
        .iter()
        .flat_map(|config| config.effect_counts)
        .copied()
        .max()
        .unwrap_or(1)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::scripted::ScriptedRng;
    use crate::random::seeded;

    #[test]
    fn probabilities_sum_to_one() {
        let total: f64 = RARITY_TABLE.iter().map(|config| config.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn table_is_indexed_by_tier() {
        for tier in RarityTier::ALL {
            assert_eq!(tier.config().tier, tier);
        }
    }

    #[test]
    fn thresholds_are_checked_rarest_first() {
        let cases = [
            (0.0, RarityTier::Legendary),
            (0.009, RarityTier::Legendary),
            (0.011, RarityTier::Epic),
            (0.049, RarityTier::Epic),
            (0.051, RarityTier::Rare),
            (0.149, RarityTier::Rare),
            (0.151, RarityTier::Uncommon),
            (0.399, RarityTier::Uncommon),
            (0.401, RarityTier::Common),
            (0.999, RarityTier::Common),
        ];
        for (draw, expected) in cases {
            assert_eq!(tier_for_roll(draw), expected, "draw {draw}");
        }
    }

    #[test]
    fn value_uses_second_draw() {
        let mut rng = ScriptedRng::new(vec![0.0, 0.5]);
        let roll = resolve(&mut rng);
        assert_eq!(roll.tier, RarityTier::Legendary);
        assert!((roll.value - 6.0).abs() < 1e-9);
    }

    #[test]
    fn common_effect_count_is_floored_to_one() {
        let mut rng = seeded(3);
        for _ in 0..50 {
            assert_eq!(effect_count(RarityTier::Common, &mut rng), 1);
        }
    }

    #[test]
    fn value_bounds_are_inclusive_of_min() {
        for tier in RarityTier::ALL {
            let config = tier.config();
            assert_eq!(value_for_roll(tier, 0.0), config.min_value);
            assert!(value_for_roll(tier, 1.0 - f64::EPSILON) <= config.max_value);
        }
    }

    #[test]
    fn largest_effect_count_is_legendary() {
        assert_eq!(max_effect_count(), 5);
    }

    #[test]
    fn legendary_always_carries_five_effects() {
        let mut rng = seeded(11);
        for _ in 0..20 {
            assert_eq!(effect_count(RarityTier::Legendary, &mut rng), 5);
        }
    }

    #[test]
    fn storage_codes_round_trip() {
        for (code, tier) in [("c", RarityTier::Common), ("l", RarityTier::Legendary)] {
            assert_eq!(RarityTier::from_code(code), Some(tier));
        }
        assert_eq!(RarityTier::from_code("x"), None);
    }
}
