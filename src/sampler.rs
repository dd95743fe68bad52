//! Trait sampling.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::catalog::TraitPools;
use crate::rarity::{RarityTier, effect_count};

/// Caller-supplied trait values that replace sampling, used by remix and
/// regenerate flows. Values are trusted and not checked against the pools.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ForcedTraits {
    /// Forced character
    pub character: Option<String>,
    /// Forced action
    pub action: Option<String>,
    /// Forced background
    pub background: Option<String>,
    /// Forced color scheme
    pub color_scheme: Option<String>,
    /// Forced effect list, used as-is even when empty
    pub effects: Option<Vec<String>>,
}

/// One value per trait pool.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SampledTraits {
    /// Character name
    pub character: String,
    /// Action
    pub action: String,
    /// Background
    pub background: String,
    /// Color scheme
    pub color_scheme: String,
    /// Effects, in shuffled order
    pub effects: Vec<String>,
}

impl SampledTraits {
    /// Converts back into a full set of forced traits, for remixing.
    pub fn to_forced(&self) -> ForcedTraits {
        ForcedTraits {
            character: Some(self.character.clone()),
            action: Some(self.action.clone()),
            background: Some(self.background.clone()),
            color_scheme: Some(self.color_scheme.clone()),
            effects: Some(self.effects.clone()),
        }
    }
}

fn forced_or_pick<R: Rng + ?Sized>(forced: Option<&String>, pool: &[String], rng: &mut R) -> String {
    match forced {
        Some(value) => value.clone(),
        None => pool.choose(rng).cloned().unwrap_or_default(),
    }
}

/// Draws one value per pool. Forced values are used verbatim and consume no
/// draw; unforced effects are a shuffled prefix sized by the tier. Catalog
/// validation guarantees the effect pool covers every tier's count.
pub fn sample_traits<R: Rng + ?Sized>(
    pools: &TraitPools,
    forced: &ForcedTraits,
    tier: RarityTier,
    rng: &mut R,
) -> SampledTraits {
    let character = forced_or_pick(forced.character.as_ref(), &pools.characters, rng);
    let action = forced_or_pick(forced.action.as_ref(), &pools.actions, rng);
    let background = forced_or_pick(forced.background.as_ref(), &pools.backgrounds, rng);
    let color_scheme = forced_or_pick(forced.color_scheme.as_ref(), &pools.color_schemes, rng);

    let effects = match &forced.effects {
        Some(effects) => effects.clone(),
        None => {
            let mut shuffled = pools.effects.clone();
            shuffled.shuffle(rng);
            shuffled.truncate(effect_count(tier, rng));
            shuffled
        }
    };

    SampledTraits {
        character,
        action,
        background,
        color_scheme,
        effects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded;

    fn pools() -> TraitPools {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        TraitPools {
            characters: strings(&["Fox", "Owl", "Cat"]),
            actions: strings(&["Dancing", "Juggling"]),
            backgrounds: strings(&["Void", "Forest"]),
            color_schemes: strings(&["Mono", "Neon"]),
            effects: strings(&["Glow", "Sparkles", "Rays", "Hearts", "Stars", "Confetti"]),
        }
    }

    #[test]
    fn forced_values_are_used_verbatim() {
        let forced = ForcedTraits {
            character: Some("Not In Pool".to_string()),
            action: Some("Floating".to_string()),
            background: Some("Moon".to_string()),
            color_scheme: Some("Gold".to_string()),
            effects: Some(Vec::new()),
        };
        let mut rng = seeded(5);
        let mut untouched = seeded(5);
        let traits = sample_traits(&pools(), &forced, RarityTier::Legendary, &mut rng);
        assert_eq!(traits.character, "Not In Pool");
        assert_eq!(traits.color_scheme, "Gold");
        assert!(traits.effects.is_empty());
        assert_eq!(rng.next_u64(), untouched.next_u64());
    }

    #[test]
    fn unforced_values_come_from_pools() {
        let pools = pools();
        let mut rng = rand::rng();
        for _ in 0..100 {
            let traits = sample_traits(&pools, &ForcedTraits::default(), RarityTier::Rare, &mut rng);
            assert!(pools.characters.contains(&traits.character));
            assert!(pools.actions.contains(&traits.action));
            assert!(pools.backgrounds.contains(&traits.background));
            assert!(pools.color_schemes.contains(&traits.color_scheme));
            assert!(traits.effects.iter().all(|effect| pools.effects.contains(effect)));
        }
    }

    #[test]
    fn same_seed_same_traits() {
        let first = sample_traits(
            &pools(),
            &ForcedTraits::default(),
            RarityTier::Epic,
            &mut seeded(42),
        );
        let second = sample_traits(
            &pools(),
            &ForcedTraits::default(),
            RarityTier::Epic,
            &mut seeded(42),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn effect_counts_respect_tier() {
        let mut rng = rand::rng();
        for tier in RarityTier::ALL {
            let allowed = tier.config().effect_counts;
            for _ in 0..200 {
                let traits = sample_traits(&pools(), &ForcedTraits::default(), tier, &mut rng);
                let count = traits.effects.len();
                assert!(count >= 1);
                assert!(
                    allowed.contains(&count) || (count == 1 && allowed.contains(&0)),
                    "{tier}: {count}"
                );
            }
        }
    }

    #[test]
    fn sampled_effects_are_distinct() {
        let traits = sample_traits(
            &pools(),
            &ForcedTraits::default(),
            RarityTier::Legendary,
            &mut rand::rng(),
        );
        let mut unique = traits.effects.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn remix_reproduces_traits() {
        let mut rng = rand::rng();
        let first = sample_traits(
            &pools(),
            &ForcedTraits::default(),
            RarityTier::Rare,
            &mut rng,
        );
        let again = sample_traits(&pools(), &first.to_forced(), RarityTier::Common, &mut rng);
        assert_eq!(first, again);
    }
}
