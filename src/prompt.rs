//! Image and video prompt composition.
//!
//! Composition itself is pure string formatting: the same traits, style
//! descriptors, flags and collection tags always give byte-identical output.
//! The style descriptors are drawn separately by [`StyleDescriptors::sample`]
//! on every generation unless the caller pins them.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::catalog::{MotionTable, StylePools};
use crate::sampler::SampledTraits;

/// Appended verbatim at the end of every image prompt.
pub const NEGATIVE_PROMPT: &str = "Negative prompt: outlines, black outlines, stroke lines, line art, sketch, hand-drawn, photorealistic, 3d render, gradients, text, watermark, signature, blurry, noisy texture";

/// Inserted ahead of the negative prompt when stronger style is requested.
pub const STRONGER_STYLE_CLAUSE: &str =
    "HIGHEST PRIORITY: no outlines, shapes only, pure vector, minimalist";

/// Fallback motion for actions missing from the lookup table.
pub const DEFAULT_ACTION_MOTION: &str = "move dynamically";
/// Fallback vibe for actions missing from the lookup table.
pub const DEFAULT_ACTION_VIBE: &str = "fluid";
/// Fallback motion for backgrounds missing from the lookup table.
pub const DEFAULT_BACKGROUND_MOTION: &str = "move gently";

/// The style descriptors mixed into an image prompt.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct StyleDescriptors {
    /// Shape construction
    pub shape_style: String,
    /// Color application
    pub color_application: String,
    /// Edge treatment
    pub line_treatment: String,
    /// Framing
    pub composition: String,
    /// Character detail level
    pub character_detail: String,
    /// Background simplicity level
    pub background_simplicity: String,
    /// Quality booster
    pub quality_booster: String,
}

impl StyleDescriptors {
    /// One uniform draw per pool, in field order.
    pub fn sample<R: Rng + ?Sized>(pools: &StylePools, rng: &mut R) -> Self {
        let mut pick = |pool: &[String]| pool.choose(rng).cloned().unwrap_or_default();
        Self {
            shape_style: pick(&pools.shape_styles),
            color_application: pick(&pools.color_applications),
            line_treatment: pick(&pools.line_treatments),
            composition: pick(&pools.compositions),
            character_detail: pick(&pools.character_details),
            background_simplicity: pick(&pools.background_simplicity),
            quality_booster: pick(&pools.quality_boosters),
        }
    }
}

/// Flags that change the image prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PromptOptions {
    /// Prepend the high-priority flat style clause before the negative prompt
    pub stronger_style: bool,
    /// Tags of the active collection, required as style elements
    pub collection_tags: Vec<String>,
}

/// Both prompt texts for one generation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ComposedPrompts {
    /// Prompt for the image model
    pub image: String,
    /// Prompt for a downstream video model
    pub video: String,
}

/// Builds the image generation prompt.
pub fn compose_image_prompt(
    traits: &SampledTraits,
    style: &StyleDescriptors,
    options: &PromptOptions,
) -> String {
    let effects = if traits.effects.is_empty() {
        "none".to_string()
    } else {
        traits.effects.join(", ")
    };

    let mut prompt = format!(
        "{} {}, flat illustration, simple geometric shapes, clean vector aesthetic, no outlines, \
         {}, {}, {}, color scheme: {}, background: {}, effects: {}, {}, {}, {}, {}",
        traits.character,
        traits.action.to_lowercase(),
        style.shape_style,
        style.color_application,
        style.line_treatment,
        traits.color_scheme,
        traits.background,
        effects,
        style.composition,
        style.character_detail,
        style.background_simplicity,
        style.quality_booster,
    );

    let tags: Vec<&str> = options
        .collection_tags
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect();
    if !tags.is_empty() {
        prompt.push_str(", must include these style elements: ");
        prompt.push_str(&tags.join(", "));
    }

    prompt.push_str(". ");
    if options.stronger_style {
        prompt.push_str(STRONGER_STYLE_CLAUSE);
        prompt.push_str(". ");
    }
    prompt.push_str(NEGATIVE_PROMPT);
    prompt
}

/// Builds the looping video prompt from the motion lookup tables.
pub fn compose_video_prompt(traits: &SampledTraits, motions: &MotionTable) -> String {
    let (motion, vibe) = motions
        .actions
        .get(&traits.action)
        .map(|entry| (entry.motion.as_str(), entry.vibe.as_str()))
        .unwrap_or((DEFAULT_ACTION_MOTION, DEFAULT_ACTION_VIBE));
    let background_motion = motions
        .backgrounds
        .get(&traits.background)
        .map(String::as_str)
        .unwrap_or(DEFAULT_BACKGROUND_MOTION);

    format!(
        "Create a 5-second perfect loop animation. \
         The {character} should {motion}. The movement should feel {vibe}. \
         In the background, {background_motion}. \
         The camera stays fixed with no zoom, pan, or rotation. \
         The first and last frames must match exactly so the loop is seamless. \
         Keep the flat 2D vector illustration style, shapes, and colors of the original image throughout.",
        character = traits.character.to_lowercase(),
    )
}

/// Composes both prompts.
pub fn compose(
    traits: &SampledTraits,
    style: &StyleDescriptors,
    options: &PromptOptions,
    motions: &MotionTable,
) -> ComposedPrompts {
    ComposedPrompts {
        image: compose_image_prompt(traits, style, options),
        video: compose_video_prompt(traits, motions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::random::seeded;

    fn traits() -> SampledTraits {
        SampledTraits {
            character: "Skater Fox".to_string(),
            action: "Parkour vaulting".to_string(),
            background: "Clear blue sky with clouds".to_string(),
            color_scheme: "Neon nights".to_string(),
            effects: vec!["Sparkles".to_string(), "Light rays".to_string()],
        }
    }

    fn style() -> StyleDescriptors {
        let styles = Catalog::bundled().expect("bundled catalog").styles;
        let first = |pool: &[String]| pool.first().cloned().expect("non-empty pool");
        StyleDescriptors {
            shape_style: first(&styles.shape_styles),
            color_application: first(&styles.color_applications),
            line_treatment: first(&styles.line_treatments),
            composition: first(&styles.compositions),
            character_detail: first(&styles.character_details),
            background_simplicity: first(&styles.background_simplicity),
            quality_booster: first(&styles.quality_boosters),
        }
    }

    #[test]
    fn image_prompt_contains_traits_and_style() {
        let prompt = compose_image_prompt(&traits(), &style(), &PromptOptions::default());
        assert!(prompt.starts_with("Skater Fox parkour vaulting, flat illustration"));
        assert!(prompt.contains("no outlines"));
        assert!(prompt.contains("color scheme: Neon nights"));
        assert!(prompt.contains("background: Clear blue sky with clouds"));
        assert!(prompt.contains("effects: Sparkles, Light rays"));
        assert!(prompt.contains("built from simple circles and rounded rectangles"));
        assert!(!prompt.contains(STRONGER_STYLE_CLAUSE));
        assert!(prompt.ends_with(NEGATIVE_PROMPT));
    }

    #[test]
    fn stronger_style_precedes_negative_prompt() {
        let options = PromptOptions {
            stronger_style: true,
            collection_tags: Vec::new(),
        };
        let prompt = compose_image_prompt(&traits(), &style(), &options);
        let expected_tail = format!("{STRONGER_STYLE_CLAUSE}. {NEGATIVE_PROMPT}");
        assert!(prompt.ends_with(&expected_tail));
    }

    #[test]
    fn collection_tags_are_required_elements() {
        let options = PromptOptions {
            stronger_style: false,
            collection_tags: vec!["retro".to_string(), " ".to_string(), "gold".to_string()],
        };
        let prompt = compose_image_prompt(&traits(), &style(), &options);
        assert!(prompt.contains("must include these style elements: retro, gold."));
        assert!(prompt.ends_with(NEGATIVE_PROMPT));
    }

    #[test]
    fn empty_effects_render_as_none() {
        let mut traits = traits();
        traits.effects.clear();
        let prompt = compose_image_prompt(&traits, &style(), &PromptOptions::default());
        assert!(prompt.contains("effects: none"));
    }

    #[test]
    fn video_prompt_uses_lookup_tables() {
        let catalog = Catalog::bundled().expect("bundled catalog");
        let prompt = compose_video_prompt(&traits(), &catalog.motions);
        assert!(prompt.contains("The skater fox should"));
        assert!(prompt.contains(
            "smoothly vault over an invisible obstacle with fluid grace and a perfect landing"
        ));
        assert!(prompt.contains("The movement should feel athletic."));
        assert!(prompt.contains("white fluffy clouds drifting slowly from left to right"));
        assert!(prompt.contains("5-second perfect loop"));
    }

    #[test]
    fn video_prompt_falls_back_for_unknown_entries() {
        let mut traits = traits();
        traits.action = "Moonwalking".to_string();
        traits.background = "Volcano".to_string();
        let prompt = compose_video_prompt(&traits, &MotionTable::default());
        assert!(prompt.contains("should move dynamically. The movement should feel fluid."));
        assert!(prompt.contains("In the background, move gently."));
    }

    #[test]
    fn style_sampling_picks_from_each_pool() {
        let styles = Catalog::bundled().expect("bundled catalog").styles;
        let style = StyleDescriptors::sample(&styles, &mut rand::rng());
        assert!(styles.shape_styles.contains(&style.shape_style));
        assert!(styles.color_applications.contains(&style.color_application));
        assert!(styles.line_treatments.contains(&style.line_treatment));
        assert!(styles.compositions.contains(&style.composition));
        assert!(styles.character_details.contains(&style.character_detail));
        assert!(styles.background_simplicity.contains(&style.background_simplicity));
        assert!(styles.quality_boosters.contains(&style.quality_booster));
    }

    #[test]
    fn same_seed_same_style() {
        let styles = Catalog::bundled().expect("bundled catalog").styles;
        assert_eq!(
            StyleDescriptors::sample(&styles, &mut seeded(9)),
            StyleDescriptors::sample(&styles, &mut seeded(9))
        );
    }
}
