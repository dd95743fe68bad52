//! Trait pools, style descriptor pools, and motion lookup tables.
//!
//! The catalog is static configuration: it ships embedded as JSON, can be
//! replaced wholesale by a file given on the command line, and is validated
//! once at startup. Nothing mutates it afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::rarity::max_effect_count;

/// Option pools for the five sampled traits.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TraitPools {
    /// Character names
    pub characters: Vec<String>,
    /// Actions the character performs
    pub actions: Vec<String>,
    /// Scene backgrounds
    pub backgrounds: Vec<String>,
    /// Color scheme descriptions
    pub color_schemes: Vec<String>,
    /// Visual effects; a tier-dependent subset is drawn
    pub effects: Vec<String>,
}

/// Pools for the style descriptors mixed into every image prompt.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StylePools {
    /// How shapes are built
    pub shape_styles: Vec<String>,
    /// How color is laid down
    pub color_applications: Vec<String>,
    /// Edge treatment
    pub line_treatments: Vec<String>,
    /// Framing
    pub compositions: Vec<String>,
    /// How much detail the character gets
    pub character_details: Vec<String>,
    /// How busy the background may be
    pub background_simplicity: Vec<String>,
    /// Generic quality boosters
    pub quality_boosters: Vec<String>,
}

/// Motion phrasing for an action in the video prompt.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ActionMotion {
    /// What the character does during the loop
    pub motion: String,
    /// Adjective describing the rhythm
    pub vibe: String,
}

/// Lookup tables used by the video prompt.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct MotionTable {
    /// Action name to motion description
    #[serde(default)]
    pub actions: BTreeMap<String, ActionMotion>,
    /// Background name to a short motion phrase
    #[serde(default)]
    pub backgrounds: BTreeMap<String, String>,
}

/// The complete static configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Catalog {
    /// Trait pools, flattened into the top level of the JSON document
    #[serde(flatten)]
    pub traits: TraitPools,
    /// Style descriptor pools
    pub styles: StylePools,
    /// Video prompt lookup tables
    #[serde(default)]
    pub motions: MotionTable,
}

/// Errors returned when loading the catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The JSON payload could not be parsed.
    Parse(serde_json::Error),
    /// A pool that sampling draws from is empty.
    EmptyPool(&'static str),
    /// A pool holds an empty or whitespace-only entry.
    BlankEntry(&'static str),
    /// The effects pool cannot cover the largest per-tier effect count.
    TooFewEffects {
        /// Largest count any tier can draw
        required: usize,
        /// Entries in the effects pool
        available: usize,
    },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Failed to read catalog: {err}"),
            Self::Parse(err) => write!(f, "Failed to parse catalog JSON: {err}"),
            Self::EmptyPool(name) => write!(f, "Catalog pool '{name}' is empty"),
            Self::BlankEntry(name) => write!(f, "Catalog pool '{name}' has a blank entry"),
            Self::TooFewEffects {
                required,
                available,
            } => write!(
                f,
                "Catalog needs at least {required} effects, found {available}"
            ),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err)
    }
}

impl Catalog {
    /// The catalog embedded in the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalog.json"));
        Self::from_json(raw)
    }

    /// Loads a replacement catalog from disk.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parses and validates a catalog document.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Either the file at `path`, or the bundled catalog.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::bundled(),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let pools: [(&'static str, &Vec<String>); 12] = [
            ("characters", &self.traits.characters),
            ("actions", &self.traits.actions),
            ("backgrounds", &self.traits.backgrounds),
            ("color_schemes", &self.traits.color_schemes),
            ("effects", &self.traits.effects),
            ("shape_styles", &self.styles.shape_styles),
            ("color_applications", &self.styles.color_applications),
            ("line_treatments", &self.styles.line_treatments),
            ("compositions", &self.styles.compositions),
            ("character_details", &self.styles.character_details),
            ("background_simplicity", &self.styles.background_simplicity),
            ("quality_boosters", &self.styles.quality_boosters),
        ];
        for (name, pool) in pools {
            if pool.is_empty() {
                return Err(CatalogError::EmptyPool(name));
            }
            if pool.iter().any(|entry| entry.trim().is_empty()) {
                return Err(CatalogError::BlankEntry(name));
            }
        }

        let required = max_effect_count();
        let available = self.traits.effects.len();
        if available < required {
            return Err(CatalogError::TooFewEffects {
                required,
                available,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled_json() -> serde_json::Value {
        serde_json::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/data/catalog.json"
        )))
        .expect("parse bundled json")
    }

    #[test]
    fn bundled_catalog_loads() {
        let catalog = Catalog::bundled().expect("bundled catalog");
        assert!(catalog.traits.effects.len() >= 5);
        assert!(catalog.motions.actions.contains_key("Parkour vaulting"));
        assert!(
            catalog
                .motions
                .backgrounds
                .contains_key("Clear blue sky with clouds")
        );
    }

    #[test]
    fn every_bundled_action_and_background_has_motion() {
        let catalog = Catalog::bundled().expect("bundled catalog");
        for action in &catalog.traits.actions {
            assert!(catalog.motions.actions.contains_key(action), "{action}");
        }
        for background in &catalog.traits.backgrounds {
            assert!(
                catalog.motions.backgrounds.contains_key(background),
                "{background}"
            );
        }
    }

    #[test]
    fn empty_pool_is_rejected() {
        let mut value = bundled_json();
        value["actions"] = serde_json::json!([]);
        let err = Catalog::from_json(&value.to_string()).expect_err("empty actions");
        assert!(matches!(err, CatalogError::EmptyPool("actions")));
    }

    #[test]
    fn blank_entry_is_rejected() {
        let mut value = bundled_json();
        value["backgrounds"]
            .as_array_mut()
            .expect("backgrounds array")
            .push(serde_json::json!("   "));
        let err = Catalog::from_json(&value.to_string()).expect_err("blank background");
        assert!(matches!(err, CatalogError::BlankEntry("backgrounds")));

        let mut value = bundled_json();
        value["styles"]["quality_boosters"] = serde_json::json!(["sharp", ""]);
        let err = Catalog::from_json(&value.to_string()).expect_err("blank booster");
        assert!(matches!(err, CatalogError::BlankEntry("quality_boosters")));
    }

    #[test]
    fn effects_pool_must_cover_legendary() {
        let mut value = bundled_json();
        value["effects"] = serde_json::json!(["Glow", "Rays", "Sparkles"]);
        let err = Catalog::from_json(&value.to_string()).expect_err("three effects");
        assert!(matches!(
            err,
            CatalogError::TooFewEffects {
                required: 5,
                available: 3
            }
        ));
        assert_eq!(
            err.to_string(),
            "Catalog needs at least 5 effects, found 3"
        );
    }

    #[test]
    fn missing_motions_default_to_empty_tables() {
        let raw = r#"{
            "characters": ["Fox"], "actions": ["Waving"], "backgrounds": ["Void"],
            "color_schemes": ["Mono"],
            "effects": ["Glow", "Rays", "Hearts", "Stars", "Confetti"],
            "styles": {
                "shape_styles": ["a"], "color_applications": ["b"], "line_treatments": ["c"],
                "compositions": ["d"], "character_details": ["e"],
                "background_simplicity": ["f"], "quality_boosters": ["g"]
            }
        }"#;
        let catalog = Catalog::from_json(raw).expect("minimal catalog");
        assert!(catalog.motions.actions.is_empty());
    }
}
