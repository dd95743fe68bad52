//! The record produced by one generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rarity::RarityTier;
use crate::sampler::SampledTraits;

/// One generated artwork with its prompts, traits, and simulated value.
///
/// Immutable after creation except for `is_favorite` and `collection_id`,
/// which the persistence layer updates.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GeneratedItem {
    /// Unique id, time-ordered
    pub id: Uuid,
    /// Owning user
    pub owner_id: String,
    /// Image prompt sent to the synthesis service
    pub prompt: String,
    /// Companion video prompt
    pub video_prompt: String,
    /// Simulated ETH value, inside the tier's range
    pub value_eth: f64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Public reference to the stored image
    pub image_url: Option<String>,
    /// Resolved tier
    pub rarity: RarityTier,
    /// Sampled traits
    #[serde(flatten)]
    pub traits: SampledTraits,
    /// Favorite flag, false at creation
    pub is_favorite: bool,
    /// Collection the item belongs to
    pub collection_id: Option<i32>,
}
