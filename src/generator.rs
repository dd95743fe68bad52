//! Generation orchestrator.
//!
//! One [`Generator`] owns the in-flight token: a second generation started
//! while one (or a batch) is running is rejected, never queued. Within a
//! generation the steps run strictly in order: sample, compose, synthesize,
//! upload, persist. There is no retry and no cancellation.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rand::Rng;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::db::entities::{collections, items};
use crate::error::{BatchError, GenerationError};
use crate::item::GeneratedItem;
use crate::prompt::{ComposedPrompts, PromptOptions, StyleDescriptors, compose};
use crate::random::{SharedRng, from_entropy};
use crate::rarity::{self, RarityRoll};
use crate::sampler::{ForcedTraits, SampledTraits, sample_traits};
use crate::services::{AssetStore, ImageSynthesizer};

/// What the caller asks for.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenerateRequest {
    /// Trait values to reuse instead of sampling
    pub forced_traits: ForcedTraits,
    /// Add the high-priority flat style clause
    pub stronger_style: bool,
    /// Collection whose tags become required style elements; the item joins it
    pub collection_id: Option<i32>,
    /// Pinned style descriptors; sampled fresh when absent
    pub style: Option<StyleDescriptors>,
}

/// Where the current (or last) generation is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GenerationPhase {
    /// Nothing has run yet
    Idle = 0,
    /// Drawing rarity, traits and style
    Sampling = 1,
    /// Formatting prompts
    Prompting = 2,
    /// Waiting on the image service
    Synthesizing = 3,
    /// Storing the image
    Uploading = 4,
    /// Recording the item
    Persisting = 5,
    /// Last generation succeeded
    Done = 6,
    /// Last generation failed
    Failed = 7,
}

impl GenerationPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Sampling,
            2 => Self::Prompting,
            3 => Self::Synthesizing,
            4 => Self::Uploading,
            5 => Self::Persisting,
            6 => Self::Done,
            7 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// Reported after each completed unit of a batch.
#[derive(Clone, Copy, Debug)]
pub struct BatchProgress<'a> {
    /// Units finished so far, including this one
    pub completed: usize,
    /// Units requested
    pub total: usize,
    /// The item just produced
    pub item: &'a GeneratedItem,
}

/// Clears the in-flight token on every exit path.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct Draft {
    roll: RarityRoll,
    traits: SampledTraits,
    prompts: ComposedPrompts,
}

/// Runs generations against the configured services.
pub struct Generator {
    catalog: Arc<Catalog>,
    synthesizer: Arc<dyn ImageSynthesizer>,
    assets: Arc<dyn AssetStore>,
    db: Arc<DatabaseConnection>,
    rng: Mutex<SharedRng>,
    in_flight: AtomicBool,
    phase: AtomicU8,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("in_flight", &self.in_flight)
            .field("phase", &self.phase())
            .finish()
    }
}

impl Generator {
    /// Generator drawing from an entropy-seeded `StdRng`.
    pub fn new(
        catalog: Arc<Catalog>,
        synthesizer: Arc<dyn ImageSynthesizer>,
        assets: Arc<dyn AssetStore>,
        db: Arc<DatabaseConnection>,
    ) -> Self {
        Self {
            catalog,
            synthesizer,
            assets,
            db,
            rng: Mutex::new(Box::new(from_entropy())),
            in_flight: AtomicBool::new(false),
            phase: AtomicU8::new(GenerationPhase::Idle as u8),
        }
    }

    /// Replaces the random source, eg with a seeded one to replay a run.
    pub fn with_random(mut self, rng: impl Rng + Send + 'static) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    /// The static configuration in use.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Current phase.
    pub fn phase(&self) -> GenerationPhase {
        GenerationPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Whether a generation or batch currently holds the in-flight token.
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn set_phase(&self, phase: GenerationPhase) {
        debug!("Generation phase: {phase:?}");
        self.phase.store(phase as u8, Ordering::Release);
    }

    fn fail(&self, err: impl Into<GenerationError>) -> GenerationError {
        self.set_phase(GenerationPhase::Failed);
        err.into()
    }

    fn claim(&self) -> Result<InFlightGuard<'_>, GenerationError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GenerationError::Busy)?;
        Ok(InFlightGuard {
            flag: &self.in_flight,
        })
    }

    /// Runs one generation for `owner_id`.
    pub async fn generate(
        &self,
        owner_id: &str,
        request: &GenerateRequest,
    ) -> Result<GeneratedItem, GenerationError> {
        let _guard = self.claim()?;
        self.run_unit(owner_id, request).await
    }

    /// Runs `count` generations one after another, holding the in-flight
    /// token throughout. Stops at the first failure, keeping what finished.
    pub async fn generate_batch<F>(
        &self,
        owner_id: &str,
        request: &GenerateRequest,
        count: usize,
        mut on_progress: F,
    ) -> Result<Vec<GeneratedItem>, BatchError>
    where
        F: FnMut(BatchProgress<'_>) + Send,
    {
        let _guard = self.claim().map_err(|cause| BatchError {
            completed: Vec::new(),
            total: count,
            cause,
        })?;

        let mut completed: Vec<GeneratedItem> = Vec::with_capacity(count);
        for unit in 1..=count {
            match self.run_unit(owner_id, request).await {
                Ok(item) => {
                    info!("Batch progress for {owner_id}: {unit}/{count}");
                    completed.push(item);
                    if let Some(item) = completed.last() {
                        on_progress(BatchProgress {
                            completed: unit,
                            total: count,
                            item,
                        });
                    }
                }
                Err(cause) => {
                    warn!("Batch for {owner_id} stopped at unit {unit}/{count}: {cause}");
                    return Err(BatchError {
                        completed,
                        total: count,
                        cause,
                    });
                }
            }
        }
        Ok(completed)
    }

    fn prepare(&self, request: &GenerateRequest, collection_tags: Vec<String>) -> Draft {
        self.set_phase(GenerationPhase::Sampling);
        let (roll, traits, style) = {
            let mut guard = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let rng = &mut **guard;
            let roll = rarity::resolve(rng);
            let traits = sample_traits(
                &self.catalog.traits,
                &request.forced_traits,
                roll.tier,
                rng,
            );
            let style = match &request.style {
                Some(style) => style.clone(),
                None => StyleDescriptors::sample(&self.catalog.styles, rng),
            };
            (roll, traits, style)
        };

        self.set_phase(GenerationPhase::Prompting);
        let options = PromptOptions {
            stronger_style: request.stronger_style,
            collection_tags,
        };
        let prompts = compose(&traits, &style, &options, &self.catalog.motions);
        Draft {
            roll,
            traits,
            prompts,
        }
    }

    async fn run_unit(
        &self,
        owner_id: &str,
        request: &GenerateRequest,
    ) -> Result<GeneratedItem, GenerationError> {
        let collection_tags = match request.collection_id {
            Some(id) => collections::find_for_owner(self.db.as_ref(), owner_id, id)
                .await
                .map_err(|err| self.fail(err))?
                .ok_or_else(|| self.fail(GenerationError::CollectionNotFound(id)))?
                .tag_list(),
            None => Vec::new(),
        };

        let draft = self.prepare(request, collection_tags);
        let id = Uuid::now_v7();

        self.set_phase(GenerationPhase::Synthesizing);
        let bytes = self
            .synthesizer
            .synthesize(&draft.prompts.image)
            .await
            .map_err(|err| self.fail(err))?;

        self.set_phase(GenerationPhase::Uploading);
        let image_url = self
            .assets
            .upload(owner_id, &id, &bytes)
            .await
            .map_err(|err| self.fail(err))?;

        let item = GeneratedItem {
            id,
            owner_id: owner_id.to_string(),
            prompt: draft.prompts.image,
            video_prompt: draft.prompts.video,
            value_eth: draft.roll.value,
            created_at: Utc::now(),
            image_url: Some(image_url),
            rarity: draft.roll.tier,
            traits: draft.traits,
            is_favorite: false,
            collection_id: request.collection_id,
        };

        self.set_phase(GenerationPhase::Persisting);
        items::insert(self.db.as_ref(), &item)
            .await
            .map_err(|err| self.fail(err))?;

        self.set_phase(GenerationPhase::Done);
        info!(
            "Generated {} item {} for {} ({:.4} ETH)",
            item.rarity, item.id, owner_id, item.value_eth
        );
        Ok(item)
    }
}
