//! LLM list fetcher.
//!
//! Asks the provider for a themed batch of prompts and turns the replies into
//! one flat list. A fetch round:
//!
//! 1. Builds `ceil(quantity / batch_size)` instructions for the list kind
//!    (text questions sample distinct complexity/relevance pairings; image
//!    scenarios repeat one template)
//! 2. Sends all of them concurrently at the initial sampling tier, each with
//!    its own random seed
//! 3. Extracts a list from every reply; an instruction whose reply holds no
//!    list is retried up to `max_retries` times, climbing the escalation
//!    ladder with a fresh seed each time
//! 4. Concatenates the extracted items in instruction order
//!
//! A round where no instruction produced anything returns `None`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::join_all;
use rand::seq::SliceRandom;
use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::PromptForgeConfig;
use crate::llm::{complete, CallPolicy, LlmProvider, Message};
use crate::prompts::{image_scenario_instruction, text_question_instruction, ListKind};
use crate::utils::extract_list;

/// Theme used when a caller does not supply one.
pub const FALLBACK_THEME: &str = "general knowledge";

/// Temperature and model used for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingTier {
    pub temperature: f64,
    pub model: String,
}

impl SamplingTier {
    pub fn new(temperature: f64, model: impl Into<String>) -> Self {
        Self {
            temperature,
            model: model.into(),
        }
    }
}

/// Which tier each call of an instruction uses.
///
/// The first call uses `initial`; retry `i` uses `ladder[i]`, or the last
/// rung once `i` runs past the end of the ladder.
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationPolicy {
    pub initial: SamplingTier,
    pub ladder: Vec<SamplingTier>,
    pub max_retries: u32,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            initial: SamplingTier::new(0.65, "gpt-3.5-turbo"),
            ladder: vec![SamplingTier::new(0.85, "gpt-4-1106-preview")],
            max_retries: 5,
        }
    }
}

impl EscalationPolicy {
    pub fn tier_for_retry(&self, retry: usize) -> &SamplingTier {
        self.ladder
            .get(retry)
            .or_else(|| self.ladder.last())
            .unwrap_or(&self.initial)
    }
}

/// Anything that can produce a fresh list of prompts for a theme.
#[async_trait]
pub trait PromptSource: Send + Sync {
    /// Returns at least one item, or `None` if nothing usable came back.
    async fn fetch_list(
        &self,
        kind: ListKind,
        quantity_needed: usize,
        theme: Option<&str>,
    ) -> Option<Vec<String>>;
}

/// Fetches prompt lists from an LLM provider.
pub struct ListFetcher {
    provider: Arc<dyn LlmProvider>,
    policy: EscalationPolicy,
    call_policy: CallPolicy,
    text_batch_size: usize,
    images_batch_size: usize,
    levels: u32,
    seed_upper_bound: u64,
    rng: Mutex<ChaCha8Rng>,
}

impl ListFetcher {
    /// Creates a fetcher with default settings.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::from_config(provider, &PromptForgeConfig::default())
    }

    /// Creates a fetcher from the `fetcher` and `call` config sections.
    pub fn from_config(provider: Arc<dyn LlmProvider>, config: &PromptForgeConfig) -> Self {
        let fetcher = &config.fetcher;
        Self {
            provider,
            policy: EscalationPolicy {
                initial: fetcher.initial.clone(),
                ladder: fetcher.escalation.clone(),
                max_retries: fetcher.max_retries,
            },
            call_policy: CallPolicy::from(&config.call),
            text_batch_size: fetcher.text_batch_size.max(1),
            images_batch_size: fetcher.images_batch_size.max(1),
            levels: fetcher.levels.max(1),
            seed_upper_bound: fetcher.seed_upper_bound.max(1),
            rng: Mutex::new(create_rng(fetcher.rng_seed)),
        }
    }

    /// Replaces the escalation policy.
    pub fn with_policy(mut self, policy: EscalationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the per-call retry policy.
    pub fn with_call_policy(mut self, call_policy: CallPolicy) -> Self {
        self.call_policy = call_policy;
        self
    }

    /// Sets the number of complexity/relevance levels.
    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels.max(1);
        self
    }

    /// Reseeds the fetcher's RNG for reproducible instruction sampling and seeds.
    pub fn with_rng_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    /// Items one instruction of this kind is expected to yield.
    pub fn batch_size(&self, kind: ListKind) -> usize {
        match kind {
            ListKind::TextQuestions => self.text_batch_size,
            ListKind::ImagesQuestions => self.images_batch_size,
        }
    }

    /// Picks the instructions for one round.
    ///
    /// Always at least one instruction, even for a zero quantity.
    pub fn build_instructions(
        &self,
        kind: ListKind,
        quantity_needed: usize,
        theme: Option<&str>,
    ) -> Vec<String> {
        let batch_size = self.batch_size(kind);
        let calls = quantity_needed.div_ceil(batch_size).max(1);
        let theme = theme.unwrap_or(FALLBACK_THEME);

        match kind {
            ListKind::TextQuestions => {
                let levels = self.levels;
                let mut pool: Vec<String> = (1..=levels)
                    .flat_map(|complexity| (1..=levels).map(move |relevance| (complexity, relevance)))
                    .map(|(complexity, relevance)| {
                        text_question_instruction(theme, batch_size, complexity, relevance, levels)
                    })
                    .collect();
                pool.shuffle(&mut *self.lock_rng());
                pool.truncate(calls);
                pool
            }
            ListKind::ImagesQuestions => {
                vec![image_scenario_instruction(theme, batch_size); calls]
            }
        }
    }

    /// Runs one fetch round. See the module docs for the algorithm.
    pub async fn fetch_list(
        &self,
        kind: ListKind,
        quantity_needed: usize,
        theme: Option<&str>,
    ) -> Option<Vec<String>> {
        let round_id = Uuid::new_v4();
        let span = tracing::info_span!("fetch_round", %round_id, %kind, quantity_needed);
        self.run_round(kind, quantity_needed, theme)
            .instrument(span)
            .await
    }

    async fn run_round(
        &self,
        kind: ListKind,
        quantity_needed: usize,
        theme: Option<&str>,
    ) -> Option<Vec<String>> {
        let instructions = self.build_instructions(kind, quantity_needed, theme);
        tracing::debug!(
            instructions = instructions.len(),
            theme = theme.unwrap_or(FALLBACK_THEME),
            "Selected instructions"
        );

        let initial = &self.policy.initial;
        let first_pass = join_all(instructions.iter().map(|instruction| {
            let messages = [Message::user(instruction.as_str())];
            let seed = self.next_seed();
            async move {
                complete(
                    self.provider.as_ref(),
                    &messages,
                    initial.temperature,
                    &initial.model,
                    seed,
                    &self.call_policy,
                )
                .await
            }
        }))
        .await;

        let mut collected = Vec::new();
        for (index, (instruction, reply)) in instructions.iter().zip(first_pass).enumerate() {
            match reply.as_deref().and_then(extract_reply) {
                Some(items) => collected.extend(items),
                None => {
                    tracing::warn!(instruction = index, "No list in first reply, escalating");
                    if let Some(items) = self.retry_instruction(index, instruction).await {
                        collected.extend(items);
                    }
                }
            }
        }

        if collected.is_empty() {
            tracing::error!("No valid lists found after processing and retries");
            return None;
        }

        tracing::info!(items = collected.len(), "Fetched list");
        Some(collected)
    }

    async fn retry_instruction(&self, index: usize, instruction: &str) -> Option<Vec<String>> {
        let messages = [Message::user(instruction)];
        for retry in 0..self.policy.max_retries {
            let tier = self.policy.tier_for_retry(retry as usize);
            let seed = self.next_seed();
            let reply = complete(
                self.provider.as_ref(),
                &messages,
                tier.temperature,
                &tier.model,
                seed,
                &self.call_policy,
            )
            .await;

            match reply.as_deref().and_then(extract_reply) {
                Some(items) => return Some(items),
                None => tracing::warn!(
                    instruction = index,
                    retry = retry + 1,
                    model = %tier.model,
                    "No list found in retry reply"
                ),
            }
        }

        tracing::error!(
            instruction = index,
            retries = self.policy.max_retries,
            "Instruction produced no list"
        );
        None
    }

    fn next_seed(&self) -> u64 {
        self.lock_rng().random_range(1..=self.seed_upper_bound)
    }

    fn lock_rng(&self) -> std::sync::MutexGuard<'_, ChaCha8Rng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PromptSource for ListFetcher {
    async fn fetch_list(
        &self,
        kind: ListKind,
        quantity_needed: usize,
        theme: Option<&str>,
    ) -> Option<Vec<String>> {
        ListFetcher::fetch_list(self, kind, quantity_needed, theme).await
    }
}

/// Extracts the usable items from one reply; an empty result counts as no list.
fn extract_reply(reply: &str) -> Option<Vec<String>> {
    let items: Vec<String> = extract_list(&reply.replace('\n', " "))?
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}
