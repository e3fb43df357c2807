//! Configuration for prompt-forge.
//!
//! Loaded from YAML; every field has a default so an empty file (or no file
//! at all) yields a working configuration.
//!
//! ```yaml
//! provider:
//!   api_base: https://api.openai.com/v1
//!   api_key_env: OPENAI_API_KEY
//! fetcher:
//!   initial: { temperature: 0.65, model: gpt-3.5-turbo }
//!   escalation:
//!     - { temperature: 0.85, model: gpt-4-1106-preview }
//! queue:
//!   max_refill_attempts: 50
//! themes:
//!   images: ["Neon Nights", "Arctic Silence"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fetcher::SamplingTier;
use crate::prompts::{default_themes, PromptCategory};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptForgeConfig {
    pub provider: ProviderConfig,
    pub call: CallConfig,
    pub fetcher: FetcherConfig,
    pub queue: QueueConfig,
    pub themes: ThemesConfig,
}

impl PromptForgeConfig {
    /// Reads and validates a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parses and validates YAML text. Empty text gives the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetcher.text_batch_size == 0 || self.fetcher.images_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "fetcher batch sizes must be at least 1".to_string(),
            ));
        }
        if self.fetcher.levels == 0 {
            return Err(ConfigError::Invalid(
                "fetcher.levels must be at least 1".to_string(),
            ));
        }
        if self.fetcher.seed_upper_bound == 0 {
            return Err(ConfigError::Invalid(
                "fetcher.seed_upper_bound must be at least 1".to_string(),
            ));
        }
        let tiers = std::iter::once(&self.fetcher.initial).chain(&self.fetcher.escalation);
        for tier in tiers {
            if !(0.0..=2.0).contains(&tier.temperature) {
                return Err(ConfigError::Invalid(format!(
                    "temperature {} for model '{}' is outside 0.0..=2.0",
                    tier.temperature, tier.model
                )));
            }
            if tier.model.trim().is_empty() {
                return Err(ConfigError::Invalid("sampling tier with empty model".to_string()));
            }
        }
        if self.queue.max_refill_attempts == Some(0) {
            return Err(ConfigError::Invalid(
                "queue.max_refill_attempts must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where and how to reach the LLM provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// HTTP client timeout.
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Retry policy for a single provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    pub attempts: u32,
    pub backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff_ms: 500,
            timeout_secs: 60,
        }
    }
}

/// List fetcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Items one text-question instruction is expected to yield.
    pub text_batch_size: usize,
    /// Items one image-scenario instruction is expected to yield.
    pub images_batch_size: usize,
    /// Complexity and relevance both range over `1..=levels`.
    pub levels: u32,
    /// Tier used for the first call of every instruction.
    pub initial: SamplingTier,
    /// Tiers used for retries, indexed by retry number.
    pub escalation: Vec<SamplingTier>,
    /// Retries per instruction whose reply held no list.
    pub max_retries: u32,
    /// Seeds are drawn from `1..=seed_upper_bound`.
    pub seed_upper_bound: u64,
    /// Fixed RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            text_batch_size: 10,
            images_batch_size: 20,
            levels: 20,
            initial: SamplingTier::new(0.65, "gpt-3.5-turbo"),
            escalation: vec![SamplingTier::new(0.85, "gpt-4-1106-preview")],
            max_retries: 5,
            seed_upper_bound: 10_000,
            rng_seed: None,
        }
    }
}

/// Queue settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Give up replenishing a cell after this many failed fetch rounds.
    /// `None` retries forever.
    pub max_refill_attempts: Option<u32>,
    /// Pause between failed fetch rounds.
    pub refill_backoff_ms: u64,
    /// Where the CLI persists queue state.
    pub state_path: PathBuf,
    /// Fixed RNG seed for theme selection.
    pub rng_seed: Option<u64>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_refill_attempts: None,
            refill_backoff_ms: 0,
            state_path: PathBuf::from("state.json"),
            rng_seed: None,
        }
    }
}

/// Theme pools per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemesConfig {
    pub text: Vec<String>,
    pub images: Vec<String>,
}

impl Default for ThemesConfig {
    fn default() -> Self {
        Self {
            text: default_themes(PromptCategory::Text),
            images: default_themes(PromptCategory::Images),
        }
    }
}

impl ThemesConfig {
    pub fn pool(&self, category: PromptCategory) -> &[String] {
        match category {
            PromptCategory::Text => &self.text,
            PromptCategory::Images => &self.images,
        }
    }
}
