//! prompt-forge: prompt acquisition for network validators.
//!
//! This library asks an LLM for themed lists of prompts, recovers those lists
//! from free-form replies and serves them one at a time from a replenishing
//! queue.

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod llm;
pub mod prompts;
pub mod queue;
pub mod utils;

// Re-export commonly used types
pub use config::{PromptForgeConfig, ThemesConfig};
pub use error::{ConfigError, LlmError, ParseEnumError, QueueError, StateError};
pub use fetcher::{EscalationPolicy, ListFetcher, PromptSource, SamplingTier};
pub use prompts::{ItemKind, ListKind, PromptCategory};
pub use queue::{PromptQueue, QueueState};
pub use utils::{extract_list, normalize};
