//! Error types for prompt-forge operations.
//!
//! Defines error types for the major subsystems:
//! - LLM API interactions
//! - Configuration loading
//! - Prompt queue replenishment
//! - Queue state persistence
//! - Category / kind argument parsing

use thiserror::Error;

use crate::prompts::{ItemKind, PromptCategory};

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: {0} environment variable not set")]
    MissingApiKey(String),

    #[error("Missing API base URL")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("LLM call timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("LLM response contained no content")]
    EmptyResponse,
}

impl LlmError {
    /// Whether the failure is worth retrying (network trouble, rate limits, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RequestFailed(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("timeout")
                    || msg.contains("timed out")
                    || msg.contains("connection")
                    || msg.contains("temporarily")
            }
            LlmError::RateLimited(_) | LlmError::Timeout { .. } => true,
            LlmError::ApiError { code, .. } => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur while loading or saving queue state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while serving prompts from the queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("No themes configured for category '{category}'")]
    NoThemes { category: PromptCategory },

    #[error("Failed to replenish {category}/{kind} after {attempts} attempts")]
    RefillExhausted {
        category: PromptCategory,
        kind: ItemKind,
        attempts: u32,
    },

    #[error("State persistence error: {0}")]
    Persist(#[from] StateError),
}

/// Unknown category, item kind or list kind name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid {what} '{value}': expected one of {expected}")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
    pub expected: &'static str,
}
