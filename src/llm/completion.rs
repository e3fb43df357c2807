//! Single-prompt completion with bounded retries.
//!
//! [`complete`] is the only way the rest of the crate talks to a provider.
//! Every attempt is time-boxed; transient failures are retried after a
//! fixed backoff, everything else gives up at once. Callers get the reply
//! text or `None`, never an error.

use std::time::Duration;

use crate::config::CallConfig;
use crate::error::LlmError;

use super::client::{GenerationRequest, LlmProvider, Message};

/// Retry and timeout settings for one provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
    /// Upper bound on a single attempt.
    pub timeout: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&CallConfig> for CallPolicy {
    fn from(config: &CallConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Sends `messages` to the provider and returns the first choice's text.
///
/// Returns `None` when every attempt failed, a non-transient error occurred,
/// or the provider answered with no content.
pub async fn complete(
    provider: &dyn LlmProvider,
    messages: &[Message],
    temperature: f64,
    model: &str,
    seed: u64,
    policy: &CallPolicy,
) -> Option<String> {
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        tracing::debug!(
            attempt,
            temperature,
            model,
            seed,
            "Calling LLM provider"
        );

        let request = GenerationRequest::new(model, messages.to_vec())
            .with_temperature(temperature)
            .with_seed(seed);

        let result = match tokio::time::timeout(policy.timeout, provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                seconds: policy.timeout.as_secs(),
            }),
        };

        match result {
            Ok(response) => match response.first_content() {
                Some(content) if !content.trim().is_empty() => {
                    tracing::debug!(model, response = %content, "LLM provider replied");
                    return Some(content.to_string());
                }
                _ => {
                    tracing::warn!(model, error = %LlmError::EmptyResponse, "Discarding reply");
                    return None;
                }
            },
            Err(err) if err.is_transient() => {
                tracing::warn!(
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "Transient LLM error"
                );
                if attempt < attempts {
                    tokio::time::sleep(policy.backoff).await;
                }
            }
            Err(err) => {
                tracing::error!(model, error = %err, "LLM call failed");
                return None;
            }
        }
    }

    tracing::error!(model, attempts, "LLM call failed after all attempts");
    None
}
