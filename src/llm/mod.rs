//! LLM integration for prompt-forge.
//!
//! This module provides the provider abstraction used by the list fetcher:
//!
//! - [`client`] - message/request/response types, the [`LlmProvider`] trait
//!   and an HTTP client for OpenAI-compatible chat-completion APIs
//! - [`completion`] - the retried, time-boxed [`complete`] call
//!
//! ```ignore
//! use prompt_forge::llm::{complete, CallPolicy, ChatCompletionClient, Message};
//! use std::time::Duration;
//!
//! let client = ChatCompletionClient::new(
//!     "https://api.openai.com/v1",
//!     Some(api_key),
//!     Duration::from_secs(120),
//! )?;
//! let reply = complete(
//!     &client,
//!     &[Message::user("List three colours as a Python list")],
//!     0.65,
//!     "gpt-3.5-turbo",
//!     1234,
//!     &CallPolicy::default(),
//! )
//! .await;
//! ```

pub mod client;
pub mod completion;

pub use client::{
    ChatCompletionClient, Choice, GenerationRequest, GenerationResponse, LlmProvider, Message,
    Usage,
};
pub use completion::{complete, CallPolicy};
