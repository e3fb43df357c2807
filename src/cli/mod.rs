//! Command-line interface for prompt-forge.
//!
//! Provides commands for serving prompts from the persisted queue, running a
//! single fetch round and extracting lists from saved replies.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
