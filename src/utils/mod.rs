//! Text utilities for turning LLM replies into lists.
//!
//! - [`normalize`] - rewrites free text into a bracketed list of double-quoted strings
//! - [`literal`] - safe list-literal parsing
//! - [`list_extraction`] - the extraction entry point used by the fetcher

pub mod list_extraction;
pub mod literal;
pub mod normalize;

pub use list_extraction::{extract_list, find_bracketed_span, split_numbered_list};
pub use literal::{parse_literal_list, LiteralError};
pub use normalize::normalize;
