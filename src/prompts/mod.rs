//! Prompt vocabulary: categories, item kinds, theme pools and instruction templates.
//!
//! # Architecture
//!
//! - [`themes`] - Built-in theme pools per category
//! - [`instructions`] - Instruction templates sent to the LLM provider
//!
//! A validator asks for prompts along two orthogonal axes: the
//! [`PromptCategory`] (text questions vs image scenarios) and the
//! [`ItemKind`] (themes vs questions). The four resulting cells are the
//! unit of caching in [`crate::queue`].

pub mod instructions;
pub mod themes;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

pub use instructions::{image_scenario_instruction, text_question_instruction};
pub use themes::{default_themes, IMAGE_THEMES, TEXT_THEMES};

/// Domain partition of prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptCategory {
    Text,
    Images,
}

impl PromptCategory {
    pub const ALL: [PromptCategory; 2] = [PromptCategory::Text, PromptCategory::Images];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptCategory::Text => "text",
            PromptCategory::Images => "images",
        }
    }

    /// The list kind fetched when this category's question cell runs dry.
    pub fn question_list(&self) -> ListKind {
        match self {
            PromptCategory::Text => ListKind::TextQuestions,
            PromptCategory::Images => ListKind::ImagesQuestions,
        }
    }
}

impl fmt::Display for PromptCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(PromptCategory::Text),
            "images" => Ok(PromptCategory::Images),
            _ => Err(ParseEnumError {
                what: "category",
                value: s.to_string(),
                expected: "'text', 'images'",
            }),
        }
    }
}

/// Whether a cached list holds themes or questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Themes,
    Questions,
}

impl ItemKind {
    pub const ALL: [ItemKind; 2] = [ItemKind::Themes, ItemKind::Questions];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Themes => "themes",
            ItemKind::Questions => "questions",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "themes" => Ok(ItemKind::Themes),
            "questions" => Ok(ItemKind::Questions),
            _ => Err(ParseEnumError {
                what: "item kind",
                value: s.to_string(),
                expected: "'themes', 'questions'",
            }),
        }
    }
}

/// A list the fetcher knows how to request from the LLM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    TextQuestions,
    ImagesQuestions,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::TextQuestions => "text_questions",
            ListKind::ImagesQuestions => "images_questions",
        }
    }

    pub fn category(&self) -> PromptCategory {
        match self {
            ListKind::TextQuestions => PromptCategory::Text,
            ListKind::ImagesQuestions => PromptCategory::Images,
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text_questions" => Ok(ListKind::TextQuestions),
            "images_questions" => Ok(ListKind::ImagesQuestions),
            _ => Err(ParseEnumError {
                what: "list kind",
                value: s.to_string(),
                expected: "'text_questions', 'images_questions'",
            }),
        }
    }
}
