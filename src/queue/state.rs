//! Queue state and its JSON persistence.
//!
//! The state is a fixed grid of cells, one per (category, kind) pair. A cell
//! holds its cached items or nothing at all; an empty list is never stored.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::prompts::{ItemKind, PromptCategory};

/// One (category, kind) cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCell {
    /// Cached items, served from the end. `None` means the cell needs a refill.
    #[serde(default)]
    pub items: Option<Vec<String>>,
    /// Number of times the cell has been restocked.
    #[serde(default)]
    pub counter: u64,
}

impl QueueCell {
    /// Number of cached items.
    pub fn len(&self) -> usize {
        self.items.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the cached items and counts the restock.
    ///
    /// An empty list leaves the cell empty and is not counted.
    pub fn restock(&mut self, items: Vec<String>) {
        if items.is_empty() {
            self.items = None;
            return;
        }
        self.items = Some(items);
        self.counter += 1;
    }

    /// Removes the last cached item, clearing the cell when it runs out.
    pub fn pop(&mut self) -> Option<String> {
        let items = self.items.as_mut()?;
        let item = items.pop();
        if items.is_empty() {
            self.items = None;
        }
        item
    }

    fn normalize(&mut self) {
        if self.items.as_ref().is_some_and(Vec::is_empty) {
            self.items = None;
        }
    }
}

/// Cells of one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryState {
    #[serde(default)]
    pub themes: QueueCell,
    #[serde(default)]
    pub questions: QueueCell,
}

impl CategoryState {
    pub fn cell(&self, kind: ItemKind) -> &QueueCell {
        match kind {
            ItemKind::Themes => &self.themes,
            ItemKind::Questions => &self.questions,
        }
    }

    pub fn cell_mut(&mut self, kind: ItemKind) -> &mut QueueCell {
        match kind {
            ItemKind::Themes => &mut self.themes,
            ItemKind::Questions => &mut self.questions,
        }
    }
}

/// Every cell of the queue, plus when the state was last saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    #[serde(default)]
    pub text: CategoryState,
    #[serde(default)]
    pub images: CategoryState,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl QueueState {
    pub fn category(&self, category: PromptCategory) -> &CategoryState {
        match category {
            PromptCategory::Text => &self.text,
            PromptCategory::Images => &self.images,
        }
    }

    pub fn category_mut(&mut self, category: PromptCategory) -> &mut CategoryState {
        match category {
            PromptCategory::Text => &mut self.text,
            PromptCategory::Images => &mut self.images,
        }
    }

    pub fn cell(&self, category: PromptCategory, kind: ItemKind) -> &QueueCell {
        self.category(category).cell(kind)
    }

    pub fn cell_mut(&mut self, category: PromptCategory, kind: ItemKind) -> &mut QueueCell {
        self.category_mut(category).cell_mut(kind)
    }

    /// Parses persisted state, clearing any cell stored as an empty list.
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let mut state: Self = serde_json::from_str(json)?;
        for category in PromptCategory::ALL {
            for kind in ItemKind::ALL {
                state.cell_mut(category, kind).normalize();
            }
        }
        Ok(state)
    }

    /// Reads state from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Reads state from `path`, falling back to an empty state when the file
    /// is missing or unreadable.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No saved queue state, starting empty");
            return Self::default();
        }

        match Self::load(path) {
            Ok(state) => {
                tracing::info!(path = %path.display(), "Loaded queue state");
                state
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not read queue state, starting empty"
                );
                Self::default()
            }
        }
    }

    /// Writes the state as pretty JSON, replacing `path` atomically, and
    /// stamps `updated_at`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), StateError> {
        let path = path.as_ref();
        self.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(self)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| StateError::Io(e.error))?;

        tracing::info!(path = %path.display(), "Saved queue state");
        Ok(())
    }
}
