//! Replenishing prompt queue.
//!
//! [`PromptQueue`] serves prompts one at a time from four cached cells
//! (text/images x themes/questions). A question cell that runs dry is
//! restocked from a [`PromptSource`] using a randomly chosen theme; theme
//! cells are restocked from the configured theme pool.
//!
//! All cells share one lock, held from the emptiness check through the
//! refill to the pop. Two callers never receive the same item, and at most
//! one refill is in flight across the whole queue.
//!
//! ```ignore
//! use std::sync::Arc;
//! use prompt_forge::{ListFetcher, PromptCategory, PromptQueue, ThemesConfig};
//!
//! let fetcher = Arc::new(ListFetcher::new(provider));
//! let queue = PromptQueue::new(fetcher, ThemesConfig::default());
//! let question = queue.get_question(PromptCategory::Text, 100).await?;
//! ```

pub mod state;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::{PromptForgeConfig, ThemesConfig};
use crate::error::QueueError;
use crate::fetcher::PromptSource;
use crate::prompts::{ItemKind, PromptCategory};

pub use state::{CategoryState, QueueCell, QueueState};

/// Prompt cache that refills itself from a [`PromptSource`].
pub struct PromptQueue {
    state: AsyncMutex<QueueState>,
    source: Arc<dyn PromptSource>,
    themes: ThemesConfig,
    rng: Mutex<ChaCha8Rng>,
    max_refill_attempts: Option<u32>,
    refill_backoff: Duration,
}

impl PromptQueue {
    /// Creates an empty queue that retries refills until they succeed.
    pub fn new(source: Arc<dyn PromptSource>, themes: ThemesConfig) -> Self {
        Self {
            state: AsyncMutex::new(QueueState::default()),
            source,
            themes,
            rng: Mutex::new(ChaCha8Rng::from_rng(&mut rand::rng())),
            max_refill_attempts: None,
            refill_backoff: Duration::ZERO,
        }
    }

    /// Creates an empty queue from the `queue` and `themes` config sections.
    pub fn from_config(source: Arc<dyn PromptSource>, config: &PromptForgeConfig) -> Self {
        let queue = Self::new(source, config.themes.clone())
            .with_max_refill_attempts(config.queue.max_refill_attempts)
            .with_refill_backoff(Duration::from_millis(config.queue.refill_backoff_ms));
        match config.queue.rng_seed {
            Some(seed) => queue.with_rng_seed(seed),
            None => queue,
        }
    }

    /// Starts from previously saved state.
    pub fn with_state(self, state: QueueState) -> Self {
        Self {
            state: AsyncMutex::new(state),
            ..self
        }
    }

    /// Gives up a refill after this many empty fetch rounds. `None` never gives up.
    pub fn with_max_refill_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_refill_attempts = max_attempts;
        self
    }

    /// Pause between empty fetch rounds.
    pub fn with_refill_backoff(mut self, backoff: Duration) -> Self {
        self.refill_backoff = backoff;
        self
    }

    /// Reseeds the RNG used to pick refill themes.
    pub fn with_rng_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Copy of the current state, taken under the queue lock.
    pub async fn snapshot(&self) -> QueueState {
        self.state.lock().await.clone()
    }

    /// Takes the next question for `category`, refilling the cell if needed.
    pub async fn get_question(
        &self,
        category: PromptCategory,
        quantity_hint: usize,
    ) -> Result<Option<String>, QueueError> {
        self.take_one(category, ItemKind::Questions, quantity_hint)
            .await
    }

    /// Takes one item from the (category, kind) cell.
    ///
    /// Returns `Ok(None)` only for a themes cell whose configured pool is
    /// empty. A question refill keeps trying fresh themes until the source
    /// produces a list, or until `max_refill_attempts` rounds have failed.
    pub async fn take_one(
        &self,
        category: PromptCategory,
        kind: ItemKind,
        quantity_hint: usize,
    ) -> Result<Option<String>, QueueError> {
        let mut state = self.state.lock().await;

        if state.cell(category, kind).is_empty() {
            match kind {
                ItemKind::Themes => {
                    let pool = self.themes.pool(category);
                    if pool.is_empty() {
                        tracing::warn!(%category, "Theme pool is empty");
                        return Ok(None);
                    }
                    state.cell_mut(category, kind).restock(pool.to_vec());
                    tracing::debug!(%category, themes = pool.len(), "Restocked themes");
                }
                ItemKind::Questions => {
                    tracing::debug!(%category, quantity_hint, "Question cell empty, refilling");
                    let items = self
                        .refill_questions(&mut state, category, quantity_hint)
                        .await?;
                    tracing::info!(%category, items = items.len(), "Restocked questions");
                    state.cell_mut(category, kind).restock(items);
                }
            }
        }

        let cell = state.cell_mut(category, kind);
        let item = cell.pop();
        tracing::debug!(%category, %kind, remaining = cell.len(), "Served item");
        Ok(item)
    }

    async fn refill_questions(
        &self,
        state: &mut QueueState,
        category: PromptCategory,
        quantity_hint: usize,
    ) -> Result<Vec<String>, QueueError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let theme = self.pick_theme(state, category)?;

            let fetched = self
                .source
                .fetch_list(category.question_list(), quantity_hint, Some(&theme))
                .await;
            match fetched {
                Some(items) if !items.is_empty() => return Ok(items),
                _ => tracing::warn!(
                    %category,
                    attempt,
                    theme = %theme,
                    "Refill produced no items, retrying with another theme"
                ),
            }

            if let Some(max_attempts) = self.max_refill_attempts {
                if attempt >= max_attempts {
                    return Err(QueueError::RefillExhausted {
                        category,
                        kind: ItemKind::Questions,
                        attempts: attempt,
                    });
                }
            }
            if !self.refill_backoff.is_zero() {
                tokio::time::sleep(self.refill_backoff).await;
            }
        }
    }

    /// Picks a random theme from the category's theme cell, loading the
    /// configured pool into the cell first if it is empty.
    fn pick_theme(
        &self,
        state: &mut QueueState,
        category: PromptCategory,
    ) -> Result<String, QueueError> {
        let cell = state.cell_mut(category, ItemKind::Themes);
        if cell.is_empty() {
            cell.restock(self.themes.pool(category).to_vec());
        }

        let themes = cell.items.as_deref().unwrap_or_default();
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        themes
            .choose(&mut *rng)
            .cloned()
            .ok_or(QueueError::NoThemes { category })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::ListKind;
    use async_trait::async_trait;
    use std::collections::{HashSet, VecDeque};

    type Call = (ListKind, usize, Option<String>);

    /// Source replaying scripted fetch results; `None` once the script runs out.
    struct ScriptedSource {
        replies: Mutex<VecDeque<Option<Vec<String>>>>,
        calls: Mutex<Vec<Call>>,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Option<Vec<&str>>>) -> Arc<Self> {
            Self::with_delay(replies, Duration::ZERO)
        }

        fn with_delay(replies: Vec<Option<Vec<&str>>>, delay: Duration) -> Arc<Self> {
            let replies = replies
                .into_iter()
                .map(|reply| reply.map(|items| items.into_iter().map(String::from).collect()))
                .collect();
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(Vec::new()),
                delay,
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait]
    impl PromptSource for ScriptedSource {
        async fn fetch_list(
            &self,
            kind: ListKind,
            quantity_needed: usize,
            theme: Option<&str>,
        ) -> Option<Vec<String>> {
            self.calls.lock().expect("lock poisoned").push((
                kind,
                quantity_needed,
                theme.map(String::from),
            ));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.replies
                .lock()
                .expect("lock poisoned")
                .pop_front()
                .flatten()
        }
    }

    fn themes(images: &[&str]) -> ThemesConfig {
        ThemesConfig {
            text: vec!["Oceans".to_string()],
            images: images.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn queue(source: Arc<ScriptedSource>, pool: &[&str]) -> PromptQueue {
        PromptQueue::new(source, themes(pool)).with_rng_seed(42)
    }

    #[tokio::test]
    async fn test_questions_refill_then_pop_from_end() {
        let source = ScriptedSource::new(vec![Some(vec!["q1", "q2", "q3"])]);
        let queue = queue(source.clone(), &["Neon Nights", "Arctic Silence"]);

        let first = queue.get_question(PromptCategory::Images, 60).await.unwrap();
        let second = queue.get_question(PromptCategory::Images, 60).await.unwrap();
        assert_eq!(first.as_deref(), Some("q3"));
        assert_eq!(second.as_deref(), Some("q2"));

        let calls = source.calls();
        assert_eq!(calls.len(), 1);
        let (kind, quantity, theme) = &calls[0];
        assert_eq!(*kind, ListKind::ImagesQuestions);
        assert_eq!(*quantity, 60);
        let theme = theme.as_deref().expect("theme should be passed");
        assert!(["Neon Nights", "Arctic Silence"].contains(&theme));

        let snapshot = queue.snapshot().await;
        assert_eq!(snapshot.images.questions.items, Some(vec!["q1".to_string()]));
        assert_eq!(snapshot.images.questions.counter, 1);
        assert_eq!(snapshot.images.themes.len(), 2);
    }

    #[tokio::test]
    async fn test_last_pop_clears_cell_and_next_take_refills() {
        let source = ScriptedSource::new(vec![Some(vec!["only"]), Some(vec!["fresh"])]);
        let queue = queue(source.clone(), &["Tidal Pools"]);

        assert_eq!(
            queue.get_question(PromptCategory::Images, 1).await.unwrap().as_deref(),
            Some("only")
        );
        assert_eq!(queue.snapshot().await.images.questions.items, None);

        assert_eq!(
            queue.get_question(PromptCategory::Images, 1).await.unwrap().as_deref(),
            Some("fresh")
        );
        assert_eq!(source.calls().len(), 2);
        assert_eq!(queue.snapshot().await.images.questions.counter, 2);
    }

    #[tokio::test]
    async fn test_failed_rounds_retry_with_new_theme() {
        let source = ScriptedSource::new(vec![None, Some(vec![]), Some(vec!["finally"])]);
        let queue = queue(source.clone(), &["A", "B", "C"]);

        let item = queue.get_question(PromptCategory::Images, 20).await.unwrap();
        assert_eq!(item.as_deref(), Some("finally"));
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_refill_gives_up_after_configured_attempts() {
        let source = ScriptedSource::new(vec![]);
        let queue = queue(source.clone(), &["A"]).with_max_refill_attempts(Some(3));

        let err = queue
            .get_question(PromptCategory::Images, 20)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueueError::RefillExhausted {
                category: PromptCategory::Images,
                kind: ItemKind::Questions,
                attempts: 3,
            }
        ));
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_theme_pool() {
        let source = ScriptedSource::new(vec![Some(vec!["unused"])]);
        let queue = queue(source.clone(), &[]);

        let err = queue
            .get_question(PromptCategory::Images, 20)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueueError::NoThemes {
                category: PromptCategory::Images
            }
        ));
        assert!(source.calls().is_empty());

        let theme = queue
            .take_one(PromptCategory::Images, ItemKind::Themes, 1)
            .await
            .unwrap();
        assert_eq!(theme, None);
    }

    #[tokio::test]
    async fn test_themes_served_from_pool_without_fetching() {
        let source = ScriptedSource::new(vec![]);
        let queue = queue(source.clone(), &["first", "second"]);

        let mut served = Vec::new();
        for _ in 0..3 {
            served.push(
                queue
                    .take_one(PromptCategory::Images, ItemKind::Themes, 1)
                    .await
                    .unwrap(),
            );
        }

        assert_eq!(
            served,
            vec![
                Some("second".to_string()),
                Some("first".to_string()),
                Some("second".to_string()),
            ]
        );
        assert!(source.calls().is_empty());
        assert_eq!(queue.snapshot().await.images.themes.counter, 2);
    }

    #[tokio::test]
    async fn test_with_state_serves_saved_items() {
        let source = ScriptedSource::new(vec![]);
        let mut state = QueueState::default();
        state
            .cell_mut(PromptCategory::Text, ItemKind::Questions)
            .restock(vec!["saved".to_string()]);
        let queue = queue(source.clone(), &["A"]).with_state(state);

        let item = queue.get_question(PromptCategory::Text, 10).await.unwrap();
        assert_eq!(item.as_deref(), Some("saved"));
        assert!(source.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_takes_deliver_each_item_once() {
        const N: usize = 64;
        let source = ScriptedSource::new(vec![]);
        let mut state = QueueState::default();
        state
            .cell_mut(PromptCategory::Text, ItemKind::Questions)
            .restock((0..N).map(|i| format!("item-{i}")).collect());
        let queue = Arc::new(queue(source.clone(), &["A"]).with_state(state));

        let handles: Vec<_> = (0..N)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.get_question(PromptCategory::Text, 10).await })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let item = handle
                .await
                .expect("task should not panic")
                .expect("take should succeed")
                .expect("cell was stocked");
            assert!(seen.insert(item), "item delivered twice");
        }

        assert_eq!(seen.len(), N);
        assert_eq!(queue.snapshot().await.text.questions.items, None);
        assert!(source.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_trigger_single_refill() {
        let source = ScriptedSource::with_delay(
            vec![Some(vec!["a", "b", "c", "d", "e"])],
            Duration::from_millis(50),
        );
        let queue = Arc::new(queue(source.clone(), &["A"]));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.get_question(PromptCategory::Images, 5).await })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let item = handle.await.unwrap().unwrap().unwrap();
            assert!(seen.insert(item));
        }
        assert_eq!(source.calls().len(), 1);
    }
}
