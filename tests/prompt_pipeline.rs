//! End-to-end tests of the prompt pipeline with a mock LLM provider.
//!
//! Provider replies flow through the fetcher, the list extractor and the
//! queue exactly as they would against a live API.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use prompt_forge::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};
use prompt_forge::{
    ItemKind, ListFetcher, LlmError, PromptCategory, PromptForgeConfig, PromptQueue, QueueError,
    QueueState,
};

type Reply = dyn Fn(&GenerationRequest) -> String + Send + Sync;

/// Mock provider answering every request through a closure.
struct MockLlmProvider {
    requests: Mutex<Vec<GenerationRequest>>,
    reply: Box<Reply>,
    delay: Duration,
}

impl MockLlmProvider {
    fn new(reply: impl Fn(&GenerationRequest) -> String + Send + Sync + 'static) -> Arc<Self> {
        Self::with_delay(reply, Duration::ZERO)
    }

    fn with_delay(
        reply: impl Fn(&GenerationRequest) -> String + Send + Sync + 'static,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply: Box::new(reply),
            delay,
        })
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let content = (self.reply)(&request);
        self.requests.lock().expect("lock poisoned").push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(GenerationResponse {
            id: "mock".to_string(),
            model: "mock".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        })
    }
}

fn test_config() -> PromptForgeConfig {
    let mut config = PromptForgeConfig::default();
    config.call.backoff_ms = 0;
    config.fetcher.rng_seed = Some(11);
    config.queue.rng_seed = Some(13);
    config.themes.images = vec!["Neon Nights".to_string()];
    config.themes.text = vec!["Oceans".to_string()];
    config
}

fn build_queue(provider: Arc<MockLlmProvider>, config: &PromptForgeConfig) -> PromptQueue {
    let fetcher = Arc::new(ListFetcher::from_config(provider, config));
    PromptQueue::from_config(fetcher, config)
}

#[tokio::test]
async fn test_messy_reply_is_served_item_by_item() {
    let provider = MockLlmProvider::new(|_| {
        "Here you go:\n[\n  'scene A', # the calm one\n  \"scene B\"\n]\nEnjoy!".to_string()
    });
    let config = test_config();
    let queue = build_queue(provider.clone(), &config);

    let first = queue.get_question(PromptCategory::Images, 20).await.unwrap();
    let second = queue.get_question(PromptCategory::Images, 20).await.unwrap();
    assert_eq!(first.as_deref(), Some("scene B"));
    assert_eq!(second.as_deref(), Some("scene A"));

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].messages[0].content.contains("'Neon Nights'"));
    assert_eq!(queue.snapshot().await.images.questions.items, None);
}

#[tokio::test]
async fn test_unusable_first_reply_escalates_model() {
    let provider = MockLlmProvider::new(|request| {
        if request.model == "gpt-4-1106-preview" {
            r#"["Why is the sea salty?", "How deep is the Mariana Trench?"]"#.to_string()
        } else {
            "I'm sorry, I can't produce that list.".to_string()
        }
    });
    let config = test_config();
    let queue = build_queue(provider.clone(), &config);

    let question = queue.get_question(PromptCategory::Text, 10).await.unwrap();
    assert_eq!(question.as_deref(), Some("How deep is the Mariana Trench?"));

    let models: Vec<_> = provider
        .requests()
        .iter()
        .map(|r| (r.model.clone(), r.temperature))
        .collect();
    assert_eq!(
        models,
        vec![
            ("gpt-3.5-turbo".to_string(), Some(0.65)),
            ("gpt-4-1106-preview".to_string(), Some(0.85)),
        ]
    );
}

#[tokio::test]
async fn test_refill_escape_hatch_surfaces_failure() {
    let provider = MockLlmProvider::new(|_| "No list today.".to_string());
    let mut config = test_config();
    config.fetcher.max_retries = 1;
    config.queue.max_refill_attempts = Some(2);
    let queue = build_queue(provider.clone(), &config);

    let err = queue
        .get_question(PromptCategory::Images, 20)
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::RefillExhausted { attempts: 2, .. }));
    // Two rounds, each one first call plus one retry.
    assert_eq!(provider.requests().len(), 4);
}

#[tokio::test]
async fn test_saved_state_survives_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("state.json");
    let provider = MockLlmProvider::new(|_| r#"["one", "two", "three"]"#.to_string());
    let config = test_config();

    let queue = build_queue(provider.clone(), &config);
    assert_eq!(
        queue.get_question(PromptCategory::Images, 20).await.unwrap().as_deref(),
        Some("three")
    );
    queue.snapshot().await.save(&path).expect("should save");

    let restored = build_queue(provider.clone(), &config).with_state(QueueState::load_or_default(&path));
    assert_eq!(
        restored.get_question(PromptCategory::Images, 20).await.unwrap().as_deref(),
        Some("two")
    );
    assert_eq!(provider.requests().len(), 1);

    let state = restored.snapshot().await;
    assert_eq!(state.images.questions.items, Some(vec!["one".to_string()]));
    assert_eq!(state.images.questions.counter, 1);
}

#[tokio::test]
async fn test_themes_do_not_touch_provider() {
    let provider = MockLlmProvider::new(|_| "unused".to_string());
    let config = test_config();
    let queue = build_queue(provider.clone(), &config);

    let theme = queue
        .take_one(PromptCategory::Text, ItemKind::Themes, 1)
        .await
        .unwrap();
    assert_eq!(theme.as_deref(), Some("Oceans"));
    assert!(provider.requests().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_refill() {
    let provider = MockLlmProvider::with_delay(
        |_| {
            let items: Vec<String> = (0..10).map(|i| format!("\"q{i}\"")).collect();
            format!("[{}]", items.join(", "))
        },
        Duration::from_millis(25),
    );
    let config = test_config();
    let queue = Arc::new(build_queue(provider.clone(), &config));

    let handles: Vec<_> = (0..10)
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
            .expect("queue should serve an item");
        assert!(seen.insert(item), "item served twice");
    }

    assert_eq!(seen.len(), 10);
    assert_eq!(provider.requests().len(), 1);
    assert_eq!(queue.snapshot().await.text.questions.items, None);
}
