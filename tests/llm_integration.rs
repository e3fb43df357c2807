//! Integration tests against a live OpenAI-compatible API.
//!
//! These tests make real API calls.
//! Run with: OPENAI_API_KEY=your_key cargo test --test llm_integration -- --ignored

use std::sync::Arc;

use prompt_forge::config::ProviderConfig;
use prompt_forge::llm::{
    complete, CallPolicy, ChatCompletionClient, GenerationRequest, LlmProvider, Message,
};
use prompt_forge::{extract_list, ListFetcher, ListKind};

const TEST_MODEL: &str = "gpt-3.5-turbo";

fn create_test_client() -> ChatCompletionClient {
    ChatCompletionClient::from_config(&ProviderConfig::default(), None)
        .expect("OPENAI_API_KEY environment variable must be set for integration tests")
}

#[tokio::test]
#[ignore] // Run with: cargo test --test llm_integration -- --ignored
async fn test_simple_generation() {
    let client = create_test_client();

    let request = GenerationRequest::new(
        TEST_MODEL,
        vec![
            Message::system("You are a helpful assistant. Reply concisely."),
            Message::user("What is 2 + 2? Reply with just the number."),
        ],
    )
    .with_max_tokens(10)
    .with_temperature(0.0)
    .with_seed(1);

    let response = client.generate(request).await;
    assert!(response.is_ok(), "Generation failed: {:?}", response.err());

    let response = response.expect("Should have response");
    let content = response.first_content().expect("Should have content");
    assert!(
        content.contains('4'),
        "Response should contain '4', got: {}",
        content
    );
    assert!(response.usage.total_tokens > 0, "Should have token usage");
}

#[tokio::test]
#[ignore]
async fn test_complete_returns_extractable_list() {
    let client = create_test_client();

    let reply = complete(
        &client,
        &[Message::user(
            "Give a python-formatted list of 3 fruit names as quote-encapsulated strings.",
        )],
        0.65,
        TEST_MODEL,
        1234,
        &CallPolicy::default(),
    )
    .await
    .expect("Should have a reply");

    let items = extract_list(&reply.replace('\n', " ")).expect("Reply should hold a list");
    assert!(!items.is_empty(), "Expected fruit names, got: {}", reply);
}

#[tokio::test]
#[ignore]
async fn test_fetch_round_against_live_api() {
    let fetcher = ListFetcher::new(Arc::new(create_test_client()));

    let items = fetcher
        .fetch_list(ListKind::ImagesQuestions, 5, Some("Arctic Silence"))
        .await
        .expect("Fetch round should produce a list");

    assert!(items.iter().all(|item| !item.trim().is_empty()));
}

#[tokio::test]
#[ignore]
async fn test_invalid_api_key_is_not_retried_forever() {
    let client = ChatCompletionClient::from_config(
        &ProviderConfig::default(),
        Some("sk-invalid".to_string()),
    )
    .expect("client should build");

    let reply = complete(
        &client,
        &[Message::user("Hello")],
        0.0,
        TEST_MODEL,
        1,
        &CallPolicy::default(),
    )
    .await;
    assert!(reply.is_none());
}
