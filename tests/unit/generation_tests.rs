/*!
 * Tests for script and slide deck generation
 */

use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use deckcast::app_config::{CallPolicy, LlmConfig};
use deckcast::generation::{DeckComposer, LlmDeckComposer, LlmScriptGenerator, ScriptGenerator};
use deckcast::narration::NarrationScript;
use deckcast::StageError;
use crate::common::MockChatModel;

fn fast_config(retry: bool) -> LlmConfig {
    let mut policy = CallPolicy::with_timeout(5);
    policy.retry_once = retry;
    policy.retry_backoff_ms = 1;
    LlmConfig {
        policy,
        ..LlmConfig::default()
    }
}

/// Document content and question are combined into one user message
#[tokio::test]
async fn test_generate_withContent_shouldSendContentAndQuestion() {
    let model = Arc::new(MockChatModel::new("First idea.\n\nSecond idea."));
    let generator = LlmScriptGenerator::new(model.clone(), fast_config(false));

    let script = generator
        .generate(Some("Photosynthesis turns light into sugar."), "How do plants eat?")
        .await
        .unwrap();

    assert_eq!(script.block_count(), 2);
    let prompt = model.last_prompt().unwrap();
    assert_eq!(
        prompt.user,
        "Photosynthesis turns light into sugar.\n\nUser's Question: How do plants eat?"
    );
    assert_eq!(prompt.max_tokens, 1000);
}

/// Without a document the question alone is sent
#[tokio::test]
async fn test_generate_withoutContent_shouldSendQuestionOnly() {
    let model = Arc::new(MockChatModel::new("Recursion calls itself."));
    let generator = LlmScriptGenerator::new(model.clone(), fast_config(false));

    assert_ok!(generator.generate(None, "Explain recursion").await);

    assert_eq!(model.last_prompt().unwrap().user, "Explain recursion");
}

/// Nothing to explain is rejected before calling the model
#[tokio::test]
async fn test_generate_withNothingToExplain_shouldFailWithoutCalling() {
    let model = Arc::new(MockChatModel::new("unused"));
    let generator = LlmScriptGenerator::new(model.clone(), fast_config(false));

    let result = generator.generate(None, "   ").await;

    assert!(matches!(result, Err(StageError::ExternalService { .. })));
    assert_eq!(model.call_count(), 0);
}

/// A transient failure is retried once when the policy allows it
#[tokio::test]
async fn test_generate_withRetryPolicy_shouldRecoverFromOneFailure() {
    let model = Arc::new(MockChatModel::new("Answer.").failing_first(1));
    let generator = LlmScriptGenerator::new(model.clone(), fast_config(true));

    let script = generator.generate(None, "Why?").await.unwrap();

    assert_eq!(script.text(), "Answer.");
    assert_eq!(model.call_count(), 2);
}

/// Without retry the provider failure surfaces as an external service error
#[tokio::test]
async fn test_generate_withoutRetry_shouldReportExternalServiceError() {
    let model = Arc::new(MockChatModel::new("Answer.").failing_first(1));
    let generator = LlmScriptGenerator::new(model.clone(), fast_config(false));

    let err = generator.generate(None, "Why?").await.unwrap_err();

    assert_eq!(err.kind(), "ExternalServiceError");
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(model.call_count(), 1);
}

/// An empty model answer is not a usable script
#[tokio::test]
async fn test_generate_withBlankAnswer_shouldFail() {
    let model = Arc::new(MockChatModel::new("  \n\n "));
    let generator = LlmScriptGenerator::new(model, fast_config(false));

    assert_err!(generator.generate(None, "Why?").await);
}

/// Fenced HTML is unwrapped and written to the output file
#[tokio::test]
async fn test_compose_withFencedResponse_shouldWriteCleanMarkup() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("presentation.html");
    let model = Arc::new(MockChatModel::new(
        "Sure!\n```html\n<div class=\"slides\"><section>A</section></div>\n```",
    ));
    let composer = LlmDeckComposer::new(model.clone(), fast_config(false));
    let script = NarrationScript::new("A");

    let written = composer.compose(&script, &output).await.unwrap();

    assert_eq!(written, output);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "<div class=\"slides\"><section>A</section></div>"
    );
    let prompt = model.last_prompt().unwrap();
    assert_eq!(prompt.user, "A");
    assert_eq!(prompt.max_tokens, 2000);
}

/// A response without slides is rejected and nothing is written
#[tokio::test]
async fn test_compose_withoutSections_shouldFail() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("presentation.html");
    let model = Arc::new(MockChatModel::new("I cannot help with that."));
    let composer = LlmDeckComposer::new(model, fast_config(false));

    let result = composer.compose(&NarrationScript::new("A"), &output).await;

    assert!(matches!(result, Err(StageError::ExternalService { .. })));
    assert!(!output.exists());
}
