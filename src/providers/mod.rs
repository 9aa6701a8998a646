/*!
 * Provider implementations for language model and speech services.
 *
 * This module contains client implementations for:
 * - OpenAI-compatible APIs (OpenAI, Together.ai, LM Studio): chat completions and speech
 * - Ollama: Local LLM server
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{LlmConfig, LlmProvider};
use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the generators.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// A system + user prompt pair, independent of any provider's wire format
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Object-safe chat interface the generators depend on
#[async_trait]
pub trait ChatModel: Send + Sync + Debug {
    /// Send the prompt and return the assistant's text
    async fn chat(&self, prompt: &ChatPrompt) -> Result<String, ProviderError>;
}

/// Build the chat model selected by the configuration
pub fn chat_model_from_config(config: &LlmConfig) -> Arc<dyn ChatModel> {
    match config.provider {
        LlmProvider::OpenAI => Arc::new(openai::OpenAI::new(
            config.resolve_api_key().unwrap_or_default(),
            config.endpoint.clone(),
            config.model.clone(),
        )),
        LlmProvider::Ollama => Arc::new(ollama::Ollama::from_url(
            config.endpoint.clone(),
            config.model.clone(),
        )),
    }
}

pub mod ollama;
pub mod openai;
