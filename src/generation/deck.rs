use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::LlmConfig;
use crate::errors::StageError;
use crate::generation::DeckComposer;
use crate::generation::prompts::clean_markup;
use crate::narration::NarrationScript;
use crate::policy::run_with_policy;
use crate::providers::{ChatModel, ChatPrompt};

const SERVICE: &str = "Slide deck generation";

/// Reveal.js deck composer backed by a chat model
#[derive(Debug, Clone)]
pub struct LlmDeckComposer {
    model: Arc<dyn ChatModel>,
    config: LlmConfig,
}

impl LlmDeckComposer {
    pub fn new(model: Arc<dyn ChatModel>, config: LlmConfig) -> Self {
        Self { model, config }
    }
}

#[async_trait]
impl DeckComposer for LlmDeckComposer {
    async fn compose(
        &self,
        script: &NarrationScript,
        output: &Path,
    ) -> Result<PathBuf, StageError> {
        let prompt = ChatPrompt {
            system: self.config.deck_system_prompt.clone(),
            user: script.text().to_string(),
            max_tokens: self.config.deck_max_tokens,
            temperature: self.config.temperature,
        };

        let prompt = &prompt;
        let model = &self.model;
        let response = run_with_policy(
            &self.config.policy,
            "slide deck request",
            |msg| StageError::external(SERVICE, msg),
            || async move {
                model
                    .chat(prompt)
                    .await
                    .map_err(|e| StageError::external(SERVICE, e.to_string()))
            },
        )
        .await?;

        let markup = clean_markup(&response);
        if !markup.contains("<section") {
            return Err(StageError::external(
                SERVICE,
                "model response contains no <section> slides",
            ));
        }

        tokio::fs::write(output, &markup)
            .await
            .map_err(|e| StageError::Storage(format!("Failed to write {:?}: {}", output, e)))?;

        info!("Slide deck markup written to {:?}", output);
        Ok(output.to_path_buf())
    }
}
