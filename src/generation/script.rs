use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::app_config::LlmConfig;
use crate::errors::StageError;
use crate::generation::ScriptGenerator;
use crate::generation::prompts::script_user_message;
use crate::narration::NarrationScript;
use crate::policy::run_with_policy;
use crate::providers::{ChatModel, ChatPrompt};

const SERVICE: &str = "Script generation";

/// Teaching-assistant script generator backed by a chat model
#[derive(Debug, Clone)]
pub struct LlmScriptGenerator {
    model: Arc<dyn ChatModel>,
    config: LlmConfig,
}

impl LlmScriptGenerator {
    pub fn new(model: Arc<dyn ChatModel>, config: LlmConfig) -> Self {
        Self { model, config }
    }

    /// Prompt sent for the given inputs
    pub fn prompt(&self, content: Option<&str>, question: &str) -> ChatPrompt {
        ChatPrompt {
            system: self.config.script_system_prompt.clone(),
            user: script_user_message(content, question),
            max_tokens: self.config.script_max_tokens,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl ScriptGenerator for LlmScriptGenerator {
    async fn generate(
        &self,
        content: Option<&str>,
        question: &str,
    ) -> Result<NarrationScript, StageError> {
        let prompt = self.prompt(content, question);
        if prompt.user.is_empty() {
            return Err(StageError::external(
                SERVICE,
                "nothing to explain: no document content and no question",
            ));
        }

        let prompt = &prompt;
        let model = &self.model;
        let text = run_with_policy(
            &self.config.policy,
            "script generation request",
            |msg| StageError::external(SERVICE, msg),
            || async move {
                model
                    .chat(prompt)
                    .await
                    .map_err(|e| StageError::external(SERVICE, e.to_string()))
            },
        )
        .await?;

        let script = NarrationScript::new(text);
        if script.is_blank() {
            return Err(StageError::external(SERVICE, "model returned an empty script"));
        }

        info!(
            "Generated narration script: {} blocks, {} words",
            script.block_count(),
            script.total_words()
        );
        Ok(script)
    }
}
