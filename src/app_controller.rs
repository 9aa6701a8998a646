use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::app_config::Config;
use crate::assemble::FfmpegAssembler;
use crate::extract::{Document, DocumentExtractor};
use crate::file_utils::FileManager;
use crate::generation::{LlmDeckComposer, LlmScriptGenerator};
use crate::pipeline::{Collaborators, PipelineRun, PresentationPipeline};
use crate::providers::chat_model_from_config;
use crate::render::HeadlessBrowserRenderer;
use crate::server::{self, ServerState};
use crate::speech::OpenAiSpeech;

// @module: Application controller wiring configuration to the pipeline

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        FileManager::ensure_dir(&config.storage.work_dir)?;
        FileManager::ensure_dir(&config.storage.output_dir)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Production collaborators built from the configuration
    pub fn collaborators(&self) -> Collaborators {
        let chat = chat_model_from_config(&self.config.llm);
        Collaborators {
            extractor: Arc::new(DocumentExtractor::new(self.config.extractor.clone())),
            script_generator: Arc::new(LlmScriptGenerator::new(
                chat.clone(),
                self.config.llm.clone(),
            )),
            speech: Arc::new(OpenAiSpeech::new(
                self.config.speech.clone(),
                &self.config.assembler,
            )),
            deck_composer: Arc::new(LlmDeckComposer::new(chat, self.config.llm.clone())),
            renderer: Arc::new(HeadlessBrowserRenderer::new(self.config.renderer.clone())),
            assembler: Arc::new(FfmpegAssembler::new(self.config.assembler.clone())),
        }
    }

    pub fn pipeline(&self) -> PresentationPipeline {
        PresentationPipeline::new(self.collaborators(), self.config.storage.clone())
    }

    /// Serve the HTTP API until interrupted
    pub async fn serve(&self) -> Result<()> {
        let state = ServerState::new(Arc::new(self.pipeline()));
        let router = server::create_router(state, self.config.server.max_upload_bytes);
        info!(
            "Using {} model '{}'",
            self.config.llm.provider.display_name(),
            self.config.llm.model
        );
        server::serve(router, &self.config.server.bind_address()).await
    }

    /// Run the pipeline once for a local file and/or a question
    pub async fn run_file(&self, input: Option<&Path>, question: &str) -> Result<PipelineRun> {
        let document = match input {
            Some(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read input file: {:?}", path))?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Some(Document::new(file_name, bytes))
            }
            None => None,
        };

        if document.is_none() && question.trim().is_empty() {
            warn!("No document and no question given, the script will have nothing to explain");
        }

        Ok(self.pipeline().run(document, question).await)
    }
}
