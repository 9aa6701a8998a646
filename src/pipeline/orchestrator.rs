use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::app_config::StorageConfig;
use crate::assemble::{AssemblyRequest, VideoAssembler};
use crate::errors::{Stage, StageError};
use crate::extract::{ContentExtractor, Document};
use crate::generation::{DeckComposer, ScriptGenerator};
use crate::pipeline::run::PipelineRun;
use crate::render::SlideRenderer;
use crate::speech::SpeechSynthesizer;
use crate::timing;
use crate::workspace::RunWorkspace;

type StageResult<T> = Result<T, (Stage, StageError)>;

/// The external collaborators a pipeline run calls, one per stage
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn ContentExtractor>,
    pub script_generator: Arc<dyn ScriptGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub deck_composer: Arc<dyn DeckComposer>,
    pub renderer: Arc<dyn SlideRenderer>,
    pub assembler: Arc<dyn VideoAssembler>,
}

/// Runs the stages of a presentation, in order, stopping at the first failure
#[derive(Clone)]
pub struct PresentationPipeline {
    collaborators: Collaborators,
    storage: StorageConfig,
}

impl PresentationPipeline {
    pub fn new(collaborators: Collaborators, storage: StorageConfig) -> Self {
        Self {
            collaborators,
            storage,
        }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Turn an optional document and a question into a narrated video.
    ///
    /// The returned run is always finalized, either with the video location
    /// or with the failing stage and its error.
    pub async fn run(&self, document: Option<Document>, question: &str) -> PipelineRun {
        let started = Instant::now();

        let workspace = match RunWorkspace::create(&self.storage).await {
            Ok(workspace) => workspace,
            Err(e) => {
                let mut run = PipelineRun::new(Uuid::new_v4());
                error!("Run {} failed during {}: {}", run.run_id(), Stage::Extract, e);
                run.fail(Stage::Extract, e);
                return run;
            }
        };

        let mut run = PipelineRun::new(workspace.run_id());
        info!("Starting run {}", run.run_id());

        match self.execute(&mut run, &workspace, document, question).await {
            Ok(video_path) => {
                info!(
                    "Run {} finished in {}: {:?}",
                    run.run_id(),
                    format_duration(started.elapsed()),
                    video_path
                );
                run.succeed(video_path);
            }
            Err((stage, e)) => {
                error!("Run {} failed during {}: {}", run.run_id(), stage, e);
                let _ = tokio::fs::remove_file(workspace.video_path()).await;
                run.fail(stage, e);
            }
        }

        if !self.storage.keep_artifacts {
            workspace.cleanup().await;
        }

        run
    }

    async fn execute(
        &self,
        run: &mut PipelineRun,
        workspace: &RunWorkspace,
        document: Option<Document>,
        question: &str,
    ) -> StageResult<PathBuf> {
        let c = &self.collaborators;

        let timer = StageTimer::start(Stage::Extract);
        let content = match document {
            Some(document) => {
                let stored_at = workspace.document_path(&document.extension());
                tokio::fs::write(&stored_at, &document.bytes)
                    .await
                    .map_err(|e| StageError::Storage(format!("Failed to store upload: {}", e)))
                    .map_err(at(Stage::Extract))?;
                let text = c
                    .extractor
                    .extract(&document, &stored_at)
                    .await
                    .map_err(at(Stage::Extract))?;
                Some(text)
            }
            None => None,
        };
        run.record_content(content);
        timer.finish();

        let timer = StageTimer::start(Stage::GenerateScript);
        let script = c
            .script_generator
            .generate(run.content(), question)
            .await
            .map_err(at(Stage::GenerateScript))?;
        tokio::fs::write(workspace.script_path(), script.text())
            .await
            .map_err(StageError::from)
            .map_err(at(Stage::GenerateScript))?;
        run.record_script(script.clone());
        timer.finish();

        let timer = StageTimer::start(Stage::SynthesizeSpeech);
        let audio = c
            .speech
            .synthesize(&script, &workspace.audio_path())
            .await
            .map_err(at(Stage::SynthesizeSpeech))?;
        run.record_audio(audio.clone());
        timer.finish();

        let timer = StageTimer::start(Stage::ComposeDeck);
        let markup = c
            .deck_composer
            .compose(&script, &workspace.markup_path())
            .await
            .map_err(at(Stage::ComposeDeck))?;
        run.record_markup(markup.clone());
        timer.finish();

        let timer = StageTimer::start(Stage::RenderSlides);
        let slides = c
            .renderer
            .render(&markup, &workspace.slides_dir())
            .await
            .map_err(at(Stage::RenderSlides))?;
        if slides.is_empty() {
            return Err((
                Stage::RenderSlides,
                StageError::Rendering("No slides found in the Reveal.js presentation.".to_string()),
            ));
        }
        run.record_slides(slides.clone());
        timer.finish();

        let timer = StageTimer::start(Stage::ComputeTimings);
        let timings = timing::allocate(&script, audio.duration_secs(), slides.len())
            .map_err(at(Stage::ComputeTimings))?;
        info!(
            "Slide timings ({:?}): {:?}",
            timings.strategy(),
            timings.starts()
        );
        let durations = timings.durations();
        run.record_timings(timings);
        timer.finish();

        let timer = StageTimer::start(Stage::AssembleVideo);
        let video_path = workspace.video_path();
        let list_path = workspace.concat_list_path();
        let video = c
            .assembler
            .assemble(AssemblyRequest {
                images: slides.paths(),
                audio: audio.path(),
                audio_duration: audio.duration_secs(),
                durations: &durations,
                output: &video_path,
                list_path: &list_path,
            })
            .await
            .map_err(at(Stage::AssembleVideo))?;
        timer.finish();

        Ok(video)
    }
}

fn at(stage: Stage) -> impl FnOnce(StageError) -> (Stage, StageError) {
    move |e| (stage, e)
}

struct StageTimer {
    stage: Stage,
    started: Instant,
}

impl StageTimer {
    fn start(stage: Stage) -> Self {
        info!("Starting {}", stage);
        Self {
            stage,
            started: Instant::now(),
        }
    }

    fn finish(self) {
        info!(
            "Finished {} in {}",
            self.stage,
            format_duration(self.started.elapsed())
        );
    }
}

/// Format a duration as `1h 2m 3s`, `2m 3s` or `3.456s`
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
