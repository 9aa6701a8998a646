use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::{Stage, StageError};
use crate::narration::NarrationScript;
use crate::render::SlideImageSequence;
use crate::speech::AudioTrack;
use crate::timing::TimingSequence;

const SUCCESS_MESSAGE: &str = "Presentation created successfully!";

/// Where a run stands
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    InProgress,
    Success { video_path: PathBuf },
    Failure { stage: Stage, error: StageError },
}

/// One end-to-end execution of the pipeline and everything it produced
#[derive(Debug, Clone)]
pub struct PipelineRun {
    run_id: Uuid,
    content: Option<String>,
    script: Option<NarrationScript>,
    audio: Option<AudioTrack>,
    markup: Option<PathBuf>,
    slides: Option<SlideImageSequence>,
    timings: Option<TimingSequence>,
    completed: Vec<Stage>,
    status: RunStatus,
}

impl PipelineRun {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            content: None,
            script: None,
            audio: None,
            markup: None,
            slides: None,
            timings: None,
            completed: Vec::new(),
            status: RunStatus::InProgress,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Success { .. })
    }

    /// Stages that finished, in the order they ran
    pub fn completed_stages(&self) -> &[Stage] {
        &self.completed
    }

    /// The stage and error that ended a failed run
    pub fn failure(&self) -> Option<(Stage, &StageError)> {
        match &self.status {
            RunStatus::Failure { stage, error } => Some((*stage, error)),
            _ => None,
        }
    }

    /// Human readable outcome, as reported to clients
    pub fn message(&self) -> String {
        match &self.status {
            RunStatus::InProgress => "Presentation is still being created".to_string(),
            RunStatus::Success { .. } => SUCCESS_MESSAGE.to_string(),
            RunStatus::Failure { stage, error } => format!("Error during {}: {}", stage, error),
        }
    }

    /// Location of the finished video; only set on success
    pub fn video_path(&self) -> Option<&Path> {
        match &self.status {
            RunStatus::Success { video_path } => Some(video_path),
            _ => None,
        }
    }

    /// File name of the finished video, as served by the download endpoint
    pub fn video_file_name(&self) -> Option<String> {
        self.video_path()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn script(&self) -> Option<&NarrationScript> {
        self.script.as_ref()
    }

    pub fn audio(&self) -> Option<&AudioTrack> {
        self.audio.as_ref()
    }

    pub fn markup(&self) -> Option<&Path> {
        self.markup.as_deref()
    }

    pub fn slides(&self) -> Option<&SlideImageSequence> {
        self.slides.as_ref()
    }

    pub fn timings(&self) -> Option<&TimingSequence> {
        self.timings.as_ref()
    }

    pub(crate) fn record_content(&mut self, content: Option<String>) {
        self.content = content;
        self.completed.push(Stage::Extract);
    }

    pub(crate) fn record_script(&mut self, script: NarrationScript) {
        self.script = Some(script);
        self.completed.push(Stage::GenerateScript);
    }

    pub(crate) fn record_audio(&mut self, audio: AudioTrack) {
        self.audio = Some(audio);
        self.completed.push(Stage::SynthesizeSpeech);
    }

    pub(crate) fn record_markup(&mut self, markup: PathBuf) {
        self.markup = Some(markup);
        self.completed.push(Stage::ComposeDeck);
    }

    pub(crate) fn record_slides(&mut self, slides: SlideImageSequence) {
        self.slides = Some(slides);
        self.completed.push(Stage::RenderSlides);
    }

    pub(crate) fn record_timings(&mut self, timings: TimingSequence) {
        self.timings = Some(timings);
        self.completed.push(Stage::ComputeTimings);
    }

    /// Mark the run successful. A run is finalized once; later calls are ignored.
    pub(crate) fn succeed(&mut self, video_path: PathBuf) {
        if self.status == RunStatus::InProgress {
            self.completed.push(Stage::AssembleVideo);
            self.status = RunStatus::Success { video_path };
        }
    }

    /// Mark the run failed. A run is finalized once; later calls are ignored.
    pub(crate) fn fail(&mut self, stage: Stage, error: StageError) {
        if self.status == RunStatus::InProgress {
            self.status = RunStatus::Failure { stage, error };
        }
    }
}
