/*!
 * Common test utilities for the deckcast test suite
 */

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use deckcast::app_config::{ExtractorConfig, StorageConfig};
use deckcast::extract::DocumentExtractor;
use deckcast::pipeline::{Collaborators, PresentationPipeline};


pub use mock_collaborators::*;

/// Route library logs through the test harness; safe to call repeatedly
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Storage rooted in a temporary directory
pub fn temp_storage(root: &Path, keep_artifacts: bool) -> StorageConfig {
    StorageConfig {
        work_dir: root.join("runs"),
        output_dir: root.join("videos"),
        keep_artifacts,
    }
}

/// What the mock collaborators should do in one test
#[derive(Debug, Clone)]
pub struct MockSetup {
    pub script: Result<String, deckcast::StageError>,
    pub audio_duration: f64,
    pub speech_error: Option<deckcast::StageError>,
    pub deck_error: Option<deckcast::StageError>,
    pub slide_count: usize,
    pub render_error: Option<deckcast::StageError>,
    pub assembly_error: Option<deckcast::StageError>,
    pub keep_artifacts: bool,
}

impl Default for MockSetup {
    fn default() -> Self {
        Self {
            script: Ok("one two\n\nthree four five six".to_string()),
            audio_duration: 10.0,
            speech_error: None,
            deck_error: None,
            slide_count: 2,
            render_error: None,
            assembly_error: None,
            keep_artifacts: false,
        }
    }
}

/// A pipeline wired to mock collaborators, plus what they observed
pub struct MockHarness {
    pub pipeline: PresentationPipeline,
    pub log: CallLog,
    pub script_requests: Arc<Mutex<Vec<(Option<String>, String)>>>,
    pub assembled: Arc<Mutex<Option<AssembledVideo>>>,
    pub root: TempDir,
}

impl MockHarness {
    pub fn new(setup: MockSetup) -> Self {
        init_test_logging();
        let root = TempDir::new().expect("temp dir");
        let log = CallLog::default();
        let script_requests = Arc::new(Mutex::new(Vec::new()));
        let assembled = Arc::new(Mutex::new(None));

        let collaborators = Collaborators {
            extractor: Arc::new(TrackingExtractor::new(
                DocumentExtractor::new(ExtractorConfig::default()),
                log.clone(),
            )),
            script_generator: Arc::new(MockScriptGenerator {
                log: log.clone(),
                result: setup.script.clone(),
                requests: script_requests.clone(),
            }),
            speech: Arc::new(MockSpeech {
                log: log.clone(),
                duration: setup.audio_duration,
                error: setup.speech_error.clone(),
            }),
            deck_composer: Arc::new(MockDeckComposer {
                log: log.clone(),
                error: setup.deck_error.clone(),
            }),
            renderer: Arc::new(MockRenderer {
                log: log.clone(),
                slide_count: setup.slide_count,
                error: setup.render_error.clone(),
            }),
            assembler: Arc::new(MockAssembler {
                log: log.clone(),
                error: setup.assembly_error.clone(),
                assembled: assembled.clone(),
            }),
        };

        let storage = temp_storage(root.path(), setup.keep_artifacts);
        Self {
            pipeline: PresentationPipeline::new(collaborators, storage),
            log,
            script_requests,
            assembled,
            root,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("videos")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join("runs")
    }

    pub fn assembled(&self) -> Option<AssembledVideo> {
        self.assembled.lock().unwrap().clone()
    }
}
