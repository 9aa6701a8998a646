/*!
 * End-to-end pipeline tests with mock collaborators
 */

use deckcast::errors::{Stage, StageError};
use deckcast::extract::Document;
use deckcast::pipeline::RunStatus;
use deckcast::timing::AllocationStrategy;
use crate::common::{MockHarness, MockSetup};

fn count_entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// A text upload runs every stage in order and produces a video
#[tokio::test]
async fn test_run_withTextDocument_shouldSucceed() {
    let harness = MockHarness::new(MockSetup::default());
    let document = Document::new("notes.txt", "Cells divide by mitosis.");

    let run = harness.pipeline.run(Some(document), "What is mitosis?").await;

    assert!(run.is_success(), "{}", run.message());
    assert_eq!(run.message(), "Presentation created successfully!");
    let collaborator_stages: Vec<Stage> = Stage::ALL
        .into_iter()
        .filter(|stage| *stage != Stage::ComputeTimings)
        .collect();
    assert_eq!(harness.log.calls(), collaborator_stages);
    assert_eq!(run.completed_stages(), &Stage::ALL);

    let video = run.video_path().unwrap();
    assert!(video.is_file());
    assert!(video.starts_with(harness.output_dir()));
    assert_eq!(run.video_file_name().unwrap(), format!("{}.mp4", run.run_id()));

    let requests = harness.script_requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![(Some("Cells divide by mitosis.".to_string()), "What is mitosis?".to_string())]
    );
}

/// Durations handed to the assembler come from the weighted timings
#[tokio::test]
async fn test_run_withMatchingBlocks_shouldAssembleWeightedDurations() {
    let harness = MockHarness::new(MockSetup::default());

    let run = harness.pipeline.run(None, "Count to six").await;

    let timings = run.timings().unwrap();
    assert_eq!(timings.starts(), &[0.0, 3.33]);
    assert_eq!(timings.strategy(), AllocationStrategy::WeightedProportional);

    let assembled = harness.assembled().unwrap();
    assert_eq!(assembled.images.len(), 2);
    assert_eq!(assembled.durations.len(), 2);
    assert!((assembled.durations[0] - 3.33).abs() < 1e-9);
    assert!((assembled.durations[1] - 6.67).abs() < 1e-9);
    assert_eq!(assembled.audio_duration, 10.0);
}

/// Without a document the question alone drives the run
#[tokio::test]
async fn test_run_withoutDocument_shouldSkipExtractionCall() {
    let harness = MockHarness::new(MockSetup::default());

    let run = harness.pipeline.run(None, "Explain entropy").await;

    assert!(run.is_success());
    assert!(!harness.log.was_called(Stage::Extract));
    assert!(run.content().is_none());
    assert_eq!(
        harness.script_requests.lock().unwrap()[0],
        (None, "Explain entropy".to_string())
    );
}

/// An unsupported upload halts at extraction with no video
#[tokio::test]
async fn test_run_withDocx_shouldFailWithUnsupportedFormat() {
    let harness = MockHarness::new(MockSetup::default());
    let document = Document::new("report.docx", vec![0x50, 0x4b, 0x03, 0x04]);

    let run = harness.pipeline.run(Some(document), "Summarize").await;

    let (stage, error) = run.failure().unwrap();
    assert_eq!(stage, Stage::Extract);
    assert!(matches!(error, StageError::UnsupportedFormat { extension } if extension == "docx"));
    assert!(run.video_path().is_none());
    assert!(run.video_file_name().is_none());
    assert!(run.message().contains("Please upload a .txt or .pdf file."));
    assert_eq!(harness.log.calls(), vec![Stage::Extract]);
    assert_eq!(count_entries(&harness.output_dir()), 0);
}

/// Zero rendered slides is a rendering error and timing never runs
#[tokio::test]
async fn test_run_withZeroSlides_shouldFailBeforeTiming() {
    let harness = MockHarness::new(MockSetup {
        slide_count: 0,
        ..MockSetup::default()
    });

    let run = harness.pipeline.run(None, "Anything").await;

    let (stage, error) = run.failure().unwrap();
    assert_eq!(stage, Stage::RenderSlides);
    assert_eq!(error.kind(), "RenderingError");
    assert!(run.timings().is_none());
    assert!(!harness.log.was_called(Stage::AssembleVideo));
    assert!(!run.completed_stages().contains(&Stage::ComputeTimings));
}

/// A failing stage short-circuits everything after it
#[tokio::test]
async fn test_run_withSpeechFailure_shouldSkipLaterStages() {
    let harness = MockHarness::new(MockSetup {
        speech_error: Some(StageError::external("Speech synthesis", "quota exceeded")),
        ..MockSetup::default()
    });

    let run = harness.pipeline.run(None, "Anything").await;

    assert_eq!(
        run.message(),
        "Error during speech synthesis: Speech synthesis failed: quota exceeded"
    );
    assert_eq!(
        harness.log.calls(),
        vec![Stage::GenerateScript, Stage::SynthesizeSpeech]
    );
    assert!(matches!(run.status(), RunStatus::Failure { stage: Stage::SynthesizeSpeech, .. }));
}

/// A script generation failure is tagged with its stage
#[tokio::test]
async fn test_run_withScriptFailure_shouldReportScriptStage() {
    let harness = MockHarness::new(MockSetup {
        script: Err(StageError::external("Script generation", "401 unauthorized")),
        ..MockSetup::default()
    });

    let run = harness.pipeline.run(None, "Anything").await;

    assert_eq!(run.failure().map(|(stage, _)| stage), Some(Stage::GenerateScript));
    assert!(run.script().is_none());
    assert!(!harness.log.was_called(Stage::SynthesizeSpeech));
}

/// Mismatched block and slide counts still produce a video with equal timings
#[tokio::test]
async fn test_run_withMoreSlidesThanBlocks_shouldFallBackToEqualTimings() {
    let harness = MockHarness::new(MockSetup {
        slide_count: 3,
        ..MockSetup::default()
    });

    let run = harness.pipeline.run(None, "Anything").await;

    assert!(run.is_success());
    let timings = run.timings().unwrap();
    assert_eq!(timings.starts(), &[0.0, 3.33, 6.67]);
    assert_eq!(timings.strategy(), AllocationStrategy::EqualDistribution);
}

/// A failed assembly leaves no partial video behind
#[tokio::test]
async fn test_run_withAssemblyFailure_shouldRemovePartialVideo() {
    let harness = MockHarness::new(MockSetup {
        assembly_error: Some(StageError::Assembly("ffmpeg exited with 1".to_string())),
        ..MockSetup::default()
    });

    let run = harness.pipeline.run(None, "Anything").await;

    assert_eq!(run.failure().map(|(stage, _)| stage), Some(Stage::AssembleVideo));
    assert!(run.video_path().is_none());
    assert_eq!(count_entries(&harness.output_dir()), 0);
}

/// The workspace is removed after the run unless artifacts are kept
#[tokio::test]
async fn test_run_workspaceCleanup_shouldFollowKeepArtifacts() {
    let harness = MockHarness::new(MockSetup::default());
    let run = harness.pipeline.run(None, "Anything").await;
    assert!(run.is_success());
    assert_eq!(count_entries(&harness.work_dir()), 0);

    let harness = MockHarness::new(MockSetup {
        keep_artifacts: true,
        ..MockSetup::default()
    });
    let run = harness.pipeline.run(None, "Anything").await;
    let workspace = harness.work_dir().join(run.run_id().to_string());
    assert!(workspace.join("narration_script.txt").is_file());
    assert!(workspace.join("ta_explanation_audio.mp3").is_file());
    assert!(workspace.join("presentation.html").is_file());
    assert!(workspace.join("slides").join("slide_001.png").is_file());
}

/// Concurrent runs get separate workspaces and videos
#[tokio::test]
async fn test_run_concurrently_shouldIsolateRuns() {
    let harness = MockHarness::new(MockSetup::default());

    let (first, second) = tokio::join!(
        harness.pipeline.run(None, "First"),
        harness.pipeline.run(None, "Second")
    );

    assert!(first.is_success() && second.is_success());
    assert_ne!(first.run_id(), second.run_id());
    assert_ne!(first.video_path(), second.video_path());
    assert_eq!(count_entries(&harness.output_dir()), 2);
}

/// A deck composition failure stops the run before rendering
#[tokio::test]
async fn test_run_withDeckFailure_shouldSkipRendering() {
    let harness = MockHarness::new(MockSetup {
        deck_error: Some(StageError::external("Slide deck generation", "model returned no slides")),
        ..MockSetup::default()
    });

    let run = harness.pipeline.run(None, "Anything").await;

    assert_eq!(run.failure().map(|(stage, _)| stage), Some(Stage::ComposeDeck));
    assert!(run.audio().is_some());
    assert!(run.markup().is_none());
    assert_eq!(
        harness.log.calls(),
        vec![Stage::GenerateScript, Stage::SynthesizeSpeech, Stage::ComposeDeck]
    );
    assert_eq!(count_entries(&harness.output_dir()), 0);
}

/// A renderer failure is reported on the rendering stage and nothing is assembled
#[tokio::test]
async fn test_run_withRenderFailure_shouldSkipTimingAndAssembly() {
    let harness = MockHarness::new(MockSetup {
        render_error: Some(StageError::Rendering(
            "Reveal.js did not become ready within 30s".to_string(),
        )),
        ..MockSetup::default()
    });

    let run = harness.pipeline.run(None, "Anything").await;

    assert_eq!(
        run.message(),
        "Error during slide rendering: Rendering error: Reveal.js did not become ready within 30s"
    );
    assert!(run.slides().is_none());
    assert!(run.timings().is_none());
    assert!(!harness.log.was_called(Stage::AssembleVideo));
    assert!(harness.assembled().is_none());
}
