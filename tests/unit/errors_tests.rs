/*!
 * Tests for error types
 */

use deckcast::errors::{AppError, Stage, StageError};

/// Stages are listed in execution order with readable names
#[test]
fn test_stage_all_shouldFollowPipelineOrder() {
    let names: Vec<&str> = Stage::ALL.iter().map(Stage::name).collect();
    assert_eq!(
        names,
        vec![
            "content extraction",
            "script generation",
            "speech synthesis",
            "slide deck generation",
            "slide rendering",
            "timing computation",
            "video assembly",
        ]
    );
}

/// Error kinds are stable labels independent of the message
#[test]
fn test_stageError_kind_shouldNotDependOnMessage() {
    let unsupported = StageError::UnsupportedFormat {
        extension: "docx".to_string(),
    };
    assert_eq!(unsupported.kind(), "UnsupportedFormat");
    assert_eq!(
        unsupported.to_string(),
        "Unsupported file format 'docx'. Please upload a .txt or .pdf file."
    );
    assert_eq!(StageError::external("TTS", "boom").kind(), "ExternalServiceError");
    assert_eq!(StageError::Rendering("x".into()).kind(), "RenderingError");
    assert_eq!(StageError::TimingComputation("x".into()).kind(), "TimingComputationError");
    assert_eq!(StageError::Assembly("x".into()).kind(), "AssemblyError");
}

/// I/O failures become storage errors
#[test]
fn test_stageError_fromIo_shouldBeStorage() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: StageError = io.into();
    assert_eq!(err.kind(), "StorageError");
}

/// Stage errors keep their message inside the application error
#[test]
fn test_appError_fromStageError_shouldWrapMessage() {
    let err: AppError = StageError::Assembly("ffmpeg exited with 1".into()).into();
    assert_eq!(err.to_string(), "Pipeline error: Assembly error: ffmpeg exited with 1");
}
