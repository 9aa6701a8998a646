/*!
 * Error types for the deckcast application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::fmt;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extract,
    GenerateScript,
    SynthesizeSpeech,
    ComposeDeck,
    RenderSlides,
    ComputeTimings,
    AssembleVideo,
}

impl Stage {
    /// All stages in the order the pipeline runs them
    pub const ALL: [Stage; 7] = [
        Stage::Extract,
        Stage::GenerateScript,
        Stage::SynthesizeSpeech,
        Stage::ComposeDeck,
        Stage::RenderSlides,
        Stage::ComputeTimings,
        Stage::AssembleVideo,
    ];

    /// Human readable stage name used in status messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Extract => "content extraction",
            Self::GenerateScript => "script generation",
            Self::SynthesizeSpeech => "speech synthesis",
            Self::ComposeDeck => "slide deck generation",
            Self::RenderSlides => "slide rendering",
            Self::ComputeTimings => "timing computation",
            Self::AssembleVideo => "video assembly",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure reported by a single pipeline stage
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    /// The uploaded document has an extension no extractor handles
    #[error("Unsupported file format '{extension}'. Please upload a .txt or .pdf file.")]
    UnsupportedFormat {
        /// Declared extension of the document (may be empty)
        extension: String,
    },

    /// An external service or tool (LLM, TTS, pdftotext) failed
    #[error("{service} failed: {message}")]
    ExternalService {
        /// Which collaborator failed
        service: &'static str,
        /// Cause reported by the collaborator
        message: String,
    },

    /// Slide rendering failed (no slides, renderer timeout, browser error)
    #[error("Rendering error: {0}")]
    Rendering(String),

    /// No timing sequence could be produced, not even the fallback
    #[error("Timing computation error: {0}")]
    TimingComputation(String),

    /// Video muxing failed
    #[error("Assembly error: {0}")]
    Assembly(String),

    /// Run workspace could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),
}

impl StageError {
    /// Shorthand for an external service failure
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service,
            message: message.into(),
        }
    }

    /// Short error kind label, stable across messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "UnsupportedFormat",
            Self::ExternalService { .. } => "ExternalServiceError",
            Self::Rendering(_) => "RenderingError",
            Self::TimingComputation(_) => "TimingComputationError",
            Self::Assembly(_) => "AssemblyError",
            Self::Storage(_) => "StorageError",
        }
    }
}

impl From<std::io::Error> for StageError {
    fn from(error: std::io::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from a pipeline stage
    #[error("Pipeline error: {0}")]
    Stage(#[from] StageError),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
