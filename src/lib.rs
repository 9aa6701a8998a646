/*!
 * # deckcast - narrated slide-deck videos from documents
 *
 * A document (plain text or PDF) and a question go in; an MP4 comes out in
 * which a synthesized voice explains the document over a Reveal.js deck.
 *
 * ## Pipeline
 *
 * extract → generate script → synthesize speech → compose deck →
 * render slides → compute timings → assemble video
 *
 * Each run works in its own workspace and stops at the first failing stage.
 * The interesting part is `timing`: the script's blank-line separated blocks
 * are mapped onto the rendered slides so that per-slide display durations add
 * up to the narration's length.
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management and per-collaborator call policies
 * - `pipeline`: The orchestrator and the run state it finalizes
 * - `timing`: Slide timing allocation
 * - `narration`: Narration scripts and their blocks
 * - `extract`: Document text extraction
 * - `generation`: Script and slide deck generation through a language model
 * - `speech`: Text to speech
 * - `render`: Headless browser slide rendering
 * - `assemble`: ffmpeg video assembly
 * - `providers`: Clients for OpenAI-compatible and Ollama APIs
 * - `server`: The HTTP API
 * - `workspace`: Per-run storage
 * - `policy`, `tools`: Timeouts and retries, external command execution
 * - `app_controller`: Wires the configuration to the pipeline
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod assemble;
pub mod errors;
pub mod extract;
pub mod file_utils;
pub mod generation;
pub mod narration;
pub mod pipeline;
pub mod policy;
pub mod providers;
pub mod render;
pub mod server;
pub mod speech;
pub mod timing;
pub mod tools;
pub mod workspace;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ProviderError, Stage, StageError};
pub use narration::NarrationScript;
pub use pipeline::{Collaborators, PipelineRun, PresentationPipeline, RunStatus};
pub use timing::{AllocationStrategy, TimingSequence, allocate};
