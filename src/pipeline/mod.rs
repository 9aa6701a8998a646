/*!
 * The presentation pipeline.
 *
 * extract → generate script → synthesize speech → compose deck →
 * render slides → compute timings → assemble video
 *
 * Each stage is a collaborator behind a trait object so runs can be driven
 * with real services or with test doubles.
 */

pub mod orchestrator;
pub mod run;

pub use orchestrator::{Collaborators, PresentationPipeline};
pub use run::{PipelineRun, RunStatus};
