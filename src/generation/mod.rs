/*!
 * Language model backed generation steps.
 *
 * - `script`: the teaching-assistant narration script
 * - `deck`: the Reveal.js slide deck built from that script
 * - `prompts`: user message construction and response cleanup
 */

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::errors::StageError;
use crate::narration::NarrationScript;

pub mod deck;
pub mod prompts;
pub mod script;

pub use deck::LlmDeckComposer;
pub use script::LlmScriptGenerator;

/// Produces the narration script
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Explain `content` (if any) in answer to `question`.
    ///
    /// Blocks of the returned script are separated by blank lines.
    async fn generate(
        &self,
        content: Option<&str>,
        question: &str,
    ) -> Result<NarrationScript, StageError>;
}

/// Produces the slide deck markup for a script
#[async_trait]
pub trait DeckComposer: Send + Sync {
    /// Write a standalone Reveal.js HTML deck for `script` to `output`
    async fn compose(
        &self,
        script: &NarrationScript,
        output: &Path,
    ) -> Result<PathBuf, StageError>;
}
