/*!
 * Speech synthesis of the narration script.
 *
 * The script is sent to an OpenAI-compatible `/audio/speech` endpoint. Long
 * scripts are split into chunks under the service's input limit, synthesized
 * one by one and joined with ffmpeg. The duration of the resulting track is
 * always measured from the written file with ffprobe.
 */

use async_trait::async_trait;
use log::{debug, info};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::{AssemblerConfig, SpeechConfig};
use crate::errors::StageError;
use crate::narration::NarrationScript;
use crate::policy::run_with_policy;
use crate::providers::openai::{OpenAI, SpeechRequest};
use crate::tools::{concat_list, probe_duration, run_tool};

const SERVICE: &str = "Speech synthesis";

/// A synthesized narration track
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    path: PathBuf,
    duration_secs: f64,
}

impl AudioTrack {
    /// Wrap an audio file; the duration must be positive and finite
    pub fn new(path: impl Into<PathBuf>, duration_secs: f64) -> Result<Self, StageError> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(StageError::external(
                SERVICE,
                format!("audio duration must be positive, got {}", duration_secs),
            ));
        }
        Ok(Self {
            path: path.into(),
            duration_secs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }
}

/// Turns a narration script into an audio track
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `script` into `output`
    async fn synthesize(
        &self,
        script: &NarrationScript,
        output: &Path,
    ) -> Result<AudioTrack, StageError>;
}

/// Speech synthesizer for OpenAI-compatible TTS services
#[derive(Debug, Clone)]
pub struct OpenAiSpeech {
    client: Arc<OpenAI>,
    config: SpeechConfig,
    ffmpeg: String,
    ffprobe: String,
}

impl OpenAiSpeech {
    pub fn new(config: SpeechConfig, media: &AssemblerConfig) -> Self {
        let client = OpenAI::new(
            config.resolve_api_key().unwrap_or_default(),
            config.endpoint.clone(),
            config.model.clone(),
        );
        Self {
            client: Arc::new(client),
            config,
            ffmpeg: media.ffmpeg.clone(),
            ffprobe: media.ffprobe.clone(),
        }
    }

    async fn synthesize_chunk(&self, text: &str, output: &Path) -> Result<(), StageError> {
        let request = SpeechRequest {
            model: self.config.model.clone(),
            voice: self.config.voice.clone(),
            input: text.to_string(),
            response_format: "mp3".to_string(),
        };

        let request = &request;
        let client = &self.client;
        let audio = run_with_policy(
            &self.config.policy,
            "speech request",
            |msg| StageError::external(SERVICE, msg),
            || async move {
                client
                    .speech(request)
                    .await
                    .map_err(|e| StageError::external(SERVICE, e.to_string()))
            },
        )
        .await?;

        if audio.is_empty() {
            return Err(StageError::external(SERVICE, "service returned no audio"));
        }

        tokio::fs::write(output, &audio)
            .await
            .map_err(|e| StageError::Storage(format!("Failed to write {:?}: {}", output, e)))
    }

    async fn concat_chunks(&self, parts: &[PathBuf], output: &Path) -> Result<(), StageError> {
        let list_path = output.with_extension("parts.txt");
        let list = concat_list(parts.iter().map(|p| (p.as_path(), None)));
        tokio::fs::write(&list_path, list).await?;

        let args = [
            OsStr::new("-y"),
            OsStr::new("-f"),
            OsStr::new("concat"),
            OsStr::new("-safe"),
            OsStr::new("0"),
            OsStr::new("-i"),
            list_path.as_os_str(),
            OsStr::new("-c"),
            OsStr::new("copy"),
            output.as_os_str(),
        ];
        let program = self.ffmpeg.as_str();

        run_with_policy(
            &self.config.policy,
            "audio concatenation",
            |msg| StageError::external(SERVICE, msg),
            || async move {
                run_tool(program, args)
                    .await
                    .map_err(|e| StageError::external(SERVICE, e))
            },
        )
        .await?;

        for part in parts {
            let _ = tokio::fs::remove_file(part).await;
        }
        let _ = tokio::fs::remove_file(&list_path).await;
        Ok(())
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(
        &self,
        script: &NarrationScript,
        output: &Path,
    ) -> Result<AudioTrack, StageError> {
        let chunks = chunk_text(script, self.config.max_input_chars);
        if chunks.is_empty() {
            return Err(StageError::external(SERVICE, "script is empty"));
        }

        info!("Synthesizing speech in {} chunk(s)", chunks.len());
        if chunks.len() == 1 {
            self.synthesize_chunk(&chunks[0], output).await?;
        } else {
            let mut parts = Vec::with_capacity(chunks.len());
            for (i, chunk) in chunks.iter().enumerate() {
                let part = output.with_extension(format!("part{:03}.mp3", i));
                debug!("Synthesizing chunk {} ({} chars)", i, chunk.chars().count());
                self.synthesize_chunk(chunk, &part).await?;
                parts.push(part);
            }
            self.concat_chunks(&parts, output).await?;
        }

        let duration = probe_duration(&self.ffprobe, output)
            .await
            .map_err(|e| StageError::external(SERVICE, format!("could not measure audio: {}", e)))?;

        info!("Narration audio: {:.2}s", duration);
        AudioTrack::new(output, duration)
    }
}

/// Split the script into TTS requests of at most `max_chars` characters.
///
/// Blocks are packed whole where possible; a block longer than the limit is
/// split between words.
pub fn chunk_text(script: &NarrationScript, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    let push_piece = |piece: &str, separator: &str, current: &mut String, chunks: &mut Vec<String>| {
        let needed = if current.is_empty() {
            piece.chars().count()
        } else {
            current.chars().count() + separator.chars().count() + piece.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(current));
        }
        if !current.is_empty() {
            current.push_str(separator);
        }
        current.push_str(piece);
    };

    for block in script.blocks() {
        if block.chars().count() <= max_chars {
            push_piece(block, "\n\n", &mut current, &mut chunks);
            continue;
        }
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        for word in block.split_whitespace() {
            push_piece(word, " ", &mut current, &mut chunks);
        }
        chunks.push(std::mem::take(&mut current));
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks.retain(|c| !c.is_empty());
    chunks
}
