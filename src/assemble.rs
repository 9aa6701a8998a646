/*!
 * Muxing of the slide images and the narration into the final MP4.
 *
 * Images are fed to ffmpeg through a concat demuxer list that carries each
 * slide's display duration; the narration is mapped as the audio track.
 */

use async_trait::async_trait;
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::AssemblerConfig;
use crate::errors::StageError;
use crate::policy::run_with_policy;
use crate::tools::{concat_list, run_tool};

/// Everything the assembler needs for one video
#[derive(Debug, Clone)]
pub struct AssemblyRequest<'a> {
    pub images: &'a [PathBuf],
    pub audio: &'a Path,
    pub audio_duration: f64,
    pub durations: &'a [f64],
    pub output: &'a Path,
    /// Where the concat demuxer list is written
    pub list_path: &'a Path,
}

/// Muxes slide images and audio into a video
#[async_trait]
pub trait VideoAssembler: Send + Sync {
    /// Produce the video at `request.output` and return its path
    async fn assemble(&self, request: AssemblyRequest<'_>) -> Result<PathBuf, StageError>;
}

/// Match the durations list to the number of images.
///
/// Extra durations are dropped. Missing ones share whatever audio time the
/// given durations leave; when nothing is left each gets an equal share of
/// the whole track.
pub fn reconcile_durations(durations: &[f64], image_count: usize, audio_duration: f64) -> Vec<f64> {
    if durations.len() == image_count {
        return durations.to_vec();
    }

    if durations.len() > image_count {
        warn!(
            "Got {} durations for {} slides, dropping the extras",
            durations.len(),
            image_count
        );
        return durations[..image_count].to_vec();
    }

    let missing = image_count - durations.len();
    let remaining = audio_duration - durations.iter().sum::<f64>();
    let share = if remaining > 0.0 {
        remaining / missing as f64
    } else {
        audio_duration / image_count as f64
    };
    warn!(
        "Got {} durations for {} slides, padding with {:.2}s each",
        durations.len(),
        image_count,
        share
    );

    let mut reconciled = durations.to_vec();
    reconciled.resize(image_count, share);
    reconciled
}

/// Video assembler backed by the ffmpeg command line
#[derive(Debug, Clone)]
pub struct FfmpegAssembler {
    config: AssemblerConfig,
}

impl FfmpegAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    fn ffmpeg_args(&self, list: &Path, audio: &Path, output: &Path) -> Vec<String> {
        let lossy = |p: &Path| p.to_string_lossy().into_owned();
        vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            lossy(list),
            "-i".to_string(),
            lossy(audio),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-vf".to_string(),
            "scale=trunc(iw/2)*2:trunc(ih/2)*2,format=yuv420p".to_string(),
            "-r".to_string(),
            self.config.fps.to_string(),
            "-c:v".to_string(),
            self.config.video_codec.clone(),
            "-c:a".to_string(),
            self.config.audio_codec.clone(),
            "-shortest".to_string(),
            lossy(output),
        ]
    }
}

#[async_trait]
impl VideoAssembler for FfmpegAssembler {
    async fn assemble(&self, request: AssemblyRequest<'_>) -> Result<PathBuf, StageError> {
        if request.images.is_empty() {
            return Err(StageError::Assembly("No slide images to assemble".to_string()));
        }

        let durations =
            reconcile_durations(request.durations, request.images.len(), request.audio_duration);

        // The concat demuxer ignores the duration of the final entry unless
        // the file is listed once more.
        let last = request.images.len() - 1;
        let entries = request
            .images
            .iter()
            .zip(durations.iter())
            .map(|(image, duration)| (image.as_path(), Some(*duration)))
            .chain(std::iter::once((request.images[last].as_path(), None)));
        tokio::fs::write(request.list_path, concat_list(entries)).await?;

        let args = self.ffmpeg_args(request.list_path, request.audio, request.output);
        let program = self.config.ffmpeg.as_str();
        let args = &args;

        let result = run_with_policy(
            &self.config.policy,
            "video encoding",
            StageError::Assembly,
            || async move { run_tool(program, args).await.map_err(StageError::Assembly) },
        )
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(request.output).await;
            return Err(e);
        }

        match tokio::fs::metadata(request.output).await {
            Ok(meta) if meta.len() > 0 => {}
            _ => {
                let _ = tokio::fs::remove_file(request.output).await;
                return Err(StageError::Assembly(format!(
                    "ffmpeg produced no output at {:?}",
                    request.output
                )));
            }
        }

        info!(
            "Assembled {} slides into {:?}",
            request.images.len(),
            request.output
        );
        Ok(request.output.to_path_buf())
    }
}
