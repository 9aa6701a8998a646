/*!
 * Per-run storage.
 *
 * Each pipeline run owns a directory `<work_dir>/<run_id>/` holding its
 * uploaded document and intermediate artifacts. The finished video is written
 * to `<output_dir>/<run_id>.mp4` so it survives workspace cleanup.
 */

use log::{debug, warn};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::app_config::StorageConfig;
use crate::errors::StageError;

const SCRIPT_FILE: &str = "narration_script.txt";
const AUDIO_FILE: &str = "ta_explanation_audio.mp3";
const MARKUP_FILE: &str = "presentation.html";
const SLIDES_DIR: &str = "slides";
const CONCAT_FILE: &str = "slides_concat.txt";

/// Isolated storage for one pipeline run
#[derive(Debug, Clone)]
pub struct RunWorkspace {
    run_id: Uuid,
    dir: PathBuf,
    output_dir: PathBuf,
}

impl RunWorkspace {
    /// Create a fresh workspace with a newly generated run id
    pub async fn create(storage: &StorageConfig) -> Result<Self, StageError> {
        Self::create_with_id(storage, Uuid::new_v4()).await
    }

    /// Create a workspace for a known run id
    pub async fn create_with_id(storage: &StorageConfig, run_id: Uuid) -> Result<Self, StageError> {
        let dir = storage.work_dir.join(run_id.to_string());
        tokio::fs::create_dir_all(dir.join(SLIDES_DIR))
            .await
            .map_err(|e| StageError::Storage(format!("Failed to create run workspace {:?}: {}", dir, e)))?;
        tokio::fs::create_dir_all(&storage.output_dir)
            .await
            .map_err(|e| {
                StageError::Storage(format!(
                    "Failed to create output directory {:?}: {}",
                    storage.output_dir, e
                ))
            })?;

        debug!("Created workspace {:?} for run {}", dir, run_id);
        Ok(Self {
            run_id,
            dir,
            output_dir: storage.output_dir.clone(),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the uploaded document is stored, keeping its declared extension
    pub fn document_path(&self, extension: &str) -> PathBuf {
        if extension.is_empty() {
            self.dir.join("document")
        } else {
            self.dir.join(format!("document.{}", extension))
        }
    }

    pub fn script_path(&self) -> PathBuf {
        self.dir.join(SCRIPT_FILE)
    }

    pub fn audio_path(&self) -> PathBuf {
        self.dir.join(AUDIO_FILE)
    }

    pub fn markup_path(&self) -> PathBuf {
        self.dir.join(MARKUP_FILE)
    }

    pub fn slides_dir(&self) -> PathBuf {
        self.dir.join(SLIDES_DIR)
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.dir.join(CONCAT_FILE)
    }

    /// File name of the finished video inside the output directory
    pub fn video_file_name(&self) -> String {
        format!("{}.mp4", self.run_id)
    }

    pub fn video_path(&self) -> PathBuf {
        self.output_dir.join(self.video_file_name())
    }

    /// Remove the workspace directory. The finished video is not touched.
    pub async fn cleanup(&self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            warn!("Failed to remove workspace {:?}: {}", self.dir, e);
        }
    }
}
