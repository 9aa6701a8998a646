/*!
 * Content extraction: turns an uploaded document into plain text.
 *
 * Plain text files are decoded directly, PDF files go through `pdftotext`.
 * Any other extension is reported as `UnsupportedFormat`.
 */

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info};
use std::ffi::OsStr;
use std::path::Path;

use crate::app_config::ExtractorConfig;
use crate::errors::StageError;
use crate::file_utils::FileManager;
use crate::policy::run_with_policy;
use crate::tools::run_tool;

/// An uploaded document: raw bytes plus the name it was uploaded under
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub file_name: String,
    pub bytes: Bytes,
}

impl Document {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Declared extension, lowercased, without the dot
    pub fn extension(&self) -> String {
        FileManager::extension_of(&self.file_name)
    }
}

/// Document formats the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
}

impl DocumentFormat {
    /// Map a lowercased extension to a format
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Turns a stored document into plain text
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Extract the text of `document`, whose bytes are also stored at `stored_at`
    async fn extract(&self, document: &Document, stored_at: &Path) -> Result<String, StageError>;
}

/// Extractor for `.txt` and `.pdf` documents
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    config: ExtractorConfig,
}

impl DocumentExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    async fn extract_pdf(&self, stored_at: &Path) -> Result<String, StageError> {
        // "-layout" keeps reading order; "-" sends the text to stdout
        let args = [
            OsStr::new("-enc"),
            OsStr::new("UTF-8"),
            OsStr::new("-layout"),
            stored_at.as_os_str(),
            OsStr::new("-"),
        ];

        let program = self.config.pdftotext.as_str();

        let output = run_with_policy(
            &self.config.policy,
            "pdftotext",
            |msg| StageError::external("PDF extraction", msg),
            || async move {
                run_tool(program, args)
                    .await
                    .map_err(|e| StageError::external("PDF extraction", e))
            },
        )
        .await?;

        // pdftotext separates pages with form feeds
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text
            .split('\u{c}')
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[async_trait]
impl ContentExtractor for DocumentExtractor {
    async fn extract(&self, document: &Document, stored_at: &Path) -> Result<String, StageError> {
        let extension = document.extension();
        let format = DocumentFormat::from_extension(&extension)
            .ok_or(StageError::UnsupportedFormat { extension })?;

        info!("Extracting text from {} ({:?})", document.file_name, format);
        let text = match format {
            DocumentFormat::PlainText => String::from_utf8_lossy(&document.bytes).into_owned(),
            DocumentFormat::Pdf => self.extract_pdf(stored_at).await?,
        };

        debug!("Extracted {} characters", text.len());
        Ok(text)
    }
}
