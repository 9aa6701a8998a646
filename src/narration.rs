/*!
 * Narration script model.
 *
 * A narration script is the generated explanation text. It is spoken as a
 * whole and split into blocks on blank lines, one block per intended slide.
 */

use once_cell::sync::Lazy;
use regex::Regex;

// Two or more line breaks, whitespace-only lines included
static BLOCK_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").expect("valid block boundary regex"));

/// Generated narration text split into slide blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationScript {
    text: String,
    blocks: Vec<String>,
}

impl NarrationScript {
    /// Parse generated text into a script
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let blocks = split_blocks(&text);
        Self { text, blocks }
    }

    /// Full text, as sent to speech synthesis
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Slide blocks in order
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    /// Number of blocks, i.e. the intended slide count
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Whitespace separated word count of each block
    pub fn word_counts(&self) -> Vec<usize> {
        self.blocks.iter().map(|b| b.split_whitespace().count()).collect()
    }

    pub fn total_words(&self) -> usize {
        self.word_counts().iter().sum()
    }

    pub fn is_blank(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Split text into trimmed, non-empty blocks on blank-line boundaries
pub fn split_blocks(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    BLOCK_BOUNDARY
        .split(trimmed)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(str::to_string)
        .collect()
}
