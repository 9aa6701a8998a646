/*!
 * Slide timing allocation.
 *
 * Maps a narration script onto the rendered slides: every slide gets a start
 * offset into the narrated audio. The primary strategy weights each slide by
 * the word count of its script block. When the script's block structure does
 * not line up with the rendered slides, time is split evenly instead.
 *
 * Either way the per-slide durations cover the whole audio track.
 */

use log::{debug, warn};
use std::fmt;

use crate::errors::StageError;
use crate::narration::NarrationScript;

/// How a timing sequence was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStrategy {
    /// Proportional to the word count of each script block
    WeightedProportional,
    /// Equal share of the audio for every slide
    EqualDistribution,
}

/// Why the weighted strategy could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Script blocks and rendered slides differ in number
    BlockCountMismatch { blocks: usize, slides: usize },
    /// The script contains no words to weight by
    NoWords,
    /// An intermediate value was not a finite number
    NonFinite,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockCountMismatch { blocks, slides } => write!(
                f,
                "script has {} blocks but {} slides were rendered",
                blocks, slides
            ),
            Self::NoWords => f.write_str("script contains no words"),
            Self::NonFinite => f.write_str("weighted durations are not finite"),
        }
    }
}

/// Start offsets (seconds) of each slide within the audio track
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSequence {
    starts: Vec<f64>,
    total_duration: f64,
    strategy: AllocationStrategy,
}

impl TimingSequence {
    /// Start offsets, one per slide, rounded to hundredths of a second
    pub fn starts(&self) -> &[f64] {
        &self.starts
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Audio duration the sequence covers
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn strategy(&self) -> AllocationStrategy {
        self.strategy
    }

    /// Display duration of each slide.
    ///
    /// Each slide lasts until the next one starts; the last slide runs to the
    /// end of the audio, so the durations sum to `total_duration`.
    pub fn durations(&self) -> Vec<f64> {
        let mut durations: Vec<f64> = self
            .starts
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).max(0.0))
            .collect();
        if let Some(last) = self.starts.last() {
            durations.push((self.total_duration - last).max(0.0));
        }
        durations
    }
}

/// Round to two decimal places, halves to even
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Compute per-slide start times for `slide_count` slides narrated by `script`.
///
/// Falls back to equal distribution whenever the weighted strategy cannot be
/// applied. Fails only when there is nothing to time (`slide_count == 0`) or
/// the audio duration is unusable.
pub fn allocate(
    script: &NarrationScript,
    audio_duration: f64,
    slide_count: usize,
) -> Result<TimingSequence, StageError> {
    if !audio_duration.is_finite() || audio_duration <= 0.0 {
        return Err(StageError::TimingComputation(format!(
            "audio duration must be a positive number of seconds, got {}",
            audio_duration
        )));
    }
    if slide_count == 0 {
        return Err(StageError::TimingComputation(
            "no slides available for timing".to_string(),
        ));
    }

    match weighted_starts(script, audio_duration, slide_count) {
        Ok(starts) => {
            debug!("Weighted slide timings: {:?}", starts);
            Ok(TimingSequence {
                starts,
                total_duration: audio_duration,
                strategy: AllocationStrategy::WeightedProportional,
            })
        }
        Err(reason) => {
            warn!("Falling back to equal slide timings: {}", reason);
            Ok(TimingSequence {
                starts: equal_starts(audio_duration, slide_count),
                total_duration: audio_duration,
                strategy: AllocationStrategy::EqualDistribution,
            })
        }
    }
}

/// Word-count weighted start offsets
pub fn weighted_starts(
    script: &NarrationScript,
    audio_duration: f64,
    slide_count: usize,
) -> Result<Vec<f64>, FallbackReason> {
    let blocks = script.block_count();
    if blocks != slide_count {
        return Err(FallbackReason::BlockCountMismatch {
            blocks,
            slides: slide_count,
        });
    }

    let word_counts = script.word_counts();
    let total_words: usize = word_counts.iter().sum();
    if total_words == 0 || slide_count == 0 {
        return Err(FallbackReason::NoWords);
    }

    let mut durations: Vec<f64> = word_counts
        .iter()
        .map(|&words| words as f64 / total_words as f64 * audio_duration)
        .collect();

    // The last slide absorbs the rounding remainder
    let allocated: f64 = durations.iter().sum();
    if let Some(last) = durations.last_mut() {
        *last += audio_duration - allocated;
    }

    if durations.iter().any(|d| !d.is_finite()) {
        return Err(FallbackReason::NonFinite);
    }

    let mut starts = Vec::with_capacity(slide_count);
    let mut cursor = 0.0;
    for duration in &durations {
        starts.push(cursor);
        cursor = round2(cursor + duration).min(audio_duration);
    }

    Ok(starts)
}

/// Evenly spaced start offsets
pub fn equal_starts(audio_duration: f64, slide_count: usize) -> Vec<f64> {
    if slide_count == 0 {
        return Vec::new();
    }
    let share = audio_duration / slide_count as f64;
    (0..slide_count)
        .map(|i| round2(i as f64 * share))
        .collect()
}
