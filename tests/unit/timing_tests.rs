/*!
 * Tests for slide timing allocation
 */

use deckcast::narration::NarrationScript;
use deckcast::timing::{AllocationStrategy, allocate, round2};
use deckcast::StageError;

fn script_with_blocks(word_counts: &[usize]) -> NarrationScript {
    let text = word_counts
        .iter()
        .enumerate()
        .map(|(i, &n)| vec![format!("w{}", i); n].join(" "))
        .collect::<Vec<_>>()
        .join("\n\n");
    NarrationScript::new(text)
}

/// Two blocks weighted 2:4 over ten seconds
#[test]
fn test_allocate_withTwoWeightedBlocks_shouldMatchKnownStarts() {
    let script = NarrationScript::new("one two\n\nthree four five six");
    let timings = allocate(&script, 10.0, 2).unwrap();

    assert_eq!(timings.starts(), &[0.0, 3.33]);
    assert_eq!(timings.strategy(), AllocationStrategy::WeightedProportional);
}

/// More slides than blocks falls back to equal spacing
#[test]
fn test_allocate_withMoreSlidesThanBlocks_shouldSpaceEqually() {
    let script = NarrationScript::new("one two\n\nthree four five six");
    let timings = allocate(&script, 10.0, 3).unwrap();

    assert_eq!(timings.starts(), &[0.0, 3.33, 6.67]);
    assert_eq!(timings.strategy(), AllocationStrategy::EqualDistribution);
}

/// Fallback starts follow round(i * d / n, 2)
#[test]
fn test_allocate_withBlockMismatch_shouldFollowEqualFormula() {
    let script = script_with_blocks(&[3, 1, 4, 1, 5]);
    for &(duration, slides) in &[(7.0, 3usize), (61.37, 9), (0.5, 4), (123.456, 2)] {
        let timings = allocate(&script, duration, slides).unwrap();
        let expected: Vec<f64> = (0..slides)
            .map(|i| round2(i as f64 * (duration / slides as f64)))
            .collect();
        assert_eq!(timings.starts(), expected.as_slice());
    }
}

/// Weighted starts stay within rounding distance of the exact cumulative shares
#[test]
fn test_allocate_withMatchingBlocks_shouldTrackExactShares() {
    let cases: &[(&[usize], f64)] = &[
        (&[1, 1, 1], 10.0),
        (&[5, 12, 7, 30], 47.3),
        (&[100, 1], 3.21),
        (&[2, 3, 5, 7, 11, 13, 17], 92.84),
    ];

    for (counts, duration) in cases {
        let script = script_with_blocks(counts);
        let timings = allocate(&script, *duration, counts.len()).unwrap();
        assert_eq!(timings.strategy(), AllocationStrategy::WeightedProportional);

        let total: usize = counts.iter().sum();
        let mut exact = 0.0;
        for (i, start) in timings.starts().iter().enumerate() {
            assert!(
                (start - exact).abs() <= 0.01 * i as f64 + 1e-9,
                "start {} = {} drifted from {}",
                i,
                start,
                exact
            );
            exact += counts[i] as f64 / total as f64 * duration;
        }

        let sum: f64 = timings.durations().iter().sum();
        assert!((sum - duration).abs() <= 0.01 * counts.len() as f64);
    }
}

/// Starts begin at zero, never decrease and never pass the audio end
#[test]
fn test_allocate_startsShouldBeOrderedAndBounded() {
    let script = script_with_blocks(&[0, 4, 0, 9, 2]);
    for slides in 1..8 {
        let timings = allocate(&script, 12.5, slides).unwrap();
        let starts = timings.starts();
        assert_eq!(starts.len(), slides);
        assert_eq!(starts[0], 0.0);
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
        assert!(starts.iter().all(|&s| s <= 12.5));
    }
}

/// Zero slides cannot be timed
#[test]
fn test_allocate_withZeroSlides_shouldFail() {
    let script = NarrationScript::new("one two");
    assert!(matches!(
        allocate(&script, 10.0, 0),
        Err(StageError::TimingComputation(_))
    ));
}

/// A script with no words is timed equally
#[test]
fn test_allocate_withWordlessScript_shouldFallBack() {
    let timings = allocate(&NarrationScript::new(""), 9.0, 3).unwrap();
    assert_eq!(timings.starts(), &[0.0, 3.0, 6.0]);
    assert_eq!(timings.strategy(), AllocationStrategy::EqualDistribution);
}

/// Same input, same output
#[test]
fn test_allocate_shouldBeDeterministic() {
    let script = script_with_blocks(&[8, 3, 13]);
    let first = allocate(&script, 33.3, 3).unwrap();
    for _ in 0..10 {
        assert_eq!(allocate(&script, 33.3, 3).unwrap(), first);
    }
}
