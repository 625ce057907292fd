//! Speaking-pattern analysis derived purely from the transcription buffer:
//! words-per-minute and inter-fragment pause statistics.

use sc_protocol::{context::SpeakingPatterns, Transcription};

/// `None` when fewer than two fragments are buffered; WPM and pause
/// statistics need at least one inter-fragment gap.
#[must_use]
pub fn analyze(transcriptions: &[Transcription]) -> Option<SpeakingPatterns> {
    if transcriptions.len() < 2 {
        return None;
    }

    let first = transcriptions.first()?;
    let last = transcriptions.last()?;
    let span_secs = (last.timestamp_us - first.timestamp_us) as f64 / 1_000_000.0;
    let total_words: usize = transcriptions.iter().map(|t| t.text.split_whitespace().count()).sum();
    let words_per_minute = if span_secs > 0.0 { total_words as f64 / span_secs * 60.0 } else { 0.0 };

    let mut pauses = Vec::with_capacity(transcriptions.len() - 1);
    for window in transcriptions.windows(2) {
        let prev = &window[0];
        let next = &window[1];
        let prev_end_us = prev.timestamp_us + (prev.duration_secs * 1_000_000.0) as i64;
        let pause_secs = ((next.timestamp_us - prev_end_us) as f64 / 1_000_000.0).max(0.0);
        pauses.push(pause_secs);
    }

    let avg_pause_secs = pauses.iter().sum::<f64>() / pauses.len() as f64;
    let max_pause_secs = pauses.iter().cloned().fold(0.0_f64, f64::max);
    let avg_fragment_duration_secs = transcriptions.iter().map(|t| t.duration_secs).sum::<f64>() / transcriptions.len() as f64;

    Some(SpeakingPatterns { words_per_minute, avg_pause_secs, max_pause_secs, avg_fragment_duration_secs })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(ts_us: i64, text: &str, duration_secs: f64) -> Transcription {
        Transcription { timestamp_us: ts_us, text: text.to_string(), duration_secs, confidence: None }
    }

    #[test]
    fn analyze_returns_none_for_fewer_than_two_fragments() {
        assert!(analyze(&[]).is_none());
        assert!(analyze(&[fragment(0, "hi", 1.0)]).is_none());
    }

    #[test]
    fn analyze_computes_pause_between_fragments() {
        let transcriptions = vec![fragment(0, "hello there", 1.0), fragment(3_000_000, "friends", 1.0)];
        let patterns = analyze(&transcriptions).unwrap();
        // gap = 3s - 1s duration = 2s
        assert!((patterns.avg_pause_secs - 2.0).abs() < 1e-6);
        assert!((patterns.max_pause_secs - 2.0).abs() < 1e-6);
    }

    #[test]
    fn analyze_clamps_overlapping_fragments_to_zero_pause() {
        let transcriptions = vec![fragment(0, "a", 5.0), fragment(1_000_000, "b", 1.0)];
        let patterns = analyze(&transcriptions).unwrap();
        assert_eq!(patterns.avg_pause_secs, 0.0);
    }
}
