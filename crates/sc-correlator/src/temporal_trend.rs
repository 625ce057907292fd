//! Splits the fragment sequence into three equal segments and reports
//! whether chat-per-fragment "energy" is rising, falling, or holding.

use sc_protocol::context::{SegmentEnergy, TemporalTrend};
use sc_protocol::{ChatMessage, Transcription};

/// Empty trend (`"stable"`, no segments) when fewer than three fragments
/// are buffered — there's no meaningful split into thirds.
#[must_use]
pub fn analyze(transcriptions: &[Transcription], chat: &[ChatMessage], correlation_window_us: i64) -> TemporalTrend {
    if transcriptions.len() < 3 {
        return TemporalTrend { trend: "stable".to_string(), segments: Vec::new() };
    }

    let segments = split_into_three(transcriptions);

    let energies: Vec<SegmentEnergy> = segments
        .iter()
        .map(|segment| {
            let chat_count = count_chat_in_segment(segment, chat, correlation_window_us);
            let fragment_count = segment.len();
            let energy_indicator = if fragment_count > 0 { chat_count as f64 / fragment_count as f64 } else { 0.0 };
            SegmentEnergy { chat_count, fragment_count, energy_indicator }
        })
        .collect();

    let trend = match (energies.first(), energies.last()) {
        (Some(first), Some(last)) if last.energy_indicator > first.energy_indicator * 1.2 => "increasing",
        (Some(first), Some(last)) if last.energy_indicator < first.energy_indicator * 0.8 => "decreasing",
        _ => "stable",
    };

    TemporalTrend { trend: trend.to_string(), segments: energies }
}

/// Splits `transcriptions` into exactly three segments (for `len >= 3`):
/// floor-division size for the first two, with the last segment absorbing
/// the remainder.
fn split_into_three(transcriptions: &[Transcription]) -> Vec<&[Transcription]> {
    let segment_size = transcriptions.len() / 3;
    vec![&transcriptions[0..segment_size], &transcriptions[segment_size..segment_size * 2], &transcriptions[segment_size * 2..]]
}

fn count_chat_in_segment(segment: &[Transcription], chat: &[ChatMessage], correlation_window_us: i64) -> usize {
    let Some(first) = segment.first() else { return 0 };
    let Some(last) = segment.last() else { return 0 };
    let start = first.timestamp_us;
    let end = last.timestamp_us + correlation_window_us;
    chat.iter().filter(|c| { let ts_us = c.timestamp_ms * 1000; ts_us >= start && ts_us <= end }).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(ts_us: i64, text: &str) -> Transcription {
        Transcription { timestamp_us: ts_us, text: text.to_string(), duration_secs: 1.0, confidence: None }
    }

    #[test]
    fn fewer_than_three_fragments_yields_empty_stable_trend() {
        let trend = analyze(&[fragment(0, "a"), fragment(1_000_000, "b")], &[], 10_000_000);
        assert_eq!(trend.trend, "stable");
        assert!(trend.segments.is_empty());
    }

    #[test]
    fn three_segments_are_produced_for_six_fragments() {
        let transcriptions: Vec<Transcription> = (0..6).map(|i| fragment(i * 1_000_000, "word")).collect();
        let trend = analyze(&transcriptions, &[], 10_000_000);
        assert_eq!(trend.segments.len(), 3);
    }

    #[test]
    fn four_fragments_still_split_into_exactly_three_segments() {
        // Floor division with the remainder folded into the last segment:
        // sizes 1, 1, 2 rather than `chunks(ceil(4/3)=2)`'s 2, 2.
        let transcriptions: Vec<Transcription> = (0..4).map(|i| fragment(i * 1_000_000, "word")).collect();
        let trend = analyze(&transcriptions, &[], 10_000_000);
        assert_eq!(trend.segments.len(), 3);
        assert_eq!(trend.segments[0].fragment_count, 1);
        assert_eq!(trend.segments[1].fragment_count, 1);
        assert_eq!(trend.segments[2].fragment_count, 2);
    }
}
