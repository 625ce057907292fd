//! Builds the rich context record sealed and POSTed when a context window
//! ages past its size.

use std::collections::HashMap;

use sc_protocol::context::{
    CommunityData, CommunityMetrics, ContentData, ContentMetrics, ContextRecord, CorrelationData, RichContextData,
    SpeechChatCorrelation, TemporalData, TranscriptFragment,
};
use sc_protocol::{AnalysisResult, ChatMessage, EmoteEvent, Transcription, ViewerInteraction};

use crate::{context_assembly, metrics, speaking_patterns, temporal_trend};

pub struct SealInputs<'a> {
    pub session: String,
    pub started: chrono::DateTime<chrono::Utc>,
    pub ended: chrono::DateTime<chrono::Utc>,
    pub transcriptions: &'a [Transcription],
    pub chat: &'a [ChatMessage],
    pub emotes: &'a [EmoteEvent],
    pub interactions: &'a [ViewerInteraction],
    pub native_emote_prefix: &'a str,
    pub correlation_window_us: i64,
    pub ai_analysis: Option<AnalysisResult>,
}

fn content_metrics(transcriptions: &[Transcription]) -> ContentMetrics {
    let word_count: usize = transcriptions.iter().map(|t| t.text.split_whitespace().count()).sum();
    let sentence_count: usize = transcriptions
        .iter()
        .map(|t| t.text.matches(['.', '!', '?']).count().max(usize::from(!t.text.trim().is_empty())))
        .sum();
    let avg_words_per_fragment = if transcriptions.is_empty() { 0.0 } else { word_count as f64 / transcriptions.len() as f64 };
    ContentMetrics { word_count, sentence_count, avg_words_per_fragment }
}

fn speech_chat_correlations(transcriptions: &[Transcription], chat: &[ChatMessage], correlation_window_us: i64) -> Vec<SpeechChatCorrelation> {
    context_assembly::correlate(transcriptions, chat, correlation_window_us)
        .into_iter()
        .filter(|group| !group.matched.is_empty())
        .map(|group| {
            let t = &transcriptions[group.fragment_index];
            let avg_delay_us: f64 =
                group.matched.iter().map(|c| (c.timestamp_ms * 1000 - t.timestamp_us) as f64).sum::<f64>() / group.matched.len() as f64;
            SpeechChatCorrelation {
                fragment_index: group.fragment_index,
                correlated_count: group.matched.len(),
                avg_chat_delay_secs: avg_delay_us / 1_000_000.0,
            }
        })
        .collect()
}

/// Build the nested analytical record embedded in a sealed context window.
#[must_use]
pub fn build_rich_context(inputs: &SealInputs<'_>) -> RichContextData {
    let duration_secs = (inputs.ended - inputs.started).num_milliseconds() as f64 / 1000.0;

    let temporal = TemporalData {
        window_start_us: inputs.started.timestamp_micros(),
        window_end_us: inputs.ended.timestamp_micros(),
        duration_secs,
    };

    let fragments: Vec<TranscriptFragment> = inputs
        .transcriptions
        .iter()
        .map(|t| TranscriptFragment { timestamp_us: t.timestamp_us, text: t.text.clone(), duration_secs: t.duration_secs })
        .collect();
    let confidence_scores: Vec<Option<f64>> = inputs.transcriptions.iter().map(|t| t.confidence).collect();
    let content = ContentData {
        transcript: context_assembly::transcription_context(inputs.transcriptions),
        fragments,
        confidence_scores,
        speaking_patterns: speaking_patterns::analyze(inputs.transcriptions),
        content_metrics: content_metrics(inputs.transcriptions),
    };

    let chat_velocity = metrics::chat_velocity(inputs.chat);
    let top_emotes = metrics::emote_frequency(inputs.chat, inputs.emotes);
    let interaction_kinds: Vec<_> = inputs.interactions.iter().map(|i| i.kind).collect();
    let interaction_counts = metrics::interaction_counts(&interaction_kinds);
    let engagement_density = metrics::engagement_density(inputs.interactions.len(), duration_secs);
    let community = CommunityData {
        chat_messages: inputs.chat.to_vec(),
        emote_usage: inputs.emotes.to_vec(),
        viewer_interactions: inputs.interactions.to_vec(),
        community_metrics: CommunityMetrics { chat_velocity, top_emotes, engagement_density, interaction_counts },
    };

    let correlation = CorrelationData {
        speech_chat_correlation: speech_chat_correlations(inputs.transcriptions, inputs.chat, inputs.correlation_window_us),
        temporal_trend: temporal_trend::analyze(inputs.transcriptions, inputs.chat, inputs.correlation_window_us),
    };

    RichContextData {
        temporal,
        content,
        community,
        correlation,
        ai_analysis: inputs.ai_analysis.clone(),
        model_metadata: serde_json::Value::Null,
    }
}

fn top3_summary(counts: &HashMap<String, u32>) -> String {
    let mut pairs: Vec<(&String, &u32)> = counts.iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    pairs.into_iter().take(3).map(|(name, count)| format!("{name}x{count}")).collect::<Vec<_>>().join(", ")
}

/// Build the legacy flat record POSTed to the Context Client, with the rich
/// detail embedded in `rich_context`.
#[must_use]
pub fn build_context_record(inputs: &SealInputs<'_>, rich: RichContextData) -> ContextRecord {
    let emotes_summary = top3_summary(&rich.community.community_metrics.top_emotes);
    let interactions_summary = context_assembly::interaction_context(inputs.interactions);

    let (patterns, sentiment, topics) = match &rich.ai_analysis {
        Some(analysis) => (Some(analysis.patterns.clone()), Some(analysis.sentiment), Some(analysis.topics.clone())),
        None => (None, None, None),
    };

    ContextRecord {
        started: inputs.started,
        ended: inputs.ended,
        session: inputs.session.clone(),
        transcript: rich.content.transcript.clone(),
        duration_secs: rich.temporal.duration_secs,
        chat_summary: Some(context_assembly::correlated_chat_context(inputs.transcriptions, inputs.chat, inputs.correlation_window_us)),
        interactions_summary: if interactions_summary.is_empty() { None } else { Some(interactions_summary) },
        emotes_summary: if emotes_summary.is_empty() { None } else { Some(emotes_summary) },
        patterns,
        sentiment,
        topics,
        rich_context: Some(rich),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn window_sealing_matches_scenario_2() {
        let started = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let ended = started + chrono::Duration::seconds(121);
        let transcriptions = vec![
            Transcription { timestamp_us: started.timestamp_micros(), text: "hello".to_string(), duration_secs: 1.0, confidence: None },
            Transcription { timestamp_us: ended.timestamp_micros(), text: "world".to_string(), duration_secs: 1.0, confidence: None },
        ];
        let inputs = SealInputs {
            session: "stream_2026_01_01".to_string(),
            started,
            ended,
            transcriptions: &transcriptions,
            chat: &[],
            emotes: &[],
            interactions: &[],
            native_emote_prefix: "",
            correlation_window_us: 10_000_000,
            ai_analysis: None,
        };
        let rich = build_rich_context(&inputs);
        let record = build_context_record(&inputs, rich);
        assert!((record.duration_secs - 121.0).abs() < 1e-6);
        assert_eq!(record.session, "stream_2026_01_01");
        assert_eq!(record.transcript, "hello world");
    }
}
