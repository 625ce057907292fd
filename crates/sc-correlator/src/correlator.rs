//! The stream correlator: bounded intake buffers, periodic `AnalysisResult`
//! production, and context-window sealing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sc_context_client::ContextClient;
use sc_llm_client::LlmClient;
use sc_protocol::{AnalysisResult, ChatMessage, EmoteEvent, Transcription, ViewerInteraction};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::buffer::{BoundedBuffer, BufferStats};
use crate::config::CorrelatorConfig;
use crate::context_assembly;
use crate::context_window::{self, SealInputs};
use crate::error::CorrelatorError;
use crate::metrics;
use crate::session;

/// A point-in-time snapshot of all four buffers' fill state, surfaced on
/// `/status`.
#[derive(Debug, Clone, Default)]
pub struct CorrelatorStatus {
    pub transcriptions: BufferStats,
    pub chat: BufferStats,
    pub emotes: BufferStats,
    pub interactions: BufferStats,
    pub current_session: Option<String>,
    pub context_window_age_secs: Option<f64>,
}

struct Buffers {
    transcriptions: BoundedBuffer<Transcription>,
    chat: BoundedBuffer<ChatMessage>,
    emotes: BoundedBuffer<EmoteEvent>,
    interactions: BoundedBuffer<ViewerInteraction>,
}

struct ContextWindowState {
    context_start: Option<chrono::DateTime<Utc>>,
    session: Option<String>,
}

/// Accepts ingest events from three sources, maintains bounded recent
/// history, and drives both periodic analysis and context-window sealing.
///
/// Constructed once per service and shared behind an `Arc` between the
/// ingest clients (which call the `add_*` methods) and the periodic-analysis
/// background task.
pub struct Correlator {
    cfg: CorrelatorConfig,
    llm: Arc<LlmClient>,
    context_client: Arc<ContextClient>,
    buffers: Mutex<Buffers>,
    window: Mutex<ContextWindowState>,
    analysis_in_flight: AtomicBool,
    last_analysis: Mutex<Option<chrono::DateTime<Utc>>>,
}

impl Correlator {
    #[must_use]
    pub fn new(cfg: CorrelatorConfig, llm: Arc<LlmClient>, context_client: Arc<ContextClient>) -> Self {
        Correlator {
            buffers: Mutex::new(Buffers {
                transcriptions: BoundedBuffer::new(cfg.max_buffer_size),
                chat: BoundedBuffer::new(cfg.max_buffer_size),
                emotes: BoundedBuffer::new(cfg.max_buffer_size),
                interactions: BoundedBuffer::new(cfg.max_buffer_size),
            }),
            window: Mutex::new(ContextWindowState { context_start: None, session: None }),
            analysis_in_flight: AtomicBool::new(false),
            last_analysis: Mutex::new(None),
            cfg,
            llm,
            context_client,
        }
    }

    fn retention_cutoff_us(&self) -> i64 {
        Utc::now().timestamp_micros() - self.cfg.retention_window.as_micros() as i64
    }

    async fn cleanup(&self, buffers: &mut Buffers) {
        let cutoff_us = self.retention_cutoff_us();
        buffers.transcriptions.evict_older_than(cutoff_us, |t| t.timestamp_us);
        buffers.chat.evict_older_than(cutoff_us, |c| c.timestamp_ms * 1000);
        buffers.emotes.evict_older_than(cutoff_us, |e| e.timestamp_ms * 1000);
        buffers.interactions.evict_older_than(cutoff_us, |i| i.timestamp_ms * 1000);
    }

    /// Append a transcription; initialize the context window on the first
    /// arrival since a reset; seal the window if it has aged past its size.
    pub async fn add_transcription(&self, event: Transcription) {
        let event_time = micros_to_datetime(event.timestamp_us);

        let mut buffers = self.buffers.lock().await;
        buffers.transcriptions.push(event);
        self.cleanup(&mut buffers).await;
        drop(buffers);

        // The window clock runs off the transcription stream's own
        // timestamps, not wall-clock arrival time: a burst of late or
        // replayed events should age the window by stream time, and tests
        // can drive sealing deterministically without a paused runtime
        // clock.
        let should_seal = {
            let mut window = self.window.lock().await;
            if window.context_start.is_none() {
                window.context_start = Some(event_time);
                window.session = Some(session::session_id_for(event_time, &self.cfg.timezone));
            }
            let start = window.context_start.unwrap();
            (event_time - start).num_milliseconds() as f64 / 1000.0 >= self.cfg.context_window.as_secs_f64()
        };

        if should_seal {
            self.seal_context_window().await;
        }
    }

    pub async fn add_chat(&self, event: ChatMessage) {
        let mut buffers = self.buffers.lock().await;
        buffers.chat.push(event);
        self.cleanup(&mut buffers).await;
    }

    pub async fn add_emote(&self, event: EmoteEvent) {
        let mut buffers = self.buffers.lock().await;
        buffers.emotes.push(event);
        self.cleanup(&mut buffers).await;
    }

    pub async fn add_interaction(&self, event: ViewerInteraction) {
        let mut buffers = self.buffers.lock().await;
        buffers.interactions.push(event);
        self.cleanup(&mut buffers).await;
    }

    /// Run one periodic-analysis cycle, sleeping `analysis_interval` between
    /// each call. Intended to be spawned as a tracked background task.
    pub async fn run_periodic_analysis(self: Arc<Self>) {
        loop {
            tokio::time::sleep(self.cfg.analysis_interval).await;
            let _ = self.analyze(false).await;
        }
    }

    /// Produce one `AnalysisResult` from the buffered context, or `None` if
    /// the reentry guard, cooldown, or an empty transcription buffer
    /// short-circuits the call. The specific reason is logged but
    /// never propagated — a skipped analysis cycle is not a caller-visible
    /// failure.
    pub async fn analyze(&self, immediate: bool) -> Option<AnalysisResult> {
        sc_runtime::guarded("correlator.analyze", self.try_analyze(immediate)).await
    }

    async fn try_analyze(&self, immediate: bool) -> Result<AnalysisResult, CorrelatorError> {
        if self.analysis_in_flight.swap(true, Ordering::AcqRel) {
            return Err(CorrelatorError::AnalysisInFlight);
        }
        let _guard = InFlightGuard { flag: &self.analysis_in_flight };

        if !immediate {
            let last = *self.last_analysis.lock().await;
            if let Some(last) = last {
                if (Utc::now() - last).num_milliseconds() < self.cfg.analysis_cooldown.as_millis() as i64 {
                    return Err(CorrelatorError::Cooldown);
                }
            }
        }

        // Stamped on entry, not on success: a skipped or failed cycle still
        // counts against the cooldown so a flaky LLM endpoint can't turn
        // into a tight retry loop.
        *self.last_analysis.lock().await = Some(Utc::now());

        let buffers = self.buffers.lock().await;
        let transcriptions: Vec<Transcription> = buffers.transcriptions.iter().cloned().collect();
        let chat: Vec<ChatMessage> = buffers.chat.iter().cloned().collect();
        let emotes: Vec<EmoteEvent> = buffers.emotes.iter().cloned().collect();
        let interactions: Vec<ViewerInteraction> = buffers.interactions.iter().cloned().collect();
        drop(buffers);

        if transcriptions.is_empty() {
            return Err(CorrelatorError::EmptyTranscriptionBuffer);
        }

        let transcription_context = context_assembly::transcription_context(&transcriptions);
        let correlation_window_us = self.cfg.correlation_window.as_micros() as i64;
        let chat_context = context_assembly::correlated_chat_context(&transcriptions, &chat, correlation_window_us);
        let interaction_context = context_assembly::interaction_context(&interactions);
        let combined = context_assembly::combined_context(&chat_context, &interaction_context);

        // A malformed or unreachable LLM response is itself swallowed one
        // layer down (`LlmClient::analyze` already returns `Option`); from
        // here it surfaces as an empty transcription-equivalent skip.
        let Some(payload) = self.llm.analyze(&transcription_context, &combined).await else {
            return Err(CorrelatorError::LlmAnalysisUnavailable);
        };

        Ok(AnalysisResult {
            timestamp_us: Utc::now().timestamp_micros(),
            patterns: payload.patterns,
            dynamics: payload.dynamics,
            sentiment: payload.sentiment,
            sentiment_trajectory: payload.sentiment_trajectory,
            topics: payload.topics,
            context: payload.context,
            suggested_actions: payload.suggested_actions,
            stream_momentum: payload.stream_momentum,
            transcription_context,
            chat_context: combined,
            chat_velocity: metrics::chat_velocity(&chat),
            emote_frequency: metrics::emote_frequency(&chat, &emotes),
            native_emote_frequency: metrics::native_emote_frequency(&chat, &emotes, &self.cfg.native_emote_prefix),
        })
    }

    /// Seal the current context window: build and POST a rich context
    /// record, then reset window state.
    async fn seal_context_window(&self) {
        let (started, session) = {
            let window = self.window.lock().await;
            let Some(started) = window.context_start else { return };
            let session = window.session.clone().unwrap_or_else(|| session::session_id_for(started, &self.cfg.timezone));
            (started, session)
        };

        let buffers = self.buffers.lock().await;
        let transcriptions: Vec<Transcription> = buffers.transcriptions.iter().cloned().collect();
        let chat: Vec<ChatMessage> = buffers.chat.iter().cloned().collect();
        let emotes: Vec<EmoteEvent> = buffers.emotes.iter().cloned().collect();
        let interactions: Vec<ViewerInteraction> = buffers.interactions.iter().cloned().collect();
        drop(buffers);

        if transcriptions.is_empty() {
            warn!("context window aged past size with an empty transcript; not sealing");
            return;
        }

        let ended = transcriptions.last().map_or_else(Utc::now, |t| micros_to_datetime(t.timestamp_us));

        let ai_analysis = self.analyze(true).await;

        let inputs = SealInputs {
            session: session.clone(),
            started,
            ended,
            transcriptions: &transcriptions,
            chat: &chat,
            emotes: &emotes,
            interactions: &interactions,
            native_emote_prefix: &self.cfg.native_emote_prefix,
            correlation_window_us: self.cfg.correlation_window.as_micros() as i64,
            ai_analysis,
        };

        let rich = context_window::build_rich_context(&inputs);
        let record = context_window::build_context_record(&inputs, rich);

        info!(session = %session, duration_secs = record.duration_secs, "sealing context window");
        self.context_client.post_context_best_effort(&record).await;

        self.reset_context_window(started, &session).await;
    }

    /// Clear `context_start`; keep the session id if its date suffix still
    /// matches today, else regenerate. Idempotent when no transcription has
    /// arrived since the last reset (calling it twice in a row with the
    /// same `previous_start` leaves state unchanged on the second call).
    async fn reset_context_window(&self, previous_start: chrono::DateTime<Utc>, previous_session: &str) {
        let mut window = self.window.lock().await;
        if window.context_start != Some(previous_start) {
            // Already reset (or re-initialized) by a concurrent caller.
            return;
        }
        window.context_start = None;
        let now = Utc::now();
        window.session = Some(if session::session_id_still_current(previous_session, now, &self.cfg.timezone) {
            previous_session.to_string()
        } else {
            session::session_id_for(now, &self.cfg.timezone)
        });
    }

    #[must_use]
    pub async fn status(&self) -> CorrelatorStatus {
        let buffers = self.buffers.lock().await;
        let window = self.window.lock().await;
        CorrelatorStatus {
            transcriptions: buffers.transcriptions.stats(),
            chat: buffers.chat.stats(),
            emotes: buffers.emotes.stats(),
            interactions: buffers.interactions.stats(),
            current_session: window.session.clone(),
            context_window_age_secs: window.context_start.map(|start| (Utc::now() - start).num_milliseconds() as f64 / 1000.0),
        }
    }
}

fn micros_to_datetime(micros: i64) -> chrono::DateTime<Utc> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1000) as u32;
    Utc.timestamp_opt(secs, nanos).single().unwrap_or_else(Utc::now)
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_context_client::ContextClientConfig;
    use sc_llm_client::LlmClientConfig;

    fn new_correlator(cfg: CorrelatorConfig) -> Correlator {
        let llm = Arc::new(LlmClient::new(LlmClientConfig::default()).unwrap());
        let context_client = Arc::new(ContextClient::new(ContextClientConfig::default()).unwrap());
        Correlator::new(cfg, llm, context_client)
    }

    #[tokio::test]
    async fn analyze_short_circuits_on_empty_transcription_buffer() {
        let correlator = new_correlator(CorrelatorConfig::default());
        assert!(correlator.analyze(true).await.is_none());
        assert!(matches!(correlator.try_analyze(true).await, Err(CorrelatorError::EmptyTranscriptionBuffer)));
    }

    #[tokio::test]
    async fn try_analyze_rejects_reentry_while_in_flight() {
        let correlator = new_correlator(CorrelatorConfig::default());
        correlator.analysis_in_flight.store(true, Ordering::SeqCst);
        assert!(matches!(correlator.try_analyze(true).await, Err(CorrelatorError::AnalysisInFlight)));
    }

    #[tokio::test]
    async fn try_analyze_respects_cooldown_unless_immediate() {
        let correlator = new_correlator(CorrelatorConfig::default());
        *correlator.last_analysis.lock().await = Some(Utc::now());
        assert!(matches!(correlator.try_analyze(false).await, Err(CorrelatorError::Cooldown)));
    }

    #[tokio::test]
    async fn last_analysis_is_stamped_on_entry_even_when_the_buffer_is_empty() {
        let correlator = new_correlator(CorrelatorConfig::default());
        assert!(correlator.last_analysis.lock().await.is_none());
        assert!(matches!(correlator.try_analyze(true).await, Err(CorrelatorError::EmptyTranscriptionBuffer)));
        assert!(correlator.last_analysis.lock().await.is_some());
    }

    #[tokio::test]
    async fn reset_context_window_is_idempotent_without_new_transcriptions() {
        let correlator = new_correlator(CorrelatorConfig::default());
        let now = Utc::now();
        {
            let mut window = correlator.window.lock().await;
            window.context_start = Some(now);
            window.session = Some("stream_2026_01_01".to_string());
        }
        correlator.reset_context_window(now, "stream_2026_01_01").await;
        let after_first = correlator.window.lock().await.context_start;
        correlator.reset_context_window(now, "stream_2026_01_01").await;
        let after_second = correlator.window.lock().await.context_start;
        assert_eq!(after_first, after_second);
        assert!(after_first.is_none());
    }

    #[tokio::test]
    async fn add_transcription_initializes_context_window_on_first_arrival() {
        let correlator = new_correlator(CorrelatorConfig::default());
        assert!(correlator.window.lock().await.context_start.is_none());
        correlator
            .add_transcription(Transcription { timestamp_us: Utc::now().timestamp_micros(), text: "hi".to_string(), duration_secs: 1.0, confidence: None })
            .await;
        assert!(correlator.window.lock().await.context_start.is_some());
    }

    #[tokio::test]
    async fn window_seals_and_resets_after_121_seconds_of_stream_time() {
        let correlator = new_correlator(CorrelatorConfig::default());
        let t0 = Utc::now().timestamp_micros();
        correlator
            .add_transcription(Transcription { timestamp_us: t0, text: "hello".to_string(), duration_secs: 1.0, confidence: None })
            .await;
        assert!(correlator.window.lock().await.context_start.is_some());

        correlator
            .add_transcription(Transcription { timestamp_us: t0 + 121_000_000, text: "world".to_string(), duration_secs: 1.0, confidence: None })
            .await;

        // Sealing resets context_start; a later transcription starts a fresh window.
        assert!(correlator.window.lock().await.context_start.is_none());
    }
}
