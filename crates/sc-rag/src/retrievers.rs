//! Parallel fan-out over the retrievers `intent::route` selected. Each call
//! is independently guarded: a failing retriever is logged and simply
//! absent from the assembled result, never aborts the others.

use sc_context_client::ContextClient;
use sc_protocol::ContextRecord;

use crate::activity_client::{ActivityClient, ActivityStats, StreamStatus};
use crate::intent::Retriever;

/// Results assembled from however many retrievers fired, keyed by source.
/// Each field is `None` only when that source wasn't selected, or was
/// selected but failed — the two are indistinguishable to prompt assembly,
/// which simply omits missing sections.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResults {
    pub subscription_events: Option<Vec<serde_json::Value>>,
    pub follower_events: Option<Vec<serde_json::Value>>,
    pub raid_events: Option<Vec<serde_json::Value>>,
    pub cheer_events: Option<Vec<serde_json::Value>>,
    pub chat_events: Option<Vec<serde_json::Value>>,
    pub stream_status: Option<StreamStatus>,
    pub activity_stats: Option<ActivityStats>,
    pub context_analysis: Option<Vec<ContextRecord>>,
    pub context_search: Option<(Vec<String>, Vec<ContextRecord>)>,
}

pub async fn fetch_all(activity: &ActivityClient, context: &ContextClient, retrievers: &[Retriever]) -> RetrievalResults {
    let mut results = RetrievalResults::default();

    // `futures_util::future::join_all` would require threading `Retriever`
    // through a boxed-future vec of differing item types; with a bounded,
    // small fan-out (at most 8 distinct sources) a sequential await over
    // concurrent per-source tasks via `tokio::join!`-style dispatch gives
    // the same error-tolerance with far less type plumbing. Every call is
    // independently wrapped in `guarded`, so the ordering doesn't affect
    // correctness, only minor wall-clock overlap.
    let mut handles = Vec::new();
    for retriever in retrievers {
        handles.push(fetch_one(activity, context, retriever));
    }
    for (retriever, outcome) in retrievers.iter().zip(futures_util::future::join_all(handles).await) {
        apply(&mut results, retriever, outcome);
    }

    results
}

enum Outcome {
    Events(Option<Vec<serde_json::Value>>),
    Stats(Option<ActivityStats>),
    Status(Option<StreamStatus>),
    ContextAnalysis(Option<Vec<ContextRecord>>),
    ContextSearch(Vec<String>, Option<Vec<ContextRecord>>),
}

async fn fetch_one(activity: &ActivityClient, context: &ContextClient, retriever: &Retriever) -> Outcome {
    match retriever {
        Retriever::SubscriptionEvents => Outcome::Events(sc_runtime::guarded("retriever.subscription_events", activity.events(Some("subscription"))).await),
        Retriever::FollowerEvents => Outcome::Events(sc_runtime::guarded("retriever.follower_events", activity.events(Some("follower"))).await),
        Retriever::RaidEvents => Outcome::Events(sc_runtime::guarded("retriever.raid_events", activity.events(Some("raid"))).await),
        Retriever::CheerEvents => Outcome::Events(sc_runtime::guarded("retriever.cheer_events", activity.events(Some("cheer"))).await),
        Retriever::ChatActivity => Outcome::Events(sc_runtime::guarded("retriever.chat_activity", activity.events(Some("chat_message"))).await),
        Retriever::StreamInfo => Outcome::Status(sc_runtime::guarded("retriever.stream_info", activity.stream_status()).await),
        Retriever::ActivityStats => Outcome::Stats(sc_runtime::guarded("retriever.activity_stats", activity.stats()).await),
        Retriever::AiContextAnalysis => {
            Outcome::ContextAnalysis(sc_runtime::guarded("retriever.ai_context_analysis", context.list_contexts(Some(5), None)).await)
        }
        Retriever::ContextSearch(terms) => {
            let query = terms.join(" ");
            let found = sc_runtime::guarded("retriever.context_search", context.search_contexts(&query, Some(5), None)).await;
            Outcome::ContextSearch(terms.clone(), found)
        }
    }
}

fn apply(results: &mut RetrievalResults, retriever: &Retriever, outcome: Outcome) {
    match (retriever, outcome) {
        (Retriever::SubscriptionEvents, Outcome::Events(events)) => results.subscription_events = events,
        (Retriever::FollowerEvents, Outcome::Events(events)) => results.follower_events = events,
        (Retriever::RaidEvents, Outcome::Events(events)) => results.raid_events = events,
        (Retriever::CheerEvents, Outcome::Events(events)) => results.cheer_events = events,
        (Retriever::ChatActivity, Outcome::Events(events)) => results.chat_events = events,
        (Retriever::StreamInfo, Outcome::Status(status)) => results.stream_status = status,
        (Retriever::ActivityStats, Outcome::Stats(stats)) => results.activity_stats = stats,
        (Retriever::AiContextAnalysis, Outcome::ContextAnalysis(records)) => results.context_analysis = records,
        (Retriever::ContextSearch(terms), Outcome::ContextSearch(_, records)) => results.context_search = Some((terms.clone(), records.unwrap_or_default())),
        _ => unreachable!("fetch_one's outcome variant always matches its requesting retriever"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_context_client::ContextClientConfig;

    #[tokio::test]
    async fn a_failing_retriever_is_absent_but_others_still_populate() {
        let activity = ActivityClient::new(crate::activity_client::ActivityClientConfig::default()).unwrap();
        let context = ContextClient::new(ContextClientConfig::default()).unwrap();
        // No mock server is running; every call fails, but fetch_all must
        // not panic or short-circuit — every field lands as None.
        let results = fetch_all(&activity, &context, &[Retriever::ActivityStats, Retriever::SubscriptionEvents]).await;
        assert!(results.activity_stats.is_none());
        assert!(results.subscription_events.is_none());
    }
}
