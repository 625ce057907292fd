//! Error-boundary wrapping for observer/handler/retriever invocations: one
//! failing callback must never abort the notification loop or a fan-out.

use std::future::Future;

use tracing::warn;

/// Await `fut`, logging and swallowing any error under `name` rather than
/// propagating it. Returns `None` on failure, `Some(value)` on success.
///
/// This does not catch panics — a panicking observer is a bug, not a
/// recoverable fault, and is allowed to propagate per normal Rust panic
/// semantics (the caller should run observers inside their own spawned task
/// if panic isolation is also required).
pub async fn guarded<T, E, F>(name: &str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(observer = name, error = %err, "observer/handler failed; continuing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guarded_returns_some_on_success() {
        let result = guarded::<_, String, _>("ok", async { Ok(42) }).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn guarded_swallows_errors_and_returns_none() {
        let result: Option<i32> = guarded("bad", async { Err("boom".to_string()) }).await;
        assert_eq!(result, None);
    }
}
