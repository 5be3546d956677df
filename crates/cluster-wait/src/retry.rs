//! Fixed-interval bounded retries.
//!
//! Some assertion sources have no push-based notification channel — log
//! contents and exec availability can only be pulled. For those, a counted
//! retry loop replaces the watch subscription: run the check, sleep a fixed
//! interval on failure, and propagate the last failure once the budget is
//! spent. There is deliberately no backoff policy.

use std::fmt::Display;
use std::time::Duration;

use tracing::debug;

use crate::cluster_trait::{LogSource, RemoteExec};
use crate::error::WaitError;

/// Interval slept between attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Run `op` until it succeeds, sleeping `interval` between attempts.
///
/// `retries` is the number of re-runs after the first attempt, so the
/// operation runs at most `retries + 1` times. The error of the final
/// attempt is returned as-is; earlier failures are only logged.
pub async fn retry<T, E, F, Fut>(retries: u32, interval: Duration, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retries => {
                attempt += 1;
                debug!(attempt, error = %err, "check failed, retrying");
                tokio::time::sleep(interval).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Wait until the pod's logs contain `needle`.
///
/// Fetches the logs once per attempt. The terminal failure is
/// [`WaitError::LogExpectation`] when the logs were readable but never
/// matched, or the last fetch error otherwise.
pub async fn await_in_logs<L>(
    logs: &L,
    pod: &str,
    namespace: &str,
    needle: &str,
    retries: u32,
) -> Result<(), WaitError>
where
    L: LogSource + ?Sized,
{
    retry(retries, RETRY_INTERVAL, || async move {
        let text = logs.logs(pod, namespace).await?;
        if text.contains(needle) {
            Ok(())
        } else {
            Err(WaitError::LogExpectation {
                pod: pod.to_string(),
                expected: needle.to_string(),
            })
        }
    })
    .await
}

/// Wait until commands can be executed inside the pod.
///
/// Runs a trivial command per attempt; the exec channel is usable a little
/// later than the pod reports `Running`, so scenarios call this before the
/// first real command.
pub async fn await_exec_ready<E>(
    exec: &E,
    pod: &str,
    namespace: &str,
    retries: u32,
) -> Result<(), WaitError>
where
    E: RemoteExec + ?Sized,
{
    retry(retries, RETRY_INTERVAL, || async move {
        exec.run(pod, namespace, "true").await.map(|_| ())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockExec, MockLogs};
    use std::cell::Cell;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_attempt_n_with_n_minus_one_sleeps() {
        let attempts = Cell::new(0u32);
        let start = Instant::now();

        let result: Result<u32, &str> = retry(10, RETRY_INTERVAL, || {
            attempts.set(attempts.get() + 1);
            let n = attempts.get();
            async move { if n < 3 { Err("not yet") } else { Ok(n) } }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.get(), 3);
        assert!(start.elapsed() >= RETRY_INTERVAL * 2);
        assert!(start.elapsed() < RETRY_INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_runs_retries_plus_one_attempts() {
        let attempts = Cell::new(0u32);

        let result: Result<(), &str> = retry(4, RETRY_INTERVAL, || {
            attempts.set(attempts.get() + 1);
            async { Err("still broken") }
        })
        .await;

        assert_eq!(result.unwrap_err(), "still broken");
        assert_eq!(attempts.get(), 5);
    }

    #[tokio::test]
    async fn zero_retries_means_a_single_attempt() {
        let attempts = Cell::new(0u32);

        let result: Result<(), &str> = retry(0, RETRY_INTERVAL, || {
            attempts.set(attempts.get() + 1);
            async { Err("no") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn log_wait_resolves_once_the_needle_appears() {
        let logs = MockLogs::new();
        logs.push_text("starting up");
        logs.push_text("starting up");
        logs.push_text("starting up\nServing requests");

        await_in_logs(&logs, "plugin-pod", "e2e", "Serving requests", 5)
            .await
            .unwrap();
        assert_eq!(logs.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn log_wait_surfaces_the_expectation_failure() {
        let logs = MockLogs::new();
        logs.push_text("nothing interesting");

        let result = await_in_logs(&logs, "plugin-pod", "e2e", "Serving requests", 2).await;

        assert!(matches!(
            result,
            Err(WaitError::LogExpectation { ref pod, .. }) if pod == "plugin-pod"
        ));
        assert_eq!(logs.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exec_wait_retries_until_the_channel_works() {
        let exec = MockExec::new();
        exec.push_err("container not ready");
        exec.push_err("container not ready");

        let start = Instant::now();
        await_exec_ready(&exec, "consumer", "e2e", 5).await.unwrap();

        assert_eq!(exec.calls(), 3);
        assert!(start.elapsed() >= RETRY_INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exec_wait_propagates_the_last_failure() {
        let exec = MockExec::new();
        for _ in 0..10 {
            exec.push_err("no route to pod");
        }

        let result = await_exec_ready(&exec, "consumer", "e2e", 2).await;

        assert!(matches!(
            result,
            Err(WaitError::RemoteCommandFailed(ref msg)) if msg == "no route to pod"
        ));
        assert_eq!(exec.calls(), 3);
    }
}
