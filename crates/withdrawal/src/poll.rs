//! Cancellable fixed-interval polling.
//!
//! Shared by the confirmation wait and the anchor-coverage wait.

use std::{future::Future, time::Duration};
use tokio::time::{timeout_at, Instant};
use tokio_retry::{strategy::FixedInterval, RetryIf};
use tokio_util::sync::CancellationToken;

/// Why a poll ended without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollError<E> {
    TimedOut,
    Cancelled,
    /// The probe failed; failures are not retried.
    Failed(E),
}

enum Attempt<E> {
    Pending,
    Failed(E),
}

/// Run `probe` now and then every `interval` until it yields a value.
///
/// `Ok(None)` from the probe means "not yet" and keeps polling; an error ends
/// the poll immediately. The poll gives up at `deadline` and stops as soon as
/// `cancel` fires.
pub async fn poll_until<T, E, F, Fut>(
    interval: Duration,
    deadline: Instant,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let attempts = RetryIf::spawn(
        FixedInterval::new(interval),
        || {
            let attempt = probe();
            async move {
                match attempt.await {
                    Ok(Some(value)) => Ok(value),
                    Ok(None) => Err(Attempt::Pending),
                    Err(err) => Err(Attempt::Failed(err)),
                }
            }
        },
        |attempt: &Attempt<E>| matches!(attempt, Attempt::Pending),
    );

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(PollError::Cancelled),
        result = timeout_at(deadline, attempts) => match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(Attempt::Failed(err))) => Err(PollError::Failed(err)),
            // FixedInterval never runs out, so only the deadline stops a pending poll
            Ok(Err(Attempt::Pending)) | Err(_) => Err(PollError::TimedOut),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    const INTERVAL: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_value_once_available() {
        let start = Instant::now();
        let available_at = start + Duration::from_secs(12);

        let value = poll_until(
            INTERVAL,
            start + Duration::from_secs(300),
            &CancellationToken::new(),
            || async move { Ok::<_, ()>((Instant::now() >= available_at).then_some(42)) },
        )
        .await
        .unwrap();

        assert_eq!(value, 42);
        // Probes at 0s, 5s, 10s, 15s
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out_at_deadline() {
        let start = Instant::now();
        let deadline = start + Duration::from_secs(300);
        let probes = Arc::new(AtomicUsize::new(0));

        let result = poll_until(INTERVAL, deadline, &CancellationToken::new(), || {
            let probes = probes.clone();
            async move {
                probes.fetch_add(1, Ordering::SeqCst);
                Ok::<Option<()>, ()>(None)
            }
        })
        .await;

        assert_eq!(result, Err(PollError::TimedOut));
        assert!(Instant::now() >= deadline);
        assert!(probes.load(Ordering::SeqCst) >= 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_stops_on_first_error() {
        let probes = Arc::new(AtomicUsize::new(0));

        let result = poll_until(
            INTERVAL,
            Instant::now() + Duration::from_secs(300),
            &CancellationToken::new(),
            || {
                let probes = probes.clone();
                async move {
                    let n = probes.fetch_add(1, Ordering::SeqCst);
                    if n == 2 {
                        Err("node unavailable")
                    } else {
                        Ok::<Option<()>, _>(None)
                    }
                }
            },
        )
        .await;

        assert_eq!(result, Err(PollError::Failed("node unavailable")));
        assert_eq!(probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_observes_cancellation() {
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            trigger.cancel();
        });

        let result = poll_until(
            INTERVAL,
            start + Duration::from_secs(300),
            &cancel,
            || async { Ok::<Option<()>, ()>(None) },
        )
        .await;

        assert_eq!(result, Err(PollError::Cancelled));
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }
}
