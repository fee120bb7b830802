//! Per-site politeness throttling.
//!
//! A [`PolitenessGate`] serializes invocations against one storefront and
//! keeps a minimum quiet interval between the end of one invocation and the
//! start of the next. The gate is shared across requests, so the interval
//! holds even when two callers search the same site at once.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

#[derive(Debug)]
pub struct PolitenessGate {
    interval: Duration,
    last_finished: Mutex<Option<Instant>>,
}

impl PolitenessGate {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_finished: Mutex::new(None),
        }
    }

    /// Runs `work` once the previous invocation has been finished for at
    /// least the gate's interval. The slot is held for the whole of `work`,
    /// and the finish time is recorded even if `work` is cancelled.
    pub async fn run<F, T>(&self, work: F) -> T
    where
        F: Future<Output = T>,
    {
        let _stamp = self.acquire().await;
        work.await
    }

    /// Like [`PolitenessGate::run`], but gives up and returns `None` when the
    /// slot does not open up within `max_wait`. `work` is never started in
    /// that case.
    pub async fn run_within<F, T>(&self, max_wait: Duration, work: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let _stamp = tokio::time::timeout(max_wait, self.acquire()).await.ok()?;
        Some(work.await)
    }

    async fn acquire(&self) -> FinishStamp<'_> {
        let last_finished = self.last_finished.lock().await;

        if let Some(finished) = *last_finished {
            let elapsed = finished.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                tracing::debug!(
                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    "waiting for politeness interval"
                );
                tokio::time::sleep(wait).await;
            }
        }

        FinishStamp(last_finished)
    }
}

/// Records the end of an invocation when dropped.
struct FinishStamp<'a>(MutexGuard<'a, Option<Instant>>);

impl Drop for FinishStamp<'_> {
    fn drop(&mut self) {
        *self.0 = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn first_invocation_runs_immediately() {
        let gate = PolitenessGate::new(Duration::from_secs(30));
        let started = Instant::now();
        let value = gate.run(async { 7 }).await;
        assert_eq!(value, 7);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn second_invocation_waits_out_the_interval() {
        let interval = Duration::from_millis(150);
        let gate = PolitenessGate::new(interval);

        let first_end = gate.run(async { Instant::now() }).await;
        let second_start = gate.run(async { Instant::now() }).await;

        assert!(
            second_start.duration_since(first_end) >= interval,
            "gap was {:?}",
            second_start.duration_since(first_end)
        );
    }

    #[tokio::test]
    async fn cancelled_invocation_still_starts_the_interval() {
        let interval = Duration::from_millis(150);
        let gate = PolitenessGate::new(interval);

        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            gate.run(tokio::time::sleep(Duration::from_secs(5))),
        )
        .await;
        assert!(cancelled.is_err());
        let cancelled_at = Instant::now();

        let next_start = gate.run(async { Instant::now() }).await;
        assert!(
            next_start.duration_since(cancelled_at) >= interval - Duration::from_millis(5),
            "gap was {:?}",
            next_start.duration_since(cancelled_at)
        );
    }

    #[tokio::test]
    async fn run_within_gives_up_without_starting_work() {
        let gate = PolitenessGate::new(Duration::from_millis(400));
        gate.run(async {}).await;

        let started = Instant::now();
        let mut ran = false;
        let outcome = gate
            .run_within(Duration::from_millis(50), async { ran = true })
            .await;

        assert!(outcome.is_none());
        assert!(!ran);
        assert!(started.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn run_within_runs_when_the_slot_is_free() {
        let gate = PolitenessGate::new(Duration::from_secs(30));
        assert_eq!(gate.run_within(Duration::from_millis(50), async { 3 }).await, Some(3));
    }

    #[tokio::test]
    async fn zero_interval_does_not_wait() {
        let gate = PolitenessGate::new(Duration::ZERO);
        let started = Instant::now();
        gate.run(async {}).await;
        gate.run(async {}).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn concurrent_invocations_are_serialized() {
        let gate = Arc::new(PolitenessGate::new(Duration::from_millis(10)));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let in_flight = Arc::clone(&in_flight);
                let max_seen = Arc::clone(&max_seen);
                tokio::spawn(async move {
                    gate.run(async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
