//! Single-flight refresh coordination
//!
//! The first caller publishes a shared future; callers arriving while it is
//! unresolved await the same future instead of starting another refresh.
//! The slot is cleared once the future resolves; a resolved flight still
//! sitting in the slot is never joined.

use super::refresh::RefreshOutcome;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

struct InFlight {
    generation: u64,
    future: SharedRefresh,
}

impl InFlight {
    fn is_resolved(&self) -> bool {
        self.future.peek().is_some()
    }
}

/// Holder of the one in-flight refresh
#[derive(Default)]
pub struct RefreshCoordinator {
    slot: Mutex<Option<InFlight>>,
    next_generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.slot
            .lock()
            .as_ref()
            .is_some_and(|in_flight| !in_flight.is_resolved())
    }

    /// Join the in-flight refresh, or start one with `start`
    ///
    /// `start` is only called when no refresh is in flight. The returned
    /// outcome is the same value for every caller of one flight.
    pub async fn run<F>(&self, start: F) -> RefreshOutcome
    where
        F: FnOnce() -> BoxFuture<'static, RefreshOutcome>,
    {
        let (generation, future) = {
            let mut slot = self.slot.lock();
            match slot.as_ref().filter(|in_flight| !in_flight.is_resolved()) {
                Some(in_flight) => {
                    debug!(generation = in_flight.generation, "Joining in-flight refresh");
                    (in_flight.generation, in_flight.future.clone())
                }
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(generation, "Starting refresh");
                    let future = start().shared();
                    *slot = Some(InFlight {
                        generation,
                        future: future.clone(),
                    });
                    (generation, future)
                }
            }
        };

        let outcome = future.await;

        let mut slot = self.slot.lock();
        if slot
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation)
        {
            *slot = None;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::refresh::RefreshFailure;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn counting_refresh(
        calls: Arc<AtomicUsize>,
        gate: Arc<Notify>,
        outcome: RefreshOutcome,
    ) -> BoxFuture<'static, RefreshOutcome> {
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            gate.notified().await;
            outcome
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let mut handles = Vec::new();
        for _ in 0..5 {
            let coordinator = coordinator.clone();
            let calls = calls.clone();
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .run(|| counting_refresh(calls, gate, RefreshOutcome::Refreshed("B".into())))
                    .await
            }));
        }

        // let every task reach the shared future before releasing it
        while !coordinator.is_refreshing() {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        gate.notify_one();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), RefreshOutcome::Refreshed("B".into()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_new_flight_after_resolution() {
        let coordinator = RefreshCoordinator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            let outcome = coordinator
                .run(move || {
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        RefreshOutcome::Failed(RefreshFailure::Status(500))
                    }
                    .boxed()
                })
                .await;
            assert_eq!(outcome, RefreshOutcome::Failed(RefreshFailure::Status(500)));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolved_flight_is_not_joined() {
        let coordinator = RefreshCoordinator::new();

        // a flight that resolved before its waiters cleared the slot
        let finished = async { RefreshOutcome::Failed(RefreshFailure::Status(500)) }
            .boxed()
            .shared();
        finished.clone().await;
        *coordinator.slot.lock() = Some(InFlight {
            generation: u64::MAX,
            future: finished,
        });
        assert!(!coordinator.is_refreshing());

        let outcome = coordinator
            .run(|| async { RefreshOutcome::Refreshed("B".into()) }.boxed())
            .await;

        assert_eq!(outcome, RefreshOutcome::Refreshed("B".into()));
        assert!(coordinator.slot.lock().is_none());
    }

    #[tokio::test]
    async fn test_dropped_initiator_does_not_strand_joiners() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let initiator = {
            let coordinator = coordinator.clone();
            let gate = gate.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                coordinator
                    .run(|| counting_refresh(calls, gate, RefreshOutcome::Refreshed("C".into())))
                    .await
            })
        };
        while !coordinator.is_refreshing() {
            tokio::task::yield_now().await;
        }

        let joiner = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .run(|| async { RefreshOutcome::Failed(RefreshFailure::Status(500)) }.boxed())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        initiator.abort();
        gate.notify_one();

        assert_eq!(joiner.await.unwrap(), RefreshOutcome::Refreshed("C".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
