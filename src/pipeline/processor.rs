use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::trace;

use super::Cancellation;

/// Runs async work items concurrently behind a counting admission gate
///
/// Every item is submitted up front and waits for a permit; at most `limit`
/// items run their worker at the same time. Results come back in input
/// order. Everything runs in the caller's task, no worker is spawned.
#[derive(Debug)]
pub struct BoundedProcessor {
    gate: Semaphore,
    limit: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Counts one item past the gate until dropped
struct Admitted<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> Admitted<'a> {
    fn enter(in_flight: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for Admitted<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl BoundedProcessor {
    /// A limit of 0 is treated as 1
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            gate: Semaphore::new(limit),
            limit,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Items currently past the gate
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of items ever past the gate at once
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Run `worker` over `items`
    ///
    /// `result[i]` belongs to `items[i]`. It is `None` when `cancel` fired
    /// before the item finished; a cancelled item's future is dropped, so
    /// whatever it owns is released through `Drop`.
    pub async fn process<T, R, F, Fut>(&self, items: Vec<T>, worker: F, cancel: &Cancellation) -> Vec<Option<R>>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let worker = &worker;
        let tasks = items.into_iter().enumerate().map(|(index, item)| {
            let mut cancel = cancel.clone();
            async move {
                let admitted = async {
                    let _permit = self.gate.acquire().await.ok()?;
                    let _slot = Admitted::enter(&self.in_flight, &self.peak);
                    trace!("Item {} admitted ({} in flight)", index, self.in_flight());
                    Some(worker(item).await)
                };

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        trace!("Item {} cancelled", index);
                        None
                    }
                    result = admitted => result,
                }
            }
        });

        join_all(tasks).await
    }
}
