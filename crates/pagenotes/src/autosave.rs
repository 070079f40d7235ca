//! Deferred-write coalescing.
//!
//! A [`Debouncer`] holds at most one pending action. Scheduling a new action
//! replaces the pending one, so an action only runs once the debouncer has
//! been left alone for the whole quiet period. Only the waiting phase can be
//! cancelled: once the timer fires the action runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Runs the most recently scheduled action after a quiet period.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
}

/// A scheduled action. Whichever of the timer and [`Debouncer::cancel`]
/// sets `claimed` first decides whether the action runs.
#[derive(Debug)]
struct Pending {
    handle: JoinHandle<()>,
    claimed: Arc<AtomicBool>,
}

impl Pending {
    fn is_waiting(&self) -> bool {
        !self.claimed.load(Ordering::SeqCst)
    }
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// The quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `action` to run after the quiet period, replacing any action
    /// still waiting.
    ///
    /// `action` runs synchronously on the timer task; anything long-running
    /// should be spawned from it so it outlives a later [`cancel`](Self::cancel).
    pub fn schedule<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.cancel() {
            trace!("Replaced pending action");
        }

        let delay = self.delay;
        let claimed = Arc::new(AtomicBool::new(false));
        let timer_claim = Arc::clone(&claimed);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !timer_claim.swap(true, Ordering::SeqCst) {
                action();
            }
        });
        self.pending = Some(Pending { handle, claimed });
    }

    /// Drop the waiting action, if any. Returns `true` if one was dropped.
    ///
    /// An action whose timer has already fired is never reported as
    /// dropped, even if it is still running on another worker thread.
    pub fn cancel(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if pending.claimed.swap(true, Ordering::SeqCst) {
            return false;
        }
        pending.handle.abort();
        true
    }

    /// Whether an action is still waiting for its quiet period to end.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(Pending::is_waiting)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_runs_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_secs(1));

        let counter = Arc::clone(&fired);
        debouncer.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_action_of_burst_runs() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_secs(1));

        for value in 1..=5 {
            let seen = Arc::clone(&seen);
            debouncer.schedule(move || seen.lock().unwrap().push(value));
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_action_per_quiet_period() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_secs(1));

        for _ in 0..3 {
            let counter = Arc::clone(&fired);
            debouncer.schedule(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(1500)).await;
            settle().await;
        }

        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_action() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_secs(1));

        let counter = Arc::clone(&fired);
        debouncer.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let mut debouncer = Debouncer::new(Duration::from_secs(1));
            let counter = Arc::clone(&fired);
            debouncer.schedule(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_after_fire_reports_nothing_dropped() {
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));

        debouncer.schedule(move || {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv();
        });

        // The action is running on the other worker and has not returned.
        tokio::task::spawn_blocking(move || started_rx.recv().unwrap())
            .await
            .unwrap();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.cancel());

        release_tx.send(()).unwrap();
    }

    #[test]
    fn test_delay() {
        let debouncer = Debouncer::new(Duration::from_millis(250));
        assert_eq!(debouncer.delay(), Duration::from_millis(250));
        assert!(!debouncer.is_pending());
    }
}
