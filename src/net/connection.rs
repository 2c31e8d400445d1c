//! Accepted connections and in-flight tracking.
//!
//! # Responsibilities
//! - Carry a raw accepted connection to the actor
//! - Count serving tasks so shutdown can wait for them

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::net::listener::ConnectionPermit;
use crate::observability::metrics;

/// A connection that has been accepted but not yet handshaken.
#[derive(Debug)]
pub struct PendingConnection {
    pub stream: TcpStream,
    pub remote_addr: SocketAddr,
    pub permit: ConnectionPermit,
}

/// Counts in-flight serving tasks.
///
/// Clones share the same counter. The count lives in a watch channel so
/// waiters wake on every change instead of polling.
#[derive(Debug, Clone)]
pub struct InFlightTracker {
    count: Arc<watch::Sender<usize>>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            count: Arc::new(tx),
        }
    }

    /// Record a new in-flight task. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        self.count.send_modify(|count| *count += 1);
        metrics::record_in_flight(self.active_count());
        InFlightGuard {
            count: Arc::clone(&self.count),
        }
    }

    pub fn active_count(&self) -> usize {
        *self.count.borrow()
    }

    /// Wait until no tracked task remains.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    /// Like [`wait_idle`](Self::wait_idle) with an upper bound.
    /// Returns false if tasks were still running at the deadline.
    pub async fn wait_idle_timeout(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.wait_idle()).await.is_ok()
    }
}

impl Default for InFlightTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks a serving task's lifetime.
#[derive(Debug)]
pub struct InFlightGuard {
    count: Arc<watch::Sender<usize>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.count.send_modify(|count| *count -= 1);
        metrics::record_in_flight(*self.count.borrow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_counts() {
        let tracker = InFlightTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.clone().track();
        assert_eq!(tracker.active_count(), 2);

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn wait_idle_returns_when_last_guard_drops() {
        let tracker = InFlightTracker::new();
        let guard = tracker.track();

        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.wait_idle().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test]
    async fn wait_idle_timeout_reports_leftovers() {
        let tracker = InFlightTracker::new();
        assert!(tracker.wait_idle_timeout(Duration::from_millis(10)).await);

        let _guard = tracker.track();
        assert!(!tracker.wait_idle_timeout(Duration::from_millis(10)).await);
    }
}
