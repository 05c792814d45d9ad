//! Quiet-window debouncing for the search input.
//!
//! A `Debouncer` holds at most one pending value and one deadline. Arming it
//! again replaces both, so a burst of changes inside the window only ever
//! yields the final value. Dropping it drops the pending value, so nothing
//! fires after the owner is gone.

use std::future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replace the pending value and restart the quiet window.
    pub fn arm(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.window));
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Resolves with the pending value once its window has elapsed. Never
    /// resolves while nothing is pending.
    ///
    /// Cancel safe: the value is only taken after the sleep completes, so a
    /// `select!` that drops this future loses nothing.
    pub async fn settled(&mut self) -> T {
        let deadline = match self.deadline() {
            Some(at) => at,
            None => return future::pending().await,
        };
        sleep_until(deadline).await;
        match self.pending.take() {
            Some((value, _)) => value,
            None => future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    const WINDOW: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_settles_after_window() {
        let mut d = Debouncer::new(WINDOW);
        d.arm("dune");
        let start = Instant::now();
        assert_eq!(d.settled().await, "dune");
        assert_eq!(start.elapsed(), WINDOW);
        assert!(!d.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_changes_only_propagate_last() {
        let mut d = Debouncer::new(WINDOW);
        let mut propagated = Vec::new();

        for value in ["i", "in", "inc", "ince"] {
            d.arm(value);
            // Changes arrive faster than the window; nothing may settle.
            if let Ok(v) = timeout(Duration::from_millis(200), d.settled()).await {
                propagated.push(v);
            }
        }
        propagated.push(d.settled().await);

        assert_eq!(propagated, vec!["ince"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_window() {
        let mut d = Debouncer::new(WINDOW);
        d.arm(1);
        advance(Duration::from_millis(400)).await;
        d.arm(2);
        let start = Instant::now();
        assert_eq!(d.settled().await, 2);
        assert_eq!(start.elapsed(), WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_each_settle() {
        let mut d = Debouncer::new(WINDOW);
        d.arm("alien");
        assert_eq!(d.settled().await, "alien");
        d.arm("aliens");
        assert_eq!(d.settled().await, "aliens");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_idle_never_fire() {
        let mut d = Debouncer::new(WINDOW);
        assert!(timeout(Duration::from_secs(5), d.settled()).await.is_err());

        d.arm("x");
        assert_eq!(d.cancel(), Some("x"));
        assert!(timeout(Duration::from_secs(5), d.settled()).await.is_err());
    }
}
