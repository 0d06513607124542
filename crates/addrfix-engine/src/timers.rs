//! Keyed one-shot timers for a single reconciliation loop.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::reconcile::TimerKind;

/// At most one pending deadline per [`TimerKind`]; scheduling a kind again
/// replaces its deadline.
#[derive(Debug, Default)]
pub struct TimerQueue {
    deadlines: HashMap<TimerKind, Instant>,
}

impl TimerQueue {
    pub fn schedule(&mut self, kind: TimerKind, after: Duration) {
        self.deadlines.insert(kind, Instant::now() + after);
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.deadlines.remove(&kind);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    #[must_use]
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    /// Sleeps until the earliest deadline and pops it. Equal deadlines fire
    /// in [`TimerKind`] order.
    ///
    /// Cancel safe: if the future is dropped before it completes, the timer
    /// stays armed.
    pub async fn wait_next(&mut self) -> Option<TimerKind> {
        let (kind, deadline) = self
            .deadlines
            .iter()
            .map(|(kind, deadline)| (*kind, *deadline))
            .min_by_key(|(kind, deadline)| (*deadline, *kind))?;
        tokio::time::sleep_until(deadline).await;
        self.deadlines.remove(&kind);
        Some(kind)
    }
}
