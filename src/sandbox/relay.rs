//! Edit relay: collapses keystroke-level edits into debounced commits.
//!
//! Pure timing, no I/O. The pending deadline doubles as the cancel token: a
//! new edit replaces the pending snapshot and pushes the deadline back, so at
//! most one emission is ever scheduled.

use std::time::{Duration, Instant};

struct Pending {
    text: String,
    deadline: Instant,
}

pub struct EditRelay {
    window: Duration,
    pending: Option<Pending>,
}

impl EditRelay {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record an edit made at `now`, rescheduling the single emission.
    pub fn push(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some(Pending {
            text: text.into(),
            deadline: now + self.window,
        });
    }

    /// Drop the pending emission. Returns whether one was scheduled.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Take the final snapshot once the window has elapsed since the last edit.
    pub fn take_if_ready(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(p) if now >= p.deadline => self.pending.take().map(|p| p.text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    #[test]
    fn test_rapid_edits_collapse_to_last() {
        let t0 = Instant::now();
        let mut relay = EditRelay::new(WINDOW);

        relay.push("a", t0);
        relay.push("ab", t0 + Duration::from_millis(100));
        relay.push("abc", t0 + Duration::from_millis(200));

        // still inside the window of the last edit
        assert_eq!(relay.take_if_ready(t0 + Duration::from_millis(350)), None);

        let emitted = relay.take_if_ready(t0 + Duration::from_millis(500));
        assert_eq!(emitted.as_deref(), Some("abc"));
        assert_eq!(relay.take_if_ready(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_window_measured_from_last_edit() {
        let t0 = Instant::now();
        let mut relay = EditRelay::new(WINDOW);
        relay.push("x", t0);
        relay.push("xy", t0 + Duration::from_millis(250));
        assert_eq!(relay.deadline(), Some(t0 + Duration::from_millis(550)));
    }

    #[test]
    fn test_cancel_drops_pending() {
        let t0 = Instant::now();
        let mut relay = EditRelay::new(WINDOW);
        relay.push("x", t0);
        assert!(relay.cancel());
        assert!(!relay.cancel());
        assert_eq!(relay.take_if_ready(t0 + WINDOW), None);
    }
}
