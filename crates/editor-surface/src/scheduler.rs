//! One-shot timers on an injected clock.
//!
//! The surface never sleeps or spawns: it records deadlines in a [`TimerQueue`] and the host
//! calls back (`EditorSurface::tick` or `EditorSurface::on_timer`) when one is due. Time comes
//! from a [`Clock`], so tests drive it with a [`ManualClock`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give another to the surface.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Purpose of a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Apply the brace-match indicator once the caret has settled.
    BraceHighlight,
    /// Remove the brace-match indicator.
    BraceHighlightClear,
    /// Hide the mouse cursor after inactivity.
    HideCursor,
    /// Remove the transient info text.
    InfoBanner,
}

impl TimerId {
    /// The delay the surface uses for this timer, unless it is configured.
    pub fn default_delay(self) -> Duration {
        match self {
            Self::BraceHighlight => Duration::from_secs(1),
            Self::BraceHighlightClear | Self::InfoBanner => Duration::from_secs(5),
            Self::HideCursor => Duration::from_millis(3000),
        }
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BraceHighlight => "brace-highlight",
            Self::BraceHighlightClear => "brace-highlight-clear",
            Self::HideCursor => "hide-cursor",
            Self::InfoBanner => "info-banner",
        };
        f.write_str(name)
    }
}

/// Pending one-shot timers, at most one per [`TimerId`].
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: Vec<(TimerId, Duration)>,
}

impl TimerQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `id` to fire `delay` after `now`, replacing an earlier schedule of the same id.
    pub fn schedule(&mut self, id: TimerId, delay: Duration, now: Duration) {
        self.cancel(id);
        self.pending.push((id, now + delay));
    }

    /// Drop a pending timer. Returns `true` if it was pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(pending, _)| *pending != id);
        self.pending.len() != before
    }

    /// Returns `true` if `id` is waiting to fire.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|(pending, _)| *pending == id)
    }

    /// The deadline of `id`, if pending.
    pub fn deadline(&self, id: TimerId) -> Option<Duration> {
        self.pending
            .iter()
            .find(|(pending, _)| *pending == id)
            .map(|(_, deadline)| *deadline)
    }

    /// The earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|(_, deadline)| *deadline).min()
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<TimerId> {
        let mut due: Vec<(TimerId, Duration)> = Vec::new();
        self.pending.retain(|&(id, deadline)| {
            if deadline <= now {
                due.push((id, deadline));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(_, deadline)| deadline);
        due.into_iter().map(|(id, _)| id).collect()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_shared() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_reschedule_replaces() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerId::BraceHighlight, Duration::from_secs(1), Duration::ZERO);
        timers.schedule(TimerId::BraceHighlight, Duration::from_secs(1), Duration::from_secs(2));
        assert_eq!(timers.take_due(Duration::from_secs(1)), Vec::new());
        assert_eq!(
            timers.take_due(Duration::from_secs(3)),
            vec![TimerId::BraceHighlight]
        );
        assert!(timers.is_empty());
    }

    #[test]
    fn test_due_order_and_cancel() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerId::InfoBanner, Duration::from_secs(5), Duration::ZERO);
        timers.schedule(TimerId::BraceHighlight, Duration::from_secs(1), Duration::ZERO);
        timers.schedule(TimerId::HideCursor, Duration::from_secs(3), Duration::ZERO);
        assert!(timers.cancel(TimerId::HideCursor));
        assert!(!timers.cancel(TimerId::HideCursor));
        assert_eq!(timers.next_deadline(), Some(Duration::from_secs(1)));
        assert_eq!(
            timers.take_due(Duration::from_secs(10)),
            vec![TimerId::BraceHighlight, TimerId::InfoBanner]
        );
    }
}
