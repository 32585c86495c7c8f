//! Debounced save scheduling.
//!
//! # Responsibility
//! - Track one pending save deadline per session.
//!
//! # Invariants
//! - Each edit pushes the deadline out by the full debounce.
//! - `poll` and `flush` report a due save at most once.

use std::time::{Duration, Instant};

/// Debounced save deadline driven by an explicit clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveScheduler {
    debounce: Duration,
    deadline: Option<Instant>,
}

impl SaveScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Pushes the deadline to `now + debounce`.
    pub fn note_edit(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    /// Returns `true` once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` when a save was pending; clears it either way.
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::SaveScheduler;
    use std::time::{Duration, Instant};

    #[test]
    fn each_edit_pushes_the_deadline() {
        let start = Instant::now();
        let mut scheduler = SaveScheduler::new(Duration::from_millis(1000));
        scheduler.note_edit(start);
        scheduler.note_edit(start + Duration::from_millis(600));
        assert!(!scheduler.poll(start + Duration::from_millis(1200)));
        assert!(scheduler.poll(start + Duration::from_millis(1600)));
        assert!(!scheduler.poll(start + Duration::from_millis(5000)));
    }

    #[test]
    fn flush_reports_pending_save_once() {
        let mut scheduler = SaveScheduler::new(Duration::from_millis(1000));
        assert!(!scheduler.flush());
        scheduler.note_edit(Instant::now());
        assert!(scheduler.flush());
        assert!(!scheduler.is_pending());
    }
}
