//! Foreground tracking for the WebView shell.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Counts started activities. The app is in the foreground while at least
/// one is started; a stop caused by a configuration change keeps the flag.
#[derive(Debug, Default)]
pub struct ForegroundTracker {
    started: AtomicUsize,
    foreground: AtomicBool,
}

impl ForegroundTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity_started(&self) {
        let previous = self.started.fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            self.foreground.store(true, Ordering::SeqCst);
            tracing::debug!("App entered foreground");
        }
    }

    pub fn activity_stopped(&self, changing_configurations: bool) {
        let previous = self
            .started
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        if previous <= 1 && !changing_configurations {
            self.foreground.store(false, Ordering::SeqCst);
            tracing::debug!("App entered background");
        }
    }

    pub fn is_in_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    pub fn started_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_background() {
        assert!(!ForegroundTracker::new().is_in_foreground());
    }

    #[test]
    fn overlapping_activities() {
        let t = ForegroundTracker::new();
        t.activity_started();
        t.activity_started();
        t.activity_stopped(false);
        assert!(t.is_in_foreground());
        t.activity_stopped(false);
        assert!(!t.is_in_foreground());
        assert_eq!(t.started_count(), 0);
    }

    #[test]
    fn configuration_change_keeps_foreground() {
        let t = ForegroundTracker::new();
        t.activity_started();
        t.activity_stopped(true);
        assert!(t.is_in_foreground());
        t.activity_started();
        t.activity_stopped(false);
        assert!(!t.is_in_foreground());
    }

    #[test]
    fn unmatched_stop_does_not_underflow() {
        let t = ForegroundTracker::new();
        t.activity_stopped(false);
        assert_eq!(t.started_count(), 0);
        t.activity_started();
        assert!(t.is_in_foreground());
    }
}
