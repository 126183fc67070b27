//! Suppresses repeats of the same text within a few seconds.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

pub const WINDOW_SECS: u64 = 5;

/// Remembers `(content, bucket)` pairs where a bucket is `now / 5s`.
/// Buckets older than the previous one are forgotten.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<(String, u64)>,
}

impl Deduplicator {
    /// Whether `content` should be sent now.
    pub fn check(&mut self, content: &str) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.check_at(content, now)
    }

    pub fn check_at(&mut self, content: &str, now_secs: u64) -> bool {
        let bucket = now_secs / WINDOW_SECS;
        if !self.seen.insert((content.to_string(), bucket)) {
            return false;
        }
        let oldest = bucket.saturating_sub(1);
        self.seen.retain(|(_, b)| *b >= oldest);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_in_same_bucket_is_skipped() {
        let mut d = Deduplicator::default();
        assert!(d.check_at("hi", 100));
        assert!(!d.check_at("hi", 104));
        assert!(d.check_at("other", 104));
    }

    #[test]
    fn next_bucket_sends_again() {
        let mut d = Deduplicator::default();
        assert!(d.check_at("hi", 104));
        assert!(d.check_at("hi", 105));
    }

    #[test]
    fn old_buckets_are_pruned() {
        let mut d = Deduplicator::default();
        d.check_at("a", 0);
        d.check_at("b", 5);
        assert_eq!(d.len(), 2);
        d.check_at("c", 10);
        // bucket 0 is older than the previous bucket (1)
        assert_eq!(d.len(), 2);
        assert!(d.check_at("a", 12));
    }
}
