use std::time::{Duration, Instant};

/// an ordered sequence of locally-read items, re-read at most once per ttl.
///
/// unlike a [`StaleCache`][super::StaleCache], refreshes run synchronously on the caller's
/// thread. producers must be bounded and fast.
#[derive(Debug)]
pub struct MetricSnapshotCache<T> {
    /// the last sequence returned by the producer.
    items: Vec<T>,
    /// when the producer last ran.
    last_refreshed_at: Option<Instant>,
    /// the maximum age of `items` before the producer runs again.
    ttl: Duration,
}

// === impl MetricSnapshotCache ===

impl<T> MetricSnapshotCache<T> {
    /// creates an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: Vec::new(),
            last_refreshed_at: None,
            ttl,
        }
    }

    /// returns the cached sequence, first replacing it with a fresh one if the ttl elapsed.
    ///
    /// the sequence is stored exactly as `producer` orders it.
    pub fn get_or_refresh(&mut self, now: Instant, producer: impl FnOnce() -> Vec<T>) -> &[T] {
        let Self {
            items,
            last_refreshed_at,
            ttl,
        } = self;

        let due = match last_refreshed_at {
            None => true,
            Some(then) => now.saturating_duration_since(*then) > *ttl,
        };

        if due {
            *items = producer();
            *last_refreshed_at = Some(now);
        }

        items
    }

    /// returns the cached sequence without refreshing it.
    #[cfg(test)]
    pub fn items(&self) -> &[T] {
        &self.items
    }
}
