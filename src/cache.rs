use {
    crate::fetch::{BackgroundFetcher, FetchError, Outcome, Pending},
    std::time::{Duration, Instant},
    tracing::debug,
};

pub use self::snapshot::MetricSnapshotCache;

/// caches for locally-expensive reads that may run inline on the render thread.
pub mod snapshot;


/// the last known good value of a slow-to-obtain datum.
///
/// reads never block. refreshes are requested with [`StaleCache::maybe_refresh()`], run on a
/// [`BackgroundFetcher`], and are applied by [`StaleCache::settle()`] on the reading thread.
pub struct StaleCache<T> {
    /// the name of the feed this cache holds, used for logging.
    feed: &'static str,
    /// the value being served. seeded with a placeholder at construction.
    value: T,
    /// the maximum age of a value before it is eligible for refresh.
    ttl: Duration,
    /// when the last refresh was started.
    ///
    /// this is stamped optimistically when a fetch begins, so a failing feed is retried at
    /// most once per ttl.
    last_success_at: Option<Instant>,
    /// when a fetch last succeeded.
    populated_at: Option<Instant>,
    /// the outcome of the fetch in flight, if there is one.
    pending: Option<Pending<T>>,
    /// the error from the most recent failed fetch, cleared by the next success.
    last_error: Option<FetchError>,
    /// what happens to `value` when a fetch fails.
    degrade: Degrade<T>,
}

/// a cache's policy for failed fetches.
pub enum Degrade<T> {
    /// keep serving the previous value.
    Retain,
    /// replace the value with a marker built from the error.
    Replace(fn(&FetchError) -> T),
}

/// how current a cached value is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Freshness {
    /// the last fetch succeeded, within the ttl.
    Fresh,
    /// the cache was populated once, but the value is older than its ttl or the latest fetch
    /// failed.
    Stale,
    /// no fetch has ever succeeded; the placeholder is being served.
    NeverPopulated,
}

// === impl StaleCache ===

impl<T: Send + 'static> StaleCache<T> {
    /// creates a new cache serving `placeholder` until the first successful fetch.
    pub fn new(feed: &'static str, placeholder: T, ttl: Duration, degrade: Degrade<T>) -> Self {
        Self {
            feed,
            value: placeholder,
            ttl,
            last_success_at: None,
            populated_at: None,
            pending: None,
            last_error: None,
            degrade,
        }
    }

    /// returns the value being served.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// starts a background refresh if the ttl has elapsed and none is in flight.
    ///
    /// returns `true` if a fetch was started. otherwise `producer` is dropped unused.
    pub fn maybe_refresh<P>(&mut self, now: Instant, producer: P) -> bool
    where
        P: FnOnce() -> Outcome<T> + Send + 'static,
    {
        if !self.wants_refresh(now) {
            return false;
        }

        let (fetcher, pending) = BackgroundFetcher::new(self.feed);
        self.pending = Some(pending);
        self.last_success_at = Some(now);
        fetcher.start(producer);

        true
    }

    /// applies the outcome of the fetch in flight, if it has arrived.
    ///
    /// returns `true` if an outcome was applied.
    pub fn settle(&mut self, now: Instant) -> bool {
        let Some(outcome) = self.pending.as_ref().and_then(Pending::poll) else {
            return false;
        };

        self.pending = None;
        match outcome {
            Ok(value) => {
                self.value = value;
                self.populated_at = Some(now);
                self.last_error = None;
            }
            Err(error) => {
                if let Degrade::Replace(marker) = self.degrade {
                    self.value = marker(&error);
                }
                debug!(
                    event = "termdash.cache.degraded",
                    feed = self.feed,
                    error = %error,
                );
                self.last_error = Some(error);
            }
        }

        true
    }
}

impl<T> StaleCache<T> {
    /// returns `true` if a fetch is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.pending.is_some()
    }

    /// returns `true` if [`StaleCache::maybe_refresh()`] would start a fetch at `now`.
    ///
    /// callers use this to avoid building a producer that would only be dropped.
    pub fn wants_refresh(&self, now: Instant) -> bool {
        !self.is_refreshing() && self.is_due(now)
    }

    /// returns the error from the most recent fetch, if it failed.
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// returns the value being served, or [`FetchError::NoDataYet`] if no fetch has ever
    /// succeeded.
    pub fn populated(&self) -> Result<&T, FetchError> {
        match self.populated_at {
            Some(_) => Ok(&self.value),
            None => Err(FetchError::NoDataYet),
        }
    }

    /// returns how current the served value is.
    pub fn freshness(&self, now: Instant) -> Freshness {
        let Some(populated_at) = self.populated_at else {
            return Freshness::NeverPopulated;
        };

        let expired = now.saturating_duration_since(populated_at) > self.ttl;
        if expired || self.last_error.is_some() {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.last_success_at {
            None => true,
            Some(then) => now.saturating_duration_since(then) > self.ttl,
        }
    }
}
