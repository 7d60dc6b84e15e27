use std::time::Instant;

/// converts a monotonically increasing counter into a rate, in units per second.
#[derive(Debug, Default)]
pub struct RateSampler {
    inner: Inner,
}

#[derive(Debug, Default)]
enum Inner {
    /// no sample has been taken yet.
    #[default]
    Initialized,
    Running {
        /// the counter value at the previous sample.
        count: u64,
        /// when the previous sample was taken.
        time: Instant,
    },
}

// === impl RateSampler ===

impl RateSampler {
    /// creates a new [`RateSampler`].
    pub fn new() -> Self {
        Self::default()
    }

    /// records a counter value, returning the rate since the previous sample.
    ///
    /// NB: by virtue of this being a comparison to the previous reading, this will return
    /// `0.0` the first time it is called. a counter that went backwards, or a clock that did
    /// not move forwards, also yields `0.0`.
    pub fn sample(&mut self, current: u64, now: Instant) -> f64 {
        let Self { inner } = self;

        let rate = match *inner {
            Inner::Initialized => 0.0,
            Inner::Running {
                count: previous,
                time: then,
            } => Self::rate(previous, then, current, now),
        };

        *inner = Inner::Running {
            count: current,
            time: now,
        };

        rate
    }

    fn rate(previous: u64, then: Instant, current: u64, now: Instant) -> f64 {
        let Some(delta) = current.checked_sub(previous) else {
            return 0.0;
        };

        let elapsed = now.saturating_duration_since(then).as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }

        (delta as f64 / elapsed).max(0.0)
    }
}
