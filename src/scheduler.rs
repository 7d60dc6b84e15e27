use {
    crate::{
        Error,
        cache::{Degrade, Freshness, MetricSnapshotCache, StaleCache},
        config,
        feeds::{self, Feeds, LiveFeeds, Prices},
        metrics::{MetricsSource, ProcessLoad, SysinfoMetrics},
        sampler::RateSampler,
        source::{Clock, SystemClock},
        surface::{Input, Surface, Terminal},
        window::{self, Frame, Ticker},
    },
    std::{
        io,
        path::PathBuf,
        time::{Duration, Instant},
    },
    tracing::{debug, info},
};

#[cfg(test)]
mod tests;

/// the dashboard's render loop.
///
/// each tick reads every cache and sampler, starts any refreshes that are due, draws one
/// frame, and then sleeps for whatever is left of the tick period.
pub struct Dashboard<C = SystemClock, M = SysinfoMetrics, F = LiveFeeds, S = Terminal> {
    clock: C,
    metrics: M,
    feeds: F,
    surface: S,
    /// the length of one tick.
    period: Duration,
    state: State,
    caches: Caches,
    /// the number of frames drawn so far.
    ticks: u64,
}

/// the state of the render loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    Running,
    /// the loop has been asked to exit.
    Stopped,
}

/// every cache and sampler the dashboard reads from.
struct Caches {
    weather: StaleCache<String>,
    crypto: StaleCache<Prices>,
    branch: StaleCache<String>,
    processes: MetricSnapshotCache<ProcessLoad>,
    download: RateSampler,
    upload: RateSampler,
}

// === impl Dashboard ===

impl Dashboard {
    /// initializes a dashboard on the current terminal.
    pub fn new() -> Result<Self, Error> {
        let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let feeds = LiveFeeds::new(dir)?;
        let metrics = SysinfoMetrics::new();
        let surface = Terminal::new()?;

        Ok(Self::with(SystemClock, metrics, feeds, surface))
    }
}

impl<C, M, F, S> Dashboard<C, M, F, S>
where
    C: Clock,
    M: MetricsSource,
    F: Feeds,
    S: Surface,
{
    /// assembles a dashboard from its collaborators.
    pub fn with(clock: C, metrics: M, feeds: F, surface: S) -> Self {
        Self {
            clock,
            metrics,
            feeds,
            surface,
            period: config::TICK_PERIOD,
            state: State::Running,
            caches: Caches::new(),
            ticks: 0,
        }
    }

    /// runs the render loop until the user quits, then releases the surface.
    pub fn run(&mut self) -> Result<(), Error> {
        info!(event = "termdash.dashboard.started", period = ?self.period);

        let result = self.run_loop();
        let released = self.surface.release();

        info!(
            event = "termdash.dashboard.stopped",
            ticks = self.ticks,
            ok = result.is_ok(),
        );

        result?;
        released?;

        Ok(())
    }

    fn run_loop(&mut self) -> io::Result<()> {
        while self.state == State::Running {
            self.tick()?;
        }

        Ok(())
    }

    /// runs one iteration of the render loop.
    fn tick(&mut self) -> io::Result<()> {
        let Self {
            clock,
            metrics,
            feeds,
            surface,
            period,
            state,
            caches,
            ticks,
        } = self;

        let now = clock.now();
        let size = surface.size()?;

        // apply finished fetches first, so that the frame observes a single instant.
        caches.weather.settle(now);
        caches.crypto.settle(now);
        caches.branch.settle(now);

        metrics.refresh();
        let processes = caches
            .processes
            .get_or_refresh(now, || {
                debug!(event = "termdash.dashboard.processes_refreshed");
                metrics.top_processes(config::PROCESS_COUNT)
            });
        let vitals = metrics.vitals();
        let totals = metrics.network_totals();
        let download = caches.download.sample(totals.received, now);
        let upload = caches.upload.sample(totals.transmitted, now);

        // none of these block; a fetch that is started is applied by a later tick.
        if caches.weather.wants_refresh(now) {
            caches.weather.maybe_refresh(now, feeds.weather());
        }
        if caches.crypto.wants_refresh(now) {
            caches.crypto.maybe_refresh(now, feeds.crypto());
        }
        if caches.branch.wants_refresh(now) {
            caches.branch.maybe_refresh(now, feeds.branch());
        }

        let frame = Frame {
            vitals: &vitals,
            download,
            upload,
            branch: caches.branch.get(),
            weather: caches.weather.get(),
            prices: caches.crypto.get(),
            ticker: ticker(&caches.crypto, now),
            processes,
            time: clock.local_time().format("%H:%M:%S").to_string(),
        };
        window::draw(surface, size, &frame);
        surface.flush()?;
        *ticks += 1;

        if let Some(Input::Quit) = surface.poll()? {
            info!(event = "termdash.dashboard.quit_requested");
            *state = State::Stopped;
            return Ok(());
        }

        let elapsed = clock.now().saturating_duration_since(now);
        let budget = sleep_budget(*period, elapsed);
        if budget.is_zero() {
            debug!(event = "termdash.dashboard.tick_overran", elapsed = ?elapsed);
        } else {
            clock.sleep(budget);
        }

        Ok(())
    }

    /// returns the state of the render loop.
    pub fn state(&self) -> State {
        self.state
    }

    /// returns the number of frames drawn so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

// === impl Caches ===

impl Caches {
    fn new() -> Self {
        Self {
            weather: StaleCache::new(
                "weather",
                config::WEATHER_PLACEHOLDER.to_owned(),
                config::WEATHER_TTL,
                Degrade::Replace(feeds::weather::marker),
            ),
            crypto: StaleCache::new(
                "crypto",
                Prices::default(),
                config::CRYPTO_TTL,
                Degrade::Retain,
            ),
            branch: StaleCache::new(
                "branch",
                config::BRANCH_PLACEHOLDER.to_owned(),
                config::BRANCH_TTL,
                Degrade::Replace(feeds::branch::sentinel),
            ),
            processes: MetricSnapshotCache::new(config::PROCESS_TTL),
            download: RateSampler::new(),
            upload: RateSampler::new(),
        }
    }
}

/// how long to sleep after a tick that took `elapsed`, to hold the tick period.
///
/// a tick that overran the period is followed immediately by the next one. there is no
/// catching up, and no frame is skipped.
pub fn sleep_budget(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// the condition of the crypto ticker, given its cache.
fn ticker(crypto: &StaleCache<Prices>, now: Instant) -> Ticker {
    match crypto.freshness(now) {
        Freshness::NeverPopulated => Ticker::Syncing,
        Freshness::Stale if crypto.last_error().is_some() => Ticker::Stale,
        Freshness::Stale | Freshness::Fresh => Ticker::Live,
    }
}
