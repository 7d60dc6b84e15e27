use {
    super::*,
    crate::{
        fetch::{FetchError, Outcome, ProcessError},
        metrics::MockMetrics,
        source::MockClock,
        surface::MockSurface,
    },
    std::{
        sync::{
            Arc,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
        thread,
    },
};

const MS: Duration = Duration::from_millis(1);

/// feeds that answer immediately, counting how often each is built and fetched.
#[derive(Default)]
struct StubFeeds {
    weather: Arc<AtomicUsize>,
    crypto: Arc<AtomicUsize>,
    branch: Arc<AtomicUsize>,
    /// the number of producers handed out, across every feed.
    built: AtomicUsize,
    /// while set, every fetch fails.
    offline: Arc<AtomicBool>,
}

impl StubFeeds {
    fn offline() -> Self {
        let feeds = Self::default();
        feeds.offline.store(true, Ordering::SeqCst);
        feeds
    }

    /// returns the fetch counter and the offline switch for a new producer.
    fn build(&self, calls: &Arc<AtomicUsize>) -> (Arc<AtomicUsize>, Arc<AtomicBool>) {
        self.built.fetch_add(1, Ordering::SeqCst);
        (Arc::clone(calls), Arc::clone(&self.offline))
    }
}

impl Feeds for StubFeeds {
    fn weather(&self) -> impl FnOnce() -> Outcome<String> + Send + 'static {
        let (calls, offline) = self.build(&self.weather);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            if offline.load(Ordering::SeqCst) {
                return Err(FetchError::Status { status: 503 });
            }
            Ok("Jalandhar: Clear Sky 21.5°C".to_owned())
        }
    }

    fn crypto(&self) -> impl FnOnce() -> Outcome<Prices> + Send + 'static {
        let (calls, offline) = self.build(&self.crypto);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            if offline.load(Ordering::SeqCst) {
                return Err(FetchError::Status { status: 503 });
            }
            Ok([("bitcoin".to_owned(), 64_000.5)].into_iter().collect())
        }
    }

    fn branch(&self) -> impl FnOnce() -> Outcome<String> + Send + 'static {
        let (calls, offline) = self.build(&self.branch);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            if offline.load(Ordering::SeqCst) {
                return Err(ProcessError::ExitStatus { code: Some(128) }.into());
            }
            Ok("main".to_owned())
        }
    }
}

type TestDashboard = Dashboard<MockClock, MockMetrics, StubFeeds, MockSurface>;

fn dashboard(times: impl IntoIterator<Item = Instant>, inputs: Vec<Input>) -> TestDashboard {
    Dashboard::with(
        MockClock::new(times),
        MockMetrics::default(),
        StubFeeds::default(),
        MockSurface::new(100, 30).with_inputs(inputs),
    )
}

/// instants for `ticks` ticks, each 100ms apart and taking 10ms.
fn steady(start: Instant, ticks: u32) -> Vec<Instant> {
    (0..ticks)
        .flat_map(|tick| {
            let begin = start + 100 * MS * tick;
            [begin, begin + 10 * MS]
        })
        .collect()
}

fn screen_contains(surface: &MockSurface, text: &str) -> bool {
    let (_, rows) = surface.screen.size();
    (0..rows).any(|row| surface.screen.line(row).contains(text))
}

/// waits for every feed's fetch in flight to be applied.
fn settle_all(dashboard: &mut TestDashboard, now: Instant) {
    let deadline = Instant::now() + Duration::from_secs(5);
    let caches = &mut dashboard.caches;
    while caches.weather.is_refreshing()
        || caches.crypto.is_refreshing()
        || caches.branch.is_refreshing()
    {
        caches.weather.settle(now);
        caches.crypto.settle(now);
        caches.branch.settle(now);
        assert!(Instant::now() < deadline, "fetches did not complete in time");
        thread::sleep(MS);
    }
}

mod pacing {
    use super::*;

    #[test]
    fn budget_is_remainder_of_period() {
        assert_eq!(sleep_budget(100 * MS, 30 * MS), 70 * MS);
        assert_eq!(sleep_budget(100 * MS, 100 * MS), Duration::ZERO);
    }

    #[test]
    fn overrun_does_not_sleep() {
        assert_eq!(sleep_budget(100 * MS, 130 * MS), Duration::ZERO);
    }

    /// a fast tick sleeps out the period, and a slow one is followed straight away by the
    /// next.
    #[test]
    fn sleeps_after_fast_ticks_only() {
        let t0 = Instant::now();
        let t1 = t0 + 100 * MS;
        let t2 = t1 + 130 * MS;
        let mut dashboard = dashboard(
            [t0, t0 + 30 * MS, t1, t2, t2],
            vec![Input::Other, Input::Other, Input::Quit],
        );

        dashboard.run().unwrap();

        assert_eq!(dashboard.clock.sleeps(), [70 * MS]);
        assert_eq!(dashboard.clock.remaining(), 0);
        assert_eq!(dashboard.ticks(), 3);
        assert_eq!(dashboard.surface.frames, 3);
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn quit_stops_and_releases() {
        let t0 = Instant::now();
        let mut dashboard = dashboard([t0], vec![Input::Quit]);
        assert_eq!(dashboard.state(), State::Running);

        dashboard.run().unwrap();

        assert_eq!(dashboard.state(), State::Stopped);
        assert!(dashboard.surface.released);
        assert!(dashboard.clock.sleeps().is_empty());
        assert_eq!(dashboard.surface.frames, 1);
    }

    #[test]
    fn first_frame_shows_placeholders() {
        let t0 = Instant::now();
        let mut dashboard = dashboard([t0], vec![Input::Quit]);

        dashboard.run().unwrap();

        let surface = &dashboard.surface;
        assert!(screen_contains(surface, "WEATHER: Scanning atmosphere..."));
        assert!(screen_contains(surface, "BRANCH : resolving..."));
        assert!(screen_contains(surface, "CRYPTO TICKER (SYNCING)"));
    }

    #[test]
    fn footer_shows_wall_clock() {
        let noon = chrono::NaiveTime::from_hms_opt(12, 34, 56).unwrap();
        let mut dashboard = Dashboard::with(
            MockClock::new([Instant::now()]).with_local_time(noon),
            MockMetrics::default(),
            StubFeeds::default(),
            MockSurface::new(100, 30).with_inputs([Input::Quit]),
        );

        dashboard.run().unwrap();

        assert!(screen_contains(&dashboard.surface, "STATUS: ONLINE | TIME: 12:34:56"));
    }

    #[test]
    fn failing_terminal_still_releases() {
        struct Broken(MockSurface);

        impl Surface for Broken {
            fn size(&self) -> io::Result<(u16, u16)> {
                Err(io::Error::other("terminal went away"))
            }
            fn clear(&mut self, cols: u16, rows: u16) {
                self.0.clear(cols, rows)
            }
            fn put(&mut self, col: u16, row: u16, text: &str, color: crossterm::style::Color) {
                self.0.put(col, row, text, color)
            }
            fn flush(&mut self) -> io::Result<()> {
                self.0.flush()
            }
            fn poll(&mut self) -> io::Result<Option<Input>> {
                self.0.poll()
            }
            fn release(&mut self) -> io::Result<()> {
                self.0.release()
            }
        }

        let mut dashboard = Dashboard::with(
            MockClock::new([Instant::now()]),
            MockMetrics::default(),
            StubFeeds::default(),
            Broken(MockSurface::new(100, 30)),
        );

        let error = dashboard.run().unwrap_err();
        assert!(matches!(error, Error::Terminal(_)));
        assert!(dashboard.surface.0.released);
    }
}

mod refresh {
    use super::*;

    #[test]
    fn feeds_fetched_once_within_ttl() {
        let t0 = Instant::now();
        let mut inputs = vec![Input::Other; 4];
        inputs.push(Input::Quit);
        let mut dashboard = dashboard(steady(t0, 5), inputs);

        dashboard.run().unwrap();
        settle_all(&mut dashboard, t0);

        let feeds = &dashboard.feeds;
        assert_eq!(feeds.weather.load(Ordering::SeqCst), 1);
        assert_eq!(feeds.crypto.load(Ordering::SeqCst), 1);
        assert_eq!(feeds.branch.load(Ordering::SeqCst), 1);
    }

    /// producers are only built for feeds that are due, not on every tick.
    #[test]
    fn producers_built_only_when_due() {
        let t0 = Instant::now();
        let mut inputs = vec![Input::Other; 4];
        inputs.push(Input::Quit);
        let mut dashboard = dashboard(steady(t0, 5), inputs);

        dashboard.run().unwrap();
        settle_all(&mut dashboard, t0);

        assert_eq!(dashboard.feeds.built.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn completed_fetches_appear_on_a_later_frame() {
        let t0 = Instant::now();
        let mut dashboard = dashboard(steady(t0, 2), vec![Input::Other, Input::Other]);

        dashboard.tick().unwrap();
        settle_all(&mut dashboard, t0);
        dashboard.tick().unwrap();

        let surface = &dashboard.surface;
        assert!(screen_contains(surface, "WEATHER: Jalandhar: Clear Sky 21.5°C"));
        assert!(screen_contains(surface, "BRANCH : main"));
        assert!(screen_contains(surface, "BTC  : $64,000.50"));
        assert!(screen_contains(surface, "CRYPTO TICKER"));
        assert!(!screen_contains(surface, "SYNCING"));
    }

    #[test]
    fn branch_is_resolved_again_after_ttl() {
        let t0 = Instant::now();
        let later = t0 + config::BRANCH_TTL + MS;
        let mut dashboard = dashboard(
            [t0, t0 + 10 * MS, later, later + 10 * MS],
            vec![Input::Other, Input::Other],
        );

        dashboard.tick().unwrap();
        settle_all(&mut dashboard, t0);
        dashboard.tick().unwrap();
        settle_all(&mut dashboard, later);

        let feeds = &dashboard.feeds;
        assert_eq!(feeds.branch.load(Ordering::SeqCst), 2);
        assert_eq!(feeds.weather.load(Ordering::SeqCst), 1);
        assert_eq!(feeds.crypto.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ticker_syncs_until_prices_arrive() {
        let t0 = Instant::now();
        let mut dashboard = Dashboard::with(
            MockClock::new(steady(t0, 2)),
            MockMetrics::default(),
            StubFeeds::offline(),
            MockSurface::new(100, 30).with_inputs([Input::Other, Input::Other]),
        );

        dashboard.tick().unwrap();
        settle_all(&mut dashboard, t0);
        dashboard.tick().unwrap();

        assert!(dashboard.caches.crypto.last_error().is_some());
        assert!(screen_contains(&dashboard.surface, "CRYPTO TICKER (SYNCING)"));
        assert!(screen_contains(&dashboard.surface, "BTC  : $0.00"));
    }
}

/// each feed keeps its own presentation of a failed fetch.
mod degrade {
    use super::*;

    #[test]
    fn failures_before_first_success() {
        let t0 = Instant::now();
        let mut dashboard = Dashboard::with(
            MockClock::new(steady(t0, 2)),
            MockMetrics::default(),
            StubFeeds::offline(),
            MockSurface::new(100, 30).with_inputs([Input::Other, Input::Other]),
        );

        dashboard.tick().unwrap();
        settle_all(&mut dashboard, t0);
        dashboard.tick().unwrap();

        let surface = &dashboard.surface;
        assert!(screen_contains(surface, "WEATHER: ERR: HTTP 503"));
        assert!(screen_contains(surface, "BRANCH : DETACHED / NO GIT"));
        assert!(screen_contains(surface, "BTC  : $0.00"));
    }

    /// weather and branch replace their last good value, while crypto keeps its prices.
    #[test]
    fn failures_after_success() {
        let t0 = Instant::now();
        let later = t0 + config::WEATHER_TTL + MS;
        let mut dashboard = dashboard(
            [t0, t0 + 10 * MS, later, later + 10 * MS, later + 100 * MS, later + 110 * MS],
            vec![Input::Other; 3],
        );

        dashboard.tick().unwrap();
        settle_all(&mut dashboard, t0);
        dashboard.feeds.offline.store(true, Ordering::SeqCst);
        dashboard.tick().unwrap();
        settle_all(&mut dashboard, later);
        dashboard.tick().unwrap();

        let feeds = &dashboard.feeds;
        assert_eq!(feeds.weather.load(Ordering::SeqCst), 2);
        assert_eq!(feeds.crypto.load(Ordering::SeqCst), 2);
        assert_eq!(feeds.branch.load(Ordering::SeqCst), 2);

        let surface = &dashboard.surface;
        assert!(screen_contains(surface, "WEATHER: ERR: HTTP 503"));
        assert!(!screen_contains(surface, "Clear Sky"));
        assert!(screen_contains(surface, "BRANCH : DETACHED / NO GIT"));
        assert!(screen_contains(surface, "BTC  : $64,000.50"));
        assert!(screen_contains(surface, "CRYPTO TICKER (STALE)"));
    }
}

mod local {
    use super::*;

    /// the process table is read at most once per ttl, while the fast metrics are read on
    /// every tick.
    #[test]
    fn process_table_is_cached() {
        let t0 = Instant::now();
        let mut dashboard = dashboard(steady(t0, 3), vec![Input::Other, Input::Other, Input::Quit]);

        dashboard.run().unwrap();

        assert_eq!(dashboard.metrics.refreshes, 3);
        assert_eq!(dashboard.metrics.process_reads, 1);
    }

    /// 1000 and 150 bytes per 100ms tick are shown as 10000 and 1500 bytes per second.
    #[test]
    fn network_rates() {
        let t0 = Instant::now();
        let mut dashboard = dashboard(steady(t0, 2), vec![Input::Other, Input::Quit]);
        dashboard.metrics.step.received = 1_000;
        dashboard.metrics.step.transmitted = 150;

        dashboard.run().unwrap();

        let surface = &dashboard.surface;
        assert!(screen_contains(surface, "NET DWN: 9.8 KB/s"));
        assert!(screen_contains(surface, "NET UP : 1.5 KB/s"));
    }

    #[test]
    fn first_frame_has_no_rates() {
        let t0 = Instant::now();
        let mut dashboard = dashboard([t0], vec![Input::Quit]);
        dashboard.metrics.step.received = 1_000;

        dashboard.run().unwrap();

        assert!(screen_contains(&dashboard.surface, "NET DWN: 0 B/s"));
    }
}

mod ticker {
    use super::*;

    #[test]
    fn follows_cache_freshness() {
        let t0 = Instant::now();
        let mut cache = StaleCache::new("crypto", Prices::default(), config::CRYPTO_TTL, Degrade::Retain);
        assert_eq!(ticker(&cache, t0), Ticker::Syncing);

        cache.maybe_refresh(t0, || Ok(Prices::default()));
        wait(&mut cache, t0);
        assert_eq!(ticker(&cache, t0), Ticker::Live);

        // an expired value that has not failed is still live; a refresh is on its way.
        let later = t0 + config::CRYPTO_TTL + MS;
        assert_eq!(ticker(&cache, later), Ticker::Live);

        cache.maybe_refresh(later, || Err(FetchError::EmptyBody));
        wait(&mut cache, later);
        assert_eq!(ticker(&cache, later), Ticker::Stale);
    }

    fn wait(cache: &mut StaleCache<Prices>, now: Instant) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while cache.is_refreshing() {
            cache.settle(now);
            assert!(Instant::now() < deadline, "fetch did not complete in time");
            thread::sleep(MS);
        }
    }
}
