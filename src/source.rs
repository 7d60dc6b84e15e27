use {
    chrono::NaiveTime,
    std::{
        cell::RefCell,
        collections::VecDeque,
        time::{Duration, Instant},
    },
};

pub use self::clock::*;

mod clock {
    use super::*;

    /// a source of time for the render loop.
    pub trait Clock {
        /// returns the current instant.
        fn now(&self) -> Instant;

        /// returns the local wall-clock time of day.
        fn local_time(&self) -> NaiveTime;

        /// suspends the calling thread for the given duration.
        fn sleep(&self, duration: Duration);
    }

    #[derive(Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> Instant {
            Instant::now()
        }

        fn local_time(&self) -> NaiveTime {
            chrono::Local::now().time()
        }

        fn sleep(&self, duration: Duration) {
            std::thread::sleep(duration)
        }
    }

    /// a scripted clock.
    ///
    /// each call to [`Clock::now()`] pops the next queued instant, and each call to
    /// [`Clock::sleep()`] is recorded rather than performed. the wall clock is frozen.
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockClock {
        times: RefCell<VecDeque<Instant>>,
        sleeps: RefCell<Vec<Duration>>,
        local_time: NaiveTime,
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            let MockClock { times, .. } = self;

            times
                .borrow_mut()
                .pop_front()
                .expect("mock times should not be empty")
        }

        fn local_time(&self) -> NaiveTime {
            self.local_time
        }

        fn sleep(&self, duration: Duration) {
            let MockClock { sleeps, .. } = self;

            sleeps.borrow_mut().push(duration);
        }
    }

    #[allow(dead_code, reason = "this is a testing utility.")]
    impl MockClock {
        /// returns a clock that will hand out the given instants, in order.
        ///
        /// the wall clock reads midnight.
        pub fn new(times: impl IntoIterator<Item = Instant>) -> Self {
            Self {
                times: RefCell::new(times.into_iter().collect()),
                sleeps: RefCell::default(),
                local_time: NaiveTime::MIN,
            }
        }

        /// freezes the wall clock at the given time of day.
        pub fn with_local_time(self, local_time: NaiveTime) -> Self {
            Self { local_time, ..self }
        }

        /// returns every sleep requested so far.
        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.borrow().clone()
        }

        /// returns the number of instants not yet handed out.
        pub fn remaining(&self) -> usize {
            self.times.borrow().len()
        }
    }
}
